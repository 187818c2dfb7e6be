//! Geometry rule: transform ops, mesh extents and point data

use super::{Findings, RuleText};
use crate::registry::Rule;
use crate::report::RuleOutcome;
use strata_stage::{Mesh, Prim, Stage};

const TEXT: RuleText = RuleText {
    name: "Validate Geometry",
    absent: "No geometry found in the scene, but that's not required.",
    failed_header: "Geometry validation failed with the following issues:",
    all_valid: "All geometry prims are valid with proper transforms and bounds.",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryRule;

impl Rule for GeometryRule {
    fn name(&self) -> &str {
        TEXT.name
    }

    fn check(&self, stage: &mut dyn Stage) -> RuleOutcome {
        let mut findings = Findings::new();

        for prim in stage.traverse() {
            if !prim.is_valid() {
                findings.push(format!(
                    "Encountered an invalid prim in the scene: {}",
                    prim.path()
                ));
                continue;
            }

            if let Some(xformable) = prim.as_xformable() {
                findings.subject_found();
                for op in xformable.ordered_xform_ops() {
                    if op.attribute.is_none() {
                        findings.push(format!(
                            "Invalid transform operation '{}' found at: {}",
                            op.name,
                            prim.path()
                        ));
                    }
                }
            }

            if let Some(mesh) = prim.as_mesh() {
                findings.subject_found();
                check_mesh(&prim, mesh, &mut findings);
            }
        }

        findings.into_outcome(&TEXT)
    }
}

fn check_mesh(prim: &Prim, mesh: Mesh<'_>, findings: &mut Findings) {
    let path = prim.path();

    match mesh.extent() {
        None => findings.push(format!("Extent missing for Mesh at path: {}", path)),
        Some(extent) => match extent.as_points() {
            Some(bounds) if !bounds.is_empty() && bounds.len() % 2 == 0 => {
                if bounds[0] == bounds[1] {
                    findings.push(format!("Degenerate geometry found at: {}", path));
                }
            }
            _ => findings.push(format!("Invalid extent bounds at: {}", path)),
        },
    }

    if let Some(points) = mesh.points() {
        if points.as_points().is_none() {
            findings.push(format!("Invalid point data at: {}", path));
        }
    }
}
