//! Shader rule: identifiers, inputs, connections and material bindings

use super::{Findings, RuleText};
use crate::registry::Rule;
use crate::report::RuleOutcome;
use std::collections::HashSet;
use strata_core::ScenePath;
use strata_stage::{Prim, Shader, Stage};

const TEXT: RuleText = RuleText {
    name: "Validate Shaders",
    absent: "No shaders found in the scene, but that's acceptable.",
    failed_header: "Shader validation failed with the following issues:",
    all_valid: "All shaders and their connections are valid.",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ShaderRule;

impl Rule for ShaderRule {
    fn name(&self) -> &str {
        TEXT.name
    }

    fn check(&self, stage: &mut dyn Stage) -> RuleOutcome {
        check_shaders(stage)
    }
}

fn check_shaders(stage: &dyn Stage) -> RuleOutcome {
    let mut findings = Findings::new();
    let mut checked_materials: HashSet<ScenePath> = HashSet::new();

    for prim in stage.traverse() {
        let Some(shader) = prim.as_shader() else {
            continue;
        };
        findings.subject_found();
        check_shader(stage, &prim, shader, &mut findings);

        if let Some(parent) = prim.path().parent() {
            if checked_materials.insert(parent.clone()) {
                check_material(stage, &parent, &mut findings);
            }
        }
    }

    findings.into_outcome(&TEXT)
}

fn check_shader(stage: &dyn Stage, prim: &Prim, shader: Shader<'_>, findings: &mut Findings) {
    let path = prim.path();

    if shader.shader_id().is_empty() {
        findings.push(format!("Missing or invalid shader ID at: {}", path));
    }

    let inputs = shader.inputs();
    if inputs.is_empty() {
        findings.push(format!("Shader has no input parameters at: {}", path));
    }
    for input in inputs {
        if let Some(source) = input.connection() {
            if !stage.is_valid_source(source) {
                findings.push(format!(
                    "Invalid shader connection at: {} on prim {}",
                    input.base_name(),
                    path
                ));
            }
        }
    }

    if shader.source_asset() == Some("") {
        findings.push(format!("Missing shader source asset path at: {}", path));
    }
}

/// The surface output of a material parent must connect to a valid prim
fn check_material(stage: &dyn Stage, path: &ScenePath, findings: &mut Findings) {
    let Some(parent) = stage.prim_at_path(path) else {
        return;
    };
    let source = parent
        .as_material()
        .and_then(|material| material.surface_output())
        .and_then(|surface| surface.connection());

    if let Some(source) = source {
        if !stage.is_valid_source(source) {
            findings.push(format!("Invalid material binding at: {}", path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_stage::MemoryStage;

    fn check(scene: &str) -> RuleOutcome {
        let mut stage = MemoryStage::from_toml(scene).unwrap();
        ShaderRule.check(&mut stage)
    }

    #[test]
    fn test_no_shaders_passes() {
        let outcome = check("[prims.\"/World\"]\ntype = \"Xform\"\n");
        assert!(outcome.passed);
        assert_eq!(outcome.message, "No shaders found in the scene, but that's acceptable.");
    }

    #[test]
    fn test_connected_material_passes() {
        let outcome = check(
            r#"
[prims."/Looks/Red"]
type = "Material"
attributes = { "outputs:surface" = { connect = "/Looks/Red/Surface.outputs:surface" } }

[prims."/Looks/Red/Surface"]
type = "Shader"
attributes = { "info:id" = "PreviewSurface", "inputs:roughness" = 0.4, "inputs:diffuseColor" = { connect = "/Looks/Red/Tex.outputs:rgb" } }

[prims."/Looks/Red/Tex"]
type = "Shader"
attributes = { "info:id" = "Texture", "inputs:file" = "red.png", "info:implementationSource" = "sourceAsset", "info:sourceAsset" = "tex.glsl" }
"#,
        );
        assert!(outcome.passed, "{}", outcome.message);
        assert_eq!(outcome.message, "All shaders and their connections are valid.");
    }

    #[test]
    fn test_empty_id_and_no_inputs() {
        let outcome = check("[prims.\"/Looks/S\"]\ntype = \"Shader\"\n");
        assert_eq!(
            outcome.violations,
            vec![
                "Missing or invalid shader ID at: /Looks/S",
                "Shader has no input parameters at: /Looks/S",
            ]
        );
    }

    #[test]
    fn test_dangling_connections() {
        let outcome = check(
            r#"
[prims."/Looks/M"]
type = "Material"
attributes = { "outputs:surface" = { connect = "/Looks/Gone.outputs:surface" } }

[prims."/Looks/M/A"]
type = "Shader"
attributes = { "info:id" = "PreviewSurface", "inputs:diffuseColor" = { connect = "/Nowhere.outputs:rgb" } }

[prims."/Looks/M/B"]
type = "Shader"
attributes = { "info:id" = "PreviewSurface", "inputs:opacity" = 1.0 }
"#,
        );
        assert_eq!(
            outcome.violations,
            vec![
                "Invalid shader connection at: diffuseColor on prim /Looks/M/A",
                "Invalid material binding at: /Looks/M",
            ]
        );
    }

    #[test]
    fn test_empty_source_asset() {
        let outcome = check(
            r#"
[prims."/S"]
type = "Shader"
attributes = { "info:id" = "Custom", "inputs:x" = 1, "info:implementationSource" = "sourceAsset" }
"#,
        );
        assert_eq!(
            outcome.violations,
            vec!["Missing shader source asset path at: /S"]
        );
    }
}
