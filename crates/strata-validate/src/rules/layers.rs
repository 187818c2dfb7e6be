//! Layer structure rule: stack integrity, sub-layers, references and payloads

use super::{Findings, RuleText};
use crate::registry::Rule;
use crate::report::RuleOutcome;
use std::collections::HashSet;
use strata_stage::{Layer, Stage};

const TEXT: RuleText = RuleText {
    name: "Validate Layer Structure",
    absent: "Layer stack is empty.",
    failed_header: "Layer structure validation failed with the following issues:",
    all_valid: "Layer stack and all references are valid.",
};

#[derive(Debug, Clone, Copy, Default)]
pub struct LayerStructureRule;

impl Rule for LayerStructureRule {
    fn name(&self) -> &str {
        TEXT.name
    }

    fn check(&self, stage: &mut dyn Stage) -> RuleOutcome {
        check_layers(stage)
    }
}

/// Unresolved assets already reported, keyed by (anchor layer, asset path).
/// A sub-layer that is also a stack member would otherwise report the same
/// broken asset twice.
#[derive(Default)]
struct Unresolved {
    seen: HashSet<(String, String)>,
}

impl Unresolved {
    fn first_report(&mut self, anchor: &Layer, asset: &str) -> bool {
        self.seen
            .insert((anchor.identifier().to_string(), asset.to_string()))
    }
}

fn check_layers(stage: &dyn Stage) -> RuleOutcome {
    let stack = stage.layer_stack();
    if stack.is_empty() {
        return RuleOutcome::fail_with_message(TEXT.name, TEXT.absent);
    }

    let mut findings = Findings::new();
    findings.subject_found();

    if let Some(Some(root)) = stack.first() {
        if !root.is_anonymous() && !root.has_default_prim() {
            findings.push(format!(
                "Root layer missing default prim specification: {}",
                root.identifier()
            ));
        }
    }

    let mut identifiers: HashSet<&str> = HashSet::new();
    let mut unresolved = Unresolved::default();

    for (index, entry) in stack.iter().enumerate() {
        let Some(layer) = entry else {
            findings.push(format!("Broken reference at layer index {}", index));
            continue;
        };

        if !identifiers.insert(layer.identifier()) {
            findings.push(format!(
                "Duplicate layer identifier found: {}",
                layer.identifier()
            ));
        }

        for sublayer_path in layer.sublayer_paths() {
            match stage.find_or_open_layer(layer, sublayer_path) {
                None => {
                    if unresolved.first_report(layer, sublayer_path) {
                        findings.push(format!("Unresolved sublayer: {}", sublayer_path));
                    }
                }
                Some(sublayer) => {
                    for asset in sublayer.external_references() {
                        if stage.find_or_open_layer(&sublayer, asset).is_none()
                            && unresolved.first_report(&sublayer, asset)
                        {
                            findings.push(format!(
                                "Broken external reference in sublayer: {}",
                                asset
                            ));
                        }
                    }
                }
            }
        }

        if !layer.has_pseudo_root() {
            findings.push(format!(
                "Layer at index {} has no root prim (possibly a library or session layer).",
                index
            ));
            continue;
        }

        for reference in layer.references() {
            if stage.find_or_open_layer(layer, reference).is_none()
                && unresolved.first_report(layer, reference)
            {
                findings.push(format!("Broken reference in layer: {}", reference));
            }
        }
        for payload in layer.payloads() {
            if stage.find_or_open_layer(layer, payload).is_none()
                && unresolved.first_report(layer, payload)
            {
                findings.push(format!("Broken payload in layer: {}", payload));
            }
        }
    }

    findings.into_outcome(&TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::ScriptedStage;
    use std::fs;
    use strata_stage::MemoryStage;

    fn layer(identifier: &str, content: &str) -> Layer {
        Layer::from_toml(identifier, content).unwrap()
    }

    fn check(stage: &mut dyn Stage) -> RuleOutcome {
        LayerStructureRule.check(stage)
    }

    #[test]
    fn test_anonymous_scene_passes() {
        let mut stage = MemoryStage::in_memory();
        let outcome = check(&mut stage);
        assert!(outcome.passed);
        assert_eq!(outcome.message, "Layer stack and all references are valid.");
    }

    #[test]
    fn test_empty_stack_fails_immediately() {
        let mut stage = MemoryStage::from_layer_stack(Vec::new());
        let outcome = check(&mut stage);
        assert!(!outcome.passed);
        assert_eq!(outcome.message, "Layer stack is empty.");
    }

    #[test]
    fn test_root_needs_default_prim() {
        let mut stage = MemoryStage::from_layer_stack(vec![layer("shot.toml", "[layer]\n")]);
        let outcome = check(&mut stage);
        assert_eq!(
            outcome.violations,
            vec!["Root layer missing default prim specification: shot.toml"]
        );
    }

    #[test]
    fn test_duplicates_and_library_layers() {
        let mut stage = MemoryStage::from_layer_stack(vec![
            layer("shot.toml", "[layer]\ndefault_prim = \"World\"\n"),
            layer("shot.toml", "[layer]\n"),
            layer("lib.toml", "[prims.\"/Lib/Chair\"]\ntype = \"Mesh\"\n"),
        ]);
        let outcome = check(&mut stage);
        assert_eq!(
            outcome.violations,
            vec![
                "Duplicate layer identifier found: shot.toml",
                "Layer at index 2 has no root prim (possibly a library or session layer).",
            ]
        );
    }

    #[test]
    fn test_broken_references_and_payloads() {
        let mut stage = MemoryStage::from_toml(
            r#"
[prims."/World/Chair"]
references = ["props/chair.toml"]

[prims."/World/Table"]
references = ["props/table_missing.toml"]
payloads = ["heavy_missing.toml"]
"#,
        )
        .unwrap()
        .with_library(vec![layer("props/chair.toml", "[layer]\n")]);

        let outcome = check(&mut stage);
        assert_eq!(
            outcome.violations,
            vec![
                "Broken reference in layer: props/table_missing.toml",
                "Broken payload in layer: heavy_missing.toml",
            ]
        );
    }

    #[test]
    fn test_sublayer_resolution() {
        let mut stage = MemoryStage::from_layer_stack(vec![
            layer(
                "shot.toml",
                "[layer]\ndefault_prim = \"World\"\nsublayers = [\"set.toml\", \"gone.toml\"]\n",
            ),
            layer(
                "set.toml",
                "[layer]\n[prims.\"/World/Set\"]\nreferences = [\"props/missing.toml\"]\n",
            ),
        ]);
        let outcome = check(&mut stage);
        assert_eq!(
            outcome.violations,
            vec![
                "Broken external reference in sublayer: props/missing.toml",
                "Unresolved sublayer: gone.toml",
            ]
        );
    }

    #[test]
    fn test_sublayers_on_disk() {
        let dir = std::env::temp_dir().join(format!("strata_layers_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("shot.toml"),
            "[layer]\ndefault_prim = \"World\"\nsublayers = [\"anim.toml\"]\n\n[prims.\"/World\"]\ntype = \"Xform\"\n",
        )
        .unwrap();
        fs::write(dir.join("anim.toml"), "[layer]\n").unwrap();

        let mut stage = MemoryStage::open(dir.join("shot.toml")).unwrap();
        assert!(check(&mut stage).passed);

        fs::remove_file(dir.join("anim.toml")).unwrap();
        let mut stage = MemoryStage::open(dir.join("shot.toml")).unwrap();
        let outcome = check(&mut stage);
        assert_eq!(outcome.violations, vec!["Unresolved sublayer: anim.toml"]);
    }

    #[test]
    fn test_null_entry_reported_by_index() {
        let inner = MemoryStage::in_memory();
        let root = inner.layer_stack()[0].clone();
        let mut stage = ScriptedStage::new(inner);
        stage.layer_stack = Some(vec![root, None]);

        let outcome = check(&mut stage);
        assert_eq!(outcome.violations, vec!["Broken reference at layer index 1"]);
    }
}
