//! In-memory composition over TOML layers

use crate::format::{AttributeDef, PrimDef, Specifier, VariantDef};
use crate::layer::Layer;
use crate::prim::{Attribute, Prim, PrimType, VariantSet};
use crate::stage::Stage;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use strata_core::{Result, ScenePath, StrataError};
use tracing::{debug, warn};

/// A stage composed from a layer stack held in memory.
///
/// Layers are combined strongest-first. Variant opinions are weaker than
/// local opinions on the same prim. Selections made through
/// [`Stage::set_variant_selection`] live in a session table that overrides
/// authored selections until cleared.
pub struct MemoryStage {
    identifier: String,
    layers: Vec<Option<Arc<Layer>>>,
    library: Vec<Arc<Layer>>,
    /// parent -> children, covering every prim with a spec and its ancestors
    hierarchy: BTreeMap<ScenePath, BTreeSet<ScenePath>>,
    selections: HashMap<(ScenePath, String), String>,
}

impl MemoryStage {
    /// Open a stage rooted at a layer file, expanding its sub-layers
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let root = Layer::open(path).map_err(|e| StrataError::StageOpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(layer = root.identifier(), "opened root layer");
        Ok(Self::from_root(root))
    }

    /// An empty stage over a single anonymous layer
    pub fn in_memory() -> Self {
        Self::from_layer_stack(vec![Layer::new_anonymous("root")])
    }

    /// A stage whose root is an anonymous layer parsed from `content`
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(Self::from_root(Layer::anonymous("root", content)?))
    }

    /// A stage over an explicit layer stack, strongest first. Sub-layers
    /// declared by these layers are not expanded.
    pub fn from_layer_stack(layers: Vec<Layer>) -> Self {
        let identifier = layers
            .first()
            .map(|l| l.identifier().to_string())
            .unwrap_or_else(|| "anon:empty".to_string());
        let layers: Vec<Option<Arc<Layer>>> = layers.into_iter().map(|l| Some(Arc::new(l))).collect();
        Self::build(identifier, layers)
    }

    /// Make extra layers resolvable by `find_or_open_layer` without disk
    /// access; they are matched by identifier
    pub fn with_library(mut self, layers: Vec<Layer>) -> Self {
        self.library.extend(layers.into_iter().map(Arc::new));
        self
    }

    fn from_root(root: Layer) -> Self {
        let identifier = root.identifier().to_string();
        let mut stack = Vec::new();
        let mut chain = Vec::new();
        collect_layer_stack(Arc::new(root), &mut stack, &mut chain);
        Self::build(identifier, stack)
    }

    fn build(identifier: String, layers: Vec<Option<Arc<Layer>>>) -> Self {
        let mut hierarchy: BTreeMap<ScenePath, BTreeSet<ScenePath>> = BTreeMap::new();
        hierarchy.insert(ScenePath::root(), BTreeSet::new());

        for layer in layers.iter().flatten() {
            for (path, _) in layer.prim_specs() {
                let mut lineage = path.ancestors();
                lineage.push(path.clone());
                let mut parent = ScenePath::root();
                for node in lineage {
                    hierarchy.entry(parent).or_default().insert(node.clone());
                    hierarchy.entry(node.clone()).or_default();
                    parent = node;
                }
            }
        }

        Self {
            identifier,
            layers,
            library: Vec::new(),
            hierarchy,
            selections: HashMap::new(),
        }
    }

    fn specs(&self, path: &ScenePath) -> Vec<&PrimDef> {
        self.layers
            .iter()
            .flatten()
            .filter_map(|layer| layer.prim_spec(path))
            .collect()
    }

    fn compose(&self, path: &ScenePath) -> Option<Prim> {
        let children = self.hierarchy.get(path)?;
        if path.is_root() {
            return None;
        }
        let specs = self.specs(path);

        let specifier = if specs.is_empty() || specs.iter().any(|s| s.specifier == Specifier::Def) {
            Specifier::Def
        } else if specs.iter().any(|s| s.specifier == Specifier::Class) {
            Specifier::Class
        } else {
            Specifier::Over
        };

        // Variant sets: union of names and candidates, strongest authored selection
        let mut sets: BTreeMap<&str, (BTreeSet<&str>, Option<&str>)> = BTreeMap::new();
        for spec in &specs {
            for (name, set) in &spec.variant_sets {
                let entry = sets.entry(name.as_str()).or_default();
                entry.0.extend(set.variants.keys().map(String::as_str));
                if entry.1.is_none() {
                    entry.1 = set.selection.as_deref();
                }
            }
        }

        let variant_sets: Vec<VariantSet> = sets
            .into_iter()
            .map(|(name, (variants, authored))| {
                let selection = self
                    .selections
                    .get(&(path.clone(), name.to_string()))
                    .map(String::as_str)
                    .or(authored)
                    .unwrap_or("")
                    .to_string();
                VariantSet {
                    name: name.to_string(),
                    variants: variants.into_iter().map(str::to_string).collect(),
                    selection,
                }
            })
            .collect();

        let selected: Vec<&VariantDef> = variant_sets
            .iter()
            .filter(|set| !set.selection.is_empty())
            .flat_map(|set| {
                specs.iter().filter_map(move |spec| {
                    spec.variant_sets
                        .get(&set.name)
                        .and_then(|s| s.variants.get(&set.selection))
                })
            })
            .collect();

        let type_name = specs
            .iter()
            .find_map(|s| s.type_name.as_deref())
            .or_else(|| selected.iter().find_map(|v| v.type_name.as_deref()))
            .unwrap_or("");

        let active = specs.iter().find_map(|s| s.active).unwrap_or(true);
        let xform_op_order = specs
            .iter()
            .find_map(|s| s.xform_op_order.clone())
            .unwrap_or_default();

        let mut attributes: BTreeMap<&str, &AttributeDef> = BTreeMap::new();
        let local = specs.iter().flat_map(|s| s.attributes.iter());
        let from_variants = selected.iter().flat_map(|v| v.attributes.iter());
        for (name, def) in local.chain(from_variants) {
            attributes.entry(name.as_str()).or_insert(def);
        }

        let mut prim = Prim::new(path.clone(), PrimType::from_name(type_name))
            .with_specifier(specifier)
            .with_active(active)
            .with_xform_op_order(xform_op_order)
            .with_children(children.iter().cloned().collect());
        for (name, def) in attributes {
            let mut attribute = Attribute::new(name, def.value().cloned());
            if let Some(source) = def.connection() {
                attribute = attribute.with_connection(source);
            }
            prim = prim.with_attribute(attribute);
        }
        for set in variant_sets {
            prim = prim.with_variant_set(set);
        }

        Some(prim)
    }

    fn walk(&self, path: &ScenePath, prune: bool, out: &mut Vec<Prim>) {
        let Some(children) = self.hierarchy.get(path) else {
            return;
        };
        for child in children {
            let Some(prim) = self.compose(child) else {
                continue;
            };
            if prune && (!prim.is_active() || prim.specifier() != Specifier::Def) {
                continue;
            }
            out.push(prim);
            self.walk(child, prune, out);
        }
    }
}

/// Depth-first sub-layer expansion. Unloadable sub-layers are left out of
/// the stack; a sub-layer already on the current chain is a cycle and is cut.
fn collect_layer_stack(layer: Arc<Layer>, stack: &mut Vec<Option<Arc<Layer>>>, chain: &mut Vec<String>) {
    chain.push(layer.identifier().to_string());
    stack.push(Some(Arc::clone(&layer)));

    for sublayer_path in layer.sublayer_paths() {
        let resolved = layer.resolve_asset_path(sublayer_path);
        match Layer::open(&resolved) {
            Ok(sublayer) => {
                if chain.iter().any(|id| id == sublayer.identifier()) {
                    warn!(
                        layer = layer.identifier(),
                        sublayer = %sublayer_path,
                        "sublayer cycle detected, skipping"
                    );
                    continue;
                }
                collect_layer_stack(Arc::new(sublayer), stack, chain);
            }
            Err(e) => {
                warn!(
                    layer = layer.identifier(),
                    sublayer = %sublayer_path,
                    error = %e,
                    "skipping unresolvable sublayer"
                );
            }
        }
    }

    chain.pop();
}

impl Stage for MemoryStage {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn traverse(&self) -> Vec<Prim> {
        let mut out = Vec::new();
        self.walk(&ScenePath::root(), true, &mut out);
        out
    }

    fn traverse_all(&self) -> Vec<Prim> {
        let mut out = Vec::new();
        self.walk(&ScenePath::root(), false, &mut out);
        out
    }

    fn prim_at_path(&self, path: &ScenePath) -> Option<Prim> {
        self.compose(&path.prim_path())
    }

    fn layer_stack(&self) -> Vec<Option<Arc<Layer>>> {
        self.layers.clone()
    }

    fn find_or_open_layer(&self, anchor: &Layer, asset_path: &str) -> Option<Arc<Layer>> {
        let resolved = anchor.resolve_asset_path(asset_path);
        let canonical = fs::canonicalize(&resolved).ok();

        let known = self
            .layers
            .iter()
            .flatten()
            .chain(self.library.iter())
            .find(|layer| {
                layer.identifier() == asset_path
                    || (canonical.is_some() && layer.real_path() == canonical.as_deref())
            });
        if let Some(layer) = known {
            return Some(Arc::clone(layer));
        }

        match Layer::open(&resolved) {
            Ok(layer) => Some(Arc::new(layer)),
            Err(e) => {
                debug!(asset = asset_path, anchor = anchor.identifier(), error = %e, "layer did not resolve");
                None
            }
        }
    }

    fn variant_selection(&self, path: &ScenePath, set: &str) -> String {
        self.prim_at_path(path)
            .and_then(|prim| prim.variant_set(set).map(|s| s.selection.clone()))
            .unwrap_or_default()
    }

    fn session_variant_selection(&self, path: &ScenePath, set: &str) -> Option<String> {
        self.selections
            .get(&(path.prim_path(), set.to_string()))
            .cloned()
    }

    fn set_variant_selection(&mut self, path: &ScenePath, set: &str, variant: &str) -> Result<()> {
        let prim = self
            .prim_at_path(path)
            .ok_or_else(|| StrataError::PrimNotFound(path.to_string()))?;
        let variant_set = prim.variant_set(set).ok_or_else(|| StrataError::VariantSetNotFound {
            prim: path.to_string(),
            set: set.to_string(),
        })?;
        if !variant_set.variants.iter().any(|v| v == variant) {
            return Err(StrataError::VariantNotFound {
                prim: path.to_string(),
                set: set.to_string(),
                variant: variant.to_string(),
            });
        }

        debug!(prim = %path, set, variant, "variant selected");
        self.selections
            .insert((path.prim_path(), set.to_string()), variant.to_string());
        Ok(())
    }

    fn clear_variant_selection(&mut self, path: &ScenePath, set: &str) -> Result<()> {
        if self.prim_at_path(path).is_none() {
            return Err(StrataError::PrimNotFound(path.to_string()));
        }
        self.selections.remove(&(path.prim_path(), set.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> ScenePath {
        ScenePath::parse(s).unwrap()
    }

    fn temp_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("strata_stage_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_stage() -> MemoryStage {
        MemoryStage::from_toml(
            r#"
[prims."/World"]
type = "Xform"

[prims."/World/Geo/Cube"]
type = "Mesh"

[prims."/World/Hidden"]
type = "Xform"
active = false

[prims."/World/Hidden/Child"]
type = "Mesh"

[prims."/World/Proto"]
specifier = "class"
type = "Xform"

[prims."/World/Broken"]
type = "Sprocket"
"#,
        )
        .unwrap()
    }

    fn paths(prims: &[Prim]) -> Vec<String> {
        prims.iter().map(|p| p.path().to_string()).collect()
    }

    #[test]
    fn test_traverse_prunes_inactive_and_abstract() {
        let stage = sample_stage();
        assert_eq!(
            paths(&stage.traverse()),
            vec!["/World", "/World/Broken", "/World/Geo", "/World/Geo/Cube"]
        );
    }

    #[test]
    fn test_traverse_all_visits_everything() {
        let stage = sample_stage();
        assert_eq!(
            paths(&stage.traverse_all()),
            vec![
                "/World",
                "/World/Broken",
                "/World/Geo",
                "/World/Geo/Cube",
                "/World/Hidden",
                "/World/Hidden/Child",
                "/World/Proto",
            ]
        );
    }

    #[test]
    fn test_implicit_parent_is_typeless_def() {
        let stage = sample_stage();
        let geo = stage.prim_at_path(&path("/World/Geo")).unwrap();
        assert_eq!(geo.prim_type(), &PrimType::Typeless);
        assert!(geo.is_valid());
        assert_eq!(geo.children(), &[path("/World/Geo/Cube")]);
    }

    #[test]
    fn test_unknown_type_is_invalid_but_present() {
        let stage = sample_stage();
        let broken = stage.prim_at_path(&path("/World/Broken")).unwrap();
        assert!(!broken.is_valid());
        assert!(stage.prim_at_path(&path("/World/Nope")).is_none());
        assert!(stage.prim_at_path(&ScenePath::root()).is_none());
    }

    #[test]
    fn test_stronger_layer_wins() {
        let strong = Layer::from_toml(
            "strong.toml",
            r#"
[prims."/World"]
specifier = "over"
type = "Xform"

[prims."/World".attributes]
size = 2
"#,
        )
        .unwrap();
        let weak = Layer::from_toml(
            "weak.toml",
            r#"
[prims."/World"]
type = "Scope"

[prims."/World".attributes]
size = 1
color = "red"
"#,
        )
        .unwrap();

        let stage = MemoryStage::from_layer_stack(vec![strong, weak]);
        let world = stage.prim_at_path(&path("/World")).unwrap();
        assert_eq!(world.prim_type(), &PrimType::Xform);
        assert_eq!(world.specifier(), Specifier::Def);
        assert_eq!(world.attribute("size").unwrap().value(), Some(&toml::Value::Integer(2)));
        assert!(world.attribute("color").is_some());
        assert_eq!(stage.identifier(), "strong.toml");
    }

    #[test]
    fn test_variant_selection_changes_composition() {
        let mut stage = MemoryStage::from_toml(
            r#"
[prims."/World/Asset".variant_sets.look]
selection = "red"

[prims."/World/Asset".variant_sets.look.variants.red]
type = "Mesh"

[prims."/World/Asset".variant_sets.look.variants.broken]
type = "Sprocket"
"#,
        )
        .unwrap();
        let asset = path("/World/Asset");

        assert_eq!(stage.variant_selection(&asset, "look"), "red");
        assert_eq!(stage.prim_at_path(&asset).unwrap().prim_type(), &PrimType::Mesh);

        stage.set_variant_selection(&asset, "look", "broken").unwrap();
        assert_eq!(stage.variant_selection(&asset, "look"), "broken");
        assert_eq!(stage.session_variant_selection(&asset, "look").as_deref(), Some("broken"));
        assert!(!stage.prim_at_path(&asset).unwrap().is_valid());

        stage.clear_variant_selection(&asset, "look").unwrap();
        assert_eq!(stage.variant_selection(&asset, "look"), "red");
        assert_eq!(stage.session_variant_selection(&asset, "look"), None);
    }

    #[test]
    fn test_set_unknown_variant_fails() {
        let mut stage = MemoryStage::from_toml(
            r#"
[prims."/World".variant_sets.look.variants.red]
"#,
        )
        .unwrap();
        let world = path("/World");

        assert!(matches!(
            stage.set_variant_selection(&world, "look", "green"),
            Err(StrataError::VariantNotFound { .. })
        ));
        assert!(matches!(
            stage.set_variant_selection(&world, "size", "big"),
            Err(StrataError::VariantSetNotFound { .. })
        ));
        assert!(matches!(
            stage.set_variant_selection(&path("/Nope"), "look", "red"),
            Err(StrataError::PrimNotFound(_))
        ));
        assert_eq!(stage.variant_selection(&world, "look"), "");
    }

    #[test]
    fn test_open_expands_sublayers() {
        let dir = temp_dir();
        fs::write(
            dir.join("shot.toml"),
            r#"
[layer]
default_prim = "World"
sublayers = ["set.toml", "missing.toml"]

[prims."/World"]
type = "Xform"
"#,
        )
        .unwrap();
        fs::write(
            dir.join("set.toml"),
            r#"
[layer]
sublayers = ["shot.toml"]

[prims."/World/Table"]
type = "Mesh"
"#,
        )
        .unwrap();

        let stage = MemoryStage::open(dir.join("shot.toml")).unwrap();
        let stack = stage.layer_stack();
        assert_eq!(stack.len(), 2);
        assert!(stack.iter().all(|l| l.is_some()));
        assert!(stage.prim_at_path(&path("/World/Table")).is_some());

        let root = stack[0].as_ref().unwrap();
        assert!(stage.find_or_open_layer(root, "set.toml").is_some());
        assert!(stage.find_or_open_layer(root, "missing.toml").is_none());
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = temp_dir();
        let err = MemoryStage::open(dir.join("nope.toml")).err().unwrap();
        assert!(matches!(err, StrataError::StageOpenFailed { .. }));
    }

    #[test]
    fn test_library_layers_resolve_by_identifier() {
        let library = Layer::from_toml("props/chair.toml", "").unwrap();
        let stage = MemoryStage::in_memory().with_library(vec![library]);
        let root = stage.layer_stack()[0].clone().unwrap();

        assert!(stage.find_or_open_layer(&root, "props/chair.toml").is_some());
        assert!(stage.find_or_open_layer(&root, "props/table.toml").is_none());
    }
}
