//! The stage interface consumed by validation rules

use crate::layer::Layer;
use crate::prim::Prim;
use std::sync::Arc;
use strata_core::{Result, ScenePath};

/// A composed scene graph.
///
/// Queries take `&self`. Variant selection edits take `&mut self`: a
/// selection change is visible to every later query, so callers need
/// exclusive access for the whole select/observe/restore cycle.
pub trait Stage {
    /// Identifier of the root layer, used in report headers
    fn identifier(&self) -> &str;

    /// Depth-first walk of active, defined, non-abstract prims
    fn traverse(&self) -> Vec<Prim>;

    /// Depth-first walk of every prim, including inactive and abstract ones
    fn traverse_all(&self) -> Vec<Prim>;

    /// Resolve a prim from the current composition
    fn prim_at_path(&self, path: &ScenePath) -> Option<Prim>;

    /// Layers contributing to the composition, strongest first.
    /// `None` marks an entry the engine could not load.
    fn layer_stack(&self) -> Vec<Option<Arc<Layer>>>;

    /// Find a layer referenced by `anchor`, loading it if needed
    fn find_or_open_layer(&self, anchor: &Layer, asset_path: &str) -> Option<Arc<Layer>>;

    /// Current selection of a variant set, empty when unset
    fn variant_selection(&self, path: &ScenePath, set: &str) -> String;

    /// Selection made through this stage, overriding the authored one.
    /// `None` when the current selection comes from the layers.
    fn session_variant_selection(&self, path: &ScenePath, set: &str) -> Option<String>;

    fn set_variant_selection(&mut self, path: &ScenePath, set: &str, variant: &str) -> Result<()>;

    /// Drop any selection made through this stage, falling back to the
    /// authored selection
    fn clear_variant_selection(&mut self, path: &ScenePath, set: &str) -> Result<()>;

    /// True if a connection source names a prim that exists and is valid
    fn is_valid_source(&self, source: &str) -> bool {
        ScenePath::parse(source)
            .ok()
            .and_then(|path| self.prim_at_path(&path.prim_path()))
            .map(|prim| prim.is_valid())
            .unwrap_or(false)
    }
}
