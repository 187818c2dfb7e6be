//! Strata Stage - Composed scene graph access
//!
//! This crate defines the `Stage` trait that validation rules consume, and
//! ships `MemoryStage`, a small composition engine over TOML layer files.

mod format;
mod layer;
mod memory;
mod prim;
mod stage;

pub use format::{AttributeDef, AttributeSpec, LayerFile, LayerMetadata, PrimDef, Specifier, VariantDef, VariantSetDef};
pub use layer::Layer;
pub use memory::MemoryStage;
pub use prim::{Attribute, Material, Mesh, Prim, PrimType, Shader, VariantSet, XformOp, Xformable};
pub use stage::Stage;
