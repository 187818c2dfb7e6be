//! Strata Core - Foundational types for the Strata scene validator
//!
//! This crate provides the core types that all other Strata crates depend on:
//! - `ScenePath` - Absolute node paths in a composed scene graph
//! - `Vec3` - Point type used by geometry attributes
//! - Error types and Result alias

mod error;
mod path;
mod types;

pub use error::{Result, StrataError};
pub use path::ScenePath;
pub use types::Vec3;
