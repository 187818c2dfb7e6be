//! Layer file format definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root structure of a layer TOML file
///
/// A file with a `[layer]` header is a scene layer. Files without one
/// (prim libraries, session overrides) still load, but carry no pseudo-root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<LayerMetadata>,
    /// Prim specs keyed by absolute path
    #[serde(default)]
    pub prims: BTreeMap<String, PrimDef>,
}

/// Layer metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_prim: Option<String>,
    /// Sub-layer asset paths, strongest first, relative to this file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sublayers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// How a prim spec contributes to composition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specifier {
    #[default]
    Def,
    Over,
    Class,
}

/// Definition of a prim spec in a layer file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimDef {
    #[serde(default)]
    pub specifier: Specifier,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xform_op_order: Option<Vec<String>>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payloads: Vec<String>,
    #[serde(default)]
    pub variant_sets: BTreeMap<String, VariantSetDef>,
}

/// An attribute opinion
///
/// Either a bare value (`extent = [[0, 0, 0], [1, 1, 1]]`) or a table that
/// declares the attribute with an optional value and connection source
/// (`"inputs:diffuse" = { connect = "/World/Looks/Tex.outputs:rgb" }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeDef {
    Spec(AttributeSpec),
    Value(toml::Value),
}

/// Table form of an attribute opinion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<toml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect: Option<String>,
    /// Marks a declaration with no authored value
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub declared: bool,
}

impl AttributeDef {
    pub fn value(&self) -> Option<&toml::Value> {
        match self {
            AttributeDef::Spec(spec) => spec.value.as_ref(),
            AttributeDef::Value(value) => Some(value),
        }
    }

    pub fn connection(&self) -> Option<&str> {
        match self {
            AttributeDef::Spec(spec) => spec.connect.as_deref(),
            AttributeDef::Value(_) => None,
        }
    }
}

/// A variant set authored on a prim
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantSetDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
    #[serde(default)]
    pub variants: BTreeMap<String, VariantDef>,
}

/// Opinions contributed by one variant when it is selected
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantDef {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDef>,
}

impl LayerFile {
    /// Parse a layer from a TOML string
    pub fn from_toml(content: &str) -> strata_core::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
