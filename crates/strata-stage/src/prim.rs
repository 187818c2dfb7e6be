//! Composed prim snapshots and capability views

use crate::format::Specifier;
use std::collections::BTreeMap;
use strata_core::{ScenePath, Vec3};

const INPUTS_NAMESPACE: &str = "inputs:";
const SHADER_ID: &str = "info:id";
const IMPLEMENTATION_SOURCE: &str = "info:implementationSource";
const SOURCE_ASSET: &str = "info:sourceAsset";
const SURFACE_OUTPUT: &str = "outputs:surface";
const EXTENT: &str = "extent";
const POINTS: &str = "points";

/// Schema type of a composed prim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimType {
    Typeless,
    Scope,
    Xform,
    Mesh,
    Shader,
    Material,
    /// A type name no registered schema answers to
    Unknown(String),
}

impl PrimType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "" => PrimType::Typeless,
            "Scope" => PrimType::Scope,
            "Xform" => PrimType::Xform,
            "Mesh" => PrimType::Mesh,
            "Shader" => PrimType::Shader,
            "Material" => PrimType::Material,
            other => PrimType::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PrimType::Typeless => "",
            PrimType::Scope => "Scope",
            PrimType::Xform => "Xform",
            PrimType::Mesh => "Mesh",
            PrimType::Shader => "Shader",
            PrimType::Material => "Material",
            PrimType::Unknown(name) => name.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PrimType::Unknown(_))
    }
}

/// A composed attribute: its strongest value opinion and connection
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    value: Option<toml::Value>,
    connection: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: Option<toml::Value>) -> Self {
        Self {
            name: name.into(),
            value,
            connection: None,
        }
    }

    pub fn with_connection(mut self, source: impl Into<String>) -> Self {
        self.connection = Some(source.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix (`inputs:diffuse` -> `diffuse`)
    pub fn base_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn value(&self) -> Option<&toml::Value> {
        self.value.as_ref()
    }

    /// Raw connection source path, if the attribute is connected
    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(|v| v.as_str())
    }

    /// Decode the value as a sequence of 3D points
    pub fn as_points(&self) -> Option<Vec<Vec3>> {
        self.value
            .as_ref()?
            .as_array()?
            .iter()
            .map(Vec3::from_toml)
            .collect()
    }
}

/// A variant set as seen on a composed prim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSet {
    pub name: String,
    /// Candidate variant names, in the order the stage reports them
    pub variants: Vec<String>,
    /// Active selection, empty when unset
    pub selection: String,
}

/// Owned snapshot of one composed node.
///
/// Snapshots do not follow later edits to the stage; re-resolve the path
/// through [`Stage::prim_at_path`](crate::Stage::prim_at_path) to observe them.
#[derive(Debug, Clone)]
pub struct Prim {
    path: ScenePath,
    prim_type: PrimType,
    specifier: Specifier,
    active: bool,
    xform_op_order: Vec<String>,
    attributes: BTreeMap<String, Attribute>,
    variant_sets: Vec<VariantSet>,
    children: Vec<ScenePath>,
}

impl Prim {
    pub fn new(path: ScenePath, prim_type: PrimType) -> Self {
        Self {
            path,
            prim_type,
            specifier: Specifier::Def,
            active: true,
            xform_op_order: Vec::new(),
            attributes: BTreeMap::new(),
            variant_sets: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_specifier(mut self, specifier: Specifier) -> Self {
        self.specifier = specifier;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_xform_op_order(mut self, ops: Vec<String>) -> Self {
        self.xform_op_order = ops;
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.insert(attribute.name.clone(), attribute);
        self
    }

    pub fn with_variant_set(mut self, set: VariantSet) -> Self {
        self.variant_sets.push(set);
        self
    }

    pub fn with_children(mut self, children: Vec<ScenePath>) -> Self {
        self.children = children;
        self
    }

    pub fn path(&self) -> &ScenePath {
        &self.path
    }

    pub fn prim_type(&self) -> &PrimType {
        &self.prim_type
    }

    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// A prim is valid when its composed type resolves to a known schema
    pub fn is_valid(&self) -> bool {
        self.prim_type.is_known()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn children(&self) -> &[ScenePath] {
        &self.children
    }

    pub fn variant_sets(&self) -> &[VariantSet] {
        &self.variant_sets
    }

    pub fn variant_set(&self, name: &str) -> Option<&VariantSet> {
        self.variant_sets.iter().find(|s| s.name == name)
    }

    pub fn as_xformable(&self) -> Option<Xformable<'_>> {
        matches!(self.prim_type, PrimType::Xform | PrimType::Mesh).then_some(Xformable { prim: self })
    }

    pub fn as_mesh(&self) -> Option<Mesh<'_>> {
        matches!(self.prim_type, PrimType::Mesh).then_some(Mesh { prim: self })
    }

    pub fn as_shader(&self) -> Option<Shader<'_>> {
        matches!(self.prim_type, PrimType::Shader).then_some(Shader { prim: self })
    }

    pub fn as_material(&self) -> Option<Material<'_>> {
        matches!(self.prim_type, PrimType::Material).then_some(Material { prim: self })
    }
}

/// Transform-capable view of a prim
#[derive(Debug, Clone, Copy)]
pub struct Xformable<'a> {
    prim: &'a Prim,
}

/// One entry of a prim's transform-op order
#[derive(Debug, Clone, Copy)]
pub struct XformOp<'a> {
    pub name: &'a str,
    /// Backing attribute, `None` when the op is declared but not authored
    pub attribute: Option<&'a Attribute>,
}

impl<'a> Xformable<'a> {
    pub fn ordered_xform_ops(&self) -> Vec<XformOp<'a>> {
        self.prim
            .xform_op_order
            .iter()
            .map(|name| XformOp {
                name: name.as_str(),
                attribute: self.prim.attribute(name),
            })
            .collect()
    }
}

/// Mesh view of a prim
#[derive(Debug, Clone, Copy)]
pub struct Mesh<'a> {
    prim: &'a Prim,
}

impl<'a> Mesh<'a> {
    pub fn extent(&self) -> Option<&'a Attribute> {
        self.prim.attribute(EXTENT)
    }

    pub fn points(&self) -> Option<&'a Attribute> {
        self.prim.attribute(POINTS)
    }
}

/// Shader view of a prim
#[derive(Debug, Clone, Copy)]
pub struct Shader<'a> {
    prim: &'a Prim,
}

impl<'a> Shader<'a> {
    /// Shader identifier token, empty when not authored
    pub fn shader_id(&self) -> &'a str {
        self.prim
            .attribute(SHADER_ID)
            .and_then(|a| a.as_str())
            .unwrap_or("")
    }

    pub fn inputs(&self) -> Vec<&'a Attribute> {
        self.prim
            .attributes()
            .filter(|a| a.name().starts_with(INPUTS_NAMESPACE))
            .collect()
    }

    /// Source asset path when the shader is implemented by a source asset
    pub fn source_asset(&self) -> Option<&'a str> {
        let source = self.prim.attribute(IMPLEMENTATION_SOURCE)?.as_str()?;
        if source != "sourceAsset" {
            return None;
        }
        Some(
            self.prim
                .attribute(SOURCE_ASSET)
                .and_then(|a| a.as_str())
                .unwrap_or(""),
        )
    }
}

/// Material view of a prim
#[derive(Debug, Clone, Copy)]
pub struct Material<'a> {
    prim: &'a Prim,
}

impl<'a> Material<'a> {
    pub fn surface_output(&self) -> Option<&'a Attribute> {
        self.prim.attribute(SURFACE_OUTPUT)
    }
}
