//! Layers: one file's worth of opinions

use crate::format::{LayerFile, LayerMetadata, PrimDef};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use strata_core::{Result, ScenePath, StrataError};

/// A loaded layer.
///
/// Identifiers are the canonical file path for layers read from disk and
/// `anon:<tag>` for anonymous in-memory layers.
#[derive(Debug, Clone)]
pub struct Layer {
    identifier: String,
    real_path: Option<PathBuf>,
    anonymous: bool,
    metadata: Option<LayerMetadata>,
    prims: BTreeMap<ScenePath, PrimDef>,
}

impl Layer {
    /// Load a layer from a TOML file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let real_path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let file = LayerFile::from_toml(&content).map_err(|e| {
            StrataError::LayerError(format!("{}: {}", path.display(), e))
        })?;

        let mut layer = Self::from_file(real_path.display().to_string(), file)?;
        layer.real_path = Some(real_path);
        Ok(layer)
    }

    /// Build a named, non-anonymous layer from a TOML string
    pub fn from_toml(identifier: impl Into<String>, content: &str) -> Result<Self> {
        Self::from_file(identifier, LayerFile::from_toml(content)?)
    }

    /// Create an empty anonymous layer
    pub fn new_anonymous(tag: &str) -> Self {
        Self {
            identifier: format!("anon:{}", tag),
            real_path: None,
            anonymous: true,
            metadata: Some(LayerMetadata::default()),
            prims: BTreeMap::new(),
        }
    }

    /// Build an anonymous layer from a TOML string
    pub fn anonymous(tag: &str, content: &str) -> Result<Self> {
        let mut layer = Self::from_toml(format!("anon:{}", tag), content)?;
        layer.anonymous = true;
        if layer.metadata.is_none() {
            layer.metadata = Some(LayerMetadata::default());
        }
        Ok(layer)
    }

    /// Build a layer from already-parsed file contents
    pub fn from_file(identifier: impl Into<String>, file: LayerFile) -> Result<Self> {
        let identifier = identifier.into();
        let mut prims = BTreeMap::new();
        for (key, def) in file.prims {
            let path = ScenePath::parse(&key).map_err(|e| {
                StrataError::LayerError(format!("{}: {}", identifier, e))
            })?;
            if path.is_root() || path.is_property() {
                return Err(StrataError::LayerError(format!(
                    "{}: '{}' cannot hold a prim spec",
                    identifier, key
                )));
            }
            prims.insert(path, def);
        }

        Ok(Self {
            identifier,
            real_path: None,
            anonymous: false,
            metadata: file.layer,
            prims,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn real_path(&self) -> Option<&Path> {
        self.real_path.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Layers without a `[layer]` header have no pseudo-root; they are
    /// prim libraries or session overrides rather than scene layers
    pub fn has_pseudo_root(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn default_prim(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.default_prim.as_deref())
            .filter(|name| !name.is_empty())
    }

    pub fn has_default_prim(&self) -> bool {
        self.default_prim().is_some()
    }

    pub fn sublayer_paths(&self) -> &[String] {
        self.metadata
            .as_ref()
            .map(|m| m.sublayers.as_slice())
            .unwrap_or(&[])
    }

    pub fn prim_spec(&self, path: &ScenePath) -> Option<&PrimDef> {
        self.prims.get(path)
    }

    pub fn prim_specs(&self) -> impl Iterator<Item = (&ScenePath, &PrimDef)> {
        self.prims.iter()
    }

    /// Reference asset paths declared by any prim spec, in path order
    pub fn references(&self) -> Vec<&str> {
        self.prims
            .values()
            .flat_map(|p| p.references.iter())
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Payload asset paths declared by any prim spec, in path order
    pub fn payloads(&self) -> Vec<&str> {
        self.prims
            .values()
            .flat_map(|p| p.payloads.iter())
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Every external asset this layer depends on: sub-layers, references
    /// and payloads
    pub fn external_references(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .sublayer_paths()
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        out.extend(self.references());
        out.extend(self.payloads());
        out
    }

    /// Anchor a relative asset path at this layer's directory
    pub fn resolve_asset_path(&self, asset_path: &str) -> PathBuf {
        let asset = Path::new(asset_path);
        if asset.is_absolute() {
            return asset.to_path_buf();
        }
        match self.real_path.as_deref().and_then(Path::parent) {
            Some(dir) => dir.join(asset),
            None => asset.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("strata_layer_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_open_layer_from_disk() {
        let dir = temp_dir();
        let path = dir.join("shot.toml");
        fs::write(
            &path,
            r#"
[layer]
default_prim = "World"
sublayers = ["anim.toml", "set.toml"]

[prims."/World"]
type = "Xform"
references = ["props/chair.toml"]
payloads = ["heavy.toml"]
"#,
        )
        .unwrap();

        let layer = Layer::open(&path).unwrap();
        assert!(!layer.is_anonymous());
        assert!(layer.has_pseudo_root());
        assert_eq!(layer.default_prim(), Some("World"));
        assert_eq!(layer.sublayer_paths(), vec!["anim.toml", "set.toml"]);
        assert_eq!(
            layer.external_references(),
            vec!["anim.toml", "set.toml", "props/chair.toml", "heavy.toml"]
        );
        assert_eq!(
            layer.resolve_asset_path("anim.toml"),
            fs::canonicalize(&dir).unwrap().join("anim.toml")
        );
    }

    #[test]
    fn test_library_layer_has_no_pseudo_root() {
        let layer = Layer::from_toml(
            "lib.toml",
            r#"
[prims."/Library/Chair"]
type = "Mesh"
"#,
        )
        .unwrap();
        assert!(!layer.has_pseudo_root());
        assert!(!layer.has_default_prim());
        assert!(layer.sublayer_paths().is_empty());
    }

    #[test]
    fn test_anonymous_layer_always_has_pseudo_root() {
        let layer = Layer::anonymous("session", "").unwrap();
        assert!(layer.is_anonymous());
        assert!(layer.has_pseudo_root());
        assert_eq!(layer.identifier(), "anon:session");
    }

    #[test]
    fn test_reject_invalid_prim_keys() {
        let err = Layer::from_toml("bad.toml", "[prims.\"World\"]\n").unwrap_err();
        assert!(matches!(err, StrataError::LayerError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = temp_dir();
        let err = Layer::open(dir.join("missing.toml")).unwrap_err();
        assert!(matches!(err, StrataError::IoError(_)));
    }
}
