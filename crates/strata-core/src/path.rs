//! Absolute node paths

use crate::error::{Result, StrataError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An absolute path to a node in a composed scene graph.
///
/// Paths look like `/World/Geo/Mesh`. A path may carry a property suffix
/// (`/World/Looks/Tex.outputs:rgb`), which is how attribute connections
/// name their source. The pseudo-root is `/`.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScenePath(String);

impl ScenePath {
    /// The pseudo-root path `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and validate a path string
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if !s.starts_with('/') {
            return Err(StrataError::InvalidPath(format!(
                "'{}' is not absolute",
                s
            )));
        }
        if s == "/" {
            return Ok(Self::root());
        }

        let (prim_part, property) = match s.rfind('/') {
            Some(slash) => match s[slash..].find('.') {
                Some(dot) => (&s[..slash + dot], Some(&s[slash + dot + 1..])),
                None => (s, None),
            },
            None => (s, None),
        };

        for component in prim_part[1..].split('/') {
            if !is_valid_identifier(component) {
                return Err(StrataError::InvalidPath(format!(
                    "'{}' has an invalid component '{}'",
                    s, component
                )));
            }
        }

        if let Some(prop) = property {
            if prop.is_empty() || prop.chars().any(|c| c.is_whitespace() || c == '/') {
                return Err(StrataError::InvalidPath(format!(
                    "'{}' has an invalid property name",
                    s
                )));
            }
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// True if the path names a property rather than a prim
    pub fn is_property(&self) -> bool {
        self.property().is_some()
    }

    /// The property part of the path, if any
    pub fn property(&self) -> Option<&str> {
        let slash = self.0.rfind('/')?;
        self.0[slash..].find('.').map(|dot| &self.0[slash + dot + 1..])
    }

    /// The prim this path belongs to (strips any property suffix)
    pub fn prim_path(&self) -> ScenePath {
        match self.property() {
            Some(prop) => {
                let end = self.0.len() - prop.len() - 1;
                Self(self.0[..end].to_string())
            }
            None => self.clone(),
        }
    }

    /// Last component of the prim path, empty for the root
    pub fn name(&self) -> &str {
        if self.is_root() {
            return "";
        }
        let prim_end = self.0.len() - self.property().map(|p| p.len() + 1).unwrap_or(0);
        let prim = &self.0[..prim_end];
        prim.rsplit('/').next().unwrap_or("")
    }

    /// Parent prim path, `None` for the root
    pub fn parent(&self) -> Option<ScenePath> {
        if self.is_root() {
            return None;
        }
        if self.is_property() {
            return Some(self.prim_path());
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// All ancestors from the top-level prim down to (excluding) this path
    pub fn ancestors(&self) -> Vec<ScenePath> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(path) = current {
            if path.is_root() {
                break;
            }
            current = path.parent();
            out.push(path);
        }
        out.reverse();
        out
    }
}

fn is_valid_identifier(component: &str) -> bool {
    !component.is_empty()
        && component
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

impl FromStr for ScenePath {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ScenePath {
    type Error = StrataError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ScenePath> for String {
    fn from(path: ScenePath) -> Self {
        path.0
    }
}

impl fmt::Debug for ScenePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScenePath({})", self.0)
    }
}

impl fmt::Display for ScenePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
