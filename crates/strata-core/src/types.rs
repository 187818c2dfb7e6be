//! Spatial types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 3D point or vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(arr: [f32; 3]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
        }
    }

    /// Decode a `[x, y, z]` TOML array, accepting integers and floats
    pub fn from_toml(value: &toml::Value) -> Option<Self> {
        let arr = value.as_array()?;
        if arr.len() != 3 {
            return None;
        }
        let mut out = [0.0f32; 3];
        for (slot, v) in out.iter_mut().zip(arr) {
            *slot = v.as_float().or_else(|| v.as_integer().map(|i| i as f64))? as f32;
        }
        Some(Self::from_array(out))
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_mixed_numbers() {
        let value: toml::Value = toml::Value::Array(vec![
            toml::Value::Integer(1),
            toml::Value::Float(2.5),
            toml::Value::Integer(-3),
        ]);
        assert_eq!(Vec3::from_toml(&value), Some(Vec3::new(1.0, 2.5, -3.0)));
    }

    #[test]
    fn test_from_toml_rejects_wrong_shape() {
        let short = toml::Value::Array(vec![toml::Value::Integer(1), toml::Value::Integer(2)]);
        assert!(Vec3::from_toml(&short).is_none());

        let text = toml::Value::Array(vec![
            toml::Value::String("x".to_string()),
            toml::Value::Integer(0),
            toml::Value::Integer(0),
        ]);
        assert!(Vec3::from_toml(&text).is_none());
    }
}
