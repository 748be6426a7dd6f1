//! Serialized records of plugins and materials.

use serde::{Deserialize, Serialize};

use redlilium_core::texture::TextureRecord;

use super::field::{FieldKind, FieldValue};

/// Format-agnostic value of a serialized field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SerializedValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Vector(Vec<f32>),
    Texture(TextureRecord),
}

impl SerializedValue {
    /// Whether the value can be restored into a field of `kind`.
    pub fn fits(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Self::Boolean(_), FieldKind::Boolean)
                | (Self::Number(_), FieldKind::Number)
                | (Self::String(_), FieldKind::String)
                | (Self::Vector(_), FieldKind::Vector)
                | (Self::Texture(_) | Self::Null, FieldKind::Texture)
        )
    }
}

impl From<&FieldValue> for SerializedValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Boolean(v) => Self::Boolean(*v),
            FieldValue::Number(v) => Self::Number(*v),
            FieldValue::String(v) => Self::String(v.clone()),
            FieldValue::Vector(v) => Self::Vector(v.clone()),
            FieldValue::Texture(Some(t)) => Self::Texture(t.to_record()),
            FieldValue::Texture(None) => Self::Null,
        }
    }
}

/// Serialized state of one plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedPlugin {
    /// Class name used to recreate the plugin.
    pub class_name: String,
    /// Plugin name.
    pub name: String,
    /// Plugin priority.
    pub priority: i32,
    /// Declared serializable fields, in field table order.
    #[serde(default)]
    pub fields: Vec<(String, SerializedValue)>,
}

impl SerializedPlugin {
    /// Value of field `name`.
    pub fn field(&self, name: &str) -> Option<&SerializedValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Serialized plugins of a material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedMaterial {
    /// Material name.
    pub name: String,
    /// Plugins in priority order.
    #[serde(default)]
    pub plugins: Vec<SerializedPlugin>,
}

impl SerializedMaterial {
    /// Record of plugin `name`.
    pub fn plugin(&self, name: &str) -> Option<&SerializedPlugin> {
        self.plugins.iter().find(|p| p.name == name)
    }
}
