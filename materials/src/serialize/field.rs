//! Field tables and runtime field values.

use std::sync::Arc;

use redlilium_core::texture::Texture;

/// Kind of a serializable plugin field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `bool`
    Boolean,
    /// Any scalar number, stored as `f64`.
    Number,
    /// `String`
    String,
    /// Fixed-size float vector (colours, matrices).
    Vector,
    /// Optional shared texture.
    Texture,
}

/// One entry of a plugin type's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as stored in records.
    pub name: &'static str,
    /// Field kind.
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Describe a field.
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Runtime value of a plugin field.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Vector(Vec<f32>),
    Texture(Option<Arc<Texture>>),
}

impl FieldValue {
    /// Kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Boolean(_) => FieldKind::Boolean,
            Self::Number(_) => FieldKind::Number,
            Self::String(_) => FieldKind::String,
            Self::Vector(_) => FieldKind::Vector,
            Self::Texture(_) => FieldKind::Texture,
        }
    }

    /// Copy that shares no texture with `self`.
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Texture(Some(texture)) => Self::Texture(Some(Arc::new(Texture::clone(texture)))),
            other => other.clone(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Vector components when exactly `N` are present.
    pub fn as_array<const N: usize>(&self) -> Option<[f32; N]> {
        match self {
            Self::Vector(v) => v.as_slice().try_into().ok(),
            _ => None,
        }
    }

    /// Texture payload; `None` if the value is not a texture.
    pub fn into_texture(self) -> Option<Option<Arc<Texture>>> {
        match self {
            Self::Texture(t) => Some(t),
            _ => None,
        }
    }
}

impl PartialEq for FieldValue {
    /// Textures compare by record, not identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Vector(a), Self::Vector(b)) => a == b,
            (Self::Texture(a), Self::Texture(b)) => match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => a.to_record() == b.to_record(),
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_clone_detaches_texture() {
        let texture = Arc::new(Texture::from_url("detail", "detail.png"));
        let value = FieldValue::Texture(Some(texture.clone()));
        let copy = value.deep_clone();

        let Some(Some(copied)) = copy.clone().into_texture() else {
            panic!("expected texture");
        };
        assert!(!Arc::ptr_eq(&texture, &copied));
        assert_eq!(value, copy);

        texture.dispose();
        assert!(!copied.is_disposed());
    }

    #[test]
    fn test_as_array() {
        let value = FieldValue::Vector(vec![1.0, 2.0, 3.0]);
        assert_eq!(value.as_array::<3>(), Some([1.0, 2.0, 3.0]));
        assert_eq!(value.as_array::<4>(), None);
        assert_eq!(FieldValue::Number(1.0).as_array::<1>(), None);
    }
}
