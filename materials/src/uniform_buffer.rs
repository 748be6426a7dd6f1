//! Uniform buffer layout and per-draw storage.
//!
//! Plugins declare their fields once, when the material builds its layout
//! ([`MaterialPlugin::prepare_uniform_buffer`](crate::MaterialPlugin::prepare_uniform_buffer)),
//! and write values every draw
//! ([`MaterialPlugin::bind_for_sub_mesh`](crate::MaterialPlugin::bind_for_sub_mesh)).

use std::sync::Arc;

use redlilium_core::texture::Texture;

use crate::error::{PluginError, PluginResult};

/// Type of a uniform buffer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat4`
    Mat4,
    /// `int`
    Int,
}

impl UniformType {
    /// Number of 32-bit components.
    pub fn components(&self) -> usize {
        match self {
            Self::Float | Self::Int => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            Self::Mat4 => 16,
        }
    }
}

/// One declared uniform buffer field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: UniformType,
    /// Array length, 1 for scalars.
    pub array_size: usize,
}

impl UniformField {
    /// Declare a non-array field.
    pub fn new(name: impl Into<String>, ty: UniformType) -> Self {
        Self {
            name: name.into(),
            ty,
            array_size: 1,
        }
    }

    /// Make the field an array.
    #[must_use]
    pub fn with_array_size(mut self, array_size: usize) -> Self {
        self.array_size = array_size.max(1);
        self
    }

    /// Number of `f32` slots occupied.
    pub fn size(&self) -> usize {
        self.ty.components() * self.array_size
    }
}

/// Uniform buffer shared by the host material and its plugins.
///
/// The layout is append-only until [`build`](Self::build). Re-declaring a
/// field with the same type and size is tolerated; any other
/// re-declaration is a configuration error.
#[derive(Debug, Clone, Default)]
pub struct UniformBuffer {
    label: String,
    fields: Vec<UniformField>,
    offsets: Vec<usize>,
    data: Vec<f32>,
    textures: Vec<(String, Arc<Texture>)>,
    built: bool,
}

impl UniformBuffer {
    /// Create an empty buffer; `label` names it in errors and logs.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Declare a field.
    pub fn add_uniform(&mut self, field: UniformField) -> PluginResult<()> {
        if let Some(existing) = self.fields.iter().find(|f| f.name == field.name) {
            if *existing == field {
                return Ok(());
            }
            return Err(PluginError::UniformCollision {
                uniform: field.name,
                first: format!("{:?}[{}]", existing.ty, existing.array_size),
                second: format!("{:?}[{}]", field.ty, field.array_size),
            });
        }
        if self.built {
            return Err(PluginError::LayoutAlreadyBuilt(self.label.clone()));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Freeze the layout and allocate storage. Calling it again is a no-op.
    pub fn build(&mut self) {
        if self.built {
            return;
        }
        let mut offset = 0;
        self.offsets.clear();
        for field in &self.fields {
            self.offsets.push(offset);
            offset += field.size();
        }
        self.data = vec![0.0; offset];
        self.built = true;
        log::trace!(
            "Uniform buffer '{}' built: {} fields, {} floats",
            self.label,
            self.fields.len(),
            offset
        );
    }

    /// Whether the layout is frozen.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Whether `name` is declared.
    pub fn has_uniform(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Write `values` into field `name`, truncated to the field size.
    ///
    /// Unknown fields and writes before [`build`](Self::build) are ignored.
    pub fn update_floats(&mut self, name: &str, values: &[f32]) {
        let Some(index) = self.fields.iter().position(|f| f.name == name) else {
            log::warn!("Uniform buffer '{}': unknown field '{name}'", self.label);
            return;
        };
        if !self.built {
            log::warn!(
                "Uniform buffer '{}': write to '{name}' before layout was built",
                self.label
            );
            return;
        }
        let offset = self.offsets[index];
        let len = values.len().min(self.fields[index].size());
        self.data[offset..offset + len].copy_from_slice(&values[..len]);
    }

    /// Write a `float`.
    pub fn update_float(&mut self, name: &str, x: f32) {
        self.update_floats(name, &[x]);
    }

    /// Write a `vec2`.
    pub fn update_float2(&mut self, name: &str, x: f32, y: f32) {
        self.update_floats(name, &[x, y]);
    }

    /// Write a `vec3`.
    pub fn update_float3(&mut self, name: &str, x: f32, y: f32, z: f32) {
        self.update_floats(name, &[x, y, z]);
    }

    /// Write a `vec4`.
    pub fn update_float4(&mut self, name: &str, x: f32, y: f32, z: f32, w: f32) {
        self.update_floats(name, &[x, y, z, w]);
    }

    /// Read back the current values of a field.
    pub fn floats(&self, name: &str) -> Option<&[f32]> {
        let index = self.fields.iter().position(|f| f.name == name)?;
        let offset = *self.offsets.get(index)?;
        Some(&self.data[offset..offset + self.fields[index].size()])
    }

    /// Bind a texture to a sampler for the current draw.
    pub fn set_texture(&mut self, sampler: &str, texture: Arc<Texture>) {
        match self.textures.iter_mut().find(|(s, _)| s == sampler) {
            Some((_, bound)) => *bound = texture,
            None => self.textures.push((sampler.to_string(), texture)),
        }
    }

    /// Texture bound to a sampler.
    pub fn texture(&self, sampler: &str) -> Option<&Arc<Texture>> {
        self.textures
            .iter()
            .find(|(s, _)| s == sampler)
            .map(|(_, t)| t)
    }

    /// Raw storage for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_redeclaration_is_tolerated() {
        let mut ubo = UniformBuffer::new("material");
        ubo.add_uniform(UniformField::new("vDetailInfos", UniformType::Vec4))
            .unwrap();
        ubo.add_uniform(UniformField::new("vDetailInfos", UniformType::Vec4))
            .unwrap();
        assert_eq!(ubo.fields().len(), 1);
    }

    #[test]
    fn test_conflicting_redeclaration_is_rejected() {
        let mut ubo = UniformBuffer::new("material");
        ubo.add_uniform(UniformField::new("vDetailInfos", UniformType::Vec4))
            .unwrap();
        let err = ubo
            .add_uniform(UniformField::new("vDetailInfos", UniformType::Vec3))
            .unwrap_err();
        assert!(matches!(err, PluginError::UniformCollision { .. }));
    }

    #[test]
    fn test_layout_frozen_after_build() {
        let mut ubo = UniformBuffer::new("material");
        ubo.add_uniform(UniformField::new("a", UniformType::Float))
            .unwrap();
        ubo.build();
        let err = ubo
            .add_uniform(UniformField::new("b", UniformType::Float))
            .unwrap_err();
        assert_eq!(err, PluginError::LayoutAlreadyBuilt("material".into()));
    }

    #[test]
    fn test_updates_land_at_field_offsets() {
        let mut ubo = UniformBuffer::new("material");
        ubo.add_uniform(UniformField::new("a", UniformType::Float))
            .unwrap();
        ubo.add_uniform(UniformField::new("b", UniformType::Vec4))
            .unwrap();
        ubo.add_uniform(UniformField::new("c", UniformType::Vec2).with_array_size(2))
            .unwrap();
        ubo.build();

        ubo.update_float("a", 1.0);
        ubo.update_float4("b", 2.0, 3.0, 4.0, 5.0);
        ubo.update_floats("c", &[6.0, 7.0, 8.0, 9.0, 10.0]);
        ubo.update_float("missing", 11.0);

        assert_eq!(ubo.floats("a"), Some(&[1.0][..]));
        assert_eq!(ubo.floats("b"), Some(&[2.0, 3.0, 4.0, 5.0][..]));
        assert_eq!(ubo.floats("c"), Some(&[6.0, 7.0, 8.0, 9.0][..]));
        assert_eq!(ubo.as_bytes().len(), 9 * 4);
    }
}
