//! Rim light plugin.

use redlilium_core::scene::{Engine, Mesh, Scene, SubMesh, vertex_kind};

use crate::defines::MaterialDefines;
use crate::plugin::{MaterialPlugin, PluginBase, UniformDescription};
use crate::serialize::{FieldDescriptor, FieldKind, FieldValue};
use crate::shader::{CustomCode, ShaderStage};
use crate::uniform_buffer::{UniformBuffer, UniformField, UniformType};

const RIMLIGHT: &str = "RIMLIGHT";

static FIELDS: [FieldDescriptor; 4] = [
    FieldDescriptor::new("is_enabled", FieldKind::Boolean),
    FieldDescriptor::new("color", FieldKind::Vector),
    FieldDescriptor::new("power", FieldKind::Number),
    FieldDescriptor::new("intensity", FieldKind::Number),
];

const FRAGMENT_DEFINITIONS: &str = "\
#ifdef RIMLIGHT
vec3 rimLight(vec3 normalW, vec3 viewDirectionW) {
    float rim = 1.0 - clamp(dot(normalW, viewDirectionW), 0.0, 1.0);
    return vRimColor.rgb * pow(rim, vRimColor.a);
}
#endif";

const FRAGMENT_BEFORE_FRAGCOLOR: &str = "\
#ifdef RIMLIGHT
    color.rgb += rimLight(normalW, viewDirectionW);
#endif";

/// Brightens surfaces seen at grazing angles.
#[derive(Debug, Clone)]
pub struct RimLightPlugin {
    base: PluginBase,
    /// Rim colour.
    pub color: [f32; 3],
    /// Falloff exponent; higher values give a thinner rim.
    pub power: f32,
    /// Colour multiplier.
    pub intensity: f32,
}

impl Default for RimLightPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl RimLightPlugin {
    pub fn new() -> Self {
        Self {
            base: PluginBase::new("RimLight")
                .with_priority(300)
                .with_define(RIMLIGHT, false),
            color: [1.0, 1.0, 1.0],
            power: 2.0,
            intensity: 1.0,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.base.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.base.enabled = enabled;
    }
}

impl MaterialPlugin for RimLightPlugin {
    fn base(&self) -> &PluginBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PluginBase {
        &mut self.base
    }

    fn class_name(&self) -> &str {
        "RimLightPlugin"
    }

    fn prepare_defines(&self, defines: &mut MaterialDefines, _scene: &Scene, _mesh: &Mesh) {
        defines.set(RIMLIGHT, self.base.enabled);
    }

    fn bind_for_sub_mesh(
        &self,
        uniform_buffer: &mut UniformBuffer,
        _scene: &Scene,
        _engine: &Engine,
        _sub_mesh: &SubMesh,
    ) {
        if !self.base.enabled {
            return;
        }
        let [r, g, b] = self.color.map(|c| c * self.intensity);
        uniform_buffer.update_float4("vRimColor", r, g, b, self.power);
    }

    fn get_custom_code(&self, stage: ShaderStage) -> Option<CustomCode> {
        match stage {
            ShaderStage::Vertex => None,
            ShaderStage::Fragment => Some(
                CustomCode::new()
                    .with_code("CUSTOM_FRAGMENT_DEFINITIONS", FRAGMENT_DEFINITIONS)
                    .with_code("CUSTOM_FRAGMENT_BEFORE_FRAGCOLOR", FRAGMENT_BEFORE_FRAGCOLOR),
            ),
        }
    }

    fn get_attributes(&self, attributes: &mut Vec<String>, _scene: &Scene, mesh: &Mesh) {
        if self.base.enabled
            && mesh.has_vertex_attribute(vertex_kind::NORMAL)
            && !attributes.iter().any(|a| a == vertex_kind::NORMAL)
        {
            attributes.push(vertex_kind::NORMAL.to_string());
        }
    }

    fn uniforms(&self) -> UniformDescription {
        UniformDescription {
            ubo: vec![UniformField::new("vRimColor", UniformType::Vec4)],
            ..Default::default()
        }
    }

    fn field_table(&self) -> &'static [FieldDescriptor] {
        &FIELDS
    }

    fn read_field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "is_enabled" => FieldValue::Boolean(self.base.enabled),
            "color" => FieldValue::Vector(self.color.to_vec()),
            "power" => FieldValue::Number(f64::from(self.power)),
            "intensity" => FieldValue::Number(f64::from(self.intensity)),
            _ => return None,
        })
    }

    fn write_field(&mut self, name: &str, value: FieldValue) -> bool {
        match name {
            "is_enabled" => value.as_bool().map(|v| self.base.enabled = v),
            "color" => value.as_array::<3>().map(|v| self.color = v),
            "power" => value.as_number().map(|v| self.power = v as f32),
            "intensity" => value.as_number().map(|v| self.intensity = v as f32),
            _ => None,
        }
        .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_code_fragment_only() {
        let plugin = RimLightPlugin::new();
        assert!(plugin.get_custom_code(ShaderStage::Vertex).is_none());

        let code = plugin.get_custom_code(ShaderStage::Fragment).unwrap();
        let points: Vec<_> = code.iter().map(|(p, _)| p).collect();
        assert_eq!(
            points,
            vec!["CUSTOM_FRAGMENT_DEFINITIONS", "CUSTOM_FRAGMENT_BEFORE_FRAGCOLOR"]
        );
    }

    #[test]
    fn test_bind_writes_color_and_power() {
        let plugin = RimLightPlugin::new()
            .with_color([0.5, 0.25, 1.0])
            .with_power(4.0);
        let mut ubo = UniformBuffer::new("test");
        plugin.prepare_uniform_buffer(&mut ubo).unwrap();
        ubo.build();

        let mesh = Mesh::new("m");
        let sub_mesh = SubMesh::new(&mesh, 0);
        plugin.bind_for_sub_mesh(&mut ubo, &Scene::new("s"), &Engine::new(), &sub_mesh);
        assert_eq!(ubo.floats("vRimColor"), Some(&[0.5, 0.25, 1.0, 4.0][..]));
    }

    #[test]
    fn test_write_field_checks_shape() {
        let mut plugin = RimLightPlugin::new();
        assert!(!plugin.write_field("color", FieldValue::Vector(vec![1.0])));
        assert!(plugin.write_field("color", FieldValue::Vector(vec![0.0, 1.0, 0.0])));
        assert_eq!(plugin.color, [0.0, 1.0, 0.0]);
        assert!(!plugin.write_field("unknown", FieldValue::Boolean(true)));
    }
}
