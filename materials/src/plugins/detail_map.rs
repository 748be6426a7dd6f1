//! Detail map plugin.

use std::sync::Arc;

use redlilium_core::scene::{Animatable, Engine, Mesh, Scene, SubMesh, TextureChannels};
use redlilium_core::texture::Texture;

use crate::defines::MaterialDefines;
use crate::fallbacks::EffectFallbacks;
use crate::plugin::{MaterialPlugin, PluginBase, UniformDescription};
use crate::serialize::{FieldDescriptor, FieldKind, FieldValue};
use crate::uniform_buffer::{UniformBuffer, UniformField, UniformType};

const DETAIL: &str = "DETAIL";
const DETAIL_DIRECT_UV: &str = "DETAILDIRECTUV";
const DETAIL_NORMAL_BLEND_METHOD: &str = "DETAIL_NORMALBLENDMETHOD";
const SAMPLER: &str = "detailSampler";

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

static FIELDS: [FieldDescriptor; 7] = [
    FieldDescriptor::new("is_enabled", FieldKind::Boolean),
    FieldDescriptor::new("texture", FieldKind::Texture),
    FieldDescriptor::new("coordinates_index", FieldKind::Number),
    FieldDescriptor::new("diffuse_blend_level", FieldKind::Number),
    FieldDescriptor::new("roughness_blend_level", FieldKind::Number),
    FieldDescriptor::new("bump_level", FieldKind::Number),
    FieldDescriptor::new("normal_blend_method", FieldKind::Number),
];

/// How the detail normal is combined with the base normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalBlendMethod {
    /// Whiteout blend.
    #[default]
    Whiteout,
    /// Reoriented normal mapping.
    Rnm,
}

impl NormalBlendMethod {
    fn as_number(self) -> u32 {
        match self {
            Self::Whiteout => 0,
            Self::Rnm => 1,
        }
    }

    fn from_number(value: f64) -> Option<Self> {
        match value as i64 {
            0 => Some(Self::Whiteout),
            1 => Some(Self::Rnm),
            _ => None,
        }
    }
}

/// Blends a tiled detail texture into diffuse, bump and roughness.
///
/// The texture's red channel carries diffuse detail, green and alpha the
/// normal, blue the roughness. Each blend level scales one contribution.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use redlilium_core::texture::Texture;
/// use redlilium_materials::{PluginMaterial, plugins::DetailMapPlugin};
///
/// let mut material = PluginMaterial::new("ground");
/// let texture = Arc::new(Texture::from_url("d", "detail.png"));
/// let detail = material
///     .attach(DetailMapPlugin::new().with_texture(texture))
///     .unwrap();
/// detail.diffuse_blend_level = 0.5;
/// ```
#[derive(Debug)]
pub struct DetailMapPlugin {
    base: PluginBase,
    texture: Option<Arc<Texture>>,
    /// UV set sampled by the detail texture.
    pub coordinates_index: u32,
    /// Strength of the diffuse detail.
    pub diffuse_blend_level: f32,
    /// Strength of the roughness detail.
    pub roughness_blend_level: f32,
    /// Strength of the normal detail.
    pub bump_level: f32,
    /// Normal combination method.
    pub normal_blend_method: NormalBlendMethod,
}

impl Default for DetailMapPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailMapPlugin {
    /// Create an unregistered detail map plugin without texture.
    pub fn new() -> Self {
        Self {
            base: PluginBase::new("DetailMap")
                .with_priority(140)
                .with_define(DETAIL, false)
                .with_define(DETAIL_DIRECT_UV, 0)
                .with_define(DETAIL_NORMAL_BLEND_METHOD, 0),
            texture: None,
            coordinates_index: 0,
            diffuse_blend_level: 1.0,
            roughness_blend_level: 1.0,
            bump_level: 1.0,
            normal_blend_method: NormalBlendMethod::Whiteout,
        }
    }

    /// Set the detail texture.
    #[must_use]
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn texture(&self) -> Option<&Arc<Texture>> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Option<Arc<Texture>>) {
        self.texture = texture;
    }

    pub fn is_enabled(&self) -> bool {
        self.base.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.base.enabled = enabled;
    }

    /// Texture sampled in `scene`. Detail normals need screen-space
    /// derivatives, so engines without them get no detail map.
    fn active_texture(&self, scene: &Scene) -> Option<&Arc<Texture>> {
        if self.base.enabled
            && scene.texture_channel_enabled(TextureChannels::DETAIL)
            && scene.engine().caps.standard_derivatives
        {
            self.texture.as_ref()
        } else {
            None
        }
    }
}

impl MaterialPlugin for DetailMapPlugin {
    fn base(&self) -> &PluginBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut PluginBase {
        &mut self.base
    }

    fn class_name(&self) -> &str {
        "DetailMapConfiguration"
    }

    fn is_ready_for_sub_mesh(
        &self,
        _defines: &MaterialDefines,
        scene: &Scene,
        _engine: &Engine,
        _sub_mesh: &SubMesh,
    ) -> bool {
        self.active_texture(scene).is_none_or(|t| t.is_ready())
    }

    fn prepare_defines(&self, defines: &mut MaterialDefines, scene: &Scene, _mesh: &Mesh) {
        if self.active_texture(scene).is_some() {
            defines.set(DETAIL, true);
            defines.set(DETAIL_DIRECT_UV, self.coordinates_index + 1);
            defines.set(DETAIL_NORMAL_BLEND_METHOD, self.normal_blend_method.as_number());
        } else {
            defines.set(DETAIL, false);
        }
    }

    fn bind_for_sub_mesh(
        &self,
        uniform_buffer: &mut UniformBuffer,
        scene: &Scene,
        _engine: &Engine,
        _sub_mesh: &SubMesh,
    ) {
        let Some(texture) = self.active_texture(scene) else {
            return;
        };
        uniform_buffer.update_float4(
            "vDetailInfos",
            self.coordinates_index as f32,
            self.diffuse_blend_level,
            self.bump_level,
            self.roughness_blend_level,
        );
        uniform_buffer.update_floats("detailMatrix", &IDENTITY);
        uniform_buffer.set_texture(SAMPLER, texture.clone());
    }

    fn dispose(&mut self, force_dispose_textures: bool) {
        if force_dispose_textures {
            if let Some(texture) = self.texture.take() {
                texture.dispose();
            }
        }
        self.base.mark_disposed();
    }

    fn has_texture(&self, texture: &Texture) -> bool {
        self.texture
            .as_deref()
            .is_some_and(|own| std::ptr::eq(own, texture))
    }

    fn has_render_target_textures(&self) -> bool {
        self.texture.as_ref().is_some_and(|t| t.is_render_target())
    }

    fn get_active_textures(&self, textures: &mut Vec<Arc<Texture>>) {
        if let Some(texture) = &self.texture {
            textures.push(texture.clone());
        }
    }

    fn get_animatables(&self, animatables: &mut Vec<Arc<dyn Animatable>>) {
        if let Some(texture) = &self.texture {
            if texture.has_animations() {
                animatables.push(texture.clone());
            }
        }
    }

    fn get_attributes(&self, attributes: &mut Vec<String>, scene: &Scene, mesh: &Mesh) {
        if self.active_texture(scene).is_none() {
            return;
        }
        let uv = if self.coordinates_index == 1 {
            redlilium_core::scene::vertex_kind::UV2
        } else {
            redlilium_core::scene::vertex_kind::UV
        };
        if mesh.has_vertex_attribute(uv) && !attributes.iter().any(|a| a == uv) {
            attributes.push(uv.to_string());
        }
    }

    fn add_fallbacks(
        &self,
        defines: &MaterialDefines,
        fallbacks: &mut EffectFallbacks,
        current_rank: u32,
    ) -> u32 {
        if defines.is_enabled(DETAIL) {
            fallbacks.add_fallback(current_rank, DETAIL);
            current_rank + 1
        } else {
            current_rank
        }
    }

    fn uniforms(&self) -> UniformDescription {
        UniformDescription {
            ubo: vec![
                UniformField::new("vDetailInfos", UniformType::Vec4),
                UniformField::new("detailMatrix", UniformType::Mat4),
            ],
            vertex: None,
            fragment: Some("#ifdef DETAIL\nuniform sampler2D detailSampler;\n#endif".to_string()),
        }
    }

    fn samplers(&self, samplers: &mut Vec<String>) {
        samplers.push(SAMPLER.to_string());
    }

    fn field_table(&self) -> &'static [FieldDescriptor] {
        &FIELDS
    }

    fn read_field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "is_enabled" => FieldValue::Boolean(self.base.enabled),
            "texture" => FieldValue::Texture(self.texture.clone()),
            "coordinates_index" => FieldValue::Number(f64::from(self.coordinates_index)),
            "diffuse_blend_level" => FieldValue::Number(f64::from(self.diffuse_blend_level)),
            "roughness_blend_level" => FieldValue::Number(f64::from(self.roughness_blend_level)),
            "bump_level" => FieldValue::Number(f64::from(self.bump_level)),
            "normal_blend_method" => {
                FieldValue::Number(f64::from(self.normal_blend_method.as_number()))
            }
            _ => return None,
        })
    }

    fn write_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("is_enabled", FieldValue::Boolean(v)) => self.base.enabled = v,
            ("texture", FieldValue::Texture(t)) => self.texture = t,
            ("coordinates_index", FieldValue::Number(v)) if v >= 0.0 => {
                self.coordinates_index = v as u32
            }
            ("diffuse_blend_level", FieldValue::Number(v)) => self.diffuse_blend_level = v as f32,
            ("roughness_blend_level", FieldValue::Number(v)) => {
                self.roughness_blend_level = v as f32
            }
            ("bump_level", FieldValue::Number(v)) => self.bump_level = v as f32,
            ("normal_blend_method", FieldValue::Number(v)) => {
                match NormalBlendMethod::from_number(v) {
                    Some(method) => self.normal_blend_method = method,
                    None => return false,
                }
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defines::DefineValue;
    use redlilium_core::scene::EngineCaps;

    fn detail_texture() -> Arc<Texture> {
        Arc::new(Texture::from_url("detail", "textures/detail.png"))
    }

    #[test]
    fn test_readiness_waits_for_texture() {
        let texture = detail_texture();
        let plugin = DetailMapPlugin::new().with_texture(texture.clone());
        let scene = Scene::new("s");
        let mesh = Mesh::new("m");
        let sub_mesh = SubMesh::new(&mesh, 0);

        let ready = || {
            plugin.is_ready_for_sub_mesh(&MaterialDefines::new(), &scene, &Engine::new(), &sub_mesh)
        };
        assert!(!ready());
        texture.mark_ready();
        assert!(ready());
    }

    #[test]
    fn test_disabled_without_standard_derivatives() {
        let plugin = DetailMapPlugin::new().with_texture(detail_texture());
        let engine = Engine::with_caps(EngineCaps {
            standard_derivatives: false,
        });
        let scene = Scene::new("s").with_engine(engine.clone());
        let mesh = Mesh::new("m");
        let mut defines = MaterialDefines::new();

        plugin.prepare_defines(&mut defines, &scene, &mesh);
        assert!(!defines.is_enabled(DETAIL));
        assert!(plugin.is_ready_for_sub_mesh(&defines, &scene, &engine, &SubMesh::new(&mesh, 0)));
    }

    #[test]
    fn test_defines_follow_texture_and_channel() {
        let mut plugin = DetailMapPlugin::new();
        plugin.normal_blend_method = NormalBlendMethod::Rnm;
        let mut scene = Scene::new("s");
        let mesh = Mesh::new("m");
        let mut defines = MaterialDefines::new();

        plugin.prepare_defines(&mut defines, &scene, &mesh);
        assert!(!defines.is_enabled(DETAIL));

        plugin.set_texture(Some(detail_texture()));
        plugin.prepare_defines(&mut defines, &scene, &mesh);
        assert!(defines.is_enabled(DETAIL));
        assert_eq!(defines.get(DETAIL_DIRECT_UV), Some(&DefineValue::Number(1.0)));
        assert_eq!(
            defines.get(DETAIL_NORMAL_BLEND_METHOD),
            Some(&DefineValue::Number(1.0))
        );

        scene.set_texture_channels(TextureChannels::DETAIL, false);
        plugin.prepare_defines(&mut defines, &scene, &mesh);
        assert!(!defines.is_enabled(DETAIL));
    }

    #[test]
    fn test_dispose_releases_once() {
        let texture = detail_texture();
        let mut plugin = DetailMapPlugin::new().with_texture(texture.clone());

        plugin.dispose(true);
        plugin.dispose(true);

        assert_eq!(texture.release_count(), 1);
        assert!(plugin.texture().is_none());
    }

    #[test]
    fn test_dispose_without_force_keeps_texture() {
        let texture = detail_texture();
        let mut plugin = DetailMapPlugin::new().with_texture(texture.clone());
        plugin.dispose(false);
        assert_eq!(texture.release_count(), 0);
        assert!(plugin.has_texture(&texture));
    }

    #[test]
    fn test_render_target_and_animatables() {
        let mut plugin = DetailMapPlugin::new();
        assert!(!plugin.has_render_target_textures());

        plugin.set_texture(Some(Arc::new(Texture::render_target("rt"))));
        assert!(plugin.has_render_target_textures());

        let mut animatables = Vec::new();
        plugin.get_animatables(&mut animatables);
        assert!(animatables.is_empty());

        plugin.set_texture(Some(Arc::new(Texture::new("scrolling").with_animations(true))));
        plugin.get_animatables(&mut animatables);
        assert_eq!(animatables.len(), 1);
        assert_eq!(animatables[0].animatable_name(), "scrolling");
    }

    #[test]
    fn test_write_field_rejects_bad_blend_method() {
        let mut plugin = DetailMapPlugin::new();
        assert!(!plugin.write_field("normal_blend_method", FieldValue::Number(7.0)));
        assert!(!plugin.write_field("bump_level", FieldValue::Boolean(true)));
        assert!(plugin.write_field("bump_level", FieldValue::Number(0.25)));
        assert_eq!(plugin.bump_level, 0.25);
    }
}
