//! The material plugin contract.
//!
//! A plugin is a self-contained unit of material behaviour. It contributes
//! shader defines, uniform buffer fields, samplers, custom shader code and
//! texture dependencies to the material it is attached to, and takes part in
//! the material's lifecycle (readiness, per-draw binding, disposal,
//! serialization).
//!
//! Every method of [`MaterialPlugin`] except [`base`](MaterialPlugin::base)
//! and [`base_mut`](MaterialPlugin::base_mut) has a default, so a concrete
//! plugin overrides only what it contributes. The
//! [`MaterialPluginManager`](crate::MaterialPluginManager) calls each method on
//! every plugin in priority order and merges the results.

mod base;

use std::any::Any;
use std::sync::Arc;

use redlilium_core::scene::{Animatable, Engine, Mesh, Scene, SubMesh};
use redlilium_core::texture::Texture;

use crate::defines::{DefineDeclarations, MaterialDefines};
use crate::error::PluginResult;
use crate::fallbacks::EffectFallbacks;
use crate::serialize::{
    FieldDescriptor, FieldValue, SerializedPlugin, copy_fields, parse_fields, serialize_fields,
};
use crate::shader::{CustomCode, ShaderStage};
use crate::uniform_buffer::{UniformBuffer, UniformField};

pub use base::{DEFAULT_PRIORITY, ManagerHandle, PluginBase};

/// Downcasting support for trait objects.
pub trait AsAny: Any {
    /// `self` as [`Any`].
    fn as_any(&self) -> &dyn Any;
    /// `self` as mutable [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Uniforms a plugin adds to the material.
///
/// `ubo` fields are declared in the material's uniform buffer. `vertex` and
/// `fragment` hold extra GLSL declarations (typically samplers) injected at
/// the stage's definitions point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformDescription {
    /// Uniform buffer fields.
    pub ubo: Vec<UniformField>,
    /// Vertex stage declarations.
    pub vertex: Option<String>,
    /// Fragment stage declarations.
    pub fragment: Option<String>,
}

impl UniformDescription {
    /// Declarations for `stage`.
    pub fn stage(&self, stage: ShaderStage) -> Option<&str> {
        match stage {
            ShaderStage::Vertex => self.vertex.as_deref(),
            ShaderStage::Fragment => self.fragment.as_deref(),
        }
    }
}

/// A composable unit of material behaviour.
///
/// Methods taking `&self` must not change plugin state; they are pure
/// functions of the plugin's configuration and write only into their output
/// arguments. A plugin that is waiting for a resource reports it through
/// [`is_ready_for_sub_mesh`](Self::is_ready_for_sub_mesh) instead of
/// failing.
pub trait MaterialPlugin: AsAny + Send + Sync {
    /// Shared plugin state.
    fn base(&self) -> &PluginBase;

    /// Shared plugin state, mutably.
    fn base_mut(&mut self) -> &mut PluginBase;

    /// Plugin name, unique per material.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Execution priority; lower runs first.
    fn priority(&self) -> i32 {
        self.base().priority()
    }

    /// Stable type identifier used to recreate the plugin when parsing.
    ///
    /// Concrete plugins override this with a name unique to their type.
    fn class_name(&self) -> &str {
        "MaterialPluginBase"
    }

    /// Whether the resources needed to draw `sub_mesh` are usable.
    fn is_ready_for_sub_mesh(
        &self,
        _defines: &MaterialDefines,
        _scene: &Scene,
        _engine: &Engine,
        _sub_mesh: &SubMesh,
    ) -> bool {
        true
    }

    /// Write per-draw values into the shared uniform buffer.
    fn bind_for_sub_mesh(
        &self,
        _uniform_buffer: &mut UniformBuffer,
        _scene: &Scene,
        _engine: &Engine,
        _sub_mesh: &SubMesh,
    ) {
    }

    /// Per-draw binds that must run even when the material's cached bind is reused.
    fn hard_bind_for_sub_mesh(
        &self,
        _uniform_buffer: &mut UniformBuffer,
        _scene: &Scene,
        _engine: &Engine,
        _sub_mesh: &SubMesh,
    ) {
    }

    /// Release owned resources. Must be safe to call more than once.
    fn dispose(&mut self, _force_dispose_textures: bool) {
        self.base_mut().mark_disposed();
    }

    /// Shader code contributed to `stage`, keyed by injection point.
    fn get_custom_code(&self, _stage: ShaderStage) -> Option<CustomCode> {
        None
    }

    /// Declare this plugin's defines.
    ///
    /// The default declares every define property of the [`PluginBase`],
    /// skipping private names starting with `_`.
    fn collect_defines(&self, defines: &mut DefineDeclarations) {
        for (name, value) in self.base().define_properties() {
            if name.starts_with('_') {
                continue;
            }
            defines.declare(name.clone(), value.clone());
        }
    }

    /// Update define values that vertex attribute selection depends on.
    fn prepare_defines_before_attributes(
        &self,
        _defines: &mut MaterialDefines,
        _scene: &Scene,
        _mesh: &Mesh,
    ) {
    }

    /// Update runtime define values from the current scene and mesh.
    fn prepare_defines(&self, _defines: &mut MaterialDefines, _scene: &Scene, _mesh: &Mesh) {}

    /// Whether the plugin uses `texture`.
    fn has_texture(&self, _texture: &Texture) -> bool {
        false
    }

    /// Whether the plugin samples render target textures.
    fn has_render_target_textures(&self) -> bool {
        false
    }

    /// Append the textures the plugin uses.
    fn get_active_textures(&self, _textures: &mut Vec<Arc<Texture>>) {}

    /// Append animatable sub-objects.
    fn get_animatables(&self, _animatables: &mut Vec<Arc<dyn Animatable>>) {}

    /// Append extra vertex attributes the plugin needs for `mesh`.
    fn get_attributes(&self, _attributes: &mut Vec<String>, _scene: &Scene, _mesh: &Mesh) {}

    /// Add fallback steps starting at `current_rank` and return the next free rank.
    ///
    /// The returned rank must not be lower than `current_rank`.
    fn add_fallbacks(
        &self,
        _defines: &MaterialDefines,
        _fallbacks: &mut EffectFallbacks,
        current_rank: u32,
    ) -> u32 {
        current_rank
    }

    /// Uniform buffer fields and stage declarations of the plugin.
    fn uniforms(&self) -> UniformDescription {
        UniformDescription::default()
    }

    /// Append sampler names.
    fn samplers(&self, _samplers: &mut Vec<String>) {}

    /// Append uniform and sampler names.
    ///
    /// The default lists the [`uniforms`](Self::uniforms) buffer fields and
    /// the [`samplers`](Self::samplers).
    fn add_uniforms_and_samplers(&self, uniforms: &mut Vec<String>, samplers: &mut Vec<String>) {
        uniforms.extend(self.uniforms().ubo.into_iter().map(|field| field.name));
        self.samplers(samplers);
    }

    /// Declare the plugin's fields in the uniform buffer layout.
    fn prepare_uniform_buffer(&self, uniform_buffer: &mut UniformBuffer) -> PluginResult<()> {
        for field in self.uniforms().ubo {
            uniform_buffer.add_uniform(field)?;
        }
        Ok(())
    }

    /// Serializable fields of the plugin type, besides name and priority.
    fn field_table(&self) -> &'static [FieldDescriptor] {
        &[]
    }

    /// Current value of a field from [`field_table`](Self::field_table).
    fn read_field(&self, _name: &str) -> Option<FieldValue> {
        None
    }

    /// Assign a field from [`field_table`](Self::field_table).
    ///
    /// Returns `false` when the field is unknown or the value does not fit.
    fn write_field(&mut self, _name: &str, _value: FieldValue) -> bool {
        false
    }

    /// Deep-copy serializable state into `target`, a plugin of the same type.
    fn copy_to(&self, target: &mut dyn MaterialPlugin) {
        copy_fields(self, target);
    }

    /// Snapshot of the serializable state.
    fn serialize(&self) -> SerializedPlugin {
        serialize_fields(self)
    }

    /// Restore state from a snapshot, resolving asset urls against `root_url`.
    fn parse(&mut self, source: &SerializedPlugin, scene: &Scene, root_url: &str) {
        parse_fields(self, source, scene, root_url);
    }
}

impl std::fmt::Debug for dyn MaterialPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialPlugin")
            .field("class_name", &self.class_name())
            .field("name", &self.name())
            .field("priority", &self.priority())
            .finish()
    }
}
