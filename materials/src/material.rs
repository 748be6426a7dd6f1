//! Host material owning a plugin manager.

use std::sync::Arc;

use redlilium_core::scene::{Animatable, Engine, Mesh, Scene, SubMesh};
use redlilium_core::texture::Texture;

use crate::defines::{MaterialDefines, render_defines};
use crate::error::{PluginError, PluginResult};
use crate::factory::PluginFactories;
use crate::fallbacks::EffectFallbacks;
use crate::manager::MaterialPluginManager;
use crate::plugin::MaterialPlugin;
use crate::serialize::SerializedMaterial;
use crate::shader::{CodeInjectionPoints, ShaderStage};
use crate::uniform_buffer::UniformBuffer;

/// Everything the shader compiler needs for one material variant.
#[derive(Debug, Clone, Default)]
pub struct EffectDescription {
    /// Defines as `(name, value)` pairs; boolean defines have an empty value.
    pub defines: Vec<(String, String)>,
    /// Whether any define changed since the previous preparation.
    pub defines_changed: bool,
    /// Vertex attributes, mesh attributes first.
    pub attributes: Vec<String>,
    /// Uniform names.
    pub uniforms: Vec<String>,
    /// Sampler names.
    pub samplers: Vec<String>,
    /// Fallback chain.
    pub fallbacks: EffectFallbacks,
    /// Merged custom code.
    pub code: CodeInjectionPoints,
}

impl EffectDescription {
    /// Shader source for `stage`: define lines followed by the injected template.
    pub fn shader_source(&self, stage: ShaderStage, template: &str) -> String {
        let mut source = render_defines(&self.defines);
        source.push_str(&self.code.inject(stage, template));
        source
    }
}

/// A material extended by plugins.
///
/// The plugin manager is created on first use and lives as long as the
/// material. Disposing the material disposes its plugins; a disposed material
/// accepts no more plugins. Dropping the material drops its plugins.
///
/// # Example
///
/// ```
/// use redlilium_core::scene::{Engine, Mesh, Scene};
/// use redlilium_materials::{PluginMaterial, plugins::RimLightPlugin};
///
/// let mut material = PluginMaterial::new("hero");
/// material.attach(RimLightPlugin::new()).unwrap();
///
/// let effect = material
///     .prepare_effect(&Scene::new("main"), &Engine::new(), &Mesh::new("body"))
///     .unwrap();
/// assert!(effect.uniforms.contains(&"vRimColor".to_string()));
/// ```
pub struct PluginMaterial {
    name: String,
    manager: Option<MaterialPluginManager>,
    defines: MaterialDefines,
    uniform_buffer: UniformBuffer,
    disposed: bool,
}

impl PluginMaterial {
    /// Create a material without plugins.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            uniform_buffer: UniformBuffer::new(name.clone()),
            name,
            manager: None,
            defines: MaterialDefines::new(),
            disposed: false,
        }
    }

    /// Create a material with one plugin per auto factory of `factories`.
    pub fn with_factories(
        name: impl Into<String>,
        factories: &PluginFactories,
    ) -> PluginResult<Self> {
        let mut material = Self::new(name);
        for plugin in factories.create_auto() {
            material.add_plugin(plugin)?;
        }
        Ok(material)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plugin manager, if any plugin was ever attached.
    pub fn plugin_manager(&self) -> Option<&MaterialPluginManager> {
        self.manager.as_ref()
    }

    /// Plugin manager, created on first call.
    ///
    /// # Errors
    ///
    /// [`PluginError::MaterialDisposed`] once the material was disposed.
    pub fn plugin_manager_or_create(&mut self) -> PluginResult<&mut MaterialPluginManager> {
        if self.disposed {
            return Err(PluginError::MaterialDisposed(self.name.clone()));
        }
        Ok(self.manager.get_or_insert_with(|| {
            log::debug!("Material '{}': creating plugin manager", self.name);
            MaterialPluginManager::new(self.name.clone())
        }))
    }

    /// Attach a plugin.
    pub fn add_plugin(&mut self, plugin: Box<dyn MaterialPlugin>) -> PluginResult<()> {
        self.plugin_manager_or_create()?.add_plugin(plugin)
    }

    /// Attach a plugin and return it as its concrete type.
    pub fn attach<P: MaterialPlugin>(&mut self, plugin: P) -> PluginResult<&mut P> {
        let name = plugin.name().to_string();
        self.add_plugin(Box::new(plugin))?;
        self.plugin_mut::<P>(&name)
            .ok_or(PluginError::UnknownPlugin(name))
    }

    /// Detach plugin `name`, disposing it.
    pub fn remove_plugin(
        &mut self,
        name: &str,
        force_dispose_textures: bool,
    ) -> Option<Box<dyn MaterialPlugin>> {
        self.manager
            .as_mut()?
            .remove_plugin(name, force_dispose_textures)
    }

    /// Plugin `name` as its concrete type.
    pub fn plugin<T: MaterialPlugin>(&self, name: &str) -> Option<&T> {
        self.manager.as_ref()?.plugin_as(name)
    }

    /// Plugin `name` as its concrete type, mutably.
    pub fn plugin_mut<T: MaterialPlugin>(&mut self, name: &str) -> Option<&mut T> {
        self.manager.as_mut()?.plugin_as_mut(name)
    }

    pub fn defines(&self) -> &MaterialDefines {
        &self.defines
    }

    pub fn defines_mut(&mut self) -> &mut MaterialDefines {
        &mut self.defines
    }

    pub fn uniform_buffer(&self) -> &UniformBuffer {
        &self.uniform_buffer
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Collect the shader inputs for drawing `mesh`.
    ///
    /// Declarations are collected fresh on every call; newly declared defines
    /// start at their default value and defines no plugin declares anymore are
    /// dropped. The uniform buffer layout is built on the first call, after
    /// which no plugin can be attached.
    ///
    /// # Errors
    ///
    /// Define or uniform collisions between plugins.
    pub fn prepare_effect(
        &mut self,
        scene: &Scene,
        _engine: &Engine,
        mesh: &Mesh,
    ) -> PluginResult<EffectDescription> {
        let mut attributes = mesh.attributes().to_vec();
        let Some(manager) = self.manager.as_mut() else {
            return Ok(EffectDescription {
                defines: self.defines.to_shader_defines(),
                attributes,
                ..Default::default()
            });
        };

        let declarations = manager.collect_defines()?;
        self.defines.retain_declared(&declarations);
        self.defines.apply_declarations(&declarations);

        manager.prepare_defines_before_attributes(&mut self.defines, scene, mesh);
        manager.get_attributes(&mut attributes, scene, mesh);
        manager.prepare_defines(&mut self.defines, scene, mesh);

        if !self.uniform_buffer.is_built() {
            manager.prepare_uniform_buffer(&mut self.uniform_buffer)?;
            self.uniform_buffer.build();
        }

        let mut uniforms = Vec::new();
        let mut samplers = Vec::new();
        manager.add_uniforms_and_samplers(&mut uniforms, &mut samplers);

        let mut fallbacks = EffectFallbacks::new();
        manager.add_fallbacks(&self.defines, &mut fallbacks, 0);

        let defines_changed = self.defines.is_dirty();
        self.defines.mark_as_processed();

        log::trace!(
            "Material '{}': effect prepared for mesh '{}' ({} defines)",
            self.name,
            mesh.name,
            self.defines.len()
        );

        Ok(EffectDescription {
            defines: self.defines.to_shader_defines(),
            defines_changed,
            attributes,
            uniforms,
            samplers,
            fallbacks,
            code: manager.code_injection_points(),
        })
    }

    /// Whether every plugin can draw `sub_mesh`.
    pub fn is_ready_for_sub_mesh(
        &self,
        scene: &Scene,
        engine: &Engine,
        sub_mesh: &SubMesh,
    ) -> bool {
        self.manager
            .as_ref()
            .is_none_or(|m| m.is_ready_for_sub_mesh(&self.defines, scene, engine, sub_mesh))
    }

    /// Write every plugin's per-draw values into the material's uniform buffer.
    pub fn bind_for_sub_mesh(&mut self, scene: &Scene, engine: &Engine, sub_mesh: &SubMesh) {
        if let Some(manager) = &self.manager {
            manager.bind_for_sub_mesh(&mut self.uniform_buffer, scene, engine, sub_mesh);
            manager.hard_bind_for_sub_mesh(&mut self.uniform_buffer, scene, engine, sub_mesh);
        }
    }

    /// Textures used by any plugin.
    pub fn active_textures(&self) -> Vec<Arc<Texture>> {
        let mut textures = Vec::new();
        if let Some(manager) = &self.manager {
            manager.get_active_textures(&mut textures);
        }
        textures
    }

    /// Animatables of every plugin.
    pub fn animatables(&self) -> Vec<Arc<dyn Animatable>> {
        let mut animatables = Vec::new();
        if let Some(manager) = &self.manager {
            manager.get_animatables(&mut animatables);
        }
        animatables
    }

    pub fn has_texture(&self, texture: &Texture) -> bool {
        self.manager.as_ref().is_some_and(|m| m.has_texture(texture))
    }

    pub fn has_render_target_textures(&self) -> bool {
        self.manager
            .as_ref()
            .is_some_and(|m| m.has_render_target_textures())
    }

    /// Dispose every plugin. Later calls do nothing.
    ///
    /// The manager is kept, so the material never creates a second one.
    pub fn dispose(&mut self, force_dispose_textures: bool) {
        if self.disposed {
            return;
        }
        if let Some(manager) = &mut self.manager {
            manager.dispose(force_dispose_textures);
        }
        self.disposed = true;
        log::debug!("Material '{}' disposed", self.name);
    }

    /// Records of every serializable plugin.
    pub fn serialize(&self) -> SerializedMaterial {
        SerializedMaterial {
            name: self.name.clone(),
            plugins: self
                .manager
                .as_ref()
                .map(MaterialPluginManager::serialize)
                .unwrap_or_default(),
        }
    }

    /// Restore plugins from `record`.
    ///
    /// See [`MaterialPluginManager::parse`].
    ///
    /// # Errors
    ///
    /// [`PluginError::MaterialDisposed`] once the material was disposed, and
    /// any registration error of a restored plugin.
    pub fn parse(
        &mut self,
        record: &SerializedMaterial,
        scene: &Scene,
        root_url: &str,
        factories: &PluginFactories,
    ) -> PluginResult<()> {
        if self.disposed {
            return Err(PluginError::MaterialDisposed(self.name.clone()));
        }
        if record.plugins.is_empty() {
            return Ok(());
        }
        self.plugin_manager_or_create()?
            .parse(&record.plugins, scene, root_url, factories)
    }

    /// Create a material named `name` with a deep copy of every plugin.
    ///
    /// Plugins whose class has no factory are skipped with a warning.
    pub fn clone_material(
        &self,
        name: impl Into<String>,
        factories: &PluginFactories,
    ) -> PluginResult<PluginMaterial> {
        let mut clone = PluginMaterial::new(name);
        let Some(manager) = &self.manager else {
            return Ok(clone);
        };

        for source in manager.plugins() {
            let Some(mut target) = factories.create(source.class_name()) else {
                log::warn!(
                    "Material '{}': cannot clone plugin '{}', no factory for '{}'",
                    self.name,
                    source.name(),
                    source.class_name()
                );
                continue;
            };
            target.base_mut().set_name(source.name());
            target.base_mut().enabled = source.base().enabled;
            target.base_mut().do_not_serialize = source.base().do_not_serialize;
            source.copy_to(&mut *target);
            clone.add_plugin(target)?;
        }
        Ok(clone)
    }
}

impl std::fmt::Debug for PluginMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginMaterial")
            .field("name", &self.name)
            .field("manager", &self.manager)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl Drop for PluginMaterial {
    fn drop(&mut self) {
        self.dispose(false);
    }
}
