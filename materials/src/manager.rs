//! Plugin manager: the per-material plugin registry.
//!
//! The manager owns the plugins attached to one material, keeps them sorted
//! by `(priority, registration order)` and runs every contract method across
//! them in that order, merging the results. A priority changed after
//! registration is honored from the next pass on:
//!
//! | Pass | Aggregation |
//! |---|---|
//! | readiness | every plugin polled, ready only if all are |
//! | defines declarations | merged by key, collisions rejected |
//! | textures, animatables, attributes | appended |
//! | uniforms, samplers | appended, identical names kept once |
//! | uniform buffer layout | cross-plugin field collisions rejected |
//! | custom code | concatenated per injection point |
//! | fallbacks | rank threaded through plugins |

use std::sync::Arc;

use redlilium_core::scene::{Animatable, Engine, Mesh, Scene, SubMesh};
use redlilium_core::texture::Texture;

use crate::defines::{DefineDeclarations, MaterialDefines};
use crate::error::{PluginError, PluginResult};
use crate::factory::PluginFactories;
use crate::fallbacks::EffectFallbacks;
use crate::plugin::{ManagerHandle, MaterialPlugin};
use crate::serialize::SerializedPlugin;
use crate::shader::{CodeInjectionPoints, ShaderStage};
use crate::uniform_buffer::UniformBuffer;

/// Ordered set of plugins attached to one material.
pub struct MaterialPluginManager {
    handle: ManagerHandle,
    material_name: String,
    plugins: Vec<Box<dyn MaterialPlugin>>,
    next_order: u64,
    layout_built: bool,
}

impl MaterialPluginManager {
    /// Create an empty manager for the material `material_name`.
    pub fn new(material_name: impl Into<String>) -> Self {
        Self {
            handle: ManagerHandle::next(),
            material_name: material_name.into(),
            plugins: Vec::new(),
            next_order: 0,
            layout_built: false,
        }
    }

    /// Handle stored in every registered plugin.
    pub fn handle(&self) -> ManagerHandle {
        self.handle
    }

    /// Name of the owning material.
    pub fn material_name(&self) -> &str {
        &self.material_name
    }

    /// Whether the uniform buffer layout was declared, which freezes registration.
    pub fn is_layout_built(&self) -> bool {
        self.layout_built
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a plugin.
    ///
    /// # Errors
    ///
    /// - [`PluginError::AlreadyRegistered`] if the plugin belongs to a manager
    /// - [`PluginError::DuplicatePluginName`] if the name is taken
    /// - [`PluginError::LayoutAlreadyBuilt`] once the uniform layout is declared
    pub fn add_plugin(&mut self, mut plugin: Box<dyn MaterialPlugin>) -> PluginResult<()> {
        if plugin.base().manager().is_some() {
            return Err(PluginError::AlreadyRegistered {
                name: plugin.name().to_string(),
            });
        }
        if self.contains(plugin.name()) {
            return Err(PluginError::DuplicatePluginName {
                name: plugin.name().to_string(),
                material: self.material_name.clone(),
            });
        }
        if self.layout_built {
            return Err(PluginError::LayoutAlreadyBuilt(self.material_name.clone()));
        }

        plugin.base_mut().attach(self.handle, self.next_order);
        self.next_order += 1;

        log::debug!(
            "Material '{}': registered plugin '{}' ({}, priority {})",
            self.material_name,
            plugin.name(),
            plugin.class_name(),
            plugin.priority()
        );

        self.plugins.push(plugin);
        self.sort();
        Ok(())
    }

    /// Dispose and unregister plugin `name`, handing it back to the caller.
    pub fn remove_plugin(
        &mut self,
        name: &str,
        force_dispose_textures: bool,
    ) -> Option<Box<dyn MaterialPlugin>> {
        let index = self.plugins.iter().position(|p| p.name() == name)?;
        let mut plugin = self.plugins.remove(index);
        plugin.dispose(force_dispose_textures);
        plugin.base_mut().detach();
        log::debug!(
            "Material '{}': removed plugin '{name}'",
            self.material_name
        );
        Some(plugin)
    }

    /// Re-sort by `(priority, registration order)`.
    ///
    /// Passes order plugins on their own; sorting only spares them the work.
    pub fn sort(&mut self) {
        if !self.plugins.is_sorted_by_key(|p| execution_key(&**p)) {
            self.plugins.sort_by_key(|p| execution_key(&**p));
        }
    }

    /// Plugins in execution order, even if a priority changed since the last sort.
    fn ordered(&self) -> Vec<&dyn MaterialPlugin> {
        let mut ordered: Vec<&dyn MaterialPlugin> = self.plugins.iter().map(|p| &**p).collect();
        if !ordered.is_sorted_by_key(|p| execution_key(*p)) {
            log::trace!("Material '{}': re-ordering plugins", self.material_name);
            ordered.sort_by_key(|p| execution_key(*p));
        }
        ordered
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Whether a plugin named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    /// Plugin named `name`.
    pub fn plugin(&self, name: &str) -> Option<&dyn MaterialPlugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| &**p)
    }

    /// Plugin named `name`, mutably.
    pub fn plugin_mut(&mut self, name: &str) -> Option<&mut (dyn MaterialPlugin + 'static)> {
        self.plugins
            .iter_mut()
            .find(|p| p.name() == name)
            .map(|p| &mut **p)
    }

    /// Plugin named `name` as its concrete type.
    pub fn plugin_as<T: MaterialPlugin>(&self, name: &str) -> Option<&T> {
        self.plugin(name)?.as_any().downcast_ref()
    }

    /// Plugin named `name` as its concrete type, mutably.
    pub fn plugin_as_mut<T: MaterialPlugin>(&mut self, name: &str) -> Option<&mut T> {
        self.plugin_mut(name)?.as_any_mut().downcast_mut()
    }

    /// Plugins in execution order.
    pub fn plugins(&self) -> impl Iterator<Item = &dyn MaterialPlugin> {
        self.ordered().into_iter()
    }

    /// Plugin names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.ordered().into_iter().map(|p| p.name()).collect()
    }

    /// Number of plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    // ========================================================================
    // Readiness and binding
    // ========================================================================

    /// Whether every plugin is ready. All plugins are polled.
    pub fn is_ready_for_sub_mesh(
        &self,
        defines: &MaterialDefines,
        scene: &Scene,
        engine: &Engine,
        sub_mesh: &SubMesh,
    ) -> bool {
        let mut ready = true;
        for plugin in self.ordered() {
            if !plugin.is_ready_for_sub_mesh(defines, scene, engine, sub_mesh) {
                log::trace!(
                    "Plugin '{}' not ready for submesh {}",
                    plugin.name(),
                    sub_mesh.index
                );
                ready = false;
            }
        }
        ready
    }

    pub fn bind_for_sub_mesh(
        &self,
        uniform_buffer: &mut UniformBuffer,
        scene: &Scene,
        engine: &Engine,
        sub_mesh: &SubMesh,
    ) {
        for plugin in self.ordered() {
            plugin.bind_for_sub_mesh(uniform_buffer, scene, engine, sub_mesh);
        }
    }

    pub fn hard_bind_for_sub_mesh(
        &self,
        uniform_buffer: &mut UniformBuffer,
        scene: &Scene,
        engine: &Engine,
        sub_mesh: &SubMesh,
    ) {
        for plugin in self.ordered() {
            plugin.hard_bind_for_sub_mesh(uniform_buffer, scene, engine, sub_mesh);
        }
    }

    /// Dispose every plugin. Plugins stay registered.
    pub fn dispose(&mut self, force_dispose_textures: bool) {
        log::trace!("Material '{}': disposing plugins", self.material_name);
        self.sort();
        for plugin in &mut self.plugins {
            plugin.dispose(force_dispose_textures);
        }
    }

    // ========================================================================
    // Defines
    // ========================================================================

    /// Merge the define declarations of every plugin.
    ///
    /// # Errors
    ///
    /// [`PluginError::DefineCollision`] when two plugins declare the same key.
    pub fn collect_defines(&self) -> PluginResult<DefineDeclarations> {
        let mut aggregate = DefineDeclarations::new();
        for plugin in self.ordered() {
            let mut own = DefineDeclarations::new();
            plugin.collect_defines(&mut own);
            aggregate.merge_from(plugin.name(), own)?;
        }
        log::trace!(
            "Material '{}': collected {} defines",
            self.material_name,
            aggregate.len()
        );
        Ok(aggregate)
    }

    pub fn prepare_defines_before_attributes(
        &self,
        defines: &mut MaterialDefines,
        scene: &Scene,
        mesh: &Mesh,
    ) {
        for plugin in self.ordered() {
            plugin.prepare_defines_before_attributes(defines, scene, mesh);
        }
    }

    pub fn prepare_defines(&self, defines: &mut MaterialDefines, scene: &Scene, mesh: &Mesh) {
        for plugin in self.ordered() {
            plugin.prepare_defines(defines, scene, mesh);
        }
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Whether any plugin uses `texture`.
    pub fn has_texture(&self, texture: &Texture) -> bool {
        self.plugins.iter().any(|p| p.has_texture(texture))
    }

    /// Whether any plugin samples render targets.
    pub fn has_render_target_textures(&self) -> bool {
        self.plugins.iter().any(|p| p.has_render_target_textures())
    }

    pub fn get_active_textures(&self, textures: &mut Vec<Arc<Texture>>) {
        for plugin in self.ordered() {
            plugin.get_active_textures(textures);
        }
    }

    pub fn get_animatables(&self, animatables: &mut Vec<Arc<dyn Animatable>>) {
        for plugin in self.ordered() {
            plugin.get_animatables(animatables);
        }
    }

    pub fn get_attributes(&self, attributes: &mut Vec<String>, scene: &Scene, mesh: &Mesh) {
        for plugin in self.ordered() {
            plugin.get_attributes(attributes, scene, mesh);
        }
    }

    // ========================================================================
    // Shader inputs
    // ========================================================================

    /// Thread the fallback rank through every plugin and return the final rank.
    ///
    /// # Panics
    ///
    /// If a plugin returns a rank lower than the one it was given.
    pub fn add_fallbacks(
        &self,
        defines: &MaterialDefines,
        fallbacks: &mut EffectFallbacks,
        mut rank: u32,
    ) -> u32 {
        for plugin in self.ordered() {
            let next = plugin.add_fallbacks(defines, fallbacks, rank);
            assert!(
                next >= rank,
                "plugin '{}' lowered the fallback rank from {rank} to {next}",
                plugin.name()
            );
            rank = next;
        }
        rank
    }

    /// Append uniform and sampler names of every plugin, keeping each name once.
    pub fn add_uniforms_and_samplers(
        &self,
        uniforms: &mut Vec<String>,
        samplers: &mut Vec<String>,
    ) {
        let mut own_uniforms = Vec::new();
        let mut own_samplers = Vec::new();
        for plugin in self.ordered() {
            plugin.add_uniforms_and_samplers(&mut own_uniforms, &mut own_samplers);
        }
        append_unique(uniforms, own_uniforms);
        append_unique(samplers, own_samplers);
    }

    /// Declare every plugin's uniform buffer fields and freeze registration.
    ///
    /// # Errors
    ///
    /// [`PluginError::UniformCollision`] when a plugin re-declares a field
    /// with a different shape, naming both plugins when the first
    /// declaration came from a plugin.
    pub fn prepare_uniform_buffer(
        &mut self,
        uniform_buffer: &mut UniformBuffer,
    ) -> PluginResult<()> {
        let mut owners: Vec<(String, String)> = Vec::new();
        for plugin in self.ordered() {
            let before = uniform_buffer.fields().len();
            match plugin.prepare_uniform_buffer(uniform_buffer) {
                Ok(()) => {}
                Err(PluginError::UniformCollision { uniform, first, second }) => {
                    let owner = owners.iter().find(|(field, _)| *field == uniform);
                    return Err(match owner {
                        Some((_, owner)) => PluginError::UniformCollision {
                            first: format!("{owner} ({first})"),
                            second: format!("{} ({second})", plugin.name()),
                            uniform,
                        },
                        None => PluginError::UniformCollision { uniform, first, second },
                    });
                }
                Err(e) => return Err(e),
            }
            for field in &uniform_buffer.fields()[before..] {
                owners.push((field.name.clone(), plugin.name().to_string()));
            }
        }
        self.layout_built = true;
        log::trace!(
            "Material '{}': {} plugin uniforms declared",
            self.material_name,
            owners.len()
        );
        Ok(())
    }

    /// Merge the custom code of every plugin for both stages.
    ///
    /// A plugin's stage declarations from
    /// [`uniforms`](MaterialPlugin::uniforms) precede its own custom code at
    /// the stage's definitions point.
    pub fn code_injection_points(&self) -> CodeInjectionPoints {
        let mut points = CodeInjectionPoints::new();
        for plugin in self.ordered() {
            let uniforms = plugin.uniforms();
            for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
                if let Some(declarations) = uniforms.stage(stage) {
                    points.append(stage, stage.definitions_point(), declarations);
                }
                if let Some(code) = plugin.get_custom_code(stage) {
                    points.merge(stage, &code);
                }
            }
        }
        points
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Records of every serializable plugin, in execution order.
    pub fn serialize(&self) -> Vec<SerializedPlugin> {
        self.ordered()
            .into_iter()
            .filter(|p| !p.base().do_not_serialize)
            .map(|p| p.serialize())
            .collect()
    }

    /// Restore plugins from records.
    ///
    /// A record updates the registered plugin of the same name, otherwise a
    /// plugin is created from `factories` by class name and registered.
    /// Records of unknown classes are skipped with a warning. Plugins are
    /// re-sorted even when a registration fails part way.
    pub fn parse(
        &mut self,
        records: &[SerializedPlugin],
        scene: &Scene,
        root_url: &str,
        factories: &PluginFactories,
    ) -> PluginResult<()> {
        let result = self.parse_records(records, scene, root_url, factories);
        self.sort();
        result
    }

    fn parse_records(
        &mut self,
        records: &[SerializedPlugin],
        scene: &Scene,
        root_url: &str,
        factories: &PluginFactories,
    ) -> PluginResult<()> {
        for record in records {
            if let Some(plugin) = self.plugin_mut(&record.name) {
                plugin.parse(record, scene, root_url);
                continue;
            }
            let Some(mut plugin) = factories.create(&record.class_name) else {
                log::warn!(
                    "Material '{}': no factory for plugin class '{}', skipping '{}'",
                    self.material_name,
                    record.class_name,
                    record.name
                );
                continue;
            };
            plugin.parse(record, scene, root_url);
            self.add_plugin(plugin)?;
        }
        Ok(())
    }
}

fn execution_key(plugin: &dyn MaterialPlugin) -> (i32, u64) {
    (plugin.priority(), plugin.base().registration_order())
}

fn append_unique(target: &mut Vec<String>, names: Vec<String>) {
    for name in names {
        if !target.contains(&name) {
            target.push(name);
        }
    }
}

impl std::fmt::Debug for MaterialPluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialPluginManager")
            .field("material", &self.material_name)
            .field("plugins", &self.names())
            .field("layout_built", &self.layout_built)
            .finish()
    }
}
