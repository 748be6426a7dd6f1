//! # RedLilium Materials
//!
//! Plugin system for materials: independent plugins contribute shader
//! defines, uniform buffer fields, samplers, custom shader code and texture
//! dependencies to a host material without the material knowing them in
//! advance.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`MaterialPlugin`] - The plugin contract, with [`PluginBase`] state
//! - [`MaterialPluginManager`] - Per-material registry running plugins in priority order
//! - [`PluginMaterial`] - Host material creating its manager on first use
//! - [`PluginFactories`] - Class name to constructor registry used when parsing and cloning
//! - [`plugins`] - Built-in detail map and rim light plugins
//!
//! ## Example
//!
//! ```
//! use redlilium_core::scene::{Engine, Mesh, Scene};
//! use redlilium_materials::{PluginMaterial, ShaderStage, plugins::RimLightPlugin};
//!
//! let mut material = PluginMaterial::new("hero");
//! material.attach(RimLightPlugin::new().with_power(3.0)).unwrap();
//!
//! let effect = material
//!     .prepare_effect(&Scene::new("main"), &Engine::new(), &Mesh::new("body"))
//!     .unwrap();
//! let fragment =
//!     effect.shader_source(ShaderStage::Fragment, "#define CUSTOM_FRAGMENT_DEFINITIONS\n");
//! assert!(fragment.contains("rimLight"));
//! ```

pub mod defines;
pub mod error;
pub mod factory;
pub mod fallbacks;
pub mod manager;
pub mod material;
pub mod plugin;
pub mod plugins;
pub mod serialize;
pub mod shader;
pub mod uniform_buffer;

// Re-export main types for convenience
pub use defines::{
    DefineDeclarations, DefineDescriptor, DefineKind, DefineValue, MaterialDefines, render_defines,
};
pub use error::{PluginError, PluginResult};
pub use factory::{PluginConstructor, PluginFactories};
pub use fallbacks::EffectFallbacks;
pub use manager::MaterialPluginManager;
pub use material::{EffectDescription, PluginMaterial};
pub use plugin::{
    AsAny, DEFAULT_PRIORITY, ManagerHandle, MaterialPlugin, PluginBase, UniformDescription,
};
pub use serialize::{
    FieldDescriptor, FieldKind, FieldValue, SerializedMaterial, SerializedPlugin, SerializedValue,
};
pub use shader::{CodeInjectionPoints, CustomCode, ShaderStage};
pub use uniform_buffer::{UniformBuffer, UniformField, UniformType};

static_assertions::assert_impl_all!(MaterialPluginManager: Send, Sync);
static_assertions::assert_impl_all!(PluginMaterial: Send, Sync);
static_assertions::assert_impl_all!(PluginFactories: Send, Sync);

/// Materials library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the materials subsystem.
pub fn init() {
    redlilium_core::init();
    log::info!("RedLilium Materials v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
