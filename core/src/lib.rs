//! # RedLilium Engine Core
//!
//! CPU-side engine resources that the material plugin system talks to:
//! textures, scenes, engine capabilities, meshes and submeshes.
//!
//! These are deliberately thin. The plugin system only needs to know whether a
//! texture is usable, how to release it, which texture channels a scene has
//! enabled and which vertex attributes a mesh carries.

pub mod scene;
pub mod texture;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the core subsystem.
pub fn init() {
    log::info!("RedLilium Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
