//! Scene, engine and mesh types consulted by material plugins.
//!
//! - [`Scene`] - per-scene texture channel switches and the engine it renders with
//! - [`Engine`] / [`EngineCaps`] - device capabilities
//! - [`Mesh`] / [`SubMesh`] - geometry a material is prepared for
//! - [`Animatable`] - objects exposing animations to the animation system

mod types;

pub use types::{
    Animatable, Engine, EngineCaps, Mesh, Scene, SubMesh, TextureChannels, vertex_kind,
};
