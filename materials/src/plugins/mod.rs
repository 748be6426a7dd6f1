//! Built-in material plugins.
//!
//! - [`DetailMapPlugin`] blends a tiled detail texture over the base colour,
//!   normals and roughness
//! - [`RimLightPlugin`] adds a view-dependent rim light term

mod detail_map;
mod rim_light;

pub use detail_map::{DetailMapPlugin, NormalBlendMethod};
pub use rim_light::RimLightPlugin;
