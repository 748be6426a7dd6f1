//! Material plugin error types.

use thiserror::Error;

/// Errors surfaced by the material plugin system.
///
/// All variants except [`Format`](Self::Format) and
/// [`MaterialDisposed`](Self::MaterialDisposed) are configuration errors:
/// they are raised while plugins are attached to a material or while the
/// material's shader inputs are assembled, and indicate plugins that cannot
/// be combined. Transient conditions (textures still loading) are reported
/// through readiness checks instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// A plugin with the same name is already registered on the material.
    #[error("plugin \"{name}\" is already registered on material \"{material}\"")]
    DuplicatePluginName { name: String, material: String },

    /// The plugin instance is already registered with another material.
    #[error("plugin \"{name}\" is already registered with another material")]
    AlreadyRegistered { name: String },

    /// Two plugins declared the same define.
    #[error("define \"{define}\" declared by both \"{first}\" and \"{second}\"")]
    DefineCollision {
        define: String,
        first: String,
        second: String,
    },

    /// Two declarations of the same uniform disagree, or two plugins declared it.
    #[error("uniform \"{uniform}\" declared by both \"{first}\" and \"{second}\"")]
    UniformCollision {
        uniform: String,
        first: String,
        second: String,
    },

    /// No plugin with this name is registered on the material.
    #[error("plugin \"{0}\" is not registered")]
    UnknownPlugin(String),

    /// The uniform buffer layout is already built and can no longer change.
    #[error("uniform buffer layout of \"{0}\" is already built")]
    LayoutAlreadyBuilt(String),

    /// The material was disposed and accepts no more plugins.
    #[error("material \"{0}\" is disposed")]
    MaterialDisposed(String),

    /// Encoding or decoding of a serialized record failed.
    #[error("format error: {0}")]
    Format(String),
}

/// Result alias for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
