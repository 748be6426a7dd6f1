//! Shader stages and custom code injection.
//!
//! Plugins contribute GLSL fragments keyed by *injection point*. A shader
//! template marks each point with a `#define` line:
//!
//! ```glsl
//! #define CUSTOM_FRAGMENT_DEFINITIONS
//!
//! void main() {
//!     // ...
//! #define CUSTOM_FRAGMENT_BEFORE_FRAGCOLOR
//!     gl_FragColor = color;
//! }
//! ```
//!
//! [`CodeInjectionPoints`] merges the fragments of every plugin (in plugin
//! priority order) and [`CodeInjectionPoints::inject`] splices them into the
//! template, replacing the marker lines.

mod injection;

pub use injection::{CodeInjectionPoints, CustomCode};

/// Shader stage a code fragment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

impl ShaderStage {
    /// Stage name as used in shader tooling (`"vertex"` / `"fragment"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }

    /// Injection point receiving uniform declarations for this stage.
    pub fn definitions_point(&self) -> &'static str {
        match self {
            Self::Vertex => "CUSTOM_VERTEX_DEFINITIONS",
            Self::Fragment => "CUSTOM_FRAGMENT_DEFINITIONS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(ShaderStage::Vertex.as_str(), "vertex");
        assert_eq!(ShaderStage::Fragment.as_str(), "fragment");
        assert_eq!(
            ShaderStage::Fragment.definitions_point(),
            "CUSTOM_FRAGMENT_DEFINITIONS"
        );
    }
}
