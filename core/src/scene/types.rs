//! Scene and geometry descriptors.

bitflags::bitflags! {
    /// Texture channels that can be switched off scene-wide.
    ///
    /// Plugins consult these when deciding whether a texture define is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureChannels: u32 {
        /// Diffuse / albedo textures.
        const DIFFUSE = 1 << 0;
        /// Ambient occlusion textures.
        const AMBIENT = 1 << 1;
        /// Opacity textures.
        const OPACITY = 1 << 2;
        /// Reflection textures.
        const REFLECTION = 1 << 3;
        /// Emissive textures.
        const EMISSIVE = 1 << 4;
        /// Specular textures.
        const SPECULAR = 1 << 5;
        /// Bump / normal textures.
        const BUMP = 1 << 6;
        /// Light maps.
        const LIGHTMAP = 1 << 7;
        /// Detail maps.
        const DETAIL = 1 << 8;
    }
}

impl Default for TextureChannels {
    fn default() -> Self {
        Self::all()
    }
}

/// Well-known vertex attribute names.
pub mod vertex_kind {
    /// Vertex position.
    pub const POSITION: &str = "position";
    /// Vertex normal.
    pub const NORMAL: &str = "normal";
    /// Vertex tangent.
    pub const TANGENT: &str = "tangent";
    /// First texture coordinate set.
    pub const UV: &str = "uv";
    /// Second texture coordinate set.
    pub const UV2: &str = "uv2";
    /// Vertex color.
    pub const COLOR: &str = "color";
}

/// The scene a material renders in.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Scene name.
    pub name: String,
    texture_channels: TextureChannels,
    engine: Engine,
}

impl Scene {
    /// Create a scene with every texture channel enabled on a default engine.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture_channels: TextureChannels::default(),
            engine: Engine::default(),
        }
    }

    /// Render the scene with `engine`.
    #[must_use]
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Set the enabled texture channels.
    #[must_use]
    pub fn with_texture_channels(mut self, channels: TextureChannels) -> Self {
        self.texture_channels = channels;
        self
    }

    /// Enable or disable texture channels at runtime.
    pub fn set_texture_channels(&mut self, channels: TextureChannels, enabled: bool) {
        self.texture_channels.set(channels, enabled);
    }

    /// Whether all of `channels` are enabled.
    pub fn texture_channel_enabled(&self, channels: TextureChannels) -> bool {
        self.texture_channels.contains(channels)
    }

    /// Engine the scene is rendered with.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

/// Device capabilities relevant to shader variant selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineCaps {
    /// `dFdx` / `dFdy` are available in fragment shaders.
    pub standard_derivatives: bool,
}

impl Default for EngineCaps {
    fn default() -> Self {
        Self {
            standard_derivatives: true,
        }
    }
}

/// The rendering engine a material is prepared for.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    /// Device capabilities.
    pub caps: EngineCaps,
}

impl Engine {
    /// Create an engine with default capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with explicit capabilities.
    pub fn with_caps(caps: EngineCaps) -> Self {
        Self { caps }
    }
}

/// A mesh a material is prepared for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    /// Mesh name.
    pub name: String,
    attributes: Vec<String>,
}

impl Mesh {
    /// Create a mesh carrying only positions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: vec![vertex_kind::POSITION.to_string()],
        }
    }

    /// Add a vertex attribute.
    #[must_use]
    pub fn with_attribute(mut self, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        if !self.attributes.contains(&kind) {
            self.attributes.push(kind);
        }
        self
    }

    /// Whether the mesh carries the given vertex attribute.
    pub fn has_vertex_attribute(&self, kind: &str) -> bool {
        self.attributes.iter().any(|a| a == kind)
    }

    /// All vertex attributes present on the mesh.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }
}

/// One draw range of a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMesh {
    /// Index of the submesh within its mesh.
    pub index: usize,
    /// Name of the owning mesh.
    pub mesh: String,
}

impl SubMesh {
    /// Create a submesh descriptor.
    pub fn new(mesh: &Mesh, index: usize) -> Self {
        Self {
            index,
            mesh: mesh.name.clone(),
        }
    }
}

/// An object that exposes animations (e.g. a texture with animated offsets).
pub trait Animatable: Send + Sync {
    /// Name used by the animation system to address this object.
    fn animatable_name(&self) -> &str;

    /// Whether any animation targets this object.
    fn has_animations(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_channels_toggle() {
        let mut scene = Scene::new("main");
        assert!(scene.texture_channel_enabled(TextureChannels::DETAIL));

        scene.set_texture_channels(TextureChannels::DETAIL, false);
        assert!(!scene.texture_channel_enabled(TextureChannels::DETAIL));
        assert!(scene.texture_channel_enabled(TextureChannels::DIFFUSE));
    }

    #[test]
    fn test_mesh_attributes() {
        let mesh = Mesh::new("plane")
            .with_attribute(vertex_kind::NORMAL)
            .with_attribute(vertex_kind::UV)
            .with_attribute(vertex_kind::UV);

        assert!(mesh.has_vertex_attribute(vertex_kind::POSITION));
        assert!(mesh.has_vertex_attribute(vertex_kind::UV));
        assert!(!mesh.has_vertex_attribute(vertex_kind::UV2));
        assert_eq!(mesh.attributes().len(), 3);
    }

    #[test]
    fn test_sub_mesh_references_mesh() {
        let mesh = Mesh::new("plane");
        let sub = SubMesh::new(&mesh, 2);
        assert_eq!(sub.mesh, "plane");
        assert_eq!(sub.index, 2);
    }

    #[test]
    fn test_scene_engine_caps() {
        assert!(Scene::new("main").engine().caps.standard_derivatives);

        let caps = EngineCaps {
            standard_derivatives: false,
        };
        let scene = Scene::new("main").with_engine(Engine::with_caps(caps));
        assert_eq!(scene.engine().caps, caps);
    }
}
