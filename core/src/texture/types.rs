//! Texture handle and record types.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::scene::Animatable;

/// Serialized form of a [`Texture`].
///
/// Only the identity of the texture is stored; pixel data is reloaded from
/// `url` when the record is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRecord {
    /// Texture name.
    pub name: String,
    /// Source url, relative urls are resolved against the scene root url.
    #[serde(default)]
    pub url: Option<String>,
}

/// A texture owned by the engine and referenced by materials.
///
/// Textures are shared through `Arc<Texture>`. Identity comparisons between
/// materials and plugins use `Arc::ptr_eq`.
///
/// Loading is asynchronous from the point of view of a material: a freshly
/// created texture is not ready until [`mark_ready`](Self::mark_ready) is
/// called. Disposal is idempotent, [`release_count`](Self::release_count)
/// never exceeds one.
pub struct Texture {
    name: String,
    /// Url as given by the creator or record, written back by `to_record`.
    source_url: Option<String>,
    /// `source_url` resolved against the root url it was loaded from.
    url: Option<String>,
    render_target: bool,
    animated: bool,
    ready: AtomicBool,
    disposed: AtomicBool,
    release_count: AtomicU32,
}

impl Texture {
    /// Create a texture that has not finished loading yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_url: None,
            url: None,
            render_target: false,
            animated: false,
            ready: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            release_count: AtomicU32::new(0),
        }
    }

    /// Create a texture loaded from `url`.
    pub fn from_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let mut texture = Self::new(name);
        texture.source_url = Some(url.clone());
        texture.url = Some(url);
        texture
    }

    /// Create a render target texture. Render targets are ready immediately.
    pub fn render_target(name: impl Into<String>) -> Self {
        let mut texture = Self::new(name);
        texture.render_target = true;
        texture.ready = AtomicBool::new(true);
        texture
    }

    /// Rebuild a texture from its record, resolving its url against `root_url`.
    ///
    /// The record's url is kept as is, so [`to_record`](Self::to_record)
    /// reproduces `record` whatever the root url was.
    pub fn from_record(record: &TextureRecord, root_url: &str) -> Self {
        let mut texture = Self::new(record.name.clone());
        texture.url = record.url.as_deref().map(|url| resolve_url(root_url, url));
        texture.source_url = record.url.clone();
        texture
    }

    /// Mark the texture as carrying animations (e.g. animated UV offsets).
    #[must_use]
    pub fn with_animations(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    /// Texture name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved url the texture is loaded from, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Url as written in the texture's record, before root url resolution.
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    /// Whether this texture is rendered into every frame.
    pub fn is_render_target(&self) -> bool {
        self.render_target
    }

    /// Whether the texture can be sampled. Disposed textures are never ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire) && !self.is_disposed()
    }

    /// Signal that loading finished.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Release the texture. Calling this more than once has no effect.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.release_count.fetch_add(1, Ordering::AcqRel);
            log::debug!("Texture '{}' released", self.name);
        }
    }

    /// Whether [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Number of times the underlying resource was actually released (0 or 1).
    pub fn release_count(&self) -> u32 {
        self.release_count.load(Ordering::Acquire)
    }

    /// Serialized form of this texture.
    pub fn to_record(&self) -> TextureRecord {
        TextureRecord {
            name: self.name.clone(),
            url: self.source_url.clone(),
        }
    }
}

/// Cloning produces an independent texture with fresh release state.
impl Clone for Texture {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            source_url: self.source_url.clone(),
            url: self.url.clone(),
            render_target: self.render_target,
            animated: self.animated,
            ready: AtomicBool::new(self.ready.load(Ordering::Acquire)),
            disposed: AtomicBool::new(false),
            release_count: AtomicU32::new(0),
        }
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("ready", &self.is_ready())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Animatable for Texture {
    fn animatable_name(&self) -> &str {
        &self.name
    }

    fn has_animations(&self) -> bool {
        self.animated
    }
}

static_assertions::assert_impl_all!(Texture: Send, Sync);

/// Resolve `url` against `root_url`.
///
/// Absolute urls (with a scheme, rooted at `/`, or inline `data:` urls) are
/// returned unchanged.
pub fn resolve_url(root_url: &str, url: &str) -> String {
    let absolute = url.contains("://") || url.starts_with('/') || url.starts_with("data:");
    if root_url.is_empty() || absolute {
        return url.to_string();
    }
    if root_url.ends_with('/') {
        format!("{root_url}{url}")
    } else {
        format!("{root_url}/{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_dispose_is_idempotent() {
        let texture = Texture::new("albedo");
        texture.dispose();
        texture.dispose();
        assert!(texture.is_disposed());
        assert_eq!(texture.release_count(), 1);
    }

    #[test]
    fn test_readiness() {
        let texture = Texture::from_url("detail", "detail.png");
        assert!(!texture.is_ready());
        texture.mark_ready();
        assert!(texture.is_ready());
        texture.dispose();
        assert!(!texture.is_ready());
    }

    #[test]
    fn test_render_target_is_ready() {
        let target = Texture::render_target("mirror");
        assert!(target.is_ready());
        assert!(target.is_render_target());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Texture::from_url("detail", "detail.png").with_animations(true);
        original.mark_ready();
        let copy = original.clone();
        original.dispose();

        assert!(copy.is_ready());
        assert!(!copy.is_disposed());
        assert_eq!(copy.release_count(), 0);
        assert_eq!(copy.url(), Some("detail.png"));
        assert!(copy.has_animations());
    }

    #[test]
    fn test_record_resolves_relative_url() {
        let record = Texture::from_url("detail", "textures/detail.png").to_record();
        let restored = Texture::from_record(&record, "https://assets.example.com/scene/");
        assert_eq!(
            restored.url(),
            Some("https://assets.example.com/scene/textures/detail.png")
        );
        assert!(!restored.is_ready());
    }

    #[test]
    fn test_record_survives_repeated_parsing() {
        let record = Texture::from_url("detail", "detail.png").to_record();
        let first = Texture::from_record(&record, "scene/");
        let second = Texture::from_record(&first.to_record(), "scene/");

        assert_eq!(first.to_record(), record);
        assert_eq!(second.to_record(), record);
        assert_eq!(second.url(), Some("scene/detail.png"));
        assert_eq!(second.source_url(), Some("detail.png"));
    }

    #[rstest]
    #[case("root", "a.png", "root/a.png")]
    #[case("root/", "a.png", "root/a.png")]
    #[case("", "a.png", "a.png")]
    #[case("root/", "https://cdn/a.png", "https://cdn/a.png")]
    #[case("root/", "/abs/a.png", "/abs/a.png")]
    #[case("root/", "data:image/png;base64,AAAA", "data:image/png;base64,AAAA")]
    fn test_resolve_url(#[case] root: &str, #[case] url: &str, #[case] expected: &str) {
        assert_eq!(resolve_url(root, url), expected);
    }
}
