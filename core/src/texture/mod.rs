//! Engine texture handles.
//!
//! Provides [`Texture`], the shared (`Arc`) texture object that material
//! plugins own, poll for readiness and release on disposal, together with
//! [`TextureRecord`], its serialized form.

mod types;

pub use types::{Texture, TextureRecord, resolve_url};
