//! HTTP clients for the external model providers.
//!
//! Each submodule wraps exactly one provider:
//!
//! * [`gemini`] — Google Generative Language API (text + image generation)
//! * [`meshy`]  — Meshy image-to-3D API (asynchronous tasks)
//! * [`maps`]   — Google Static Maps (venue map reference images)
//!
//! The pipeline never talks to a provider type directly; it goes through
//! the [`TextModel`] / [`ImageModel`] traits so tests can inject recording
//! mocks and callers can wrap providers with their own middleware.

pub mod gemini;
pub mod maps;
pub mod meshy;

use crate::error::WedcardError;
use async_trait::async_trait;

/// An input image attached to a generation call to constrain identity,
/// style, or layout.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    /// "image/png" or "image/jpeg".
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// An image produced by the image model, not yet written to disk.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl GeneratedImage {
    /// File extension matching the payload's mime type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            _ => "png",
        }
    }
}

/// Text generation: one prompt in, the model's raw text out.
///
/// The pipeline cleans and parses the text itself (see
/// [`crate::pipeline::postprocess`]), so implementations return the
/// payload verbatim.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, WedcardError>;
}

/// Image generation: one prompt plus reference images in, one image out.
///
/// A successful HTTP exchange that carries no image part must surface as
/// [`WedcardError::EmptyModelPayload`], never as a fabricated fallback.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        references: &[ReferenceImage],
    ) -> Result<GeneratedImage, WedcardError>;
}
