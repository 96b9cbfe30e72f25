//! Image encoding: raw bytes → sniffed mime type, reference parts, data URIs.
//!
//! Providers accept images as base64 payloads embedded in the JSON request
//! body (Gemini `inlineData` parts, Meshy `data:` URIs). Only PNG and JPEG
//! are accepted here — the same restriction the providers document — and
//! the format is sniffed from the bytes, never trusted from a filename or
//! content-type header.

use crate::client::ReferenceImage;
use crate::error::WedcardError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;

/// Sniff the mime type of an uploaded image, accepting PNG and JPEG only.
pub fn sniff_mime(bytes: &[u8], field: &'static str) -> Result<&'static str, WedcardError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => Ok("image/png"),
        Ok(ImageFormat::Jpeg) => Ok("image/jpeg"),
        _ => Err(WedcardError::UnsupportedImage { field }),
    }
}

/// Build a [`ReferenceImage`] from uploaded bytes, validating the format.
pub fn reference_from_bytes(
    bytes: &[u8],
    field: &'static str,
) -> Result<ReferenceImage, WedcardError> {
    let mime_type = sniff_mime(bytes, field)?;
    Ok(ReferenceImage {
        mime_type: mime_type.to_string(),
        data: bytes.to_vec(),
    })
}

/// Wrap image bytes in a `data:` URI for the 3D provider.
pub fn to_data_uri(bytes: &[u8], field: &'static str) -> Result<String, WedcardError> {
    let mime_type = sniff_mime(bytes, field)?;
    Ok(format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)))
}
