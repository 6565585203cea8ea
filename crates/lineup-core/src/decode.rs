//! Image payload decoding.
//!
//! Accepts either a base64 text payload (optionally a data-URI with a
//! `header,` prefix, which is discarded) or a filesystem path, and produces
//! an in-memory RGB image. Failures surface as [`DecodeError`]; a bad
//! payload never silently degrades to an empty image.

use image::RgbImage;
use std::path::Path;
use thiserror::Error;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported or corrupt image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode a base64 text payload into an RGB image.
///
/// A data-URI style header (`data:image/png;base64,`) before the first
/// comma is stripped; everything after it is the payload proper.
pub fn from_base64(payload: &str) -> Result<RgbImage, DecodeError> {
    let data = match payload.split_once(',') {
        Some((_header, rest)) => rest,
        None => payload,
    };
    let bytes = BASE64.decode(data.trim())?;
    let img = image::load_from_memory(&bytes)?;
    Ok(img.to_rgb8())
}

/// Decode an image file from disk into an RGB image.
pub fn from_file(path: &Path) -> Result<RgbImage, DecodeError> {
    let img = image::open(path)?;
    Ok(img.to_rgb8())
}
