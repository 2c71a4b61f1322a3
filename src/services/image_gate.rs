//! Upload boundary checks
//!
//! **[LFL-VAL-010]** An uploaded still image arrives as a base64 data URI.
//! It is rejected here, before any network call, unless it declares an image
//! media type, decodes cleanly, stays under the size cap, and its bytes
//! actually sniff as an image.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

/// Maximum decoded image size
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageGateError {
    #[error("Not a data URI")]
    NotADataUri,

    #[error("Unsupported media type: {0} (expected image/*)")]
    UnsupportedMediaType(String),

    #[error("Image too large: {0} bytes (limit 5 MB)")]
    TooLarge(usize),

    #[error("Invalid base64 image encoding")]
    InvalidEncoding,

    #[error("File content is not a recognizable image")]
    NotAnImage,
}

/// A data URI that passed all boundary checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedImage {
    /// Declared media type, e.g. "image/jpeg"
    pub media_type: String,
    /// Decoded payload size in bytes
    pub byte_len: usize,
}

/// Validate an image data URI against the boundary constraints
///
/// **[LFL-VAL-010]** Declared type must be image/*; decoded payload must be
/// at most [`MAX_IMAGE_BYTES`] and sniff as an image.
pub fn check_data_uri(uri: &str) -> Result<CheckedImage, ImageGateError> {
    let rest = uri.strip_prefix("data:").ok_or(ImageGateError::NotADataUri)?;

    let (header, payload) = rest
        .split_once(";base64,")
        .ok_or(ImageGateError::NotADataUri)?;

    let media_type = header.trim().to_ascii_lowercase();
    if !media_type.starts_with("image/") {
        return Err(ImageGateError::UnsupportedMediaType(media_type));
    }

    // Cheap size gate from the encoded length before decoding anything
    let estimated = payload.len() / 4 * 3;
    if estimated > MAX_IMAGE_BYTES {
        return Err(ImageGateError::TooLarge(estimated));
    }

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|_| ImageGateError::InvalidEncoding)?;

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageGateError::TooLarge(bytes.len()));
    }

    if !infer::is_image(&bytes) {
        return Err(ImageGateError::NotAnImage);
    }

    Ok(CheckedImage {
        media_type,
        byte_len: bytes.len(),
    })
}
