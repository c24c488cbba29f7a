// SPDX-License-Identifier: MPL-2.0
//! Upload validation: the first pipeline stage.
//!
//! Nothing is decoded here. The declared MIME type, the byte length and the
//! magic bytes are checked, in that order, so oversized or foreign uploads are
//! rejected before any expensive work.

use crate::config::defaults::ACCEPTED_MIME_TYPES;
use crate::config::ImageLimits;
use crate::domain::settings::AssetSlot;
use crate::error::{Error, Result};
use image_rs::ImageFormat;

/// Upload bytes that passed validation, with their sniffed format.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpload {
    pub slot: AssetSlot,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl ValidatedUpload {
    /// MIME type of the sniffed format, which may differ from the declared one.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Whether `mime` is one of the accepted image types. Parameters such as
/// `; charset=` are ignored and the comparison is case-insensitive.
#[must_use]
pub fn is_accepted_mime(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    ACCEPTED_MIME_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(essence))
}

fn accepted_format(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Gif
    )
}

/// Checks an upload against the limits of its slot.
///
/// # Errors
///
/// - [`Error::UnsupportedImage`] for an unaccepted declared type, empty bytes
///   or content that is not a JPEG, PNG, WebP or GIF.
/// - [`Error::ImageTooLarge`] when the bytes exceed `limits.max_upload_bytes`.
pub fn validate(
    bytes: Vec<u8>,
    declared_mime: &str,
    slot: AssetSlot,
    limits: &ImageLimits,
) -> Result<ValidatedUpload> {
    if !is_accepted_mime(declared_mime) {
        return Err(Error::UnsupportedImage(format!(
            "type '{declared_mime}' is not accepted"
        )));
    }
    if bytes.len() > limits.max_upload_bytes {
        return Err(Error::ImageTooLarge {
            slot,
            size: bytes.len(),
            limit: limits.max_upload_bytes,
        });
    }
    if bytes.is_empty() {
        return Err(Error::UnsupportedImage("upload is empty".to_string()));
    }

    let format = image_rs::guess_format(&bytes)
        .map_err(|_| Error::UnsupportedImage("content is not a recognized image".to_string()))?;
    if !accepted_format(format) {
        return Err(Error::UnsupportedImage(format!(
            "content is {}, which is not accepted",
            format.to_mime_type()
        )));
    }

    tracing::debug!(slot = %slot, bytes = bytes.len(), format = ?format, "upload validated");
    Ok(ValidatedUpload {
        slot,
        bytes,
        format,
    })
}
