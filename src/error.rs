// SPDX-License-Identifier: MPL-2.0
//! Crate-wide error type.
//!
//! Port adapters report their own [`GatewayError`] and [`AssetError`]; those
//! are wrapped here so callers of the store, pipeline and engine deal with a
//! single [`Error`].

use crate::application::port::{AssetError, GatewayError};
use crate::domain::settings::AssetSlot;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// A field value failed validation before reaching the draft or pipeline.
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// The uploaded bytes are not an accepted image type.
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// The upload exceeds the ceiling configured for its slot.
    #[error("Image for {slot} is {size} bytes, limit is {limit}")]
    ImageTooLarge {
        slot: AssetSlot,
        size: usize,
        limit: usize,
    },

    /// The image bytes could not be decoded.
    #[error("Decode Error: {0}")]
    Decode(String),

    /// Rasterizing or encoding the derived image failed.
    #[error("Raster Error: {0}")]
    Raster(String),

    #[error("Gateway Error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Asset Error: {0}")]
    Asset(#[from] AssetError),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("I/O Error: {0}")]
    Io(String),

    /// The store was unloaded while an operation was pending.
    #[error("Settings store is not loaded")]
    Unloaded,
}

impl Error {
    /// Shorthand for a [`Error::Validation`].
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether a user-initiated retry of the same operation can succeed.
    ///
    /// Network failures are recoverable; bad input is not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Gateway(err) => err.is_transient(),
            Error::Asset(err) => err.is_transient(),
            Error::Io(_) => true,
            Error::Validation { .. }
            | Error::UnsupportedImage(_)
            | Error::ImageTooLarge { .. }
            | Error::Decode(_)
            | Error::Raster(_)
            | Error::Config(_)
            | Error::Unloaded => false,
        }
    }

    /// Returns the message key the presentation layer uses to localize this error.
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "error-design-invalid-value",
            Error::UnsupportedImage(_) => "error-image-unsupported-type",
            Error::ImageTooLarge { .. } => "error-image-too-large",
            Error::Decode(_) => "error-image-decode",
            Error::Raster(_) => "error-image-raster",
            Error::Gateway(_) => "error-design-save-failed",
            Error::Asset(_) => "error-image-upload-failed",
            Error::Config(_) => "error-config",
            Error::Io(_) => "error-io",
            Error::Unloaded => "error-design-unloaded",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<image_rs::ImageError> for Error {
    fn from(err: image_rs::ImageError) -> Self {
        match err {
            image_rs::ImageError::Unsupported(e) => Error::UnsupportedImage(e.to_string()),
            image_rs::ImageError::Encoding(e) => Error::Raster(e.to_string()),
            image_rs::ImageError::IoError(e) => Error::Io(e.to_string()),
            other => Error::Decode(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
