// SPDX-License-Identifier: MPL-2.0
//! Asset hosting port.
//!
//! The asset host stores encoded image bytes and hands back an opaque
//! [`AssetRef`]. References are the only thing the settings record keeps.

use crate::domain::settings::{AssetRef, AssetSlot};
use async_trait::async_trait;
use std::fmt;

/// Errors reported by an [`AssetHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum AssetError {
    /// The host could not be reached or timed out.
    Unavailable(String),

    /// No asset exists for the reference.
    NotFound(AssetRef),

    /// The host refused the upload.
    Rejected(String),
}

impl AssetError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, AssetError::Unavailable(_))
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Unavailable(msg) => write!(f, "asset host unavailable: {msg}"),
            AssetError::NotFound(reference) => write!(f, "asset not found: {reference}"),
            AssetError::Rejected(msg) => write!(f, "upload rejected: {msg}"),
        }
    }
}

impl std::error::Error for AssetError {}

/// Port for storing image bytes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; uploads for different slots may run
/// concurrently.
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Stores `bytes` and returns a reference to them.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        slot: AssetSlot,
        content_type: &str,
    ) -> Result<AssetRef, AssetError>;

    /// Deletes the asset. Deleting an unknown reference is not an error.
    async fn delete(&self, reference: &AssetRef) -> Result<(), AssetError>;

    /// Downloads the stored bytes.
    async fn fetch(&self, reference: &AssetRef) -> Result<Vec<u8>, AssetError>;
}
