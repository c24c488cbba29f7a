// SPDX-License-Identifier: MPL-2.0
//! The image pipeline: validate, compress, crop, rasterize, upload, remove.
//!
//! CPU-bound stages ([`ImagePipeline::prepare`], [`ImagePipeline::render`])
//! are synchronous; callers on an async runtime run them on a blocking
//! thread. Stages that talk to the asset host are async.
//!
//! # Originals
//!
//! A fresh upload keeps its pre-compression bytes and publishes them as the
//! slot's original next to the derived crop. Re-cropping reopens that
//! original and publishes only a new derived image; the original reference
//! is never replaced by a derived one.

use super::cache::{ReopenCache, ReopenStats};
use super::compress::{compress, decode_working_image};
use super::crop::CropSession;
use super::raster::{encode, rasterize, CropParams};
use super::validate::validate;
use crate::application::port::{AssetError, AssetHost};
use crate::config::EngineConfig;
use crate::domain::geometry::Size;
use crate::domain::settings::{AssetRef, AssetSlot, ImagePair};
use crate::error::{Error, Result};
use image_rs::RgbaImage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Where the crop source came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOrigin {
    /// A new upload. The bytes become the original when published.
    Fresh {
        original: Vec<u8>,
        content_type: &'static str,
    },
    /// A previously published original, reopened for re-cropping.
    Stored(AssetRef),
}

/// A crop source: the upright, downscaled working copy.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub slot: AssetSlot,
    pub working: Arc<RgbaImage>,
    pub origin: SourceOrigin,
}

impl PreparedImage {
    #[must_use]
    pub fn size(&self) -> Size {
        Size::from_pixels(self.working.width(), self.working.height())
    }

    /// The stored original this source was reopened from, if any.
    #[must_use]
    pub fn source_ref(&self) -> Option<&AssetRef> {
        match &self.origin {
            SourceOrigin::Stored(reference) => Some(reference),
            SourceOrigin::Fresh { .. } => None,
        }
    }
}

/// Encoded output of a crop, ready for upload.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub slot: AssetSlot,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub origin: SourceOrigin,
    working: Arc<RgbaImage>,
}

/// References produced by a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedImage {
    pub slot: AssetSlot,
    pub derived: AssetRef,
    pub original: AssetRef,
    /// Whether `original` was uploaded by this publish.
    pub original_uploaded: bool,
}

impl PublishedImage {
    #[must_use]
    pub fn pair(&self) -> ImagePair {
        ImagePair {
            derived: Some(self.derived.clone()),
            original: Some(self.original.clone()),
        }
    }
}

/// Result of a best-effort removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalOutcome {
    pub removed: Vec<AssetRef>,
    pub failed: Vec<(AssetRef, AssetError)>,
}

impl RemovalOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ImagePipeline {
    config: EngineConfig,
    host: Arc<dyn AssetHost>,
    cache: Mutex<ReopenCache>,
}

impl std::fmt::Debug for ImagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePipeline")
            .field("config", &self.config)
            .field("reopen", &self.reopen_stats())
            .finish_non_exhaustive()
    }
}

impl ImagePipeline {
    #[must_use]
    pub fn new(config: EngineConfig, host: Arc<dyn AssetHost>) -> Self {
        let cache = ReopenCache::new(config.storage.reopen_cache_entries);
        Self {
            config,
            host,
            cache: Mutex::new(cache),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn reopen_stats(&self) -> ReopenStats {
        self.cache().stats()
    }

    fn cache(&self) -> MutexGuard<'_, ReopenCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==========================================================================
    // Stages
    // ==========================================================================

    /// Validates and compresses a fresh upload into a crop source.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before anything is decoded; decode
    /// errors after.
    pub fn prepare(&self, slot: AssetSlot, bytes: Vec<u8>, mime: &str) -> Result<PreparedImage> {
        let limits = self.config.limits(slot);
        let upload = validate(bytes, mime, slot, limits)?;
        let compressed = compress(&upload, limits)?;
        let content_type = upload.content_type();
        tracing::debug!(
            slot = %slot,
            original_bytes = upload.bytes.len(),
            working_bytes = compressed.bytes.len(),
            working_type = compressed.content_type(),
            orientation = compressed.orientation.value(),
            "crop source prepared"
        );
        Ok(PreparedImage {
            slot,
            working: Arc::new(compressed.image),
            origin: SourceOrigin::Fresh {
                original: upload.bytes,
                content_type,
            },
        })
    }

    /// Reopens the original of `pair` for re-cropping.
    ///
    /// The source is always the original, never the derived crop.
    ///
    /// # Errors
    ///
    /// A validation error when the slot has no original, an asset error when
    /// it cannot be fetched, a decode error when it cannot be decoded.
    pub async fn reopen(&self, slot: AssetSlot, pair: &ImagePair) -> Result<PreparedImage> {
        let reference = pair
            .original
            .clone()
            .ok_or_else(|| Error::validation(slot.as_str(), "no original to re-crop"))?;

        let cached = self.cache().get(&reference);
        if let Some(working) = cached {
            tracing::debug!(slot = %slot, reference = %reference, "original reopened from cache");
            return Ok(PreparedImage {
                slot,
                working,
                origin: SourceOrigin::Stored(reference),
            });
        }

        let bytes = self.host.fetch(&reference).await?;
        let limits = self.config.limits(slot).clone();
        let decoded =
            tokio::task::spawn_blocking(move || decode_working_image(&bytes, None, &limits))
                .await
                .map_err(|e| Error::Decode(format!("decode task failed: {e}")))??;
        let working = Arc::new(decoded.0);
        self.cache().insert(reference.clone(), Arc::clone(&working));

        tracing::debug!(
            slot = %slot,
            reference = %reference,
            width = working.width(),
            height = working.height(),
            "original reopened"
        );
        Ok(PreparedImage {
            slot,
            working,
            origin: SourceOrigin::Stored(reference),
        })
    }

    /// A crop session over `prepared`, sized to the slot's output surface.
    ///
    /// # Errors
    ///
    /// See [`CropSession::new`].
    pub fn crop_session(&self, prepared: &PreparedImage) -> Result<CropSession> {
        CropSession::for_output(
            prepared.size(),
            self.config.limits(prepared.slot),
            &self.config.crop,
        )
    }

    /// Rasterizes the crop described by `session` and encodes it.
    ///
    /// # Errors
    ///
    /// [`Error::Raster`] when rasterizing or encoding fails. No partial
    /// output is returned.
    pub fn render(&self, prepared: &PreparedImage, session: &CropSession) -> Result<RenderedImage> {
        let (width, height) = session.output_size();
        self.render_params(prepared, session.params(), width, height)
    }

    /// Like [`ImagePipeline::render`] with explicit crop parameters and output size.
    ///
    /// # Errors
    ///
    /// See [`ImagePipeline::render`].
    pub fn render_params(
        &self,
        prepared: &PreparedImage,
        params: CropParams,
        width: u32,
        height: u32,
    ) -> Result<RenderedImage> {
        let limits = self.config.limits(prepared.slot);
        let surface = rasterize(&prepared.working, params.rect, params.rotation, width, height)?;
        let bytes = encode(&surface, limits.output_format, limits.quality)?;
        tracing::debug!(
            slot = %prepared.slot,
            width,
            height,
            rotation = params.rotation.degrees(),
            bytes = bytes.len(),
            "crop rasterized"
        );
        Ok(RenderedImage {
            slot: prepared.slot,
            bytes,
            content_type: limits.output_format.mime_type(),
            width,
            height,
            origin: prepared.origin.clone(),
            working: Arc::clone(&prepared.working),
        })
    }

    /// Uploads a rendered crop, and the original for fresh uploads.
    ///
    /// When the derived upload fails after a fresh original was uploaded,
    /// the original is deleted again (best effort).
    ///
    /// # Errors
    ///
    /// [`Error::Raster`] for empty output, [`Error::Asset`] when an upload fails.
    pub async fn publish(&self, rendered: RenderedImage) -> Result<PublishedImage> {
        let RenderedImage {
            slot,
            bytes,
            content_type,
            origin,
            working,
            ..
        } = rendered;
        if bytes.is_empty() {
            return Err(Error::Raster("derived image is empty".to_string()));
        }

        let (original, original_uploaded) = match origin {
            SourceOrigin::Stored(reference) => (reference, false),
            SourceOrigin::Fresh {
                original,
                content_type,
            } => {
                let size = original.len();
                let reference = self.host.upload(original, slot, content_type).await?;
                tracing::debug!(slot = %slot, reference = %reference, bytes = size, "original uploaded");
                (reference, true)
            }
        };

        let size = bytes.len();
        let derived = match self.host.upload(bytes, slot, content_type).await {
            Ok(reference) => reference,
            Err(err) => {
                if original_uploaded {
                    self.delete_best_effort(&original).await;
                }
                tracing::warn!(slot = %slot, error = %err, "derived upload failed");
                return Err(err.into());
            }
        };

        if original_uploaded {
            self.cache().insert(original.clone(), working);
        }
        tracing::info!(slot = %slot, derived = %derived, original = %original, bytes = size, "image published");
        Ok(PublishedImage {
            slot,
            derived,
            original,
            original_uploaded,
        })
    }

    /// Deletes every reference of `pair` from the asset host, best effort.
    pub async fn remove(&self, pair: &ImagePair) -> RemovalOutcome {
        let mut outcome = RemovalOutcome::default();
        for reference in pair.references() {
            self.cache().remove(reference);
            match self.host.delete(reference).await {
                Ok(()) => outcome.removed.push(reference.clone()),
                Err(err) => {
                    tracing::warn!(reference = %reference, error = %err, "asset delete failed");
                    outcome.failed.push((reference.clone(), err));
                }
            }
        }
        tracing::debug!(
            removed = outcome.removed.len(),
            failed = outcome.failed.len(),
            "image removal finished"
        );
        outcome
    }

    async fn delete_best_effort(&self, reference: &AssetRef) {
        if let Err(err) = self.host.delete(reference).await {
            tracing::warn!(reference = %reference, error = %err, "cleanup delete failed");
        }
    }
}
