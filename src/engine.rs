// SPDX-License-Identifier: MPL-2.0
//! Design engine facade: ties image pipeline output to draft fields.
//!
//! Image work for one slot is serialized; the avatar and background slots
//! never wait on each other, and neither waits on a settings commit. CPU
//! stages run on the blocking thread pool.

use crate::application::port::{AssetHost, OwnerId, SettingsGateway};
use crate::config::EngineConfig;
use crate::domain::patch::{Patch, SettingsPatch};
use crate::domain::settings::AssetSlot;
use crate::domain::theme::ThemeCatalog;
use crate::error::{Error, Result};
use crate::media::{
    CropAdjustments, CropSession, ImagePipeline, PreparedImage, PublishedImage, RemovalOutcome,
};
use crate::store::{CommitReceipt, SettingsStore};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A crop in progress: the source and the interactive state over it.
#[derive(Debug, Clone)]
pub struct CropEdit {
    pub prepared: PreparedImage,
    pub session: CropSession,
}

impl CropEdit {
    #[must_use]
    pub fn slot(&self) -> AssetSlot {
        self.prepared.slot
    }
}

#[derive(Debug)]
pub struct DesignEngine {
    store: Arc<SettingsStore>,
    pipeline: Arc<ImagePipeline>,
    avatar_lock: Mutex<()>,
    background_lock: Mutex<()>,
}

impl DesignEngine {
    #[must_use]
    pub fn new(store: Arc<SettingsStore>, pipeline: ImagePipeline) -> Self {
        Self {
            store,
            pipeline: Arc::new(pipeline),
            avatar_lock: Mutex::new(()),
            background_lock: Mutex::new(()),
        }
    }

    /// Loads the store for `owner` and wires a pipeline to `host`.
    pub async fn open(
        owner: OwnerId,
        gateway: Arc<dyn SettingsGateway>,
        host: Arc<dyn AssetHost>,
        catalog: Arc<ThemeCatalog>,
        config: EngineConfig,
    ) -> Self {
        let store = SettingsStore::load(owner, gateway, catalog).await;
        Self::new(Arc::new(store), ImagePipeline::new(config, host))
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    #[must_use]
    pub fn pipeline(&self) -> &ImagePipeline {
        &self.pipeline
    }

    /// Commits the draft. See [`SettingsStore::commit`].
    ///
    /// # Errors
    ///
    /// See [`SettingsStore::commit`].
    pub async fn commit(&self) -> Result<CommitReceipt> {
        self.store.commit().await
    }

    fn slot_lock(&self, slot: AssetSlot) -> &Mutex<()> {
        match slot {
            AssetSlot::Avatar => &self.avatar_lock,
            AssetSlot::Background => &self.background_lock,
        }
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.store.is_loaded() {
            Ok(())
        } else {
            Err(Error::Unloaded)
        }
    }

    // ==========================================================================
    // Crop Lifecycle
    // ==========================================================================

    /// Validates and compresses a fresh upload and opens a crop over it.
    ///
    /// # Errors
    ///
    /// Validation and decode errors. The draft is not touched.
    pub async fn prepare_upload(
        &self,
        slot: AssetSlot,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<CropEdit> {
        self.ensure_loaded()?;
        tracing::debug!(slot = %slot, bytes = bytes.len(), mime, "upload received");
        let pipeline = Arc::clone(&self.pipeline);
        let mime = mime.to_string();
        let prepared =
            tokio::task::spawn_blocking(move || pipeline.prepare(slot, bytes, &mime))
                .await
                .map_err(|e| Error::Decode(format!("prepare task failed: {e}")))??;
        let session = self.pipeline.crop_session(&prepared)?;
        Ok(CropEdit { prepared, session })
    }

    /// Reopens the draft's original for `slot` and opens a crop over it.
    ///
    /// # Errors
    ///
    /// A validation error when the slot has no original; asset or decode
    /// errors from reopening.
    pub async fn reopen_crop(&self, slot: AssetSlot) -> Result<CropEdit> {
        self.ensure_loaded()?;
        let pair = self.store.draft().image(slot).clone();
        let prepared = self.pipeline.reopen(slot, &pair).await?;
        let session = self.pipeline.crop_session(&prepared)?;
        Ok(CropEdit { prepared, session })
    }

    /// Rasterizes and publishes `edit`, then points the draft at the result.
    ///
    /// # Errors
    ///
    /// Raster and asset errors abort before the draft changes;
    /// [`Error::Unloaded`] if the store was unloaded meanwhile.
    pub async fn apply_crop(&self, edit: CropEdit) -> Result<PublishedImage> {
        let _guard = self.slot_lock(edit.slot()).lock().await;
        self.finish_crop(edit).await
    }

    async fn finish_crop(&self, edit: CropEdit) -> Result<PublishedImage> {
        let slot = edit.slot();
        let pipeline = Arc::clone(&self.pipeline);
        let rendered =
            tokio::task::spawn_blocking(move || pipeline.render(&edit.prepared, &edit.session))
                .await
                .map_err(|e| Error::Raster(format!("render task failed: {e}")))??;
        let published = self.pipeline.publish(rendered).await?;

        let patch = SettingsPatch::image(
            slot,
            Patch::Set(published.derived.clone()),
            Patch::Set(published.original.clone()),
        );
        self.store.mutate_draft(&patch)?;
        tracing::info!(
            owner = %self.store.owner(),
            slot = %slot,
            derived = %published.derived,
            "draft image updated"
        );
        Ok(published)
    }

    /// Uploads a new image for `slot`, cropped by `adjustments`.
    ///
    /// The new image gets its own original. References held by the previous
    /// draft are left on the asset host since the baseline may still use them.
    ///
    /// # Errors
    ///
    /// See [`DesignEngine::prepare_upload`] and [`DesignEngine::apply_crop`].
    pub async fn upload_image(
        &self,
        slot: AssetSlot,
        bytes: Vec<u8>,
        mime: &str,
        adjustments: &CropAdjustments,
    ) -> Result<PublishedImage> {
        let _guard = self.slot_lock(slot).lock().await;
        let mut edit = self.prepare_upload(slot, bytes, mime).await?;
        edit.session.apply(adjustments);
        self.finish_crop(edit).await
    }

    /// Re-crops the image in `slot` from its original.
    ///
    /// # Errors
    ///
    /// See [`DesignEngine::reopen_crop`] and [`DesignEngine::apply_crop`].
    pub async fn recrop_image(
        &self,
        slot: AssetSlot,
        adjustments: &CropAdjustments,
    ) -> Result<PublishedImage> {
        let _guard = self.slot_lock(slot).lock().await;
        let mut edit = self.reopen_crop(slot).await?;
        edit.session.apply(adjustments);
        self.finish_crop(edit).await
    }

    /// Clears both references of `slot` in the draft and deletes the assets.
    ///
    /// The draft is cleared even when the remote delete fails; failures are
    /// reported in the outcome.
    ///
    /// # Errors
    ///
    /// [`Error::Unloaded`] after the store was unloaded.
    pub async fn remove_image(&self, slot: AssetSlot) -> Result<RemovalOutcome> {
        let _guard = self.slot_lock(slot).lock().await;
        let pair = self.store.draft().image(slot).clone();
        self.store
            .mutate_draft(&SettingsPatch::image(slot, Patch::Clear, Patch::Clear))?;
        if pair.is_empty() {
            return Ok(RemovalOutcome::default());
        }
        let outcome = self.pipeline.remove(&pair).await;
        tracing::info!(
            owner = %self.store.owner(),
            slot = %slot,
            complete = outcome.is_complete(),
            "draft image removed"
        );
        Ok(outcome)
    }
}
