// SPDX-License-Identifier: MPL-2.0
//! In-memory adapters for tests, demos and the CLI.
//!
//! Both adapters record what they were asked to do so tests can assert on
//! write counts and payloads, and both support failure injection.

use crate::application::port::{AssetError, AssetHost, GatewayError, OwnerId, SettingsGateway};
use crate::domain::patch::SettingsPatch;
use crate::domain::settings::{AssetRef, AssetSlot, DesignSettings};
use crate::domain::theme::ThemeCatalog;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::watch;

/// Locks a mutex, recovering the data if a panicking test poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// =============================================================================
// MemoryGateway
// =============================================================================

/// Settings gateway backed by a `HashMap`.
///
/// Writes can be held open with [`MemoryGateway::hold_writes`] to observe
/// behavior while a commit is in flight.
pub struct MemoryGateway {
    records: Mutex<HashMap<OwnerId, DesignSettings>>,
    writes: Mutex<Vec<(OwnerId, SettingsPatch)>>,
    failures: Mutex<VecDeque<GatewayError>>,
    read_failure: Mutex<Option<GatewayError>>,
    held: watch::Sender<bool>,
    started: watch::Sender<usize>,
    unset: DesignSettings,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            read_failure: Mutex::new(None),
            held: watch::Sender::new(false),
            started: watch::Sender::new(0),
            unset: DesignSettings::from_template(ThemeCatalog::builtin().default_template()),
        }
    }

    /// Pre-populates the stored record of `owner`.
    pub fn insert(&self, owner: OwnerId, settings: DesignSettings) {
        lock(&self.records).insert(owner, settings);
    }

    #[must_use]
    pub fn stored(&self, owner: &OwnerId) -> Option<DesignSettings> {
        lock(&self.records).get(owner).cloned()
    }

    /// Number of writes that reached the gateway, successful or not.
    #[must_use]
    pub fn write_count(&self) -> usize {
        lock(&self.writes).len()
    }

    /// Every patch written, in arrival order.
    #[must_use]
    pub fn writes(&self) -> Vec<(OwnerId, SettingsPatch)> {
        lock(&self.writes).clone()
    }

    /// Makes the next write fail with `error`. Queued failures are consumed in order.
    pub fn fail_next_write(&self, error: GatewayError) {
        lock(&self.failures).push_back(error);
    }

    /// Makes every read fail with `error` until cleared with `None`.
    pub fn fail_reads(&self, error: Option<GatewayError>) {
        *lock(&self.read_failure) = error;
    }

    /// Blocks subsequent writes until [`MemoryGateway::release_writes`].
    pub fn hold_writes(&self) {
        self.held.send_replace(true);
    }

    pub fn release_writes(&self) {
        self.held.send_replace(false);
    }

    /// Waits until at least `count` writes have started.
    pub async fn wait_for_writes(&self, count: usize) {
        let mut rx = self.started.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|started| *started >= count).await;
    }
}

#[async_trait]
impl SettingsGateway for MemoryGateway {
    async fn read(&self, owner: &OwnerId) -> Result<Option<DesignSettings>, GatewayError> {
        if let Some(error) = lock(&self.read_failure).clone() {
            return Err(error);
        }
        Ok(self.stored(owner))
    }

    async fn write(
        &self,
        owner: &OwnerId,
        patch: &SettingsPatch,
    ) -> Result<DesignSettings, GatewayError> {
        lock(&self.writes).push((owner.clone(), patch.clone()));
        self.started.send_modify(|started| *started += 1);

        let mut held = self.held.subscribe();
        let _ = held.wait_for(|held| !*held).await;

        if let Some(error) = lock(&self.failures).pop_front() {
            return Err(error);
        }

        let mut records = lock(&self.records);
        let record = records
            .entry(owner.clone())
            .or_insert_with(|| self.unset.clone());
        patch.apply_to(record, &self.unset);
        Ok(record.clone())
    }
}

// =============================================================================
// MemoryAssetHost
// =============================================================================

#[derive(Debug, Clone)]
struct StoredAsset {
    bytes: Vec<u8>,
    content_type: String,
}

/// Asset host that keeps bytes in memory under `mem://<slot>/<blake3>`.
#[derive(Default)]
pub struct MemoryAssetHost {
    assets: Mutex<HashMap<AssetRef, StoredAsset>>,
    uploads: Mutex<Vec<(AssetSlot, AssetRef)>>,
    deletes: Mutex<Vec<AssetRef>>,
    fetches: Mutex<Vec<AssetRef>>,
    fail_uploads: Mutex<Option<AssetError>>,
    fail_deletes: Mutex<Option<AssetError>>,
}

impl MemoryAssetHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference an upload of `bytes` to `slot` will receive.
    #[must_use]
    pub fn reference_for(slot: AssetSlot, bytes: &[u8]) -> AssetRef {
        AssetRef::new(format!("mem://{slot}/{}", blake3::hash(bytes).to_hex()))
    }

    #[must_use]
    pub fn contains(&self, reference: &AssetRef) -> bool {
        lock(&self.assets).contains_key(reference)
    }

    #[must_use]
    pub fn bytes(&self, reference: &AssetRef) -> Option<Vec<u8>> {
        lock(&self.assets).get(reference).map(|a| a.bytes.clone())
    }

    #[must_use]
    pub fn content_type(&self, reference: &AssetRef) -> Option<String> {
        lock(&self.assets)
            .get(reference)
            .map(|a| a.content_type.clone())
    }

    /// Successful uploads, in order.
    #[must_use]
    pub fn uploads(&self) -> Vec<(AssetSlot, AssetRef)> {
        lock(&self.uploads).clone()
    }

    /// Delete requests received, in order, including failed ones.
    #[must_use]
    pub fn deletes(&self) -> Vec<AssetRef> {
        lock(&self.deletes).clone()
    }

    /// Fetch requests received, in order.
    #[must_use]
    pub fn fetches(&self) -> Vec<AssetRef> {
        lock(&self.fetches).clone()
    }

    pub fn fail_uploads(&self, error: Option<AssetError>) {
        *lock(&self.fail_uploads) = error;
    }

    pub fn fail_deletes(&self, error: Option<AssetError>) {
        *lock(&self.fail_deletes) = error;
    }
}

#[async_trait]
impl AssetHost for MemoryAssetHost {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        slot: AssetSlot,
        content_type: &str,
    ) -> Result<AssetRef, AssetError> {
        if let Some(error) = lock(&self.fail_uploads).clone() {
            return Err(error);
        }
        if bytes.is_empty() {
            return Err(AssetError::Rejected("empty upload".to_string()));
        }
        let reference = Self::reference_for(slot, &bytes);
        lock(&self.assets).insert(
            reference.clone(),
            StoredAsset {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        lock(&self.uploads).push((slot, reference.clone()));
        Ok(reference)
    }

    async fn delete(&self, reference: &AssetRef) -> Result<(), AssetError> {
        lock(&self.deletes).push(reference.clone());
        if let Some(error) = lock(&self.fail_deletes).clone() {
            return Err(error);
        }
        lock(&self.assets).remove(reference);
        Ok(())
    }

    async fn fetch(&self, reference: &AssetRef) -> Result<Vec<u8>, AssetError> {
        lock(&self.fetches).push(reference.clone());
        self.bytes(reference)
            .ok_or_else(|| AssetError::NotFound(reference.clone()))
    }
}
