// SPDX-License-Identifier: MPL-2.0
//! Settings store: a server-confirmed baseline and a local draft.
//!
//! The draft is what the rendering surface previews. It is mutated
//! synchronously and never waits on the network. The baseline only moves
//! when the gateway confirms a write, and then takes the record the gateway
//! returned rather than the one that was sent.
//!
//! # Commits
//!
//! At most one write per store is in flight. Commit requests are numbered;
//! a request that arrives while a write is running waits for it, then either
//! starts the single follow-up write (snapshotting the draft at that moment)
//! or, if a follow-up already covered it, shares that write's outcome.
//! Overlapping requests therefore produce at most two writes, in order.

use crate::application::port::{OwnerId, SettingsGateway};
use crate::domain::patch::{Patch, SettingsPatch};
use crate::domain::settings::DesignSettings;
use crate::domain::theme::ThemeCatalog;
use crate::error::{Error, Result};
use crate::style::{self, EffectiveStyle};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Whether the baseline is known to match the durable record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Synced,
    /// The baseline is a local default because the gateway could not be read.
    Unsynced { reason: String },
}

impl SyncStatus {
    #[must_use]
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncStatus::Synced)
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    /// The canonical record returned by the gateway, now the baseline.
    pub settings: DesignSettings,
    pub committed_at: DateTime<Utc>,
    /// `true` when this request was satisfied by a write started for a
    /// later request rather than by a write of its own.
    pub coalesced: bool,
}

struct State {
    baseline: DesignSettings,
    draft: DesignSettings,
    sync: SyncStatus,
    loaded: bool,
}

#[derive(Default)]
struct CommitQueue {
    /// Highest request number whose draft snapshot has been written.
    completed_seq: u64,
    last_outcome: Option<Result<CommitReceipt>>,
}

pub struct SettingsStore {
    owner: OwnerId,
    gateway: Arc<dyn SettingsGateway>,
    catalog: Arc<ThemeCatalog>,
    unset: DesignSettings,
    state: Mutex<State>,
    requested_seq: AtomicU64,
    commits: tokio::sync::Mutex<CommitQueue>,
    draft_tx: watch::Sender<DesignSettings>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("owner", &self.owner)
            .field("sync", &self.sync_status())
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Loads the baseline for `owner` and starts a draft from it.
    ///
    /// Never fails: when the gateway errors the store starts from catalog
    /// defaults and reports [`SyncStatus::Unsynced`].
    pub async fn load(
        owner: OwnerId,
        gateway: Arc<dyn SettingsGateway>,
        catalog: Arc<ThemeCatalog>,
    ) -> Self {
        let unset = DesignSettings::from_template(catalog.default_template());

        let (baseline, sync) = match gateway.read(&owner).await {
            Ok(Some(mut stored)) => {
                stored.normalize();
                tracing::info!(owner = %owner, theme = %stored.theme_id, "settings loaded");
                (stored, SyncStatus::Synced)
            }
            Ok(None) => {
                tracing::info!(owner = %owner, "no stored settings, starting from defaults");
                (unset.clone(), SyncStatus::Synced)
            }
            Err(err) => {
                tracing::warn!(owner = %owner, error = %err, "settings load failed, starting unsynced");
                (
                    unset.clone(),
                    SyncStatus::Unsynced {
                        reason: err.to_string(),
                    },
                )
            }
        };

        let (draft_tx, _) = watch::channel(baseline.clone());
        Self {
            owner,
            gateway,
            catalog,
            unset,
            state: Mutex::new(State {
                draft: baseline.clone(),
                baseline,
                sync,
                loaded: true,
            }),
            requested_seq: AtomicU64::new(0),
            commits: tokio::sync::Mutex::new(CommitQueue::default()),
            draft_tx,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // Draft updates are single assignments; a poisoned lock still holds a whole record.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    #[must_use]
    pub fn catalog(&self) -> &ThemeCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn draft(&self) -> DesignSettings {
        self.state().draft.clone()
    }

    #[must_use]
    pub fn baseline(&self) -> DesignSettings {
        self.state().baseline.clone()
    }

    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        self.state().sync.clone()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    /// Whether the draft differs from the baseline.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        let state = self.state();
        state.draft != state.baseline
    }

    /// Names of the draft fields that differ from the baseline.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let state = self.state();
        state.draft.diff(&state.baseline)
    }

    /// Receives a snapshot of the draft after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DesignSettings> {
        self.draft_tx.subscribe()
    }

    /// Resolves the current draft.
    #[must_use]
    pub fn effective_style(&self) -> EffectiveStyle {
        style::resolve(&self.state().draft, &self.catalog)
    }

    /// Resolves the baseline, i.e. what visitors currently see.
    #[must_use]
    pub fn baseline_style(&self) -> EffectiveStyle {
        style::resolve(&self.state().baseline, &self.catalog)
    }

    /// Shallow-merges `patch` into the draft.
    ///
    /// A patch that selects a named theme outside custom mode also takes the
    /// template's value for every themed field it leaves untouched.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when the patch fails validation and
    /// [`Error::Unloaded`] after [`SettingsStore::unload`]. The draft is
    /// unchanged in both cases.
    pub fn mutate_draft(&self, patch: &SettingsPatch) -> Result<()> {
        patch.validate(&self.catalog)?;
        self.mutate_with(|draft| Ok(patch.clone().with_theme_defaults(&self.catalog, draft)))
    }

    /// Selects a theme in one draft update.
    ///
    /// Outside custom mode a named theme overwrites every themed field. In
    /// custom mode, or when selecting the custom sentinel, only the id
    /// changes and individually edited fields are kept.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an unknown id, [`Error::Unloaded`] after unload.
    pub fn select_theme(&self, theme_id: &str) -> Result<()> {
        if !self.catalog.accepts(theme_id) {
            return Err(Error::validation(
                "theme_id",
                format!("unknown theme '{theme_id}'"),
            ));
        }
        self.mutate_draft(&SettingsPatch {
            theme_id: Patch::Set(theme_id.to_string()),
            ..SettingsPatch::default()
        })
    }

    /// Builds a patch from the current draft and applies it under one lock.
    fn mutate_with(
        &self,
        build: impl FnOnce(&DesignSettings) -> Result<SettingsPatch>,
    ) -> Result<()> {
        let mut state = self.state();
        if !state.loaded {
            return Err(Error::Unloaded);
        }
        let patch = build(&state.draft)?;
        let mut next = state.draft.clone();
        patch.apply_to(&mut next, &self.unset);
        if next != state.draft {
            tracing::debug!(owner = %self.owner, fields = ?next.diff(&state.draft), "draft updated");
            state.draft = next;
            self.draft_tx.send_replace(state.draft.clone());
        }
        Ok(())
    }

    /// Resets the draft to the baseline. Never touches the gateway.
    pub fn discard_draft(&self) {
        let mut state = self.state();
        if state.draft != state.baseline {
            tracing::info!(owner = %self.owner, fields = ?state.draft.diff(&state.baseline), "draft discarded");
            state.draft = state.baseline.clone();
            self.draft_tx.send_replace(state.draft.clone());
        }
    }

    /// Writes the current draft through the gateway.
    ///
    /// # Errors
    ///
    /// [`Error::Gateway`] when the write fails; baseline and draft are left
    /// as they were. [`Error::Unloaded`] after unload.
    pub async fn commit(&self) -> Result<CommitReceipt> {
        let seq = self.requested_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut queue = self.commits.lock().await;

        if queue.completed_seq >= seq {
            if let Some(outcome) = &queue.last_outcome {
                tracing::debug!(owner = %self.owner, seq, "commit coalesced into follow-up");
                return outcome.clone().map(|receipt| CommitReceipt {
                    coalesced: true,
                    ..receipt
                });
            }
        }

        // Every request numbered up to here was made before this snapshot.
        let covered = self.requested_seq.load(Ordering::SeqCst);
        let sent = {
            let state = self.state();
            if !state.loaded {
                return Err(Error::Unloaded);
            }
            state.draft.clone()
        };

        tracing::info!(owner = %self.owner, seq, covered, "commit started");
        let outcome = match self
            .gateway
            .write(&self.owner, &SettingsPatch::full(&sent))
            .await
        {
            Ok(mut canonical) => {
                canonical.normalize();
                self.adopt(&sent, &canonical);
                tracing::info!(owner = %self.owner, seq, "commit confirmed");
                Ok(CommitReceipt {
                    settings: canonical,
                    committed_at: Utc::now(),
                    coalesced: false,
                })
            }
            Err(err) => {
                tracing::warn!(owner = %self.owner, seq, error = %err, "commit failed");
                Err(Error::Gateway(err))
            }
        };

        queue.completed_seq = covered;
        queue.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Moves the baseline to `canonical`; the draft follows only if it still
    /// equals what was sent.
    fn adopt(&self, sent: &DesignSettings, canonical: &DesignSettings) {
        let mut state = self.state();
        if !state.loaded {
            return;
        }
        state.baseline = canonical.clone();
        state.sync = SyncStatus::Synced;
        if state.draft == *sent {
            if state.draft != *canonical {
                state.draft = canonical.clone();
                self.draft_tx.send_replace(state.draft.clone());
            }
        } else {
            tracing::debug!(owner = %self.owner, "draft diverged during commit, keeping it");
        }
    }

    /// Ends the editing session. Later mutations and commits fail with
    /// [`Error::Unloaded`]; a commit already in flight still completes remotely.
    pub fn unload(&self) {
        let mut state = self.state();
        if state.loaded {
            state.loaded = false;
            tracing::info!(owner = %self.owner, dirty = state.draft != state.baseline, "settings store unloaded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port::GatewayError;
    use crate::domain::color::{ColorValue, Rgba};
    use crate::domain::settings::{BackgroundMode, FontFamily, SocialPosition, CUSTOM_THEME_ID};
    use crate::infrastructure::memory::MemoryGateway;

    fn catalog() -> Arc<ThemeCatalog> {
        Arc::new(ThemeCatalog::builtin().clone())
    }

    fn defaults() -> DesignSettings {
        DesignSettings::from_template(ThemeCatalog::builtin().default_template())
    }

    async fn store_with(gateway: Arc<MemoryGateway>) -> Arc<SettingsStore> {
        Arc::new(SettingsStore::load(OwnerId::new("page"), gateway, catalog()).await)
    }

    fn set_font(font: FontFamily) -> SettingsPatch {
        SettingsPatch {
            font: Patch::Set(font),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn load_without_record_uses_catalog_defaults() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        assert_eq!(store.baseline(), defaults());
        assert_eq!(store.draft(), defaults());
        assert!(store.sync_status().is_synced());
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn load_normalizes_stored_record() {
        let gateway = Arc::new(MemoryGateway::new());
        let mut stored = defaults();
        stored.theme_id = CUSTOM_THEME_ID.to_string();
        stored.is_custom_theme = false;
        gateway.insert(OwnerId::new("page"), stored);

        let store = store_with(gateway).await;
        assert!(store.baseline().is_custom_theme);
    }

    #[tokio::test]
    async fn load_failure_opens_unsynced_with_defaults() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.fail_reads(Some(GatewayError::Unavailable("offline".into())));
        let store = store_with(gateway.clone()).await;

        assert_eq!(store.draft(), defaults());
        assert!(matches!(store.sync_status(), SyncStatus::Unsynced { .. }));

        store.mutate_draft(&set_font(FontFamily::Lora)).unwrap();
        store.commit().await.unwrap();
        assert!(store.sync_status().is_synced());
    }

    #[tokio::test]
    async fn mutate_then_discard_restores_baseline() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        store.mutate_draft(&set_font(FontFamily::Lora)).unwrap();
        store
            .mutate_draft(&SettingsPatch {
                show_branding: Patch::Set(false),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(store.changed_fields(), vec!["font", "show_branding"]);

        store.discard_draft();
        assert_eq!(store.draft(), store.baseline());
        assert!(store.changed_fields().is_empty());
    }

    #[tokio::test]
    async fn invalid_patch_leaves_draft_untouched() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        let before = store.draft();
        let err = store
            .mutate_draft(&SettingsPatch {
                theme_id: Patch::Set("neon".into()),
                font: Patch::Set(FontFamily::Lora),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(store.draft(), before);
    }

    #[tokio::test]
    async fn selecting_named_theme_overwrites_themed_fields() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        store.select_theme("sunset").unwrap();

        let sunset = ThemeCatalog::builtin().get("sunset").unwrap();
        let draft = store.draft();
        assert_eq!(draft.theme_id, "sunset");
        assert_eq!(draft.background_color, sunset.background);
        assert_eq!(draft.button_style, sunset.button_style);
        assert_eq!(draft.button_color, sunset.button_color);
        assert_eq!(draft.font, sunset.font);
        assert!(!draft.is_custom_theme);
    }

    #[tokio::test]
    async fn selecting_theme_in_custom_mode_keeps_edited_fields() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        store.select_theme(CUSTOM_THEME_ID).unwrap();
        store
            .mutate_draft(&SettingsPatch {
                background_color: Patch::Set(Rgba::rgb(1, 2, 3)),
                ..Default::default()
            })
            .unwrap();
        assert!(store.draft().is_custom_theme);

        store.select_theme("ocean").unwrap();
        let draft = store.draft();
        assert_eq!(draft.theme_id, "ocean");
        assert!(!draft.is_custom_theme);
        assert_eq!(draft.background_color, Rgba::rgb(1, 2, 3));
    }

    #[tokio::test]
    async fn generic_theme_edit_overwrites_themed_fields() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        let mut patch = SettingsPatch::default();
        patch.set_field("theme_id", "sunset").unwrap();
        store.mutate_draft(&patch).unwrap();

        let sunset = ThemeCatalog::builtin().get("sunset").unwrap();
        let before = store.effective_style();
        let draft = store.draft();
        assert_eq!(draft.background_color, sunset.background);
        assert_eq!(draft.button_color, sunset.button_color);
        assert_eq!(draft.font, sunset.font);

        // Entering custom mode starts from what was on screen.
        store.select_theme(CUSTOM_THEME_ID).unwrap();
        let after = store.effective_style();
        assert_eq!(after.background, before.background);
        assert_eq!(after.font, before.font);
        assert_eq!(after.button, before.button);
    }

    #[tokio::test]
    async fn theme_edit_keeps_fields_set_in_same_patch() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        store
            .mutate_draft(&SettingsPatch {
                theme_id: Patch::Set("ocean".into()),
                font: Patch::Set(FontFamily::Lora),
                ..Default::default()
            })
            .unwrap();
        let draft = store.draft();
        let ocean = ThemeCatalog::builtin().get("ocean").unwrap();
        assert_eq!(draft.background_color, ocean.background);
        assert_eq!(draft.font, FontFamily::Lora);
    }

    #[tokio::test]
    async fn unknown_theme_is_rejected() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        assert!(store.select_theme("vaporwave").is_err());
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn background_mode_round_trip_restores_color() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        store.select_theme(CUSTOM_THEME_ID).unwrap();
        let color = Rgba::rgb(0x22, 0x44, 0x66);
        store
            .mutate_draft(&SettingsPatch {
                background_color: Patch::Set(color),
                ..Default::default()
            })
            .unwrap();

        for mode in [BackgroundMode::Image, BackgroundMode::Color] {
            store
                .mutate_draft(&SettingsPatch {
                    background_mode: Patch::Set(mode),
                    ..Default::default()
                })
                .unwrap();
        }
        assert_eq!(store.draft().background_color, color);
    }

    #[tokio::test]
    async fn commit_moves_baseline_and_clears_dirty() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = store_with(gateway.clone()).await;
        store.mutate_draft(&set_font(FontFamily::SpaceMono)).unwrap();

        let receipt = store.commit().await.unwrap();
        assert!(!receipt.coalesced);
        assert_eq!(receipt.settings.font, FontFamily::SpaceMono);
        assert_eq!(store.baseline(), receipt.settings);
        assert!(!store.is_dirty());
        assert_eq!(gateway.write_count(), 1);
    }

    #[tokio::test]
    async fn failed_commit_preserves_draft_and_baseline() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = store_with(gateway.clone()).await;
        store.mutate_draft(&set_font(FontFamily::Lora)).unwrap();
        let draft = store.draft();
        let baseline = store.baseline();

        gateway.fail_next_write(GatewayError::Unavailable("timeout".into()));
        let err = store.commit().await.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(store.draft(), draft);
        assert_eq!(store.baseline(), baseline);

        // Retry is user-initiated and goes through.
        store.commit().await.unwrap();
        assert_eq!(store.baseline().font, FontFamily::Lora);
    }

    #[tokio::test]
    async fn draft_edited_during_commit_is_left_alone() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = store_with(gateway.clone()).await;
        store.mutate_draft(&set_font(FontFamily::Lora)).unwrap();

        gateway.hold_writes();
        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.commit().await }
        });
        gateway.wait_for_writes(1).await;
        store
            .mutate_draft(&SettingsPatch {
                social_position: Patch::Set(SocialPosition::Bottom),
                ..Default::default()
            })
            .unwrap();
        gateway.release_writes();
        pending.await.unwrap().unwrap();

        assert_eq!(store.baseline().font, FontFamily::Lora);
        assert_eq!(store.baseline().social_position, SocialPosition::Top);
        assert_eq!(store.draft().social_position, SocialPosition::Bottom);
        assert_eq!(store.changed_fields(), vec!["social_position"]);
    }

    #[tokio::test]
    async fn discard_during_commit_still_advances_baseline() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = store_with(gateway.clone()).await;
        store.mutate_draft(&set_font(FontFamily::Lora)).unwrap();

        gateway.hold_writes();
        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.commit().await }
        });
        gateway.wait_for_writes(1).await;
        store.discard_draft();
        gateway.release_writes();
        pending.await.unwrap().unwrap();

        assert_eq!(store.baseline().font, FontFamily::Lora);
        assert_eq!(store.draft().font, FontFamily::Inter);
    }

    #[tokio::test]
    async fn overlapping_commits_write_twice_in_order() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = store_with(gateway.clone()).await;
        store.mutate_draft(&set_font(FontFamily::Lora)).unwrap();

        gateway.hold_writes();
        let spawn_commit = |store: Arc<SettingsStore>| tokio::spawn(async move { store.commit().await });
        let first = spawn_commit(store.clone());
        gateway.wait_for_writes(1).await;

        store.mutate_draft(&set_font(FontFamily::Poppins)).unwrap();
        let second = spawn_commit(store.clone());
        let third = spawn_commit(store.clone());
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        // Edited after both follow-up requests, before the follow-up starts.
        let bio = ColorValue::Explicit(Rgba::rgb(9, 9, 9));
        store
            .mutate_draft(&SettingsPatch {
                bio_color: Patch::Set(bio),
                ..Default::default()
            })
            .unwrap();
        gateway.release_writes();

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        let third = third.await.unwrap().unwrap();

        assert_eq!(gateway.write_count(), 2);
        let writes = gateway.writes();
        assert_eq!(writes[0].1.font, Patch::Set(FontFamily::Lora));
        assert_eq!(writes[1].1.font, Patch::Set(FontFamily::Poppins));
        assert_eq!(writes[1].1.bio_color, Patch::Set(bio));

        assert!(!first.coalesced);
        assert_eq!(first.settings.font, FontFamily::Lora);
        assert_eq!(second.settings, third.settings);
        assert!(!second.coalesced);
        assert!(third.coalesced);
        assert_eq!(store.baseline().font, FontFamily::Poppins);
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn subscribers_see_each_draft_change() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        let mut rx = store.subscribe();
        store.mutate_draft(&set_font(FontFamily::Lora)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().font, FontFamily::Lora);

        store.discard_draft();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().font, FontFamily::Inter);
    }

    #[tokio::test]
    async fn effective_style_tracks_draft() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        store.select_theme("midnight").unwrap();
        assert_eq!(store.effective_style().font.family, FontFamily::SpaceMono);
        assert_eq!(store.baseline_style().font.family, FontFamily::Inter);
    }

    #[tokio::test]
    async fn unloaded_store_rejects_mutations_and_commits() {
        let store = store_with(Arc::new(MemoryGateway::new())).await;
        store.unload();
        assert!(matches!(
            store.mutate_draft(&set_font(FontFamily::Lora)),
            Err(Error::Unloaded)
        ));
        assert!(matches!(store.commit().await, Err(Error::Unloaded)));
    }
}
