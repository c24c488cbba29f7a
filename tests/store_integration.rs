// SPDX-License-Identifier: MPL-2.0
use linkpage_studio::application::port::OwnerId;
use linkpage_studio::domain::color::{ColorValue, Rgba};
use linkpage_studio::domain::patch::{Patch, SettingsPatch};
use linkpage_studio::domain::settings::{
    BackgroundMode, DesignSettings, FontFamily, CUSTOM_THEME_ID,
};
use linkpage_studio::domain::theme::ThemeCatalog;
use linkpage_studio::infrastructure::{FileGateway, MemoryGateway};
use linkpage_studio::style::{self, Fill, DARK_TEXT, LIGHT_TEXT};
use linkpage_studio::SettingsStore;
use std::sync::Arc;
use tempfile::tempdir;

fn catalog() -> Arc<ThemeCatalog> {
    Arc::new(ThemeCatalog::builtin().clone())
}

fn owner() -> OwnerId {
    OwnerId::new("page-42")
}

#[tokio::test]
async fn new_owner_theme_selection_and_background_mode_scenario() {
    let gateway = Arc::new(MemoryGateway::new());
    let store = SettingsStore::load(owner(), gateway.clone(), catalog()).await;

    let defaults = DesignSettings::from_template(ThemeCatalog::builtin().default_template());
    assert_eq!(store.baseline(), defaults);
    assert_eq!(store.draft(), defaults);

    // One theme selection is one draft update.
    let mut updates = store.subscribe();
    store.select_theme("sunset").unwrap();
    assert!(updates.has_changed().unwrap());
    let seen = updates.borrow_and_update().clone();
    let sunset = ThemeCatalog::builtin().get("sunset").unwrap();
    assert_eq!(seen.background_color, sunset.background);
    assert_eq!(seen.button_style, sunset.button_style);
    assert_eq!(seen.button_color, sunset.button_color);
    assert_eq!(seen.text_colors.name, sunset.text);
    assert_eq!(seen.font, sunset.font);
    assert!(!updates.has_changed().unwrap());

    let color = store.draft().background_color;
    for mode in [BackgroundMode::Image, BackgroundMode::Color] {
        store
            .mutate_draft(&SettingsPatch {
                background_mode: Patch::Set(mode),
                ..Default::default()
            })
            .unwrap();
    }
    assert_eq!(store.draft().background_color, color);

    let receipt = store.commit().await.unwrap();
    assert_eq!(receipt.settings.theme_id, "sunset");
    assert!(!store.is_dirty());

    // A second session sees the committed record.
    let reopened = SettingsStore::load(owner(), gateway, catalog()).await;
    assert_eq!(reopened.baseline(), store.baseline());
}

#[tokio::test]
async fn discard_removes_every_pending_mutation() {
    let store = SettingsStore::load(owner(), Arc::new(MemoryGateway::new()), catalog()).await;
    let baseline = store.baseline();

    store
        .mutate_draft(&SettingsPatch {
            font: Patch::Set(FontFamily::SpaceMono),
            ..Default::default()
        })
        .unwrap();
    store
        .mutate_draft(&SettingsPatch {
            show_branding: Patch::Set(false),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(store.changed_fields().len(), 2);

    store.discard_draft();
    assert_eq!(store.draft(), baseline);
    assert!(store.changed_fields().is_empty());
}

#[tokio::test]
async fn two_overlapping_commits_write_exactly_twice() {
    let gateway = Arc::new(MemoryGateway::new());
    let store = Arc::new(SettingsStore::load(owner(), gateway.clone(), catalog()).await);
    store
        .mutate_draft(&SettingsPatch {
            font: Patch::Set(FontFamily::Lora),
            ..Default::default()
        })
        .unwrap();

    gateway.hold_writes();
    let first = tokio::spawn({
        let store = store.clone();
        async move { store.commit().await }
    });
    gateway.wait_for_writes(1).await;

    let second = tokio::spawn({
        let store = store.clone();
        async move { store.commit().await }
    });
    tokio::task::yield_now().await;
    // Still before the first write completes: the follow-up must carry this.
    store
        .mutate_draft(&SettingsPatch {
            show_share_button: Patch::Set(false),
            ..Default::default()
        })
        .unwrap();
    gateway.release_writes();

    first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    let writes = gateway.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].1.show_share_button, Patch::Set(true));
    assert_eq!(writes[1].1.show_share_button, Patch::Set(false));
    assert!(!second.settings.show_share_button);
    assert_eq!(store.baseline(), second.settings);
}

#[tokio::test]
async fn file_gateway_persists_between_sessions() {
    let dir = tempdir().expect("Failed to create temporary directory");

    let store = SettingsStore::load(
        owner(),
        Arc::new(FileGateway::new(dir.path())),
        catalog(),
    )
    .await;
    store.select_theme("ocean").unwrap();
    store
        .mutate_draft(&SettingsPatch {
            bio_color: Patch::Set(ColorValue::Explicit(Rgba::rgb(0xfa, 0xfa, 0xfa))),
            ..Default::default()
        })
        .unwrap();
    store.commit().await.expect("commit to file gateway");

    let reopened = SettingsStore::load(
        owner(),
        Arc::new(FileGateway::new(dir.path())),
        catalog(),
    )
    .await;
    assert!(reopened.sync_status().is_synced());
    assert_eq!(reopened.baseline(), store.baseline());
    assert_eq!(reopened.baseline().theme_id, "ocean");

    dir.close().expect("Failed to close temporary directory");
}

fn custom_with_background(hex: &str) -> DesignSettings {
    let mut settings = DesignSettings::from_template(ThemeCatalog::builtin().default_template());
    let patch = SettingsPatch {
        theme_id: Patch::Set(CUSTOM_THEME_ID.to_string()),
        background_color: Patch::Set(Rgba::parse("background_color", hex).unwrap()),
        ..Default::default()
    };
    let unset = settings.clone();
    patch.apply_to(&mut settings, &unset);
    settings
}

#[test]
fn automatic_text_follows_background_luma() {
    let catalog = ThemeCatalog::builtin();

    let dark = style::resolve(&custom_with_background("#1e3a8a"), catalog);
    assert_eq!(dark.text.name, LIGHT_TEXT);
    let light = style::resolve(&custom_with_background("#ffd200"), catalog);
    assert_eq!(light.text.name, DARK_TEXT);

    // A manual override wins regardless of luma.
    let mut settings = custom_with_background("#ffd200");
    settings.text_colors.name = ColorValue::Explicit(Rgba::WHITE);
    assert_eq!(style::resolve(&settings, catalog).text.name, Rgba::WHITE);
}

#[test]
fn resolve_is_pure() {
    let catalog = ThemeCatalog::builtin();
    for theme in catalog.templates() {
        let mut settings = DesignSettings::from_template(catalog.default_template());
        settings.apply_template(theme);
        let first = style::resolve(&settings, catalog);
        let second = style::resolve(&settings, catalog);
        assert_eq!(first, second, "theme {}", theme.id);
    }
}

#[test]
fn outlined_theme_resolves_transparent_button() {
    let catalog = ThemeCatalog::builtin();
    let mut settings = DesignSettings::from_template(catalog.default_template());
    settings.apply_template(catalog.get("ocean").unwrap());
    let resolved = style::resolve(&settings, catalog);
    assert_eq!(resolved.button.fill, Fill::Transparent);
    assert_eq!(resolved.button.border, Some(Rgba::rgb(0x38, 0xbd, 0xf8)));
}
