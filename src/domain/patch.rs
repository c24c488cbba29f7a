// SPDX-License-Identifier: MPL-2.0
//! Typed partial updates of [`DesignSettings`].
//!
//! [`Patch::Keep`] leaves a field alone, [`Patch::Clear`] resets it to its
//! unset representation, [`Patch::Set`] writes a value. On the wire `Keep` is
//! omitted and `Clear` is the empty string.

use super::color::{ColorValue, Gradient, Rgba};
use super::settings::{
    AssetRef, AssetSlot, AvatarShape, BackgroundMode, ButtonStyle, DesignSettings, FontFamily,
    SocialPosition,
};
use super::theme::{ThemeCatalog, ThemeTemplate};
use crate::error::{Error, Result};
use serde::{Serialize, Serializer};

/// A single field update.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Keep,
    Set(T),
    Clear,
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    #[must_use]
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// Set when `value` is `Some`, clear otherwise.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Patch::Clear, Patch::Set)
    }

    /// This update, or `base` when this one is [`Patch::Keep`].
    #[must_use]
    pub fn or(self, base: Patch<T>) -> Self {
        match self {
            Patch::Keep => base,
            other => other,
        }
    }
}

impl<T: Clone> Patch<T> {
    /// Writes this update into `slot`; `unset` supplies the cleared value.
    fn apply(&self, slot: &mut T, unset: impl FnOnce() -> T) {
        match self {
            Patch::Keep => {}
            Patch::Set(value) => *slot = value.clone(),
            Patch::Clear => *slot = unset(),
        }
    }

    fn apply_option(&self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Set(value) => *slot = Some(value.clone()),
            Patch::Clear => *slot = None,
        }
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            // Fields holding Keep are skipped by `SettingsPatch`.
            Patch::Keep => serializer.serialize_none(),
            Patch::Set(value) => value.serialize(serializer),
            Patch::Clear => serializer.serialize_str(""),
        }
    }
}

/// Partial update of a [`DesignSettings`] record, one [`Patch`] per field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub theme_id: Patch<String>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub background_mode: Patch<BackgroundMode>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub background_color: Patch<Rgba>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub background_image: Patch<AssetRef>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub background_original: Patch<AssetRef>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub button_style: Patch<ButtonStyle>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub button_color: Patch<Rgba>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub button_gradient: Patch<Gradient>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub button_text_color: Patch<ColorValue>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub avatar_shape: Patch<AvatarShape>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub avatar_border_color: Patch<ColorValue>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub avatar_image: Patch<AssetRef>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub avatar_original: Patch<AssetRef>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub font: Patch<FontFamily>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub social_position: Patch<SocialPosition>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub show_branding: Patch<bool>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub show_share_button: Patch<bool>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub name_color: Patch<ColorValue>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub bio_color: Patch<ColorValue>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub username_color: Patch<ColorValue>,
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub footer_color: Patch<ColorValue>,
}

impl SettingsPatch {
    /// A patch that sets every field to the value held by `settings`.
    #[must_use]
    pub fn full(settings: &DesignSettings) -> Self {
        Self {
            theme_id: Patch::Set(settings.theme_id.clone()),
            background_mode: Patch::Set(settings.background_mode),
            background_color: Patch::Set(settings.background_color),
            background_image: Patch::from_option(settings.background_image.derived.clone()),
            background_original: Patch::from_option(settings.background_image.original.clone()),
            button_style: Patch::Set(settings.button_style),
            button_color: Patch::Set(settings.button_color),
            button_gradient: Patch::from_option(settings.button_gradient.clone()),
            button_text_color: Patch::Set(settings.button_text_color),
            avatar_shape: Patch::Set(settings.avatar_shape),
            avatar_border_color: Patch::Set(settings.avatar_border_color),
            avatar_image: Patch::from_option(settings.avatar_image.derived.clone()),
            avatar_original: Patch::from_option(settings.avatar_image.original.clone()),
            font: Patch::Set(settings.font),
            social_position: Patch::Set(settings.social_position),
            show_branding: Patch::Set(settings.show_branding),
            show_share_button: Patch::Set(settings.show_share_button),
            name_color: Patch::Set(settings.text_colors.name),
            bio_color: Patch::Set(settings.text_colors.bio),
            username_color: Patch::Set(settings.text_colors.username),
            footer_color: Patch::Set(settings.text_colors.footer),
        }
    }

    /// Selects `template` and overwrites every themed field with its defaults.
    #[must_use]
    pub fn theme(template: &ThemeTemplate) -> Self {
        Self {
            theme_id: Patch::Set(template.id.to_string()),
            background_color: Patch::Set(template.background),
            button_style: Patch::Set(template.button_style),
            button_color: Patch::Set(template.button_color),
            button_gradient: Patch::from_option(template.button_gradient.clone()),
            button_text_color: Patch::Set(template.button_text),
            avatar_border_color: Patch::Set(template.avatar_border),
            font: Patch::Set(template.font),
            name_color: Patch::Set(template.text),
            bio_color: Patch::Set(template.text),
            username_color: Patch::Set(template.text),
            footer_color: Patch::Set(template.text),
            ..Self::default()
        }
    }

    /// Layers this patch over `base`: fields this patch keeps take `base`'s update.
    #[must_use]
    pub fn layered_over(self, base: SettingsPatch) -> Self {
        Self {
            theme_id: self.theme_id.or(base.theme_id),
            background_mode: self.background_mode.or(base.background_mode),
            background_color: self.background_color.or(base.background_color),
            background_image: self.background_image.or(base.background_image),
            background_original: self.background_original.or(base.background_original),
            button_style: self.button_style.or(base.button_style),
            button_color: self.button_color.or(base.button_color),
            button_gradient: self.button_gradient.or(base.button_gradient),
            button_text_color: self.button_text_color.or(base.button_text_color),
            avatar_shape: self.avatar_shape.or(base.avatar_shape),
            avatar_border_color: self.avatar_border_color.or(base.avatar_border_color),
            avatar_image: self.avatar_image.or(base.avatar_image),
            avatar_original: self.avatar_original.or(base.avatar_original),
            font: self.font.or(base.font),
            social_position: self.social_position.or(base.social_position),
            show_branding: self.show_branding.or(base.show_branding),
            show_share_button: self.show_share_button.or(base.show_share_button),
            name_color: self.name_color.or(base.name_color),
            bio_color: self.bio_color.or(base.bio_color),
            username_color: self.username_color.or(base.username_color),
            footer_color: self.footer_color.or(base.footer_color),
        }
    }

    /// Expands a theme selection into the template's defaults.
    ///
    /// When the patch sets `theme_id` to a named template and `current` is not
    /// in custom-theme mode, every themed field the patch keeps is taken from
    /// the template. Fields the patch sets itself still win. In custom mode,
    /// or for the custom sentinel, the patch is returned unchanged.
    #[must_use]
    pub fn with_theme_defaults(self, catalog: &ThemeCatalog, current: &DesignSettings) -> Self {
        if current.is_custom_theme {
            return self;
        }
        let template = match &self.theme_id {
            Patch::Set(id) => catalog.get(id),
            _ => None,
        };
        match template {
            Some(template) => self.layered_over(SettingsPatch::theme(template)),
            None => self,
        }
    }

    /// Updates the derived and original references of one image slot.
    #[must_use]
    pub fn image(slot: AssetSlot, derived: Patch<AssetRef>, original: Patch<AssetRef>) -> Self {
        let mut patch = Self::default();
        match slot {
            AssetSlot::Avatar => {
                patch.avatar_image = derived;
                patch.avatar_original = original;
            }
            AssetSlot::Background => {
                patch.background_image = derived;
                patch.background_original = original;
            }
        }
        patch
    }

    /// Whether the patch leaves every field untouched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Checks semantic rules that the field types alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unknown theme id or an empty
    /// asset reference.
    pub fn validate(&self, catalog: &ThemeCatalog) -> Result<()> {
        match &self.theme_id {
            Patch::Set(id) if !catalog.accepts(id) => {
                return Err(Error::validation("theme_id", format!("unknown theme '{id}'")));
            }
            Patch::Clear => {
                return Err(Error::validation("theme_id", "a theme is always required"));
            }
            _ => {}
        }

        for (field, patch) in [
            ("background_image", &self.background_image),
            ("background_original", &self.background_original),
            ("avatar_image", &self.avatar_image),
            ("avatar_original", &self.avatar_original),
        ] {
            if let Patch::Set(reference) = patch {
                if reference.as_str().trim().is_empty() {
                    return Err(Error::validation(field, "asset reference is empty"));
                }
            }
        }
        Ok(())
    }

    /// Shallow-merges the patch into `target`.
    ///
    /// Cleared required fields take their value from `unset`; cleared
    /// optional fields become `None` and cleared colors become automatic.
    /// Dependent fields are re-derived afterwards.
    pub fn apply_to(&self, target: &mut DesignSettings, unset: &DesignSettings) {
        self.theme_id
            .apply(&mut target.theme_id, || unset.theme_id.clone());
        self.background_mode
            .apply(&mut target.background_mode, || unset.background_mode);
        self.background_color
            .apply(&mut target.background_color, || unset.background_color);
        self.background_image
            .apply_option(&mut target.background_image.derived);
        self.background_original
            .apply_option(&mut target.background_image.original);
        self.button_style
            .apply(&mut target.button_style, || unset.button_style);
        self.button_color
            .apply(&mut target.button_color, || unset.button_color);
        self.button_gradient.apply_option(&mut target.button_gradient);
        self.button_text_color
            .apply(&mut target.button_text_color, || ColorValue::Automatic);
        self.avatar_shape
            .apply(&mut target.avatar_shape, || unset.avatar_shape);
        self.avatar_border_color
            .apply(&mut target.avatar_border_color, || ColorValue::Automatic);
        self.avatar_image.apply_option(&mut target.avatar_image.derived);
        self.avatar_original
            .apply_option(&mut target.avatar_image.original);
        self.font.apply(&mut target.font, || unset.font);
        self.social_position
            .apply(&mut target.social_position, || unset.social_position);
        self.show_branding
            .apply(&mut target.show_branding, || unset.show_branding);
        self.show_share_button
            .apply(&mut target.show_share_button, || unset.show_share_button);
        self.name_color
            .apply(&mut target.text_colors.name, || ColorValue::Automatic);
        self.bio_color
            .apply(&mut target.text_colors.bio, || ColorValue::Automatic);
        self.username_color
            .apply(&mut target.text_colors.username, || ColorValue::Automatic);
        self.footer_color
            .apply(&mut target.text_colors.footer, || ColorValue::Automatic);

        target.normalize();
    }

    /// Parses one raw form field into the patch.
    ///
    /// An empty value clears the field. Enum values use their kebab-case
    /// names (`gradient`, `space-mono`, `bottom`), booleans `true`/`false`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unknown fields and malformed values;
    /// the patch is left unchanged in that case.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<()> {
        let raw = raw.trim();
        let clear = raw.is_empty();

        macro_rules! assign {
            ($field:ident, $parse:expr) => {{
                self.$field = if clear { Patch::Clear } else { Patch::Set($parse?) };
                Ok(())
            }};
        }

        match name {
            "theme_id" => assign!(theme_id, Ok::<_, Error>(raw.to_string())),
            "background_mode" => assign!(background_mode, parse_enum(name, raw)),
            "background_color" => assign!(background_color, Rgba::parse(name, raw)),
            "background_image" => assign!(background_image, Ok::<_, Error>(AssetRef::new(raw))),
            "background_original" => {
                assign!(background_original, Ok::<_, Error>(AssetRef::new(raw)))
            }
            "button_style" => assign!(button_style, parse_enum(name, raw)),
            "button_color" => assign!(button_color, Rgba::parse(name, raw)),
            "button_gradient" => assign!(button_gradient, Gradient::parse(name, raw)),
            "button_text_color" => assign!(button_text_color, ColorValue::parse(name, raw)),
            "avatar_shape" => assign!(avatar_shape, parse_enum(name, raw)),
            "avatar_border_color" => assign!(avatar_border_color, ColorValue::parse(name, raw)),
            "avatar_image" => assign!(avatar_image, Ok::<_, Error>(AssetRef::new(raw))),
            "avatar_original" => assign!(avatar_original, Ok::<_, Error>(AssetRef::new(raw))),
            "font" => assign!(font, parse_enum(name, raw)),
            "social_position" => assign!(social_position, parse_enum(name, raw)),
            "show_branding" => assign!(show_branding, parse_bool(name, raw)),
            "show_share_button" => assign!(show_share_button, parse_bool(name, raw)),
            "name_color" => assign!(name_color, ColorValue::parse(name, raw)),
            "bio_color" => assign!(bio_color, ColorValue::parse(name, raw)),
            "username_color" => assign!(username_color, ColorValue::parse(name, raw)),
            "footer_color" => assign!(footer_color, ColorValue::parse(name, raw)),
            other => Err(Error::validation(other, "unknown settings field")),
        }
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(field: &str, raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| Error::validation(field, format!("'{raw}' is not an accepted value")))
}

fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(Error::validation(field, format!("'{raw}' is not a boolean"))),
    }
}
