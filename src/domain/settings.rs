// SPDX-License-Identifier: MPL-2.0
//! The design settings record and its field types.

use super::color::{ColorValue, Gradient, Rgba};
use super::theme::ThemeTemplate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Theme identifier that switches the page into custom-theme mode.
pub const CUSTOM_THEME_ID: &str = "custom";

/// Opaque reference returned by the asset host (URL-equivalent).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which image a pipeline run or asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSlot {
    Avatar,
    Background,
}

impl AssetSlot {
    pub const ALL: [AssetSlot; 2] = [AssetSlot::Avatar, AssetSlot::Background];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssetSlot::Avatar => "avatar",
            AssetSlot::Background => "background",
        }
    }
}

impl fmt::Display for AssetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssetSlot {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "avatar" => Ok(AssetSlot::Avatar),
            "background" => Ok(AssetSlot::Background),
            other => Err(crate::error::Error::validation(
                "slot",
                format!("unknown asset slot '{other}'"),
            )),
        }
    }
}

/// The displayed image and the untouched source it was cropped from.
///
/// `original` is written once per image and never replaced by a derived
/// crop; re-cropping always starts again from it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImagePair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<AssetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<AssetRef>,
}

impl ImagePair {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.derived.is_none() && self.original.is_none()
    }

    /// All references held, original first.
    pub fn references(&self) -> impl Iterator<Item = &AssetRef> {
        self.original.iter().chain(self.derived.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundMode {
    #[default]
    Color,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ButtonStyle {
    #[default]
    Filled,
    Outlined,
    Gradient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvatarShape {
    #[default]
    Circle,
    Rounded,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    #[default]
    Inter,
    Poppins,
    PlayfairDisplay,
    SpaceMono,
    Lora,
    System,
}

impl FontFamily {
    /// CSS `font-family` stack for the rendering surface.
    #[must_use]
    pub fn css_stack(self) -> &'static str {
        match self {
            FontFamily::Inter => "'Inter', sans-serif",
            FontFamily::Poppins => "'Poppins', sans-serif",
            FontFamily::PlayfairDisplay => "'Playfair Display', serif",
            FontFamily::SpaceMono => "'Space Mono', monospace",
            FontFamily::Lora => "'Lora', serif",
            FontFamily::System => "system-ui, sans-serif",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SocialPosition {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Per-role text color overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextColors {
    #[serde(default)]
    pub name: ColorValue,
    #[serde(default)]
    pub bio: ColorValue,
    #[serde(default)]
    pub username: ColorValue,
    #[serde(default)]
    pub footer: ColorValue,
}

impl TextColors {
    /// Every role set to the same value.
    #[must_use]
    pub fn uniform(value: ColorValue) -> Self {
        Self {
            name: value,
            bio: value,
            username: value,
            footer: value,
        }
    }
}

/// A user's full page design configuration.
///
/// `background_color` is kept while `background_mode` is `Image` so that
/// switching back to color mode restores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSettings {
    pub theme_id: String,
    pub is_custom_theme: bool,

    #[serde(default)]
    pub background_mode: BackgroundMode,
    pub background_color: Rgba,
    #[serde(default)]
    pub background_image: ImagePair,

    #[serde(default)]
    pub button_style: ButtonStyle,
    pub button_color: Rgba,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_gradient: Option<Gradient>,
    #[serde(default)]
    pub button_text_color: ColorValue,

    #[serde(default)]
    pub avatar_shape: AvatarShape,
    #[serde(default)]
    pub avatar_border_color: ColorValue,
    #[serde(default)]
    pub avatar_image: ImagePair,

    #[serde(default)]
    pub font: FontFamily,
    #[serde(default)]
    pub social_position: SocialPosition,
    #[serde(default = "default_true")]
    pub show_branding: bool,
    #[serde(default = "default_true")]
    pub show_share_button: bool,

    #[serde(default)]
    pub text_colors: TextColors,
}

fn default_true() -> bool {
    true
}

impl DesignSettings {
    /// A fresh record carrying every default of `template`.
    #[must_use]
    pub fn from_template(template: &ThemeTemplate) -> Self {
        let mut settings = Self {
            theme_id: template.id.to_string(),
            is_custom_theme: false,
            background_mode: BackgroundMode::Color,
            background_color: template.background,
            background_image: ImagePair::default(),
            button_style: template.button_style,
            button_color: template.button_color,
            button_gradient: None,
            button_text_color: ColorValue::Automatic,
            avatar_shape: AvatarShape::default(),
            avatar_border_color: ColorValue::Automatic,
            avatar_image: ImagePair::default(),
            font: template.font,
            social_position: SocialPosition::default(),
            show_branding: true,
            show_share_button: true,
            text_colors: TextColors::default(),
        };
        settings.apply_template(template);
        settings
    }

    /// Overwrites every themed field with `template`'s defaults.
    ///
    /// Image references, layout and toggles are not themed and stay as they are.
    pub fn apply_template(&mut self, template: &ThemeTemplate) {
        self.theme_id = template.id.to_string();
        self.is_custom_theme = false;
        self.background_color = template.background;
        self.button_style = template.button_style;
        self.button_color = template.button_color;
        self.button_gradient = template.button_gradient.clone();
        self.button_text_color = template.button_text;
        self.avatar_border_color = template.avatar_border;
        self.font = template.font;
        self.text_colors = TextColors::uniform(template.text);
    }

    /// Re-derives fields that depend on other fields.
    pub fn normalize(&mut self) {
        self.is_custom_theme = self.theme_id == CUSTOM_THEME_ID;
    }

    /// The image pair stored for `slot`.
    #[must_use]
    pub fn image(&self, slot: AssetSlot) -> &ImagePair {
        match slot {
            AssetSlot::Avatar => &self.avatar_image,
            AssetSlot::Background => &self.background_image,
        }
    }

    /// Names of the fields whose values differ between `self` and `other`.
    #[must_use]
    pub fn diff(&self, other: &Self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut check = |name: &'static str, changed: bool| {
            if changed {
                fields.push(name);
            }
        };
        check("theme_id", self.theme_id != other.theme_id);
        check("is_custom_theme", self.is_custom_theme != other.is_custom_theme);
        check("background_mode", self.background_mode != other.background_mode);
        check("background_color", self.background_color != other.background_color);
        check("background_image", self.background_image != other.background_image);
        check("button_style", self.button_style != other.button_style);
        check("button_color", self.button_color != other.button_color);
        check("button_gradient", self.button_gradient != other.button_gradient);
        check("button_text_color", self.button_text_color != other.button_text_color);
        check("avatar_shape", self.avatar_shape != other.avatar_shape);
        check(
            "avatar_border_color",
            self.avatar_border_color != other.avatar_border_color,
        );
        check("avatar_image", self.avatar_image != other.avatar_image);
        check("font", self.font != other.font);
        check("social_position", self.social_position != other.social_position);
        check("show_branding", self.show_branding != other.show_branding);
        check("show_share_button", self.show_share_button != other.show_share_button);
        check("text_colors", self.text_colors != other.text_colors);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::theme::ThemeCatalog;

    #[test]
    fn from_template_copies_themed_fields() {
        let catalog = ThemeCatalog::builtin();
        let sunset = catalog.get("sunset").unwrap();
        let settings = DesignSettings::from_template(sunset);

        assert_eq!(settings.theme_id, "sunset");
        assert!(!settings.is_custom_theme);
        assert_eq!(settings.background_color, sunset.background);
        assert_eq!(settings.button_color, sunset.button_color);
        assert_eq!(settings.font, sunset.font);
        assert_eq!(settings.text_colors, TextColors::uniform(sunset.text));
    }

    #[test]
    fn normalize_derives_custom_flag_from_theme_id() {
        let mut settings = DesignSettings::from_template(ThemeCatalog::builtin().default_template());
        settings.theme_id = CUSTOM_THEME_ID.to_string();
        settings.normalize();
        assert!(settings.is_custom_theme);

        settings.theme_id = "ocean".to_string();
        settings.normalize();
        assert!(!settings.is_custom_theme);
    }

    #[test]
    fn apply_template_keeps_images_and_layout() {
        let catalog = ThemeCatalog::builtin();
        let mut settings = DesignSettings::from_template(catalog.default_template());
        settings.avatar_image.derived = Some(AssetRef::new("mem://avatar"));
        settings.social_position = SocialPosition::Bottom;
        settings.show_branding = false;

        settings.apply_template(catalog.get("midnight").unwrap());

        assert_eq!(settings.avatar_image.derived, Some(AssetRef::new("mem://avatar")));
        assert_eq!(settings.social_position, SocialPosition::Bottom);
        assert!(!settings.show_branding);
        assert_eq!(settings.theme_id, "midnight");
    }

    #[test]
    fn diff_lists_changed_fields_only() {
        let base = DesignSettings::from_template(ThemeCatalog::builtin().default_template());
        let mut changed = base.clone();
        changed.font = FontFamily::Lora;
        changed.show_share_button = false;

        assert_eq!(changed.diff(&base), vec!["font", "show_share_button"]);
        assert!(base.diff(&base).is_empty());
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let mut settings = DesignSettings::from_template(ThemeCatalog::builtin().default_template());
        settings.background_mode = BackgroundMode::Image;
        settings.background_image.original = Some(AssetRef::new("mem://bg-original"));
        settings.text_colors.bio = ColorValue::Explicit(Rgba::rgb(1, 2, 3));

        let text = toml::to_string(&settings).unwrap();
        let back: DesignSettings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn asset_slot_parses_case_insensitively() {
        assert_eq!("Avatar".parse::<AssetSlot>().unwrap(), AssetSlot::Avatar);
        assert!("banner".parse::<AssetSlot>().is_err());
    }
}
