// SPDX-License-Identifier: MPL-2.0
//! Style resolution: settings plus theme catalog to concrete paint values.
//!
//! [`resolve`] is a pure function. It reads nothing but its arguments, so the
//! same draft resolved twice yields identical output.
//!
//! Precedence for every themed field, highest first:
//! 1. the value stored on the settings record, in custom-theme mode;
//! 2. the default of the template named by `theme_id`;
//! 3. the global defaults in this module.

mod paint;

pub use paint::{
    AvatarPaint, BackgroundPaint, ButtonPaint, EffectiveStyle, Fill, FontPaint, ImageFit,
    TextPaint,
};

use crate::domain::color::{ColorValue, Gradient, Rgba};
use crate::domain::settings::{BackgroundMode, ButtonStyle, DesignSettings, FontFamily, TextColors};
use crate::domain::theme::{ThemeCatalog, ThemeTemplate};

/// Text color used on dark references.
pub const LIGHT_TEXT: Rgba = Rgba::WHITE;

/// Text color used on light references.
pub const DARK_TEXT: Rgba = Rgba::rgb(0x11, 0x18, 0x27);

/// Luma at or above which a reference counts as light.
pub const CONTRAST_THRESHOLD: f64 = 128.0;

/// Contrast reference for automatic text over a background image. Images are
/// painted under a dark scrim, so text over them resolves to [`LIGHT_TEXT`].
pub const IMAGE_CONTRAST_REFERENCE: Rgba = Rgba::BLACK;

/// Field values used when `theme_id` names no known template.
static GLOBAL_DEFAULTS: ThemeTemplate = ThemeTemplate {
    id: "",
    display_name: "",
    background: Rgba::WHITE,
    button_style: ButtonStyle::Filled,
    button_color: DARK_TEXT,
    button_gradient: None,
    button_text: ColorValue::Automatic,
    text: ColorValue::Automatic,
    avatar_border: ColorValue::Automatic,
    font: FontFamily::Inter,
};

/// Automatic text color for `reference`: dark on light, light on dark.
#[must_use]
pub fn contrast_text(reference: Rgba) -> Rgba {
    if reference.luma() >= CONTRAST_THRESHOLD {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}

/// Automatic text color for any fill. Transparent fills have no reference of
/// their own and are treated as light.
#[must_use]
pub fn contrast_for_fill(fill: &Fill) -> Rgba {
    fill.reference_color().map_or(DARK_TEXT, contrast_text)
}

/// An explicit color wins; otherwise contrast against `reference`.
fn pick(value: ColorValue, reference: Rgba) -> Rgba {
    value
        .explicit()
        .unwrap_or_else(|| contrast_text(reference))
}

/// The themed fields after precedence has been applied.
struct Themed<'a> {
    background: Rgba,
    button_style: ButtonStyle,
    button_color: Rgba,
    button_gradient: Option<&'a Gradient>,
    button_text: ColorValue,
    avatar_border: ColorValue,
    font: FontFamily,
    text: TextColors,
}

impl<'a> Themed<'a> {
    fn from_template(template: &'a ThemeTemplate) -> Self {
        Self {
            background: template.background,
            button_style: template.button_style,
            button_color: template.button_color,
            button_gradient: template.button_gradient.as_ref(),
            button_text: template.button_text,
            avatar_border: template.avatar_border,
            font: template.font,
            text: TextColors::uniform(template.text),
        }
    }

    fn from_settings(settings: &'a DesignSettings) -> Self {
        Self {
            background: settings.background_color,
            button_style: settings.button_style,
            button_color: settings.button_color,
            button_gradient: settings.button_gradient.as_ref(),
            button_text: settings.button_text_color,
            avatar_border: settings.avatar_border_color,
            font: settings.font,
            text: settings.text_colors,
        }
    }
}

/// Resolves `settings` against `catalog` into concrete paint values.
#[must_use]
pub fn resolve(settings: &DesignSettings, catalog: &ThemeCatalog) -> EffectiveStyle {
    let themed = if settings.is_custom_theme {
        Themed::from_settings(settings)
    } else {
        Themed::from_template(catalog.get(&settings.theme_id).unwrap_or(&GLOBAL_DEFAULTS))
    };

    // Color fields stay stored while image mode is active; they are simply not painted.
    let (background, text_reference) =
        match (settings.background_mode, &settings.background_image.derived) {
            (BackgroundMode::Image, Some(reference)) => (
                BackgroundPaint::Image {
                    reference: reference.clone(),
                    fit: ImageFit::Cover,
                },
                IMAGE_CONTRAST_REFERENCE,
            ),
            _ => (
                BackgroundPaint::Color {
                    color: themed.background,
                },
                themed.background,
            ),
        };

    let text = TextPaint {
        name: pick(themed.text.name, text_reference),
        bio: pick(themed.text.bio, text_reference),
        username: pick(themed.text.username, text_reference),
        footer: pick(themed.text.footer, text_reference),
    };

    EffectiveStyle {
        theme_id: settings.theme_id.clone(),
        social_position: settings.social_position,
        show_branding: settings.show_branding,
        show_share_button: settings.show_share_button,
        font: FontPaint {
            family: themed.font,
            css_stack: themed.font.css_stack(),
        },
        background,
        button: resolve_button(&themed),
        avatar: AvatarPaint {
            shape: settings.avatar_shape,
            border: themed.avatar_border.explicit().unwrap_or(text.name),
            image: settings.avatar_image.derived.clone(),
        },
        text,
    }
}

fn resolve_button(themed: &Themed<'_>) -> ButtonPaint {
    let color = themed.button_color;
    match themed.button_style {
        ButtonStyle::Filled => {
            let fill = Fill::solid(color);
            ButtonPaint {
                style: ButtonStyle::Filled,
                text: themed
                    .button_text
                    .explicit()
                    .unwrap_or_else(|| contrast_for_fill(&fill)),
                fill,
                border: None,
            }
        }
        ButtonStyle::Outlined => ButtonPaint {
            style: ButtonStyle::Outlined,
            fill: Fill::Transparent,
            border: Some(color),
            text: themed.button_text.explicit().unwrap_or(color),
        },
        ButtonStyle::Gradient => ButtonPaint {
            style: ButtonStyle::Gradient,
            // Without any stored gradient the button falls back to its flat color.
            fill: themed
                .button_gradient
                .map_or_else(|| Fill::solid(color), |g| Fill::Gradient {
                    expression: g.clone(),
                }),
            border: None,
            text: themed.button_text.explicit().unwrap_or(LIGHT_TEXT),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{AssetRef, CUSTOM_THEME_ID};

    fn settings_for(theme: &str) -> DesignSettings {
        let catalog = ThemeCatalog::builtin();
        let mut settings = DesignSettings::from_template(catalog.lookup(theme));
        settings.theme_id = theme.to_string();
        settings.normalize();
        settings
    }

    fn custom() -> DesignSettings {
        settings_for(CUSTOM_THEME_ID)
    }

    #[test]
    fn resolve_is_pure() {
        let catalog = ThemeCatalog::builtin();
        for template in catalog.templates() {
            let settings = settings_for(template.id);
            assert_eq!(resolve(&settings, catalog), resolve(&settings, catalog));
        }
        let settings = custom();
        assert_eq!(resolve(&settings, catalog), resolve(&settings, catalog));
    }

    #[test]
    fn contrast_follows_luma_threshold() {
        assert_eq!(contrast_text(Rgba::rgb(0x1e, 0x3a, 0x8a)), LIGHT_TEXT);
        assert_eq!(contrast_text(Rgba::rgb(0xff, 0xd2, 0x00)), DARK_TEXT);
        assert_eq!(contrast_text(Rgba::WHITE), DARK_TEXT);
        assert_eq!(contrast_text(Rgba::BLACK), LIGHT_TEXT);
        assert_eq!(contrast_text(Rgba::rgb(129, 129, 129)), DARK_TEXT);
        assert_eq!(contrast_text(Rgba::rgb(127, 127, 127)), LIGHT_TEXT);
    }

    #[test]
    fn automatic_text_contrasts_with_custom_background() {
        let mut settings = custom();
        settings.background_color = Rgba::rgb(0x1e, 0x3a, 0x8a);
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.text.name, LIGHT_TEXT);
        assert_eq!(style.text.footer, LIGHT_TEXT);

        settings.background_color = Rgba::rgb(0xff, 0xd2, 0x00);
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.text.bio, DARK_TEXT);
    }

    #[test]
    fn manual_override_beats_contrast() {
        let mut settings = custom();
        settings.background_color = Rgba::BLACK;
        let pink = Rgba::rgb(0xdb, 0x27, 0x77);
        settings.text_colors.bio = ColorValue::Explicit(pink);
        settings.button_text_color = ColorValue::Explicit(pink);

        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.text.bio, pink);
        assert_eq!(style.text.name, LIGHT_TEXT);
        assert_eq!(style.button.text, pink);
    }

    #[test]
    fn named_theme_ignores_stored_themed_fields() {
        let catalog = ThemeCatalog::builtin();
        let mut settings = settings_for("ocean");
        settings.background_color = Rgba::rgb(1, 2, 3);
        settings.font = FontFamily::Lora;

        let style = resolve(&settings, catalog);
        let ocean = catalog.get("ocean").unwrap();
        assert_eq!(style.background, BackgroundPaint::Color { color: ocean.background });
        assert_eq!(style.font.family, ocean.font);
    }

    #[test]
    fn unknown_theme_uses_global_defaults() {
        let mut settings = settings_for("default");
        settings.theme_id = "retired-theme".to_string();
        let style = resolve(&settings, ThemeCatalog::builtin());

        assert_eq!(style.background, BackgroundPaint::Color { color: Rgba::WHITE });
        assert_eq!(style.button.fill, Fill::solid(DARK_TEXT));
        assert_eq!(style.text.name, DARK_TEXT);
        assert_eq!(style.font.family, FontFamily::Inter);
    }

    #[test]
    fn filled_button_text_contrasts_with_button_color() {
        let mut settings = custom();
        settings.button_style = ButtonStyle::Filled;
        settings.button_color = Rgba::rgb(0xff, 0xd2, 0x00);
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.button.fill, Fill::solid(Rgba::rgb(0xff, 0xd2, 0x00)));
        assert_eq!(style.button.text, DARK_TEXT);
        assert_eq!(style.button.border, None);

        settings.button_color = Rgba::rgb(0x1e, 0x3a, 0x8a);
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.button.text, contrast_for_fill(&style.button.fill));
        assert_eq!(style.button.text, LIGHT_TEXT);
    }

    #[test]
    fn outlined_button_uses_color_for_border_and_text() {
        let mut settings = custom();
        settings.button_style = ButtonStyle::Outlined;
        settings.button_color = Rgba::rgb(0x38, 0xbd, 0xf8);
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.button.fill, Fill::Transparent);
        assert_eq!(style.button.border, Some(Rgba::rgb(0x38, 0xbd, 0xf8)));
        assert_eq!(style.button.text, Rgba::rgb(0x38, 0xbd, 0xf8));

        settings.button_text_color = ColorValue::Explicit(Rgba::WHITE);
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.button.text, Rgba::WHITE);
        assert_eq!(style.button.border, Some(Rgba::rgb(0x38, 0xbd, 0xf8)));
    }

    #[test]
    fn gradient_button_defaults_to_light_text() {
        let catalog = ThemeCatalog::builtin();
        let style = resolve(&settings_for("sunset"), catalog);
        let expected = catalog.get("sunset").unwrap().button_gradient.clone().unwrap();
        assert_eq!(style.button.fill, Fill::Gradient { expression: expected });
        assert_eq!(style.button.text, LIGHT_TEXT);
    }

    #[test]
    fn gradient_button_without_expression_falls_back_to_flat_color() {
        let mut settings = custom();
        settings.button_style = ButtonStyle::Gradient;
        settings.button_gradient = None;
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.button.fill, Fill::solid(settings.button_color));
    }

    #[test]
    fn contrast_for_gradient_uses_first_stop() {
        let gradient = Gradient::parse("g", "linear-gradient(90deg, #ffffff, #000000)").unwrap();
        assert_eq!(contrast_for_fill(&Fill::Gradient { expression: gradient }), DARK_TEXT);
        assert_eq!(contrast_for_fill(&Fill::solid(Rgba::BLACK)), LIGHT_TEXT);
    }

    #[test]
    fn image_background_paints_cover_and_keeps_color() {
        let mut settings = custom();
        settings.background_color = Rgba::WHITE;
        settings.background_mode = BackgroundMode::Image;
        settings.background_image.derived = Some(AssetRef::new("mem://bg"));

        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(
            style.background,
            BackgroundPaint::Image {
                reference: AssetRef::new("mem://bg"),
                fit: ImageFit::Cover,
            }
        );
        assert_eq!(style.text.name, LIGHT_TEXT);

        settings.background_mode = BackgroundMode::Color;
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.background, BackgroundPaint::Color { color: Rgba::WHITE });
    }

    #[test]
    fn image_mode_without_image_paints_color() {
        let mut settings = custom();
        settings.background_mode = BackgroundMode::Image;
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert!(matches!(style.background, BackgroundPaint::Color { .. }));
    }

    #[test]
    fn automatic_avatar_border_follows_name_color() {
        let mut settings = custom();
        settings.background_color = Rgba::BLACK;
        settings.text_colors.name = ColorValue::Explicit(Rgba::rgb(0xfa, 0xcc, 0x15));
        let style = resolve(&settings, ThemeCatalog::builtin());
        assert_eq!(style.avatar.border, Rgba::rgb(0xfa, 0xcc, 0x15));
    }

    #[test]
    fn effective_style_serializes_to_toml() {
        let style = resolve(&settings_for("sunset"), ThemeCatalog::builtin());
        let text = toml::to_string(&style).unwrap();
        assert!(text.contains("theme_id = \"sunset\""));
        assert!(text.contains("linear-gradient"));
    }
}
