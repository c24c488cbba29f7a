// SPDX-License-Identifier: MPL-2.0
//! Named theme templates.
//!
//! The catalog is a static table built once per process and never mutated.

use super::color::{ColorValue, Gradient, Rgba};
use super::settings::{ButtonStyle, FontFamily, CUSTOM_THEME_ID};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Identifier of the template used when nothing else is known.
pub const DEFAULT_THEME_ID: &str = "default";

/// Default values for every themed field.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeTemplate {
    pub id: &'static str,
    pub display_name: &'static str,
    pub background: Rgba,
    pub button_style: ButtonStyle,
    pub button_color: Rgba,
    pub button_gradient: Option<Gradient>,
    pub button_text: ColorValue,
    pub text: ColorValue,
    pub avatar_border: ColorValue,
    pub font: FontFamily,
}

/// Lookup table of templates keyed by id.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    templates: BTreeMap<&'static str, ThemeTemplate>,
}

static BUILTIN: OnceLock<ThemeCatalog> = OnceLock::new();

impl ThemeCatalog {
    /// Builds a catalog from templates. Must contain [`DEFAULT_THEME_ID`].
    ///
    /// # Errors
    ///
    /// Returns a validation error when the default template is missing or a
    /// template uses the custom sentinel id.
    pub fn new(templates: Vec<ThemeTemplate>) -> crate::error::Result<Self> {
        let templates: BTreeMap<_, _> = templates.into_iter().map(|t| (t.id, t)).collect();
        if !templates.contains_key(DEFAULT_THEME_ID) {
            return Err(crate::error::Error::validation(
                "theme_catalog",
                "catalog has no default template",
            ));
        }
        if templates.contains_key(CUSTOM_THEME_ID) {
            return Err(crate::error::Error::validation(
                "theme_catalog",
                "the custom sentinel cannot be a template",
            ));
        }
        Ok(Self { templates })
    }

    /// The catalog shipped with the engine.
    #[must_use]
    pub fn builtin() -> &'static ThemeCatalog {
        BUILTIN.get_or_init(|| Self {
            templates: builtin_templates().into_iter().map(|t| (t.id, t)).collect(),
        })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ThemeTemplate> {
        self.templates.get(id)
    }

    /// The template for `id`, falling back to the default template.
    #[must_use]
    pub fn lookup(&self, id: &str) -> &ThemeTemplate {
        self.get(id).unwrap_or_else(|| self.default_template())
    }

    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn default_template(&self) -> &ThemeTemplate {
        // Presence of the default template is checked in `new` and by the builtin table.
        &self.templates[DEFAULT_THEME_ID]
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Whether `id` names a template or the custom sentinel.
    #[must_use]
    pub fn accepts(&self, id: &str) -> bool {
        id == CUSTOM_THEME_ID || self.contains(id)
    }

    pub fn templates(&self) -> impl Iterator<Item = &ThemeTemplate> {
        self.templates.values()
    }
}

fn gradient(expr: &str) -> Option<Gradient> {
    Gradient::parse("button_gradient", expr).ok()
}

fn builtin_templates() -> Vec<ThemeTemplate> {
    vec![
        ThemeTemplate {
            id: DEFAULT_THEME_ID,
            display_name: "Default",
            background: Rgba::WHITE,
            button_style: ButtonStyle::Filled,
            button_color: Rgba::rgb(0x11, 0x18, 0x27),
            button_gradient: None,
            button_text: ColorValue::Automatic,
            text: ColorValue::Automatic,
            avatar_border: ColorValue::Automatic,
            font: FontFamily::Inter,
        },
        ThemeTemplate {
            id: "sunset",
            display_name: "Sunset",
            background: Rgba::rgb(0xff, 0xd2, 0x00),
            button_style: ButtonStyle::Gradient,
            button_color: Rgba::rgb(0xf9, 0x73, 0x16),
            button_gradient: gradient("linear-gradient(135deg, #f97316, #db2777)"),
            button_text: ColorValue::Automatic,
            text: ColorValue::Automatic,
            avatar_border: ColorValue::Explicit(Rgba::rgb(0xdb, 0x27, 0x77)),
            font: FontFamily::Poppins,
        },
        ThemeTemplate {
            id: "ocean",
            display_name: "Ocean",
            background: Rgba::rgb(0x1e, 0x3a, 0x8a),
            button_style: ButtonStyle::Outlined,
            button_color: Rgba::rgb(0x38, 0xbd, 0xf8),
            button_gradient: None,
            button_text: ColorValue::Automatic,
            text: ColorValue::Automatic,
            avatar_border: ColorValue::Explicit(Rgba::rgb(0x38, 0xbd, 0xf8)),
            font: FontFamily::Inter,
        },
        ThemeTemplate {
            id: "midnight",
            display_name: "Midnight",
            background: Rgba::rgb(0x0f, 0x17, 0x2a),
            button_style: ButtonStyle::Filled,
            button_color: Rgba::rgb(0x63, 0x66, 0xf1),
            button_gradient: None,
            button_text: ColorValue::Automatic,
            text: ColorValue::Automatic,
            avatar_border: ColorValue::Automatic,
            font: FontFamily::SpaceMono,
        },
        ThemeTemplate {
            id: "forest",
            display_name: "Forest",
            background: Rgba::rgb(0x14, 0x53, 0x2d),
            button_style: ButtonStyle::Filled,
            button_color: Rgba::rgb(0x86, 0xef, 0xac),
            button_gradient: None,
            button_text: ColorValue::Automatic,
            text: ColorValue::Explicit(Rgba::rgb(0xec, 0xfd, 0xf5)),
            avatar_border: ColorValue::Automatic,
            font: FontFamily::Lora,
        },
        ThemeTemplate {
            id: "minimal",
            display_name: "Minimal",
            background: Rgba::rgb(0xf5, 0xf5, 0xf4),
            button_style: ButtonStyle::Outlined,
            button_color: Rgba::rgb(0x1c, 0x19, 0x17),
            button_gradient: None,
            button_text: ColorValue::Automatic,
            text: ColorValue::Automatic,
            avatar_border: ColorValue::Automatic,
            font: FontFamily::System,
        },
    ]
}
