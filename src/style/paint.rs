// SPDX-License-Identifier: MPL-2.0
//! Concrete paint values handed to the rendering surface.

use crate::domain::color::{Gradient, Rgba};
use crate::domain::settings::{AssetRef, AvatarShape, ButtonStyle, FontFamily, SocialPosition};
use serde::Serialize;

/// A fill for a box: flat color, gradient, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Fill {
    Solid { color: Rgba },
    Gradient { expression: Gradient },
    Transparent,
}

impl Fill {
    #[must_use]
    pub fn solid(color: Rgba) -> Self {
        Fill::Solid { color }
    }

    /// The color used when a single reference color is needed, e.g. for
    /// contrast. A gradient yields its first stop.
    #[must_use]
    pub fn reference_color(&self) -> Option<Rgba> {
        match self {
            Fill::Solid { color } => Some(*color),
            Fill::Gradient { expression } => expression.first_stop(),
            Fill::Transparent => None,
        }
    }
}

/// How an image fills its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFit {
    /// Scale to cover the whole box, cropping overflow.
    Cover,
}

/// Page background.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackgroundPaint {
    Color {
        color: Rgba,
    },
    Image {
        reference: AssetRef,
        fit: ImageFit,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonPaint {
    pub style: ButtonStyle,
    pub fill: Fill,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<Rgba>,
    pub text: Rgba,
}

/// Resolved color for each text role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextPaint {
    pub name: Rgba,
    pub bio: Rgba,
    pub username: Rgba,
    pub footer: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvatarPaint {
    pub shape: AvatarShape,
    pub border: Rgba,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<AssetRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontPaint {
    pub family: FontFamily,
    pub css_stack: &'static str,
}

/// Everything the rendering surface needs to paint one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveStyle {
    pub theme_id: String,
    pub social_position: SocialPosition,
    pub show_branding: bool,
    pub show_share_button: bool,
    pub font: FontPaint,
    pub background: BackgroundPaint,
    pub button: ButtonPaint,
    pub text: TextPaint,
    pub avatar: AvatarPaint,
}
