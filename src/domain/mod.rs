// SPDX-License-Identifier: MPL-2.0
//! Domain layer - design records, themes and crop geometry.
//!
//! Pure value types and rules. Nothing here performs I/O; the only external
//! crates used are `serde` for the wire shape and `thiserror` via
//! [`crate::error`].
//!
//! # Modules
//!
//! - [`color`]: Colors ([`Rgba`](color::Rgba), [`ColorValue`](color::ColorValue),
//!   [`Gradient`](color::Gradient))
//! - [`geometry`]: Crop math ([`Rotation`](geometry::Rotation),
//!   [`CropRect`](geometry::CropRect), [`min_zoom`](geometry::min_zoom))
//! - [`patch`]: Partial updates ([`SettingsPatch`](patch::SettingsPatch))
//! - [`settings`]: The record itself ([`DesignSettings`](settings::DesignSettings))
//! - [`theme`]: Named templates ([`ThemeCatalog`](theme::ThemeCatalog))

pub mod color;
pub mod geometry;
pub mod patch;
pub mod settings;
pub mod theme;

pub use color::{ColorValue, Gradient, Rgba};
pub use patch::{Patch, SettingsPatch};
pub use settings::{AssetRef, AssetSlot, DesignSettings, ImagePair};
pub use theme::{ThemeCatalog, ThemeTemplate};
