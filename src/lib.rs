// SPDX-License-Identifier: MPL-2.0
//! `linkpage_studio` is the design configuration engine behind a link
//! page editor.
//!
//! It keeps a server-confirmed baseline and a live draft of a page's design
//! settings, resolves them against a theme catalog into concrete paint
//! values, and turns avatar and background uploads into cropped, compressed
//! assets.

#![doc(html_root_url = "https://docs.rs/linkpage_studio/0.3.0")]

pub mod application;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod infrastructure;
pub mod media;
pub mod store;
pub mod style;

pub use engine::DesignEngine;
pub use error::{Error, Result};
pub use store::SettingsStore;
