// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! Infrastructure adapters implement these traits; the store, pipeline and
//! engine only ever see the traits.
//!
//! # Available Ports
//!
//! - [`settings`]: Durable settings record ([`SettingsGateway`])
//! - [`assets`]: Image byte storage ([`AssetHost`])
//!
//! # Design Notes
//!
//! - Traits use domain types only (no HTTP or filesystem types)
//! - Traits are `Send + Sync` and shared through `Arc<dyn _>`
//! - Methods are `async` via `async_trait` and return port-specific errors

pub mod assets;
pub mod settings;

pub use assets::{AssetError, AssetHost};
pub use settings::{GatewayError, OwnerId, SettingsGateway};
