// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! Concrete implementations of the port traits defined in
//! `application::port`.
//!
//! # Available Adapters
//!
//! - [`memory`]: In-process gateway and asset host with failure injection
//! - [`fs`]: TOML record per owner and content-addressed asset files
//! - [`http`]: REST backend over `reqwest`
//!
//! # Design Notes
//!
//! - Adapters implement traits from `application::port`
//! - Adapters report port errors; only the store and pipeline map them into
//!   the crate [`Error`](crate::error::Error)

pub mod fs;
pub mod http;
pub mod memory;

pub use fs::{FileAssetHost, FileGateway};
pub use http::{HttpAssetHost, HttpGateway};
pub use memory::{MemoryAssetHost, MemoryGateway};

use crate::application::port::{AssetHost, SettingsGateway};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Gateway and asset host chosen from `[storage]`.
pub struct Backends {
    pub gateway: Arc<dyn SettingsGateway>,
    pub assets: Arc<dyn AssetHost>,
}

/// Picks adapters for `config`: the HTTP backend when an endpoint is set,
/// otherwise files under the data directory.
///
/// # Errors
///
/// [`Error::Config`] when the endpoint is not a valid URL or no data
/// directory can be determined.
pub fn backends(config: &EngineConfig) -> Result<Backends> {
    if let Some(endpoint) = config.storage.endpoint.as_deref() {
        tracing::info!(endpoint, "using HTTP backend");
        return Ok(Backends {
            gateway: Arc::new(HttpGateway::new(endpoint).map_err(|e| Error::Config(e.to_string()))?),
            assets: Arc::new(
                HttpAssetHost::new(endpoint).map_err(|e| Error::Config(e.to_string()))?,
            ),
        });
    }
    let data_dir = config
        .data_dir()
        .ok_or_else(|| Error::Config("no data directory available".to_string()))?;
    tracing::info!(data_dir = %data_dir.display(), "using file backend");
    Ok(Backends {
        gateway: Arc::new(FileGateway::new(&data_dir)),
        assets: Arc::new(FileAssetHost::new(data_dir)),
    })
}
