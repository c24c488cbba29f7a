// SPDX-License-Identifier: MPL-2.0
//! Filesystem adapters.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/owners/<owner>.toml     one settings record per owner
//! <data_dir>/assets/<blake3>.<ext>   content-addressed image bytes
//! ```

use crate::application::port::{AssetError, AssetHost, GatewayError, OwnerId, SettingsGateway};
use crate::domain::patch::SettingsPatch;
use crate::domain::settings::{AssetRef, AssetSlot, DesignSettings};
use crate::domain::theme::ThemeCatalog;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const OWNERS_DIR: &str = "owners";
const ASSETS_DIR: &str = "assets";

fn io_unavailable(err: &std::io::Error) -> GatewayError {
    GatewayError::Unavailable(err.to_string())
}

/// Owner ids become file names, so only a conservative character set is allowed.
fn owner_file_name(owner: &OwnerId) -> Result<String, GatewayError> {
    let id = owner.as_str();
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(format!("{id}.toml"))
    } else {
        Err(GatewayError::Rejected(format!("invalid owner id '{id}'")))
    }
}

// =============================================================================
// FileGateway
// =============================================================================

/// Settings gateway storing one TOML file per owner.
pub struct FileGateway {
    root: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
    unset: DesignSettings,
}

impl FileGateway {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into().join(OWNERS_DIR),
            write_lock: Mutex::new(()),
            unset: DesignSettings::from_template(ThemeCatalog::builtin().default_template()),
        }
    }

    fn path_for(&self, owner: &OwnerId) -> Result<PathBuf, GatewayError> {
        Ok(self.root.join(owner_file_name(owner)?))
    }

    async fn read_path(path: &Path) -> Result<Option<DesignSettings>, GatewayError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => toml::from_str(&content)
                .map(Some)
                .map_err(|e| GatewayError::Malformed(e.to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_unavailable(&err)),
        }
    }
}

#[async_trait]
impl SettingsGateway for FileGateway {
    async fn read(&self, owner: &OwnerId) -> Result<Option<DesignSettings>, GatewayError> {
        Self::read_path(&self.path_for(owner)?).await
    }

    async fn write(
        &self,
        owner: &OwnerId,
        patch: &SettingsPatch,
    ) -> Result<DesignSettings, GatewayError> {
        let path = self.path_for(owner)?;
        let _guard = self.write_lock.lock().await;

        let mut record = Self::read_path(&path)
            .await?
            .unwrap_or_else(|| self.unset.clone());
        patch.apply_to(&mut record, &self.unset);

        let content =
            toml::to_string_pretty(&record).map_err(|e| GatewayError::Rejected(e.to_string()))?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_unavailable(&e))?;
        // Write to a sibling file and rename so readers never see a partial record.
        let staging = path.with_extension("toml.tmp");
        tokio::fs::write(&staging, content)
            .await
            .map_err(|e| io_unavailable(&e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| io_unavailable(&e))?;

        tracing::debug!(owner = %owner, path = %path.display(), "settings record written");
        Ok(record)
    }
}

// =============================================================================
// FileAssetHost
// =============================================================================

/// Asset host writing content-addressed files.
///
/// References are the bare file names, e.g. `3f2a...c1.png`.
pub struct FileAssetHost {
    root: PathBuf,
}

impl FileAssetHost {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into().join(ASSETS_DIR),
        }
    }

    fn extension_for(content_type: &str) -> &'static str {
        match content_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
    }

    fn path_for(&self, reference: &AssetRef) -> Result<PathBuf, AssetError> {
        let name = reference.as_str();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.');
        if valid && !name.starts_with('.') {
            Ok(self.root.join(name))
        } else {
            Err(AssetError::NotFound(reference.clone()))
        }
    }
}

#[async_trait]
impl AssetHost for FileAssetHost {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        slot: AssetSlot,
        content_type: &str,
    ) -> Result<AssetRef, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::Rejected("empty upload".to_string()));
        }
        let name = format!(
            "{}.{}",
            blake3::hash(&bytes).to_hex(),
            Self::extension_for(content_type)
        );
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AssetError::Unavailable(e.to_string()))?;
        let path = self.root.join(&name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AssetError::Unavailable(e.to_string()))?;
        tracing::debug!(slot = %slot, path = %path.display(), bytes = bytes.len(), "asset stored");
        Ok(AssetRef::new(name))
    }

    async fn delete(&self, reference: &AssetRef) -> Result<(), AssetError> {
        let path = self.path_for(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AssetError::Unavailable(err.to_string())),
        }
    }

    async fn fetch(&self, reference: &AssetRef) -> Result<Vec<u8>, AssetError> {
        let path = self.path_for(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(AssetError::NotFound(reference.clone()))
            }
            Err(err) => Err(AssetError::Unavailable(err.to_string())),
        }
    }
}
