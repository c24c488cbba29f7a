// SPDX-License-Identifier: MPL-2.0
//! Settings persistence port.
//!
//! The gateway reads and partially updates the durable settings record of one
//! owner. Writes are patch-shaped: only the fields present in a
//! [`SettingsPatch`] are sent, and the gateway answers with the canonical
//! record as stored.

use crate::domain::patch::SettingsPatch;
use crate::domain::settings::DesignSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// OwnerId
// =============================================================================

/// Identity of the page whose settings are edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// GatewayError
// =============================================================================

/// Errors reported by a [`SettingsGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The backend could not be reached or timed out. Retrying may succeed.
    Unavailable(String),

    /// The backend refused the write (validation, permissions).
    Rejected(String),

    /// The backend answered with something that is not a settings record.
    Malformed(String),
}

impl GatewayError {
    /// Whether the same request could succeed if sent again later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_))
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unavailable(msg) => write!(f, "backend unavailable: {msg}"),
            GatewayError::Rejected(msg) => write!(f, "write rejected: {msg}"),
            GatewayError::Malformed(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

// =============================================================================
// SettingsGateway Trait
// =============================================================================

/// Port for the durable settings record.
///
/// Implementations must be `Send + Sync`; the store shares one gateway
/// between the caller and in-flight commits.
#[async_trait]
pub trait SettingsGateway: Send + Sync {
    /// Reads the stored record, `None` when the owner has never saved one.
    async fn read(&self, owner: &OwnerId) -> Result<Option<DesignSettings>, GatewayError>;

    /// Applies `patch` to the stored record and returns the canonical result.
    ///
    /// When nothing is stored yet the patch is applied over the default
    /// template.
    async fn write(
        &self,
        owner: &OwnerId,
        patch: &SettingsPatch,
    ) -> Result<DesignSettings, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_transient() {
        assert!(GatewayError::Unavailable("timeout".into()).is_transient());
        assert!(!GatewayError::Rejected("nope".into()).is_transient());
        assert!(!GatewayError::Malformed("html".into()).is_transient());
    }

    #[test]
    fn owner_id_displays_raw_value() {
        assert_eq!(OwnerId::new("page-42").to_string(), "page-42");
    }
}
