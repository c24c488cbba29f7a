// SPDX-License-Identifier: MPL-2.0
//! HTTP adapters over `reqwest`.
//!
//! | Operation      | Request                                   |
//! |----------------|-------------------------------------------|
//! | settings read  | `GET {endpoint}/owners/{owner}/design`    |
//! | settings write | `PATCH {endpoint}/owners/{owner}/design`  |
//! | asset upload   | `POST {endpoint}/assets?slot={slot}`      |
//! | asset delete   | `DELETE {endpoint}/assets/{reference}`    |
//! | asset fetch    | `GET {reference}`                         |
//!
//! Bodies are JSON except uploads and fetches, which carry raw bytes.

use crate::application::port::{AssetError, AssetHost, GatewayError, OwnerId, SettingsGateway};
use crate::config::defaults::MAX_UPLOAD_CEILING_BYTES;
use crate::domain::patch::SettingsPatch;
use crate::domain::settings::{AssetRef, AssetSlot, DesignSettings};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{header, Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("LinkpageStudio/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client() -> Result<Client, String> {
    Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())
}

fn parse_endpoint(endpoint: &str) -> Result<Url, String> {
    // A trailing slash makes `join` append instead of replacing the last segment.
    let normalized = if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{endpoint}/")
    };
    Url::parse(&normalized).map_err(|e| format!("invalid endpoint '{endpoint}': {e}"))
}

/// Appends path segments, percent-encoding each one.
fn url_with_segments(base: &Url, segments: &[&str]) -> Result<Url, String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| format!("endpoint '{base}' cannot be a base"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn gateway_error(err: &reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::Malformed(err.to_string())
    } else {
        GatewayError::Unavailable(err.to_string())
    }
}

fn gateway_status_error(status: StatusCode, body: String) -> GatewayError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        GatewayError::Unavailable(format!("HTTP status: {status}"))
    } else {
        GatewayError::Rejected(format!("HTTP status: {status}: {body}"))
    }
}

fn asset_status_error(status: StatusCode) -> AssetError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        AssetError::Unavailable(format!("HTTP status: {status}"))
    } else {
        AssetError::Rejected(format!("HTTP status: {status}"))
    }
}

// =============================================================================
// HttpGateway
// =============================================================================

pub struct HttpGateway {
    client: Client,
    base: Url,
}

impl HttpGateway {
    /// # Errors
    ///
    /// Returns [`GatewayError::Rejected`] for an unusable endpoint URL.
    pub fn new(endpoint: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_client().map_err(GatewayError::Unavailable)?,
            base: parse_endpoint(endpoint).map_err(GatewayError::Rejected)?,
        })
    }

    fn design_url(&self, owner: &OwnerId) -> Result<Url, GatewayError> {
        url_with_segments(&self.base, &["owners", owner.as_str(), "design"])
            .map_err(GatewayError::Rejected)
    }
}

#[async_trait]
impl SettingsGateway for HttpGateway {
    async fn read(&self, owner: &OwnerId) -> Result<Option<DesignSettings>, GatewayError> {
        let response = self
            .client
            .get(self.design_url(owner)?)
            .send()
            .await
            .map_err(|e| gateway_error(&e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<DesignSettings>()
                .await
                .map(Some)
                .map_err(|e| GatewayError::Malformed(e.to_string())),
            status => Err(gateway_status_error(
                status,
                response.text().await.unwrap_or_default(),
            )),
        }
    }

    async fn write(
        &self,
        owner: &OwnerId,
        patch: &SettingsPatch,
    ) -> Result<DesignSettings, GatewayError> {
        let response = self
            .client
            .patch(self.design_url(owner)?)
            .json(patch)
            .send()
            .await
            .map_err(|e| gateway_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(gateway_status_error(
                status,
                response.text().await.unwrap_or_default(),
            ));
        }
        response
            .json::<DesignSettings>()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

// =============================================================================
// HttpAssetHost
// =============================================================================

#[derive(Debug, Deserialize)]
struct UploadResponse {
    reference: AssetRef,
}

pub struct HttpAssetHost {
    client: Client,
    base: Url,
    max_fetch_bytes: usize,
}

impl HttpAssetHost {
    /// # Errors
    ///
    /// Returns [`AssetError::Rejected`] for an unusable endpoint URL.
    pub fn new(endpoint: &str) -> Result<Self, AssetError> {
        Ok(Self {
            client: build_client().map_err(AssetError::Unavailable)?,
            base: parse_endpoint(endpoint).map_err(AssetError::Rejected)?,
            max_fetch_bytes: MAX_UPLOAD_CEILING_BYTES,
        })
    }

    /// Caps the size of a fetched asset. Defaults to the upload ceiling.
    #[must_use]
    pub fn with_max_fetch_bytes(mut self, limit: usize) -> Self {
        self.max_fetch_bytes = limit;
        self
    }
}

#[async_trait]
impl AssetHost for HttpAssetHost {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        slot: AssetSlot,
        content_type: &str,
    ) -> Result<AssetRef, AssetError> {
        let mut url =
            url_with_segments(&self.base, &["assets"]).map_err(AssetError::Rejected)?;
        url.query_pairs_mut().append_pair("slot", slot.as_str());

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AssetError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(asset_status_error(status));
        }
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AssetError::Rejected(format!("unexpected upload response: {e}")))?;
        Ok(body.reference)
    }

    async fn delete(&self, reference: &AssetRef) -> Result<(), AssetError> {
        let url = url_with_segments(&self.base, &["assets", reference.as_str()])
            .map_err(AssetError::Rejected)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| AssetError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(asset_status_error(status)),
        }
    }

    async fn fetch(&self, reference: &AssetRef) -> Result<Vec<u8>, AssetError> {
        let url = Url::parse(reference.as_str())
            .map_err(|_| AssetError::NotFound(reference.clone()))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(AssetError::NotFound(reference.clone())),
            status if !status.is_success() => return Err(asset_status_error(status)),
            _ => {}
        }

        let limit = self.max_fetch_bytes;
        // Capacity hint only; the loop below enforces the ceiling.
        let hint = response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0)
            .min(limit);
        let mut bytes = Vec::with_capacity(hint);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AssetError::Unavailable(e.to_string()))?;
            if bytes.len() + chunk.len() > limit {
                return Err(AssetError::Rejected(format!("asset exceeds {limit} bytes")));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}
