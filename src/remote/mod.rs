//! Webhook deal source.
//!
//! The external pipeline API exposes the same deals under its own field
//! names. It is the primary source for reads and the first leg of every
//! update; the local store is the fallback and mirror.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{DashboardData, Deal, DealPatch};
use client::RemoteError;

/// Webhook source configuration stored in ~/.dealflow/config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Base URL the `negociacoes` and `dashboard` endpoints hang off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Automatic retries for a failed read before falling back to the store.
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,
    /// How long a fetched webhook dashboard is served before refetching.
    /// Zero disables the cache.
    #[serde(default = "default_dashboard_ttl_secs")]
    pub dashboard_ttl_secs: u64,
}

fn default_fetch_retries() -> u32 {
    1
}

fn default_dashboard_ttl_secs() -> u64 {
    15
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            fetch_retries: default_fetch_retries(),
            dashboard_ttl_secs: default_dashboard_ttl_secs(),
        }
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        let base = self
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or("remote.baseUrl is required when the remote source is enabled")?;
        let parsed =
            url::Url::parse(base).map_err(|e| format!("Invalid remote.baseUrl {}: {}", base, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("remote.baseUrl must be http(s): {}", base));
        }
        Ok(())
    }
}

/// Operations the pipeline needs from the webhook source.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// All deals, normalized. Empty or non-array payloads are errors.
    async fn fetch_all(&self) -> Result<Vec<Deal>, RemoteError>;

    async fn fetch_dashboard(&self) -> Result<DashboardData, RemoteError>;

    /// Write `patch` onto deal `id`. The source has no separate create.
    async fn update(&self, id: i64, patch: &DealPatch) -> Result<(), RemoteError>;
}
