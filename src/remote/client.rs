//! HTTP client for the webhook pipeline API.
//!
//! `GET {base}/negociacoes` lists deals, `POST {base}/negociacoes` writes an
//! update, `GET {base}/dashboard` returns precomputed statistics. Records come
//! back under the source's own field names and are normalized on the way in.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use url::Url;

use super::{RemoteConfig, RemoteSource};
use crate::fields::{self, FieldValue};
use crate::types::{DashboardData, Deal, DealPatch};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote source is not configured")]
    NotConfigured,

    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    #[error("Remote request failed: {0}")]
    Network(String),

    #[error("Remote API error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed remote response: {0}")]
    MalformedBody(String),

    #[error("Remote source returned no deals")]
    EmptyPayload,
}

impl RemoteError {
    /// Transport failures and 5xx/429 answers may clear up on their own.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub struct RemoteClient {
    client: reqwest::Client,
    deals_url: Url,
    dashboard_url: Url,
}

impl RemoteClient {
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| RemoteError::InvalidUrl(format!("{}{}: {}", base, path, e)))
        };

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            deals_url: join("negociacoes")?,
            dashboard_url: join("dashboard")?,
        })
    }

    /// Build a client when the webhook source is enabled. `Ok(None)` when it is off.
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>, RemoteError> {
        if !config.enabled {
            return Ok(None);
        }
        let base = config
            .base_url
            .as_deref()
            .ok_or(RemoteError::NotConfigured)?;
        Self::new(base).map(Some)
    }

    /// Send a request and return the raw response text of a 2xx answer.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, RemoteError> {
        let resp = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| RemoteError::Network(format!("reading body: {}", e)))?;

        if !status.is_success() {
            return Err(RemoteError::HttpStatus {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }
        Ok(text)
    }

    async fn get_json(&self, url: &Url) -> Result<Value, RemoteError> {
        let text = self.send(self.client.get(url.clone())).await?;
        serde_json::from_str(&text).map_err(|e| {
            RemoteError::MalformedBody(format!("{}: {}", e, truncate(&text, MAX_ERROR_BODY)))
        })
    }
}

#[async_trait]
impl RemoteSource for RemoteClient {
    async fn fetch_all(&self) -> Result<Vec<Deal>, RemoteError> {
        let payload = self.get_json(&self.deals_url).await?;
        let deals = parse_deal_list(payload)?;
        log::debug!("Fetched {} deals from {}", deals.len(), self.deals_url);
        Ok(deals)
    }

    async fn fetch_dashboard(&self) -> Result<DashboardData, RemoteError> {
        let payload = self.get_json(&self.dashboard_url).await?;
        parse_dashboard(payload)
    }

    async fn update(&self, id: i64, patch: &DealPatch) -> Result<(), RemoteError> {
        let body = fields::dual_named_body(id, patch);
        let text = self
            .send(self.client.post(self.deals_url.clone()).json(&body))
            .await?;

        // Some webhook runners answer with an empty 200.
        if !text.trim().is_empty() {
            serde_json::from_str::<Value>(&text).map_err(|e| {
                RemoteError::MalformedBody(format!("{}: {}", e, truncate(&text, MAX_ERROR_BODY)))
            })?;
        }
        log::info!("Pushed update for deal {} to remote source", id);
        Ok(())
    }
}

/// Parse a `negociacoes` payload. It must be a non-empty array of records.
pub fn parse_deal_list(payload: Value) -> Result<Vec<Deal>, RemoteError> {
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(RemoteError::MalformedBody(format!(
                "expected an array of deals, got {}",
                json_kind(&other)
            )))
        }
    };
    if items.is_empty() {
        return Err(RemoteError::EmptyPayload);
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let record = item.as_object().ok_or_else(|| {
                RemoteError::MalformedBody(format!("deal #{} is {}, not an object", i, json_kind(item)))
            })?;
            fields::normalize_record(record).map_err(RemoteError::MalformedBody)
        })
        .collect()
}

/// Parse a `dashboard` payload under either naming scheme.
pub fn parse_dashboard(payload: Value) -> Result<DashboardData, RemoteError> {
    let record = payload.as_object().ok_or_else(|| {
        RemoteError::MalformedBody(format!("expected a dashboard object, got {}", json_kind(&payload)))
    })?;

    let open_deals: i64 = fields::resolve(record, fields::OPEN_DEALS_COUNT, 0);

    Ok(DashboardData {
        total_value_in_progress: fields::resolve(record, fields::TOTAL_VALUE_IN_PROGRESS, 0.0),
        open_deals_count: usize::try_from(open_deals).unwrap_or(0),
        win_rate: fields::resolve(record, fields::WIN_RATE, 0.0),
        deals_by_stage: numeric_map(record, fields::DEALS_BY_STAGE)
            .into_iter()
            .map(|(k, v): (String, i64)| (k, usize::try_from(v).unwrap_or(0)))
            .collect(),
        value_by_seller: numeric_map(record, fields::VALUE_BY_SELLER),
    })
}

fn numeric_map<T: FieldValue>(record: &Map<String, Value>, key: fields::FieldKey) -> BTreeMap<String, T> {
    let Some(Value::Object(entries)) = fields::lookup_key(record, key) else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(name, value)| match T::from_field(value) {
            Some(parsed) => Some((name.clone(), parsed)),
            None => {
                log::warn!("Dropping dashboard entry {}.{} = {}", key.primary(), name, value);
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
