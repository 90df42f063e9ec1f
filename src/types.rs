use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::remote::RemoteConfig;
use crate::util::non_empty_trimmed;

// =============================================================================
// Config
// =============================================================================

/// Service configuration stored in ~/.dealflow/config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Which embedded stage/status vocabulary is authoritative.
    #[serde(default = "default_vocabulary_version")]
    pub vocabulary_version: String,
    /// Custom vocabulary file. Takes precedence over `vocabulary_version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary_path: Option<String>,
    #[serde(default = "default_seed_sample_data")]
    pub seed_sample_data: bool,
    #[serde(default)]
    pub remote: RemoteConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_vocabulary_version() -> String {
    "pt-br-v2".to_string()
}

fn default_seed_sample_data() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            vocabulary_version: default_vocabulary_version(),
            vocabulary_path: None,
            seed_sample_data: default_seed_sample_data(),
            remote: RemoteConfig::default(),
        }
    }
}

impl Config {
    /// Reject settings the service cannot start with.
    pub fn validate(&self) -> Result<(), String> {
        if self.bind_addr.trim().is_empty() {
            return Err("bindAddr is required".into());
        }
        if self.vocabulary_path.is_none()
            && crate::vocabulary::embedded::get_embedded(&self.vocabulary_version).is_none()
        {
            return Err(format!(
                "Unknown vocabulary version: {}",
                self.vocabulary_version
            ));
        }
        self.remote.validate()
    }

    /// Load the active vocabulary: the custom file when set, else the
    /// embedded version.
    pub fn load_vocabulary(&self) -> Result<crate::vocabulary::Vocabulary, String> {
        match self.vocabulary_path.as_deref() {
            Some(path) => crate::vocabulary::loader::load_custom_vocabulary(std::path::Path::new(path)),
            None => crate::vocabulary::load_vocabulary(&self.vocabulary_version),
        }
    }
}

// =============================================================================
// Deal
// =============================================================================

/// Where a deal record came from.
///
/// Attached when a record is ingested. Raw records that carry no tag fall back
/// to the `createdAt` rule in `fields::detect_origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Local,
    Remote,
}

/// A sales negotiation tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: i64,
    pub client_name: String,
    pub negotiated_value: f64,
    pub stage: String,
    pub status: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
    #[serde(default)]
    pub origin: Origin,
}

/// Fields accepted when creating a deal (id and timestamps are assigned by the store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealInput {
    pub client_name: String,
    #[serde(deserialize_with = "crate::fields::deserialize_amount")]
    pub negotiated_value: f64,
    pub stage: String,
    pub status: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
}

/// Partial update. Absent fields are left untouched on the target record.
/// A blank conversation link or summary clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::fields::deserialize_optional_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub negotiated_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
}

impl DealPatch {
    pub fn is_empty(&self) -> bool {
        self == &DealPatch::default()
    }

    /// Merge the present fields onto `deal`.
    pub fn apply_to(&self, deal: &mut Deal) {
        if let Some(v) = &self.client_name {
            deal.client_name = v.clone();
        }
        if let Some(v) = self.negotiated_value {
            deal.negotiated_value = v;
        }
        if let Some(v) = &self.stage {
            deal.stage = v.clone();
        }
        if let Some(v) = &self.status {
            deal.status = v.clone();
        }
        if let Some(v) = &self.owner {
            deal.owner = v.clone();
        }
        if let Some(v) = &self.conversation_link {
            deal.conversation_link = non_empty_trimmed(v).map(str::to_string);
        }
        if let Some(v) = &self.conversation_summary {
            deal.conversation_summary = non_empty_trimmed(v).map(str::to_string);
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Summary statistics derived from a full deal list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_value_in_progress: f64,
    pub open_deals_count: usize,
    pub win_rate: f64,
    pub deals_by_stage: BTreeMap<String, usize>,
    pub value_by_seller: BTreeMap<String, f64>,
}

/// Which backend answered a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote,
    Local,
}

/// A read result tagged with the source that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sourced<T> {
    pub source: DataSource,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_deal() -> Deal {
        Deal {
            id: 3,
            client_name: "Acme".into(),
            negotiated_value: 5000.0,
            stage: "New Lead".into(),
            status: "In Negotiation".into(),
            owner: "Alice".into(),
            created_at: None,
            updated_at: None,
            conversation_link: None,
            conversation_summary: Some("first call".into()),
            origin: Origin::Local,
        }
    }

    #[test]
    fn test_patch_preserves_unspecified_fields() {
        let mut deal = sample_deal();
        let patch = DealPatch {
            stage: Some("Proposal Sent".into()),
            ..Default::default()
        };
        patch.apply_to(&mut deal);

        assert_eq!(deal.stage, "Proposal Sent");
        assert_eq!(deal.status, "In Negotiation");
        assert_eq!(deal.client_name, "Acme");
        assert_eq!(deal.conversation_summary.as_deref(), Some("first call"));
    }

    #[test]
    fn test_blank_text_patch_clears_field() {
        let mut deal = sample_deal();
        let patch = DealPatch {
            conversation_summary: Some("  ".into()),
            ..Default::default()
        };
        patch.apply_to(&mut deal);
        assert_eq!(deal.conversation_summary, None);

        let patch = DealPatch {
            conversation_link: Some(" https://chat.example/3 ".into()),
            ..Default::default()
        };
        patch.apply_to(&mut deal);
        assert_eq!(deal.conversation_link.as_deref(), Some("https://chat.example/3"));
    }

    #[test]
    fn test_status_patch_does_not_reset_stage() {
        let mut deal = sample_deal();
        let patch = DealPatch {
            status: Some("Won".into()),
            ..Default::default()
        };
        patch.apply_to(&mut deal);
        assert_eq!(deal.stage, "New Lead");
        assert_eq!(deal.status, "Won");
    }

    #[test]
    fn test_patch_accepts_string_amount() {
        let patch: DealPatch =
            serde_json::from_str(r#"{"negotiatedValue": "1200.50"}"#).expect("parse");
        assert_eq!(patch.negotiated_value, Some(1200.5));
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_empty_patch() {
        let patch: DealPatch = serde_json::from_str("{}").expect("parse");
        assert!(patch.is_empty());
    }

    #[test]
    fn test_deal_serializes_camel_case_without_missing_timestamps() {
        let json = serde_json::to_value(sample_deal()).expect("serialize");
        assert_eq!(json["clientName"], "Acme");
        assert_eq!(json["negotiatedValue"], 5000.0);
        assert_eq!(json["origin"], "local");
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn test_config_defaults_from_empty_object() {
        let config: Config = serde_json::from_str("{}").expect("parse");
        assert_eq!(config.bind_addr, "127.0.0.1:5000");
        assert_eq!(config.vocabulary_version, "pt-br-v2");
        assert!(config.seed_sample_data);
        assert!(!config.remote.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_unknown_vocabulary() {
        let config = Config {
            vocabulary_version: "pt-br-v9".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("Unknown vocabulary version"));
    }
}
