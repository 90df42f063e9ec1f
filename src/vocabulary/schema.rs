use serde::{Deserialize, Serialize};

use crate::util::normalize_match_key;

/// A stage/status vocabulary: the labels a pipeline board accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Board columns in display order.
    pub stages: Vec<VocabularyValue>,
    pub statuses: Vec<StatusValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyValue {
    pub value: String,
    /// Other spellings that resolve to `value`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusValue {
    pub value: String,
    pub role: StatusRole,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// What a status means for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusRole {
    /// Still being negotiated; counts toward value in progress.
    Open,
    Won,
    Lost,
    Other,
}

fn matches(candidate: &str, key: &str) -> bool {
    normalize_match_key(candidate) == key
}

impl Vocabulary {
    /// Canonical stage label for `raw`, if the vocabulary knows it.
    pub fn canonical_stage(&self, raw: &str) -> Option<&str> {
        let key = normalize_match_key(raw);
        if key.is_empty() {
            return None;
        }
        self.stages
            .iter()
            .find(|s| matches(&s.value, &key) || s.aliases.iter().any(|a| matches(a, &key)))
            .map(|s| s.value.as_str())
    }

    /// Status entry for `raw`, if the vocabulary knows it.
    pub fn status(&self, raw: &str) -> Option<&StatusValue> {
        let key = normalize_match_key(raw);
        if key.is_empty() {
            return None;
        }
        self.statuses
            .iter()
            .find(|s| matches(&s.value, &key) || s.aliases.iter().any(|a| matches(a, &key)))
    }

    pub fn canonical_status(&self, raw: &str) -> Option<&str> {
        self.status(raw).map(|s| s.value.as_str())
    }

    pub fn status_role(&self, raw: &str) -> Option<StatusRole> {
        self.status(raw).map(|s| s.role)
    }

    /// Stage labels in board order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.value.as_str())
    }

    /// First status label carrying `role`.
    pub fn status_for_role(&self, role: StatusRole) -> Option<&str> {
        self.statuses
            .iter()
            .find(|s| s.role == role)
            .map(|s| s.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use crate::vocabulary::load_vocabulary;

    use super::*;

    #[test]
    fn test_canonical_stage_is_accent_and_case_insensitive() {
        let vocab = load_vocabulary("pt-br-v1").unwrap();
        assert_eq!(vocab.canonical_stage("follow-up automatico"), Some("Follow-Up Automático"));
        assert_eq!(vocab.canonical_stage("NOVO LEAD"), Some("Novo Lead"));
        assert_eq!(vocab.canonical_stage("Recuperado por IA"), None);
        assert_eq!(vocab.canonical_stage(""), None);
    }

    #[test]
    fn test_aliases_resolve_to_canonical_value() {
        let vocab = load_vocabulary("pt-br-v2").unwrap();
        assert_eq!(vocab.canonical_stage("Novo Lead"), Some("Novo Contato"));

        let vocab = load_vocabulary("en-v1").unwrap();
        assert_eq!(vocab.canonical_stage("closed"), Some("Deal Closed"));
    }

    #[test]
    fn test_status_roles() {
        let vocab = load_vocabulary("pt-br-v2").unwrap();
        assert_eq!(vocab.status_role("Em Negociação"), Some(StatusRole::Open));
        assert_eq!(vocab.status_role("Ganho"), Some(StatusRole::Won));
        assert_eq!(vocab.status_role("Vendido"), Some(StatusRole::Won));
        assert_eq!(vocab.status_role("Perda"), Some(StatusRole::Lost));
        assert_eq!(vocab.status_role("Pagamento Pendente"), Some(StatusRole::Other));
        assert_eq!(vocab.status_role("Arquivado"), None);
    }

    #[test]
    fn test_status_for_role() {
        let vocab = load_vocabulary("en-v1").unwrap();
        assert_eq!(vocab.status_for_role(StatusRole::Open), Some("In Negotiation"));
        assert_eq!(vocab.status_for_role(StatusRole::Other), None);
    }
}
