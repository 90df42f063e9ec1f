use std::collections::HashSet;

use super::embedded;
use super::schema::{StatusRole, Vocabulary};
use crate::util::normalize_match_key;

/// Load an embedded vocabulary by version ID.
pub fn load_vocabulary(version: &str) -> Result<Vocabulary, String> {
    let json = embedded::get_embedded(version)
        .ok_or_else(|| format!("Unknown vocabulary version: {}", version))?;
    let vocabulary: Vocabulary = serde_json::from_str(json)
        .map_err(|e| format!("Failed to parse embedded vocabulary '{}': {}", version, e))?;
    validate_vocabulary(&vocabulary)?;
    Ok(vocabulary)
}

/// Load a custom vocabulary from a file path.
pub fn load_custom_vocabulary(path: &std::path::Path) -> Result<Vocabulary, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read vocabulary file: {}", e))?;
    let vocabulary: Vocabulary = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse vocabulary: {}", e))?;
    validate_vocabulary(&vocabulary)?;
    Ok(vocabulary)
}

/// Validate a vocabulary is usable for validation and aggregation.
pub fn validate_vocabulary(vocabulary: &Vocabulary) -> Result<(), String> {
    if vocabulary.id.is_empty() {
        return Err("Vocabulary id is required".into());
    }
    if vocabulary.stages.is_empty() {
        return Err("Vocabulary needs at least one stage".into());
    }

    let open = vocabulary
        .statuses
        .iter()
        .filter(|s| s.role == StatusRole::Open)
        .count();
    if open != 1 {
        return Err(format!(
            "Vocabulary needs exactly one open status, found {}",
            open
        ));
    }
    for role in [StatusRole::Won, StatusRole::Lost] {
        if !vocabulary.statuses.iter().any(|s| s.role == role) {
            return Err(format!("Vocabulary needs a {:?} status", role).to_lowercase());
        }
    }

    let mut stage_keys = HashSet::new();
    for stage in &vocabulary.stages {
        for label in std::iter::once(&stage.value).chain(stage.aliases.iter()) {
            let key = normalize_match_key(label);
            if key.is_empty() || !stage_keys.insert(key) {
                return Err(format!("Duplicate or empty stage label: {:?}", label));
            }
        }
    }

    let mut status_keys = HashSet::new();
    for status in &vocabulary.statuses {
        for label in std::iter::once(&status.value).chain(status.aliases.iter()) {
            let key = normalize_match_key(label);
            if key.is_empty() || !status_keys.insert(key) {
                return Err(format!("Duplicate or empty status label: {:?}", label));
            }
        }
    }

    Ok(())
}

/// List all available embedded vocabularies as (id, name, description).
pub fn get_available_vocabularies() -> Vec<(String, String, String)> {
    embedded::list_embedded()
}
