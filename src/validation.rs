//! Field validation for create/update requests.
//!
//! Runs before any store or webhook write. Stage and status labels are
//! rewritten to the vocabulary's canonical spelling.

use crate::error::DealError;
use crate::types::{DealInput, DealPatch};
use crate::util::non_empty_trimmed;
use crate::vocabulary::Vocabulary;

fn required_text(field: &str, value: &str) -> Result<String, DealError> {
    non_empty_trimmed(value)
        .map(str::to_string)
        .ok_or_else(|| DealError::Validation(format!("{} is required", field)))
}

fn positive_amount(value: f64) -> Result<f64, DealError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DealError::Validation(format!(
            "negotiatedValue must be greater than zero, got {}",
            value
        )))
    }
}

fn known_stage(vocabulary: &Vocabulary, raw: &str) -> Result<String, DealError> {
    vocabulary
        .canonical_stage(raw)
        .map(str::to_string)
        .ok_or_else(|| {
            DealError::Validation(format!(
                "Unknown stage {:?}; expected one of: {}",
                raw,
                vocabulary.stage_names().collect::<Vec<_>>().join(", ")
            ))
        })
}

fn known_status(vocabulary: &Vocabulary, raw: &str) -> Result<String, DealError> {
    vocabulary
        .canonical_status(raw)
        .map(str::to_string)
        .ok_or_else(|| {
            DealError::Validation(format!(
                "Unknown status {:?}; expected one of: {}",
                raw,
                vocabulary
                    .statuses
                    .iter()
                    .map(|s| s.value.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .and_then(non_empty_trimmed)
        .map(str::to_string)
}

/// Validate a create request, returning the cleaned input.
pub fn validate_input(input: DealInput, vocabulary: &Vocabulary) -> Result<DealInput, DealError> {
    Ok(DealInput {
        client_name: required_text("clientName", &input.client_name)?,
        negotiated_value: positive_amount(input.negotiated_value)?,
        stage: known_stage(vocabulary, &input.stage)?,
        status: known_status(vocabulary, &input.status)?,
        owner: required_text("owner", &input.owner)?,
        conversation_link: optional_text(&input.conversation_link),
        conversation_summary: optional_text(&input.conversation_summary),
    })
}

/// Validate the present fields of a partial update.
pub fn validate_patch(patch: DealPatch, vocabulary: &Vocabulary) -> Result<DealPatch, DealError> {
    Ok(DealPatch {
        client_name: patch
            .client_name
            .as_deref()
            .map(|v| required_text("clientName", v))
            .transpose()?,
        negotiated_value: patch.negotiated_value.map(positive_amount).transpose()?,
        stage: patch
            .stage
            .as_deref()
            .map(|v| known_stage(vocabulary, v))
            .transpose()?,
        status: patch
            .status
            .as_deref()
            .map(|v| known_status(vocabulary, v))
            .transpose()?,
        owner: patch
            .owner
            .as_deref()
            .map(|v| required_text("owner", v))
            .transpose()?,
        conversation_link: patch.conversation_link.map(|v| v.trim().to_string()),
        conversation_summary: patch.conversation_summary.map(|v| v.trim().to_string()),
    })
}
