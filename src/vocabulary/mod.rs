//! Versioned stage/status vocabularies.
//!
//! The pipeline's column and outcome labels changed over the life of the
//! board, so the valid set is data, selected by `vocabularyVersion` in config.
//! Each version ships as an embedded JSON document.

pub mod embedded;
pub mod loader;
pub mod schema;

pub use loader::{load_vocabulary, validate_vocabulary};
pub use schema::{StatusRole, StatusValue, Vocabulary, VocabularyValue};
