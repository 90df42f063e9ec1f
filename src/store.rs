//! In-memory deal table.
//!
//! Locally created deals live here only; nothing is written to disk. Ids come
//! from an increasing counter starting at 1 and are never reused.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::error::DealError;
use crate::types::{Deal, DealInput, DealPatch, Origin};
use crate::vocabulary::{StatusRole, Vocabulary};

#[derive(Debug)]
pub struct DealStore {
    deals: BTreeMap<i64, Deal>,
    next_id: i64,
}

impl Default for DealStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DealStore {
    /// An empty store whose first deal gets id 1.
    pub fn new() -> Self {
        Self {
            deals: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// A store pre-filled with sample deals labelled from `vocabulary`.
    pub fn seeded(vocabulary: &Vocabulary) -> Self {
        let mut store = Self::new();
        for input in sample_deals(vocabulary) {
            if let Err(e) = store.create(input) {
                log::warn!("Skipping sample deal: {}", e);
            }
        }
        log::info!(
            "Seeded deal store with {} sample deals ({})",
            store.len(),
            vocabulary.id
        );
        store
    }

    pub fn len(&self) -> usize {
        self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    pub fn list(&self) -> Vec<Deal> {
        self.deals.values().cloned().collect()
    }

    pub fn get(&self, id: i64) -> Option<Deal> {
        self.deals.get(&id).cloned()
    }

    /// Store a new deal, assigning the next id and stamping both timestamps.
    pub fn create(&mut self, input: DealInput) -> Result<Deal, DealError> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| DealError::Storage("deal id space exhausted".into()))?;

        let now = Utc::now();
        let deal = Deal {
            id,
            client_name: input.client_name,
            negotiated_value: input.negotiated_value,
            stage: input.stage,
            status: input.status,
            owner: input.owner,
            created_at: Some(now),
            updated_at: Some(now),
            conversation_link: input.conversation_link,
            conversation_summary: input.conversation_summary,
            origin: Origin::Local,
        };
        self.deals.insert(id, deal.clone());
        log::debug!("Created deal {}", id);
        Ok(deal)
    }

    /// Merge `patch` onto an existing deal and re-stamp `updatedAt`.
    ///
    /// Returns `None` (and stores nothing) when `id` is absent.
    pub fn update(&mut self, id: i64, patch: &DealPatch) -> Option<Deal> {
        let deal = self.deals.get_mut(&id)?;
        patch.apply_to(deal);
        deal.updated_at = Some(Utc::now());
        log::debug!("Updated deal {}", id);
        Some(deal.clone())
    }

    pub fn delete(&mut self, id: i64) -> bool {
        let removed = self.deals.remove(&id).is_some();
        if removed {
            log::debug!("Deleted deal {}", id);
        }
        removed
    }
}

/// (client, value, stage position, status role, owner)
const SAMPLE_DEALS: &[(&str, f64, usize, StatusRole, &str)] = &[
    ("Empresa Exemplo Ltda", 750050.0, 0, StatusRole::Open, "João Silva Sauro"),
    ("Empresa Exemplo Ltda", 750050.0, 2, StatusRole::Open, "João Silva"),
    ("Empresa XYZ Atualizada Ltda", 11200.99, 2, StatusRole::Won, "Mariana Silva"),
    ("Empresa Exemplo Ltda", 750050.0, 0, StatusRole::Open, "João Silva Sauro"),
    ("Empresa Exemplo Ltda", 750050.0, 0, StatusRole::Lost, "João Silva Sauro"),
    ("Empresa Exemplo Ltda", 750050.0, 0, StatusRole::Won, "João Silva Sauro"),
    ("Empresa Exemplo Ltda", 750050.0, 0, StatusRole::Lost, "João Silva"),
    ("Empresa Exemplo Ltda", 750050.0, 1, StatusRole::Open, "João Silva Sauro"),
];

/// Sample deals expressed in `vocabulary`'s labels, so the seed is valid
/// whichever version is active.
pub fn sample_deals(vocabulary: &Vocabulary) -> Vec<DealInput> {
    let stages: Vec<&str> = vocabulary.stage_names().collect();
    SAMPLE_DEALS
        .iter()
        .filter_map(|(client, value, stage_pos, role, owner)| {
            let stage = stages.get(stage_pos % stages.len().max(1))?;
            let status = vocabulary.status_for_role(*role)?;
            Some(DealInput {
                client_name: client.to_string(),
                negotiated_value: *value,
                stage: stage.to_string(),
                status: status.to_string(),
                owner: owner.to_string(),
                conversation_link: None,
                conversation_summary: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::load_vocabulary;

    fn acme() -> DealInput {
        DealInput {
            client_name: "Acme".into(),
            negotiated_value: 5000.0,
            stage: "New Lead".into(),
            status: "In Negotiation".into(),
            owner: "Alice".into(),
            conversation_link: None,
            conversation_summary: None,
        }
    }

    #[test]
    fn test_create_assigns_first_id_and_timestamps() {
        let mut store = DealStore::new();
        let deal = store.create(acme()).expect("create");

        assert_eq!(deal.id, 1);
        assert!(deal.created_at.is_some());
        assert_eq!(deal.created_at, deal.updated_at);
        assert_eq!(deal.origin, Origin::Local);
        assert_eq!(store.list(), vec![deal]);
    }

    #[test]
    fn test_create_then_get_round_trip() {
        let mut store = DealStore::new();
        let created = store.create(acme()).expect("create");
        let fetched = store.get(created.id).expect("present");

        assert_eq!(fetched, created);
        assert_eq!(fetched.client_name, "Acme");
        assert_eq!(fetched.negotiated_value, 5000.0);
        assert_eq!(fetched.stage, "New Lead");
        assert_eq!(fetched.status, "In Negotiation");
        assert_eq!(fetched.owner, "Alice");
    }

    #[test]
    fn test_ids_increase_and_are_not_reused() {
        let mut store = DealStore::new();
        let first = store.create(acme()).unwrap();
        assert!(store.delete(first.id));
        let second = store.create(acme()).unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_update_preserves_unspecified_fields() {
        let mut store = DealStore::new();
        let created = store.create(acme()).unwrap();
        let patch = DealPatch {
            negotiated_value: Some(7500.0),
            ..Default::default()
        };
        let updated = store.update(created.id, &patch).expect("present");

        assert_eq!(updated.negotiated_value, 7500.0);
        assert_eq!(updated.client_name, created.client_name);
        assert_eq!(updated.stage, created.stage);
        assert_eq!(updated.status, created.status);
        assert_eq!(updated.owner, created.owner);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(store.get(created.id), Some(updated));
    }

    #[test]
    fn test_update_missing_id_does_not_create() {
        let mut store = DealStore::new();
        let patch = DealPatch {
            client_name: Some("Ghost".into()),
            ..Default::default()
        };
        assert!(store.update(99, &patch).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete() {
        let mut store = DealStore::new();
        let created = store.create(acme()).unwrap();
        assert!(store.delete(created.id));
        assert!(!store.delete(created.id));
        assert!(store.get(created.id).is_none());
    }

    #[test]
    fn test_seed_uses_active_vocabulary() {
        for version in ["pt-br-v1", "pt-br-v2", "en-v1"] {
            let vocab = load_vocabulary(version).unwrap();
            let store = DealStore::seeded(&vocab);
            assert_eq!(store.len(), 8, "{} seed size", version);
            for deal in store.list() {
                assert!(vocab.canonical_stage(&deal.stage).is_some());
                assert!(vocab.canonical_status(&deal.status).is_some());
            }
        }
    }

    #[test]
    fn test_seed_v1_matches_legacy_board() {
        let vocab = load_vocabulary("pt-br-v1").unwrap();
        let store = DealStore::seeded(&vocab);
        let third = store.get(3).unwrap();
        assert_eq!(third.client_name, "Empresa XYZ Atualizada Ltda");
        assert_eq!(third.stage, "Follow-Up Automático");
        assert_eq!(third.status, "Ganho");
        assert_eq!(store.get(8).unwrap().stage, "Follow-up Manual");
    }
}
