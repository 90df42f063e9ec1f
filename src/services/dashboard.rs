// Dashboard service: aggregate statistics over a deal list.
// Pure computation: recomputed from the records on every call, holds no state.

use std::collections::BTreeMap;

use crate::types::{DashboardData, Deal};
use crate::vocabulary::{StatusRole, Vocabulary};

/// Derive dashboard statistics from the full deal list.
///
/// Status buckets go by vocabulary role, so any open/won/lost spelling the
/// vocabulary knows counts. Stages outside the vocabulary are left out of
/// `deals_by_stage`; every known stage is present, zero or not.
pub fn compute_dashboard(deals: &[Deal], vocabulary: &Vocabulary) -> DashboardData {
    let mut total_value_in_progress = 0.0;
    let mut open_deals_count = 0;
    let mut won = 0usize;
    let mut lost = 0usize;

    let mut deals_by_stage: BTreeMap<String, usize> = vocabulary
        .stage_names()
        .map(|stage| (stage.to_string(), 0))
        .collect();
    let mut value_by_seller: BTreeMap<String, f64> = BTreeMap::new();
    let mut unknown_stages = 0usize;
    let mut unowned = 0usize;

    for deal in deals {
        match vocabulary.status_role(&deal.status) {
            Some(StatusRole::Open) => {
                total_value_in_progress += deal.negotiated_value;
                open_deals_count += 1;
            }
            Some(StatusRole::Won) => won += 1,
            Some(StatusRole::Lost) => lost += 1,
            Some(StatusRole::Other) | None => {}
        }

        match vocabulary
            .canonical_stage(&deal.stage)
            .and_then(|stage| deals_by_stage.get_mut(stage))
        {
            Some(count) => *count += 1,
            None => unknown_stages += 1,
        }

        match deal.owner.trim() {
            "" => unowned += 1,
            owner => {
                *value_by_seller.entry(owner.to_string()).or_insert(0.0) +=
                    deal.negotiated_value
            }
        }
    }

    if unknown_stages > 0 {
        log::debug!(
            "Dashboard: {} deal(s) with stages outside vocabulary {}",
            unknown_stages,
            vocabulary.id
        );
    }

    if unowned > 0 {
        log::debug!(
            "Dashboard: {} deal(s) without an owner left out of valueBySeller",
            unowned
        );
    }

    DashboardData {
        total_value_in_progress,
        open_deals_count,
        win_rate: win_rate(won, lost),
        deals_by_stage,
        value_by_seller,
    }
}

/// `won / (won + lost)`, or 0 when nothing has closed yet.
pub fn win_rate(won: usize, lost: usize) -> f64 {
    let closed = won + lost;
    if closed == 0 {
        0.0
    } else {
        won as f64 / closed as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Origin;
    use crate::vocabulary::load_vocabulary;

    fn deal(id: i64, value: f64, stage: &str, status: &str, owner: &str) -> Deal {
        Deal {
            id,
            client_name: format!("Client {}", id),
            negotiated_value: value,
            stage: stage.into(),
            status: status.into(),
            owner: owner.into(),
            created_at: None,
            updated_at: None,
            conversation_link: None,
            conversation_summary: None,
            origin: Origin::Remote,
        }
    }

    #[test]
    fn test_empty_set_has_every_stage_at_zero() {
        let vocab = load_vocabulary("en-v1").unwrap();
        let data = compute_dashboard(&[], &vocab);

        assert_eq!(data.deals_by_stage.len(), 5);
        assert!(data.deals_by_stage.values().all(|c| *c == 0));
        assert_eq!(data.win_rate, 0.0);
        assert_eq!(data.open_deals_count, 0);
        assert_eq!(data.total_value_in_progress, 0.0);
        assert!(data.value_by_seller.is_empty());
    }

    #[test]
    fn test_win_rate_zero_without_closed_deals() {
        assert_eq!(win_rate(0, 0), 0.0);
        assert!(!win_rate(0, 0).is_nan());
        assert_eq!(win_rate(1, 3), 0.25);
        assert_eq!(win_rate(2, 0), 1.0);
    }

    #[test]
    fn test_aggregates_over_mixed_statuses() {
        let vocab = load_vocabulary("en-v1").unwrap();
        let deals = vec![
            deal(1, 5000.0, "New Lead", "In Negotiation", "Alice"),
            deal(2, 2500.0, "Proposal Sent", "In Negotiation", "Bob"),
            deal(3, 1000.0, "Deal Closed", "Won", "Alice"),
            deal(4, 800.0, "Deal Closed", "Lost", "Bob"),
            deal(5, 200.0, "Deal Closed", "Lost", "Carol"),
        ];
        let data = compute_dashboard(&deals, &vocab);

        assert_eq!(data.total_value_in_progress, 7500.0);
        assert_eq!(data.open_deals_count, 2);
        assert!((data.win_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(data.deals_by_stage["New Lead"], 1);
        assert_eq!(data.deals_by_stage["Proposal Sent"], 1);
        assert_eq!(data.deals_by_stage["Deal Closed"], 3);
        assert_eq!(data.deals_by_stage["Follow-up Manual"], 0);
        assert_eq!(data.value_by_seller["Alice"], 6000.0);
        assert_eq!(data.value_by_seller["Bob"], 3300.0);
        assert_eq!(data.value_by_seller["Carol"], 200.0);
        assert_eq!(data.value_by_seller.len(), 3);
    }

    #[test]
    fn test_unknown_stage_excluded_from_buckets_but_counted_elsewhere() {
        let vocab = load_vocabulary("pt-br-v1").unwrap();
        let deals = vec![deal(9, 1200.0, "Recuperado por IA", "Em Negociação", "Bob")];
        let data = compute_dashboard(&deals, &vocab);

        assert!(!data.deals_by_stage.contains_key("Recuperado por IA"));
        assert_eq!(data.deals_by_stage.values().sum::<usize>(), 0);
        assert_eq!(data.open_deals_count, 1);
        assert_eq!(data.value_by_seller["Bob"], 1200.0);
    }

    #[test]
    fn test_status_spelling_drift_still_counts() {
        let vocab = load_vocabulary("pt-br-v2").unwrap();
        let deals = vec![
            deal(1, 100.0, "Novo Contato", "Em Negociação", "Ana"),
            deal(2, 100.0, "Novo Lead", "EM NEGOCIACAO", "Ana"),
            deal(3, 100.0, "Vendido", "Vendido", "Ana"),
        ];
        let data = compute_dashboard(&deals, &vocab);

        assert_eq!(data.open_deals_count, 2);
        assert_eq!(data.deals_by_stage["Novo Contato"], 2);
        assert_eq!(data.win_rate, 1.0);
    }

    #[test]
    fn test_blank_owner_not_bucketed_as_seller() {
        let vocab = load_vocabulary("en-v1").unwrap();
        let deals = vec![
            deal(1, 400.0, "New Lead", "In Negotiation", ""),
            deal(2, 600.0, "New Lead", "In Negotiation", "   "),
            deal(3, 900.0, "New Lead", "In Negotiation", " Alice "),
        ];
        let data = compute_dashboard(&deals, &vocab);

        assert!(!data.value_by_seller.contains_key(""));
        assert_eq!(data.value_by_seller.len(), 1);
        assert_eq!(data.value_by_seller["Alice"], 900.0);
        // Unowned deals still count everywhere else.
        assert_eq!(data.open_deals_count, 3);
        assert_eq!(data.total_value_in_progress, 1900.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let vocab = load_vocabulary("en-v1").unwrap();
        let deals = vec![deal(1, 5000.0, "New Lead", "In Negotiation", "Alice")];
        assert_eq!(compute_dashboard(&deals, &vocab), compute_dashboard(&deals, &vocab));
    }
}
