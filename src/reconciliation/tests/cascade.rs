use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::common::*;
use crate::config::ToleranceConfig;
use crate::reconciliation::{
    AuditFlag, ClaimLedger, ClaimOutcome, DispositionStatus, ReceiptId, ReconciliationEngine,
    ResolutionLevel, TransactionId,
};

#[test]
fn no_candidates_terminates_in_rejection() {
    let engine = engine();
    let result = engine.reconcile(&receipt("r-1", 50_000, 10), &[]);

    assert_eq!(result.status, DispositionStatus::Rejected);
    assert!(result.matches.is_empty());
    assert!(!result.requires_manual_review);
}

#[test]
fn single_high_confidence_match_is_claimed_directly() {
    let engine = engine();
    let pool = vec![transaction("tx-1", 50_000, 10)];
    let result = engine.reconcile(&receipt("r-1", 50_000, 10), &pool);

    assert_eq!(result.status, DispositionStatus::Approved);
    assert_eq!(result.resolution_level, Some(ResolutionLevel::SingleMatch));
    assert_eq!(
        engine.ledger().owner_of(&TransactionId("tx-1".to_string())),
        Some(ReceiptId("r-1".to_string()))
    );
}

#[test]
fn single_match_owned_elsewhere_is_flagged_as_claimed() {
    let engine = engine();
    let pool = vec![transaction("tx-1", 50_000, 10)];

    let first = engine.reconcile(&receipt("r-1", 50_000, 10), &pool);
    assert_eq!(first.status, DispositionStatus::Approved);

    let second = engine.reconcile(&receipt("r-2", 50_000, 10), &pool);
    assert_eq!(second.status, DispositionStatus::TransactionAlreadyClaimed);
    assert!(second.requires_manual_review);
    assert!(second.fraud_flags.contains(&AuditFlag::TransactionClaimed));
}

#[test]
fn payer_identifier_settles_ambiguity_at_level_one() {
    // Scenario: two 500.00 transactions on the same date, one tagged with the
    // payer document the receipt declares.
    let engine = engine();
    let pool = vec![
        transaction("tx-1", 50_000, 10),
        with_payer(transaction("tx-2", 50_000, 10), "123.456.789-00"),
    ];
    let mut claimed = receipt("r-1", 50_000, 10);
    claimed.payer_document = Some("12345678900".to_string());

    let result = engine.reconcile(&claimed, &pool);

    assert_eq!(result.status, DispositionStatus::Approved);
    assert_eq!(result.resolution_level, Some(ResolutionLevel::Level1PayerId));
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].transaction_id, TransactionId("tx-2".to_string()));
}

#[test]
fn timestamp_proximity_settles_ambiguity_at_level_two() {
    // Scenario: no payer document, but the receipt carries a timestamp ten
    // minutes from the second transaction's.
    let engine = engine();
    let pool = vec![
        with_timestamp(transaction("tx-1", 50_000, 10), 8, 0),
        with_timestamp(transaction("tx-2", 50_000, 10), 14, 30),
    ];
    let mut claimed = receipt("r-1", 50_000, 10);
    claimed.paid_at = Some(at(10, 14, 40));

    let result = engine.reconcile(&claimed, &pool);

    assert_eq!(result.status, DispositionStatus::Approved);
    assert_eq!(
        result.resolution_level,
        Some(ResolutionLevel::Level2Timestamp)
    );
    assert_eq!(result.matches[0].transaction_id, TransactionId("tx-2".to_string()));
}

#[test]
fn timestamp_outside_window_falls_through_to_fifo() {
    let engine = engine();
    let pool = vec![
        with_timestamp(transaction("tx-1", 50_000, 10), 8, 0),
        with_timestamp(transaction("tx-2", 50_000, 10), 14, 30),
    ];
    let mut claimed = receipt("r-1", 50_000, 10);
    claimed.paid_at = Some(at(10, 16, 0));

    let result = engine.reconcile(&claimed, &pool);

    assert_eq!(result.status, DispositionStatus::Approved);
    assert_eq!(result.resolution_level, Some(ResolutionLevel::Level3Fifo));
    assert_eq!(result.matches[0].transaction_id, TransactionId("tx-1".to_string()));
}

#[test]
fn fifo_assigns_successive_receipts_in_chronological_order() {
    // Scenario: two receipts eligible for the same pair of transactions,
    // neither carrying payer identity nor timestamps.
    let engine = engine();
    let pool = vec![
        transaction("tx-later", 50_000, 11),
        transaction("tx-earlier", 50_000, 10),
    ];

    let first = engine.reconcile(&receipt("r-1", 50_000, 10), &pool);
    assert_eq!(first.status, DispositionStatus::Approved);
    assert_eq!(first.resolution_level, Some(ResolutionLevel::Level3Fifo));
    assert_eq!(
        first.matches[0].transaction_id,
        TransactionId("tx-earlier".to_string())
    );

    let second = engine.reconcile(&receipt("r-2", 50_000, 10), &pool);
    assert_eq!(second.status, DispositionStatus::Approved);
    assert_eq!(
        second.matches[0].transaction_id,
        TransactionId("tx-later".to_string())
    );
}

#[test]
fn fifo_always_progresses_while_any_candidate_is_unclaimed() {
    let engine = engine();
    let pool: Vec<_> = (1..=5)
        .map(|i| transaction(&format!("tx-{i}"), 50_000, 10))
        .collect();

    for i in 1..=5 {
        let result = engine.reconcile(&receipt(&format!("r-{i}"), 50_000, 10), &pool);
        assert_eq!(
            result.status,
            DispositionStatus::Approved,
            "receipt r-{i} should claim one of the remaining transactions"
        );
    }
    assert_eq!(engine.ledger().claim_count(), 5);
}

#[test]
fn exhausted_pool_reports_all_transactions_claimed() {
    let engine = engine();
    let pool = vec![
        transaction("tx-1", 50_000, 10),
        transaction("tx-2", 50_000, 10),
    ];

    engine.reconcile(&receipt("r-1", 50_000, 10), &pool);
    engine.reconcile(&receipt("r-2", 50_000, 10), &pool);

    let third = engine.reconcile(&receipt("r-3", 50_000, 10), &pool);
    assert_eq!(third.status, DispositionStatus::TransactionAlreadyClaimed);
    assert!(third.requires_manual_review);
    // Exhaustion surfaces at the FIFO level.
    assert_eq!(third.resolution_level, Some(ResolutionLevel::Level3Fifo));
    assert!(third
        .fraud_flags
        .contains(&AuditFlag::AllTransactionsClaimed));
    assert!(third
        .fraud_flags
        .contains(&AuditFlag::PossibleDuplicateReceipt));
}

#[test]
fn unmatched_payer_identity_still_resolves_on_the_original_set() {
    // The declared document matches neither transaction; level 1 must not
    // strand the receipt and FIFO picks the earlier entry.
    let engine = engine();
    let pool = vec![
        with_payer(transaction("tx-1", 50_000, 10), "111.111.111-11"),
        with_payer(transaction("tx-2", 50_000, 11), "222.222.222-22"),
    ];
    let mut claimed = receipt("r-1", 50_000, 10);
    claimed.payer_document = Some("999.999.999-99".to_string());

    let result = engine.reconcile(&claimed, &pool);

    assert_eq!(result.status, DispositionStatus::Approved);
    assert_eq!(result.resolution_level, Some(ResolutionLevel::Level3Fifo));
    assert_eq!(result.matches[0].transaction_id, TransactionId("tx-1".to_string()));
}

#[test]
fn rejecting_an_approved_receipt_releases_its_claim() {
    let engine = engine();
    let pool = vec![transaction("tx-1", 50_000, 10)];

    let result = engine.reconcile(&receipt("r-1", 50_000, 10), &pool);
    assert_eq!(result.status, DispositionStatus::Approved);

    engine.reject_receipt(&result);
    assert_eq!(engine.ledger().owner_of(&TransactionId("tx-1".to_string())), None);

    let retry = engine.reconcile(&receipt("r-2", 50_000, 10), &pool);
    assert_eq!(retry.status, DispositionStatus::Approved);
}

/// Ledger standing in for a store where a concurrent winner always lands
/// first: every claim attempt is refused while the annotation pass still sees
/// the transactions as free.
struct ContendedLedger {
    attempts: AtomicUsize,
}

impl ClaimLedger for ContendedLedger {
    fn try_claim(&self, _: &TransactionId, _: &ReceiptId) -> ClaimOutcome {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        ClaimOutcome::AlreadyOwnedBy(ReceiptId("r-elsewhere".to_string()))
    }

    fn release(&self, _: &TransactionId) {}

    fn owner_of(&self, _: &TransactionId) -> Option<ReceiptId> {
        None
    }
}

#[test]
fn exhausted_claim_race_degrades_to_manual_review() {
    let ledger = Arc::new(ContendedLedger {
        attempts: AtomicUsize::new(0),
    });
    let engine = ReconciliationEngine::new(Arc::clone(&ledger), ToleranceConfig::default());
    let pool = vec![
        transaction("tx-1", 50_000, 10),
        transaction("tx-2", 50_000, 10),
    ];

    let result = engine.reconcile(&receipt("r-1", 50_000, 10), &pool);

    assert_eq!(result.status, DispositionStatus::ManualReview);
    assert!(result.requires_manual_review);
    assert!(result.fraud_flags.contains(&AuditFlag::ClaimContention));
    assert!(result.fraud_flags.contains(&AuditFlag::MultipleMatches));
    // One claim attempt per retry round, then the resolver gives up.
    assert_eq!(ledger.attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn cascade_never_claims_more_than_one_transaction_per_receipt() {
    let engine = engine();
    let pool: Vec<_> = (1..=4)
        .map(|i| transaction(&format!("tx-{i}"), 50_000, 10))
        .collect();

    let result = engine.reconcile(&receipt("r-1", 50_000, 10), &pool);
    assert_eq!(result.status, DispositionStatus::Approved);
    assert_eq!(result.matches.len(), 1);
    assert_eq!(engine.ledger().claim_count(), 1);
}
