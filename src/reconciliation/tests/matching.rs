use super::common::*;
use crate::config::ToleranceConfig;
use crate::reconciliation::matching::find_candidates;
use crate::reconciliation::{MatchConfidence, MatchType};

#[test]
fn amount_within_tolerance_matches_exact() {
    let tolerance = ToleranceConfig::default();
    let claimed = receipt("r-1", 50_000, 10);

    for delta in [-5i64, -1, 0, 1, 5] {
        let pool = vec![transaction("tx-1", 50_000 + delta, 10)];
        let matches = find_candidates(&claimed, &pool, &tolerance);
        assert_eq!(matches.len(), 1, "delta {delta} should match");
        assert_eq!(matches[0].match_type, MatchType::Exact);
        assert_eq!(matches[0].score, 100);
        assert_eq!(matches[0].confidence, MatchConfidence::High);
    }
}

#[test]
fn amount_just_outside_tolerance_is_rejected() {
    let tolerance = ToleranceConfig::default();
    let claimed = receipt("r-1", 50_000, 10);

    for delta in [-6i64, 6, 40] {
        let pool = vec![transaction("tx-1", 50_000 + delta, 10)];
        assert!(
            find_candidates(&claimed, &pool, &tolerance).is_empty(),
            "delta {delta} should not match"
        );
    }
}

#[test]
fn known_fee_reconciles_the_gap() {
    let tolerance = ToleranceConfig::default();
    // Payer claims 502.50 but the bank settled 500.00 (2.50 boleto fee).
    let claimed = receipt("r-1", 50_250, 10);
    let pool = vec![transaction("tx-1", 50_000, 10)];

    let matches = find_candidates(&claimed, &pool, &tolerance);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_type, MatchType::FeeAdjusted);
    assert_eq!(matches[0].score, 90);
    assert_eq!(matches[0].fee_detected_cents, Some(250));
}

#[test]
fn unknown_fee_gap_produces_no_match() {
    let tolerance = ToleranceConfig::default();
    // 7.77 gap matches no configured fee.
    let claimed = receipt("r-1", 50_777, 10);
    let pool = vec![transaction("tx-1", 50_000, 10)];
    assert!(find_candidates(&claimed, &pool, &tolerance).is_empty());
}

#[test]
fn date_window_is_an_independent_filter() {
    let tolerance = ToleranceConfig::default();
    let claimed = receipt("r-1", 50_000, 10);

    // Same amount, two days away: still a match.
    let near = vec![transaction("tx-1", 50_000, 12)];
    assert_eq!(find_candidates(&claimed, &near, &tolerance).len(), 1);

    // Same amount, three days away: filtered out.
    let far = vec![transaction("tx-1", 50_000, 13)];
    assert!(find_candidates(&claimed, &far, &tolerance).is_empty());
}

#[test]
fn every_plausible_transaction_is_returned() {
    let tolerance = ToleranceConfig::default();
    let claimed = receipt("r-1", 50_000, 10);
    let pool = vec![
        transaction("tx-1", 50_000, 10),
        transaction("tx-2", 50_000, 11),
        transaction("tx-3", 99_000, 10),
    ];

    let matches = find_candidates(&claimed, &pool, &tolerance);
    assert_eq!(matches.len(), 2);
}
