use crate::config::ToleranceConfig;

use super::domain::{
    BankTransaction, MatchConfidence, MatchType, Receipt, TransactionMatch,
};

/// Find every transaction that plausibly settles the claimed payment.
///
/// Date and amount checks are independent filters; both must pass. A
/// transaction that clears the date window matches either exactly (within the
/// amount tolerance) or fee-adjusted (the claimed amount minus one of the
/// configured common service charges). Pure: the caller supplies the
/// date-windowed transaction pool and nothing here touches shared state.
pub fn find_candidates(
    receipt: &Receipt,
    transactions: &[BankTransaction],
    tolerance: &ToleranceConfig,
) -> Vec<TransactionMatch> {
    transactions
        .iter()
        .filter_map(|tx| check_transaction(receipt, tx, tolerance))
        .collect()
}

fn check_transaction(
    receipt: &Receipt,
    tx: &BankTransaction,
    tolerance: &ToleranceConfig,
) -> Option<TransactionMatch> {
    let date_gap = (tx.booked_on - receipt.paid_on).num_days().abs();
    if date_gap > tolerance.date_window_days {
        return None;
    }

    if (tx.amount_cents - receipt.amount_cents).abs() <= tolerance.amount_cents {
        return Some(candidate(tx, 100, MatchType::Exact, None));
    }

    for &fee in &tolerance.common_fees_cents {
        let net = receipt.amount_cents - fee;
        if (tx.amount_cents - net).abs() <= tolerance.amount_cents {
            return Some(candidate(tx, 90, MatchType::FeeAdjusted, Some(fee)));
        }
    }

    None
}

fn candidate(
    tx: &BankTransaction,
    score: u8,
    match_type: MatchType,
    fee_detected_cents: Option<i64>,
) -> TransactionMatch {
    TransactionMatch {
        transaction_id: tx.id.clone(),
        amount_cents: tx.amount_cents,
        booked_on: tx.booked_on,
        booked_at: tx.booked_at,
        payer_document: tx.payer_document.clone(),
        description: tx.description.clone(),
        score,
        match_type,
        confidence: MatchConfidence::High,
        fee_detected_cents,
        claimed_by: None,
    }
}
