use tracing::{debug, warn};

use crate::config::ToleranceConfig;

use super::domain::{digits_only, MatchConfidence, Receipt, TransactionMatch};
use super::ledger::{ClaimLedger, ClaimOutcome};
use super::{AuditFlag, DispositionStatus, ResolutionLevel, ValidationResult};

/// Resolve a candidate set to a terminal disposition.
///
/// Candidates arrive annotated with their current ledger owner (when owned by
/// a different receipt). Earlier cascade levels encode stronger evidence
/// (declared payer identity, temporal precision) and are preferred over the
/// deterministic-but-arbitrary FIFO fallback. A claim race lost to a
/// concurrent caller is retried once against the reduced candidate set; a
/// second loss degrades to manual review rather than guessing.
pub(crate) fn resolve<L: ClaimLedger>(
    receipt: &Receipt,
    candidates: Vec<TransactionMatch>,
    ledger: &L,
    tolerance: &ToleranceConfig,
) -> ValidationResult {
    if candidates.is_empty() {
        return ValidationResult {
            receipt_id: receipt.id.clone(),
            status: DispositionStatus::Rejected,
            matches: Vec::new(),
            reason: "no corresponding transaction found in the bank statement".to_string(),
            resolution_level: None,
            requires_manual_review: false,
            fraud_flags: Vec::new(),
        };
    }

    if candidates.len() == 1 {
        return resolve_single(receipt, candidates, ledger);
    }

    let mut working = candidates;
    for attempt in 0..2 {
        match run_levels(receipt, &working, tolerance) {
            LevelDecision::Claim { index, level, reason } => {
                let chosen = working[index].clone();
                match ledger.try_claim(&chosen.transaction_id, &receipt.id) {
                    ClaimOutcome::Granted => {
                        return approved(receipt, chosen, level, reason);
                    }
                    ClaimOutcome::AlreadyOwnedBy(owner) => {
                        warn!(
                            receipt = %receipt.id.0,
                            transaction = %chosen.transaction_id.0,
                            attempt,
                            "lost claim race, retrying against reduced candidate set"
                        );
                        working[index].claimed_by = Some(owner);
                    }
                }
            }
            LevelDecision::AllClaimed => {
                let claimed: Vec<TransactionMatch> = working
                    .iter()
                    .filter(|candidate| candidate.is_claimed())
                    .cloned()
                    .collect();
                let reason = format!(
                    "all {} matching transactions are already claimed by other receipts",
                    claimed.len()
                );
                return ValidationResult {
                    receipt_id: receipt.id.clone(),
                    status: DispositionStatus::TransactionAlreadyClaimed,
                    matches: claimed,
                    reason,
                    // Exhaustion is only discoverable at the FIFO level, so
                    // the terminal reports level 3 even though no claim ran.
                    resolution_level: Some(ResolutionLevel::Level3Fifo),
                    requires_manual_review: true,
                    fraud_flags: vec![
                        AuditFlag::AllTransactionsClaimed,
                        AuditFlag::PossibleDuplicateReceipt,
                    ],
                };
            }
            LevelDecision::NoCriteria => {
                let reason = format!(
                    "multiple transactions ({}) with no deciding criterion; manual review required",
                    working.len()
                );
                return manual_review(
                    receipt,
                    working,
                    reason,
                    vec![AuditFlag::MultipleMatches, AuditFlag::NoResolutionCriteria],
                );
            }
        }
    }

    manual_review(
        receipt,
        working,
        "claim contention while resolving candidates; manual review required".to_string(),
        vec![AuditFlag::MultipleMatches, AuditFlag::ClaimContention],
    )
}

fn resolve_single<L: ClaimLedger>(
    receipt: &Receipt,
    mut candidates: Vec<TransactionMatch>,
    ledger: &L,
) -> ValidationResult {
    let single = candidates.remove(0);

    if let Some(owner) = &single.claimed_by {
        let reason = format!(
            "transaction already claimed by receipt {}",
            owner.0
        );
        return ValidationResult {
            receipt_id: receipt.id.clone(),
            status: DispositionStatus::TransactionAlreadyClaimed,
            matches: vec![single],
            reason,
            resolution_level: None,
            requires_manual_review: true,
            fraud_flags: vec![AuditFlag::TransactionClaimed],
        };
    }

    if single.confidence != MatchConfidence::High {
        return ValidationResult {
            receipt_id: receipt.id.clone(),
            status: DispositionStatus::ManualReview,
            matches: vec![single],
            reason: "match found but with low confidence; manual review required".to_string(),
            resolution_level: Some(ResolutionLevel::Manual),
            requires_manual_review: true,
            fraud_flags: vec![AuditFlag::LowConfidence],
        };
    }

    match ledger.try_claim(&single.transaction_id, &receipt.id) {
        ClaimOutcome::Granted => {
            let reason = format!("payment confirmed ({} match)", single.match_type.label());
            approved(receipt, single, ResolutionLevel::SingleMatch, reason)
        }
        ClaimOutcome::AlreadyOwnedBy(owner) => {
            // Race: a concurrent caller won between annotation and claim. With
            // a single candidate the reduced set is empty, so this terminal
            // mirrors the pre-claimed case.
            let mut claimed = single;
            claimed.claimed_by = Some(owner.clone());
            ValidationResult {
                receipt_id: receipt.id.clone(),
                status: DispositionStatus::TransactionAlreadyClaimed,
                matches: vec![claimed],
                reason: format!("transaction already claimed by receipt {}", owner.0),
                resolution_level: None,
                requires_manual_review: true,
                fraud_flags: vec![AuditFlag::TransactionClaimed],
            }
        }
    }
}

enum LevelDecision {
    Claim {
        index: usize,
        level: ResolutionLevel,
        reason: String,
    },
    AllClaimed,
    NoCriteria,
}

fn run_levels(
    receipt: &Receipt,
    candidates: &[TransactionMatch],
    tolerance: &ToleranceConfig,
) -> LevelDecision {
    let unclaimed: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| !candidate.is_claimed())
        .map(|(index, _)| index)
        .collect();

    if unclaimed.is_empty() {
        return LevelDecision::AllClaimed;
    }

    // Level 1: declared payer identity, compared digits-to-digits.
    let mut working = unclaimed.clone();
    if let Some(declared) = &receipt.payer_document {
        let declared = digits_only(declared);
        let survivors: Vec<usize> = working
            .iter()
            .copied()
            .filter(|&index| {
                candidates[index]
                    .payer_document
                    .as_deref()
                    .map(|doc| digits_only(doc) == declared)
                    .unwrap_or(false)
            })
            .collect();

        match survivors.len() {
            1 => {
                return LevelDecision::Claim {
                    index: survivors[0],
                    level: ResolutionLevel::Level1PayerId,
                    reason: "payment confirmed by payer identifier cross-check (level 1)"
                        .to_string(),
                };
            }
            0 => {
                // No survivor carries the declared identity; fall through to
                // the weaker levels over the original unclaimed set.
                debug!(receipt = %receipt.id.0, "level 1 produced no survivors");
            }
            _ => working = survivors,
        }
    }

    // Level 2: timestamp proximity, smallest absolute delta wins, ties kept
    // in level-1 output order.
    if let Some(paid_at) = receipt.paid_at {
        let mut best: Option<(usize, i64)> = None;
        for &index in &working {
            if let Some(booked_at) = candidates[index].booked_at {
                let delta = (booked_at - paid_at).num_minutes().abs();
                if delta <= tolerance.timestamp_window_minutes
                    && best.map(|(_, current)| delta < current).unwrap_or(true)
                {
                    best = Some((index, delta));
                }
            }
        }
        if let Some((index, delta)) = best {
            return LevelDecision::Claim {
                index,
                level: ResolutionLevel::Level2Timestamp,
                reason: format!(
                    "payment confirmed by timestamp proximity ({delta} min apart) (level 2)"
                ),
            };
        }
    }

    // Level 3: first-available ownership. Guaranteed to pick something as
    // long as any candidate is unclaimed.
    let earliest = working
        .iter()
        .copied()
        .min_by_key(|&index| candidates[index].chronological_key());
    if let Some(index) = earliest {
        return LevelDecision::Claim {
            index,
            level: ResolutionLevel::Level3Fifo,
            reason: "payment confirmed by first-available ownership (level 3)".to_string(),
        };
    }

    LevelDecision::NoCriteria
}

fn approved(
    receipt: &Receipt,
    chosen: TransactionMatch,
    level: ResolutionLevel,
    reason: String,
) -> ValidationResult {
    ValidationResult {
        receipt_id: receipt.id.clone(),
        status: DispositionStatus::Approved,
        matches: vec![chosen],
        reason,
        resolution_level: Some(level),
        requires_manual_review: false,
        fraud_flags: Vec::new(),
    }
}

fn manual_review(
    receipt: &Receipt,
    candidates: Vec<TransactionMatch>,
    reason: String,
    fraud_flags: Vec<AuditFlag>,
) -> ValidationResult {
    ValidationResult {
        receipt_id: receipt.id.clone(),
        status: DispositionStatus::ManualReview,
        matches: candidates,
        reason,
        resolution_level: Some(ResolutionLevel::Manual),
        requires_manual_review: true,
        fraud_flags,
    }
}
