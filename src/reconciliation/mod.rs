//! Receipt-versus-bank-statement reconciliation.
//!
//! A submitted receipt is matched against the caller-supplied transaction
//! pool under amount/date tolerance rules. A single qualifying transaction is
//! claimed directly; several qualifying transactions go through an ordered
//! tie-break cascade (payer identity, timestamp proximity, first-available
//! ownership) that consults the claim ledger so no transaction is ever
//! credited to two receipts.

pub mod cascade;
pub mod domain;
pub mod ledger;
pub mod matching;
pub mod refund;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ToleranceConfig;

pub use domain::{
    digits_only, BankTransaction, MatchConfidence, MatchType, Receipt, ReceiptId, TransactionId,
    TransactionMatch,
};
pub use ledger::{Claim, ClaimLedger, ClaimOutcome, InMemoryClaimLedger};
pub use refund::{detect_refund, RefundVerdict};

/// Terminal disposition of one reconciliation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispositionStatus {
    Approved,
    Rejected,
    ManualReview,
    TransactionAlreadyClaimed,
}

/// Which cascade level settled the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionLevel {
    SingleMatch,
    Level1PayerId,
    Level2Timestamp,
    Level3Fifo,
    Manual,
}

impl ResolutionLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionLevel::SingleMatch => "single_match",
            ResolutionLevel::Level1PayerId => "level_1_payer_id",
            ResolutionLevel::Level2Timestamp => "level_2_timestamp",
            ResolutionLevel::Level3Fifo => "level_3_fifo",
            ResolutionLevel::Manual => "manual",
        }
    }
}

/// Named fraud/risk flags accumulated while reconciling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFlag {
    TransactionClaimed,
    LowConfidence,
    AllTransactionsClaimed,
    PossibleDuplicateReceipt,
    MultipleMatches,
    NoResolutionCriteria,
    ClaimContention,
}

/// Outcome of one reconciliation attempt. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub receipt_id: ReceiptId,
    pub status: DispositionStatus,
    pub matches: Vec<TransactionMatch>,
    pub reason: String,
    pub resolution_level: Option<ResolutionLevel>,
    pub requires_manual_review: bool,
    pub fraud_flags: Vec<AuditFlag>,
}

/// Facade composing the tolerance matcher, the tie-break cascade, and the
/// claim ledger.
///
/// The matcher and cascade are pure over their inputs; the ledger is the only
/// shared state, so engines may be cloned/shared freely across concurrent
/// callers. Claims are granted only together with a terminal `Approved`
/// disposition, which keeps the ledger consistent when a caller abandons an
/// attempt before it finishes.
pub struct ReconciliationEngine<L> {
    tolerance: ToleranceConfig,
    ledger: Arc<L>,
}

impl<L: ClaimLedger> ReconciliationEngine<L> {
    pub fn new(ledger: Arc<L>, tolerance: ToleranceConfig) -> Self {
        Self { tolerance, ledger }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Reconcile one receipt against the supplied date-windowed transaction
    /// pool and return the terminal disposition.
    pub fn reconcile(
        &self,
        receipt: &Receipt,
        transactions: &[BankTransaction],
    ) -> ValidationResult {
        let mut candidates = matching::find_candidates(receipt, transactions, &self.tolerance);
        for candidate in &mut candidates {
            match self.ledger.owner_of(&candidate.transaction_id) {
                Some(owner) if owner != receipt.id => candidate.claimed_by = Some(owner),
                _ => candidate.claimed_by = None,
            }
        }

        debug!(
            receipt = %receipt.id.0,
            candidates = candidates.len(),
            "tolerance matcher produced candidate set"
        );

        let result = cascade::resolve(receipt, candidates, self.ledger.as_ref(), &self.tolerance);

        info!(
            receipt = %receipt.id.0,
            status = ?result.status,
            level = result.resolution_level.map(|level| level.label()),
            "reconciliation settled"
        );
        result
    }

    /// Undo the claim held by a rejected receipt so the transaction becomes
    /// available again. Explicit rejection is the only path that releases a
    /// claim.
    pub fn reject_receipt(&self, result: &ValidationResult) {
        if result.status != DispositionStatus::Approved {
            return;
        }
        for matched in &result.matches {
            if self.ledger.owner_of(&matched.transaction_id) == Some(result.receipt_id.clone()) {
                self.ledger.release(&matched.transaction_id);
            }
        }
    }
}
