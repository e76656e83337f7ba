use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ReceiptId, TransactionId};

/// Record of which receipt owns a transaction and since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub receipt_id: ReceiptId,
    pub claimed_at: DateTime<Utc>,
}

/// Result of a check-and-set claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Granted,
    AlreadyOwnedBy(ReceiptId),
}

/// Exclusive-ownership ledger over bank transactions. This is the only
/// mutable shared state in the engine: claiming must be linearizable per
/// transaction identity, so that under concurrent callers exactly one claim
/// for a given transaction succeeds and the rest observe the existing owner.
///
/// A claim is released only by explicit rejection of its owning receipt,
/// never by overwrite.
pub trait ClaimLedger: Send + Sync {
    fn try_claim(&self, transaction_id: &TransactionId, receipt_id: &ReceiptId) -> ClaimOutcome;
    fn release(&self, transaction_id: &TransactionId);
    fn owner_of(&self, transaction_id: &TransactionId) -> Option<ReceiptId>;
}

/// Process-local ledger backed by a mutex-guarded map. The storage
/// collaborator supplies a durable equivalent behind the same trait when
/// claims must outlive the process.
#[derive(Debug, Default)]
pub struct InMemoryClaimLedger {
    claims: Mutex<HashMap<TransactionId, Claim>>,
}

impl InMemoryClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim_count(&self) -> usize {
        self.claims.lock().expect("ledger mutex poisoned").len()
    }
}

impl ClaimLedger for InMemoryClaimLedger {
    fn try_claim(&self, transaction_id: &TransactionId, receipt_id: &ReceiptId) -> ClaimOutcome {
        let mut claims = self.claims.lock().expect("ledger mutex poisoned");
        match claims.get(transaction_id) {
            Some(existing) if existing.receipt_id != *receipt_id => {
                ClaimOutcome::AlreadyOwnedBy(existing.receipt_id.clone())
            }
            Some(_) => ClaimOutcome::Granted,
            None => {
                claims.insert(
                    transaction_id.clone(),
                    Claim {
                        receipt_id: receipt_id.clone(),
                        claimed_at: Utc::now(),
                    },
                );
                ClaimOutcome::Granted
            }
        }
    }

    fn release(&self, transaction_id: &TransactionId) {
        let mut claims = self.claims.lock().expect("ledger mutex poisoned");
        claims.remove(transaction_id);
    }

    fn owner_of(&self, transaction_id: &TransactionId) -> Option<ReceiptId> {
        let claims = self.claims.lock().expect("ledger mutex poisoned");
        claims
            .get(transaction_id)
            .map(|claim| claim.receipt_id.clone())
    }
}
