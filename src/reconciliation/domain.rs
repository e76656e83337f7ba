use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted payment receipts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptId(pub String);

/// Identifier wrapper for bank transactions supplied by the bank-data
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

/// The claim a resident or supplier makes when submitting a receipt: what they
/// say they paid, when, and on whose behalf. Amounts are integer centavos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub amount_cents: i64,
    pub paid_on: NaiveDate,
    /// Precise payment timestamp when the receipt carries one; unlocks the
    /// timestamp tie-break level.
    pub paid_at: Option<DateTime<Utc>>,
    /// Declared payer CPF/CNPJ, formatted or not.
    pub payer_document: Option<String>,
}

/// Normalized bank transaction as delivered by the bank-data collaborator.
/// Sign conventions are the collaborator's problem; amounts arrive positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: TransactionId,
    pub amount_cents: i64,
    pub booked_on: NaiveDate,
    pub booked_at: Option<DateTime<Utc>>,
    pub payer_document: Option<String>,
    pub description: String,
}

/// How a candidate transaction satisfied the tolerance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    FeeAdjusted,
}

impl MatchType {
    pub fn label(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::FeeAdjusted => "fee-adjusted",
        }
    }
}

/// Confidence tier attached to a candidate match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    High,
    Medium,
    Low,
}

/// Candidate pairing of a receipt with one bank transaction. Ephemeral:
/// computed per reconciliation attempt and carried inside the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMatch {
    pub transaction_id: TransactionId,
    pub amount_cents: i64,
    pub booked_on: NaiveDate,
    pub booked_at: Option<DateTime<Utc>>,
    pub payer_document: Option<String>,
    pub description: String,
    pub score: u8,
    pub match_type: MatchType,
    pub confidence: MatchConfidence,
    /// Fee the payer absorbed when the match is fee-adjusted.
    pub fee_detected_cents: Option<i64>,
    /// Present when the ledger already records an owner for this transaction.
    pub claimed_by: Option<ReceiptId>,
}

impl TransactionMatch {
    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    /// Chronological key used by the FIFO tie-break: the precise timestamp
    /// when present, otherwise midnight of the booking date.
    pub fn chronological_key(&self) -> DateTime<Utc> {
        self.booked_at.unwrap_or_else(|| {
            self.booked_on
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always valid")
                .and_utc()
        })
    }
}

/// Strip CPF/CNPJ formatting down to digits for identity comparison.
pub fn digits_only(document: &str) -> String {
    document.chars().filter(|c| c.is_ascii_digit()).collect()
}
