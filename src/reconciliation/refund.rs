use serde::{Deserialize, Serialize};

use super::domain::{digits_only, BankTransaction};

/// Description fragments banks stamp on reversal entries.
const REFUND_KEYWORDS: [&str; 5] = [
    "ESTORNO",
    "DEVOLUCAO",
    "CANCELAMENTO",
    "REEMBOLSO",
    "ESTORNADO",
];

/// Verdict on whether an unexplained incoming credit is a refund of an
/// earlier outgoing payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundVerdict {
    pub is_refund: bool,
    pub reason: Option<String>,
}

impl RefundVerdict {
    fn yes(reason: String) -> Self {
        Self {
            is_refund: true,
            reason: Some(reason),
        }
    }

    fn no() -> Self {
        Self {
            is_refund: false,
            reason: None,
        }
    }
}

/// Classify an incoming credit against a window of prior outgoing debits.
///
/// A credit is a refund when its description carries an explicit reversal
/// keyword, or when a prior debit exists with identical absolute amount,
/// dated on or before the credit; when both sides carry a payer/receiver
/// identifier the identifiers must also agree. Pure: no ledger state is
/// touched.
pub fn detect_refund(credit: &BankTransaction, prior_debits: &[BankTransaction]) -> RefundVerdict {
    let description = credit.description.to_uppercase();
    if REFUND_KEYWORDS.iter().any(|kw| description.contains(kw)) {
        return RefundVerdict::yes("identified by reversal keyword in description".to_string());
    }

    for debit in prior_debits {
        if debit.amount_cents.abs() != credit.amount_cents.abs() {
            continue;
        }
        if debit.booked_on > credit.booked_on {
            continue;
        }
        match (&debit.payer_document, &credit.payer_document) {
            (Some(debit_doc), Some(credit_doc))
                if digits_only(debit_doc) != digits_only(credit_doc) =>
            {
                continue;
            }
            _ => {}
        }
        return RefundVerdict::yes(format!(
            "reversal of earlier debit {} ({} on {})",
            debit.id.0, debit.amount_cents, debit.booked_on
        ));
    }

    RefundVerdict::no()
}
