use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::ToleranceConfig;
use crate::reconciliation::domain::{BankTransaction, Receipt, ReceiptId, TransactionId};
use crate::reconciliation::{InMemoryClaimLedger, ReconciliationEngine};

pub(super) fn engine() -> ReconciliationEngine<InMemoryClaimLedger> {
    ReconciliationEngine::new(Arc::new(InMemoryClaimLedger::new()), ToleranceConfig::default())
}

pub(super) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).expect("valid date")
}

pub(super) fn at(d: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    day(d)
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
        .and_utc()
}

pub(super) fn receipt(id: &str, amount_cents: i64, paid_on_day: u32) -> Receipt {
    Receipt {
        id: ReceiptId(id.to_string()),
        amount_cents,
        paid_on: day(paid_on_day),
        paid_at: None,
        payer_document: None,
    }
}

pub(super) fn transaction(id: &str, amount_cents: i64, booked_day: u32) -> BankTransaction {
    BankTransaction {
        id: TransactionId(id.to_string()),
        amount_cents,
        booked_on: day(booked_day),
        booked_at: None,
        payer_document: None,
        description: "PAGAMENTO CONDOMINIO".to_string(),
    }
}

pub(super) fn with_payer(mut tx: BankTransaction, payer: &str) -> BankTransaction {
    tx.payer_document = Some(payer.to_string());
    tx
}

pub(super) fn with_timestamp(
    mut tx: BankTransaction,
    hour: u32,
    minute: u32,
) -> BankTransaction {
    tx.booked_at = Some(
        tx.booked_on
            .and_hms_opt(hour, minute, 0)
            .expect("valid time")
            .and_utc(),
    );
    tx
}
