//! Reconciliation and risk-decision engine for condominium expenditure
//! auditing.
//!
//! The crate decides, for each submitted payment receipt, whether it
//! corresponds to a real bank transaction (and which one, when several
//! qualify), whether the document itself shows tampering signals, and whether
//! the supplier's registered business activity is compatible with the service
//! it was paid for. HTTP, persistence, OCR, and bank-data retrieval live in
//! collaborating services; this crate owns only the decision logic.

pub mod config;
pub mod fraud;
pub mod reconciliation;
pub mod suppliers;
pub mod telemetry;
