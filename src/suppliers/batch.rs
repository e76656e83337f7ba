use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::BatchPacing;

use super::compatibility::{CompatibilityRules, ServiceCompatibility};
use super::directory::{DirectoryError, DirectoryTier, SupplierDirectory};
use super::domain::RiskLevel;

/// Cooperative cancellation flag shared between the batch driver and its
/// caller. Checked between items, never mid-lookup.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// One supplier lookup queued for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub registration: String,
    pub service_keyword: String,
    /// Caller-side correlation handle (expense or transaction reference).
    pub reference: Option<String>,
}

/// Final status of one audited item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchItemStatus {
    Approved,
    Rejected,
    ServiceMismatch,
    ManualReview,
}

/// Structured per-item audit outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub registration: String,
    pub reference: Option<String>,
    pub legal_name: Option<String>,
    pub registration_status: Option<String>,
    pub activity_code: Option<String>,
    pub risk: Option<RiskLevel>,
    pub compatible: Option<bool>,
    pub status: BatchItemStatus,
    pub reason: String,
    pub from_cache: bool,
}

/// Item that could not be audited at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    pub item: BatchItem,
    pub error: String,
}

/// Summary of a finished (or cancelled) batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    pub pending: usize,
    pub results: Vec<BatchItemResult>,
    pub errors: Vec<BatchError>,
}

/// Drives sequential validation of supplier lookups against the rate-limited
/// external directory.
///
/// Pacing rules: free-tier credentials get a fixed delay between items; an
/// explicit rate-limit signal triggers exponential backoff with jitter up to
/// the configured retry ceiling. Per-item failures never halt the batch, and
/// nothing here holds claim-ledger state, so a cancelled run leaves no
/// inconsistency behind.
pub struct BatchCoordinator<D> {
    directory: Arc<D>,
    rules: Arc<CompatibilityRules>,
    pacing: BatchPacing,
}

impl<D: SupplierDirectory> BatchCoordinator<D> {
    pub fn new(directory: Arc<D>, rules: Arc<CompatibilityRules>, pacing: BatchPacing) -> Self {
        Self {
            directory,
            rules,
            pacing,
        }
    }

    pub async fn process(&self, items: Vec<BatchItem>, cancel: &CancelHandle) -> BatchReport {
        let total = items.len();
        let mut results = Vec::new();
        let mut errors = Vec::new();
        let mut processed = 0usize;

        info!(total, "starting batch audit");

        for (index, item) in items.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(processed, total, "batch cancelled by caller");
                break;
            }

            match self.audit_with_retry(&item).await {
                Ok(result) => {
                    info!(
                        registration = %item.registration,
                        status = ?result.status,
                        "batch item settled"
                    );
                    results.push(result);
                    processed += 1;
                }
                Err(error) => {
                    warn!(registration = %item.registration, %error, "batch item failed");
                    errors.push(BatchError {
                        error: error.to_string(),
                        item,
                    });
                }
            }

            // Free-tier credentials allow roughly three requests per minute.
            if self.directory.tier() == DirectoryTier::Free && index + 1 < total {
                tokio::time::sleep(self.pacing.inter_request_delay).await;
            }
        }

        BatchReport {
            total,
            processed,
            pending: total - processed - errors.len(),
            results,
            errors,
        }
    }

    async fn audit_with_retry(&self, item: &BatchItem) -> Result<BatchItemResult, DirectoryError> {
        let mut attempt: u32 = 0;
        loop {
            match self.audit_item(item) {
                Ok(result) => return Ok(result),
                Err(DirectoryError::RateLimited) if attempt < self.pacing.max_retries => {
                    let pause = self.backoff_pause(attempt);
                    warn!(
                        registration = %item.registration,
                        attempt,
                        pause_ms = pause.as_millis() as u64,
                        "directory rate limit hit, backing off"
                    );
                    tokio::time::sleep(pause).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn audit_item(&self, item: &BatchItem) -> Result<BatchItemResult, DirectoryError> {
        let profile = match self.directory.lookup(&item.registration) {
            Ok(profile) => profile,
            Err(DirectoryError::NotFound { registration }) => {
                // Terminal: the registry does not know this supplier. Not a
                // batch error and never retried.
                return Ok(BatchItemResult {
                    registration: item.registration.clone(),
                    reference: item.reference.clone(),
                    legal_name: None,
                    registration_status: None,
                    activity_code: None,
                    risk: None,
                    compatible: None,
                    status: BatchItemStatus::Rejected,
                    reason: format!("registry has no record for {registration}"),
                    from_cache: false,
                });
            }
            Err(DirectoryError::Provider(detail)) => {
                // A broken provider answer must never turn into an approval.
                return Ok(BatchItemResult {
                    registration: item.registration.clone(),
                    reference: item.reference.clone(),
                    legal_name: None,
                    registration_status: None,
                    activity_code: None,
                    risk: None,
                    compatible: None,
                    status: BatchItemStatus::ManualReview,
                    reason: format!("directory provider failure: {detail}"),
                    from_cache: false,
                });
            }
            Err(other) => return Err(other),
        };

        let risk = profile.status.risk_level();
        let secondary: Vec<String> = profile
            .secondary_activities
            .iter()
            .map(|activity| activity.code.clone())
            .collect();
        let compatibility = self.rules.classify(
            &profile.primary_activity.code,
            &secondary,
            &item.service_keyword,
        );

        let (status, reason) = match (&risk, &compatibility) {
            (RiskLevel::Critical, _) => (
                BatchItemStatus::Rejected,
                format!("supplier registration is {}", profile.status.label()),
            ),
            (_, ServiceCompatibility::Incompatible(reason)) => {
                (BatchItemStatus::ServiceMismatch, reason.clone())
            }
            (_, ServiceCompatibility::Unmapped(reason)) => {
                (BatchItemStatus::ManualReview, reason.clone())
            }
            _ => (BatchItemStatus::Approved, "supplier validated".to_string()),
        };

        Ok(BatchItemResult {
            registration: profile.registration.clone(),
            reference: item.reference.clone(),
            legal_name: Some(profile.legal_name.clone()),
            registration_status: Some(profile.status.label().to_string()),
            activity_code: Some(profile.primary_activity.code.clone()),
            risk: Some(risk),
            compatible: compatibility.compatible(),
            status,
            reason,
            from_cache: profile.from_cache,
        })
    }

    /// Exponential growth with jitter, capped so a misconfigured ceiling
    /// cannot stall the batch for hours.
    fn backoff_pause(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(5);
        let base = self.pacing.rate_limit_pause.saturating_mul(factor);
        let jitter_ms = self.pacing.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        base + Duration::from_millis(jitter)
    }
}
