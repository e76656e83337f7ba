//! Supplier legitimacy auditing.
//!
//! A supplier profile fetched from the external registry is judged on two
//! axes: whether its registration is still in good standing, and whether its
//! registered business activity is compatible with the service the
//! condominium paid it for. The batch coordinator drives many such lookups
//! against the rate-limited directory.

pub mod batch;
pub mod cache;
pub mod compatibility;
pub mod directory;
pub mod domain;

#[cfg(test)]
mod tests;

pub use batch::{
    BatchCoordinator, BatchError, BatchItem, BatchItemResult, BatchItemStatus, BatchReport,
    CancelHandle,
};
pub use cache::{CachedDirectory, ProfileCache};
pub use compatibility::{normalize_keyword, CompatibilityRules, ServiceCompatibility};
pub use directory::{DirectoryError, DirectoryTier, InMemoryDirectory, SupplierDirectory};
pub use domain::{ActivityCode, RegistrationStatus, RiskLevel, SupplierProfile};
