use std::sync::Arc;
use std::time::Duration;

use crate::config::BatchPacing;
use crate::suppliers::{
    ActivityCode, BatchCoordinator, BatchItem, CompatibilityRules, DirectoryTier,
    InMemoryDirectory, RegistrationStatus, SupplierProfile,
};

pub(super) fn profile(
    registration: &str,
    status: RegistrationStatus,
    activity_code: &str,
) -> SupplierProfile {
    SupplierProfile {
        registration: registration.to_string(),
        legal_name: format!("Fornecedor {registration} Ltda"),
        trade_name: None,
        status,
        primary_activity: ActivityCode {
            code: activity_code.to_string(),
            description: "registered activity".to_string(),
        },
        secondary_activities: Vec::new(),
        provider: "in-memory".to_string(),
        from_cache: false,
        raw: None,
    }
}

pub(super) fn item(registration: &str, service_keyword: &str) -> BatchItem {
    BatchItem {
        registration: registration.to_string(),
        service_keyword: service_keyword.to_string(),
        reference: None,
    }
}

/// Pacing with no real sleeping so tests stay fast.
pub(super) fn instant_pacing() -> BatchPacing {
    BatchPacing {
        inter_request_delay: Duration::ZERO,
        rate_limit_pause: Duration::from_millis(1),
        max_retries: 1,
        jitter: Duration::ZERO,
    }
}

pub(super) fn coordinator(
    directory: InMemoryDirectory,
) -> BatchCoordinator<InMemoryDirectory> {
    BatchCoordinator::new(
        Arc::new(directory),
        Arc::new(CompatibilityRules::default()),
        instant_pacing(),
    )
}

pub(super) fn free_directory() -> InMemoryDirectory {
    InMemoryDirectory::new(DirectoryTier::Free)
}
