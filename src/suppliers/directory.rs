use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::reconciliation::digits_only;

use super::domain::SupplierProfile;

/// Typed lookup failures. Callers inspect the kind to choose between retry,
/// terminal rejection, and degrade-to-manual-review; none of these is used
/// as control flow inside the directory itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("registry has no record for {registration}")]
    NotFound { registration: String },
    #[error("directory rate limit reached")]
    RateLimited,
    #[error("directory provider failure: {0}")]
    Provider(String),
}

/// Whether the credential in use is throttled by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryTier {
    /// Free credentials are limited to a few requests per minute; the batch
    /// coordinator paces itself accordingly.
    Free,
    Paid,
}

/// Port to the external supplier registry. Concrete variants are selected at
/// construction time: an HTTP provider in the services that own network I/O,
/// or [`InMemoryDirectory`] for tests and offline audits.
pub trait SupplierDirectory: Send + Sync {
    fn lookup(&self, registration: &str) -> Result<SupplierProfile, DirectoryError>;
    fn tier(&self) -> DirectoryTier;
    fn provider_name(&self) -> &str;
}

/// Scriptable in-memory directory variant.
#[derive(Debug)]
pub struct InMemoryDirectory {
    tier: DirectoryTier,
    profiles: Mutex<HashMap<String, SupplierProfile>>,
    scripted_failures: Mutex<HashMap<String, VecDeque<DirectoryError>>>,
}

impl InMemoryDirectory {
    pub fn new(tier: DirectoryTier) -> Self {
        Self {
            tier,
            profiles: Mutex::new(HashMap::new()),
            scripted_failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, profile: SupplierProfile) {
        let mut profiles = self.profiles.lock().expect("directory mutex poisoned");
        profiles.insert(profile.registration.clone(), profile);
    }

    /// Queue an error for the next lookup of `registration`; subsequent
    /// lookups fall through to the stored profile. Lets tests exercise
    /// rate-limit retries and provider failures deterministically.
    pub fn script_failure(&self, registration: &str, error: DirectoryError) {
        let mut scripted = self
            .scripted_failures
            .lock()
            .expect("directory mutex poisoned");
        scripted
            .entry(digits_only(registration))
            .or_default()
            .push_back(error);
    }
}

impl SupplierDirectory for InMemoryDirectory {
    fn lookup(&self, registration: &str) -> Result<SupplierProfile, DirectoryError> {
        let cleaned = digits_only(registration);

        {
            let mut scripted = self
                .scripted_failures
                .lock()
                .expect("directory mutex poisoned");
            if let Some(queue) = scripted.get_mut(&cleaned) {
                if let Some(error) = queue.pop_front() {
                    return Err(error);
                }
            }
        }

        let profiles = self.profiles.lock().expect("directory mutex poisoned");
        profiles
            .get(&cleaned)
            .cloned()
            .ok_or(DirectoryError::NotFound {
                registration: cleaned,
            })
    }

    fn tier(&self) -> DirectoryTier {
        self.tier
    }

    fn provider_name(&self) -> &str {
        "in-memory"
    }
}
