use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::directory::{DirectoryError, DirectoryTier, SupplierDirectory};
use super::domain::SupplierProfile;

#[derive(Debug, Clone)]
struct CacheEntry {
    profile: SupplierProfile,
    cached_at: DateTime<Utc>,
}

/// Injected, explicitly-owned profile cache. Registry data is slow-moving,
/// so entries stay valid for 30 days by default; expired entries are dropped
/// on read.
#[derive(Debug)]
pub struct ProfileCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::with_ttl(Duration::days(30))
    }
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, registration: &str) -> Option<SupplierProfile> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(registration) {
            Some(entry) if Utc::now() - entry.cached_at < self.ttl => {
                Some(entry.profile.clone())
            }
            Some(_) => {
                entries.remove(registration);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, profile: SupplierProfile) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            profile.registration.clone(),
            CacheEntry {
                profile,
                cached_at: Utc::now(),
            },
        );
    }

    /// Drop one registration, or everything when `registration` is `None`.
    pub fn invalidate(&self, registration: Option<&str>) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match registration {
            Some(registration) => {
                entries.remove(registration);
            }
            None => entries.clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Directory decorator that consults the cache before the wrapped provider
/// and records fresh lookups back into it. Served copies are marked
/// `from_cache` so audit trails can tell the difference.
pub struct CachedDirectory<D> {
    inner: D,
    cache: Arc<ProfileCache>,
}

impl<D: SupplierDirectory> CachedDirectory<D> {
    pub fn new(inner: D, cache: Arc<ProfileCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<ProfileCache> {
        &self.cache
    }
}

impl<D: SupplierDirectory> SupplierDirectory for CachedDirectory<D> {
    fn lookup(&self, registration: &str) -> Result<SupplierProfile, DirectoryError> {
        if let Some(mut profile) = self.cache.get(registration) {
            debug!(registration, "profile cache hit");
            profile.from_cache = true;
            return Ok(profile);
        }

        let profile = self.inner.lookup(registration)?;
        self.cache.put(profile.clone());
        Ok(profile)
    }

    fn tier(&self) -> DirectoryTier {
        self.inner.tier()
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}
