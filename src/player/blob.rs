//! In-memory audio blobs addressed by opaque URLs.
//!
//! A prefetched track is registered here and bound to the media element by its
//! `BlobUrl`. The `BlobLease` returned by `acquire` owns the registration and
//! revokes it when dropped, so at most one blob stays alive per lease holder.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobUrl(String);

impl BlobUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifetime counters, mostly useful for tests and debug logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlobStats {
    pub acquired: u64,
    pub released: u64,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    blobs: HashMap<BlobUrl, Arc<[u8]>>,
    stats: BlobStats,
}

#[derive(Clone, Default)]
pub struct BlobRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` and return the lease that keeps it addressable.
    pub fn acquire(&self, data: Arc<[u8]>) -> BlobLease {
        let mut inner = self.lock();
        inner.next_id += 1;
        let url = BlobUrl(format!("blob:cadenza/{}", inner.next_id));
        debug!(url = %url, bytes = data.len(), "Blob acquired");
        inner.blobs.insert(url.clone(), data);
        inner.stats.acquired += 1;

        BlobLease {
            url,
            registry: self.clone(),
        }
    }

    /// Bytes behind `url`, or `None` once the lease has been dropped.
    pub fn resolve(&self, url: &BlobUrl) -> Option<Arc<[u8]>> {
        self.lock().blobs.get(url).cloned()
    }

    /// Number of blobs currently registered.
    pub fn live(&self) -> usize {
        self.lock().blobs.len()
    }

    pub fn stats(&self) -> BlobStats {
        self.lock().stats
    }

    fn release(&self, url: &BlobUrl) {
        let mut inner = self.lock();
        if inner.blobs.remove(url).is_some() {
            inner.stats.released += 1;
            debug!(url = %url, "Blob released");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive ownership of one registered blob.
pub struct BlobLease {
    url: BlobUrl,
    registry: BlobRegistry,
}

impl BlobLease {
    pub fn url(&self) -> &BlobUrl {
        &self.url
    }
}

impl fmt::Debug for BlobLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlobLease").field(&self.url).finish()
    }
}

impl Drop for BlobLease {
    fn drop(&mut self) {
        self.registry.release(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(s: &[u8]) -> Arc<[u8]> {
        Arc::from(s)
    }

    #[test]
    fn dropping_lease_revokes_url() {
        let registry = BlobRegistry::new();
        let lease = registry.acquire(bytes(b"abc"));
        let url = lease.url().clone();

        assert_eq!(registry.resolve(&url).as_deref(), Some(&b"abc"[..]));
        drop(lease);
        assert!(registry.resolve(&url).is_none());
        assert_eq!(
            registry.stats(),
            BlobStats {
                acquired: 1,
                released: 1
            }
        );
    }

    #[test]
    fn urls_are_unique_per_acquire() {
        let registry = BlobRegistry::new();
        let a = registry.acquire(bytes(b"a"));
        let b = registry.acquire(bytes(b"a"));
        assert_ne!(a.url(), b.url());
        assert_eq!(registry.live(), 2);
    }
}
