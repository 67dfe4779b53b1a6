//! Cache Module
//!
//! Expiring key-value caches with lazy eviction, explicit invalidation and an
//! optional LRU capacity bound.

mod clock;
mod entry;
pub mod keys;
mod lru;
mod stats;
mod store;


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::models::{Credentials, WorkspaceRole};

// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::TtlCache;

/// A cache instance shared between request handlers.
pub type SharedCache<T> = Arc<RwLock<TtlCache<T>>>;

// == Cache Policy ==
/// Lifetimes applied by each cache's owner when populating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub credential_ttl: Duration,
    pub token_ttl: Duration,
    pub membership_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            credential_ttl: Duration::from_secs(300),
            token_ttl: Duration::from_secs(60),
            membership_ttl: Duration::from_secs(300),
        }
    }
}

impl From<&Config> for CachePolicy {
    fn from(config: &Config) -> Self {
        Self {
            credential_ttl: Duration::from_secs(config.credential_ttl),
            token_ttl: Duration::from_secs(config.token_ttl),
            membership_ttl: Duration::from_secs(config.membership_ttl),
        }
    }
}

// == Cache Set ==
/// The three process-wide caches, each with its own key space.
#[derive(Debug, Clone)]
pub struct CacheSet {
    /// `workspaceId:provider` -> credentials
    pub credentials: SharedCache<Credentials>,
    /// bearer token -> user id
    pub tokens: SharedCache<String>,
    /// `userId:workspaceId` -> role
    pub memberships: SharedCache<WorkspaceRole>,
}

impl CacheSet {
    /// Builds unbounded caches on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), 0)
    }

    /// Builds caches reading time from `clock`, each bounded to `max_entries`
    /// (0 = unbounded).
    pub fn with_clock(clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        Self {
            credentials: shared(
                TtlCache::with_clock("credentials", clock.clone()).with_capacity_limit(max_entries),
            ),
            tokens: shared(
                TtlCache::with_clock("tokens", clock.clone()).with_capacity_limit(max_entries),
            ),
            memberships: shared(
                TtlCache::with_clock("memberships", clock).with_capacity_limit(max_entries),
            ),
        }
    }

    /// Builds the caches described by `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::with_clock(Arc::new(SystemClock), config.cache_max_entries)
    }

    /// Drops expired entries from all caches. Returns the total removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.credentials.write().await.cleanup_expired()
            + self.tokens.write().await.cleanup_expired()
            + self.memberships.write().await.cleanup_expired()
    }

    /// Empties all caches. Returns the total removed.
    pub async fn clear_all(&self) -> usize {
        self.credentials.write().await.clear()
            + self.tokens.write().await.clear()
            + self.memberships.write().await.clear()
    }
}

impl Default for CacheSet {
    fn default() -> Self {
        Self::new()
    }
}

fn shared<T>(cache: TtlCache<T>) -> SharedCache<T> {
    Arc::new(RwLock::new(cache))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_instances_are_isolated() {
        let caches = CacheSet::new();
        caches
            .tokens
            .write()
            .await
            .set("tok", "user-1".to_string(), Duration::from_secs(60));

        assert_eq!(caches.tokens.read().await.len(), 1);
        assert!(caches.memberships.read().await.is_empty());
        assert!(caches.credentials.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_cache_set_cleanup_and_clear() {
        let clock = Arc::new(ManualClock::new(0));
        let caches = CacheSet::with_clock(clock.clone(), 0);
        caches
            .tokens
            .write()
            .await
            .set("tok", "user-1".to_string(), Duration::from_secs(60));
        caches.memberships.write().await.set(
            "user-1:ws",
            WorkspaceRole::Owner,
            Duration::from_secs(300),
        );

        clock.advance(Duration::from_secs(61));
        assert_eq!(caches.cleanup_expired().await, 1);
        assert_eq!(caches.clear_all().await, 1);
        assert!(caches.memberships.read().await.is_empty());
    }

    #[test]
    fn test_policy_defaults() {
        let policy = CachePolicy::default();
        assert_eq!(policy.credential_ttl, Duration::from_secs(300));
        assert_eq!(policy.token_ttl, Duration::from_secs(60));
        assert_eq!(policy.membership_ttl, Duration::from_secs(300));
    }
}
