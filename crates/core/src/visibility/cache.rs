//! Team set caching using Moka.
//!
//! Memoizes `(tenant, root user) -> team` so repeated list and single-record
//! reads do not re-walk the organizational graph. Entries never expire by
//! time; they leave the cache through explicit invalidation or capacity
//! eviction.
//!
//! The cache is advisory. A failed computation stores nothing, and two
//! requests missing the same key may both compute and insert it; the value
//! is deterministic so the duplicate work is harmless.
//!
//! Every invalidation bumps a generation counter. A computation that saw the
//! counter move while it was reading the org graph returns its team to the
//! caller but does not store it, so an edit committed mid-computation is not
//! masked by a pre-edit snapshot.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::future::Cache;
use tracing::{debug, warn};
use vantage_shared::types::{TenantId, UserId};

use super::types::TeamSet;

/// Default cache capacity (number of team sets).
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Cache key. The tenant is part of the key, so numerically equal user ids in
/// different tenants never share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TeamCacheKey {
    /// Tenant the team belongs to.
    pub tenant_id: TenantId,
    /// Root of the team.
    pub root_user_id: UserId,
}

impl TeamCacheKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(tenant_id: TenantId, root_user_id: UserId) -> Self {
        Self {
            tenant_id,
            root_user_id,
        }
    }
}

impl fmt::Display for TeamCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tenant_id, self.root_user_id)
    }
}

/// Process-wide team cache.
///
/// Cloning is cheap and clones share the same storage. Construct once at
/// startup and hand it to the request layer.
#[derive(Clone)]
pub struct TeamCache {
    cache: Cache<TeamCacheKey, Arc<TeamSet>>,
    generation: Arc<AtomicU64>,
}

impl fmt::Debug for TeamCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl TeamCache {
    /// Creates a cache with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache holding at most `max_capacity` team sets.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .support_invalidation_closures()
            .build();

        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the cached team for `(tenant_id, root_user_id)`, computing and
    /// storing it on a miss.
    ///
    /// If `compute` fails, the error is returned and nothing is stored. If any
    /// invalidation runs while `compute` is in flight, the computed team is
    /// returned but not stored.
    pub async fn get_team<F, Fut, E>(
        &self,
        tenant_id: TenantId,
        root_user_id: UserId,
        compute: F,
    ) -> Result<Arc<TeamSet>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TeamSet, E>>,
    {
        let key = TeamCacheKey::new(tenant_id, root_user_id);

        if let Some(team) = self.cache.get(&key).await {
            debug!(key = %key, size = team.len(), "Team cache hit");
            return Ok(team);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let team = Arc::new(compute().await?);
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(key = %key, "Team cache invalidated during computation, not storing");
            return Ok(team);
        }

        debug!(key = %key, size = team.len(), "Team cache miss, storing computed team");
        self.cache.insert(key, Arc::clone(&team)).await;
        if self.generation.load(Ordering::Acquire) != generation {
            // An invalidation raced the insert.
            self.cache.invalidate(&key).await;
        }

        Ok(team)
    }

    /// Returns the cached team without computing it.
    pub async fn peek(&self, tenant_id: TenantId, root_user_id: UserId) -> Option<Arc<TeamSet>> {
        self.cache
            .get(&TeamCacheKey::new(tenant_id, root_user_id))
            .await
    }

    /// Evicts every entry rooted at `user_id`, in every tenant.
    ///
    /// Entries of other roots whose team contains `user_id` are kept.
    pub fn invalidate_user(&self, user_id: UserId) {
        self.invalidate_where("user", move |key| key.root_user_id == user_id);
    }

    /// Evicts every entry rooted at any of `user_ids`.
    pub fn invalidate_users(&self, user_ids: &[UserId]) {
        if user_ids.is_empty() {
            return;
        }
        let roots: HashSet<UserId> = user_ids.iter().copied().collect();
        self.invalidate_where("users", move |key| roots.contains(&key.root_user_id));
    }

    /// Evicts the entries of `tenant` rooted at any of `user_ids`.
    pub fn invalidate_users_in(&self, tenant_id: TenantId, user_ids: &[UserId]) {
        if user_ids.is_empty() {
            return;
        }
        let roots: HashSet<UserId> = user_ids.iter().copied().collect();
        self.invalidate_where("tenant_users", move |key| {
            key.tenant_id == tenant_id && roots.contains(&key.root_user_id)
        });
    }

    /// Evicts every entry of one tenant.
    pub fn invalidate_tenant(&self, tenant_id: TenantId) {
        self.invalidate_where("tenant", move |key| key.tenant_id == tenant_id);
    }

    /// Evicts all entries.
    pub fn clear(&self) {
        self.bump_generation();
        self.cache.invalidate_all();
    }

    /// Returns the number of entries currently in the cache.
    ///
    /// Eventually consistent; call [`Self::run_pending_tasks`] first for an exact count.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending cache maintenance (evictions, invalidation predicates).
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    fn invalidate_where<P>(&self, scope: &'static str, predicate: P)
    where
        P: Fn(&TeamCacheKey) -> bool + Send + Sync + 'static,
    {
        self.bump_generation();
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |key, _team| predicate(key))
        {
            // Only reachable if closures were not enabled at build time.
            warn!(
                scope,
                error = %e,
                "Selective invalidation unavailable, clearing team cache"
            );
            self.cache.invalidate_all();
        }
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for TeamCache {
    fn default() -> Self {
        Self::new()
    }
}
