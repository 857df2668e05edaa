//! Per-request visibility resolution.
//!
//! One service resolves decisions for every module. List endpoints and
//! single-record endpoints of a module call [`VisibilityService::resolve`]
//! with the same [`ModuleRef`], so both paths agree by construction.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;
use vantage_shared::types::{TenantId, UserId};

use super::cache::TeamCache;
use super::directory::{ModuleLookup, OrgDirectory, PolicyStore};
use super::error::{DirectoryError, VisibilityError};
use super::hierarchy::TeamHierarchyResolver;
use super::policy::PolicyResolver;
use super::types::{ModuleRef, Policy, TeamSet, VisibilityDecision, VisibilityUser};

/// Composes policy resolution, team computation and caching.
#[derive(Clone)]
pub struct VisibilityService {
    policies: PolicyResolver,
    directory: Arc<dyn OrgDirectory>,
    cache: TeamCache,
}

impl std::fmt::Debug for VisibilityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityService")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl VisibilityService {
    /// Creates a service. The cache is injected so its lifetime is owned by the caller.
    #[must_use]
    pub fn new(
        directory: Arc<dyn OrgDirectory>,
        policy_store: Arc<dyn PolicyStore>,
        module_lookup: Arc<dyn ModuleLookup>,
        cache: TeamCache,
    ) -> Self {
        Self {
            policies: PolicyResolver::new(policy_store, module_lookup),
            directory,
            cache,
        }
    }

    /// Resolves the decision for `user` on `module`, using the team cache.
    ///
    /// Resolve once per request and reuse the decision for the list filter and
    /// any later record check in that request.
    pub async fn resolve(
        &self,
        user: &VisibilityUser,
        module: &ModuleRef,
    ) -> Result<VisibilityDecision, VisibilityError> {
        self.decide(user, module, |root| self.team_for(user.tenant_id, root))
            .await
    }

    /// Resolves the decision reading the org graph through `directory`,
    /// bypassing the cache.
    ///
    /// Use when the request already holds a transaction: the team is computed
    /// from what that transaction sees and is not stored.
    pub async fn resolve_with_directory(
        &self,
        user: &VisibilityUser,
        module: &ModuleRef,
        directory: &dyn OrgDirectory,
    ) -> Result<VisibilityDecision, VisibilityError> {
        self.decide(user, module, |root| async move {
            let snapshot = directory.org_snapshot(user.tenant_id).await?;
            let team = TeamHierarchyResolver::compute_team(root.get(), &snapshot);
            Ok::<_, DirectoryError>(Arc::new(team))
        })
        .await
    }

    /// Policy lookup, the `all` short-circuit and the invalid-subject lockout,
    /// shared by both resolution paths. `team` supplies the team of a valid root.
    async fn decide<F, Fut>(
        &self,
        user: &VisibilityUser,
        module: &ModuleRef,
        team: F,
    ) -> Result<VisibilityDecision, VisibilityError>
    where
        F: FnOnce(UserId) -> Fut,
        Fut: Future<Output = Result<Arc<TeamSet>, DirectoryError>>,
    {
        let policy = self
            .policies
            .resolve_policy(user.tenant_id, user.role_id, module)
            .await;
        if policy == Policy::All {
            return Ok(VisibilityDecision::unrestricted());
        }

        let Some(root) = UserId::new(user.user_id) else {
            debug!(
                tenant_id = %user.tenant_id,
                user_id = user.user_id,
                "Invalid user id, locking out"
            );
            return Ok(VisibilityDecision::locked_out());
        };

        Ok(VisibilityDecision::team(team(root).await?))
    }

    /// Returns the cached team of `root`, computing it from a fresh snapshot on a miss.
    pub async fn team_for(
        &self,
        tenant: TenantId,
        root: UserId,
    ) -> Result<Arc<TeamSet>, DirectoryError> {
        let directory = Arc::clone(&self.directory);
        self.cache
            .get_team(tenant, root, || async move {
                let snapshot = directory.org_snapshot(tenant).await?;
                Ok::<_, DirectoryError>(TeamHierarchyResolver::compute_team(
                    root.get(),
                    &snapshot,
                ))
            })
            .await
    }

    /// Evicts cached teams rooted at `user_id`.
    ///
    /// Call after a user's manager is set or changed, or the user is deleted.
    pub fn invalidate_user(&self, user_id: UserId) {
        debug!(user_id = %user_id, "Invalidating cached team");
        self.cache.invalidate_user(user_id);
    }

    /// Evicts cached teams rooted at any of `user_ids`.
    pub fn invalidate_users(&self, user_ids: &[UserId]) {
        debug!(count = user_ids.len(), "Invalidating cached teams");
        self.cache.invalidate_users(user_ids);
    }

    /// Evicts the cached teams of `tenant` rooted at any of `user_ids`.
    pub fn invalidate_users_in(&self, tenant: TenantId, user_ids: &[UserId]) {
        debug!(tenant_id = %tenant, count = user_ids.len(), "Invalidating cached teams");
        self.cache.invalidate_users_in(tenant, user_ids);
    }

    /// Evicts every cached team of `tenant`.
    pub fn invalidate_tenant(&self, tenant: TenantId) {
        debug!(tenant_id = %tenant, "Invalidating tenant teams");
        self.cache.invalidate_tenant(tenant);
    }

    /// Evicts all cached teams.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// The underlying cache.
    #[must_use]
    pub const fn cache(&self) -> &TeamCache {
        &self.cache
    }
}
