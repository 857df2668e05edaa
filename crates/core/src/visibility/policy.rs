//! Listing policy resolution.
//!
//! Every path that cannot produce an explicit, valid `"all"` row ends in
//! [`Policy::MyTeam`].

use std::sync::Arc;

use tracing::{debug, warn};
use vantage_shared::types::{ModuleId, RoleId, TenantId};

use super::directory::{ModuleLookup, PolicyStore};
use super::types::{ModuleRef, Policy};

/// Interprets a stored `listing_criteria` value.
///
/// Only `"all"` (trimmed, case-insensitive) grants [`Policy::All`]. This is the
/// only function that reads the stored string.
#[must_use]
pub fn normalize_listing_criteria(raw: Option<&str>) -> Policy {
    match raw {
        Some(value) if value.trim().eq_ignore_ascii_case("all") => Policy::All,
        _ => Policy::MyTeam,
    }
}

/// Resolves the listing policy of a role for a module.
#[derive(Clone)]
pub struct PolicyResolver {
    store: Arc<dyn PolicyStore>,
    modules: Arc<dyn ModuleLookup>,
}

impl std::fmt::Debug for PolicyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyResolver").finish_non_exhaustive()
    }
}

impl PolicyResolver {
    /// Creates a resolver over a policy store and module lookup.
    #[must_use]
    pub fn new(store: Arc<dyn PolicyStore>, modules: Arc<dyn ModuleLookup>) -> Self {
        Self { store, modules }
    }

    /// Returns the policy for `role_id` on `module`.
    ///
    /// Invalid roles, unresolvable modules, missing rows and store failures
    /// all resolve to [`Policy::MyTeam`].
    pub async fn resolve_policy(
        &self,
        tenant: TenantId,
        role_id: i64,
        module: &ModuleRef,
    ) -> Policy {
        let Some(role) = RoleId::new(role_id) else {
            debug!(tenant_id = %tenant, role_id, "Invalid role id, defaulting to my_team");
            return Policy::MyTeam;
        };

        let Some(module_id) = self.resolve_module(tenant, module).await else {
            debug!(tenant_id = %tenant, module = %module, "Unknown module, defaulting to my_team");
            return Policy::MyTeam;
        };

        match self.store.listing_criteria(tenant, role, module_id).await {
            Ok(raw) => {
                let policy = normalize_listing_criteria(raw.as_deref());
                debug!(
                    tenant_id = %tenant,
                    role_id = %role,
                    module_id = %module_id,
                    policy = %policy,
                    "Resolved listing policy"
                );
                policy
            }
            Err(e) => {
                warn!(
                    tenant_id = %tenant,
                    role_id = %role,
                    module_id = %module_id,
                    error = %e,
                    "Policy store unavailable, defaulting to my_team"
                );
                Policy::MyTeam
            }
        }
    }

    /// Resolves a module reference to a concrete id. A valid direct id wins.
    async fn resolve_module(&self, tenant: TenantId, module: &ModuleRef) -> Option<ModuleId> {
        if let Some(id) = ModuleId::from_optional(module.id) {
            return Some(id);
        }

        let route = module.route_str();
        let key = module.key_str();
        if route.is_none() && key.is_none() {
            return None;
        }

        match self.modules.find_module_id(tenant, route, key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(tenant_id = %tenant, module = %module, error = %e, "Module lookup failed");
                None
            }
        }
    }
}
