//! Collaborator traits the engine reads from.
//!
//! Implementations live in the database layer; tests use in-memory stubs.

use async_trait::async_trait;
use vantage_shared::types::{ModuleId, RoleId, TenantId};

use super::error::DirectoryError;
use super::types::OrgNode;

/// Source of a tenant's manager→report relationships.
#[async_trait]
pub trait OrgDirectory: Send + Sync {
    /// Returns `{user_id, manager_id}` for every non-deleted user of `tenant`.
    async fn org_snapshot(&self, tenant: TenantId) -> Result<Vec<OrgNode>, DirectoryError>;
}

/// Source of stored listing policies.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Returns the raw `listing_criteria` stored for `(role, module)`, if a row exists.
    async fn listing_criteria(
        &self,
        tenant: TenantId,
        role: RoleId,
        module: ModuleId,
    ) -> Result<Option<String>, DirectoryError>;
}

/// Resolves logical module names to module ids.
#[async_trait]
pub trait ModuleLookup: Send + Sync {
    /// Returns the first module matching `route` OR `key`.
    async fn find_module_id(
        &self,
        tenant: TenantId,
        route: Option<&str>,
        key: Option<&str>,
    ) -> Result<Option<ModuleId>, DirectoryError>;
}
