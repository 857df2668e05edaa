//! Role permission repository: stored listing policies.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use vantage_core::visibility::{DirectoryError, PolicyStore};
use vantage_shared::types::{ModuleId, RoleId, TenantId};

use super::directory_error;
use crate::entities::role_module_permissions;

/// Role permission repository.
#[derive(Debug, Clone)]
pub struct RolePermissionRepository {
    db: Arc<DatabaseConnection>,
}

impl RolePermissionRepository {
    /// Creates a new role permission repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds the permission row for `(role, module)` in `tenant`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        tenant: TenantId,
        role: RoleId,
        module: ModuleId,
    ) -> Result<Option<role_module_permissions::Model>, DbErr> {
        role_module_permissions::Entity::find()
            .filter(role_module_permissions::Column::TenantId.eq(tenant.into_inner()))
            .filter(role_module_permissions::Column::RoleId.eq(role.get()))
            .filter(role_module_permissions::Column::ModuleId.eq(module.get()))
            .order_by_asc(role_module_permissions::Column::Id)
            .one(self.db.as_ref())
            .await
    }
}

#[async_trait]
impl PolicyStore for RolePermissionRepository {
    async fn listing_criteria(
        &self,
        tenant: TenantId,
        role: RoleId,
        module: ModuleId,
    ) -> Result<Option<String>, DirectoryError> {
        let row = self
            .find(tenant, role, module)
            .await
            .map_err(directory_error)?;
        Ok(row.and_then(|r| r.listing_criteria))
    }
}
