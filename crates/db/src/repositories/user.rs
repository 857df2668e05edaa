//! User repository for directory reads and manager edits.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use tracing::debug;
use vantage_core::visibility::{DirectoryError, OrgDirectory, OrgNode, VisibilityDecision};
use vantage_shared::types::{TenantId, UserId};

use super::directory_error;
use crate::entities::users;
use crate::scope::visibility_condition;

/// Owner columns of the users listing: a user record is owned by itself.
pub const USER_OWNER_COLUMNS: [users::Column; 1] = [users::Column::Id];

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a non-deleted user of `tenant` by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        tenant: TenantId,
        id: UserId,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.get())
            .filter(users::Column::TenantId.eq(tenant.into_inner()))
            .filter(users::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
    }

    /// Lists the non-deleted users of `tenant` visible under `decision`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_scoped(
        &self,
        tenant: TenantId,
        decision: &VisibilityDecision,
    ) -> Result<Vec<users::Model>, DbErr> {
        let mut query = users::Entity::find()
            .filter(users::Column::TenantId.eq(tenant.into_inner()))
            .filter(users::Column::DeletedAt.is_null());
        if let Some(condition) = visibility_condition(decision, &USER_OWNER_COLUMNS) {
            query = query.filter(condition);
        }

        query.order_by_asc(users::Column::Id).all(self.db.as_ref()).await
    }

    /// Sets or clears the manager of a user.
    ///
    /// Returns `None` if the user does not exist in `tenant`. Callers must
    /// invalidate the user's cached team afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query or update fails.
    pub async fn update_manager(
        &self,
        tenant: TenantId,
        id: UserId,
        manager_id: Option<UserId>,
    ) -> Result<Option<users::Model>, DbErr> {
        let Some(user) = self.find_by_id(tenant, id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.manager_id = Set(manager_id.map(UserId::get));
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(self.db.as_ref()).await?;
        debug!(
            tenant_id = %tenant,
            user_id = %id,
            manager_id = ?updated.manager_id,
            "Updated manager"
        );
        Ok(Some(updated))
    }

    /// Soft-deletes a user. Returns `false` if no live user matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn soft_delete(&self, tenant: TenantId, id: UserId) -> Result<bool, DbErr> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let result = users::Entity::update_many()
            .col_expr(users::Column::DeletedAt, Expr::value(now))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(id.get()))
            .filter(users::Column::TenantId.eq(tenant.into_inner()))
            .filter(users::Column::DeletedAt.is_null())
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }
}

/// The two columns of a user row the org graph needs.
#[derive(Debug, FromQueryResult)]
struct OrgRow {
    id: i64,
    manager_id: Option<i64>,
}

/// Reads `{id, manager_id}` of every live user of `tenant` through `conn`.
async fn org_snapshot_on<C: ConnectionTrait>(
    conn: &C,
    tenant: TenantId,
) -> Result<Vec<OrgNode>, DbErr> {
    let rows = users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::ManagerId)
        .filter(users::Column::TenantId.eq(tenant.into_inner()))
        .filter(users::Column::DeletedAt.is_null())
        .order_by_asc(users::Column::Id)
        .into_model::<OrgRow>()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| OrgNode::new(row.id, row.manager_id))
        .collect())
}

#[async_trait]
impl OrgDirectory for UserRepository {
    async fn org_snapshot(&self, tenant: TenantId) -> Result<Vec<OrgNode>, DirectoryError> {
        let nodes = org_snapshot_on(self.db.as_ref(), tenant)
            .await
            .map_err(directory_error)?;
        debug!(tenant_id = %tenant, rows = nodes.len(), "Read org snapshot");
        Ok(nodes)
    }
}

/// Org directory reading through a caller-owned transaction.
///
/// Pair with `VisibilityService::resolve_with_directory` so the team reflects
/// what the transaction sees.
pub struct TransactionDirectory<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionDirectory<'a> {
    /// Wraps an open transaction.
    #[must_use]
    pub const fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl OrgDirectory for TransactionDirectory<'_> {
    async fn org_snapshot(&self, tenant: TenantId) -> Result<Vec<OrgNode>, DirectoryError> {
        org_snapshot_on(self.txn, tenant)
            .await
            .map_err(directory_error)
    }
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
