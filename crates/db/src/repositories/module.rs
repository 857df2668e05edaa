//! Module repository: resolves logical module names to ids.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use vantage_core::visibility::{DirectoryError, ModuleLookup};
use vantage_shared::types::{ModuleId, TenantId};

use super::directory_error;
use crate::entities::modules;

/// Module repository.
#[derive(Debug, Clone)]
pub struct ModuleRepository {
    db: Arc<DatabaseConnection>,
}

impl ModuleRepository {
    /// Creates a new module repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds the first module of `tenant` whose route or key matches.
    ///
    /// Blank values are ignored. Returns `None` without querying when neither
    /// value is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_route_or_key(
        &self,
        tenant: TenantId,
        route: Option<&str>,
        key: Option<&str>,
    ) -> Result<Option<modules::Model>, DbErr> {
        let route = route.map(str::trim).filter(|r| !r.is_empty());
        let key = key.map(str::trim).filter(|k| !k.is_empty());

        let mut matches = Condition::any();
        if let Some(route) = route {
            matches = matches.add(modules::Column::Route.eq(route));
        }
        if let Some(key) = key {
            matches = matches.add(modules::Column::Key.eq(key));
        }
        if matches.is_empty() {
            return Ok(None);
        }

        modules::Entity::find()
            .filter(modules::Column::TenantId.eq(tenant.into_inner()))
            .filter(matches)
            .order_by_asc(modules::Column::Id)
            .one(self.db.as_ref())
            .await
    }
}

#[async_trait]
impl ModuleLookup for ModuleRepository {
    async fn find_module_id(
        &self,
        tenant: TenantId,
        route: Option<&str>,
        key: Option<&str>,
    ) -> Result<Option<ModuleId>, DirectoryError> {
        let found = self
            .find_by_route_or_key(tenant, route, key)
            .await
            .map_err(directory_error)?;
        Ok(found.and_then(|m| ModuleId::new(m.id)))
    }
}
