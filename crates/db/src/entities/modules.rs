//! `SeaORM` Entity for modules table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "modules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tenant_id: Uuid,
    pub name: String,
    pub route: Option<String>,
    pub key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_module_permissions::Entity")]
    RoleModulePermissions,
}

impl Related<super::role_module_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleModulePermissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
