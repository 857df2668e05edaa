//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the directory tables
//! - Repositories implementing the visibility engine's collaborator traits
//! - List-query scoping from a visibility decision

pub mod entities;
pub mod repositories;
pub mod scope;

pub use repositories::{
    ModuleRepository, RolePermissionRepository, TransactionDirectory, UserRepository,
};
pub use scope::visibility_condition;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use vantage_shared::config::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);

    Database::connect(options).await
}
