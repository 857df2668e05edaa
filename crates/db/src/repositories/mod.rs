//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations and
//! implement the visibility engine's collaborator traits.

pub mod module;
pub mod role_permission;
pub mod user;

pub use module::ModuleRepository;
pub use role_permission::RolePermissionRepository;
pub use user::{TransactionDirectory, USER_OWNER_COLUMNS, UserRepository};

use sea_orm::DbErr;
use vantage_core::visibility::DirectoryError;

/// Maps a database error onto the engine's directory error.
pub(crate) fn directory_error(err: DbErr) -> DirectoryError {
    DirectoryError::Read(err.to_string())
}
