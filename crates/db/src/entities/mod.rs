//! `SeaORM` entities for the directory tables.
//!
//! These tables belong to the user directory; this crate only reads them and
//! edits manager assignments.

pub mod modules;
pub mod role_module_permissions;
pub mod users;

pub mod prelude {
    //! Entity re-exports.

    pub use super::modules::Entity as Modules;
    pub use super::role_module_permissions::Entity as RoleModulePermissions;
    pub use super::users::Entity as Users;
}
