//! Hierarchical record visibility.
//!
//! Decides which rows a user may see in a module: a per-role, per-module
//! listing policy (`all` or `my_team`) combined with the user's transitive
//! reporting team.
//!
//! # Modules
//!
//! - `types` - Org nodes, team sets, policies, decisions, owner field specs
//! - `directory` - Collaborator traits (org directory, policy store, module lookup)
//! - `hierarchy` - Team computation over the manager→report graph
//! - `cache` - Tenant-keyed team memoization
//! - `policy` - Listing policy resolution
//! - `context` - Per-request decision composition
//! - `guard` - Single-record enforcement
//! - `error` - Visibility error types

pub mod cache;
pub mod context;
pub mod directory;
pub mod error;
pub mod guard;
pub mod hierarchy;
pub mod policy;
pub mod types;

#[cfg(test)]
mod hierarchy_props;
#[cfg(test)]
mod tests;

pub use cache::{TeamCache, TeamCacheKey};
pub use context::VisibilityService;
pub use directory::{ModuleLookup, OrgDirectory, PolicyStore};
pub use error::{DirectoryError, VisibilityError};
pub use guard::RecordVisibilityGuard;
pub use hierarchy::TeamHierarchyResolver;
pub use policy::{PolicyResolver, normalize_listing_criteria};
pub use types::{
    ModuleRef, OrgNode, OwnerFieldSpec, Policy, TeamSet, VisibilityDecision, VisibilityUser,
};
