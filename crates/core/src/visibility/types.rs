//! Visibility domain types.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vantage_shared::types::{TenantId, UserId};

/// One row of a tenant's organizational graph.
///
/// Values are kept raw as read from the directory: a zero or negative
/// `manager_id` means "no manager", a zero or negative `user_id` makes the
/// row inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgNode {
    /// The user this row describes.
    pub user_id: i64,
    /// The user's direct manager, if any.
    pub manager_id: Option<i64>,
}

impl OrgNode {
    /// Creates a node.
    #[must_use]
    pub const fn new(user_id: i64, manager_id: Option<i64>) -> Self {
        Self {
            user_id,
            manager_id,
        }
    }
}

/// Every user transitively reporting to a root user, root inclusive.
///
/// Immutable once computed. An empty set is only produced for an invalid root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TeamSet(BTreeSet<UserId>);

impl TeamSet {
    /// Creates an empty team.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true when `user_id` is a member.
    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        self.0.contains(&user_id)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the team has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.0.iter().copied()
    }

    /// Raw member ids in ascending order, ready for an `IN (...)` predicate.
    #[must_use]
    pub fn to_raw_ids(&self) -> Vec<i64> {
        self.0.iter().map(|id| id.get()).collect()
    }
}

impl FromIterator<UserId> for TeamSet {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Listing policy for a `(role, module)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Every record of the module is visible.
    All,
    /// Only records owned within the user's team are visible.
    #[default]
    MyTeam,
}

impl Policy {
    /// Returns the stored string form of this policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::MyTeam => "my_team",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a business module.
///
/// A valid direct `id` wins. Otherwise the module is looked up by `route`
/// or `key`, whichever matches first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRef {
    /// Direct module id.
    #[serde(default)]
    pub id: Option<i64>,
    /// Route of the module, e.g. `/inquiries`.
    #[serde(default)]
    pub route: Option<String>,
    /// Logical key of the module, e.g. `inquiries`.
    #[serde(default)]
    pub key: Option<String>,
}

impl ModuleRef {
    /// References a module by id.
    #[must_use]
    pub const fn id(id: i64) -> Self {
        Self {
            id: Some(id),
            route: None,
            key: None,
        }
    }

    /// References a module by logical key.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            id: None,
            route: None,
            key: Some(key.into()),
        }
    }

    /// References a module by route and/or key.
    #[must_use]
    pub fn lookup(route: Option<String>, key: Option<String>) -> Self {
        Self {
            id: None,
            route,
            key,
        }
    }

    /// Route with surrounding whitespace removed, `None` when blank.
    #[must_use]
    pub fn route_str(&self) -> Option<&str> {
        non_blank(self.route.as_deref())
    }

    /// Key with surrounding whitespace removed, `None` when blank.
    #[must_use]
    pub fn key_str(&self) -> Option<&str> {
        non_blank(self.key.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.id, self.route_str(), self.key_str()) {
            (Some(id), _, _) => write!(f, "module#{id}"),
            (None, Some(route), _) => write!(f, "route:{route}"),
            (None, None, Some(key)) => write!(f, "key:{key}"),
            (None, None, None) => f.write_str("module:<none>"),
        }
    }
}

/// The authenticated user a decision is made for.
///
/// Ids are raw; validation happens inside the engine so that bad ids
/// resolve to "no access" instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityUser {
    /// Tenant the request runs in.
    pub tenant_id: TenantId,
    /// Requesting user.
    pub user_id: i64,
    /// Requesting user's role.
    pub role_id: i64,
}

impl VisibilityUser {
    /// Creates a user reference.
    #[must_use]
    pub const fn new(tenant_id: TenantId, user_id: i64, role_id: i64) -> Self {
        Self {
            tenant_id,
            user_id,
            role_id,
        }
    }
}

/// Per-request visibility decision for one module.
///
/// `enforced_ids == None` means unrestricted. `Some` of an empty set means the
/// user matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityDecision {
    /// Resolved policy.
    pub policy: Policy,
    /// Owner ids the caller must restrict to.
    pub enforced_ids: Option<Arc<TeamSet>>,
}

impl VisibilityDecision {
    /// Decision for the `All` policy.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            policy: Policy::All,
            enforced_ids: None,
        }
    }

    /// `MyTeam` decision for a user that could not be resolved.
    #[must_use]
    pub fn locked_out() -> Self {
        Self {
            policy: Policy::MyTeam,
            enforced_ids: Some(Arc::new(TeamSet::empty())),
        }
    }

    /// `MyTeam` decision restricted to `team`.
    #[must_use]
    pub const fn team(team: Arc<TeamSet>) -> Self {
        Self {
            policy: Policy::MyTeam,
            enforced_ids: Some(team),
        }
    }

    /// Returns true when no filtering applies.
    #[must_use]
    pub const fn is_unrestricted(&self) -> bool {
        matches!(self.policy, Policy::All) || self.enforced_ids.is_none()
    }

    /// The enforced set, `None` when unrestricted.
    #[must_use]
    pub fn enforced_ids(&self) -> Option<&TeamSet> {
        if self.is_unrestricted() {
            None
        } else {
            self.enforced_ids.as_deref()
        }
    }

    /// Membership test shared by list filtering and single-record checks.
    #[must_use]
    pub fn allows(&self, owner: UserId) -> bool {
        self.enforced_ids().is_none_or(|team| team.contains(owner))
    }
}

/// Which record field(s) carry ownership for a module.
///
/// Paths are dotted (`linked_order.handled_by`) to reach nested associations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerFieldSpec {
    /// A single owner field.
    Field(String),
    /// Any of several owner fields; one match is enough.
    AnyOf(Vec<String>),
}

impl OwnerFieldSpec {
    /// Single owner field.
    #[must_use]
    pub fn single(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    /// OR-group of owner fields.
    #[must_use]
    pub fn any_of<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf(paths.into_iter().map(Into::into).collect())
    }

    /// The declared paths.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        match self {
            Self::Field(path) => std::slice::from_ref(path),
            Self::AnyOf(paths) => paths,
        }
    }
}
