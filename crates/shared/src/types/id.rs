//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `RoleId` where a `UserId` is expected.
//! Directory-backed ids (users, roles, modules) are positive integers; the constructors
//! here are the single place where "positive" is checked.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a raw integer is not a valid positive id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid id {0}: must be a positive integer")]
pub struct InvalidId(pub i64);

/// Macro to generate UUID-backed typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

/// Macro to generate positive-integer typed ID wrappers.
macro_rules! positive_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Validates a raw integer, returning `None` for zero or negative values.
            #[must_use]
            pub const fn new(raw: i64) -> Option<Self> {
                if raw > 0 { Some(Self(raw)) } else { None }
            }

            /// Validates an optional raw integer.
            #[must_use]
            pub fn from_optional(raw: Option<i64>) -> Option<Self> {
                raw.and_then(Self::new)
            }

            /// Returns the raw integer value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = InvalidId;

            fn try_from(raw: i64) -> Result<Self, Self::Error> {
                Self::new(raw).ok_or(InvalidId(raw))
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.trim().parse::<i64>().map_err(|_| InvalidId(0))?;
                Self::try_from(raw)
            }
        }
    };
}

typed_id!(TenantId, "Unique identifier for a tenant organization.");

positive_id!(UserId, "Identifier of a user in the tenant's directory.");
positive_id!(RoleId, "Identifier of a role that listing policies are keyed by.");
positive_id!(ModuleId, "Identifier of a business module (inquiries, orders, leads, ...).");
