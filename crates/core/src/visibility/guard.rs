//! Single-record visibility enforcement.
//!
//! Runs after a record has been loaded for a read, update or delete, using the
//! same decision the module's list endpoint filters with.

use serde::Serialize;
use serde_json::Value;
use vantage_shared::types::UserId;

use super::error::VisibilityError;
use super::types::{OwnerFieldSpec, VisibilityDecision};

/// Stateless guard for already-fetched records.
pub struct RecordVisibilityGuard;

impl RecordVisibilityGuard {
    /// Checks that `record` is visible under `decision`.
    ///
    /// Unrestricted decisions pass without looking at the record. An empty
    /// enforced set always fails. Otherwise at least one owner value named by
    /// `owner` must be in the enforced set.
    ///
    /// # Errors
    ///
    /// Returns [`VisibilityError::Forbidden`] when the record is out of scope.
    pub fn assert_visible(
        record: &Value,
        decision: &VisibilityDecision,
        owner: &OwnerFieldSpec,
    ) -> Result<(), VisibilityError> {
        let Some(team) = decision.enforced_ids() else {
            return Ok(());
        };
        if team.is_empty() {
            return Err(VisibilityError::Forbidden);
        }

        if Self::owner_ids(record, owner).any(|id| team.contains(id)) {
            Ok(())
        } else {
            Err(VisibilityError::Forbidden)
        }
    }

    /// Serializes `record` and checks it with [`Self::assert_visible`].
    ///
    /// A record that cannot be serialized has no readable owner and is forbidden
    /// under a restricted decision.
    ///
    /// # Errors
    ///
    /// Returns [`VisibilityError::Forbidden`] when the record is out of scope.
    pub fn assert_visible_record<R: Serialize>(
        record: &R,
        decision: &VisibilityDecision,
        owner: &OwnerFieldSpec,
    ) -> Result<(), VisibilityError> {
        if decision.is_unrestricted() {
            return Ok(());
        }
        let value = serde_json::to_value(record).unwrap_or(Value::Null);
        Self::assert_visible(&value, decision, owner)
    }

    /// Owner ids found on `record` at the paths declared by `owner`.
    pub fn owner_ids<'a>(
        record: &'a Value,
        owner: &'a OwnerFieldSpec,
    ) -> impl Iterator<Item = UserId> + 'a {
        owner
            .paths()
            .iter()
            .filter_map(move |path| lookup_path(record, path))
            .filter_map(coerce_owner_id)
    }
}

/// Follows a dotted path through nested objects.
fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |current, segment| current.as_object()?.get(segment))
}

/// Integers and base-10 integer strings are owner ids; anything else is not.
fn coerce_owner_id(value: &Value) -> Option<UserId> {
    let raw = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    UserId::new(raw)
}
