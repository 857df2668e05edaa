//! List-query scoping from a visibility decision.
//!
//! The same [`VisibilityDecision`] a handler passes to the record guard is
//! turned into a `WHERE` fragment here, so lists and single-record checks
//! restrict to the same owners.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition};
use vantage_core::visibility::VisibilityDecision;

/// Builds the list filter for `decision` over `owner_columns`.
///
/// Returns `None` when the decision is unrestricted. An empty enforced set, or
/// a restricted decision with no owner columns, yields a condition that
/// matches nothing. Otherwise a row matches when any owner column is in the
/// enforced set.
pub fn visibility_condition<C: ColumnTrait>(
    decision: &VisibilityDecision,
    owner_columns: &[C],
) -> Option<Condition> {
    let team = decision.enforced_ids()?;
    if team.is_empty() || owner_columns.is_empty() {
        return Some(Condition::all().add(Expr::val(1).eq(0)));
    }

    let ids = team.to_raw_ids();
    let condition = owner_columns
        .iter()
        .fold(Condition::any(), |cond, column| cond.add(column.is_in(ids.clone())));
    Some(condition)
}
