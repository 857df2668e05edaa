//! Property-based tests for TeamHierarchyResolver.
//!
//! Graphs are drawn from a small id range so cycles, self-managed rows,
//! duplicate rows and invalid ids show up often.

use std::collections::HashSet;

use proptest::prelude::*;
use vantage_shared::types::UserId;

use crate::visibility::hierarchy::TeamHierarchyResolver;
use crate::visibility::types::OrgNode;

/// Strategy for raw ids, including zero and negatives.
fn arb_raw_id() -> impl Strategy<Value = i64> {
    prop_oneof![
        8 => 1i64..=20,
        1 => Just(0i64),
        1 => -5i64..0,
    ]
}

/// Strategy for an org snapshot of up to 40 rows.
fn arb_snapshot() -> impl Strategy<Value = Vec<OrgNode>> {
    prop::collection::vec(
        (arb_raw_id(), prop::option::of(arb_raw_id())).prop_map(|(u, m)| OrgNode::new(u, m)),
        0..40,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any graph, cyclic or not: the team is finite and contains a valid root.
    #[test]
    fn prop_team_contains_valid_root(snapshot in arb_snapshot(), root in 1i64..=20) {
        let team = TeamHierarchyResolver::compute_team(root, &snapshot);
        prop_assert!(team.contains(UserId::new(root).unwrap()));
        prop_assert!(team.len() <= snapshot.len() + 1);
    }

    /// Invalid roots never see anything.
    #[test]
    fn prop_invalid_root_is_empty(snapshot in arb_snapshot(), root in -10i64..=0) {
        prop_assert!(TeamHierarchyResolver::compute_team(root, &snapshot).is_empty());
    }

    /// Closure: whenever a member manages someone, that report is a member too.
    #[test]
    fn prop_team_closed_under_reports(snapshot in arb_snapshot(), root in 1i64..=20) {
        let team = TeamHierarchyResolver::compute_team(root, &snapshot);
        for node in &snapshot {
            let (Some(user), Some(manager)) =
                (UserId::new(node.user_id), UserId::from_optional(node.manager_id))
            else {
                continue;
            };
            if team.contains(manager) {
                prop_assert!(team.contains(user));
            }
        }
    }

    /// Every non-root member got there through a valid row of the snapshot.
    #[test]
    fn prop_members_come_from_snapshot(snapshot in arb_snapshot(), root in 1i64..=20) {
        let team = TeamHierarchyResolver::compute_team(root, &snapshot);
        let reporting: HashSet<i64> = snapshot
            .iter()
            .filter(|n| n.user_id > 0 && n.manager_id.is_some_and(|m| m > 0))
            .map(|n| n.user_id)
            .collect();
        for member in team.iter() {
            prop_assert!(member.get() == root || reporting.contains(&member.get()));
        }
    }

    /// Row order does not change the result.
    #[test]
    fn prop_order_independent(snapshot in arb_snapshot(), root in 1i64..=20) {
        let mut reversed = snapshot.clone();
        reversed.reverse();
        prop_assert_eq!(
            TeamHierarchyResolver::compute_team(root, &snapshot),
            TeamHierarchyResolver::compute_team(root, &reversed)
        );
    }
}
