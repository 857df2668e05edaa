//! Team computation over a manager→report graph.

use std::collections::{HashMap, HashSet, VecDeque};

use vantage_shared::types::UserId;

use super::types::{OrgNode, TeamSet};

/// Stateless resolver for transitive reporting teams.
pub struct TeamHierarchyResolver;

impl TeamHierarchyResolver {
    /// Computes the team rooted at `root_user_id`: the root plus every user
    /// reachable over manager→report edges.
    ///
    /// Breadth-first; the visited set makes cycles and self-managed rows inert.
    /// Rows with a non-positive `user_id` or `manager_id` contribute no edge.
    /// An invalid root yields an empty team.
    #[must_use]
    pub fn compute_team(root_user_id: i64, snapshot: &[OrgNode]) -> TeamSet {
        let Some(root) = UserId::new(root_user_id) else {
            return TeamSet::empty();
        };

        let reports = Self::reports_by_manager(snapshot);

        let mut visited = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(manager) = queue.pop_front() {
            let Some(children) = reports.get(&manager) else {
                continue;
            };
            for &child in children {
                if visited.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        visited.into_iter().collect()
    }

    /// Builds the `manager -> direct reports` adjacency map in one pass.
    fn reports_by_manager(snapshot: &[OrgNode]) -> HashMap<UserId, Vec<UserId>> {
        let mut reports: HashMap<UserId, Vec<UserId>> = HashMap::new();
        for node in snapshot {
            let (Some(user), Some(manager)) = (
                UserId::new(node.user_id),
                UserId::from_optional(node.manager_id),
            ) else {
                continue;
            };
            reports.entry(manager).or_default().push(user);
        }
        reports
    }
}
