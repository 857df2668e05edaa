//! Scenario tests for the visibility engine with in-memory collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use vantage_shared::types::{ModuleId, RoleId, TenantId, UserId};

use super::*;

// ============================================================================
// Stub collaborators
// ============================================================================

#[derive(Default)]
struct StubDirectory {
    graphs: Mutex<HashMap<TenantId, Vec<OrgNode>>>,
    reads: AtomicUsize,
    failing: AtomicBool,
}

impl StubDirectory {
    fn with_graph(tenant: TenantId, rows: &[(i64, Option<i64>)]) -> Self {
        let directory = Self::default();
        directory.set_graph(tenant, rows);
        directory
    }

    fn set_graph(&self, tenant: TenantId, rows: &[(i64, Option<i64>)]) {
        let nodes = rows.iter().map(|&(u, m)| OrgNode::new(u, m)).collect();
        self.graphs.lock().unwrap().insert(tenant, nodes);
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrgDirectory for StubDirectory {
    async fn org_snapshot(&self, tenant: TenantId) -> Result<Vec<OrgNode>, DirectoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DirectoryError::Read("connection refused".into()));
        }
        Ok(self
            .graphs
            .lock()
            .unwrap()
            .get(&tenant)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct StubPolicies {
    rows: HashMap<(i64, i64), String>,
    failing: bool,
}

impl StubPolicies {
    fn with(rows: &[(i64, i64, &str)]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|&(role, module, value)| ((role, module), value.to_string()))
                .collect(),
            failing: false,
        }
    }
}

#[async_trait]
impl PolicyStore for StubPolicies {
    async fn listing_criteria(
        &self,
        _tenant: TenantId,
        role: RoleId,
        module: ModuleId,
    ) -> Result<Option<String>, DirectoryError> {
        if self.failing {
            return Err(DirectoryError::Read("timeout".into()));
        }
        Ok(self.rows.get(&(role.get(), module.get())).cloned())
    }
}

#[derive(Default)]
struct StubModules {
    modules: Vec<(i64, Option<&'static str>, Option<&'static str>)>,
    failing: bool,
    lookups: AtomicUsize,
}

#[async_trait]
impl ModuleLookup for StubModules {
    async fn find_module_id(
        &self,
        _tenant: TenantId,
        route: Option<&str>,
        key: Option<&str>,
    ) -> Result<Option<ModuleId>, DirectoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(DirectoryError::Read("timeout".into()));
        }
        Ok(self
            .modules
            .iter()
            .find(|(_, r, k)| (route.is_some() && *r == route) || (key.is_some() && *k == key))
            .and_then(|(id, _, _)| ModuleId::new(*id)))
    }
}

fn modules() -> StubModules {
    StubModules {
        modules: vec![
            (3, Some("/inquiries"), Some("inquiries")),
            (4, Some("/orders"), Some("orders")),
        ],
        ..StubModules::default()
    }
}

fn resolver(policies: StubPolicies, modules: StubModules) -> PolicyResolver {
    PolicyResolver::new(Arc::new(policies), Arc::new(modules))
}

fn service(directory: Arc<StubDirectory>, policies: StubPolicies) -> VisibilityService {
    VisibilityService::new(directory, Arc::new(policies), Arc::new(modules()), TeamCache::new())
}

fn uid(raw: i64) -> UserId {
    UserId::new(raw).unwrap()
}

const ORG: &[(i64, Option<i64>)] = &[
    (1, None),
    (2, Some(1)),
    (3, Some(1)),
    (4, Some(2)),
    (5, Some(99)),
];

// ============================================================================
// Policy resolution
// ============================================================================

#[tokio::test]
async fn test_missing_policy_row_is_my_team() {
    let tenant = TenantId::new();
    let policies = resolver(StubPolicies::with(&[(7, 4, "all")]), modules());

    assert_eq!(
        policies.resolve_policy(tenant, 7, &ModuleRef::id(3)).await,
        Policy::MyTeam
    );
}

#[tokio::test]
async fn test_explicit_all_row() {
    let tenant = TenantId::new();
    let policies = resolver(StubPolicies::with(&[(7, 3, " All ")]), modules());

    assert_eq!(
        policies.resolve_policy(tenant, 7, &ModuleRef::id(3)).await,
        Policy::All
    );
}

#[tokio::test]
async fn test_invalid_role_is_my_team() {
    let tenant = TenantId::new();
    let policies = resolver(StubPolicies::with(&[(7, 3, "all")]), modules());

    for role in [0, -7, i64::MIN] {
        assert_eq!(
            policies.resolve_policy(tenant, role, &ModuleRef::id(3)).await,
            Policy::MyTeam
        );
    }
}

#[tokio::test]
async fn test_unrecognised_stored_value_is_my_team() {
    let tenant = TenantId::new();
    let policies = resolver(StubPolicies::with(&[(7, 3, "everyone")]), modules());

    assert_eq!(
        policies.resolve_policy(tenant, 7, &ModuleRef::id(3)).await,
        Policy::MyTeam
    );
}

#[tokio::test]
async fn test_unknown_module_is_my_team() {
    let tenant = TenantId::new();
    let policies = resolver(StubPolicies::with(&[(7, 3, "all")]), modules());

    assert_eq!(
        policies.resolve_policy(tenant, 7, &ModuleRef::key("payments")).await,
        Policy::MyTeam
    );
    assert_eq!(
        policies.resolve_policy(tenant, 7, &ModuleRef::default()).await,
        Policy::MyTeam
    );
    assert_eq!(
        policies.resolve_policy(tenant, 7, &ModuleRef::lookup(Some("  ".into()), None)).await,
        Policy::MyTeam
    );
}

#[tokio::test]
async fn test_module_resolved_by_route_or_key() {
    let tenant = TenantId::new();
    let policies = resolver(StubPolicies::with(&[(7, 3, "all")]), modules());

    assert_eq!(
        policies.resolve_policy(tenant, 7, &ModuleRef::key("inquiries")).await,
        Policy::All
    );
    assert_eq!(
        policies
            .resolve_policy(tenant, 7, &ModuleRef::lookup(Some("/inquiries".into()), None))
            .await,
        Policy::All
    );
}

#[tokio::test]
async fn test_direct_id_wins_without_lookup() {
    let tenant = TenantId::new();
    let lookup = Arc::new(modules());
    let policies = PolicyResolver::new(
        Arc::new(StubPolicies::with(&[(7, 4, "all")])),
        Arc::clone(&lookup) as Arc<dyn ModuleLookup>,
    );
    let module = ModuleRef {
        id: Some(4),
        route: Some("/inquiries".into()),
        key: None,
    };

    assert_eq!(policies.resolve_policy(tenant, 7, &module).await, Policy::All);
    assert_eq!(lookup.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_failures_fail_closed() {
    let tenant = TenantId::new();

    let failing_store = resolver(
        StubPolicies {
            failing: true,
            ..StubPolicies::with(&[(7, 3, "all")])
        },
        modules(),
    );
    assert_eq!(
        failing_store.resolve_policy(tenant, 7, &ModuleRef::id(3)).await,
        Policy::MyTeam
    );

    let failing_lookup = resolver(
        StubPolicies::with(&[(7, 3, "all")]),
        StubModules {
            failing: true,
            ..modules()
        },
    );
    assert_eq!(
        failing_lookup.resolve_policy(tenant, 7, &ModuleRef::key("inquiries")).await,
        Policy::MyTeam
    );
}

// ============================================================================
// Decision composition
// ============================================================================

#[tokio::test]
async fn test_all_policy_is_unrestricted_without_directory_read() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    let svc = service(Arc::clone(&directory), StubPolicies::with(&[(2, 3, "all")]));

    let decision = svc
        .resolve(&VisibilityUser::new(tenant, 4, 2), &ModuleRef::id(3))
        .await
        .unwrap();

    assert_eq!(decision.policy, Policy::All);
    assert!(decision.enforced_ids.is_none());
    assert!(decision.allows(uid(12_345)));
    assert_eq!(directory.reads(), 0);
}

#[tokio::test]
async fn test_my_team_decision_carries_team() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    let svc = service(directory, StubPolicies::default());

    let decision = svc
        .resolve(&VisibilityUser::new(tenant, 1, 2), &ModuleRef::id(3))
        .await
        .unwrap();

    assert_eq!(decision.policy, Policy::MyTeam);
    assert_eq!(decision.enforced_ids().unwrap().to_raw_ids(), vec![1, 2, 3, 4]);
    assert!(!decision.allows(uid(5)));
}

#[tokio::test]
async fn test_invalid_user_locked_out_not_unrestricted() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    let svc = service(Arc::clone(&directory), StubPolicies::default());

    let decision = svc
        .resolve(&VisibilityUser::new(tenant, 0, 2), &ModuleRef::id(3))
        .await
        .unwrap();

    assert_eq!(decision.policy, Policy::MyTeam);
    let enforced = decision.enforced_ids.as_deref().expect("lockout must be a set");
    assert!(enforced.is_empty());
    assert!(!decision.allows(uid(1)));
    assert_eq!(directory.reads(), 0);
}

#[tokio::test]
async fn test_repeat_resolution_reads_directory_once() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    let svc = service(Arc::clone(&directory), StubPolicies::default());
    let user = VisibilityUser::new(tenant, 2, 9);

    let first = svc.resolve(&user, &ModuleRef::id(3)).await.unwrap();
    let second = svc.resolve(&user, &ModuleRef::key("orders")).await.unwrap();

    assert_eq!(directory.reads(), 1);
    assert!(Arc::ptr_eq(
        first.enforced_ids.as_ref().unwrap(),
        second.enforced_ids.as_ref().unwrap()
    ));
}

#[tokio::test]
async fn test_same_root_in_two_tenants_isolated() {
    let t1 = TenantId::new();
    let t2 = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(t1, &[(5, None), (6, Some(5))]));
    directory.set_graph(t2, &[(5, None), (7, Some(5)), (8, Some(7))]);
    let svc = service(Arc::clone(&directory), StubPolicies::default());

    let in_t1 = svc.team_for(t1, uid(5)).await.unwrap();
    let in_t2 = svc.team_for(t2, uid(5)).await.unwrap();

    assert_eq!(in_t1.to_raw_ids(), vec![5, 6]);
    assert_eq!(in_t2.to_raw_ids(), vec![5, 7, 8]);
    assert_eq!(directory.reads(), 2);

    svc.invalidate_tenant(t1);
    svc.cache().run_pending_tasks().await;
    assert!(svc.cache().peek(t1, uid(5)).await.is_none());
    assert!(svc.cache().peek(t2, uid(5)).await.is_some());
}

#[tokio::test]
async fn test_invalidation_forces_fresh_snapshot() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    let svc = service(Arc::clone(&directory), StubPolicies::default());

    assert_eq!(svc.team_for(tenant, uid(2)).await.unwrap().to_raw_ids(), vec![2, 4]);

    directory.set_graph(tenant, &[(1, None), (2, Some(1)), (4, Some(2)), (6, Some(2))]);
    assert_eq!(svc.team_for(tenant, uid(2)).await.unwrap().to_raw_ids(), vec![2, 4]);

    svc.invalidate_user(uid(2));
    svc.cache().run_pending_tasks().await;
    assert_eq!(svc.team_for(tenant, uid(2)).await.unwrap().to_raw_ids(), vec![2, 4, 6]);
    assert_eq!(directory.reads(), 2);
}

#[tokio::test]
async fn test_invalidate_users_and_clear() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    let svc = service(Arc::clone(&directory), StubPolicies::default());

    for root in [1, 2, 3] {
        svc.team_for(tenant, uid(root)).await.unwrap();
    }
    svc.invalidate_users(&[uid(1), uid(2)]);
    svc.cache().run_pending_tasks().await;
    assert!(svc.cache().peek(tenant, uid(1)).await.is_none());
    assert!(svc.cache().peek(tenant, uid(3)).await.is_some());

    svc.clear();
    svc.cache().run_pending_tasks().await;
    assert!(svc.cache().peek(tenant, uid(3)).await.is_none());
}

#[tokio::test]
async fn test_directory_failure_propagates_and_caches_nothing() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    directory.failing.store(true, Ordering::SeqCst);
    let svc = service(Arc::clone(&directory), StubPolicies::default());
    let user = VisibilityUser::new(tenant, 1, 2);

    let err = svc.resolve(&user, &ModuleRef::id(3)).await.unwrap_err();
    assert!(matches!(err, VisibilityError::Directory(_)));
    assert!(svc.cache().peek(tenant, uid(1)).await.is_none());

    directory.failing.store(false, Ordering::SeqCst);
    let decision = svc.resolve(&user, &ModuleRef::id(3)).await.unwrap();
    assert_eq!(decision.enforced_ids().unwrap().len(), 4);
    assert_eq!(directory.reads(), 2);
}

#[tokio::test]
async fn test_transaction_directory_bypasses_cache() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    let svc = service(Arc::clone(&directory), StubPolicies::default());
    let in_txn = StubDirectory::with_graph(tenant, &[(1, None), (2, Some(1)), (9, Some(2))]);
    let user = VisibilityUser::new(tenant, 2, 2);

    let decision = svc
        .resolve_with_directory(&user, &ModuleRef::id(3), &in_txn)
        .await
        .unwrap();

    assert_eq!(decision.enforced_ids().unwrap().to_raw_ids(), vec![2, 9]);
    assert_eq!(directory.reads(), 0);
    assert_eq!(in_txn.reads(), 1);
    assert!(svc.cache().peek(tenant, uid(2)).await.is_none());
}

#[tokio::test]
async fn test_cached_and_transaction_paths_agree() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    let policies = StubPolicies::with(&[(2, 3, "all"), (2, 4, "my_team")]);
    let svc = service(Arc::clone(&directory), policies);
    let in_txn = StubDirectory::with_graph(tenant, ORG);

    for (user_id, module) in [(1, 3), (1, 4), (2, 4), (0, 3), (0, 4), (-7, 4)] {
        let user = VisibilityUser::new(tenant, user_id, 2);
        let module = ModuleRef::id(module);

        let cached = svc.resolve(&user, &module).await.unwrap();
        let direct = svc
            .resolve_with_directory(&user, &module, &in_txn)
            .await
            .unwrap();

        assert_eq!(cached.policy, direct.policy, "user {user_id}");
        assert_eq!(
            cached.enforced_ids().map(|team| team.to_raw_ids()),
            direct.enforced_ids().map(|team| team.to_raw_ids()),
            "user {user_id}"
        );
    }
    // Invalid subjects are locked out before either path reads the graph.
    assert_eq!(directory.reads(), 2);
    assert_eq!(in_txn.reads(), 2);
}

#[tokio::test]
async fn test_invalidate_users_in_scopes_to_tenant() {
    let t1 = TenantId::new();
    let t2 = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(t1, ORG));
    directory.set_graph(t2, ORG);
    let svc = service(Arc::clone(&directory), StubPolicies::default());

    for tenant in [t1, t2] {
        svc.team_for(tenant, uid(2)).await.unwrap();
    }
    svc.invalidate_users_in(t1, &[uid(2)]);
    svc.cache().run_pending_tasks().await;

    assert!(svc.cache().peek(t1, uid(2)).await.is_none());
    assert!(svc.cache().peek(t2, uid(2)).await.is_some());
}

// ============================================================================
// List and single-record agreement
// ============================================================================

#[tokio::test]
async fn test_list_filter_and_record_guard_agree() {
    let tenant = TenantId::new();
    let directory = Arc::new(StubDirectory::with_graph(tenant, ORG));
    let svc = service(directory, StubPolicies::default());
    let user = VisibilityUser::new(tenant, 2, 2);
    let module = ModuleRef::key("inquiries");
    let owner = OwnerFieldSpec::single("handled_by");

    let decision = svc.resolve(&user, &module).await.unwrap();

    let inquiries: Vec<_> = (1..=5)
        .map(|handler| json!({"id": handler * 10, "handled_by": handler}))
        .collect();

    let listed: Vec<i64> = inquiries
        .iter()
        .filter(|row| {
            row["handled_by"]
                .as_i64()
                .and_then(UserId::new)
                .is_some_and(|id| decision.allows(id))
        })
        .filter_map(|row| row["id"].as_i64())
        .collect();
    assert_eq!(listed, vec![20, 40]);

    for row in &inquiries {
        let in_list = listed.contains(&row["id"].as_i64().unwrap());
        let guard = RecordVisibilityGuard::assert_visible(row, &decision, &owner);
        assert_eq!(in_list, guard.is_ok());
    }
}

#[tokio::test]
async fn test_forbidden_record_scenario() {
    let decision = VisibilityDecision::team(Arc::new(
        [1, 2, 3].into_iter().map(uid).collect::<TeamSet>(),
    ));
    let owner = OwnerFieldSpec::single("handled_by");

    assert!(matches!(
        RecordVisibilityGuard::assert_visible(&json!({"handled_by": 4}), &decision, &owner),
        Err(VisibilityError::Forbidden)
    ));
    let visible = json!({"handled_by": 3});
    assert!(RecordVisibilityGuard::assert_visible(&visible, &decision, &owner).is_ok());
}
