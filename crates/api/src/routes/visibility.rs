//! Visibility decision and team cache routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use vantage_core::visibility::{ModuleRef, Policy, TeamSet, VisibilityDecision};
use vantage_shared::types::UserId;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the visibility router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/visibility", get(get_decision))
        .route("/visibility/team", get(get_team))
        .route("/visibility/cache/invalidate", post(invalidate_cache))
        .route("/visibility/cache", delete(clear_cache))
}

/// Module reference query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ModuleQuery {
    /// Direct module id.
    pub module_id: Option<i64>,
    /// Module route.
    pub route: Option<String>,
    /// Module key.
    pub key: Option<String>,
}

impl From<ModuleQuery> for ModuleRef {
    fn from(query: ModuleQuery) -> Self {
        Self {
            id: query.module_id,
            route: query.route,
            key: query.key,
        }
    }
}

/// Decision response. `enforced_ids` is `null` when unrestricted.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    /// Resolved policy.
    pub policy: Policy,
    /// Owner ids the caller is restricted to.
    pub enforced_ids: Option<Vec<i64>>,
}

impl From<&VisibilityDecision> for DecisionResponse {
    fn from(decision: &VisibilityDecision) -> Self {
        Self {
            policy: decision.policy,
            enforced_ids: decision.enforced_ids().map(TeamSet::to_raw_ids),
        }
    }
}

/// Team response.
#[derive(Debug, Serialize)]
pub struct TeamResponse {
    /// Root of the team.
    pub user_id: i64,
    /// Members, root included.
    pub team: Vec<i64>,
}

/// Cache invalidation request.
#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    /// Roots whose cached teams are evicted.
    pub user_ids: Vec<i64>,
}

/// GET /visibility - The caller's decision for a module.
async fn get_decision(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ModuleQuery>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let module = ModuleRef::from(query);
    let decision = state
        .visibility
        .resolve(&auth.visibility_user(), &module)
        .await?;

    Ok(Json(DecisionResponse::from(&decision)))
}

/// GET /visibility/team - The caller's team.
async fn get_team(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = match UserId::new(auth.raw_user_id()) {
        Some(user_id) => state
            .visibility
            .team_for(auth.tenant_id(), user_id)
            .await?
            .to_raw_ids(),
        None => Vec::new(),
    };

    Ok(Json(TeamResponse {
        user_id: auth.raw_user_id(),
        team,
    }))
}

/// POST /visibility/cache/invalidate - Evict the caller's tenant's teams
/// rooted at the given users.
async fn invalidate_cache(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<InvalidateRequest>,
) -> StatusCode {
    let user_ids: Vec<UserId> = payload
        .user_ids
        .into_iter()
        .filter_map(UserId::new)
        .collect();
    state
        .visibility
        .invalidate_users_in(auth.tenant_id(), &user_ids);

    info!(
        tenant_id = %auth.tenant_id(),
        requested_by = auth.raw_user_id(),
        count = user_ids.len(),
        "Team cache entries invalidated"
    );
    StatusCode::NO_CONTENT
}

/// DELETE /visibility/cache - Evict every cached team of the caller's tenant.
async fn clear_cache(State(state): State<AppState>, auth: AuthUser) -> StatusCode {
    state.visibility.invalidate_tenant(auth.tenant_id());

    info!(
        tenant_id = %auth.tenant_id(),
        requested_by = auth.raw_user_id(),
        "Tenant team cache cleared"
    );
    StatusCode::NO_CONTENT
}
