//! User directory routes, scoped by the `users` module's visibility.
//!
//! A user record is owned by itself: a caller with the `my_team` policy sees
//! their own record and those of their transitive reports.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use vantage_core::visibility::{
    ModuleRef, OwnerFieldSpec, RecordVisibilityGuard, VisibilityDecision,
};
use vantage_db::{UserRepository, entities::users};
use vantage_shared::types::{TenantId, UserId};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Module key the user directory resolves its listing policy with.
pub const USERS_MODULE_KEY: &str = "users";

/// Creates the users router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{user_id}", get(get_user).delete(delete_user))
        .route("/users/{user_id}/manager", patch(update_manager))
}

fn users_module() -> ModuleRef {
    ModuleRef::key(USERS_MODULE_KEY)
}

fn owner_fields() -> OwnerFieldSpec {
    OwnerFieldSpec::single("id")
}

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role, if assigned.
    pub role_id: Option<i64>,
    /// Manager, if any.
    pub manager_id: Option<i64>,
    /// Creation time.
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role_id: user.role_id,
            manager_id: user.manager_id,
            created_at: user.created_at,
        }
    }
}

/// Manager assignment request. `null` clears the manager.
#[derive(Debug, Deserialize)]
pub struct UpdateManagerRequest {
    /// New manager.
    pub manager_id: Option<i64>,
}

/// Resolves the caller's decision for the users module.
async fn decision_for(state: &AppState, auth: &AuthUser) -> Result<VisibilityDecision, ApiError> {
    Ok(state
        .visibility
        .resolve(&auth.visibility_user(), &users_module())
        .await?)
}

/// Loads a live user and checks it against `decision`.
///
/// Unknown ids are 404; existing but out-of-scope users are 403.
async fn load_visible(
    repo: &UserRepository,
    tenant: TenantId,
    raw_id: i64,
    decision: &VisibilityDecision,
) -> Result<(UserId, users::Model), ApiError> {
    let id = UserId::new(raw_id).ok_or_else(|| ApiError::not_found("User"))?;
    let user = repo
        .find_by_id(tenant, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    RecordVisibilityGuard::assert_visible_record(&user, decision, &owner_fields())?;
    Ok((id, user))
}

/// GET /users - Users visible to the caller.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let decision = decision_for(&state, &auth).await?;
    let repo = UserRepository::new(Arc::clone(&state.db));

    let users = repo.list_scoped(auth.tenant_id(), &decision).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/{user_id} - A single user.
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let decision = decision_for(&state, &auth).await?;
    let repo = UserRepository::new(Arc::clone(&state.db));

    let (_, user) = load_visible(&repo, auth.tenant_id(), user_id, &decision).await?;
    Ok(Json(user.into()))
}

/// PATCH /users/{user_id}/manager - Set or clear a user's manager.
async fn update_manager(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateManagerRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let tenant = auth.tenant_id();
    let decision = decision_for(&state, &auth).await?;
    let repo = UserRepository::new(Arc::clone(&state.db));

    let (id, _) = load_visible(&repo, tenant, user_id, &decision).await?;

    let manager = match payload.manager_id {
        None => None,
        Some(raw) => {
            let manager = UserId::new(raw)
                .ok_or_else(|| ApiError::validation("manager_id must be a positive integer"))?;
            if manager == id {
                return Err(ApiError::validation("A user cannot manage themselves"));
            }
            if repo.find_by_id(tenant, manager).await?.is_none() {
                return Err(ApiError::validation("Manager not found"));
            }
            Some(manager)
        }
    };

    let updated = repo
        .update_manager(tenant, id, manager)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    state.visibility.invalidate_user(id);

    info!(
        tenant_id = %tenant,
        user_id = %id,
        manager_id = ?updated.manager_id,
        updated_by = auth.raw_user_id(),
        "Manager updated"
    );
    Ok(Json(updated.into()))
}

/// DELETE /users/{user_id} - Soft-delete a user.
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let tenant = auth.tenant_id();
    let decision = decision_for(&state, &auth).await?;
    let repo = UserRepository::new(Arc::clone(&state.db));

    let (id, _) = load_visible(&repo, tenant, user_id, &decision).await?;

    if !repo.soft_delete(tenant, id).await? {
        return Err(ApiError::not_found("User"));
    }
    state.visibility.invalidate_user(id);

    info!(
        tenant_id = %tenant,
        user_id = %id,
        deleted_by = auth.raw_user_id(),
        "User deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
