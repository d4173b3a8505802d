//! Administration: user provisioning and branches.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use expensedesk_core::auth::AuthContext;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
};
use expensedesk_core::provisioning::{
    GoTrueClient, ProfileUpdate, ProvisionUserInput, ProvisioningSaga,
};
use expensedesk_db::{BranchRepository, ProfileRepository};
use expensedesk_shared::types::PageRequest;

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/{id}", put(update_user).delete(delete_user))
        .route("/admin/branches", get(list_branches).post(create_branch))
}

/// Request body for a new branch.
#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    /// Branch name.
    pub name: String,
}

fn require_admin(ctx: &AuthContext) -> Result<(), ApiError> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("administrator role required"))
    }
}

fn require_saga(
    state: &AppState,
) -> Result<ProvisioningSaga<GoTrueClient, ProfileRepository>, ApiError> {
    state
        .provisioning()
        .ok_or_else(|| ApiError::unavailable("identity provider is not configured"))
}

/// GET `/admin/users`
async fn list_users(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&ctx)?;
    let profiles = ProfileRepository::new((*state.db).clone())
        .list(&page)
        .await?;
    Ok(Json(profiles))
}

/// POST `/admin/users`
async fn create_user(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(input): Json<ProvisionUserInput>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&ctx)?;
    let profile = require_saga(&state)?.provision(input).await?;
    info!(user_id = %profile.id, by = %ctx.user_id, "User provisioned");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// PUT `/admin/users/{id}`
async fn update_user(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&ctx)?;
    let profile = require_saga(&state)?.update(id, update).await?;
    Ok(Json(profile))
}

/// DELETE `/admin/users/{id}`
async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&ctx)?;
    if id == ctx.user_id {
        return Err(ApiError::validation("Administrators cannot delete themselves"));
    }
    require_saga(&state)?.deprovision(id).await?;
    info!(user_id = %id, by = %ctx.user_id, "User deprovisioned");
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/admin/branches`
///
/// Open to every authenticated user; the upload form needs the list.
async fn list_branches(
    State(state): State<AppState>,
    CurrentUser(_ctx): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let branches = BranchRepository::new((*state.db).clone()).list().await?;
    Ok(Json(branches))
}

/// POST `/admin/branches`
async fn create_branch(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(body): Json<CreateBranchRequest>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&ctx)?;
    let branch = BranchRepository::new((*state.db).clone())
        .create(&body.name)
        .await?;
    info!(branch = %branch.name, by = %ctx.user_id, "Branch created");
    Ok((StatusCode::CREATED, Json(branch)))
}
