//! Current user endpoint.

use axum::{Json, Router, routing::get};

use crate::{AppState, middleware::CurrentUser};
use expensedesk_core::auth::AuthContext;

/// GET `/me`
async fn me(CurrentUser(ctx): CurrentUser) -> Json<AuthContext> {
    Json(ctx)
}

/// Creates the current-user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}
