//! Spend reports.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
};
use expensedesk_core::expense::ExpenseScope;
use expensedesk_db::{BranchSpendLine, ReportRepository};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/branch-spend", get(branch_spend))
}

/// Query parameters for the spend report.
#[derive(Debug, Default, Deserialize)]
pub struct BranchSpendQuery {
    /// Reference date; the report covers its calendar month up to it.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// Spend report response.
#[derive(Debug, Serialize)]
pub struct BranchSpendResponse {
    /// Reference date.
    pub as_of: NaiveDate,
    /// One line per user in scope.
    pub users: Vec<BranchSpendLine>,
}

/// GET `/reports/branch-spend`
async fn branch_spend(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<BranchSpendQuery>,
) -> ApiResult<Json<BranchSpendResponse>> {
    let scope = ExpenseScope::for_reporting(&ctx)
        .ok_or_else(|| ApiError::forbidden("viewing spend reports"))?;
    let as_of = query.as_of.unwrap_or_else(|| state.policy.today());

    let users = ReportRepository::new((*state.db).clone())
        .branch_spend(&scope, as_of)
        .await?;
    tracing::debug!(user_id = %ctx.user_id, lines = users.len(), %as_of, "Branch spend report");

    Ok(Json(BranchSpendResponse { as_of, users }))
}
