//! Error to response mapping.
//!
//! Every failure leaves the API as `{"error": <code>, "message": <text>}`
//! with the status the domain error declares.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use expensedesk_core::expense::ExpenseError;
use expensedesk_core::provisioning::ProvisioningError;
use expensedesk_core::storage::StorageError;
use expensedesk_db::BranchError;
use expensedesk_shared::AppError;
use sea_orm::DbErr;
use serde_json::json;

/// Any error a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// Expense rules and lifecycle.
    Expense(ExpenseError),
    /// Receipt storage.
    Storage(StorageError),
    /// User provisioning.
    Provisioning(ProvisioningError),
    /// Branch administration.
    Branch(BranchError),
    /// Infrastructure and plain CRUD paths.
    App(AppError),
}

impl ApiError {
    /// Builds a 400 with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::Validation(message.into()))
    }

    /// Builds a 403 with a message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::App(AppError::Forbidden(message.into()))
    }

    /// Builds a 503 for a collaborator that is not configured.
    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::App(AppError::Unavailable(what.into()))
    }

    fn parts(&self) -> (u16, &'static str, String) {
        match self {
            Self::Expense(e) => (e.status_code(), e.error_code(), e.to_string()),
            Self::Storage(e) => (e.status_code(), e.error_code(), e.to_string()),
            Self::Provisioning(e) => (e.status_code(), e.error_code(), e.to_string()),
            Self::Branch(e) => match e {
                BranchError::InvalidName(_) => (400, "VALIDATION_ERROR", e.to_string()),
                BranchError::Duplicate(_) => (409, "BRANCH_EXISTS", e.to_string()),
                BranchError::Database(_) => (500, "DATABASE_ERROR", e.to_string()),
            },
            Self::App(e) => (e.status_code(), e.error_code(), e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %message, code, "Request failed");
        }
        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

impl From<ExpenseError> for ApiError {
    fn from(err: ExpenseError) -> Self {
        Self::Expense(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<ProvisioningError> for ApiError {
    fn from(err: ProvisioningError) -> Self {
        Self::Provisioning(err)
    }
}

impl From<BranchError> for ApiError {
    fn from(err: BranchError) -> Self {
        Self::Branch(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::App(AppError::Database(err.to_string()))
    }
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use uuid::Uuid;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[rstest]
    #[case(ApiError::Expense(ExpenseError::AlreadySplit(Uuid::nil())), 409, "ALREADY_SPLIT")]
    #[case(ApiError::Expense(ExpenseError::NotFound(Uuid::nil())), 404, "EXPENSE_NOT_FOUND")]
    #[case(ApiError::Storage(StorageError::EmptyFile), 400, "EMPTY_FILE")]
    #[case(ApiError::Provisioning(ProvisioningError::EmailTaken("a@b.c".into())), 409, "EMAIL_TAKEN")]
    #[case(ApiError::Branch(BranchError::Duplicate("Rosario".into())), 409, "BRANCH_EXISTS")]
    #[case(ApiError::unavailable("storage"), 503, "SERVICE_UNAVAILABLE")]
    #[case(ApiError::from(DbErr::Custom("boom".into())), 500, "DATABASE_ERROR")]
    #[tokio::test]
    async fn test_error_body(#[case] err: ApiError, #[case] status: u16, #[case] code: &str) {
        let (actual, body) = body_of(err).await;
        assert_eq!(actual.as_u16(), status);
        assert_eq!(body["error"], code);
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}
