//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use expensedesk_core::auth::AuthContext;
use expensedesk_db::ProfileRepository;
use expensedesk_shared::{AppError, JwtError};

use crate::AppState;
use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware.
///
/// Validates the bearer token, loads the caller's profile and stores the
/// resulting [`AuthContext`] in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return unauthorized("Authorization header with Bearer token is required");
    };

    let claims = match state.jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(JwtError::Expired) => return unauthorized("Token has expired"),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected token");
            return unauthorized("Invalid or malformed token");
        }
    };

    let profiles = ProfileRepository::new((*state.db).clone());
    match profiles.find_by_id(claims.user_id()).await {
        Ok(Some(profile)) => {
            request.extensions_mut().insert(profile.to_auth_context());
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!(user_id = %claims.user_id(), "Authenticated user has no profile");
            ApiError::forbidden("No profile is provisioned for this user").into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

fn unauthorized(message: &str) -> Response {
    ApiError::App(AppError::Unauthorized(message.to_string())).into_response()
}

/// Extractor for the caller's authorization context.
///
/// ```ignore
/// async fn handler(CurrentUser(ctx): CurrentUser) -> impl IntoResponse {
///     ctx.user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| ApiError::App(AppError::Unauthorized("Authentication required".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer  "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = crate::create_router(test_support::state());
        let response = app
            .oneshot(test_support::get("/api/v1/me", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_forged_token_is_unauthorized() {
        let app = crate::create_router(test_support::state());
        let response = app
            .oneshot(test_support::get(
                "/api/v1/invoices",
                Some("Bearer not.a.token"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_without_database_is_server_error() {
        let state = test_support::state();
        let auth = test_support::bearer(&state);
        let app = crate::create_router(state);
        let response = app
            .oneshot(test_support::get("/api/v1/me", Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
