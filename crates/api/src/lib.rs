//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Authentication middleware resolving the caller's [`AuthContext`]
//! - Error to JSON response mapping
//!
//! [`AuthContext`]: expensedesk_core::auth::AuthContext

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use expensedesk_core::expense::ExpenseService;
use expensedesk_core::extraction::VisionClient;
use expensedesk_core::notification::NotificationDispatcher;
use expensedesk_core::provisioning::{GoTrueClient, ProvisioningSaga};
use expensedesk_core::storage::ReceiptStorage;
use expensedesk_db::{InvoiceRepository, ProfileRepository};
use expensedesk_shared::{AccountingConfig, EmailService, JwtService, PolicyConfig};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Notification dispatcher wired to the database and SMTP.
pub type Dispatcher = NotificationDispatcher<ProfileRepository, EmailService>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Email service for notifications.
    pub email_service: Arc<EmailService>,
    /// Receipt storage (optional).
    pub storage: Option<Arc<ReceiptStorage>>,
    /// Vision extraction client (optional).
    pub vision: Option<Arc<VisionClient>>,
    /// Identity provider admin client (optional).
    pub identity: Option<Arc<GoTrueClient>>,
    /// Expense policy.
    pub policy: PolicyConfig,
    /// Accounting export constants and code tables.
    pub accounting: Arc<AccountingConfig>,
    /// Largest accepted request body, in bytes.
    pub body_limit_bytes: usize,
}

impl AppState {
    /// Expense service over the invoice repository.
    #[must_use]
    pub fn expense_service(&self) -> ExpenseService<InvoiceRepository> {
        ExpenseService::new(
            Arc::new(InvoiceRepository::new((*self.db).clone())),
            self.policy.clone(),
        )
    }

    /// Notification dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::new(NotificationDispatcher::new(
            Arc::new(ProfileRepository::new((*self.db).clone())),
            Arc::clone(&self.email_service),
            self.email_service.frontend_url(),
        ))
    }

    /// Provisioning saga, when the identity provider is configured.
    #[must_use]
    pub fn provisioning(&self) -> Option<ProvisioningSaga<GoTrueClient, ProfileRepository>> {
        self.identity.as_ref().map(|identity| {
            ProvisioningSaga::new(
                Arc::clone(identity),
                Arc::new(ProfileRepository::new((*self.db).clone())),
            )
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::max(state.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
