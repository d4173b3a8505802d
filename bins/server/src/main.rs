//! ExpenseDesk API Server
//!
//! Main entry point for the expense-report backend.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expensedesk_api::{AppState, create_router};
use expensedesk_core::extraction::VisionClient;
use expensedesk_core::provisioning::GoTrueClient;
use expensedesk_core::storage::ReceiptStorage;
use expensedesk_db::connect_with;
use expensedesk_shared::{AppConfig, EmailService, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expensedesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with(&config.database).await?;
    info!(max_connections = config.database.max_connections, "Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        audience: config.jwt.audience.clone(),
        ..JwtConfig::default()
    });

    let email_service = EmailService::new(config.email.clone());
    info!(
        smtp_host = %config.email.smtp_host,
        smtp_port = %config.email.smtp_port,
        "Email service configured"
    );

    let storage = match config.storage.clone() {
        Some(settings) => {
            let storage = ReceiptStorage::from_settings(settings)
                .context("Failed to initialize receipt storage")?;
            info!(provider = storage.provider_name(), "Receipt storage configured");
            Some(Arc::new(storage))
        }
        None => {
            warn!("Receipt storage not configured, uploads are disabled");
            None
        }
    };

    let vision = config.vision.clone().map(|vision| {
        info!(model = %vision.model, "Vision extraction configured");
        Arc::new(VisionClient::new(vision))
    });
    if vision.is_none() {
        warn!("Vision extraction not configured, uploads become manual drafts");
    }

    let identity = config
        .identity
        .clone()
        .map(|identity| Arc::new(GoTrueClient::new(identity)));
    if identity.is_none() {
        warn!("Identity provider not configured, user provisioning is disabled");
    }

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        email_service: Arc::new(email_service),
        storage,
        vision,
        identity,
        policy: config.policy.clone(),
        accounting: Arc::new(config.accounting.clone()),
        body_limit_bytes: config.server.body_limit_bytes,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(timezone = %config.policy.timezone, "Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
