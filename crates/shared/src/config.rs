//! Application configuration management.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// SMTP configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Receipt storage. Uploads are refused when absent.
    #[serde(default)]
    pub storage: Option<StorageSettings>,
    /// Vision extraction endpoint. Uploads become manual drafts when absent.
    #[serde(default)]
    pub vision: Option<VisionConfig>,
    /// Identity provider admin API. User provisioning is refused when absent.
    #[serde(default)]
    pub identity: Option<IdentityConfig>,
    /// Expense policy knobs.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Accounting export constants and code tables.
    #[serde(default)]
    pub accounting: AccountingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body (receipt uploads), in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    12 * 1024 * 1024
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings for validating identity-provider tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// HS256 secret shared with the identity provider.
    pub secret: String,
    /// Expected `aud` claim, if any.
    #[serde(default)]
    pub audience: Option<String>,
}

/// SMTP configuration for outgoing notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP port.
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_username: String,
    /// SMTP password.
    pub smtp_password: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
    /// Base URL of the web client, used for links in emails.
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "gastos@localhost".to_string(),
            from_name: "Rendición de Gastos".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Supabase Storage, Cloudflare R2, AWS S3.
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Azure Blob Storage.
    AzureBlob {
        /// Storage account name.
        account: String,
        /// Storage access key.
        access_key: String,
        /// Container name.
        container: String,
    },
    /// Local filesystem (development only).
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Provider name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Bucket or container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
        }
    }
}

/// Receipt storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backing provider.
    pub provider: StorageProvider,
    /// Maximum receipt size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Presigned download URL TTL in seconds.
    #[serde(default = "default_download_ttl")]
    pub presign_download_ttl_secs: u64,
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_download_ttl() -> u64 {
    3600
}

/// OpenAI-compatible vision endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    /// Chat completions URL.
    pub api_url: String,
    /// Bearer key.
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_vision_model")]
    pub model: String,
}

fn default_vision_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Identity provider admin API (GoTrue-compatible).
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Base URL, e.g. `https://project.supabase.co`.
    pub url: String,
    /// Service-role key with admin rights.
    pub service_key: String,
}

/// Expense policy knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// IANA timezone that defines "today".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Oldest accepted invoice date, in days before today.
    #[serde(default = "default_staleness_days")]
    pub staleness_days: u64,
}

fn default_timezone() -> String {
    "America/Argentina/Buenos_Aires".to_string()
}

fn default_staleness_days() -> u64 {
    7
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            staleness_days: default_staleness_days(),
        }
    }
}

impl PolicyConfig {
    /// Parses the configured timezone, falling back to Buenos Aires.
    #[must_use]
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone
            .parse()
            .unwrap_or(chrono_tz::America::Argentina::Buenos_Aires)
    }

    /// Today's calendar date in the configured timezone.
    #[must_use]
    pub fn today(&self) -> chrono::NaiveDate {
        chrono::Utc::now().with_timezone(&self.tz()).date_naive()
    }
}

/// Fixed columns and code tables for the Business Central export.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountingConfig {
    /// Account type column.
    pub account_type: String,
    /// Account number column.
    pub account_number: String,
    /// Tax area code column.
    pub tax_area_code: String,
    /// Operation column.
    pub operation: String,
    /// Province column.
    pub province: String,
    /// Unit column.
    pub unit: String,
    /// Decimal separator for amounts in the TSV export.
    pub decimal_separator: char,
    /// Branch code used when a branch name is not mapped.
    pub default_branch_code: String,
    /// Area code used when an area name is not mapped.
    pub default_area_code: String,
    /// Branch name to branch code.
    pub branch_codes: HashMap<String, String>,
    /// Area name to area code.
    pub area_codes: HashMap<String, String>,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            account_type: "Cuenta".to_string(),
            account_number: "5.1.01.001".to_string(),
            tax_area_code: "LOCAL".to_string(),
            operation: "COMPRA".to_string(),
            province: "CABA".to_string(),
            unit: "UN".to_string(),
            decimal_separator: ',',
            default_branch_code: "GRAL".to_string(),
            default_area_code: "GRAL".to_string(),
            branch_codes: HashMap::new(),
            area_codes: HashMap::new(),
        }
    }
}

impl AccountingConfig {
    /// Resolves a branch name to its code (case-insensitive).
    #[must_use]
    pub fn branch_code(&self, branch: Option<&str>) -> &str {
        lookup_code(&self.branch_codes, branch).unwrap_or(&self.default_branch_code)
    }

    /// Resolves an area name to its code (case-insensitive).
    #[must_use]
    pub fn area_code(&self, area: Option<&str>) -> &str {
        lookup_code(&self.area_codes, area).unwrap_or(&self.default_area_code)
    }
}

// config-rs may lowercase table keys, so both sides are compared lowercased.
fn lookup_code<'a>(table: &'a HashMap<String, String>, name: Option<&str>) -> Option<&'a str> {
    let wanted = name?.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|(k, _)| k.trim().to_lowercase() == wanted)
        .map(|(_, v)| v.as_str())
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("EXPENSEDESK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
