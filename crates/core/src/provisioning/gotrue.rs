//! GoTrue-compatible admin API client.

use expensedesk_shared::IdentityConfig;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::error::ProvisioningError;
use super::saga::IdentityProvider;

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct CreatedUser {
    id: Uuid,
}

/// Admin client for `/auth/v1/admin/users`.
#[derive(Debug, Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    config: IdentityConfig,
}

impl GoTrueClient {
    /// Creates a client for the configured project.
    #[must_use]
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn users_url(&self) -> String {
        format!(
            "{}/auth/v1/admin/users",
            self.config.url.trim_end_matches('/')
        )
    }

    fn user_url(&self, user_id: Uuid) -> String {
        format!("{}/{user_id}", self.users_url())
    }

    /// JSON body for the create call. Users are created confirmed.
    fn create_body(email: &str, password: &str, full_name: &str) -> serde_json::Value {
        json!({
            "email": email,
            "password": password,
            "email_confirm": true,
            "user_metadata": { "full_name": full_name },
        })
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }
}

async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY)
        .collect()
}

impl IdentityProvider for GoTrueClient {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Uuid, ProvisioningError> {
        let response = self
            .authorized(self.http.post(self.users_url()))
            .json(&Self::create_body(email, password, full_name))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let created: CreatedUser = response.json().await?;
            return Ok(created.id);
        }

        let body = error_body(response).await;
        if status == StatusCode::UNPROCESSABLE_ENTITY && body.contains("already") {
            return Err(ProvisioningError::EmailTaken(email.to_string()));
        }
        Err(ProvisioningError::Identity(format!("{status}: {body}")))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), ProvisioningError> {
        let response = self
            .authorized(self.http.delete(self.user_url(user_id)))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = error_body(response).await;
        Err(ProvisioningError::Identity(format!("{status}: {body}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoTrueClient {
        GoTrueClient::new(IdentityConfig {
            url: "https://project.supabase.co/".to_string(),
            service_key: "service".to_string(),
        })
    }

    #[test]
    fn test_urls() {
        let client = client();
        let id = Uuid::nil();
        assert_eq!(
            client.users_url(),
            "https://project.supabase.co/auth/v1/admin/users"
        );
        assert_eq!(
            client.user_url(id),
            format!("https://project.supabase.co/auth/v1/admin/users/{id}")
        );
    }

    #[test]
    fn test_create_body_confirms_email() {
        let body = GoTrueClient::create_body("ana@acme.com", "secret123", "Ana");
        assert_eq!(body["email"], "ana@acme.com");
        assert_eq!(body["email_confirm"], true);
        assert_eq!(body["user_metadata"]["full_name"], "Ana");
    }
}
