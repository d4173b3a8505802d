//! Chat-completions client for receipt images.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use expensedesk_shared::VisionConfig;
use serde::Deserialize;
use serde_json::json;

use super::error::ExtractionError;
use super::parser::parse_extraction;
use super::types::ExtractedInvoice;

/// Fixed structured-output instruction sent with every receipt.
pub const EXTRACTION_PROMPT: &str = "Sos un asistente que lee comprobantes fiscales argentinos. \
Respondé SOLO con un objeto JSON con estas claves: \
vendor (razón social), cuit, invoice_number, \
letter_type (A, B, C, M o TICKET), date (YYYY-MM-DD), total, \
currency (ARS, USD o EUR), exchange_rate (null si es ARS), \
taxes (lista de objetos {name, amount} con cada impuesto o percepción discriminado, \
por ejemplo IVA 21%, IVA 10,5%, Percepción IIBB). \
Usá null para los datos que no puedas leer.";

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Vision extraction client.
#[derive(Debug, Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    config: VisionConfig,
}

impl VisionClient {
    /// Creates a client for the configured endpoint.
    #[must_use]
    pub fn new(config: VisionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Model name, for logs.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Builds the `data:` URL carrying the image.
    #[must_use]
    pub fn data_url(image: &[u8], content_type: &str) -> String {
        format!("data:{content_type};base64,{}", STANDARD.encode(image))
    }

    /// Request body for one receipt.
    #[must_use]
    pub fn request_body(&self, image: &[u8], content_type: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": EXTRACTION_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": "Extraé los datos de este comprobante." },
                        {
                            "type": "image_url",
                            "image_url": { "url": Self::data_url(image, content_type) }
                        }
                    ]
                }
            ]
        })
    }

    /// Sends the receipt to the model and parses its answer.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, an empty
    /// answer or an answer that is not the expected JSON.
    pub async fn extract(
        &self,
        image: &[u8],
        content_type: &str,
    ) -> Result<ExtractedInvoice, ExtractionError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(image, content_type))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ExtractionError::EmptyResponse)?;

        let invoice = parse_extraction(&content)?;
        tracing::debug!(
            model = %self.config.model,
            vendor = ?invoice.vendor,
            taxes = invoice.taxes.len(),
            "Receipt extracted"
        );
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> VisionClient {
        VisionClient::new(VisionConfig {
            api_url: "http://localhost:9/v1/chat/completions".to_string(),
            api_key: "test".to_string(),
            model: "gpt-4o-mini".to_string(),
        })
    }

    #[test]
    fn test_data_url() {
        assert_eq!(
            VisionClient::data_url(b"abc", "image/png"),
            "data:image/png;base64,YWJj"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = client().request_body(b"abc", "image/jpeg");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["content"], EXTRACTION_PROMPT);
        assert_eq!(
            body["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,YWJj"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_error() {
        let err = client().extract(b"abc", "image/png").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Request(_)));
        assert_eq!(err.status_code(), 502);
    }
}
