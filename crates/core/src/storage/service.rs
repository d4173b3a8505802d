//! Receipt storage service.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use expensedesk_shared::{StorageProvider, StorageSettings};
use opendal::{ErrorKind, Operator, services};
use serde::Serialize;
use uuid::Uuid;

use super::error::StorageError;

/// Receipt formats accepted at upload.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "application/pdf",
];

/// Presigned URL for a receipt download.
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method to use.
    pub method: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

/// Receipt blob storage.
pub struct ReceiptStorage {
    operator: Operator,
    settings: StorageSettings,
}

impl ReceiptStorage {
    /// Builds the service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_settings(settings: StorageSettings) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&settings.provider)?;
        Ok(Self { operator, settings })
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder).map(|b| b.finish())
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);
                Operator::new(builder).map(|b| b.finish())
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                Operator::new(services::Fs::default().root(root)).map(|b| b.finish())
            }
        };

        operator.map_err(|e| StorageError::configuration(e.to_string()))
    }

    /// Checks an upload against the size limit and accepted formats.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty, too large or not a receipt format.
    pub fn validate_receipt(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size == 0 {
            return Err(StorageError::EmptyFile);
        }
        if size > self.settings.max_file_size {
            return Err(StorageError::FileTooLarge {
                size,
                max: self.settings.max_file_size,
            });
        }

        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
            return Err(StorageError::InvalidContentType {
                content_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    /// Storage key for a new receipt.
    ///
    /// Format: `receipts/{user_id}/{receipt_id}/{sanitized_filename}`
    #[must_use]
    pub fn receipt_key(user_id: Uuid, receipt_id: Uuid, filename: &str) -> String {
        let filename = sanitize_filename(filename);
        let filename = if filename.is_empty() {
            "receipt".to_string()
        } else {
            filename
        };
        format!("receipts/{user_id}/{receipt_id}/{filename}")
    }

    /// Writes a receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the write.
    pub async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = data.len();
        if self.operator.info().full_capability().write_with_content_type {
            self.operator
                .write_with(key, data)
                .content_type(content_type)
                .await?;
        } else {
            self.operator.write(key, data).await?;
        }

        tracing::debug!(
            key = %key,
            size,
            provider = self.settings.provider.name(),
            "Receipt stored"
        );
        Ok(())
    }

    /// Reads a receipt back.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key does not exist.
    pub async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let buffer = self.operator.read(key).await?;
        Ok(buffer.to_bytes())
    }

    /// Deletes a receipt. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await?;
        tracing::debug!(key = %key, "Receipt deleted");
        Ok(())
    }

    /// Checks if a receipt exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Receipt stat failed");
                false
            }
        }
    }

    /// Presigned read URL.
    ///
    /// # Errors
    ///
    /// Returns `PresignNotSupported` on backends without presigning (local fs).
    pub async fn presign_download(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        let ttl_secs = self.settings.presign_download_ttl_secs;
        let presigned = self
            .operator
            .presign_read(key, Duration::from_secs(ttl_secs))
            .await?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        })
    }

    /// Provider name, for logs.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.settings.provider.name()
    }

    /// Maximum accepted receipt size.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.settings.max_file_size
    }
}

/// Keeps ASCII alphanumerics, dots, hyphens and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
