//! Invoice routes: receipt upload, review lifecycle and accounting rows.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
};
use super::accounting::{build_rows, owner_areas};
use expensedesk_core::accounting::AccountingRow;
use expensedesk_core::expense::{ExpenseScope, ExpenseStatus, ValidateInvoiceInput};
use expensedesk_core::storage::{PresignedUrl, ReceiptStorage};
use expensedesk_db::{InvoiceRepository, ProfileRepository};
use expensedesk_shared::AppError;
use expensedesk_shared::types::PageRequest;

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices/upload", post(upload_receipt))
        .route("/invoices", get(list_invoices))
        .route("/invoices/{id}", get(get_invoice).delete(delete_invoice))
        .route("/invoices/{id}/check", post(check_invoice))
        .route("/invoices/{id}/validate", post(validate_invoice))
        .route("/invoices/{id}/approve", post(approve_invoice))
        .route("/invoices/{id}/reject", post(reject_invoice))
        .route("/invoices/{id}/submit-to-bc", post(submit_to_bc))
        .route("/invoices/{id}/receipt", get(receipt_url))
        .route("/invoices/{id}/accounting-rows", get(accounting_rows))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for the invoice list.
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    /// Status filter.
    #[serde(default)]
    pub status: Option<String>,
    /// Page number (1-indexed).
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page.
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl ListInvoicesQuery {
    fn page(&self) -> PageRequest {
        PageRequest::from_parts(self.page, self.per_page)
    }

    fn status(&self) -> Result<Option<ExpenseStatus>, ApiError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => ExpenseStatus::parse(s)
                .map(Some)
                .ok_or_else(|| ApiError::validation(format!("Unknown status '{s}'"))),
        }
    }
}

/// Request body for a rejection.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Why the expense is rejected.
    #[serde(default)]
    pub reason: String,
}

/// A receipt read from the multipart body.
struct UploadedReceipt {
    filename: String,
    content_type: String,
    data: Bytes,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Content type of an upload, guessed from the extension when the client
/// sends none or a generic one.
fn receipt_content_type(declared: Option<&str>, filename: &str) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|c| !c.is_empty()) {
        if declared != "application/octet-stream" {
            return declared.to_ascii_lowercase();
        }
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Reads the `file` part of the upload.
async fn read_receipt(mut multipart: Multipart) -> Result<UploadedReceipt, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map_or_else(|| "receipt".to_string(), str::to_string);
        let content_type = receipt_content_type(field.content_type(), &filename);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;

        return Ok(UploadedReceipt {
            filename,
            content_type,
            data,
        });
    }

    Err(ApiError::validation("Multipart field 'file' is required"))
}

fn require_storage(state: &AppState) -> Result<&ReceiptStorage, ApiError> {
    state
        .storage
        .as_deref()
        .ok_or_else(|| ApiError::unavailable("receipt storage is not configured"))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/invoices/upload`
///
/// Stores the receipt, runs extraction and creates a draft. A failed
/// extraction still creates the draft, flagged `ai_failed`.
async fn upload_receipt(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let storage = require_storage(&state)?;
    let receipt = read_receipt(multipart).await?;
    storage.validate_receipt(&receipt.content_type, receipt.data.len() as u64)?;

    let key = ReceiptStorage::receipt_key(ctx.user_id, Uuid::now_v7(), &receipt.filename);
    storage
        .put(&key, receipt.data.clone(), &receipt.content_type)
        .await?;

    let extracted = match &state.vision {
        Some(vision) => match vision.extract(&receipt.data, &receipt.content_type).await {
            Ok(details) => Some(details),
            Err(e) => {
                warn!(user_id = %ctx.user_id, error = %e, "Receipt extraction failed");
                None
            }
        },
        None => None,
    };

    let service = state.expense_service();
    match service.create_draft(&ctx, Some(key.clone()), extracted).await {
        Ok(expense) => {
            info!(invoice_id = %expense.id, key = %key, "Receipt uploaded");
            Ok((StatusCode::CREATED, Json(expense)))
        }
        Err(e) => {
            if let Err(cleanup) = storage.delete(&key).await {
                warn!(key = %key, error = %cleanup, "Orphaned receipt blob");
            }
            Err(e.into())
        }
    }
}

/// GET `/invoices`
async fn list_invoices(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ListInvoicesQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = query.status()?;
    let scope = ExpenseScope::for_listing(&ctx);
    let page = InvoiceRepository::new((*state.db).clone())
        .list(&scope, status, &query.page())
        .await?;
    Ok(Json(page))
}

/// GET `/invoices/{id}`
async fn get_invoice(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let expense = state.expense_service().get(&ctx, id).await?;
    Ok(Json(expense))
}

/// POST `/invoices/{id}/check`
async fn check_invoice(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ValidateInvoiceInput>,
) -> ApiResult<impl IntoResponse> {
    let preview = state.expense_service().check(&ctx, id, &input).await?;
    Ok(Json(preview))
}

/// POST `/invoices/{id}/validate`
///
/// Notifications go out after the rows are persisted.
async fn validate_invoice(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ValidateInvoiceInput>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .expense_service()
        .validate_invoice(&ctx, id, &input)
        .await?;
    state.dispatcher().dispatch_all(outcome.notifications());
    Ok(Json(outcome))
}

/// POST `/invoices/{id}/approve`
async fn approve_invoice(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let (expense, notification) = state.expense_service().approve(&ctx, id).await?;
    state.dispatcher().dispatch_all(vec![notification]);
    Ok(Json(expense))
}

/// POST `/invoices/{id}/reject`
async fn reject_invoice(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> ApiResult<impl IntoResponse> {
    let expense = state
        .expense_service()
        .reject(&ctx, id, body.reason)
        .await?;
    Ok(Json(expense))
}

/// POST `/invoices/{id}/submit-to-bc`
async fn submit_to_bc(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let expense = state.expense_service().submit_to_bc(&ctx, id).await?;
    Ok(Json(expense))
}

/// DELETE `/invoices/{id}`
///
/// The row goes first; a blob that cannot be removed is only logged.
async fn delete_invoice(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let key = state.expense_service().delete(&ctx, id).await?;

    match (key, state.storage.as_deref()) {
        (Some(key), Some(storage)) => {
            if let Err(e) = storage.delete(&key).await {
                warn!(invoice_id = %id, key = %key, error = %e, "Failed to delete receipt blob");
            }
        }
        (Some(key), None) => {
            warn!(invoice_id = %id, key = %key, "Storage not configured, receipt blob kept");
        }
        (None, _) => {}
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET `/invoices/{id}/receipt`
async fn receipt_url(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PresignedUrl>> {
    let expense = state.expense_service().get(&ctx, id).await?;
    let key = expense
        .receipt_key
        .ok_or_else(|| ApiError::App(AppError::NotFound(format!("Invoice {id} has no receipt"))))?;
    let url = require_storage(&state)?.presign_download(&key).await?;
    Ok(Json(url))
}

/// GET `/invoices/{id}/accounting-rows`
async fn accounting_rows(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<AccountingRow>>> {
    let expense = state.expense_service().get(&ctx, id).await?;
    if !ctx.can_export(expense.branch.as_deref()) {
        return Err(ApiError::forbidden("accounting rows of this branch"));
    }

    let expenses = [expense];
    let areas = owner_areas(&ProfileRepository::new((*state.db).clone()), &expenses).await?;
    Ok(Json(build_rows(&expenses, &areas, &state.accounting)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("image/JPEG"), "ticket.bin", "image/jpeg")]
    #[case(Some("application/octet-stream"), "factura.PDF", "application/pdf")]
    #[case(None, "foto.png", "image/png")]
    #[case(Some("  "), "scan.webp", "image/webp")]
    #[case(None, "sin-extension", "application/octet-stream")]
    fn test_receipt_content_type(
        #[case] declared: Option<&str>,
        #[case] filename: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(receipt_content_type(declared, filename), expected);
    }

    #[test]
    fn test_list_query_status() {
        let query = ListInvoicesQuery {
            status: Some("pending_approval".into()),
            ..Default::default()
        };
        assert_eq!(query.status().unwrap(), Some(ExpenseStatus::PendingApproval));

        let blank = ListInvoicesQuery {
            status: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(blank.status().unwrap(), None);

        let bad = ListInvoicesQuery {
            status: Some("paid".into()),
            ..Default::default()
        };
        assert!(bad.status().is_err());
    }

    #[test]
    fn test_list_query_page_defaults() {
        let page = ListInvoicesQuery::default().page();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 20);

        let custom = ListInvoicesQuery {
            page: Some(3),
            per_page: Some(50),
            ..Default::default()
        };
        assert_eq!(custom.page().offset(), 100);
    }
}
