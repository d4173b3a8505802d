//! Invoice repository for database operations.
//!
//! Implements [`ExpenseStore`] plus the scoped listings used by the
//! invoice list, the accounting export and the spend report.

use chrono::Utc;
use expensedesk_core::budget::{BudgetLimits, ConsumptionRecord, MonthWindow, PaymentMethod};
use expensedesk_core::expense::{Expense, ExpenseError, ExpenseScope, ExpenseStatus, ExpenseStore};
use expensedesk_core::extraction::ExtractedInvoice;
use expensedesk_shared::types::{Currency, PageRequest, PageResponse};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{
    invoices, profiles,
    sea_orm_active_enums::{InvoiceStatus as DbStatus, PaymentMethod as DbPaymentMethod},
};

/// Invoice repository implementation.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists invoices in scope, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        scope: &ExpenseScope,
        status: Option<ExpenseStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<Expense>, DbErr> {
        let page = page.normalized();
        let mut query = invoices::Entity::find().filter(scope_condition(scope));
        if let Some(status) = status {
            query = query.filter(invoices::Column::Status.eq(status_to_db(status)));
        }

        let paginator = query
            .order_by_desc(invoices::Column::CreatedAt)
            .order_by_desc(invoices::Column::Id)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.index()).await?;

        Ok(PageResponse::new(
            models.into_iter().map(to_domain).collect(),
            &page,
            total,
        ))
    }

    /// Approved invoices in scope, oldest first, ready for the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn approved_in_scope(&self, scope: &ExpenseScope) -> Result<Vec<Expense>, DbErr> {
        let models = invoices::Entity::find()
            .filter(scope_condition(scope))
            .filter(invoices::Column::Status.eq(DbStatus::Approved))
            .order_by_asc(invoices::Column::Date)
            .order_by_asc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    /// Consumption projections of several users inside one month.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn consumption_for_users(
        &self,
        user_ids: &[Uuid],
        window: MonthWindow,
    ) -> Result<Vec<ConsumptionRecord>, DbErr> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = invoices::Entity::find()
            .filter(invoices::Column::UserId.is_in(user_ids.iter().copied()))
            .filter(invoices::Column::Date.between(window.start, window.end))
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(|m| to_domain(m).consumption_record())
            .collect())
    }
}

impl ExpenseStore for InvoiceRepository {
    async fn find_expense(&self, id: Uuid) -> Result<Option<Expense>, ExpenseError> {
        let model = invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ExpenseError::Database(e.to_string()))?;
        Ok(model.map(to_domain))
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<Expense, ExpenseError> {
        let model = to_active_model(expense)
            .insert(&self.db)
            .await
            .map_err(|e| ExpenseError::Database(e.to_string()))?;
        Ok(to_domain(model))
    }

    async fn update_expense(&self, expense: &Expense) -> Result<Expense, ExpenseError> {
        let mut active = to_active_model(expense);
        active.updated_at = Set(Utc::now().into());

        match active.update(&self.db).await {
            Ok(model) => Ok(to_domain(model)),
            Err(DbErr::RecordNotUpdated) => Err(ExpenseError::NotFound(expense.id)),
            Err(e) => Err(ExpenseError::Database(e.to_string())),
        }
    }

    async fn delete_expense(&self, id: Uuid) -> Result<bool, ExpenseError> {
        let result = invoices::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ExpenseError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    async fn consumption_records(
        &self,
        user_id: Uuid,
        window: MonthWindow,
    ) -> Result<Vec<ConsumptionRecord>, ExpenseError> {
        self.consumption_for_users(&[user_id], window)
            .await
            .map_err(|e| ExpenseError::Database(e.to_string()))
    }

    async fn budget_limits(&self, user_id: Uuid) -> Result<Option<BudgetLimits>, ExpenseError> {
        let profile = profiles::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| ExpenseError::Database(e.to_string()))?;

        Ok(profile.map(|p| BudgetLimits {
            monthly_limit: p.monthly_limit,
            cash_limit: p.cash_limit,
        }))
    }
}

/// Translates a visibility scope into a WHERE condition. Branch names
/// compare case-insensitively.
fn scope_condition(scope: &ExpenseScope) -> Condition {
    let branch_in = |branches: &[String]| {
        Expr::expr(Func::lower(Expr::col(invoices::Column::Branch)))
            .is_in(branches.iter().map(|b| b.trim().to_lowercase()))
    };

    match scope {
        ExpenseScope::All => Condition::all(),
        ExpenseScope::Own(user_id) => Condition::all().add(invoices::Column::UserId.eq(*user_id)),
        ExpenseScope::Branches(branches) => Condition::all().add(branch_in(branches)),
        ExpenseScope::OwnOrBranches { user_id, branches } => Condition::any()
            .add(invoices::Column::UserId.eq(*user_id))
            .add(branch_in(branches)),
    }
}

pub(crate) const fn status_to_db(status: ExpenseStatus) -> DbStatus {
    match status {
        ExpenseStatus::Draft => DbStatus::Draft,
        ExpenseStatus::PendingApproval => DbStatus::PendingApproval,
        ExpenseStatus::Approved => DbStatus::Approved,
        ExpenseStatus::Rejected => DbStatus::Rejected,
        ExpenseStatus::SubmittedToBc => DbStatus::SubmittedToBc,
    }
}

const fn status_from_db(status: DbStatus) -> ExpenseStatus {
    match status {
        DbStatus::Draft => ExpenseStatus::Draft,
        DbStatus::PendingApproval => ExpenseStatus::PendingApproval,
        DbStatus::Approved => ExpenseStatus::Approved,
        DbStatus::Rejected => ExpenseStatus::Rejected,
        DbStatus::SubmittedToBc => ExpenseStatus::SubmittedToBc,
    }
}

const fn payment_to_db(method: PaymentMethod) -> DbPaymentMethod {
    match method {
        PaymentMethod::Cash => DbPaymentMethod::Cash,
        PaymentMethod::Transfer => DbPaymentMethod::Transfer,
        PaymentMethod::CreditCard => DbPaymentMethod::CreditCard,
        PaymentMethod::DebitCard => DbPaymentMethod::DebitCard,
    }
}

const fn payment_from_db(method: DbPaymentMethod) -> PaymentMethod {
    match method {
        DbPaymentMethod::Cash => PaymentMethod::Cash,
        DbPaymentMethod::Transfer => PaymentMethod::Transfer,
        DbPaymentMethod::CreditCard => PaymentMethod::CreditCard,
        DbPaymentMethod::DebitCard => PaymentMethod::DebitCard,
    }
}

/// Convert database model to domain expense.
fn to_domain(model: invoices::Model) -> Expense {
    let details: ExtractedInvoice =
        serde_json::from_value(model.extracted_data).unwrap_or_else(|e| {
            tracing::warn!(invoice_id = %model.id, error = %e, "Unreadable extracted_data");
            ExtractedInvoice::default()
        });

    Expense {
        id: model.id,
        user_id: model.user_id,
        branch: model.branch,
        date: model.date,
        currency: Currency::parse_lenient(&model.currency).unwrap_or_default(),
        total_amount: model.total_amount,
        payment_method: model.payment_method.map(payment_from_db),
        category: model.category,
        details,
        ai_failed: model.ai_failed,
        receipt_key: model.receipt_key,
        status: status_from_db(model.status),
        split_group_id: model.split_group_id,
        is_parent: model.is_parent,
        original_amount: model.original_amount,
        reviewed_by: model.reviewed_by,
        reviewed_at: model.reviewed_at.map(|t| t.with_timezone(&Utc)),
        rejection_reason: model.rejection_reason,
        submitted_to_bc_at: model.submitted_to_bc_at.map(|t| t.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn to_active_model(expense: &Expense) -> invoices::ActiveModel {
    invoices::ActiveModel {
        id: Set(expense.id),
        user_id: Set(expense.user_id),
        branch: Set(expense.branch.clone()),
        date: Set(expense.date),
        currency: Set(expense.currency.as_str().to_string()),
        total_amount: Set(expense.total_amount),
        payment_method: Set(expense.payment_method.map(payment_to_db)),
        category: Set(expense.category.clone()),
        vendor: Set(expense.details.vendor.clone()),
        extracted_data: Set(serde_json::to_value(&expense.details).unwrap_or_default()),
        ai_failed: Set(expense.ai_failed),
        receipt_key: Set(expense.receipt_key.clone()),
        status: Set(status_to_db(expense.status)),
        split_group_id: Set(expense.split_group_id),
        is_parent: Set(expense.is_parent),
        original_amount: Set(expense.original_amount),
        reviewed_by: Set(expense.reviewed_by),
        reviewed_at: Set(expense.reviewed_at.map(Into::into)),
        rejection_reason: Set(expense.rejection_reason.clone()),
        submitted_to_bc_at: Set(expense.submitted_to_bc_at.map(Into::into)),
        created_at: Set(expense.created_at.into()),
        updated_at: Set(expense.updated_at.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use expensedesk_core::extraction::TaxLine;
    use rust_decimal_macros::dec;
    use sea_orm::{DbBackend, QueryTrait};

    fn expense() -> Expense {
        let mut expense = Expense::draft(Uuid::new_v4());
        expense.branch = Some("Rosario".into());
        expense.date = NaiveDate::from_ymd_opt(2026, 3, 10);
        expense.currency = Currency::Usd;
        expense.total_amount = dec!(1210);
        expense.payment_method = Some(PaymentMethod::DebitCard);
        expense.category = Some("Viáticos".into());
        expense.details = ExtractedInvoice {
            vendor: Some("Hotel Patagonia SA".into()),
            letter_type: Some("A".into()),
            taxes: vec![TaxLine::new("IVA 21%", dec!(210))],
            ..ExtractedInvoice::default()
        };
        expense.status = ExpenseStatus::Approved;
        expense
    }

    fn saved(expense: &Expense) -> invoices::Model {
        let a = to_active_model(expense);
        invoices::Model {
            id: a.id.unwrap(),
            user_id: a.user_id.unwrap(),
            branch: a.branch.unwrap(),
            date: a.date.unwrap(),
            currency: a.currency.unwrap(),
            total_amount: a.total_amount.unwrap(),
            payment_method: a.payment_method.unwrap(),
            category: a.category.unwrap(),
            vendor: a.vendor.unwrap(),
            extracted_data: a.extracted_data.unwrap(),
            ai_failed: a.ai_failed.unwrap(),
            receipt_key: a.receipt_key.unwrap(),
            status: a.status.unwrap(),
            split_group_id: a.split_group_id.unwrap(),
            is_parent: a.is_parent.unwrap(),
            original_amount: a.original_amount.unwrap(),
            reviewed_by: a.reviewed_by.unwrap(),
            reviewed_at: a.reviewed_at.unwrap(),
            rejection_reason: a.rejection_reason.unwrap(),
            submitted_to_bc_at: a.submitted_to_bc_at.unwrap(),
            created_at: a.created_at.unwrap(),
            updated_at: a.updated_at.unwrap(),
        }
    }

    #[test]
    fn test_model_conversion_keeps_expense() {
        let original = expense();
        let model = saved(&original);

        assert_eq!(model.vendor.as_deref(), Some("Hotel Patagonia SA"));
        assert_eq!(model.currency, "USD");
        assert_eq!(model.status, DbStatus::Approved);

        let back = to_domain(model);
        assert_eq!(back.id, original.id);
        assert_eq!(back.details, original.details);
        assert_eq!(back.payment_method, Some(PaymentMethod::DebitCard));
        assert_eq!(back.currency, Currency::Usd);
        assert_eq!(back.status, ExpenseStatus::Approved);
    }

    #[test]
    fn test_unreadable_payload_falls_back() {
        let mut model = saved(&expense());
        model.extracted_data = serde_json::json!({ "taxes": "not a list" });
        let back = to_domain(model);
        assert_eq!(back.details, ExtractedInvoice::default());
    }

    #[test]
    fn test_status_mapping_roundtrip() {
        for status in [
            ExpenseStatus::Draft,
            ExpenseStatus::PendingApproval,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
            ExpenseStatus::SubmittedToBc,
        ] {
            assert_eq!(status_from_db(status_to_db(status)), status);
        }
    }

    #[test]
    fn test_scope_sql() {
        let user = Uuid::nil();
        let sql = |scope: ExpenseScope| {
            invoices::Entity::find()
                .filter(scope_condition(&scope))
                .build(DbBackend::Postgres)
                .to_string()
        };

        assert!(!sql(ExpenseScope::All).contains("WHERE"));
        assert!(sql(ExpenseScope::Own(user)).contains(r#""user_id" ="#));

        let branches = sql(ExpenseScope::OwnOrBranches {
            user_id: user,
            branches: vec!["Rosario".into()],
        });
        assert!(branches.contains("LOWER"));
        assert!(branches.contains("'rosario'"));
        assert!(branches.contains(" OR "));
    }
}
