//! Expense operations.

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use expensedesk_shared::PolicyConfig;
use expensedesk_shared::types::Currency;
use serde::Serialize;
use uuid::Uuid;

use super::error::ExpenseError;
use super::lifecycle::ExpenseLifecycle;
use super::types::{Expense, ExpenseStatus, ValidateInvoiceInput};
use super::validation::ExpenseValidator;
use crate::auth::AuthContext;
use crate::budget::{
    BudgetCheck, BudgetEvaluation, BudgetEvaluator, BudgetLimits, BudgetVerdict,
    ConsumptionRecord, MonthWindow,
};
use crate::extraction::ExtractedInvoice;
use crate::notification::NotificationRequest;
use crate::split::{SplitCalculator, SplitPlan};

/// Persistence needed by [`ExpenseService`].
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait ExpenseStore: Send + Sync {
    /// Find an expense by ID.
    fn find_expense(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Expense>, ExpenseError>> + Send;

    /// Insert a new expense.
    fn insert_expense(
        &self,
        expense: &Expense,
    ) -> impl Future<Output = Result<Expense, ExpenseError>> + Send;

    /// Overwrite an existing expense.
    fn update_expense(
        &self,
        expense: &Expense,
    ) -> impl Future<Output = Result<Expense, ExpenseError>> + Send;

    /// Delete an expense. Returns false if it did not exist.
    fn delete_expense(&self, id: Uuid) -> impl Future<Output = Result<bool, ExpenseError>> + Send;

    /// The user's invoices dated inside `window`.
    fn consumption_records(
        &self,
        user_id: Uuid,
        window: MonthWindow,
    ) -> impl Future<Output = Result<Vec<ConsumptionRecord>, ExpenseError>> + Send;

    /// The user's limits, `None` when the user has no profile.
    fn budget_limits(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<BudgetLimits>, ExpenseError>> + Send;
}

/// One persisted invoice with the evaluation that set its status.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedExpense {
    /// Persisted expense.
    pub expense: Expense,
    /// Budget evaluation.
    pub evaluation: BudgetEvaluation,
}

/// A participant whose share could not be created.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedParticipant {
    /// Participant.
    pub user_id: Uuid,
    /// Why the share was not created.
    pub reason: String,
}

/// Result of a validation, plain or split.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    /// The owner's invoice.
    pub parent: ValidatedExpense,
    /// Shares created for the other participants.
    pub children: Vec<ValidatedExpense>,
    /// Participants skipped after a failure.
    pub skipped: Vec<SkippedParticipant>,
}

impl ValidationOutcome {
    /// One notification per persisted invoice.
    #[must_use]
    pub fn notifications(&self) -> Vec<NotificationRequest> {
        std::iter::once(&self.parent)
            .chain(&self.children)
            .map(|v| NotificationRequest::new(v.evaluation.status, &v.expense, Some(v.evaluation)))
            .collect()
    }
}

/// Expense operations, authorization included.
pub struct ExpenseService<S: ExpenseStore> {
    store: Arc<S>,
    policy: PolicyConfig,
}

impl<S: ExpenseStore> ExpenseService<S> {
    /// Create a new expense service.
    #[must_use]
    pub fn new(store: Arc<S>, policy: PolicyConfig) -> Self {
        Self { store, policy }
    }

    /// Today in the policy timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.policy.today()
    }

    /// Creates the draft for a freshly uploaded receipt.
    ///
    /// `extracted` is `None` when the vision call failed; the draft is then
    /// flagged `ai_failed` for manual completion.
    pub async fn create_draft(
        &self,
        ctx: &AuthContext,
        receipt_key: Option<String>,
        extracted: Option<ExtractedInvoice>,
    ) -> Result<Expense, ExpenseError> {
        let mut expense = Expense::draft(ctx.user_id);
        expense.receipt_key = receipt_key;
        expense.branch = ctx.primary_branch().map(str::to_string);

        match extracted {
            Some(details) => {
                expense.date = details.date;
                expense.total_amount = details.total.unwrap_or_default();
                expense.currency = details
                    .currency
                    .as_deref()
                    .and_then(Currency::parse_lenient)
                    .unwrap_or_default();
                expense.details = details;
            }
            None => expense.ai_failed = true,
        }

        let expense = self.store.insert_expense(&expense).await?;
        tracing::info!(
            invoice_id = %expense.id,
            user_id = %expense.user_id,
            ai_failed = expense.ai_failed,
            "Draft created"
        );
        Ok(expense)
    }

    /// Loads an expense the caller may see.
    pub async fn get(&self, ctx: &AuthContext, id: Uuid) -> Result<Expense, ExpenseError> {
        let expense = self.load(id).await?;
        if !ctx.can_view(expense.user_id, expense.branch.as_deref()) {
            return Err(ExpenseError::NotFound(id));
        }
        Ok(expense)
    }

    /// Interactive pre-validation. Applies the form to a copy and runs
    /// every check the commit path runs; writes nothing.
    pub async fn check(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        input: &ValidateInvoiceInput,
    ) -> Result<Expense, ExpenseError> {
        let expense = self.load(id).await?;
        let preview = self.prepare(ctx, expense, input)?;
        if !input.participants.is_empty() {
            SplitCalculator::plan(&preview, &input.participants)?;
        }
        Ok(preview)
    }

    /// Commits the owner's validation, splitting the expense when
    /// participants are given.
    ///
    /// The parent update aborts everything on failure. A failed share is
    /// logged and its participant skipped; there is no group transaction.
    pub async fn validate_invoice(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        input: &ValidateInvoiceInput,
    ) -> Result<ValidationOutcome, ExpenseError> {
        let expense = self.load(id).await?;
        let mut expense = self.prepare(ctx, expense, input)?;

        let plan = if input.participants.is_empty() {
            None
        } else {
            Some(SplitCalculator::plan(&expense, &input.participants)?)
        };
        if let Some(plan) = &plan {
            SplitCalculator::apply_parent(plan, &mut expense);
        }

        let limits = self
            .store
            .budget_limits(expense.user_id)
            .await?
            .unwrap_or_default();
        let evaluation = self.evaluate(&expense, &limits, Some(expense.id)).await?;
        ExpenseLifecycle::validate(expense.status, evaluation.status)?.apply(&mut expense);

        let parent = self.store.update_expense(&expense).await?;
        tracing::info!(
            invoice_id = %parent.id,
            status = %parent.status,
            consumed = %evaluation.consumed_before_this,
            limit = %evaluation.limit,
            split_group_id = ?parent.split_group_id,
            "Expense validated"
        );

        let mut outcome = ValidationOutcome {
            parent: ValidatedExpense {
                expense: parent,
                evaluation,
            },
            children: Vec::new(),
            skipped: Vec::new(),
        };

        if let Some(plan) = plan {
            for participant in &plan.participants {
                match self
                    .create_share(&plan, &outcome.parent.expense, *participant)
                    .await
                {
                    Ok(child) => outcome.children.push(child),
                    Err(e) => {
                        tracing::warn!(
                            split_group_id = %plan.group_id,
                            participant = %participant,
                            error = %e,
                            "Split share skipped"
                        );
                        outcome.skipped.push(SkippedParticipant {
                            user_id: *participant,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Approves an over-budget expense.
    pub async fn approve(
        &self,
        ctx: &AuthContext,
        id: Uuid,
    ) -> Result<(Expense, NotificationRequest), ExpenseError> {
        let mut expense = self.load(id).await?;
        if !ctx.can_review(expense.branch.as_deref()) {
            return Err(ExpenseError::forbidden("approving expenses of this branch"));
        }

        ExpenseLifecycle::approve(expense.status, ctx.user_id)?.apply(&mut expense);
        let expense = self.store.update_expense(&expense).await?;
        tracing::info!(invoice_id = %expense.id, reviewer = %ctx.user_id, "Expense approved");

        let notification = NotificationRequest::new(BudgetVerdict::Approved, &expense, None);
        Ok((expense, notification))
    }

    /// Rejects a non-terminal expense.
    pub async fn reject(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        reason: String,
    ) -> Result<Expense, ExpenseError> {
        let mut expense = self.load(id).await?;
        if !ctx.can_review(expense.branch.as_deref()) {
            return Err(ExpenseError::forbidden("rejecting expenses of this branch"));
        }

        ExpenseLifecycle::reject(expense.status, ctx.user_id, reason)?.apply(&mut expense);
        let expense = self.store.update_expense(&expense).await?;
        tracing::info!(invoice_id = %expense.id, reviewer = %ctx.user_id, "Expense rejected");
        Ok(expense)
    }

    /// Confirms the accounting entry was made.
    pub async fn submit_to_bc(&self, ctx: &AuthContext, id: Uuid) -> Result<Expense, ExpenseError> {
        let mut expense = self.load(id).await?;
        if !ctx.can_export(expense.branch.as_deref()) {
            return Err(ExpenseError::forbidden("submitting expenses of this branch"));
        }

        ExpenseLifecycle::submit_to_bc(expense.status)?.apply(&mut expense);
        let expense = self.store.update_expense(&expense).await?;
        tracing::info!(invoice_id = %expense.id, by = %ctx.user_id, "Expense submitted to BC");
        Ok(expense)
    }

    /// Deletes an expense.
    ///
    /// Returns the receipt key the caller should remove from storage. Split
    /// shares reference the same blob, so their key is never returned.
    pub async fn delete(
        &self,
        ctx: &AuthContext,
        id: Uuid,
    ) -> Result<Option<String>, ExpenseError> {
        let expense = self.load(id).await?;
        if !ctx.can_edit(expense.user_id) {
            return Err(ExpenseError::forbidden("deleting another user's expense"));
        }
        ExpenseLifecycle::ensure_deletable(expense.status, ctx.is_admin())?;

        if !self.store.delete_expense(id).await? {
            return Err(ExpenseError::NotFound(id));
        }
        tracing::info!(invoice_id = %id, by = %ctx.user_id, "Expense deleted");

        Ok(if expense.is_split() {
            None
        } else {
            expense.receipt_key
        })
    }

    async fn load(&self, id: Uuid) -> Result<Expense, ExpenseError> {
        self.store
            .find_expense(id)
            .await?
            .ok_or(ExpenseError::NotFound(id))
    }

    /// Shared front half of check and validate.
    fn prepare(
        &self,
        ctx: &AuthContext,
        mut expense: Expense,
        input: &ValidateInvoiceInput,
    ) -> Result<Expense, ExpenseError> {
        if !ctx.can_edit(expense.user_id) {
            return Err(ExpenseError::forbidden("validating another user's expense"));
        }
        if let Some(group) = expense.split_group_id {
            return Err(ExpenseError::AlreadySplit(group));
        }
        if !matches!(
            expense.status,
            ExpenseStatus::Draft | ExpenseStatus::PendingApproval
        ) {
            return Err(ExpenseError::InvalidTransition {
                from: expense.status,
                to: ExpenseStatus::Approved,
            });
        }

        input.form.apply(&mut expense);
        if expense.branch.is_none() && expense.user_id == ctx.user_id {
            expense.branch = ctx.primary_branch().map(str::to_string);
        }

        ExpenseValidator::check(&expense, self.today(), self.policy.staleness_days)?;
        Ok(expense)
    }

    async fn create_share(
        &self,
        plan: &SplitPlan,
        parent: &Expense,
        participant: Uuid,
    ) -> Result<ValidatedExpense, ExpenseError> {
        let limits = self
            .store
            .budget_limits(participant)
            .await?
            .ok_or(ExpenseError::UnknownParticipant(participant))?;

        let mut child = SplitCalculator::child_for(plan, parent, participant);
        let evaluation = self.evaluate(&child, &limits, None).await?;
        ExpenseLifecycle::validate(child.status, evaluation.status)?.apply(&mut child);

        let child = self.store.insert_expense(&child).await?;
        Ok(ValidatedExpense {
            expense: child,
            evaluation,
        })
    }

    /// Evaluates against the month of the invoice date.
    async fn evaluate(
        &self,
        expense: &Expense,
        limits: &BudgetLimits,
        exclude: Option<Uuid>,
    ) -> Result<BudgetEvaluation, ExpenseError> {
        let (Some(as_of), Some(method)) = (expense.date, expense.payment_method) else {
            return Err(ExpenseError::MissingFields(vec!["date", "payment_method"]));
        };

        let window = MonthWindow::containing(as_of);
        let records = self
            .store
            .consumption_records(expense.user_id, window)
            .await?;

        let check = BudgetCheck {
            user_id: expense.user_id,
            invoice_id: exclude,
            amount: expense.total_amount,
            payment_class: method.class(),
            as_of,
        };
        Ok(BudgetEvaluator::evaluate(&check, limits, &records))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
