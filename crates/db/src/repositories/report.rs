//! Branch spend report.

use chrono::NaiveDate;
use expensedesk_core::budget::{BudgetEvaluator, ConsumptionRecord, MonthWindow, UserSpend};
use expensedesk_core::expense::ExpenseScope;
use expensedesk_core::provisioning::Profile;
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use uuid::Uuid;

use super::invoice::InvoiceRepository;
use super::profile::ProfileRepository;

/// One user's line of the spend report.
#[derive(Debug, Clone, Serialize)]
pub struct BranchSpendLine {
    /// User ID.
    pub user_id: Uuid,
    /// Display name.
    pub full_name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Assigned branches.
    pub branches: Vec<String>,
    /// Month-to-date spend per class.
    pub spend: UserSpend,
}

/// Spend report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    profiles: ProfileRepository,
    invoices: InvoiceRepository,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            profiles: ProfileRepository::new(db.clone()),
            invoices: InvoiceRepository::new(db),
        }
    }

    /// Month-to-date consumption of every user in scope.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn branch_spend(
        &self,
        scope: &ExpenseScope,
        as_of: NaiveDate,
    ) -> Result<Vec<BranchSpendLine>, DbErr> {
        let profiles = self.profiles.in_branches(scope.branches()).await?;
        let user_ids: Vec<Uuid> = profiles.iter().map(|p| p.id).collect();
        let records = self
            .invoices
            .consumption_for_users(&user_ids, MonthWindow::containing(as_of))
            .await?;

        Ok(assemble(profiles, &records, as_of))
    }
}

/// Pairs every profile with its summary. Profiles without invoices get
/// zero consumption.
pub(crate) fn assemble(
    profiles: Vec<Profile>,
    records: &[ConsumptionRecord],
    as_of: NaiveDate,
) -> Vec<BranchSpendLine> {
    profiles
        .into_iter()
        .map(|p| {
            let spend = BudgetEvaluator::summarize(p.id, &p.limits(), as_of, records);
            BranchSpendLine {
                user_id: p.id,
                full_name: p.full_name,
                email: p.email,
                branches: p.branches,
                spend,
            }
        })
        .collect()
}
