//! Accounting export.

use std::collections::HashMap;

use axum::{
    Router,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
};
use expensedesk_core::accounting::{
    AccountingGenerator, AccountingInvoice, AccountingRow, to_tsv,
};
use expensedesk_core::expense::{Expense, ExpenseScope};
use expensedesk_core::provisioning::Profile;
use expensedesk_db::{InvoiceRepository, ProfileRepository};
use expensedesk_shared::AccountingConfig;
use sea_orm::DbErr;

/// Creates the accounting routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/accounting/export", get(export_tsv))
}

/// Query parameters for the export.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Decimal separator override, `,` or `.`.
    #[serde(default)]
    pub decimal_separator: Option<char>,
}

/// Distinct owners of the expenses, in a stable order.
fn owner_ids(expenses: &[Expense]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = expenses.iter().map(|e| e.user_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Owner ID to area, for owners that have one.
fn areas_by_owner(profiles: Vec<Profile>) -> HashMap<Uuid, String> {
    profiles
        .into_iter()
        .filter_map(|p| p.area.map(|area| (p.id, area)))
        .collect()
}

/// Areas of the expenses' owners, looked up by owner ID so rows do not
/// depend on which branches the caller manages.
pub(crate) async fn owner_areas(
    profiles: &ProfileRepository,
    expenses: &[Expense],
) -> Result<HashMap<Uuid, String>, DbErr> {
    let owners = profiles.find_by_ids(&owner_ids(expenses)).await?;
    Ok(areas_by_owner(owners))
}

/// Rows for every expense, each with its owner's area.
pub(crate) fn build_rows(
    expenses: &[Expense],
    areas: &HashMap<Uuid, String>,
    config: &AccountingConfig,
) -> Vec<AccountingRow> {
    expenses
        .iter()
        .flat_map(|expense| {
            let area = areas.get(&expense.user_id).map(String::as_str);
            let invoice = AccountingInvoice::from_expense(expense, area);
            AccountingGenerator::generate_rows(&invoice, config)
        })
        .collect()
}

/// GET `/accounting/export`
///
/// Tab-separated rows of every approved invoice in the caller's scope.
async fn export_tsv(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ExportQuery>,
) -> ApiResult<impl IntoResponse> {
    let scope = ExpenseScope::for_reporting(&ctx)
        .ok_or_else(|| ApiError::forbidden("exporting accounting rows"))?;

    let separator = match query.decimal_separator {
        None => state.accounting.decimal_separator,
        Some(sep @ (',' | '.')) => sep,
        Some(other) => {
            return Err(ApiError::validation(format!(
                "Unsupported decimal separator '{other}'"
            )));
        }
    };

    let expenses = InvoiceRepository::new((*state.db).clone())
        .approved_in_scope(&scope)
        .await?;
    let areas = owner_areas(&ProfileRepository::new((*state.db).clone()), &expenses).await?;

    let rows = build_rows(&expenses, &areas, &state.accounting);
    info!(
        user_id = %ctx.user_id,
        invoices = expenses.len(),
        rows = rows.len(),
        "Accounting export generated"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/tab-separated-values; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"compras.tsv\"",
            ),
        ],
        to_tsv(&rows, separator),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use expensedesk_core::accounting::VatGroup;
    use expensedesk_core::auth::Role;
    use expensedesk_core::extraction::TaxLine;
    use rust_decimal_macros::dec;

    fn expense(user_id: Uuid, letter: &str, total: rust_decimal::Decimal) -> Expense {
        let mut expense = Expense::draft(user_id);
        expense.total_amount = total;
        expense.branch = Some("Rosario".into());
        expense.details.vendor = Some("YPF".into());
        expense.details.letter_type = Some(letter.into());
        expense
    }

    #[test]
    fn test_build_rows_uses_owner_area() {
        let owner = Uuid::new_v4();
        let mut factura = expense(owner, "FACTURA A", dec!(1210));
        factura.details.taxes = vec![TaxLine::new("IVA 21%", dec!(210))];
        let ticket = expense(Uuid::new_v4(), "TICKET", dec!(500));

        let config = AccountingConfig::default();
        let areas = HashMap::from([(owner, "Ventas".to_string())]);
        let rows = build_rows(&[factura, ticket], &areas, &config);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].vat_group, VatGroup::Iva21);
        assert_eq!(rows[0].unit_cost, dec!(1000));
        assert_eq!(rows[0].area_code, config.area_code(Some("Ventas")));
        assert_eq!(rows[1].vat_group, VatGroup::NoGravado);
        assert_eq!(rows[1].area_code, config.area_code(None));
    }

    fn profile(id: Uuid, branch: &str, area: Option<&str>) -> Profile {
        Profile {
            id,
            email: None,
            full_name: None,
            role: Role::User,
            branches: vec![branch.to_string()],
            area: area.map(str::to_string),
            monthly_limit: None,
            cash_limit: None,
            permissions: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_ids_are_distinct() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let expenses = [
            expense(a, "A", dec!(10)),
            expense(b, "A", dec!(10)),
            expense(a, "C", dec!(10)),
        ];
        let ids = owner_ids(&expenses);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a) && ids.contains(&b));
    }

    #[test]
    fn test_split_share_owner_from_other_branch_keeps_area() {
        let mut config = AccountingConfig::default();
        config
            .area_codes
            .insert("logistica".to_string(), "LOG".to_string());

        // A share of a Rosario expense owned by someone assigned to Mendoza.
        let participant = Uuid::new_v4();
        let share = expense(participant, "TICKET", dec!(250));
        let areas = areas_by_owner(vec![profile(participant, "Mendoza", Some("Logistica"))]);

        let export = build_rows(std::slice::from_ref(&share), &areas, &config);
        let single = AccountingGenerator::generate_rows(
            &AccountingInvoice::from_expense(&share, Some("Logistica")),
            &config,
        );
        assert_eq!(export, single);
        assert_eq!(export[0].area_code, "LOG");
    }

    #[test]
    fn test_areas_by_owner_skips_profiles_without_area() {
        let with = Uuid::new_v4();
        let without = Uuid::new_v4();
        let areas = areas_by_owner(vec![
            profile(with, "Rosario", Some("Ventas")),
            profile(without, "Rosario", None),
        ]);
        assert_eq!(areas.get(&with).map(String::as_str), Some("Ventas"));
        assert!(!areas.contains_key(&without));
    }
}
