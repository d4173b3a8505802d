//! Pre-persistence checks shared by the interactive check and the commit path.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use super::error::ExpenseError;
use super::types::Expense;

/// Largest amount a `NUMERIC(19, 4)` column holds.
#[must_use]
pub fn max_amount() -> Decimal {
    Decimal::from_i128_with_scale(9_999_999_999_999_999_999, 4)
}

/// Stateless validator.
pub struct ExpenseValidator;

impl ExpenseValidator {
    /// Names of mandatory fields that are still empty.
    #[must_use]
    pub fn missing_fields(expense: &Expense) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if expense.date.is_none() {
            missing.push("date");
        }
        if expense.payment_method.is_none() {
            missing.push("payment_method");
        }
        if is_blank(expense.category.as_deref()) {
            missing.push("category");
        }
        if is_blank(expense.vendor()) {
            missing.push("vendor");
        }
        missing
    }

    /// Oldest accepted invoice date.
    #[must_use]
    pub fn oldest_allowed(today: NaiveDate, staleness_days: u64) -> NaiveDate {
        today
            .checked_sub_days(Days::new(staleness_days))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Rejects dates older than `staleness_days` before today, or after today.
    ///
    /// A date exactly `staleness_days` old is accepted.
    pub fn check_date(
        date: NaiveDate,
        today: NaiveDate,
        staleness_days: u64,
    ) -> Result<(), ExpenseError> {
        let oldest_allowed = Self::oldest_allowed(today, staleness_days);
        if date < oldest_allowed {
            return Err(ExpenseError::StaleInvoice {
                date,
                oldest_allowed,
            });
        }
        if date > today {
            return Err(ExpenseError::FutureDate(date));
        }
        Ok(())
    }

    /// Tax lines must be non-negative and fit the stored precision.
    pub fn check_taxes(expense: &Expense) -> Result<(), ExpenseError> {
        let max = max_amount();
        match expense
            .details
            .taxes
            .iter()
            .find(|t| t.amount.is_sign_negative() || t.amount > max)
        {
            Some(tax) => Err(ExpenseError::InvalidTaxAmount {
                name: tax.name.clone(),
                amount: tax.amount,
            }),
            None => Ok(()),
        }
    }

    /// Full check: required fields, then amounts, then date.
    pub fn check(
        expense: &Expense,
        today: NaiveDate,
        staleness_days: u64,
    ) -> Result<(), ExpenseError> {
        let missing = Self::missing_fields(expense);
        if !missing.is_empty() {
            return Err(ExpenseError::MissingFields(missing));
        }

        if expense.total_amount <= Decimal::ZERO || expense.total_amount > max_amount() {
            return Err(ExpenseError::InvalidAmount(expense.total_amount));
        }
        Self::check_taxes(expense)?;

        match expense.date {
            Some(date) => Self::check_date(date, today, staleness_days),
            None => Err(ExpenseError::MissingFields(vec!["date"])),
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
