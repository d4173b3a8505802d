//! HTML bodies for the two notification emails.

use std::fmt::Write as _;

use super::types::{ExpenseContext, OwnerInfo};
use crate::budget::BudgetVerdict;

/// Subject and body ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Renders the email for a verdict.
#[must_use]
pub fn render(
    verdict: BudgetVerdict,
    context: &ExpenseContext,
    owner: &OwnerInfo,
    frontend_url: &str,
) -> RenderedEmail {
    let name = escape(owner.display_name());
    let link = format!(
        "{}/invoices/{}",
        frontend_url.trim_end_matches('/'),
        context.invoice_id
    );

    let (subject, heading, intro, action) = match verdict {
        BudgetVerdict::PendingApproval => (
            format!("Gasto pendiente de aprobación: {}", owner.display_name()),
            "Gasto fuera de presupuesto",
            format!(
                "{name} cargó un gasto que supera su presupuesto mensual y requiere aprobación."
            ),
            "Revisar gasto",
        ),
        BudgetVerdict::Approved => (
            format!("Gasto listo para contabilizar: {}", owner.display_name()),
            "Gasto aprobado",
            format!(
                "{name} cargó un gasto aprobado que está listo para cargarse en Business Central."
            ),
            "Ver gasto",
        ),
    };

    let mut rows = String::new();
    row(&mut rows, "Proveedor", context.vendor.as_deref().unwrap_or("-"));
    row(
        &mut rows,
        "Importe",
        &format!("{} {:.2}", context.currency, context.amount),
    );
    row(
        &mut rows,
        "Fecha",
        &context
            .date
            .map_or_else(|| "-".to_string(), |d| d.format("%d/%m/%Y").to_string()),
    );
    row(&mut rows, "Categoría", context.category.as_deref().unwrap_or("-"));
    row(&mut rows, "Sucursal", context.branch.as_deref().unwrap_or("-"));
    if let Some(eval) = &context.evaluation {
        row(
            &mut rows,
            "Consumido este mes",
            &format!("{:.2} de {:.2}", eval.consumed_before_this, eval.limit),
        );
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #222;">
  <h2>{heading}</h2>
  <p>{intro}</p>
  <table cellpadding="6" style="border-collapse: collapse;">
{rows}  </table>
  <p><a href="{link}" style="background:#2563eb;color:#fff;padding:10px 16px;text-decoration:none;border-radius:4px;">{action}</a></p>
</body>
</html>"#,
        link = escape(&link),
    );

    RenderedEmail { subject, html }
}

fn row(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(
        out,
        "    <tr><td><strong>{}</strong></td><td>{}</td></tr>",
        escape(label),
        escape(value)
    );
}

/// Minimal HTML escaping for interpolated values.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::Expense;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn context() -> ExpenseContext {
        let mut expense = Expense::draft(Uuid::new_v4());
        expense.total_amount = dec!(1234.5);
        expense.details.vendor = Some("Bar <Tito> & Co".to_string());
        expense.branch = Some("Rosario".to_string());
        ExpenseContext::from_expense(&expense, None)
    }

    #[test]
    fn test_admin_alert_subject_and_link() {
        let ctx = context();
        let owner = OwnerInfo {
            full_name: Some("Ana Pérez".to_string()),
            ..OwnerInfo::default()
        };
        let email = render(
            BudgetVerdict::PendingApproval,
            &ctx,
            &owner,
            "https://gastos.example.com/",
        );
        assert_eq!(email.subject, "Gasto pendiente de aprobación: Ana Pérez");
        assert!(email.html.contains(&format!(
            "https://gastos.example.com/invoices/{}",
            ctx.invoice_id
        )));
        assert!(email.html.contains("ARS 1234.50"));
    }

    #[test]
    fn test_values_are_escaped() {
        let email = render(
            BudgetVerdict::Approved,
            &context(),
            &OwnerInfo::default(),
            "http://localhost:3000",
        );
        assert!(email.html.contains("Bar &lt;Tito&gt; &amp; Co"));
        assert!(email.subject.starts_with("Gasto listo para contabilizar"));
        assert!(email.html.contains("Un usuario"));
    }
}
