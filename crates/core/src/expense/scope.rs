//! Row-level visibility for listings and exports.

use uuid::Uuid;

use crate::auth::AuthContext;

/// Which invoices a query may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseScope {
    /// Every invoice.
    All,
    /// Invoices owned by one user.
    Own(Uuid),
    /// Invoices of the listed branches.
    Branches(Vec<String>),
    /// Own invoices plus those of the listed branches.
    OwnOrBranches {
        /// Caller.
        user_id: Uuid,
        /// Managed branches.
        branches: Vec<String>,
    },
}

impl ExpenseScope {
    /// Scope of the invoice list: admins see everything, managers their
    /// own invoices and their branches', users only their own.
    #[must_use]
    pub fn for_listing(ctx: &AuthContext) -> Self {
        if ctx.is_admin() {
            Self::All
        } else if ctx.is_manager() && !ctx.branches.is_empty() {
            Self::OwnOrBranches {
                user_id: ctx.user_id,
                branches: ctx.branches.clone(),
            }
        } else {
            Self::Own(ctx.user_id)
        }
    }

    /// Scope of accounting exports and spend reports. `None` for callers
    /// with no reporting rights.
    #[must_use]
    pub fn for_reporting(ctx: &AuthContext) -> Option<Self> {
        if ctx.is_admin() {
            Some(Self::All)
        } else if ctx.is_manager() {
            Some(Self::Branches(ctx.branches.clone()))
        } else {
            None
        }
    }

    /// Returns true if an invoice with this owner and branch is in scope.
    #[must_use]
    pub fn admits(&self, owner: Uuid, branch: Option<&str>) -> bool {
        let in_branches = |branches: &[String]| {
            branch.is_some_and(|b| {
                branches
                    .iter()
                    .any(|m| m.trim().eq_ignore_ascii_case(b.trim()))
            })
        };
        match self {
            Self::All => true,
            Self::Own(user_id) => *user_id == owner,
            Self::Branches(branches) => in_branches(branches),
            Self::OwnOrBranches { user_id, branches } => {
                *user_id == owner || in_branches(branches)
            }
        }
    }

    /// Branch names the scope is limited to, if any.
    #[must_use]
    pub fn branches(&self) -> Option<&[String]> {
        match self {
            Self::Branches(b) | Self::OwnOrBranches { branches: b, .. } => Some(b),
            Self::All | Self::Own(_) => None,
        }
    }
}
