//! Profile types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ProvisioningError;
use crate::auth::{AuthContext, Role};
use crate::budget::BudgetLimits;

/// Shortest password accepted for a new user.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Application profile of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same ID as the identity-provider user.
    pub id: Uuid,
    /// Contact email.
    pub email: Option<String>,
    /// Display name.
    pub full_name: Option<String>,
    /// Application role.
    pub role: Role,
    /// Assigned branch names, first one is the primary branch.
    pub branches: Vec<String>,
    /// Area or department.
    pub area: Option<String>,
    /// Monthly card limit.
    pub monthly_limit: Option<Decimal>,
    /// Monthly cash and transfer limit.
    pub cash_limit: Option<Decimal>,
    /// Free-form permission set.
    pub permissions: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Authorization context for requests made by this user.
    #[must_use]
    pub fn to_auth_context(&self) -> AuthContext {
        AuthContext {
            user_id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            branches: self.branches.clone(),
            area: self.area.clone(),
            permissions: self.permissions.clone(),
        }
    }

    /// Budget limits stored on the profile.
    #[must_use]
    pub fn limits(&self) -> BudgetLimits {
        BudgetLimits {
            monthly_limit: self.monthly_limit,
            cash_limit: self.cash_limit,
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionUserInput {
    /// Login email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Display name.
    pub full_name: String,
    /// Application role.
    #[serde(default)]
    pub role: Role,
    /// Assigned branches.
    #[serde(default)]
    pub branches: Vec<String>,
    /// Area or department.
    #[serde(default)]
    pub area: Option<String>,
    /// Monthly card limit.
    #[serde(default)]
    pub monthly_limit: Option<Decimal>,
    /// Monthly cash and transfer limit.
    #[serde(default)]
    pub cash_limit: Option<Decimal>,
    /// Extra permissions.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl ProvisionUserInput {
    /// Checks the input before anything is created.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed email, a short password,
    /// a blank name or a negative limit.
    pub fn validate(&self) -> Result<(), ProvisioningError> {
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(ProvisioningError::Validation(format!(
                "invalid email: {email}"
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ProvisioningError::Validation(format!(
                "password must have at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        if self.full_name.trim().is_empty() {
            return Err(ProvisioningError::Validation("full_name is required".into()));
        }
        check_limits(self.monthly_limit, self.cash_limit)
    }

    /// The profile row for an identity user created from this input.
    #[must_use]
    pub fn into_profile(self, id: Uuid) -> Profile {
        let now = Utc::now();
        Profile {
            id,
            email: Some(self.email.trim().to_lowercase()),
            full_name: Some(self.full_name.trim().to_string()),
            role: self.role,
            branches: clean_list(self.branches),
            area: self.area.filter(|a| !a.trim().is_empty()),
            monthly_limit: self.monthly_limit,
            cash_limit: self.cash_limit,
            permissions: clean_list(self.permissions),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Admin edit of a profile. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    /// Display name.
    pub full_name: Option<String>,
    /// Application role.
    pub role: Option<Role>,
    /// Replaces the branch list.
    pub branches: Option<Vec<String>>,
    /// Area or department.
    pub area: Option<String>,
    /// Monthly card limit.
    pub monthly_limit: Option<Decimal>,
    /// Monthly cash and transfer limit.
    pub cash_limit: Option<Decimal>,
    /// Replaces the permission set.
    pub permissions: Option<Vec<String>>,
}

impl ProfileUpdate {
    /// Applies the update in place.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a negative limit.
    pub fn apply(self, profile: &mut Profile) -> Result<(), ProvisioningError> {
        check_limits(self.monthly_limit, self.cash_limit)?;

        if let Some(name) = self.full_name {
            profile.full_name = Some(name.trim().to_string());
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(branches) = self.branches {
            profile.branches = clean_list(branches);
        }
        if let Some(area) = self.area {
            profile.area = Some(area).filter(|a| !a.trim().is_empty());
        }
        if let Some(limit) = self.monthly_limit {
            profile.monthly_limit = Some(limit);
        }
        if let Some(limit) = self.cash_limit {
            profile.cash_limit = Some(limit);
        }
        if let Some(permissions) = self.permissions {
            profile.permissions = clean_list(permissions);
        }
        profile.updated_at = Utc::now();
        Ok(())
    }
}

fn check_limits(
    monthly_limit: Option<Decimal>,
    cash_limit: Option<Decimal>,
) -> Result<(), ProvisioningError> {
    if [monthly_limit, cash_limit]
        .into_iter()
        .flatten()
        .any(|l| l < Decimal::ZERO)
    {
        return Err(ProvisioningError::Validation(
            "limits cannot be negative".into(),
        ));
    }
    Ok(())
}

/// Trims entries, drops blanks and duplicates, keeps order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
