//! Authorization context resolved once per request.
//!
//! The API layer loads the caller's profile after validating the bearer
//! token and hands an [`AuthContext`] to every core operation. Core code
//! never re-reads roles from storage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission that lets a branch manager approve or reject expenses of
/// their own branches.
pub const APPROVE_EXPENSES: &str = "approve_expenses";

/// Application roles stored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular employee submitting expenses.
    #[default]
    User,
    /// Manages one or more branches.
    BranchManager,
    /// Full access.
    Admin,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::BranchManager => "branch_manager",
            Self::Admin => "admin",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Self::User),
            "branch_manager" | "manager" => Some(Self::BranchManager),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is calling, and what they may touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Profile ID (same as the identity-provider user ID).
    pub user_id: Uuid,
    /// Contact email, if known.
    pub email: Option<String>,
    /// Display name.
    pub full_name: Option<String>,
    /// Application role.
    pub role: Role,
    /// Assigned branch names, first one is the primary branch.
    pub branches: Vec<String>,
    /// Area or department.
    pub area: Option<String>,
    /// Free-form permission set.
    pub permissions: Vec<String>,
}

impl AuthContext {
    /// Creates a context with no branches and no extra permissions.
    #[must_use]
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            email: None,
            full_name: None,
            role,
            branches: Vec::new(),
            area: None,
            permissions: Vec::new(),
        }
    }

    /// Adds branches to the context.
    #[must_use]
    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches.extend(branches.into_iter().map(Into::into));
        self
    }

    /// Adds permissions to the context.
    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Returns true for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns true for branch managers.
    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.role == Role::BranchManager
    }

    /// Returns true if the permission is granted. Admins hold every permission.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == permission)
    }

    /// Primary branch, used when an expense carries none.
    #[must_use]
    pub fn primary_branch(&self) -> Option<&str> {
        self.branches.first().map(String::as_str)
    }

    /// Returns true if the branch is one of the caller's branches.
    #[must_use]
    pub fn belongs_to_branch(&self, branch: &str) -> bool {
        let wanted = branch.trim();
        self.branches
            .iter()
            .any(|b| b.trim().eq_ignore_ascii_case(wanted))
    }

    /// Returns true if the caller manages the given branch.
    #[must_use]
    pub fn manages_branch(&self, branch: Option<&str>) -> bool {
        self.is_manager() && branch.is_some_and(|b| self.belongs_to_branch(b))
    }

    /// Returns true if the caller may approve or reject an expense of `branch`.
    #[must_use]
    pub fn can_review(&self, branch: Option<&str>) -> bool {
        self.is_admin() || (self.manages_branch(branch) && self.has_permission(APPROVE_EXPENSES))
    }

    /// Returns true if the caller may read an expense.
    #[must_use]
    pub fn can_view(&self, owner: Uuid, branch: Option<&str>) -> bool {
        self.is_admin() || self.user_id == owner || self.manages_branch(branch)
    }

    /// Returns true if the caller may edit or validate an expense.
    #[must_use]
    pub fn can_edit(&self, owner: Uuid) -> bool {
        self.is_admin() || self.user_id == owner
    }

    /// Returns true if the caller may see accounting rows and exports.
    #[must_use]
    pub fn can_export(&self, branch: Option<&str>) -> bool {
        self.is_admin() || self.manages_branch(branch)
    }
}
