//! Profile repository.
//!
//! Backs provisioning, auth-context resolution and notification routing.

use chrono::Utc;
use expensedesk_core::auth::Role;
use expensedesk_core::notification::{NotificationError, OwnerInfo, RecipientDirectory};
use expensedesk_core::provisioning::{Profile, ProfileWriter, ProvisioningError};
use expensedesk_shared::types::{PageRequest, PageResponse};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entities::{profiles, sea_orm_active_enums::UserRole};

/// Profile repository.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    db: DatabaseConnection,
}

impl ProfileRepository {
    /// Creates a new profile repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, DbErr> {
        let model = profiles::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(to_domain))
    }

    /// Finds the profiles with the given IDs. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = profiles::Entity::find()
            .filter(profiles::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    /// Lists profiles ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, page: &PageRequest) -> Result<PageResponse<Profile>, DbErr> {
        let page = page.normalized();
        let paginator = profiles::Entity::find()
            .order_by_asc(profiles::Column::FullName)
            .order_by_asc(profiles::Column::Id)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.index()).await?;

        Ok(PageResponse::new(
            models.into_iter().map(to_domain).collect(),
            &page,
            total,
        ))
    }

    /// Profiles assigned to any of the given branches, or every profile
    /// when `branches` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn in_branches(&self, branches: Option<&[String]>) -> Result<Vec<Profile>, DbErr> {
        let models = profiles::Entity::find()
            .order_by_asc(profiles::Column::FullName)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(to_domain)
            .filter(|p| branches.is_none_or(|wanted| shares_branch(&p.branches, wanted)))
            .collect())
    }

    async fn emails_where(
        &self,
        role: UserRole,
        keep: impl Fn(&profiles::Model) -> bool,
    ) -> Result<Vec<String>, DbErr> {
        let models = profiles::Entity::find()
            .filter(profiles::Column::Role.eq(role))
            .filter(profiles::Column::Email.is_not_null())
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .filter(|m| keep(m))
            .filter_map(|m| m.email)
            .collect())
    }
}

impl ProfileWriter for ProfileRepository {
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, ProvisioningError> {
        self.find_by_id(id)
            .await
            .map_err(|e| ProvisioningError::Profile(e.to_string()))
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, ProvisioningError> {
        let model = to_active_model(profile);
        profiles::Entity::insert(model)
            .on_conflict(
                OnConflict::column(profiles::Column::Id)
                    .update_columns([
                        profiles::Column::Email,
                        profiles::Column::FullName,
                        profiles::Column::Role,
                        profiles::Column::Branches,
                        profiles::Column::Area,
                        profiles::Column::MonthlyLimit,
                        profiles::Column::CashLimit,
                        profiles::Column::Permissions,
                        profiles::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| ProvisioningError::Profile(e.to_string()))?;

        self.find_by_id(profile.id)
            .await
            .map_err(|e| ProvisioningError::Profile(e.to_string()))?
            .ok_or(ProvisioningError::NotFound(profile.id))
    }

    async fn delete_profile(&self, id: Uuid) -> Result<bool, ProvisioningError> {
        let result = profiles::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ProvisioningError::Profile(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

impl RecipientDirectory for ProfileRepository {
    async fn admin_emails(&self) -> Result<Vec<String>, NotificationError> {
        self.emails_where(UserRole::Admin, |_| true)
            .await
            .map_err(|e| NotificationError::Directory(e.to_string()))
    }

    async fn manager_emails(&self, branch: &str) -> Result<Vec<String>, NotificationError> {
        let wanted = [branch.to_string()];
        self.emails_where(UserRole::BranchManager, |m| {
            shares_branch(&m.branches, &wanted)
        })
        .await
        .map_err(|e| NotificationError::Directory(e.to_string()))
    }

    async fn owner(&self, user_id: Uuid) -> Result<Option<OwnerInfo>, NotificationError> {
        let profile = self
            .find_by_id(user_id)
            .await
            .map_err(|e| NotificationError::Directory(e.to_string()))?;

        Ok(profile.map(|p| OwnerInfo {
            full_name: p.full_name,
            email: p.email,
            branches: p.branches,
        }))
    }
}

/// Case-insensitive intersection test on branch names.
pub(crate) fn shares_branch(assigned: &[String], wanted: &[String]) -> bool {
    assigned.iter().any(|a| {
        wanted
            .iter()
            .any(|w| a.trim().eq_ignore_ascii_case(w.trim()))
    })
}

pub(crate) const fn role_from_db(role: UserRole) -> Role {
    match role {
        UserRole::User => Role::User,
        UserRole::BranchManager => Role::BranchManager,
        UserRole::Admin => Role::Admin,
    }
}

pub(crate) const fn role_to_db(role: Role) -> UserRole {
    match role {
        Role::User => UserRole::User,
        Role::BranchManager => UserRole::BranchManager,
        Role::Admin => UserRole::Admin,
    }
}

/// Convert database model to domain profile.
pub(crate) fn to_domain(model: profiles::Model) -> Profile {
    Profile {
        id: model.id,
        email: model.email,
        full_name: model.full_name,
        role: role_from_db(model.role),
        branches: model.branches,
        area: model.area,
        monthly_limit: model.monthly_limit,
        cash_limit: model.cash_limit,
        permissions: model.permissions,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn to_active_model(profile: &Profile) -> profiles::ActiveModel {
    profiles::ActiveModel {
        id: Set(profile.id),
        email: Set(profile.email.clone()),
        full_name: Set(profile.full_name.clone()),
        role: Set(role_to_db(profile.role)),
        branches: Set(profile.branches.clone()),
        area: Set(profile.area.clone()),
        monthly_limit: Set(profile.monthly_limit),
        cash_limit: Set(profile.cash_limit),
        permissions: Set(profile.permissions.clone()),
        created_at: Set(profile.created_at.into()),
        updated_at: Set(profile.updated_at.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn model() -> profiles::Model {
        let now = Utc::now().into();
        profiles::Model {
            id: Uuid::new_v4(),
            email: Some("marta@acme.com".into()),
            full_name: Some("Marta Gómez".into()),
            role: UserRole::BranchManager,
            branches: vec!["Rosario".into(), "Santa Fe".into()],
            area: Some("Operaciones".into()),
            monthly_limit: Some(dec!(300000)),
            cash_limit: None,
            permissions: vec!["approve_expenses".into()],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_to_domain() {
        let model = model();
        let profile = to_domain(model.clone());

        assert_eq!(profile.id, model.id);
        assert_eq!(profile.role, Role::BranchManager);
        assert_eq!(profile.limits().monthly_limit, Some(dec!(300000)));
        assert_eq!(profile.limits().cash_limit, None);
        assert_eq!(profile.permissions, vec!["approve_expenses"]);
    }

    #[test]
    fn test_active_model_keeps_fields() {
        let profile = to_domain(model());
        let active = to_active_model(&profile);
        assert_eq!(active.role, Set(UserRole::BranchManager));
        assert_eq!(active.branches, Set(profile.branches.clone()));
        assert_eq!(active.monthly_limit, Set(Some(dec!(300000))));
    }

    #[test]
    fn test_role_mapping_roundtrip() {
        for role in [Role::User, Role::BranchManager, Role::Admin] {
            assert_eq!(role_from_db(role_to_db(role)), role);
        }
    }

    #[test]
    fn test_shares_branch_ignores_case() {
        let assigned = vec!["Rosario".to_string(), "Santa Fe".to_string()];
        assert!(shares_branch(&assigned, &["santa fe ".to_string()]));
        assert!(!shares_branch(&assigned, &["Córdoba".to_string()]));
        assert!(!shares_branch(&[], &["Rosario".to_string()]));
    }
}
