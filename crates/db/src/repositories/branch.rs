//! Branch repository.

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::branches;

/// Longest accepted branch name.
pub const MAX_BRANCH_NAME: usize = 100;

/// Error types for branch operations.
#[derive(Debug, thiserror::Error)]
pub enum BranchError {
    /// Name is blank or too long.
    #[error("Invalid branch name: {0}")]
    InvalidName(String),

    /// A branch with this name exists (case-insensitive).
    #[error("Branch already exists: {0}")]
    Duplicate(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Branch repository.
#[derive(Debug, Clone)]
pub struct BranchRepository {
    db: DatabaseConnection,
}

impl BranchRepository {
    /// Creates a new branch repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists branches by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<branches::Model>, DbErr> {
        branches::Entity::find()
            .order_by_asc(branches::Column::Name)
            .all(&self.db)
            .await
    }

    /// Creates a branch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` or `Duplicate` before touching the table,
    /// `Database` if the insert fails.
    pub async fn create(&self, name: &str) -> Result<branches::Model, BranchError> {
        let name = normalize_name(name)?;

        let existing = branches::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(branches::Column::Name)))
                    .eq(name.to_lowercase()),
            )
            .count(&self.db)
            .await?;
        if existing > 0 {
            return Err(BranchError::Duplicate(name));
        }

        let model = branches::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(branch_id = %model.id, name = %model.name, "Branch created");
        Ok(model)
    }
}

/// Trims and collapses inner whitespace.
fn normalize_name(name: &str) -> Result<String, BranchError> {
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(BranchError::InvalidName("name is required".into()));
    }
    if name.chars().count() > MAX_BRANCH_NAME {
        return Err(BranchError::InvalidName(format!(
            "name longer than {MAX_BRANCH_NAME} characters"
        )));
    }
    Ok(name)
}
