//! Provisioning saga.

use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

use super::error::ProvisioningError;
use super::types::{Profile, ProfileUpdate, ProvisionUserInput};

/// Identity provider admin operations.
pub trait IdentityProvider: Send + Sync {
    /// Creates a confirmed login and returns its user ID.
    fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> impl Future<Output = Result<Uuid, ProvisioningError>> + Send;

    /// Deletes a login. Deleting an unknown user succeeds.
    fn delete_user(&self, user_id: Uuid)
    -> impl Future<Output = Result<(), ProvisioningError>> + Send;
}

/// Profile persistence.
///
/// This trait is implemented by the db crate.
pub trait ProfileWriter: Send + Sync {
    /// Finds a profile by ID.
    fn find_profile(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Profile>, ProvisioningError>> + Send;

    /// Inserts or overwrites a profile.
    fn upsert_profile(
        &self,
        profile: &Profile,
    ) -> impl Future<Output = Result<Profile, ProvisioningError>> + Send;

    /// Deletes a profile. Returns false if it did not exist.
    fn delete_profile(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<bool, ProvisioningError>> + Send;
}

/// Creates, updates and removes users across both systems.
pub struct ProvisioningSaga<I, P> {
    identity: Arc<I>,
    profiles: Arc<P>,
}

impl<I, P> ProvisioningSaga<I, P>
where
    I: IdentityProvider,
    P: ProfileWriter,
{
    /// Creates the saga.
    #[must_use]
    pub fn new(identity: Arc<I>, profiles: Arc<P>) -> Self {
        Self { identity, profiles }
    }

    /// Creates the identity user, then the profile.
    ///
    /// If the profile write fails the identity user is deleted again.
    /// When that delete also fails the result is `CompensationFailed`,
    /// naming the orphaned identity user.
    pub async fn provision(&self, input: ProvisionUserInput) -> Result<Profile, ProvisioningError> {
        input.validate()?;

        let user_id = self
            .identity
            .create_user(input.email.trim(), &input.password, input.full_name.trim())
            .await?;
        tracing::info!(user_id = %user_id, "Identity user created");

        let profile = input.into_profile(user_id);
        match self.profiles.upsert_profile(&profile).await {
            Ok(saved) => {
                tracing::info!(user_id = %user_id, role = %saved.role, "User provisioned");
                Ok(saved)
            }
            Err(profile_err) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %profile_err,
                    "Profile write failed, removing identity user"
                );
                match self.identity.delete_user(user_id).await {
                    Ok(()) => Err(ProvisioningError::Profile(profile_err.to_string())),
                    Err(comp_err) => {
                        tracing::error!(
                            user_id = %user_id,
                            error = %comp_err,
                            "Compensating delete failed, identity user orphaned"
                        );
                        Err(ProvisioningError::CompensationFailed {
                            user_id,
                            profile_error: profile_err.to_string(),
                            compensation_error: comp_err.to_string(),
                        })
                    }
                }
            }
        }
    }

    /// Applies an admin edit to an existing profile.
    pub async fn update(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Profile, ProvisioningError> {
        let mut profile = self
            .profiles
            .find_profile(user_id)
            .await?
            .ok_or(ProvisioningError::NotFound(user_id))?;

        update.apply(&mut profile)?;
        let saved = self.profiles.upsert_profile(&profile).await?;
        tracing::info!(user_id = %user_id, "Profile updated");
        Ok(saved)
    }

    /// Removes the profile, then the identity user.
    ///
    /// A missing profile is `NotFound` and nothing is deleted.
    pub async fn deprovision(&self, user_id: Uuid) -> Result<(), ProvisioningError> {
        if !self.profiles.delete_profile(user_id).await? {
            return Err(ProvisioningError::NotFound(user_id));
        }
        self.identity.delete_user(user_id).await?;
        tracing::info!(user_id = %user_id, "User removed");
        Ok(())
    }
}
