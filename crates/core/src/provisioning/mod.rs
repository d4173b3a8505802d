//! User provisioning.
//!
//! Creating a user touches two systems that cannot share a transaction:
//! the identity provider and the `profiles` table. [`ProvisioningSaga`]
//! creates the identity user first, then the profile, and deletes the
//! identity user again if the profile write fails.

mod error;
mod gotrue;
mod saga;
mod types;

pub use error::ProvisioningError;
pub use gotrue::GoTrueClient;
pub use saga::{IdentityProvider, ProfileWriter, ProvisioningSaga};
pub use types::{MIN_PASSWORD_LENGTH, Profile, ProfileUpdate, ProvisionUserInput};

#[cfg(test)]
#[path = "saga_tests.rs"]
mod tests;
