//! Start-up seeding: the role catalogue and an optional administrator.

use warta_auth::{
    GuardScope, Identity, IdentityRepository, PasswordHasher, Role, RoleRepository, RoleResolver,
};
use warta_core::{Clock, DomainError, DomainResult};

use crate::config::BootstrapAdmin;

/// Make sure every catalogue role exists in the API guard.
pub async fn seed_roles(roles: &dyn RoleRepository) -> DomainResult<()> {
    for role in Role::CATALOGUE {
        roles.ensure_role(role.as_str(), GuardScope::Api).await?;
    }
    tracing::debug!(count = Role::CATALOGUE.len(), "role catalogue ensured");
    Ok(())
}

/// Create the configured administrator unless its username or email is taken.
///
/// Returns whether an identity was created.
#[tracing::instrument(skip_all, fields(username = %admin.username), err)]
pub async fn bootstrap_admin(
    identities: &dyn IdentityRepository,
    roles: &RoleResolver,
    hasher: &dyn PasswordHasher,
    clock: &dyn Clock,
    admin: &BootstrapAdmin,
) -> DomainResult<bool> {
    for login in [&admin.username, &admin.email] {
        if identities.find_by_login(login).await?.is_some() {
            tracing::info!("bootstrap administrator already present");
            return Ok(false);
        }
    }

    let hash = hasher
        .hash(&admin.password)
        .map_err(|e| DomainError::internal(e.to_string()))?;
    let identity = Identity::new(&admin.username, &admin.email, hash, clock.now());
    identities.insert(&identity).await?;
    roles.assign(identity.id, &Role::ADMIN).await?;
    roles.assign(identity.id, &Role::USER).await?;
    tracing::info!(identity_id = %identity.id, "bootstrap administrator created");
    Ok(true)
}
