//! Registration, login/logout and identity administration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use warta_core::{Clock, DomainError, IdentityId, StoreError};

use crate::context::AuthorizedContext;
use crate::credential::BearerCredential;
use crate::identity::{Identity, IdentityStatus};
use crate::password::{PasswordError, PasswordHasher};
use crate::repository::IdentityRepository;
use crate::roles::{Role, RoleResolver};
use crate::token::{IssuedToken, TokenStore};

const MIN_USERNAME_LEN: usize = 3;
const MAX_FIELD_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;
const LOGIN_TOKEN_NAME: &str = "auth_token";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown login or wrong password. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        SessionError::Domain(value.into())
    }
}

impl From<PasswordError> for SessionError {
    fn from(value: PasswordError) -> Self {
        SessionError::Domain(DomainError::internal(value.to_string()))
    }
}

#[derive(Clone, Deserialize)]
pub struct RegisterIdentity {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for RegisterIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterIdentity")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RegisterIdentity {
    fn validate(&self) -> Result<(), DomainError> {
        let username = self.username.trim();
        if username.chars().count() < MIN_USERNAME_LEN || username.len() > MAX_FIELD_LEN {
            return Err(DomainError::validation(format!(
                "username must be {MIN_USERNAME_LEN}-{MAX_FIELD_LEN} characters"
            )));
        }
        let email = self.email.trim();
        if !email.contains('@') || email.len() > MAX_FIELD_LEN {
            return Err(DomainError::validation("email is not a valid address"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Identity plus the role names it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub identity: Identity,
    pub roles: Vec<Role>,
}

/// Outcome of register/login: the profile and a freshly issued token.
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: Profile,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct SessionService {
    identities: Arc<dyn IdentityRepository>,
    tokens: TokenStore,
    roles: RoleResolver,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
}

impl SessionService {
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        tokens: TokenStore,
        roles: RoleResolver,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identities,
            tokens,
            roles,
            hasher,
            clock,
        }
    }

    /// Create an active identity holding the `user` role and log it in.
    #[tracing::instrument(skip(self, input), fields(username = %input.username.trim()), err)]
    pub async fn register(&self, input: RegisterIdentity) -> Result<Session, SessionError> {
        input.validate()?;
        let hash = self.hasher.hash(&input.password)?;
        let identity = Identity::new(
            input.username.trim(),
            input.email.trim(),
            hash,
            self.clock.now(),
        );
        self.identities.insert(&identity).await?;
        self.roles.assign(identity.id, &Role::USER).await?;
        tracing::info!(identity_id = %identity.id, "identity registered");

        self.open_session(identity).await
    }

    /// `login` matches either username or email.
    #[tracing::instrument(skip(self, password), err)]
    pub async fn login(&self, login: &str, password: &str) -> Result<Session, SessionError> {
        let Some(identity) = self.identities.find_by_login(login.trim()).await? else {
            return Err(SessionError::InvalidCredentials);
        };
        if !self.hasher.verify(password, &identity.password_hash)? {
            return Err(SessionError::InvalidCredentials);
        }
        if !identity.is_active() {
            return Err(DomainError::forbidden(format!("account is {}", identity.status)).into());
        }
        self.open_session(identity).await
    }

    /// Revoke the token the caller authenticated with.
    pub async fn logout(&self, ctx: &AuthorizedContext, credential: &str) -> Result<(), SessionError> {
        if let Some(credential) = BearerCredential::parse(credential) {
            self.tokens.revoke_owned(&credential, ctx.identity_id).await?;
        }
        tracing::info!(identity_id = %ctx.identity_id, token_id = %ctx.token_id, "logged out");
        Ok(())
    }

    pub async fn profile(&self, ctx: &AuthorizedContext) -> Result<Profile, SessionError> {
        self.profile_of(ctx.identity_id).await
    }

    pub async fn profile_of(&self, id: IdentityId) -> Result<Profile, SessionError> {
        let identity = self
            .identities
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("identity"))?;
        let roles = self.roles.roles_of(id).await?;
        Ok(Profile { identity, roles })
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn assign_role(&self, target: IdentityId, role: Role) -> Result<Profile, SessionError> {
        if self.identities.find_by_id(target).await?.is_none() {
            return Err(DomainError::not_found("identity").into());
        }
        self.roles.assign(target, &role).await?;
        tracing::info!(identity_id = %target, role = %role, "role assigned");
        self.profile_of(target).await
    }

    /// Change account status. Leaving `active` revokes every token.
    #[tracing::instrument(skip(self), err)]
    pub async fn set_status(
        &self,
        target: IdentityId,
        status: IdentityStatus,
    ) -> Result<Profile, SessionError> {
        if !self
            .identities
            .set_status(target, status, self.clock.now())
            .await?
        {
            return Err(DomainError::not_found("identity").into());
        }
        if status != IdentityStatus::Active {
            self.tokens.revoke_all(target).await?;
        }
        tracing::info!(identity_id = %target, status = %status, "identity status changed");
        self.profile_of(target).await
    }

    async fn open_session(&self, identity: Identity) -> Result<Session, SessionError> {
        let token = self.tokens.issue(identity.id, LOGIN_TOKEN_NAME).await?;
        let roles = self.roles.roles_of(identity.id).await?;
        Ok(Session {
            profile: Profile { identity, roles },
            token,
        })
    }
}
