//! Auth Gate: the per-request bearer-token and role check.
//!
//! ```text
//! NoToken -> TokenInvalidOrExpired -> IdentityInactive -> RoleMismatch -> Authorized
//! ```
//!
//! Each failing step short-circuits. Only an authorized request touches the
//! token's last-used timestamp.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use warta_core::StoreError;

use crate::context::AuthorizedContext;
use crate::credential::BearerCredential;
use crate::repository::IdentityRepository;
use crate::roles::{RequiredRoles, RoleResolver};
use crate::token::TokenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnauthenticatedReason {
    NoToken,
    InvalidOrExpired,
    Inactive,
}

impl UnauthenticatedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnauthenticatedReason::NoToken => "no token",
            UnauthenticatedReason::InvalidOrExpired => "invalid or expired",
            UnauthenticatedReason::Inactive => "inactive",
        }
    }
}

impl core::fmt::Display for UnauthenticatedReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(UnauthenticatedReason),

    #[error("forbidden: missing role, requires {required}")]
    Forbidden { required: RequiredRoles },

    #[error("authorization backend failure: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        AuthError::Internal(value.to_string())
    }
}

#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenStore,
    identities: Arc<dyn IdentityRepository>,
    roles: RoleResolver,
}

impl AuthGate {
    pub fn new(
        tokens: TokenStore,
        identities: Arc<dyn IdentityRepository>,
        roles: RoleResolver,
    ) -> Self {
        Self {
            tokens,
            identities,
            roles,
        }
    }

    /// Validate `credential` and check it against `required`.
    ///
    /// An empty `required` set admits any active identity.
    pub async fn authorize(
        &self,
        credential: Option<&str>,
        required: &RequiredRoles,
    ) -> Result<AuthorizedContext, AuthError> {
        let Some(credential) = credential.and_then(BearerCredential::parse) else {
            return Err(AuthError::Unauthenticated(UnauthenticatedReason::NoToken));
        };

        let Some(token) = self.tokens.validate(&credential).await? else {
            return Err(AuthError::Unauthenticated(
                UnauthenticatedReason::InvalidOrExpired,
            ));
        };

        let identity = match self.identities.find_by_id(token.identity_id).await? {
            Some(identity) if identity.is_active() => identity,
            _ => {
                tracing::debug!(identity_id = %token.identity_id, "token owner missing or not active");
                return Err(AuthError::Unauthenticated(UnauthenticatedReason::Inactive));
            }
        };

        if !required.is_empty() && !self.roles.has_any_role(identity.id, required).await? {
            tracing::debug!(
                identity_id = %identity.id,
                required = %required,
                "role check failed"
            );
            return Err(AuthError::Forbidden {
                required: required.clone(),
            });
        }

        // Last-used tracking is best effort.
        if let Err(err) = self.tokens.touch(&credential).await {
            tracing::warn!(token_id = %token.id, error = %err, "failed to touch token");
        }

        Ok(AuthorizedContext {
            identity_id: identity.id,
            username: identity.username,
            email: identity.email,
            token_id: token.id,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn roles(&self) -> &RoleResolver {
        &self.roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use warta_core::{Clock, IdentityId, ManualClock};

    use crate::identity::{Identity, IdentityStatus};
    use crate::roles::Role;
    use crate::testing::{FakeIdentities, FakeRoles, FakeTokens};

    struct Harness {
        gate: AuthGate,
        tokens: Arc<FakeTokens>,
        identities: Arc<FakeIdentities>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let tokens = Arc::new(FakeTokens::default());
        let identities = Arc::new(FakeIdentities::default());
        let roles = Arc::new(FakeRoles::seeded());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = TokenStore::new(tokens.clone(), clock.clone()).with_ttl(Some(Duration::hours(1)));
        let gate = AuthGate::new(store, identities.clone(), RoleResolver::new(roles));
        Harness {
            gate,
            tokens,
            identities,
            clock,
        }
    }

    async fn identity_with_roles(h: &Harness, name: &str, roles: &[Role]) -> (IdentityId, String) {
        let identity = Identity::new(name, format!("{name}@example.org"), "x", h.clock.now());
        h.identities.insert(&identity).await.unwrap();
        for role in roles {
            h.gate.roles().assign(identity.id, role).await.unwrap();
        }
        let issued = h.gate.tokens().issue(identity.id, "test").await.unwrap();
        (identity.id, issued.credential)
    }

    fn unauthenticated(reason: UnauthenticatedReason) -> AuthError {
        AuthError::Unauthenticated(reason)
    }

    #[tokio::test]
    async fn missing_or_blank_credential_is_no_token() {
        let h = harness();
        let any = RequiredRoles::any();
        assert_eq!(
            h.gate.authorize(None, &any).await.unwrap_err(),
            unauthenticated(UnauthenticatedReason::NoToken)
        );
        assert_eq!(
            h.gate.authorize(Some("  "), &any).await.unwrap_err(),
            unauthenticated(UnauthenticatedReason::NoToken)
        );
    }

    #[tokio::test]
    async fn unknown_token_is_rejected_regardless_of_roles() {
        let h = harness();
        for required in ["", "admin", "admin|user"] {
            let err = h
                .gate
                .authorize(Some("1|doesnotexist"), &RequiredRoles::parse(required))
                .await
                .unwrap_err();
            assert_eq!(err, unauthenticated(UnauthenticatedReason::InvalidOrExpired));
        }
    }

    #[tokio::test]
    async fn expired_token_fails_the_same_way_twice_without_touching() {
        let h = harness();
        let (_, cred) = identity_with_roles(&h, "admin1", &[Role::ADMIN]).await;
        h.clock.advance(Duration::hours(1));

        let required = RequiredRoles::from(Role::ADMIN);
        let first = h.gate.authorize(Some(cred.as_str()), &required).await.unwrap_err();
        let second = h.gate.authorize(Some(cred.as_str()), &required).await.unwrap_err();
        assert_eq!(first, unauthenticated(UnauthenticatedReason::InvalidOrExpired));
        assert_eq!(first, second);
        assert_eq!(h.tokens.touch_count(), 0);
    }

    #[tokio::test]
    async fn non_active_identity_is_unauthenticated() {
        let h = harness();
        let (id, cred) = identity_with_roles(&h, "staff", &[Role::ADMIN]).await;
        h.identities
            .set_status(id, IdentityStatus::Suspended, h.clock.now())
            .await
            .unwrap();

        let err = h
            .gate
            .authorize(Some(cred.as_str()), &RequiredRoles::any())
            .await
            .unwrap_err();
        assert_eq!(err, unauthenticated(UnauthenticatedReason::Inactive));
    }

    #[tokio::test]
    async fn role_mismatch_is_forbidden_and_not_touched() {
        let h = harness();
        let (_, cred) = identity_with_roles(&h, "writer", &[Role::USER]).await;
        let required = RequiredRoles::parse("admin|redaktur");

        let err = h.gate.authorize(Some(cred.as_str()), &required).await.unwrap_err();
        assert_eq!(err, AuthError::Forbidden { required });
        assert_eq!(h.tokens.touch_count(), 0);
    }

    #[tokio::test]
    async fn any_listed_role_authorizes_and_touches() {
        let h = harness();
        let (id, cred) = identity_with_roles(&h, "redaksi", &[Role::REDAKTUR]).await;

        let ctx = h
            .gate
            .authorize(Some(cred.as_str()), &RequiredRoles::parse("admin | redaktur"))
            .await
            .unwrap();
        assert_eq!(ctx.identity_id, id);
        assert_eq!(ctx.username, "redaksi");
        assert_eq!(h.tokens.touch_count(), 1);
        assert!(h.tokens.rows()[0].last_used_at.is_some());
    }

    #[tokio::test]
    async fn empty_requirement_admits_any_active_identity() {
        let h = harness();
        let (id, cred) = identity_with_roles(&h, "plain", &[]).await;
        let ctx = h.gate.authorize(Some(cred.as_str()), &RequiredRoles::any()).await.unwrap();
        assert_eq!(ctx.identity_id, id);
    }
}
