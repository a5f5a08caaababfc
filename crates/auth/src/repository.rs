//! Persistence ports for identities, tokens and role assignments.
//!
//! Implemented in `warta-infra` (in-memory and PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warta_core::{IdentityId, StoreResult};

use crate::identity::{Identity, IdentityStatus};
use crate::roles::{GuardScope, OwnerKind};
use crate::token::TokenRecord;

#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a new token. A duplicate hash is a `StoreError::Conflict`.
    async fn insert(&self, token: &TokenRecord) -> StoreResult<()>;

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<TokenRecord>>;

    /// Delete the token with this hash, optionally only when `owner` holds it.
    ///
    /// Returns whether a row was removed.
    async fn delete_by_hash(
        &self,
        token_hash: &str,
        owner: Option<IdentityId>,
    ) -> StoreResult<bool>;

    /// Delete every token of `identity`; returns how many were removed.
    async fn delete_for_identity(&self, identity: IdentityId) -> StoreResult<u64>;

    async fn touch(&self, token_hash: &str, at: DateTime<Utc>) -> StoreResult<()>;
}

#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn find_by_id(&self, id: IdentityId) -> StoreResult<Option<Identity>>;

    /// Look up by username or email (exact match on either).
    async fn find_by_login(&self, login: &str) -> StoreResult<Option<Identity>>;

    /// Duplicate username or email is a `StoreError::Conflict`.
    async fn insert(&self, identity: &Identity) -> StoreResult<()>;

    /// Returns `false` when the identity does not exist.
    async fn set_status(
        &self,
        id: IdentityId,
        status: IdentityStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Names of the roles `identity` holds in `guard`.
    async fn role_names(
        &self,
        identity: IdentityId,
        owner: OwnerKind,
        guard: GuardScope,
    ) -> StoreResult<Vec<String>>;

    /// Create the role in the catalogue if it is missing.
    async fn ensure_role(&self, name: &str, guard: GuardScope) -> StoreResult<()>;

    /// Assign an existing catalogue role. Unknown role is `StoreError::NotFound`;
    /// an existing assignment is left as is.
    async fn assign(
        &self,
        identity: IdentityId,
        owner: OwnerKind,
        role: &str,
        guard: GuardScope,
    ) -> StoreResult<()>;
}
