//! Token Store: opaque bearer tokens persisted only as hashes.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use warta_core::{Clock, Entity, IdentityId, StoreResult, TokenId};

use crate::credential::{self, BearerCredential};
use crate::repository::TokenRepository;

/// Length of the random secret part of a credential.
pub const SECRET_LEN: usize = 40;

/// Persisted token row. Holds the hash, never the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub id: TokenId,
    pub identity_id: IdentityId,
    pub name: String,
    pub token_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    /// A token is expired from `expires_at` onwards.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if now >= expires_at)
    }
}

impl Entity for TokenRecord {
    type Id = TokenId;

    fn id(&self) -> TokenId {
        self.id
    }
}

/// A freshly issued token together with the plaintext credential.
///
/// The credential exists only here; it is shown to the client once.
#[derive(Clone)]
pub struct IssuedToken {
    pub record: TokenRecord,
    pub credential: String,
}

impl core::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("record", &self.record)
            .field("credential", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct TokenStore {
    repo: Arc<dyn TokenRepository>,
    clock: Arc<dyn Clock>,
    ttl: Option<Duration>,
}

impl TokenStore {
    /// Tokens issued by this store never expire unless a TTL is set.
    pub fn new(repo: Arc<dyn TokenRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            clock,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn issue(&self, identity: IdentityId, name: &str) -> StoreResult<IssuedToken> {
        let secret = generate_secret();
        let now = self.clock.now();
        let record = TokenRecord {
            id: TokenId::new(),
            identity_id: identity,
            name: name.to_string(),
            token_hash: credential::hash_secret(&secret),
            expires_at: self.ttl.map(|ttl| now + ttl),
            last_used_at: None,
            created_at: now,
        };
        self.repo.insert(&record).await?;
        tracing::debug!(token_id = %record.id, identity_id = %identity, "token issued");

        let credential = credential::compose(record.id, &secret);
        Ok(IssuedToken { record, credential })
    }

    /// Resolve a credential to its live token.
    ///
    /// Unknown and expired tokens both come back as `None`.
    pub async fn validate(&self, credential: &BearerCredential) -> StoreResult<Option<TokenRecord>> {
        let Some(record) = self.repo.find_by_hash(&credential.secret_hash()).await? else {
            return Ok(None);
        };
        if record.is_expired(self.clock.now()) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    pub async fn revoke(&self, credential: &BearerCredential) -> StoreResult<bool> {
        self.repo
            .delete_by_hash(&credential.secret_hash(), None)
            .await
    }

    /// Revoke only if the token belongs to `owner`.
    pub async fn revoke_owned(
        &self,
        credential: &BearerCredential,
        owner: IdentityId,
    ) -> StoreResult<bool> {
        self.repo
            .delete_by_hash(&credential.secret_hash(), Some(owner))
            .await
    }

    pub async fn revoke_all(&self, identity: IdentityId) -> StoreResult<u64> {
        let removed = self.repo.delete_for_identity(identity).await?;
        tracing::info!(identity_id = %identity, removed, "all tokens revoked");
        Ok(removed)
    }

    pub async fn touch(&self, credential: &BearerCredential) -> StoreResult<()> {
        self.repo
            .touch(&credential.secret_hash(), self.clock.now())
            .await
    }
}

fn generate_secret() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}
