//! Mutex-backed fakes for the auth ports, used by unit tests in this crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warta_core::{IdentityId, StoreError, StoreResult};

use crate::identity::{Identity, IdentityStatus};
use crate::password::{PasswordError, PasswordHasher};
use crate::repository::{IdentityRepository, RoleRepository, TokenRepository};
use crate::roles::{GuardScope, OwnerKind, Role};
use crate::token::TokenRecord;

#[derive(Default)]
pub struct FakeTokens {
    rows: Mutex<Vec<TokenRecord>>,
    pub touches: AtomicUsize,
}

impl FakeTokens {
    pub fn rows(&self) -> Vec<TokenRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn touch_count(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRepository for FakeTokens {
    async fn insert(&self, token: &TokenRecord) -> StoreResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|t| t.token_hash == token.token_hash) {
            return Err(StoreError::Conflict("token hash".into()));
        }
        rows.push(token.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<TokenRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn delete_by_hash(
        &self,
        token_hash: &str,
        owner: Option<IdentityId>,
    ) -> StoreResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| {
            !(t.token_hash == token_hash && owner.is_none_or(|o| o == t.identity_id))
        });
        Ok(rows.len() != before)
    }

    async fn delete_for_identity(&self, identity: IdentityId) -> StoreResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| t.identity_id != identity);
        Ok((before - rows.len()) as u64)
    }

    async fn touch(&self, token_hash: &str, at: DateTime<Utc>) -> StoreResult<()> {
        self.touches.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|t| t.token_hash == token_hash) {
            row.last_used_at = Some(at);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeIdentities {
    rows: Mutex<HashMap<IdentityId, Identity>>,
}

#[async_trait]
impl IdentityRepository for FakeIdentities {
    async fn find_by_id(&self, id: IdentityId) -> StoreResult<Option<Identity>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> StoreResult<Option<Identity>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .find(|i| i.username == login || i.email == login)
            .cloned())
    }

    async fn insert(&self, identity: &Identity) -> StoreResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|i| i.username == identity.username || i.email == identity.email)
        {
            return Err(StoreError::Conflict("username or email already taken".into()));
        }
        rows.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn set_status(
        &self,
        id: IdentityId,
        status: IdentityStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        Ok(match rows.get_mut(&id) {
            Some(identity) => {
                identity.status = status;
                identity.updated_at = at;
                true
            }
            None => false,
        })
    }
}

#[derive(Default)]
pub struct FakeRoles {
    catalogue: Mutex<Vec<(String, GuardScope)>>,
    grants: Mutex<HashMap<(IdentityId, GuardScope), Vec<String>>>,
}

impl FakeRoles {
    pub fn seeded() -> Self {
        let roles = Self::default();
        {
            let mut catalogue = roles.catalogue.lock().unwrap();
            for role in Role::CATALOGUE {
                catalogue.push((role.as_str().to_string(), GuardScope::Api));
            }
        }
        roles
    }
}

#[async_trait]
impl RoleRepository for FakeRoles {
    async fn role_names(
        &self,
        identity: IdentityId,
        _owner: OwnerKind,
        guard: GuardScope,
    ) -> StoreResult<Vec<String>> {
        let grants = self.grants.lock().unwrap();
        Ok(grants.get(&(identity, guard)).cloned().unwrap_or_default())
    }

    async fn ensure_role(&self, name: &str, guard: GuardScope) -> StoreResult<()> {
        let mut catalogue = self.catalogue.lock().unwrap();
        if !catalogue.iter().any(|(n, g)| n == name && *g == guard) {
            catalogue.push((name.to_string(), guard));
        }
        Ok(())
    }

    async fn assign(
        &self,
        identity: IdentityId,
        _owner: OwnerKind,
        role: &str,
        guard: GuardScope,
    ) -> StoreResult<()> {
        let known = self
            .catalogue
            .lock()
            .unwrap()
            .iter()
            .any(|(n, g)| n == role && *g == guard);
        if !known {
            return Err(StoreError::NotFound(format!("role '{role}'")));
        }
        let mut grants = self.grants.lock().unwrap();
        let held = grants.entry((identity, guard)).or_default();
        if !held.iter().any(|r| r == role) {
            held.push(role.to_string());
        }
        Ok(())
    }
}

/// Reversible "hash" so session tests stay fast.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        match hash.strip_prefix("plain$") {
            Some(stored) => Ok(stored == password),
            None => Err(PasswordError::MalformedHash),
        }
    }
}
