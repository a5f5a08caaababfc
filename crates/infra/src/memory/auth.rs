use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warta_auth::{
    GuardScope, Identity, IdentityRepository, IdentityStatus, OwnerKind, RoleRepository,
    TokenRecord, TokenRepository,
};
use warta_core::{IdentityId, RoleId, StoreError, StoreResult};

use super::{EntityTable, read, write};

#[derive(Debug, Clone)]
struct RoleRow {
    id: RoleId,
    name: String,
    guard: GuardScope,
}

#[derive(Debug, Default)]
struct AuthTables {
    identities: EntityTable<Identity>,
    tokens: EntityTable<TokenRecord>,
    roles: Vec<RoleRow>,
    assignments: HashSet<(RoleId, OwnerKind, IdentityId)>,
}

/// Identities, tokens and role assignments kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAuthStore {
    inner: RwLock<AuthTables>,
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for InMemoryAuthStore {
    async fn insert(&self, token: &TokenRecord) -> StoreResult<()> {
        let mut tables = write(&self.inner)?;
        if tables.tokens.any(|t| t.token_hash == token.token_hash) {
            return Err(StoreError::Conflict("token hash already exists".into()));
        }
        if tables.identities.get(token.identity_id).is_none() {
            return Err(StoreError::NotFound("identity".into()));
        }
        tables.tokens.insert(token.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<TokenRecord>> {
        let tables = read(&self.inner)?;
        Ok(tables
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn delete_by_hash(
        &self,
        token_hash: &str,
        owner: Option<IdentityId>,
    ) -> StoreResult<bool> {
        let mut tables = write(&self.inner)?;
        let removed = tables.tokens.retain(|t| {
            !(t.token_hash == token_hash && owner.is_none_or(|o| o == t.identity_id))
        });
        Ok(removed > 0)
    }

    async fn delete_for_identity(&self, identity: IdentityId) -> StoreResult<u64> {
        let mut tables = write(&self.inner)?;
        Ok(tables.tokens.retain(|t| t.identity_id != identity) as u64)
    }

    async fn touch(&self, token_hash: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = write(&self.inner)?;
        let id = tables
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .map(|t| t.id);
        if let Some(token) = id.and_then(|id| tables.tokens.get_mut(id)) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryAuthStore {
    async fn find_by_id(&self, id: IdentityId) -> StoreResult<Option<Identity>> {
        Ok(read(&self.inner)?.identities.get(id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> StoreResult<Option<Identity>> {
        let tables = read(&self.inner)?;
        Ok(tables
            .identities
            .values()
            .find(|i| i.username == login || i.email == login)
            .cloned())
    }

    async fn insert(&self, identity: &Identity) -> StoreResult<()> {
        let mut tables = write(&self.inner)?;
        if tables.identities.any(|i| i.username == identity.username) {
            return Err(StoreError::Conflict("username already taken".into()));
        }
        if tables.identities.any(|i| i.email == identity.email) {
            return Err(StoreError::Conflict("email already registered".into()));
        }
        tables.identities.insert(identity.clone());
        Ok(())
    }

    async fn set_status(
        &self,
        id: IdentityId,
        status: IdentityStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tables = write(&self.inner)?;
        Ok(match tables.identities.get_mut(id) {
            Some(identity) => {
                identity.status = status;
                identity.updated_at = at;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl RoleRepository for InMemoryAuthStore {
    async fn role_names(
        &self,
        identity: IdentityId,
        owner: OwnerKind,
        guard: GuardScope,
    ) -> StoreResult<Vec<String>> {
        let tables = read(&self.inner)?;
        let mut names: Vec<String> = tables
            .roles
            .iter()
            .filter(|r| r.guard == guard && tables.assignments.contains(&(r.id, owner, identity)))
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn ensure_role(&self, name: &str, guard: GuardScope) -> StoreResult<()> {
        let mut tables = write(&self.inner)?;
        if !tables.roles.iter().any(|r| r.name == name && r.guard == guard) {
            tables.roles.push(RoleRow {
                id: RoleId::new(),
                name: name.to_string(),
                guard,
            });
        }
        Ok(())
    }

    async fn assign(
        &self,
        identity: IdentityId,
        owner: OwnerKind,
        role: &str,
        guard: GuardScope,
    ) -> StoreResult<()> {
        let mut tables = write(&self.inner)?;
        if tables.identities.get(identity).is_none() {
            return Err(StoreError::NotFound("identity".into()));
        }
        let Some(role_id) = tables
            .roles
            .iter()
            .find(|r| r.name == role && r.guard == guard)
            .map(|r| r.id)
        else {
            return Err(StoreError::NotFound(format!("role '{role}'")));
        };
        tables.assignments.insert((role_id, owner, identity));
        Ok(())
    }
}
