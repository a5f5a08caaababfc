use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use tracing::instrument;

use warta_auth::{
    GuardScope, Identity, IdentityRepository, IdentityStatus, OwnerKind, RoleRepository,
    TokenRecord, TokenRepository,
};
use warta_core::{IdentityId, RoleId, StoreError, StoreResult, TokenId};

use super::{PgStore, decode_text, map_sqlx_error};

struct IdentityRow(Identity);

impl<'r> FromRow<'r, PgRow> for IdentityRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(IdentityRow(Identity {
            id: IdentityId::from_uuid(row.try_get("id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            status: decode_text::<IdentityStatus>("status", &status)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

struct TokenRow(TokenRecord);

impl<'r> FromRow<'r, PgRow> for TokenRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TokenRow(TokenRecord {
            id: TokenId::from_uuid(row.try_get("id")?),
            identity_id: IdentityId::from_uuid(row.try_get("identity_id")?),
            name: row.try_get("name")?,
            token_hash: row.try_get("token_hash")?,
            expires_at: row.try_get("expires_at")?,
            last_used_at: row.try_get("last_used_at")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

const IDENTITY_COLUMNS: &str =
    "id, username, email, password_hash, status, created_at, updated_at";

// ─────────────────────────────────────────────────────────────────────────────
// Tokens
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TokenRepository for PgStore {
    #[instrument(skip(self, token), fields(token_id = %token.id, identity_id = %token.identity_id), err)]
    async fn insert(&self, token: &TokenRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_tokens
                (id, identity_id, name, token_hash, expires_at, last_used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(token.id.as_uuid())
        .bind(token.identity_id.as_uuid())
        .bind(&token.name)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.last_used_at)
        .bind(token.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_token", e))?;
        Ok(())
    }

    #[instrument(skip_all, err)]
    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<TokenRecord>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, identity_id, name, token_hash, expires_at, last_used_at, created_at
            FROM access_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("find_token", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self, token_hash), err)]
    async fn delete_by_hash(
        &self,
        token_hash: &str,
        owner: Option<IdentityId>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM access_tokens
            WHERE token_hash = $1 AND ($2::uuid IS NULL OR identity_id = $2)
            "#,
        )
        .bind(token_hash)
        .bind(owner.map(uuid::Uuid::from))
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("delete_token", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete_for_identity(&self, identity: IdentityId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE identity_id = $1")
            .bind(identity.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_identity_tokens", e))?;
        Ok(result.rows_affected())
    }

    async fn touch(&self, token_hash: &str, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE access_tokens SET last_used_at = $2 WHERE token_hash = $1")
            .bind(token_hash)
            .bind(at)
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("touch_token", e))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identities
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl IdentityRepository for PgStore {
    #[instrument(skip(self), err)]
    async fn find_by_id(&self, id: IdentityId) -> StoreResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("find_identity", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), err)]
    async fn find_by_login(&self, login: &str) -> StoreResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE username = $1 OR email = $1 LIMIT 1"
        ))
        .bind(login)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("find_identity_by_login", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self, identity), fields(identity_id = %identity.id), err)]
    async fn insert(&self, identity: &Identity) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO identities
                (id, username, email, password_hash, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(identity.id.as_uuid())
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.status.as_str())
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| match map_sqlx_error("insert_identity", e) {
            StoreError::Conflict(_) => {
                StoreError::Conflict("username or email already registered".into())
            }
            other => other,
        })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn set_status(
        &self,
        id: IdentityId,
        status: IdentityStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE identities SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(at)
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("set_identity_status", e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RoleRepository for PgStore {
    #[instrument(skip(self), err)]
    async fn role_names(
        &self,
        identity: IdentityId,
        owner: OwnerKind,
        guard: GuardScope,
    ) -> StoreResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT r.name
            FROM role_assignments a
            JOIN roles r ON r.id = a.role_id
            WHERE a.owner_kind = $1 AND a.owner_id = $2 AND r.guard = $3
            ORDER BY r.name
            "#,
        )
        .bind(owner.as_str())
        .bind(identity.as_uuid())
        .bind(guard.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("role_names", e))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("role_names", e))
    }

    #[instrument(skip(self), err)]
    async fn ensure_role(&self, name: &str, guard: GuardScope) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, guard)
            VALUES ($1, $2, $3)
            ON CONFLICT (name, guard) DO NOTHING
            "#,
        )
        .bind(RoleId::new().as_uuid())
        .bind(name)
        .bind(guard.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("ensure_role", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn assign(
        &self,
        identity: IdentityId,
        owner: OwnerKind,
        role: &str,
        guard: GuardScope,
    ) -> StoreResult<()> {
        let role_id: Option<uuid::Uuid> =
            sqlx::query_scalar("SELECT id FROM roles WHERE name = $1 AND guard = $2")
                .bind(role)
                .bind(guard.as_str())
                .fetch_optional(self.pool())
                .await
                .map_err(|e| map_sqlx_error("find_role", e))?;
        let Some(role_id) = role_id else {
            return Err(StoreError::NotFound(format!("role '{role}'")));
        };

        sqlx::query(
            r#"
            INSERT INTO role_assignments (role_id, owner_kind, owner_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(owner.as_str())
        .bind(identity.as_uuid())
        .execute(self.pool())
        .await
        .map_err(|e| match map_sqlx_error("assign_role", e) {
            StoreError::NotFound(_) => StoreError::NotFound("identity".into()),
            other => other,
        })?;
        Ok(())
    }
}
