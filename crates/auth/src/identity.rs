//! Identities: the people who log in and act on letters.
//!
//! An identity only carries data. Role checks go through
//! [`RoleResolver`](crate::RoleResolver), never through the entity itself.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warta_core::{DomainError, Entity, IdentityId};

// ─────────────────────────────────────────────────────────────────────────────
// Identity Status
// ─────────────────────────────────────────────────────────────────────────────

/// Account status. Only `Active` identities pass the auth gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    #[default]
    Active,
    Inactive,
    /// Stored as `suspended`; `banned` is accepted on input.
    #[serde(alias = "banned")]
    Suspended,
}

impl IdentityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityStatus::Active => "active",
            IdentityStatus::Inactive => "inactive",
            IdentityStatus::Suspended => "suspended",
        }
    }
}

impl core::fmt::Display for IdentityStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(IdentityStatus::Active),
            "inactive" => Ok(IdentityStatus::Inactive),
            "suspended" | "banned" => Ok(IdentityStatus::Suspended),
            other => Err(DomainError::validation(format!(
                "unknown identity status '{other}'"
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub username: String,
    pub email: String,
    /// PHC-formatted hash; never serialized outward.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub status: IdentityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: IdentityId::new(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            status: IdentityStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }
}

impl Entity for Identity {
    type Id = IdentityId;

    fn id(&self) -> IdentityId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banned_is_an_alias_for_suspended() {
        assert_eq!("banned".parse::<IdentityStatus>().unwrap(), IdentityStatus::Suspended);
        let parsed: IdentityStatus = serde_json::from_str("\"banned\"").unwrap();
        assert_eq!(parsed, IdentityStatus::Suspended);
        assert!("deleted".parse::<IdentityStatus>().is_err());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let identity = Identity::new("sekretariat", "sek@example.org", "$argon2id$secret", Utc::now());
        let json = serde_json::to_value(&identity).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["status"], "active");
    }
}
