//! Bearer credential format: `"<tokenId>|<secret>"`.
//!
//! The id segment is advisory. Lookup always goes by the SHA-256 of the
//! secret, so `"5|abc123"` and `"abc123"` resolve to the same token.

use sha2::{Digest, Sha256};

use warta_core::TokenId;

pub const SEPARATOR: char = '|';

#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential {
    token_hint: Option<String>,
    secret: String,
}

impl BearerCredential {
    /// Split a raw credential on its first separator.
    ///
    /// Returns `None` for a blank credential.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let (hint, secret) = match raw.split_once(SEPARATOR) {
            Some((hint, secret)) => (Some(hint.to_string()), secret),
            None => (None, raw),
        };
        Some(Self {
            token_hint: hint,
            secret: secret.to_string(),
        })
    }

    /// Client-side token id, if one was sent. Never used for lookup.
    pub fn token_hint(&self) -> Option<&str> {
        self.token_hint.as_deref()
    }

    pub fn secret_hash(&self) -> String {
        hash_secret(&self.secret)
    }
}

impl core::fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BearerCredential")
            .field("token_hint", &self.token_hint)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Hex SHA-256 of a plaintext secret, as stored in the token table.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build the credential handed to the client.
pub fn compose(token_id: TokenId, secret: &str) -> String {
    format!("{token_id}{SEPARATOR}{secret}")
}
