use serde::Serialize;

use warta_core::{IdentityId, TokenId};

/// Result of a successful [`AuthGate::authorize`](crate::AuthGate::authorize).
///
/// Passed explicitly to every operation that acts on behalf of a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizedContext {
    pub identity_id: IdentityId,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub token_id: TokenId,
}
