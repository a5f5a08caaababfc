/// The bearer credential that authenticated the request.
///
/// Inserted next to `warta_auth::AuthorizedContext` by the auth middleware;
/// logout needs it to revoke exactly the presented token.
#[derive(Clone)]
pub struct RequestCredential(String);

impl RequestCredential {
    pub fn new(credential: impl Into<String>) -> Self {
        Self(credential.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for RequestCredential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("RequestCredential(<redacted>)")
    }
}
