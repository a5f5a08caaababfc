//! `warta-auth` — bearer-token authentication and role-gated authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage: every
//! persistence need goes through the ports in [`repository`].

pub mod authorize;
pub mod context;
pub mod credential;
pub mod identity;
pub mod password;
pub mod repository;
pub mod roles;
pub mod session;
pub mod token;

pub use authorize::{AuthError, AuthGate, UnauthenticatedReason};
pub use context::AuthorizedContext;
pub use credential::BearerCredential;
pub use identity::{Identity, IdentityStatus};
pub use password::{PasswordError, PasswordHasher};
pub use repository::{IdentityRepository, RoleRepository, TokenRepository};
pub use roles::{GuardScope, OwnerKind, RequiredRoles, Role, RoleResolver};
pub use session::{Profile, RegisterIdentity, Session, SessionError, SessionService};
pub use token::{IssuedToken, TokenRecord, TokenStore};

#[cfg(test)]
pub(crate) mod testing;
