use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use warta_core::{IdentityId, StoreResult};

use crate::repository::RoleRepository;

/// Role name used for RBAC.
///
/// Roles are opaque strings at this layer. Comparison is exact and
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const EDITOR: Role = Role(Cow::Borrowed("editor"));
    pub const REDAKTUR: Role = Role(Cow::Borrowed("redaktur"));
    pub const USER: Role = Role(Cow::Borrowed("user"));

    /// Roles seeded into every fresh catalogue.
    pub const CATALOGUE: [Role; 4] = [Role::ADMIN, Role::EDITOR, Role::REDAKTUR, Role::USER];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authentication context a role applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuardScope {
    #[default]
    Api,
    Web,
}

impl GuardScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardScope::Api => "api",
            GuardScope::Web => "web",
        }
    }
}

/// Kind of entity that owns a role assignment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    #[default]
    Identity,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Identity => "identity",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Required roles
// ─────────────────────────────────────────────────────────────────────────────

/// Roles a protected operation accepts. Holding ANY one of them is enough.
///
/// An empty set means "any authenticated identity".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredRoles(Vec<Role>);

impl RequiredRoles {
    /// Any authenticated identity.
    pub fn any() -> Self {
        Self::default()
    }

    /// Parse a `|`-delimited list such as `"admin | redaktur"`.
    ///
    /// Names are trimmed; blanks and duplicates are dropped, order is kept.
    pub fn parse(list: &str) -> Self {
        list.split('|').collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.0.iter().any(|r| r.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|r| r.as_str().to_string()).collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for RequiredRoles {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut roles: Vec<Role> = Vec::new();
        for raw in iter {
            let name = raw.as_ref().trim();
            if name.is_empty() || roles.iter().any(|r| r.as_str() == name) {
                continue;
            }
            roles.push(Role::new(name.to_string()));
        }
        Self(roles)
    }
}

impl From<Role> for RequiredRoles {
    fn from(value: Role) -> Self {
        Self(vec![value])
    }
}

impl core::fmt::Display for RequiredRoles {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, role) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            f.write_str(role.as_str())?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Role resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Answers "which roles does this identity hold" within one guard scope.
#[derive(Clone)]
pub struct RoleResolver {
    repo: Arc<dyn RoleRepository>,
    guard: GuardScope,
}

impl RoleResolver {
    pub fn new(repo: Arc<dyn RoleRepository>) -> Self {
        Self::with_guard(repo, GuardScope::Api)
    }

    pub fn with_guard(repo: Arc<dyn RoleRepository>, guard: GuardScope) -> Self {
        Self { repo, guard }
    }

    pub fn guard(&self) -> GuardScope {
        self.guard
    }

    pub async fn roles_of(&self, identity: IdentityId) -> StoreResult<Vec<Role>> {
        let names = self
            .repo
            .role_names(identity, OwnerKind::Identity, self.guard)
            .await?;
        Ok(names.into_iter().map(Role::new).collect())
    }

    pub async fn has_any_role(
        &self,
        identity: IdentityId,
        required: &RequiredRoles,
    ) -> StoreResult<bool> {
        if required.is_empty() {
            return Ok(false);
        }
        let granted = self
            .repo
            .role_names(identity, OwnerKind::Identity, self.guard)
            .await?;
        Ok(granted.iter().any(|name| required.contains(name)))
    }

    /// Grant `role` to `identity`. Granting a held role is a no-op.
    pub async fn assign(&self, identity: IdentityId, role: &Role) -> StoreResult<()> {
        self.repo
            .assign(identity, OwnerKind::Identity, role.as_str(), self.guard)
            .await
    }
}

impl core::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RoleResolver").field("guard", &self.guard).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRoles;
    use proptest::prelude::*;

    #[test]
    fn parse_trims_and_dedups() {
        let roles = RequiredRoles::parse(" admin |redaktur| admin ||");
        assert_eq!(roles.names(), vec!["admin", "redaktur"]);
        assert!(roles.contains("redaktur "));
        assert!(!roles.contains("Admin"));
        assert_eq!(roles.to_string(), "admin or redaktur");
    }

    #[tokio::test]
    async fn any_one_role_is_enough() {
        let resolver = RoleResolver::new(Arc::new(FakeRoles::seeded()));
        let id = IdentityId::new();
        resolver.assign(id, &Role::EDITOR).await.unwrap();

        assert!(resolver.has_any_role(id, &RequiredRoles::parse("admin|editor")).await.unwrap());
        assert!(!resolver.has_any_role(id, &RequiredRoles::parse("admin|redaktur")).await.unwrap());
    }

    #[tokio::test]
    async fn roles_in_another_guard_do_not_count() {
        let repo = Arc::new(FakeRoles::seeded());
        repo.ensure_role("admin", GuardScope::Web).await.unwrap();
        let web = RoleResolver::with_guard(repo.clone(), GuardScope::Web);
        let api = RoleResolver::new(repo);
        let id = IdentityId::new();
        web.assign(id, &Role::ADMIN).await.unwrap();

        assert!(!api.has_any_role(id, &Role::ADMIN.into()).await.unwrap());
        assert!(api.roles_of(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn assigning_an_unknown_role_fails() {
        let resolver = RoleResolver::new(Arc::new(FakeRoles::seeded()));
        let err = resolver
            .assign(IdentityId::new(), &Role::new("superuser"))
            .await
            .unwrap_err();
        assert!(matches!(err, warta_core::StoreError::NotFound(_)));
    }

    proptest! {
        #[test]
        fn parsed_names_are_trimmed_and_non_empty(list in "[ a-z|]{0,40}") {
            let roles = RequiredRoles::parse(&list);
            for role in roles.iter() {
                prop_assert!(!role.as_str().is_empty());
                prop_assert_eq!(role.as_str(), role.as_str().trim());
                prop_assert!(!role.as_str().contains('|'));
            }
        }
    }
}
