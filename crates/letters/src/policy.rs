use warta_auth::{RequiredRoles, Role};

/// Which roles unlock the privileged letter operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterPolicy {
    /// May approve or reject pending outgoing letters.
    pub approvers: RequiredRoles,
    /// May register and edit incoming letters.
    pub intake: RequiredRoles,
    /// Override ownership checks.
    pub admins: RequiredRoles,
}

impl Default for LetterPolicy {
    fn default() -> Self {
        Self {
            approvers: [Role::ADMIN, Role::REDAKTUR].iter().map(Role::as_str).collect(),
            intake: [Role::ADMIN, Role::EDITOR].iter().map(Role::as_str).collect(),
            admins: Role::ADMIN.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_seeded_roles() {
        let policy = LetterPolicy::default();
        assert_eq!(policy.approvers, RequiredRoles::parse("admin|redaktur"));
        assert_eq!(policy.intake, RequiredRoles::parse("admin|editor"));
        assert_eq!(policy.admins, RequiredRoles::parse("admin"));
    }
}
