//! Configuration loaded from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use warta_auth::RequiredRoles;
use warta_letters::LetterPolicy;
use warta_observability::{LogFormat, LogSettings};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} must be set when {requires} is set")]
    Missing {
        var: &'static str,
        requires: &'static str,
    },
}

/// Administrator created at start when no identity with that login exists.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// PostgreSQL when set; in-memory stores otherwise.
    pub database_url: Option<String>,
    pub db_pool_size: u32,
    /// `None` issues tokens that never expire.
    pub token_ttl: Option<chrono::Duration>,
    pub request_timeout: Duration,
    /// Expose internal error detail in responses.
    pub debug: bool,
    pub policy: LetterPolicy,
    pub log: LogSettings,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            db_pool_size: DEFAULT_POOL_SIZE,
            token_ttl: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            debug: false,
            policy: LetterPolicy::default(),
            log: LogSettings::default(),
            bootstrap_admin: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let bind_addr = match get("WARTA_BIND_ADDR") {
            Some(raw) => parse("WARTA_BIND_ADDR", &raw)?,
            None => defaults.bind_addr,
        };

        let db_pool_size = match get("WARTA_DB_POOL_SIZE") {
            Some(raw) => positive("WARTA_DB_POOL_SIZE", &raw)?,
            None => defaults.db_pool_size,
        };

        let token_ttl = match get("WARTA_TOKEN_TTL_MINUTES") {
            Some(raw) => {
                let minutes: u32 = positive("WARTA_TOKEN_TTL_MINUTES", &raw)?;
                Some(chrono::Duration::minutes(i64::from(minutes)))
            }
            None => None,
        };

        let request_timeout = match get("WARTA_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u32 = positive("WARTA_REQUEST_TIMEOUT_SECS", &raw)?;
                Duration::from_secs(u64::from(secs))
            }
            None => defaults.request_timeout,
        };

        let debug = match get("WARTA_DEBUG") {
            Some(raw) => flag("WARTA_DEBUG", &raw)?,
            None => false,
        };

        let policy = LetterPolicy {
            approvers: roles("WARTA_APPROVER_ROLES", get("WARTA_APPROVER_ROLES"), defaults.policy.approvers)?,
            intake: roles("WARTA_INTAKE_ROLES", get("WARTA_INTAKE_ROLES"), defaults.policy.intake)?,
            admins: roles("WARTA_ADMIN_ROLES", get("WARTA_ADMIN_ROLES"), defaults.policy.admins)?,
        };

        let log = LogSettings {
            format: match get("WARTA_LOG_FORMAT") {
                Some(raw) => raw.parse::<LogFormat>().map_err(|e| invalid("WARTA_LOG_FORMAT", &raw, e))?,
                None => LogFormat::default(),
            },
            ..LogSettings::default()
        };

        let bootstrap_admin = match get("WARTA_BOOTSTRAP_ADMIN_USERNAME") {
            Some(username) => {
                let email = get("WARTA_BOOTSTRAP_ADMIN_EMAIL").ok_or(ConfigError::Missing {
                    var: "WARTA_BOOTSTRAP_ADMIN_EMAIL",
                    requires: "WARTA_BOOTSTRAP_ADMIN_USERNAME",
                })?;
                let password = get("WARTA_BOOTSTRAP_ADMIN_PASSWORD").ok_or(ConfigError::Missing {
                    var: "WARTA_BOOTSTRAP_ADMIN_PASSWORD",
                    requires: "WARTA_BOOTSTRAP_ADMIN_USERNAME",
                })?;
                Some(BootstrapAdmin {
                    username,
                    email,
                    password,
                })
            }
            None => None,
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            db_pool_size,
            token_ttl,
            request_timeout,
            debug,
            policy,
            log,
            bootstrap_admin,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse::<T>().map_err(|e| invalid(var, raw, e))
}

fn positive(var: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match parse::<u32>(var, raw)? {
        0 => Err(invalid(var, raw, "must be greater than zero")),
        n => Ok(n),
    }
}

fn flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, raw, "expected true or false")),
    }
}

fn roles(
    var: &'static str,
    raw: Option<String>,
    default: RequiredRoles,
) -> Result<RequiredRoles, ConfigError> {
    match raw {
        Some(raw) => {
            let parsed = RequiredRoles::parse(&raw);
            if parsed.is_empty() {
                Err(invalid(var, &raw, "names at least one role"))
            } else {
                Ok(parsed)
            }
        }
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let settings = load(&[]).unwrap();
        assert_eq!(settings.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(settings.database_url.is_none());
        assert!(settings.token_ttl.is_none());
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.policy, LetterPolicy::default());
        assert!(settings.bootstrap_admin.is_none());
    }

    #[test]
    fn role_lists_are_trimmed() {
        let settings = load(&[("WARTA_APPROVER_ROLES", " kepala | redaktur ")]).unwrap();
        assert_eq!(settings.policy.approvers.names(), vec!["kepala", "redaktur"]);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = load(&[("WARTA_TOKEN_TTL_MINUTES", "0")]).unwrap_err();
        assert!(err.to_string().starts_with("WARTA_TOKEN_TTL_MINUTES"));

        let err = load(&[("WARTA_DEBUG", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "WARTA_DEBUG", .. }));

        let err = load(&[("WARTA_ADMIN_ROLES", " | ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "WARTA_ADMIN_ROLES", .. }));
    }

    #[test]
    fn bootstrap_admin_needs_all_three_values() {
        let err = load(&[("WARTA_BOOTSTRAP_ADMIN_USERNAME", "admin")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                var: "WARTA_BOOTSTRAP_ADMIN_EMAIL",
                requires: "WARTA_BOOTSTRAP_ADMIN_USERNAME"
            }
        );

        let settings = load(&[
            ("WARTA_BOOTSTRAP_ADMIN_USERNAME", "admin"),
            ("WARTA_BOOTSTRAP_ADMIN_EMAIL", "admin@example.org"),
            ("WARTA_BOOTSTRAP_ADMIN_PASSWORD", "gantipassword"),
            ("WARTA_TOKEN_TTL_MINUTES", "120"),
        ])
        .unwrap();
        let admin = settings.bootstrap_admin.unwrap();
        assert_eq!(admin.username, "admin");
        assert!(!format!("{admin:?}").contains("gantipassword"));
        assert_eq!(settings.token_ttl, Some(chrono::Duration::minutes(120)));
    }
}
