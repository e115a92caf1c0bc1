//! Configuration module for access-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct AccessConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub duplicate_grant_policy: DuplicateGrantPolicy,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Which existing grants block a new grant for the same (user, resource)
/// pair.
///
/// The historical behavior is `AnyStatus`: once a pair has ever held a
/// grant, even a revoked or expired one, no new grant is accepted without
/// manual cleanup. `ActiveOnly` relaxes the rule to live grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateGrantPolicy {
    #[default]
    AnyStatus,
    ActiveOnly,
}

impl DuplicateGrantPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "any-status" => Some(Self::AnyStatus),
            "active-only" => Some(Self::ActiveOnly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnyStatus => "any-status",
            Self::ActiveOnly => "active-only",
        }
    }
}

impl AccessConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let duplicate_grant_policy = match env::var("DUPLICATE_GRANT_POLICY") {
            Ok(raw) => DuplicateGrantPolicy::parse(&raw).ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "DUPLICATE_GRANT_POLICY must be 'any-status' or 'active-only', got '{}'",
                    raw
                ))
            })?,
            Err(_) => DuplicateGrantPolicy::default(),
        };

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "access-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            duplicate_grant_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_grant_policy_parses_known_values() {
        assert_eq!(
            DuplicateGrantPolicy::parse("any-status"),
            Some(DuplicateGrantPolicy::AnyStatus)
        );
        assert_eq!(
            DuplicateGrantPolicy::parse("active-only"),
            Some(DuplicateGrantPolicy::ActiveOnly)
        );
        assert_eq!(DuplicateGrantPolicy::parse("both"), None);
    }
}
