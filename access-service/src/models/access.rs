//! Access grant model and lifecycle transition rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state of an access grant.
///
/// `Active` is the only state that accepts updates; `Expired` and
/// `Revoked` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    Active,
    Expired,
    Revoked,
}

impl AccessStatus {
    /// Get string representation for database and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }

    /// Whether the state accepts no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::Revoked)
    }
}

impl std::fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Access is not active, no changes can be applied")]
    NotActive,

    #[error("An access cannot be marked expired while its expiry is in the future")]
    ExpiryInFuture,

    #[error("An active access cannot be given an expiry in the past")]
    ExpiryInPast,
}

/// Time-bounded grant linking one user to one resource.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Access {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource_id: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: AccessStatus,
    pub comment: Option<String>,
}

impl Access {
    /// Validate a requested transition against the lifecycle rules and
    /// return the `(status, expires_at)` pair to persist.
    ///
    /// Transition table:
    /// - Active -> Revoked: always allowed, expiry force-set to `now`.
    /// - Active -> Expired: requested expiry (default `now`) must not be
    ///   in the future.
    /// - Active -> Active: requested expiry, when present, must not be in
    ///   the past; otherwise the current expiry is kept.
    /// - Expired / Revoked -> anything: rejected.
    pub fn plan_transition(
        &self,
        desired: AccessStatus,
        requested_expiry: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(AccessStatus, DateTime<Utc>), TransitionError> {
        if self.status != AccessStatus::Active {
            return Err(TransitionError::NotActive);
        }

        match desired {
            // Revocation ignores any caller-supplied expiry.
            AccessStatus::Revoked => Ok((AccessStatus::Revoked, now)),
            AccessStatus::Expired => {
                let expiry = requested_expiry.unwrap_or(now);
                if expiry > now {
                    return Err(TransitionError::ExpiryInFuture);
                }
                Ok((AccessStatus::Expired, expiry))
            }
            AccessStatus::Active => match requested_expiry {
                Some(expiry) if expiry < now => Err(TransitionError::ExpiryInPast),
                Some(expiry) => Ok((AccessStatus::Active, expiry)),
                None => Ok((AccessStatus::Active, self.expires_at)),
            },
        }
    }
}

/// Input for creating a new access grant.
#[derive(Debug, Clone)]
pub struct CreateAccess {
    pub user_id: Uuid,
    pub resource_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub comment: Option<String>,
}

/// Conjunctive filters for searching access grants.
#[derive(Debug, Clone, Default)]
pub struct AccessFilter {
    pub user_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
    pub status: Option<AccessStatus>,
    /// Matches grants with `expires_at <= expires_before`.
    pub expires_before: Option<DateTime<Utc>>,
}
