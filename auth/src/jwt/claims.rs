use std::collections::BTreeSet;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Claims carried by every issued access token.
///
/// Identity, a unique token id and the granted roles, bounded by `iat`/`exp`.
/// Roles are stored as a sorted, deduplicated list so the same grant always
/// serializes the same way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (login name of the authenticated user)
    pub sub: String,

    /// Email address, same value as `sub` for email-shaped logins
    pub email: String,

    /// JWT ID (unique token identifier)
    pub jti: String,

    /// Role names granted at issuance time
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build claims for an identity with a fresh token id.
    ///
    /// # Arguments
    /// * `identity` - Login name placed in `sub` and `email`
    /// * `roles` - Granted role names; duplicates are collapsed
    /// * `issued_at` - Issuance instant
    /// * `ttl` - Time until the token expires
    pub fn new<I, R>(identity: impl ToString, roles: I, issued_at: DateTime<Utc>, ttl: Duration) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let identity = identity.to_string();
        let roles: BTreeSet<String> = roles.into_iter().map(Into::into).collect();

        Self {
            sub: identity.clone(),
            email: identity,
            jti: Uuid::new_v4().to_string(),
            roles: roles.into_iter().collect(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    /// Check whether a role was granted.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if token is expired.
    ///
    /// A token is no longer valid at or after its `exp` instant.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }

    /// Expiration as a timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
