use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;

/// Issues and verifies role-carrying access tokens.
///
/// Holds the signing key (read-only after construction) and the token
/// time-to-live. Safe to share across tasks behind an `Arc`.
pub struct TokenIssuer {
    jwt_handler: JwtHandler,
    ttl: Duration,
}

/// A freshly signed token together with the facts it asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Compact JWT string
    pub token: String,
    /// Unique token identifier (`jti`)
    pub token_id: String,
    /// Roles embedded in the token, sorted
    pub roles: Vec<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Token issuance errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssuanceError {
    #[error("Token time-to-live must be positive")]
    InvalidTtl,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl TokenIssuer {
    /// Create a new token issuer.
    ///
    /// # Arguments
    /// * `signing_key` - Shared HMAC secret, at least 32 bytes
    /// * `ttl` - Lifetime of every issued token
    ///
    /// # Errors
    /// * `JwtError(InvalidKey)` - Signing key too short
    /// * `InvalidTtl` - Zero or negative lifetime
    pub fn new(signing_key: &[u8], ttl: Duration) -> Result<Self, IssuanceError> {
        if ttl <= Duration::zero() {
            return Err(IssuanceError::InvalidTtl);
        }

        Ok(Self {
            jwt_handler: JwtHandler::new(signing_key)?,
            ttl,
        })
    }

    /// Lifetime applied to issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `identity` carrying `roles`, valid from now.
    ///
    /// The issuer does not check that the identity exists; callers must only
    /// pass identities they have already authenticated.
    pub fn issue<I, R>(&self, identity: &str, roles: I) -> Result<IssuedToken, IssuanceError>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.issue_at(identity, roles, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at<I, R>(
        &self,
        identity: &str,
        roles: I,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, IssuanceError>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let claims = Claims::new(identity, roles, now, self.ttl);
        let token = self.jwt_handler.encode(&claims)?;

        Ok(IssuedToken {
            token,
            token_id: claims.jti,
            roles: claims.roles,
            issued_at: now,
            expires_at: now + self.ttl,
        })
    }

    /// Verify a token's signature and expiry against the current time.
    ///
    /// # Errors
    /// * `Expired` - Token is past its `exp`
    /// * `InvalidToken` - Signature mismatch or malformed token
    /// * `MissingClaim` - Required claim absent
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`. No clock skew is
    /// tolerated.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let claims: Claims = self.jwt_handler.decode(token)?;

        if claims.is_expired(now.timestamp()) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(KEY, Duration::hours(1)).expect("Failed to create issuer")
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();

        let issued = issuer
            .issue("a@x.com", ["User"])
            .expect("Failed to issue token");
        assert_eq!(issued.token.split('.').count(), 3);
        assert_eq!(issued.expires_at - issued.issued_at, Duration::hours(1));

        let claims = issuer.verify(&issued.token).expect("Token verification failed");
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.jti, issued.token_id);
        assert_eq!(claims.roles, vec!["User".to_string()]);
    }

    #[test]
    fn test_round_trip_preserves_role_set() {
        let issuer = issuer();

        let issued = issuer
            .issue("b@x.com", ["User", "Admin"])
            .expect("Failed to issue token");

        let claims = issuer.verify(&issued.token).expect("Token verification failed");
        assert_eq!(claims.roles, vec!["Admin".to_string(), "User".to_string()]);
        assert_eq!(claims.roles, issued.roles);
    }

    #[test]
    fn test_token_without_roles() {
        let issuer = issuer();

        let issued = issuer
            .issue("c@x.com", Vec::<String>::new())
            .expect("Failed to issue token");

        let claims = issuer.verify(&issued.token).expect("Token verification failed");
        assert!(claims.roles.is_empty());
    }

    #[test]
    fn test_each_issue_has_fresh_token_id() {
        let issuer = issuer();

        let first = issuer.issue("a@x.com", ["User"]).unwrap();
        let second = issuer.issue("a@x.com", ["User"]).unwrap();

        assert_ne!(first.token_id, second.token_id);
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_verify_with_different_key_fails() {
        let issued = issuer().issue("a@x.com", ["User"]).unwrap();

        let other = TokenIssuer::new(b"another_secret_key_at_least_32_bytes", Duration::hours(1))
            .expect("Failed to create issuer");

        let result = other.verify(&issued.token);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_token_expires_after_ttl() {
        let issuer = issuer();
        let issued_at = Utc::now();

        let issued = issuer.issue_at("a@x.com", ["User"], issued_at).unwrap();

        assert!(issuer
            .verify_at(&issued.token, issued_at + Duration::minutes(59))
            .is_ok());
        assert_eq!(
            issuer.verify_at(&issued.token, issued_at + Duration::minutes(61)),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let issuer = issuer();
        let issued = issuer.issue("a@x.com", ["User"]).unwrap();
        let forged = issuer.issue("a@x.com", ["Admin"]).unwrap();

        // Splice the Admin payload onto the User signature
        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged_parts: Vec<&str> = forged.token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(matches!(
            issuer.verify(&tampered),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_short_key_rejected() {
        let result = TokenIssuer::new(b"short", Duration::hours(1));
        assert!(matches!(
            result,
            Err(IssuanceError::JwtError(JwtError::InvalidKey { .. }))
        ));
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let result = TokenIssuer::new(KEY, Duration::zero());
        assert!(matches!(result, Err(IssuanceError::InvalidTtl)));
    }
}
