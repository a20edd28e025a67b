//! Credential and token primitives for the identity service.
//!
//! Provides the building blocks the service composes into its login and
//! registration flows:
//! - Password hashing and verification (Argon2id, PHC strings)
//! - Role-carrying JWT claims, HS256 signing and verification
//! - Token issuance with a fixed time-to-live
//!
//! Nothing here knows about storage or HTTP. The service decides which identity
//! and which roles go into a token; this crate only makes that token
//! tamper-evident and time-bounded.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Issuing and Verifying Tokens
//! ```
//! use auth::TokenIssuer;
//! use chrono::Duration;
//!
//! let issuer = TokenIssuer::new(b"secret_key_at_least_32_bytes_long!", Duration::hours(1)).unwrap();
//! let issued = issuer.issue("alice@example.com", ["User"]).unwrap();
//!
//! let claims = issuer.verify(&issued.token).unwrap();
//! assert_eq!(claims.sub, "alice@example.com");
//! assert!(claims.has_role("User"));
//! ```

pub mod issuer;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use issuer::IssuanceError;
pub use issuer::IssuedToken;
pub use issuer::TokenIssuer;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
