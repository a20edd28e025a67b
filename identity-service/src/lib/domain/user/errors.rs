use thiserror::Error;

/// Error for LoginName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoginNameError {
    #[error("Login must be an email address: {0}")]
    InvalidFormat(String),
}

/// Error for RoleName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleNameError {
    #[error("Role name must not be empty")]
    Empty,

    #[error("Role name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("Role name '{0}' contains invalid characters (only alphanumeric, underscore, and hyphen allowed)")]
    InvalidCharacters(String),
}

/// Password policy violations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password must not be empty")]
    Empty,

    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password must contain a digit")]
    MissingDigit,

    #[error("Password must contain a lowercase letter")]
    MissingLowercase,

    #[error("Password must contain an uppercase letter")]
    MissingUppercase,

    #[error("Password must contain a non-alphanumeric character")]
    MissingNonAlphanumeric,
}

/// Top-level error for all identity operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    // Domain-level errors
    #[error("Login already exists: {0}")]
    DuplicateLogin(String),

    /// Unknown login and wrong password are deliberately the same value.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Token issuance failed: {0}")]
    Issuance(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    /// A blocking hash task was cancelled or panicked.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<LoginNameError> for IdentityError {
    fn from(err: LoginNameError) -> Self {
        IdentityError::Validation(vec![err.to_string()])
    }
}

impl From<RoleNameError> for IdentityError {
    fn from(err: RoleNameError) -> Self {
        IdentityError::Validation(vec![err.to_string()])
    }
}

impl From<auth::IssuanceError> for IdentityError {
    fn from(err: auth::IssuanceError) -> Self {
        IdentityError::Issuance(err.to_string())
    }
}
