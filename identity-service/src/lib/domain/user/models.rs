use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::LoginNameError;
use crate::user::errors::RoleNameError;

/// User account record.
///
/// Holds only the hash of the password, never the password itself.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub login: LoginName,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login name value type
///
/// An email address, validated with an RFC 5322 parser. Uniqueness is
/// case-insensitive: two logins differing only in case name the same account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginName(String);

impl LoginName {
    /// Create a new validated login name.
    ///
    /// Surrounding whitespace is trimmed before validation.
    ///
    /// # Errors
    /// * `InvalidFormat` - Not an email address
    pub fn new(login: impl Into<String>) -> Result<Self, LoginNameError> {
        let login: String = login.into();
        let login = login.trim().to_string();
        email_address::EmailAddress::from_str(&login)
            .map(|_| LoginName(login))
            .map_err(|e| LoginNameError::InvalidFormat(e.to_string()))
    }

    /// Get login name as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used as the uniqueness key.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for LoginName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password as submitted by a client.
///
/// Never printed: `Debug` is redacted so commands and requests can be logged
/// safely.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Access the plaintext for hashing or verification.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Role unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleId(pub Uuid);

impl RoleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role name value type
///
/// 1-64 characters of letters, digits, underscore and hyphen. Compared
/// case-insensitively, so `admin` and `Admin` are the same role.
#[derive(Debug, Clone)]
pub struct RoleName(String);

impl RoleName {
    const MAX_LENGTH: usize = 64;

    pub const USER: &'static str = "User";
    pub const ADMIN: &'static str = "Admin";

    /// Create a new valid role name.
    ///
    /// # Errors
    /// * `Empty` - Blank name
    /// * `TooLong` - Longer than 64 characters
    /// * `InvalidCharacters` - Contains characters other than letters, digits, `_`, `-`
    pub fn new(name: impl Into<String>) -> Result<Self, RoleNameError> {
        let name: String = name.into();
        let name = name.trim().to_string();
        let length = name.chars().count();

        if length == 0 {
            return Err(RoleNameError::Empty);
        }
        if length > Self::MAX_LENGTH {
            return Err(RoleNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(RoleNameError::InvalidCharacters(name));
        }

        Ok(Self(name))
    }

    /// The base role every ordinary account receives.
    pub fn user() -> Self {
        Self(Self::USER.to_string())
    }

    pub fn admin() -> Self {
        Self(Self::ADMIN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used as the uniqueness key.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for RoleName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for RoleName {}

impl PartialOrd for RoleName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoleName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized().cmp(&other.normalized())
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
}

/// Command to create a new user with domain types
#[derive(Debug)]
pub struct CreateUserCommand {
    pub login: LoginName,
    pub password: Password,
    pub roles: Vec<RoleName>,
}

impl CreateUserCommand {
    /// Construct a new create user command.
    ///
    /// # Arguments
    /// * `login` - Validated login name
    /// * `password` - Plain text password (will be hashed by service)
    /// * `roles` - Roles assigned together with the account
    pub fn new(login: LoginName, password: Password, roles: Vec<RoleName>) -> Self {
        Self {
            login,
            password,
            roles,
        }
    }
}

/// Unvalidated registration input, as received from a front end.
#[derive(Debug, Clone)]
pub struct Registration {
    pub login: String,
    pub password: Password,
    /// Requested roles; `None` or empty means the endpoint defaults
    pub roles: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_login_name_valid() {
        let login = LoginName::new(" a@x.com ").unwrap();
        assert_eq!(login.as_str(), "a@x.com");
    }

    #[test]
    fn test_login_name_invalid() {
        assert!(matches!(
            LoginName::new("not-an-email"),
            Err(LoginNameError::InvalidFormat(_))
        ));
        assert!(LoginName::new("").is_err());
    }

    #[test]
    fn test_login_name_normalized() {
        let login = LoginName::new("Alice@Example.COM").unwrap();
        assert_eq!(login.normalized(), "alice@example.com");
        assert_eq!(login.as_str(), "Alice@Example.COM");
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("hunter2");
        assert_eq!(format!("{:?}", password), "Password(***)");
        assert_eq!(password.expose(), "hunter2");
    }

    #[test]
    fn test_role_name_validation() {
        assert!(RoleName::new("Admin").is_ok());
        assert!(RoleName::new("read-only_2").is_ok());
        assert_eq!(RoleName::new("  ").unwrap_err(), RoleNameError::Empty);
        assert!(matches!(
            RoleName::new("a".repeat(65)),
            Err(RoleNameError::TooLong { max: 64, actual: 65 })
        ));
        assert!(matches!(
            RoleName::new("super user"),
            Err(RoleNameError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn test_role_name_case_insensitive() {
        let roles: BTreeSet<RoleName> = [
            RoleName::new("admin").unwrap(),
            RoleName::admin(),
            RoleName::user(),
        ]
        .into_iter()
        .collect();

        assert_eq!(roles.len(), 2);
        assert!(roles.contains(&RoleName::new("ADMIN").unwrap()));
    }
}
