use std::collections::BTreeSet;

use async_trait::async_trait;
use auth::IssuedToken;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::LoginName;
use crate::domain::user::models::Password;
use crate::domain::user::models::Registration;
use crate::domain::user::models::Role;
use crate::domain::user::models::RoleName;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::policy::RolePolicy;
use crate::user::errors::IdentityError;

/// Port for identity domain service operations.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Create new user with a hashed password and its initial roles.
    ///
    /// # Arguments
    /// * `command` - Validated login, plaintext password and roles
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `DuplicateLogin` - Login is already taken
    /// * `Validation` - Password violates the password policy
    /// * `Database` - Database operation failed
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, IdentityError>;

    /// Retrieve user by login name.
    ///
    /// # Errors
    /// * `NotFound` - No user with this login
    /// * `Database` - Database operation failed
    async fn find_user(&self, login: &LoginName) -> Result<User, IdentityError>;

    /// Check a plaintext password against the user's stored hash.
    ///
    /// Runs the hash on a blocking thread.
    ///
    /// # Returns
    /// True iff the password matches
    ///
    /// # Errors
    /// * `Issuance` - Stored hash is unreadable
    async fn verify_password(&self, user: &User, password: &Password)
        -> Result<bool, IdentityError>;

    /// Look up a role by name, creating it if absent.
    async fn ensure_role(&self, name: &RoleName) -> Result<Role, IdentityError>;

    /// Link a user to a role, creating the role if needed. Idempotent.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn assign_role(&self, user_id: &UserId, name: &RoleName) -> Result<(), IdentityError>;

    /// All roles currently held by a user.
    async fn roles_of(&self, user_id: &UserId) -> Result<BTreeSet<RoleName>, IdentityError>;

    /// Register a new account and issue its first token.
    ///
    /// Either the user, its role assignments and the token all come into
    /// existence or none of them do.
    ///
    /// # Arguments
    /// * `registration` - Raw login, password and requested roles
    /// * `policy` - Default and permitted roles for the calling endpoint
    ///
    /// # Returns
    /// Signed token carrying the assigned roles
    ///
    /// # Errors
    /// * `Validation` - Every input problem found, including roles outside the ceiling
    /// * `DuplicateLogin` - Login is already taken
    /// * `Issuance` - Hashing or signing failed
    async fn register(
        &self,
        registration: Registration,
        policy: &RolePolicy,
    ) -> Result<IssuedToken, IdentityError>;

    /// Verify credentials and issue a token.
    ///
    /// The token carries the roles the account holds, restricted to the
    /// policy's ceiling.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown login, wrong password, or no role
    ///   grantable by this endpoint
    /// * `Issuance` - Signing failed
    async fn authenticate(
        &self,
        login: &str,
        password: &Password,
        policy: &RolePolicy,
    ) -> Result<IssuedToken, IdentityError>;
}

/// Persistence operations for users and roles.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Retrieve user by login name (case-insensitive).
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_user(&self, login: &LoginName) -> Result<Option<User>, IdentityError>;

    /// Persist a new user together with its role assignments, atomically.
    ///
    /// Missing roles are created.
    ///
    /// # Errors
    /// * `DuplicateLogin` - Login is already taken; nothing is written
    /// * `Database` - Database operation failed; nothing is written
    async fn create_user(&self, user: User, roles: &[RoleName]) -> Result<User, IdentityError>;

    /// Look up a role by name, creating it if absent.
    ///
    /// Concurrent calls for the same name resolve to a single role.
    async fn ensure_role(&self, name: &RoleName) -> Result<Role, IdentityError>;

    /// Link a user to a role, creating the role first if needed.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Database` - Database operation failed
    async fn assign_role(&self, user_id: &UserId, name: &RoleName) -> Result<(), IdentityError>;

    /// Names of all roles linked to a user.
    async fn roles_of(&self, user_id: &UserId) -> Result<BTreeSet<RoleName>, IdentityError>;
}
