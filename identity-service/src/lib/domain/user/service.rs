use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use auth::IssuedToken;
use auth::TokenIssuer;
use chrono::Utc;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::LoginName;
use crate::domain::user::models::Password;
use crate::domain::user::models::Registration;
use crate::domain::user::models::Role;
use crate::domain::user::models::RoleName;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::policy::PasswordPolicy;
use crate::domain::user::policy::RolePolicy;
use crate::user::errors::IdentityError;
use crate::user::ports::IdentityServicePort;
use crate::user::ports::UserRepository;

/// Domain service implementation for credential and token operations.
///
/// Concrete implementation of IdentityServicePort with dependency injection.
pub struct IdentityService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    token_issuer: Arc<TokenIssuer>,
    password_hasher: auth::PasswordHasher,
    password_policy: PasswordPolicy,
}

impl<UR> IdentityService<UR>
where
    UR: UserRepository,
{
    /// Create a new identity service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User and role persistence implementation
    /// * `token_issuer` - Signs tokens with the configured key and TTL
    /// * `password_policy` - Rules new passwords must satisfy
    pub fn new(
        repository: Arc<UR>,
        token_issuer: Arc<TokenIssuer>,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            repository,
            token_issuer,
            password_hasher: auth::PasswordHasher::new(),
            password_policy,
        }
    }

    async fn hash_password(&self, password: &Password) -> Result<String, IdentityError> {
        let hasher = self.password_hasher;
        let password = password.clone();

        tokio::task::spawn_blocking(move || hasher.hash(password.expose()))
            .await
            .map_err(|e| IdentityError::Unknown(format!("Hashing task failed: {}", e)))?
            .map_err(|e| IdentityError::Issuance(format!("Password hashing failed: {}", e)))
    }

    fn check_password_policy(&self, password: &Password) -> Result<(), IdentityError> {
        let violations = self.password_policy.violations(password);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(IdentityError::Validation(
                violations.iter().map(ToString::to_string).collect(),
            ))
        }
    }

    /// Validate every part of a registration, collecting all problems.
    fn validate_registration(
        &self,
        registration: Registration,
        policy: &RolePolicy,
    ) -> Result<CreateUserCommand, IdentityError> {
        let mut reasons = Vec::new();

        let login = match LoginName::new(registration.login) {
            Ok(login) => Some(login),
            Err(e) => {
                reasons.push(e.to_string());
                None
            }
        };

        reasons.extend(
            self.password_policy
                .violations(&registration.password)
                .iter()
                .map(ToString::to_string),
        );

        let roles = match registration.roles.filter(|names| !names.is_empty()) {
            None => policy.defaults.clone(),
            Some(names) => {
                let mut roles = BTreeSet::new();
                for name in names {
                    match RoleName::new(name) {
                        Ok(role) => match policy.permitted(&role) {
                            Some(permitted) => {
                                roles.insert(permitted.clone());
                            }
                            None => {
                                reasons.push(format!("Role '{}' cannot be granted here", role))
                            }
                        },
                        Err(e) => reasons.push(e.to_string()),
                    }
                }
                roles
            }
        };

        match login {
            Some(login) if reasons.is_empty() => Ok(CreateUserCommand::new(
                login,
                registration.password,
                roles.into_iter().collect(),
            )),
            _ => Err(IdentityError::Validation(reasons)),
        }
    }

    fn role_strings(roles: &[RoleName]) -> Vec<String> {
        roles.iter().map(|r| r.as_str().to_string()).collect()
    }
}

#[async_trait]
impl<UR> IdentityServicePort for IdentityService<UR>
where
    UR: UserRepository,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, IdentityError> {
        self.check_password_policy(&command.password)?;

        let password_hash = self.hash_password(&command.password).await?;

        let user = User {
            id: UserId::new(),
            login: command.login,
            password_hash,
            created_at: Utc::now(),
        };

        let created_user = self.repository.create_user(user, &command.roles).await?;
        tracing::info!(user_id = %created_user.id, "User created");

        Ok(created_user)
    }

    async fn find_user(&self, login: &LoginName) -> Result<User, IdentityError> {
        self.repository
            .find_user(login)
            .await?
            .ok_or(IdentityError::NotFound(login.to_string()))
    }

    async fn verify_password(
        &self,
        user: &User,
        password: &Password,
    ) -> Result<bool, IdentityError> {
        let hasher = self.password_hasher;
        let password = password.clone();
        let password_hash = user.password_hash.clone();

        tokio::task::spawn_blocking(move || hasher.verify(password.expose(), &password_hash))
            .await
            .map_err(|e| IdentityError::Unknown(format!("Verification task failed: {}", e)))?
            .map_err(|e| IdentityError::Issuance(e.to_string()))
    }

    async fn ensure_role(&self, name: &RoleName) -> Result<Role, IdentityError> {
        self.repository.ensure_role(name).await
    }

    async fn assign_role(&self, user_id: &UserId, name: &RoleName) -> Result<(), IdentityError> {
        self.repository.assign_role(user_id, name).await?;
        tracing::info!(user_id = %user_id, role = %name, "Role assigned");
        Ok(())
    }

    async fn roles_of(&self, user_id: &UserId) -> Result<BTreeSet<RoleName>, IdentityError> {
        self.repository.roles_of(user_id).await
    }

    async fn register(
        &self,
        registration: Registration,
        policy: &RolePolicy,
    ) -> Result<IssuedToken, IdentityError> {
        let command = self.validate_registration(registration, policy)?;
        let password_hash = self.hash_password(&command.password).await?;

        // Sign first: if persisting fails the token is dropped unseen.
        let issued = self
            .token_issuer
            .issue(command.login.as_str(), Self::role_strings(&command.roles))?;

        let user = User {
            id: UserId::new(),
            login: command.login,
            password_hash,
            created_at: Utc::now(),
        };

        let created_user = self.repository.create_user(user, &command.roles).await?;

        tracing::info!(
            user_id = %created_user.id,
            token_id = %issued.token_id,
            roles = ?issued.roles,
            "User registered and token issued"
        );

        Ok(issued)
    }

    async fn authenticate(
        &self,
        login: &str,
        password: &Password,
        policy: &RolePolicy,
    ) -> Result<IssuedToken, IdentityError> {
        let Ok(login) = LoginName::new(login) else {
            tracing::info!("Authentication rejected: malformed login");
            return Err(IdentityError::InvalidCredentials);
        };

        let user = match self.repository.find_user(&login).await? {
            Some(user) => user,
            None => {
                // Unknown logins still pay for one hash.
                let _ = self.hash_password(password).await;
                tracing::info!("Authentication rejected: unknown login");
                return Err(IdentityError::InvalidCredentials);
            }
        };

        if !self.verify_password(&user, password).await? {
            tracing::info!(user_id = %user.id, "Authentication rejected: password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }

        let held = self.repository.roles_of(&user.id).await?;
        let granted: Vec<RoleName> = policy.grant(&held).into_iter().collect();
        if granted.is_empty() {
            tracing::warn!(
                user_id = %user.id,
                held = ?held.iter().map(RoleName::as_str).collect::<Vec<_>>(),
                "Authentication rejected: no role grantable by this endpoint"
            );
            return Err(IdentityError::InvalidCredentials);
        }

        let issued = self
            .token_issuer
            .issue(user.login.as_str(), Self::role_strings(&granted))
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Token issuance failed");
                IdentityError::from(e)
            })?;

        tracing::info!(
            user_id = %user.id,
            token_id = %issued.token_id,
            roles = ?issued.roles,
            "Token issued"
        );

        Ok(issued)
    }
}
