use std::collections::BTreeSet;

use serde::Deserialize;

use crate::user::errors::PasswordPolicyError;
use crate::user::models::Password;
use crate::user::models::RoleName;

/// Password strength rules applied at registration.
///
/// Defaults only require a non-empty password; deployments tighten it through
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 1,
            require_digit: false,
            require_lowercase: false,
            require_uppercase: false,
            require_non_alphanumeric: false,
        }
    }
}

impl PasswordPolicy {
    /// Check a password against every rule.
    ///
    /// # Returns
    /// All violated rules, empty when the password is acceptable
    pub fn violations(&self, password: &Password) -> Vec<PasswordPolicyError> {
        let password = password.expose();
        if password.is_empty() {
            return vec![PasswordPolicyError::Empty];
        }

        let mut violations = Vec::new();

        let length = password.chars().count();
        if length < self.min_length {
            violations.push(PasswordPolicyError::TooShort {
                min: self.min_length,
                actual: length,
            });
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordPolicyError::MissingDigit);
        }
        if self.require_lowercase && !password.chars().any(char::is_lowercase) {
            violations.push(PasswordPolicyError::MissingLowercase);
        }
        if self.require_uppercase && !password.chars().any(char::is_uppercase) {
            violations.push(PasswordPolicyError::MissingUppercase);
        }
        if self.require_non_alphanumeric && password.chars().all(char::is_alphanumeric) {
            violations.push(PasswordPolicyError::MissingNonAlphanumeric);
        }

        violations
    }
}

/// Which roles an endpoint may hand out.
///
/// `defaults` are assigned at registration when the caller requests nothing.
/// `ceiling` bounds both what registration may assign and what a login token
/// may carry, whatever else the account holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    pub defaults: BTreeSet<RoleName>,
    pub ceiling: BTreeSet<RoleName>,
}

impl RolePolicy {
    pub fn new(
        defaults: impl IntoIterator<Item = RoleName>,
        ceiling: impl IntoIterator<Item = RoleName>,
    ) -> Self {
        Self {
            defaults: defaults.into_iter().collect(),
            ceiling: ceiling.into_iter().collect(),
        }
    }

    /// Plain registration: `User` only.
    pub fn user_registration() -> Self {
        Self::new([RoleName::user()], [RoleName::user()])
    }

    /// Administrator creation: `Admin` by default, may also grant `User`.
    pub fn admin_registration() -> Self {
        Self::new([RoleName::admin()], [RoleName::admin(), RoleName::user()])
    }

    /// Plain login: tokens carry at most `User`.
    pub fn user_login() -> Self {
        Self::new(Vec::<RoleName>::new(), [RoleName::user()])
    }

    /// Administrator login: tokens carry at most `Admin` and `User`.
    pub fn admin_login() -> Self {
        Self::new(
            Vec::<RoleName>::new(),
            [RoleName::admin(), RoleName::user()],
        )
    }

    /// The ceiling's own spelling of `role`, if this endpoint may grant it.
    pub fn permitted(&self, role: &RoleName) -> Option<&RoleName> {
        self.ceiling.get(role)
    }

    /// Restrict the roles an account holds to this endpoint's ceiling.
    ///
    /// Names come back spelled as in the ceiling, whatever casing the store
    /// holds them in.
    pub fn grant(&self, held: &BTreeSet<RoleName>) -> BTreeSet<RoleName> {
        self.ceiling
            .iter()
            .filter(|r| held.contains(*r))
            .cloned()
            .collect()
    }
}
