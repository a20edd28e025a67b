use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::user::models::LoginName;
use crate::domain::user::models::Role;
use crate::domain::user::models::RoleId;
use crate::domain::user::models::RoleName;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::IdentityError;

/// Process-local user and role store.
///
/// Every write happens under a single lock, which gives the same atomicity and
/// uniqueness the Postgres adapter gets from transactions and constraints.
/// Contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    /// normalized login -> user
    users: HashMap<String, User>,
    /// normalized role name -> role
    roles: HashMap<String, Role>,
    assignments: HashMap<UserId, BTreeSet<RoleName>>,
}

impl State {
    fn ensure_role(&mut self, name: &RoleName) -> Role {
        self.roles
            .entry(name.normalized())
            .or_insert_with(|| Role {
                id: RoleId::new(),
                name: name.clone(),
            })
            .clone()
    }

    fn contains_user(&self, user_id: &UserId) -> bool {
        self.users.values().any(|u| u.id == *user_id)
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct roles stored.
    pub async fn role_count(&self) -> usize {
        self.state.read().await.roles.len()
    }

    /// Number of users stored.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_user(&self, login: &LoginName) -> Result<Option<User>, IdentityError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .get(&login.normalized())
            .cloned())
    }

    async fn create_user(&self, user: User, roles: &[RoleName]) -> Result<User, IdentityError> {
        let mut state = self.state.write().await;

        let key = user.login.normalized();
        if state.users.contains_key(&key) {
            return Err(IdentityError::DuplicateLogin(user.login.to_string()));
        }

        let held: BTreeSet<RoleName> = roles.iter().map(|name| state.ensure_role(name).name).collect();

        state.assignments.insert(user.id, held);
        state.users.insert(key, user.clone());

        Ok(user)
    }

    async fn ensure_role(&self, name: &RoleName) -> Result<Role, IdentityError> {
        Ok(self.state.write().await.ensure_role(name))
    }

    async fn assign_role(&self, user_id: &UserId, name: &RoleName) -> Result<(), IdentityError> {
        let mut state = self.state.write().await;

        if !state.contains_user(user_id) {
            return Err(IdentityError::NotFound(user_id.to_string()));
        }

        let role = state.ensure_role(name);
        state
            .assignments
            .entry(*user_id)
            .or_default()
            .insert(role.name);

        Ok(())
    }

    async fn roles_of(&self, user_id: &UserId) -> Result<BTreeSet<RoleName>, IdentityError> {
        Ok(self
            .state
            .read()
            .await
            .assignments
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
