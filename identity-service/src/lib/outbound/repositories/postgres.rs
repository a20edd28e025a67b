use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgConnection;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::LoginName;
use crate::domain::user::models::Role;
use crate::domain::user::models::RoleId;
use crate::domain::user::models::RoleName;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::IdentityError;

const USERS_LOGIN_KEY: &str = "users_normalized_login_name_key";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    login_name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = IdentityError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(row.id),
            login: LoginName::new(row.login_name)?,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
}

impl TryFrom<RoleRow> for Role {
    type Error = IdentityError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Role {
            id: RoleId(row.id),
            name: RoleName::new(row.name)?,
        })
    }
}

fn database_error(e: sqlx::Error) -> IdentityError {
    IdentityError::Database(e.to_string())
}

/// Insert the role unless a row with the same normalized name exists, then
/// read back whichever row won.
async fn ensure_role_on(conn: &mut PgConnection, name: &RoleName) -> Result<Role, IdentityError> {
    sqlx::query(
        r#"
        INSERT INTO roles (id, name, normalized_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (normalized_name) DO NOTHING
        "#,
    )
    .bind(RoleId::new().0)
    .bind(name.as_str())
    .bind(name.normalized())
    .execute(&mut *conn)
    .await
    .map_err(database_error)?;

    let row = sqlx::query_as::<_, RoleRow>(
        r#"
        SELECT id, name
        FROM roles
        WHERE normalized_name = $1
        "#,
    )
    .bind(name.normalized())
    .fetch_one(&mut *conn)
    .await
    .map_err(database_error)?;

    row.try_into()
}

async fn link_role_on(
    conn: &mut PgConnection,
    user_id: &UserId,
    role: &Role,
) -> Result<(), IdentityError> {
    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id.0)
    .bind(role.id.0)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_foreign_key_violation() {
                return IdentityError::NotFound(user_id.to_string());
            }
        }
        database_error(e)
    })?;

    Ok(())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_user(&self, login: &LoginName) -> Result<Option<User>, IdentityError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, login_name, password_hash, created_at
            FROM users
            WHERE normalized_login_name = $1
            "#,
        )
        .bind(login.normalized())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, user: User, roles: &[RoleName]) -> Result<User, IdentityError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, login_name, normalized_login_name, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.0)
        .bind(user.login.as_str())
        .bind(user.login.normalized())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some(USERS_LOGIN_KEY) {
                    return IdentityError::DuplicateLogin(user.login.to_string());
                }
            }
            database_error(e)
        })?;

        for name in roles {
            let role = ensure_role_on(&mut tx, name).await?;
            link_role_on(&mut tx, &user.id, &role).await?;
        }

        // Dropping the transaction on any error above rolls everything back.
        tx.commit().await.map_err(database_error)?;

        Ok(user)
    }

    async fn ensure_role(&self, name: &RoleName) -> Result<Role, IdentityError> {
        let mut conn = self.pool.acquire().await.map_err(database_error)?;
        ensure_role_on(&mut conn, name).await
    }

    async fn assign_role(&self, user_id: &UserId, name: &RoleName) -> Result<(), IdentityError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        let role = ensure_role_on(&mut tx, name).await?;
        link_role_on(&mut tx, user_id, &role).await?;

        tx.commit().await.map_err(database_error)?;

        Ok(())
    }

    async fn roles_of(&self, user_id: &UserId) -> Result<BTreeSet<RoleName>, IdentityError> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT r.id, r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter()
            .map(|row| Role::try_from(row).map(|role| role.name))
            .collect()
    }
}
