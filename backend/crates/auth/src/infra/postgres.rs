//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    session::Session,
    user::{User, UserPatch},
};
use crate::domain::repository::{RoleRepository, SessionRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    session_id::SessionId,
    user_id::UserId,
    user_name::UserName,
    user_password::UserPassword,
    user_role::{Role, RoleSet},
};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    user_id,
    user_name,
    email,
    password_hash,
    roles,
    avatar_url,
    created_at,
    updated_at
"#;

const SESSION_COLUMNS: &str = r#"
    session_id,
    user_id,
    refresh_token,
    user_agent,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations become the matching domain conflict
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_email_unique") => return AuthError::DuplicateEmail,
                Some("users_user_name_unique") => return AuthError::DuplicateUserName,
                Some("auth_sessions_refresh_token_unique") => {
                    return AuthError::refresh_token_taken();
                }
                _ => {}
            }
        }
    }
    AuthError::Database(err)
}

async fn insert_session<'e, E>(executor: E, session: &Session) -> AuthResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO auth_sessions (
            session_id,
            user_id,
            refresh_token,
            user_agent,
            created_at,
            updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(session.session_id.as_uuid())
    .bind(session.user_id.as_uuid())
    .bind(&session.refresh_token)
    .bind(&session.user_agent)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(executor)
    .await
    .map_err(map_unique_violation)?;

    Ok(())
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_name_canonical = $1)",
        )
        .bind(user_name.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, user: &User, first_session: &Session) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                user_name,
                user_name_canonical,
                email,
                password_hash,
                roles,
                avatar_url,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.user_name.original())
        .bind(user.user_name.canonical())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_str())
        .bind(user.roles.codes())
        .bind(&user.avatar_url)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        insert_session(&mut *tx, first_session).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_fields(&self, user_id: &UserId, patch: UserPatch) -> AuthResult<Option<User>> {
        let (set_avatar, avatar_url) = match patch.avatar_url {
            Some(url) => (true, url),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                user_name = COALESCE($2, user_name),
                user_name_canonical = COALESCE($3, user_name_canonical),
                email = COALESCE($4, email),
                avatar_url = CASE WHEN $5 THEN $6 ELSE avatar_url END,
                roles = COALESCE($7, roles),
                updated_at = $8
            WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id.as_uuid())
        .bind(patch.user_name.as_ref().map(|n| n.original().to_string()))
        .bind(patch.user_name.as_ref().map(|n| n.canonical().to_string()))
        .bind(patch.email.as_ref().map(|e| e.as_str().to_string()))
        .bind(set_avatar)
        .bind(avatar_url)
        .bind(patch.roles.as_ref().map(RoleSet::codes))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.map(|r| r.into_user()).transpose()
    }
}

// ============================================================================
// Role Repository Implementation
// ============================================================================

impl RoleRepository for PgAuthRepository {
    async fn find_by_value(&self, value: &str) -> AuthResult<Option<Role>> {
        let code: Option<String> = sqlx::query_scalar("SELECT value FROM roles WHERE value = $1")
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        code.map(|c| {
            Role::from_code(&c).ok_or_else(|| AuthError::Internal(format!("Unknown role: {}", c)))
        })
        .transpose()
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        insert_session(&self.pool, session).await
    }

    async fn find_by_token(&self, refresh_token: &str) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM auth_sessions WHERE refresh_token = $1"
        ))
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn find_all_for_user(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM auth_sessions WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SessionRow::into_session).collect())
    }

    async fn replace_token(
        &self,
        user_id: &UserId,
        old_token: &str,
        new_token: &str,
        user_agent: Option<&str>,
    ) -> AuthResult<Option<Session>> {
        // Single statement: the row lock makes a concurrent second rotation see no match
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            UPDATE auth_sessions SET
                refresh_token = $3,
                user_agent = COALESCE($4, user_agent),
                updated_at = $5
            WHERE user_id = $1 AND refresh_token = $2
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(user_id.as_uuid())
        .bind(old_token)
        .bind(new_token)
        .bind(user_agent)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn delete_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self, older_than: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE updated_at < $1")
            .bind(older_than)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    user_name: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let roles = RoleSet::from_codes(&self.roles)
            .map_err(|e| AuthError::Internal(format!("Invalid roles for user: {}", e)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            user_name: UserName::from_db(self.user_name),
            email: Email::from_db(self.email),
            password_hash: UserPassword::from_hash_string(self.password_hash)?,
            roles,
            avatar_url: self.avatar_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: Uuid,
    refresh_token: String,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: SessionId::from_uuid(self.session_id),
            user_id: UserId::from_uuid(self.user_id),
            refresh_token: self.refresh_token,
            user_agent: self.user_agent,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
