//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::{
    session::Session,
    user::{User, UserPatch},
};
use crate::domain::value_object::{
    email::Email, user_id::UserId, user_name::UserName, user_role::Role,
};
use crate::error::AuthResult;

/// User (credential) repository trait
///
/// Email and user name are unique. Callers check first; implementations
/// still reject a duplicate with `DuplicateEmail` / `DuplicateUserName`.
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Case-insensitive
    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool>;

    /// Insert a new user together with their first session; both or neither
    async fn create(&self, user: &User, first_session: &Session) -> AuthResult<()>;

    /// Apply a partial update; `None` if the user does not exist
    async fn update_fields(&self, user_id: &UserId, patch: UserPatch) -> AuthResult<Option<User>>;
}

/// Role reference data
#[trait_variant::make(RoleRepository: Send)]
pub trait LocalRoleRepository {
    /// Look a seeded role up by its code (`USER`, `ADMIN`)
    async fn find_by_value(&self, value: &str) -> AuthResult<Option<Role>>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn create(&self, session: &Session) -> AuthResult<()>;

    async fn find_by_token(&self, refresh_token: &str) -> AuthResult<Option<Session>>;

    /// Most recently rotated first
    async fn find_all_for_user(&self, user_id: &UserId) -> AuthResult<Vec<Session>>;

    /// Compare-and-swap rotation
    ///
    /// Replaces the token of the session owned by `user_id` whose current
    /// token is `old_token`, in a single atomic step. `None` means no such
    /// session exists (revoked, already rotated, or never issued).
    async fn replace_token(
        &self,
        user_id: &UserId,
        old_token: &str,
        new_token: &str,
        user_agent: Option<&str>,
    ) -> AuthResult<Option<Session>>;

    /// Delete every session of a user; returns how many were removed
    async fn delete_for_user(&self, user_id: &UserId) -> AuthResult<u64>;

    /// Delete sessions not rotated since `older_than`
    async fn cleanup_expired(&self, older_than: DateTime<Utc>) -> AuthResult<u64>;
}

/// Everything the HTTP layer needs from one storage backend
pub trait AuthStore:
    UserRepository + RoleRepository + SessionRepository + Clone + Send + Sync + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository + RoleRepository + SessionRepository + Clone + Send + Sync + 'static
{
}
