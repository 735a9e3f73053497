//! In-Memory Repository Implementation
//!
//! Same contract as the PostgreSQL adapter, kept in process memory. Used by
//! tests and as the fallback store for local development.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::{
    session::Session,
    user::{User, UserPatch},
};
use crate::domain::repository::{RoleRepository, SessionRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_id::UserId,
    user_name::UserName,
    user_role::Role,
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, User>,
    roles: Vec<Role>,
    sessions: HashMap<Uuid, Session>,
}

impl Store {
    fn email_taken(&self, email: &Email, except: Option<&UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == *email && Some(&u.user_id) != except)
    }

    fn user_name_taken(&self, user_name: &UserName, except: Option<&UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.user_name.same_as(user_name) && Some(&u.user_id) != except)
    }

    /// Mirrors the unique index on refresh_token
    fn refresh_token_taken(&self, refresh_token: &str) -> bool {
        self.sessions
            .values()
            .any(|s| s.refresh_token == refresh_token)
    }
}

/// In-memory auth repository; clones share the same data
#[derive(Clone)]
pub struct InMemoryAuthRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryAuthRepository {
    /// Empty store with the `USER` and `ADMIN` roles seeded
    pub fn new() -> Self {
        Self::with_roles(vec![Role::User, Role::Admin])
    }

    /// Empty store seeded with exactly `roles`
    pub fn with_roles(roles: Vec<Role>) -> Self {
        Self {
            store: Arc::new(RwLock::new(Store {
                roles,
                ..Default::default()
            })),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.store.read().await.users.len()
    }

    pub async fn session_count(&self) -> usize {
        self.store.read().await.sessions.len()
    }
}

impl Default for InMemoryAuthRepository {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for InMemoryAuthRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.email == *email).cloned())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.get(user_id.as_uuid()).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.store.read().await.email_taken(email, None))
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        Ok(self.store.read().await.user_name_taken(user_name, None))
    }

    async fn create(&self, user: &User, first_session: &Session) -> AuthResult<()> {
        let mut store = self.store.write().await;

        if store.email_taken(&user.email, None) {
            return Err(AuthError::DuplicateEmail);
        }
        if store.user_name_taken(&user.user_name, None) {
            return Err(AuthError::DuplicateUserName);
        }
        if store.refresh_token_taken(&first_session.refresh_token) {
            return Err(AuthError::refresh_token_taken());
        }

        store.users.insert(*user.user_id.as_uuid(), user.clone());
        store
            .sessions
            .insert(*first_session.session_id.as_uuid(), first_session.clone());
        Ok(())
    }

    async fn update_fields(&self, user_id: &UserId, patch: UserPatch) -> AuthResult<Option<User>> {
        let mut store = self.store.write().await;

        if let Some(email) = &patch.email {
            if store.email_taken(email, Some(user_id)) {
                return Err(AuthError::DuplicateEmail);
            }
        }
        if let Some(user_name) = &patch.user_name {
            if store.user_name_taken(user_name, Some(user_id)) {
                return Err(AuthError::DuplicateUserName);
            }
        }

        Ok(store.users.get_mut(user_id.as_uuid()).map(|user| {
            user.apply(patch);
            user.clone()
        }))
    }
}

// ============================================================================
// Role Repository Implementation
// ============================================================================

impl RoleRepository for InMemoryAuthRepository {
    async fn find_by_value(&self, value: &str) -> AuthResult<Option<Role>> {
        let store = self.store.read().await;
        Ok(store.roles.iter().copied().find(|r| r.code() == value))
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for InMemoryAuthRepository {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        let mut store = self.store.write().await;

        if store.refresh_token_taken(&session.refresh_token) {
            return Err(AuthError::refresh_token_taken());
        }

        store
            .sessions
            .insert(*session.session_id.as_uuid(), session.clone());
        Ok(())
    }

    async fn find_by_token(&self, refresh_token: &str) -> AuthResult<Option<Session>> {
        let store = self.store.read().await;
        Ok(store
            .sessions
            .values()
            .find(|s| s.refresh_token == refresh_token)
            .cloned())
    }

    async fn find_all_for_user(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        let store = self.store.read().await;
        let mut sessions: Vec<Session> = store
            .sessions
            .values()
            .filter(|s| s.user_id == *user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn replace_token(
        &self,
        user_id: &UserId,
        old_token: &str,
        new_token: &str,
        user_agent: Option<&str>,
    ) -> AuthResult<Option<Session>> {
        // Match and swap under one write lock
        let mut store = self.store.write().await;

        Ok(store
            .sessions
            .values_mut()
            .find(|s| s.user_id == *user_id && s.refresh_token == old_token)
            .map(|session| {
                session.rotate(new_token.to_string(), user_agent.map(str::to_string));
                session.clone()
            }))
    }

    async fn delete_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let mut store = self.store.write().await;
        let before = store.sessions.len();
        store.sessions.retain(|_, s| s.user_id != *user_id);
        Ok((before - store.sessions.len()) as u64)
    }

    async fn cleanup_expired(&self, older_than: DateTime<Utc>) -> AuthResult<u64> {
        let mut store = self.store.write().await;
        let before = store.sessions.len();
        store.sessions.retain(|_, s| s.updated_at >= older_than);
        let deleted = (before - store.sessions.len()) as u64;

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::UserPassword;
    use crate::domain::value_object::user_role::RoleSet;

    fn user(name: &str, email: &str) -> User {
        let hash = UserPassword::from_hash_string(format!("$2b$04${}", "a".repeat(53))).unwrap();
        User::new(
            UserName::new(name).unwrap(),
            Email::new(email).unwrap(),
            hash,
            Role::User,
        )
    }

    #[tokio::test]
    async fn test_roles_are_seeded() {
        let repo = InMemoryAuthRepository::new();
        assert_eq!(repo.find_by_value("USER").await.unwrap(), Some(Role::User));
        assert_eq!(repo.find_by_value("ADMIN").await.unwrap(), Some(Role::Admin));
        assert_eq!(repo.find_by_value("ROOT").await.unwrap(), None);

        let empty = InMemoryAuthRepository::with_roles(vec![]);
        assert_eq!(empty.find_by_value("USER").await.unwrap(), None);
    }

    async fn create_user(repo: &InMemoryAuthRepository, user: &User) -> AuthResult<()> {
        let session = Session::new(user.user_id, format!("token-{}", user.user_id), None);
        UserRepository::create(repo, user, &session).await
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let repo = InMemoryAuthRepository::new();
        create_user(&repo, &user("Admin", "admin@mail.ru")).await.unwrap();

        let dup_email = create_user(&repo, &user("Other", "admin@mail.ru")).await;
        assert!(matches!(dup_email, Err(AuthError::DuplicateEmail)));

        let dup_name = create_user(&repo, &user("ADMIN", "other@mail.ru")).await;
        assert!(matches!(dup_name, Err(AuthError::DuplicateUserName)));

        assert_eq!(repo.user_count().await, 1);
        assert_eq!(repo.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_writes_user_and_session_together() {
        let repo = InMemoryAuthRepository::new();
        let admin = user("Admin", "admin@mail.ru");
        let session = Session::new(admin.user_id, "r1".to_string(), Some("curl".to_string()));
        UserRepository::create(&repo, &admin, &session).await.unwrap();

        let stored = repo.find_by_token("r1").await.unwrap().unwrap();
        assert_eq!(stored.user_id, admin.user_id);

        // A colliding token leaves no user behind
        let bob = user("Bob", "bob@mail.ru");
        let clash = Session::new(bob.user_id, "r1".to_string(), None);
        let result = UserRepository::create(&repo, &bob, &clash).await;

        assert!(matches!(result, Err(AuthError::Internal(_))));
        assert!(repo.find_by_id(&bob.user_id).await.unwrap().is_none());
        assert_eq!(repo.user_count().await, 1);
        assert_eq!(repo.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_fields() {
        let repo = InMemoryAuthRepository::new();
        let admin = user("Admin", "admin@mail.ru");
        create_user(&repo, &admin).await.unwrap();
        create_user(&repo, &user("Bob", "bob@mail.ru")).await.unwrap();

        let updated = repo
            .update_fields(
                &admin.user_id,
                UserPatch {
                    roles: Some([Role::User, Role::Admin].into_iter().collect::<RoleSet>()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.roles.contains(Role::Admin));

        let taken = repo
            .update_fields(
                &admin.user_id,
                UserPatch {
                    email: Some(Email::new("bob@mail.ru").unwrap()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(taken, Err(AuthError::DuplicateEmail)));

        let missing = repo
            .update_fields(&UserId::new(), UserPatch::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_replace_token_is_compare_and_swap() {
        let repo = InMemoryAuthRepository::new();
        let owner = UserId::new();
        let session = Session::new(owner, "r1".to_string(), None);
        SessionRepository::create(&repo, &session).await.unwrap();

        // Wrong owner
        assert!(
            repo.replace_token(&UserId::new(), "r1", "r2", None)
                .await
                .unwrap()
                .is_none()
        );

        let rotated = repo
            .replace_token(&owner, "r1", "r2", Some("curl/8"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rotated.session_id, session.session_id);
        assert_eq!(rotated.refresh_token, "r2");
        assert_eq!(rotated.user_agent.as_deref(), Some("curl/8"));

        // Old token no longer matches
        assert!(
            repo.replace_token(&owner, "r1", "r3", None)
                .await
                .unwrap()
                .is_none()
        );
        assert!(repo.find_by_token("r1").await.unwrap().is_none());
        assert!(repo.find_by_token("r2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_rotation_has_one_winner() {
        let repo = InMemoryAuthRepository::new();
        let owner = UserId::new();
        SessionRepository::create(&repo, &Session::new(owner, "r1".to_string(), None))
            .await
            .unwrap();

        let a = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.replace_token(&owner, "r1", "a", None).await })
        };
        let b = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.replace_token(&owner, "r1", "b", None).await })
        };

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        assert_eq!(a.is_some() as u8 + b.is_some() as u8, 1);
    }

    #[tokio::test]
    async fn test_duplicate_refresh_token_rejected() {
        let repo = InMemoryAuthRepository::new();
        let owner = UserId::new();
        SessionRepository::create(&repo, &Session::new(owner, "r1".to_string(), None))
            .await
            .unwrap();

        let dup = SessionRepository::create(&repo, &Session::new(owner, "r1".to_string(), None)).await;
        assert!(matches!(
            dup,
            Err(AuthError::Internal(ref msg)) if msg.as_str() == "Refresh token already bound to a session"
        ));
        assert_eq!(repo.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_for_user_and_cleanup() {
        let repo = InMemoryAuthRepository::new();
        let alice = UserId::new();
        let bob = UserId::new();

        for token in ["a1", "a2"] {
            SessionRepository::create(&repo, &Session::new(alice, token.to_string(), None))
                .await
                .unwrap();
        }
        let mut stale = Session::new(bob, "b1".to_string(), None);
        stale.updated_at = Utc::now() - chrono::Duration::days(40);
        SessionRepository::create(&repo, &stale).await.unwrap();

        assert_eq!(repo.find_all_for_user(&alice).await.unwrap().len(), 2);
        assert_eq!(repo.delete_for_user(&alice).await.unwrap(), 2);
        assert_eq!(repo.delete_for_user(&alice).await.unwrap(), 0);

        let cutoff = Utc::now() - chrono::Duration::days(30);
        assert_eq!(repo.cleanup_expired(cutoff).await.unwrap(), 1);
        assert_eq!(repo.session_count().await, 0);
    }
}
