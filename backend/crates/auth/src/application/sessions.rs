//! Sessions Use Case
//!
//! Lists a user's live sessions, and lets an admin revoke all of another
//! user's sessions.

use std::sync::Arc;

use crate::domain::entity::session::Session;
use crate::domain::policy::ensure_role;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{
    user_id::UserId,
    user_role::{Role, RoleSet},
};
use crate::error::{AuthError, AuthResult};

/// Sessions use case
pub struct SessionsUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
}

impl<U, S> SessionsUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>) -> Self {
        Self {
            user_repo,
            session_repo,
        }
    }

    pub async fn list(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        self.session_repo.find_all_for_user(user_id).await
    }

    /// ADMIN only. Returns the number of sessions removed.
    pub async fn revoke_user(&self, actor_roles: &RoleSet, target: &UserId) -> AuthResult<u64> {
        ensure_role(actor_roles, Role::Admin)?;

        if self.user_repo.find_by_id(target).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        let revoked = self.session_repo.delete_for_user(target).await?;

        tracing::info!(
            target_user_id = %target,
            sessions_deleted = revoked,
            "Sessions revoked by admin"
        );

        Ok(revoked)
    }
}
