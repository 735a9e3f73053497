//! Sign Out Use Case
//!
//! Revokes the user's sessions so no outstanding refresh token can mint
//! new tokens. Access tokens already issued stay valid until they expire.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::domain::repository::SessionRepository;
use crate::error::{AuthError, AuthResult};

/// Sign out use case
pub struct SignOutUseCase<S>
where
    S: SessionRepository,
{
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> SignOutUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// Returns the number of sessions removed
    pub async fn execute(&self, refresh_token: &str) -> AuthResult<u64> {
        let claims = TokenService::new(self.config.clone()).verify_refresh(refresh_token)?;
        let user_id = claims.user_id()?;

        // A rotated-away or already revoked token cannot sign anyone out
        let session = self
            .session_repo
            .find_by_token(refresh_token)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or(AuthError::SessionMismatch)?;

        let deleted = self.session_repo.delete_for_user(&session.user_id).await?;

        tracing::info!(
            user_id = %user_id,
            sessions_deleted = deleted,
            "User signed out"
        );

        Ok(deleted)
    }
}
