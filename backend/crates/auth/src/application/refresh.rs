//! Refresh Use Case
//!
//! Exchanges a refresh token for a new pair and rotates the session.
//!
//! Rotation is a compare-and-swap in the store (owner + old token -> new
//! token), so a refresh token works exactly once. Presenting it again, or
//! racing two refreshes with the same token, leaves one caller with
//! `SessionMismatch`.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::{AccessPayload, TokenPair, TokenService};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Refresh input
pub struct RefreshInput {
    pub refresh_token: String,
    pub user_agent: Option<String>,
}

/// Refresh use case
pub struct RefreshUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, S> RefreshUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(&self, input: RefreshInput) -> AuthResult<TokenPair> {
        let tokens = TokenService::new(self.config.clone());

        let claims = tokens.verify_refresh(&input.refresh_token)?;
        let user_id = claims.user_id()?;

        // Current name/roles go into the new access token
        let user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let new_refresh = tokens.issue_refresh_token(&user.user_id)?;

        let session = self
            .session_repo
            .replace_token(
                &user.user_id,
                &input.refresh_token,
                &new_refresh,
                input.user_agent.as_deref(),
            )
            .await?
            .ok_or(AuthError::SessionMismatch)?;

        let access_token = tokens.issue_access_token(&AccessPayload::from(&user))?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            "Session rotated"
        );

        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh,
        })
    }
}
