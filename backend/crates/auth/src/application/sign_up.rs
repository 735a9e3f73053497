//! Sign Up Use Case
//!
//! Registers a user and opens their first session.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::{session::Session, user::User};
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_id::UserId,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
    user_role::Role,
};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub user_agent: Option<String>,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub user_id: UserId,
    pub tokens: TokenPair,
}

/// Sign up use case
pub struct SignUpUseCase<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<U, R> SignUpUseCase<U, R>
where
    U: UserRepository,
    R: RoleRepository,
{
    pub fn new(user_repo: Arc<U>, role_repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            role_repo,
            config,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        // Validate everything before touching the store
        let user_name =
            UserName::new(&input.user_name).map_err(|e| AuthError::Validation(e.to_string()))?;
        let email = Email::new(&input.email)?;
        let raw_password = RawPassword::new(input.password)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::DuplicateEmail);
        }
        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(AuthError::DuplicateUserName);
        }

        let role = self
            .role_repo
            .find_by_value(Role::DEFAULT.code())
            .await?
            .ok_or_else(|| {
                AuthError::Internal(format!("Role {} is not seeded", Role::DEFAULT))
            })?;

        let password_hash = UserPassword::from_raw(&raw_password, self.config.bcrypt_cost).await?;
        let user = User::new(user_name, email, password_hash, role);

        let tokens = TokenService::new(self.config.clone()).issue_pair(&user)?;
        let session = Session::new(user.user_id, tokens.refresh_token.clone(), input.user_agent);

        self.user_repo.create(&user, &session).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            session_id = %session.session_id,
            "User signed up"
        );

        Ok(SignUpOutput {
            user_id: user.user_id,
            tokens,
        })
    }
}
