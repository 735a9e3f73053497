//! Profile Use Case
//!
//! Read and edit the signed-in user's own record.

use std::sync::Arc;

use crate::domain::entity::user::{User, UserPatch};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_id::UserId, user_name::UserName};
use crate::error::{AuthError, AuthResult};

/// Longest avatar reference accepted
pub const AVATAR_URL_MAX_LENGTH: usize = 2048;

/// Profile update input. `None` leaves a field as it is.
#[derive(Debug, Default)]
pub struct ProfileUpdateInput {
    pub user_name: Option<String>,
    pub email: Option<String>,
    /// Empty string clears the avatar
    pub avatar_url: Option<String>,
}

/// Profile use case
pub struct ProfileUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ProfileUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn get(&self, user_id: &UserId) -> AuthResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// A new email or user name must differ from the current one and be free
    pub async fn update(&self, user_id: &UserId, input: ProfileUpdateInput) -> AuthResult<User> {
        let user_name = input
            .user_name
            .map(|n| UserName::new(n).map_err(|e| AuthError::Validation(e.to_string())))
            .transpose()?;
        let email = input.email.map(Email::new).transpose()?;
        let avatar_url = input.avatar_url.map(normalize_avatar_url).transpose()?;

        let current = self.get(user_id).await?;

        if let Some(email) = &email {
            if *email == current.email {
                return Err(AuthError::Validation(
                    "New email must differ from the current one".to_string(),
                ));
            }
            if self.user_repo.exists_by_email(email).await? {
                return Err(AuthError::DuplicateEmail);
            }
        }

        if let Some(user_name) = &user_name {
            if *user_name == current.user_name {
                return Err(AuthError::Validation(
                    "New user name must differ from the current one".to_string(),
                ));
            }
            // Only a case change of one's own name skips the uniqueness check
            if !user_name.same_as(&current.user_name)
                && self.user_repo.exists_by_user_name(user_name).await?
            {
                return Err(AuthError::DuplicateUserName);
            }
        }

        let patch = UserPatch {
            user_name,
            email,
            avatar_url,
            roles: None,
        };
        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self
            .user_repo
            .update_fields(user_id, patch)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %user_id, "Profile updated");

        Ok(updated)
    }
}

fn normalize_avatar_url(raw: String) -> AuthResult<Option<String>> {
    let url = raw.trim();
    if url.is_empty() {
        return Ok(None);
    }
    if url.len() > AVATAR_URL_MAX_LENGTH {
        return Err(AuthError::Validation(format!(
            "Avatar URL must be at most {} characters",
            AVATAR_URL_MAX_LENGTH
        )));
    }
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AuthError::Validation(
            "Avatar URL cannot contain whitespace".to_string(),
        ));
    }
    Ok(Some(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_avatar_url() {
        assert_eq!(normalize_avatar_url("  ".to_string()).unwrap(), None);
        assert_eq!(
            normalize_avatar_url(" https://cdn.example.com/a.png ".to_string()).unwrap(),
            Some("https://cdn.example.com/a.png".to_string())
        );
        assert!(normalize_avatar_url("https://cdn.example.com/a b.png".to_string()).is_err());
        assert!(normalize_avatar_url("a".repeat(AVATAR_URL_MAX_LENGTH + 1)).is_err());
    }
}
