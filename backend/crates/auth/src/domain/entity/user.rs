//! User Entity

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email,
    user_id::UserId,
    user_name::UserName,
    user_password::UserPassword,
    user_role::{Role, RoleSet},
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique (case-insensitive)
    pub user_name: UserName,
    /// Unique, lowercase
    pub email: Email,
    pub password_hash: UserPassword,
    pub roles: RoleSet,
    /// Reference to an externally stored avatar
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New user holding exactly `role`
    pub fn new(user_name: UserName, email: Email, password_hash: UserPassword, role: Role) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            user_name,
            email,
            password_hash,
            roles: RoleSet::single(role),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a patch in place; returns whether anything changed
    pub fn apply(&mut self, patch: UserPatch) -> bool {
        if patch.is_empty() {
            return false;
        }

        if let Some(user_name) = patch.user_name {
            self.user_name = user_name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(avatar_url) = patch.avatar_url {
            self.avatar_url = avatar_url;
        }
        if let Some(roles) = patch.roles {
            self.roles = roles;
        }
        self.updated_at = Utc::now();
        true
    }
}

/// Partial update of a user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub user_name: Option<UserName>,
    pub email: Option<Email>,
    /// `Some(None)` clears the avatar
    pub avatar_url: Option<Option<String>>,
    pub roles: Option<RoleSet>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.user_name.is_none()
            && self.email.is_none()
            && self.avatar_url.is_none()
            && self.roles.is_none()
    }
}
