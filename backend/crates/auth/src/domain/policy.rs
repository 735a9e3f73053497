//! Authorization Policy
//!
//! The one place role membership is decided. The HTTP guard and the use
//! cases both go through here.

use crate::domain::value_object::user_role::{Role, RoleSet};
use crate::error::{AuthError, AuthResult};

/// Whether `roles` grants `required`
pub fn has_role(roles: &RoleSet, required: Role) -> bool {
    roles.contains(required)
}

/// `Forbidden` unless `roles` grants `required`
pub fn ensure_role(roles: &RoleSet, required: Role) -> AuthResult<()> {
    if has_role(roles, required) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
