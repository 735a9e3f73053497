//! Auth Middleware
//!
//! Bearer-token guard for protected routes, plus the admin gate that sits
//! on top of it.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use platform::client::extract_bearer_token;

use crate::application::token::{AccessPayload, TokenService};
use crate::domain::policy::ensure_role;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{
    user_id::UserId,
    user_role::{Role, RoleSet},
};
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Verified caller identity, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: UserId,
    pub user_name: String,
    pub roles: RoleSet,
}

impl From<AccessPayload> for AuthContext {
    fn from(payload: AccessPayload) -> Self {
        Self {
            user_id: payload.user_id,
            user_name: payload.user_name,
            roles: payload.roles,
        }
    }
}

/// Require a valid access token (`Authorization: Bearer <token>`)
///
/// Missing token: 401 `MissingToken`. Bad or expired token: 401.
pub async fn require_access_token<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthStore,
{
    let token = extract_bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let payload = TokenService::new(state.config.clone()).verify_access(token)?;

    req.extensions_mut().insert(AuthContext::from(payload));

    Ok(next.run(req).await)
}

/// Require the ADMIN role. Must run after [`require_access_token`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AuthError> {
    let context = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(AuthError::MissingToken)?;

    ensure_role(&context.roles, Role::Admin)?;

    Ok(next.run(req).await)
}
