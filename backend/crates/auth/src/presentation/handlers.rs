//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use std::sync::Arc;

use platform::client::extract_user_agent;

use crate::application::config::AuthConfig;
use crate::application::{
    ProfileUpdateInput, ProfileUseCase, RefreshInput, RefreshUseCase, SessionsUseCase,
    SignInInput, SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase,
};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    LoginRequest, MessageResponse, ProfileResponse, RefreshRequest, RegistrationRequest,
    RevokeSessionsResponse, SessionResponse, TokenResponse, UpdateProfileRequest,
};
use crate::presentation::middleware::AuthContext;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Registration / Login
// ============================================================================

/// POST /auth/registration
pub async fn registration<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    Json(req): Json<RegistrationRequest>,
) -> AuthResult<(StatusCode, Json<TokenResponse>)>
where
    R: AuthStore,
{
    let use_case = SignUpUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SignUpInput {
            user_name: req.username,
            email: req.email,
            password: req.password,
            user_agent: extract_user_agent(&headers),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(output.tokens.into())))
}

/// POST /auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<TokenResponse>>
where
    R: AuthStore,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let tokens = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
            user_agent: extract_user_agent(&headers),
        })
        .await?;

    Ok(Json(tokens.into()))
}

// ============================================================================
// Refresh / Logout
// ============================================================================

/// PATCH or POST /auth/refresh
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<TokenResponse>>
where
    R: AuthStore,
{
    let use_case =
        RefreshUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let tokens = use_case
        .execute(RefreshInput {
            refresh_token: req.refresh,
            user_agent: extract_user_agent(&headers),
        })
        .await?;

    Ok(Json(tokens.into()))
}

/// DELETE /auth/logout
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthStore,
{
    let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
    use_case.execute(&req.refresh).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

// ============================================================================
// Profile (requires access token)
// ============================================================================

/// GET /auth/me
pub async fn me<R>(
    State(state): State<AuthAppState<R>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<Json<ProfileResponse>>
where
    R: AuthStore,
{
    let user = ProfileUseCase::new(state.repo.clone())
        .get(&ctx.user_id)
        .await?;

    Ok(Json(user.into()))
}

/// PATCH /auth/me
pub async fn update_me<R>(
    State(state): State<AuthAppState<R>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> AuthResult<Json<ProfileResponse>>
where
    R: AuthStore,
{
    let user = ProfileUseCase::new(state.repo.clone())
        .update(
            &ctx.user_id,
            ProfileUpdateInput {
                user_name: req.username,
                email: req.email,
                avatar_url: req.avatar_url,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

// ============================================================================
// Sessions
// ============================================================================

/// GET /auth/sessions
pub async fn list_sessions<R>(
    State(state): State<AuthAppState<R>>,
    Extension(ctx): Extension<AuthContext>,
) -> AuthResult<Json<Vec<SessionResponse>>>
where
    R: AuthStore,
{
    let sessions = SessionsUseCase::new(state.repo.clone(), state.repo.clone())
        .list(&ctx.user_id)
        .await?;

    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

/// DELETE /auth/users/{id}/sessions (ADMIN)
pub async fn revoke_user_sessions<R>(
    State(state): State<AuthAppState<R>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> AuthResult<Json<RevokeSessionsResponse>>
where
    R: AuthStore,
{
    let target: UserId = id
        .parse()
        .map_err(|_| AuthError::Validation("Invalid user id".to_string()))?;

    let revoked = SessionsUseCase::new(state.repo.clone(), state.repo.clone())
        .revoke_user(&ctx.roles, &target)
        .await?;

    Ok(Json(RevokeSessionsResponse {
        message: "Sessions revoked".to_string(),
        revoked,
    }))
}
