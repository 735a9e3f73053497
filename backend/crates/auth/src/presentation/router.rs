//! Auth Router

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::AuthStore;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{require_access_token, require_admin};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(repo, config)
}

/// Create a generic Auth router for any repository implementation
///
/// Paths are relative; mount under `/auth`.
pub fn auth_router_generic<R>(repo: R, config: AuthConfig) -> Router
where
    R: AuthStore,
{
    let state = AuthAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };

    let public = Router::new()
        .route("/registration", post(handlers::registration::<R>))
        .route("/login", post(handlers::login::<R>))
        .route(
            "/refresh",
            patch(handlers::refresh::<R>).post(handlers::refresh::<R>),
        )
        .route("/logout", delete(handlers::logout::<R>));

    let authenticated = Router::new()
        .route(
            "/me",
            get(handlers::me::<R>).patch(handlers::update_me::<R>),
        )
        .route("/sessions", get(handlers::list_sessions::<R>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token::<R>,
        ));

    // Layers run bottom-up: token check first, then the role check
    let admin = Router::new()
        .route(
            "/users/{id}/sessions",
            delete(handlers::revoke_user_sessions::<R>),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token::<R>,
        ));

    public.merge(authenticated).merge(admin).with_state(state)
}
