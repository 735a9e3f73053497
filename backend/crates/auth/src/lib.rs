//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, role policy
//! - `application/` - Use cases and the token service
//! - `infra/` - PostgreSQL and in-memory implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Registration and login with email + password
//! - JWT access tokens (1 day) and refresh tokens (30 days)
//! - Server-side sessions, one per refresh token, several per user
//! - Single-use refresh tokens (compare-and-swap rotation)
//! - Logout revokes every session of the user
//! - Role-based access (USER, ADMIN)
//!
//! ## Security Model
//! - Passwords hashed with bcrypt (cost 10) off the async workers
//! - Tokens signed with HS256; access and refresh tokens are not interchangeable
//! - A refresh token is honoured only while a session still holds it

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::token::TokenService;
pub use error::{AuthError, AuthResult};
pub use infra::{memory::InMemoryAuthRepository, postgres::PgAuthRepository};
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::domain::repository::{
        AuthStore, RoleRepository, SessionRepository, UserRepository,
    };
}
