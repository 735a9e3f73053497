//! Shared Kernel
//!
//! Vocabulary every backend crate agrees on:
//! - `error` - the HTTP-classified [`error::app_error::AppError`] and its kinds
//! - `id` - typed UUID wrappers so a user id can never be passed as a session id
//!
//! Nothing domain-specific lives here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
