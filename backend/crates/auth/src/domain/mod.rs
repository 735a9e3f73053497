//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the authorization policy.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    session::Session,
    user::{User, UserPatch},
};
pub use repository::{AuthStore, RoleRepository, SessionRepository, UserRepository};
