//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod profile;
pub mod refresh;
pub mod sessions;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod token;

// Re-exports
pub use config::AuthConfig;
pub use profile::{ProfileUpdateInput, ProfileUseCase};
pub use refresh::{RefreshInput, RefreshUseCase};
pub use sessions::SessionsUseCase;
pub use sign_in::{SignInInput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use token::{AccessPayload, TokenPair, TokenService};
