//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - CSPRNG bytes and Base64 helpers
//! - Password hashing (bcrypt) with zeroized clear text
//! - Request header helpers (User-Agent, Bearer token)

pub mod client;
pub mod crypto;
pub mod password;
