//! Application Configuration
//!
//! Configuration for the Auth application layer. Built once at startup and
//! shared behind an `Arc`.

use std::fmt;
use std::time::Duration;

use platform::crypto::random_bytes;
use platform::password::DEFAULT_BCRYPT_COST;

/// Smallest refresh-token nonce accepted, in bytes
pub const MIN_REFRESH_NONCE_LEN: usize = 8;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 key for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime (1 day)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (30 days)
    pub refresh_token_ttl: Duration,
    /// Random bytes embedded in each refresh token
    pub refresh_nonce_len: usize,
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    /// Empty secret: token issuance fails until one is set
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            access_token_ttl: Duration::from_secs(24 * 3600), // 1 day
            refresh_token_ttl: Duration::from_secs(30 * 24 * 3600), // 30 days
            refresh_nonce_len: 10,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl AuthConfig {
    pub fn with_secret(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: secret.into(),
            ..Default::default()
        }
    }

    /// Random 32-byte secret; tokens do not survive a restart
    pub fn with_random_secret() -> Self {
        Self::with_secret(random_bytes(32))
    }

    /// Config for local development
    pub fn development() -> Self {
        Self::with_random_secret()
    }

    /// Configured nonce length, never below the minimum
    pub fn nonce_len(&self) -> usize {
        self.refresh_nonce_len.max(MIN_REFRESH_NONCE_LEN)
    }

    /// Saturates at `i64::MAX`
    pub fn access_token_ttl_secs(&self) -> i64 {
        i64::try_from(self.access_token_ttl.as_secs()).unwrap_or(i64::MAX)
    }

    /// Saturates at `i64::MAX`
    pub fn refresh_token_ttl_secs(&self) -> i64 {
        i64::try_from(self.refresh_token_ttl.as_secs()).unwrap_or(i64::MAX)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &format!("[{} bytes]", self.jwt_secret.len()))
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("refresh_nonce_len", &self.refresh_nonce_len)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}
