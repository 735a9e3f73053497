//! Password Hashing and Verification
//!
//! - bcrypt hashing (salted, tunable cost)
//! - Zeroization of clear text on drop
//! - Constant-time verification (delegated to bcrypt)
//! - Unicode NFKC normalization, so visually identical input hashes identically
//!
//! bcrypt is CPU-bound; both hashing and verification run on tokio's blocking
//! pool so they never stall the async workers.

use std::fmt;

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 4;

/// Maximum password length in bytes (bcrypt ignores everything past 72)
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Default bcrypt cost factor
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Password policy violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} bytes (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Hashing/verification failures
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Password hashing task failed: {0}")]
    TaskFailed(String),
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password, erased from memory when dropped
///
/// Not `Clone`; `Debug` is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Normalize and validate a new password against the policy
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized = Self::normalize(raw);

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_BYTES,
                actual: normalized.len(),
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != ' ' && ch != '\t')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        Ok(Self(normalized))
    }

    /// Normalize a password that is only going to be checked against a hash
    ///
    /// Policy is not applied: a password accepted under an older policy must
    /// keep working.
    pub fn for_verification(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized = Self::normalize(raw);
        if normalized.is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }
        Ok(Self(normalized))
    }

    fn normalize(raw: String) -> String {
        let mut raw = Zeroizing::new(raw);
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        normalized
    }

    fn secret_copy(&self) -> Zeroizing<String> {
        Zeroizing::new(self.0.clone())
    }

    /// Hash with bcrypt at the given cost
    pub async fn hash(&self, cost: u32) -> Result<HashedPassword, PasswordHashError> {
        let password = self.secret_copy();

        let hash = tokio::task::spawn_blocking(move || {
            bcrypt::hash(password.as_bytes(), cost)
                .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))
        })
        .await
        .map_err(|e| PasswordHashError::TaskFailed(e.to_string()))??;

        Ok(HashedPassword { hash })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// bcrypt hash in modular crypt format (`$2b$10$...`)
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Wrap a stored hash, checking it at least looks like bcrypt
    pub fn from_hash_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        let looks_like_bcrypt = hash.len() == 60
            && (hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$"));

        if !looks_like_bcrypt {
            return Err(PasswordHashError::InvalidHashFormat);
        }

        Ok(Self { hash })
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash (constant-time inside bcrypt)
    pub async fn verify(&self, password: &ClearTextPassword) -> Result<bool, PasswordHashError> {
        let password = password.secret_copy();
        let hash = self.hash.clone();

        tokio::task::spawn_blocking(move || {
            bcrypt::verify(password.as_bytes(), &hash)
                .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))
        })
        .await
        .map_err(|e| PasswordHashError::TaskFailed(e.to_string()))?
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
