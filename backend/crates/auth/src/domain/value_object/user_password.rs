//! User Password Value Object
//!
//! Domain wrapper over `platform::password`: turns policy violations into
//! user-facing `AppError`s and keeps the bcrypt details out of use cases.

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{ClearTextPassword, HashedPassword, PasswordHashError, PasswordPolicyError};
use std::fmt;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input, zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Password for a new account or a password change
    ///
    /// 4 to 72 bytes after NFKC normalization, not blank, no control characters.
    pub fn new(raw: String) -> AppResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| match e {
            PasswordPolicyError::TooShort { min, actual } => AppError::bad_request(format!(
                "Password must be at least {} characters (got {})",
                min, actual
            ))
            .with_action("Please choose a longer password"),

            PasswordPolicyError::TooLong { max, .. } => AppError::bad_request(format!(
                "Password must be at most {} bytes",
                max
            ))
            .with_action("Please choose a shorter password"),

            PasswordPolicyError::EmptyOrWhitespace => {
                AppError::bad_request("Password cannot be empty")
                    .with_action("Please enter a password")
            }

            PasswordPolicyError::InvalidCharacter => {
                AppError::bad_request("Password contains invalid characters")
                    .with_action("Please remove any special control characters")
            }
        })?;

        Ok(Self(clear_text))
    }

    /// Password presented at login; only has to be non-empty
    pub fn for_login(raw: String) -> AppResult<Self> {
        ClearTextPassword::for_verification(raw)
            .map(Self)
            .map_err(|_| AppError::bad_request("Password cannot be empty"))
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// bcrypt hash, safe to store
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a raw password at the given bcrypt cost
    pub async fn from_raw(raw: &RawPassword, cost: u32) -> AppResult<Self> {
        let hashed = raw.0.hash(cost).await.map_err(hash_error)?;
        Ok(Self(hashed))
    }

    /// Restore from the stored hash string
    pub fn from_hash_string(hash: impl Into<String>) -> AppResult<Self> {
        HashedPassword::from_hash_string(hash)
            .map(Self)
            .map_err(|_| AppError::internal("Invalid password hash in database"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check a raw password against this hash
    pub async fn verify(&self, raw: &RawPassword) -> AppResult<bool> {
        self.0.verify(&raw.0).await.map_err(hash_error)
    }
}

fn hash_error(err: PasswordHashError) -> AppError {
    AppError::internal("Password hashing failed").with_source(err)
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
