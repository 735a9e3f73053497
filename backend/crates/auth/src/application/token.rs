//! Token Service
//!
//! Issues and verifies HS256 JWTs. Never touches storage.
//!
//! - Access tokens: `{ sub, name, roles, typ: "access" }`, short-lived, checked
//!   statelessly on every request.
//! - Refresh tokens: `{ sub, nonce, typ: "refresh" }`, long-lived. The random
//!   nonce makes every token unique even when issued twice in the same second
//!   for the same user, so each one can be bound to exactly one session.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use platform::crypto::random_token;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::value_object::{user_id::UserId, user_role::RoleSet};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Identity carried by an access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPayload {
    pub user_id: UserId,
    pub user_name: String,
    pub roles: RoleSet,
}

impl From<&User> for AccessPayload {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id,
            user_name: user.user_name.original().to_string(),
            roles: user.roles.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    name: String,
    roles: Vec<String>,
    typ: TokenType,
    iat: i64,
    exp: i64,
}

/// Verified refresh token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub nonce: String,
    pub typ: TokenType,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Claims of either token type, as read by [`TokenService::decode`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub typ: TokenType,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Access + refresh token handed back to the client
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct TokenService {
    config: Arc<AuthConfig>,
}

impl TokenService {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    pub fn issue_access_token(&self, payload: &AccessPayload) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: payload.user_id.to_string(),
            name: payload.user_name.clone(),
            roles: payload.roles.codes(),
            typ: TokenType::Access,
            iat: now,
            exp: now.saturating_add(self.config.access_token_ttl_secs()),
        };
        self.sign(&claims)
    }

    pub fn issue_refresh_token(&self, user_id: &UserId) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            nonce: random_token(self.config.nonce_len()),
            typ: TokenType::Refresh,
            iat: now,
            exp: now.saturating_add(self.config.refresh_token_ttl_secs()),
        };
        self.sign(&claims)
    }

    /// Fresh access + refresh pair for `user`
    pub fn issue_pair(&self, user: &User) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(&AccessPayload::from(user))?,
            refresh_token: self.issue_refresh_token(&user.user_id)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> AuthResult<AccessPayload> {
        let claims: AccessClaims = self.verify(token)?;
        if claims.typ != TokenType::Access {
            return Err(AuthError::InvalidToken);
        }

        Ok(AccessPayload {
            user_id: claims.sub.parse().map_err(|_| AuthError::InvalidToken)?,
            user_name: claims.name,
            roles: RoleSet::from_codes(&claims.roles).map_err(|_| AuthError::InvalidToken)?,
        })
    }

    pub fn verify_refresh(&self, token: &str) -> AuthResult<RefreshClaims> {
        let claims: RefreshClaims = self.verify(token)?;
        if claims.typ != TokenType::Refresh {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Read claims WITHOUT checking signature or expiry
    ///
    /// For diagnostics only. The result must never drive an authorization
    /// decision; request paths use `verify_access` / `verify_refresh`.
    pub fn decode(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> AuthResult<String> {
        if self.config.jwt_secret.is_empty() {
            return Err(AuthError::Signing("signing secret is not configured".to_string()));
        }

        let key = EncodingKey::from_secret(&self.config.jwt_secret);
        encode(&Header::new(Algorithm::HS256), claims, &key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn verify<T: serde::de::DeserializeOwned>(&self, token: &str) -> AuthResult<T> {
        if self.config.jwt_secret.is_empty() {
            return Err(AuthError::Signing("signing secret is not configured".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = false;

        let key = DecodingKey::from_secret(&self.config.jwt_secret);
        Ok(decode::<T>(token, &key, &validation)?.claims)
    }
}
