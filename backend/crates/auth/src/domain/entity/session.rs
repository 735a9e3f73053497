//! Session Entity
//!
//! One live refresh-token grant. A user may hold several (one per device);
//! each refresh token is bound to at most one session.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::value_object::{session_id::SessionId, user_id::UserId};

#[derive(Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// Current refresh token; replaced on every rotation
    pub refresh_token: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Time of the last rotation
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, refresh_token: String, user_agent: Option<String>) -> Self {
        let now = Utc::now();

        Self {
            session_id: SessionId::new(),
            user_id,
            refresh_token,
            user_agent,
            created_at: now,
            updated_at: now,
        }
    }

    /// Swap in a rotated token
    pub fn rotate(&mut self, refresh_token: String, user_agent: Option<String>) {
        self.refresh_token = refresh_token;
        if user_agent.is_some() {
            self.user_agent = user_agent;
        }
        self.updated_at = Utc::now();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("refresh_token", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
