//! Server-side session storage

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use crate::error::StoreError;

/// Data held for a single session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    /// Authenticated username, if any
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    /// Create session data for an authenticated user.
    ///
    /// Fails when `ttl` is not positive or pushes the expiry out of range.
    pub fn for_user(user: impl Into<String>, ttl: Duration) -> Result<Self, StoreError> {
        if ttl <= Duration::zero() {
            return Err(StoreError::Session(format!(
                "Session lifetime must be positive, got {}",
                ttl
            )));
        }

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| StoreError::Session(format!("Session lifetime out of range: {}", ttl)))?;

        Ok(Self {
            user: Some(user.into()),
            created_at: now,
            expires_at,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Session store trait
///
/// Maps opaque session identifiers to session data. Concurrent writes to
/// the same identifier are last-writer-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a live session. Expired sessions are reported as absent.
    async fn get(&self, id: &str) -> Result<Option<SessionData>, StoreError>;

    /// Insert or replace a session
    async fn set(&self, id: &str, data: SessionData) -> Result<(), StoreError>;

    /// Destroy a session. Destroying an unknown id is not an error.
    async fn destroy(&self, id: &str) -> Result<(), StoreError>;

    /// Remove expired sessions, returning how many were removed
    async fn purge_expired(&self) -> Result<usize, StoreError>;
}

/// In-process session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &str) -> Result<Option<SessionData>, StoreError> {
        let data = self.sessions.read().get(id).cloned();

        match data {
            Some(data) if data.is_expired() => {
                debug!("Session {} expired", id);
                self.sessions.write().remove(id);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn set(&self, id: &str, data: SessionData) -> Result<(), StoreError> {
        self.sessions.write().insert(id.to_string(), data);
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), StoreError> {
        self.sessions.write().remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, data| !data.is_expired());
        Ok(before - sessions.len())
    }
}
