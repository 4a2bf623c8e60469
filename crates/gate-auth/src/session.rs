//! Per-request session handle

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AuthError;

/// Authenticated user bound to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
}

/// Cookie update requested by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieChange {
    /// Send a new session cookie with this token
    Issue(String),
    /// Tell the client to discard its session cookie
    Clear,
}

#[derive(Debug, Default)]
struct SessionSlot {
    id: Option<String>,
    user: Option<CurrentUser>,
    change: Option<CookieChange>,
}

/// Session state for the current request.
///
/// Inserted into request extensions by the session middleware. Handlers
/// mutate it through the auth service, and the middleware turns the
/// resulting [`CookieChange`] into a `Set-Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    slot: Arc<Mutex<SessionSlot>>,
}

impl SessionHandle {
    /// Handle for a request without a live session
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Handle for a request carrying a live session
    pub fn resumed(id: String, user: CurrentUser) -> Self {
        Self {
            slot: Arc::new(Mutex::new(SessionSlot {
                id: Some(id),
                user: Some(user),
                change: None,
            })),
        }
    }

    pub fn id(&self) -> Option<String> {
        self.slot.lock().id.clone()
    }

    pub fn user(&self) -> Option<CurrentUser> {
        self.slot.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.slot.lock().user.is_some()
    }

    /// Bind a newly persisted session and request a fresh cookie
    pub fn establish(&self, id: String, user: CurrentUser, token: String) {
        let mut slot = self.slot.lock();
        slot.id = Some(id);
        slot.user = Some(user);
        slot.change = Some(CookieChange::Issue(token));
    }

    /// Forget the session and request cookie removal
    pub fn clear(&self) {
        let mut slot = self.slot.lock();
        slot.id = None;
        slot.user = None;
        slot.change = Some(CookieChange::Clear);
    }

    /// Take the pending cookie update, if any
    pub fn take_cookie_change(&self) -> Option<CookieChange> {
        self.slot.lock().change.take()
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or(AuthError::MissingSession)
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .and_then(SessionHandle::user)
            .ok_or(AuthError::Unauthorized)
    }
}
