//! Login, logout and session resolution

use chrono::Duration;
use gate_store::{CredentialStore, SessionData, SessionStore};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cookies::CookieConfig;
use crate::error::AuthError;
use crate::password::PasswordHasher;
use crate::session::{CurrentUser, SessionHandle};
use crate::token::SessionTokenSigner;

/// Cost-10 bcrypt hash used when no dummy hash can be generated at the
/// configured cost
const FALLBACK_DUMMY_HASH: &str = "$2b$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

/// Auth service settings
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub cookie: CookieConfig,
}

/// Authenticates users against the credential store and manages sessions
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: PasswordHasher,
    /// Verified against when the username is unknown so that both failure
    /// paths cost the same. Generated at the hasher's cost.
    dummy_hash: String,
    signer: SessionTokenSigner,
    session_ttl: Duration,
    cookie: CookieConfig,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: PasswordHasher,
        config: AuthServiceConfig,
    ) -> Self {
        let dummy_hash = hasher.dummy_hash().unwrap_or_else(|e| {
            warn!("Falling back to a cost-10 dummy hash: {}", e);
            FALLBACK_DUMMY_HASH.to_string()
        });

        Self {
            credentials,
            sessions,
            hasher,
            dummy_hash,
            signer: SessionTokenSigner::new(&config.session_secret),
            // Out-of-range lifetimes are refused per login by SessionData
            session_ttl: Duration::try_hours(config.session_ttl_hours).unwrap_or(Duration::MAX),
            cookie: config.cookie,
        }
    }

    pub fn cookie_config(&self) -> &CookieConfig {
        &self.cookie
    }

    /// Check a username/password pair against the credential store.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let records = self.credentials.load().await?;

        // First match wins
        let record = records.into_iter().find(|r| r.username == username);

        let stored_hash = record
            .as_ref()
            .and_then(|r| r.password_hash.as_deref())
            .unwrap_or(&self.dummy_hash);
        let password_valid = self.hasher.verify(password, Some(stored_hash)).await;

        match record {
            Some(r) if r.password_hash.is_some() && password_valid => Ok(CurrentUser {
                username: r.username,
            }),
            _ => {
                debug!("Rejected login for user: {}", username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Authenticate and bind the user into a fresh session.
    ///
    /// The session cookie is only requested once the session has been
    /// persisted.
    pub async fn login(
        &self,
        session: &SessionHandle,
        username: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        let user = self.authenticate(username, password).await?;

        let session_id = Uuid::new_v4().to_string();
        let data = SessionData::for_user(user.username.clone(), self.session_ttl)?;
        let token = self.signer.sign(&session_id, data.expires_at)?;

        self.sessions
            .set(&session_id, data)
            .await
            .map_err(|e| AuthError::SessionPersistence(e.to_string()))?;

        // Rotate away any session the client arrived with
        if let Some(previous) = session.id()
            && let Err(e) = self.sessions.destroy(&previous).await
        {
            warn!("Failed to destroy previous session: {}", e);
        }

        session.establish(session_id, user.clone(), token);

        info!("User {} logged in", user.username);
        Ok(user)
    }

    /// Destroy the current session. Never fails.
    pub async fn logout(&self, session: &SessionHandle) {
        if let Some(id) = session.id() {
            if let Err(e) = self.sessions.destroy(&id).await {
                warn!("Failed to destroy session on logout: {}", e);
            }
            if let Some(user) = session.user() {
                info!("User {} logged out", user.username);
            }
        }

        session.clear();
    }

    /// Resolve a cookie token to a live, authenticated session
    pub async fn resolve(&self, token: &str) -> Option<(String, CurrentUser)> {
        let session_id = match self.signer.verify(token) {
            Ok(id) => id,
            Err(e) => {
                debug!("Ignoring session cookie: {}", e);
                return None;
            }
        };

        match self.sessions.get(&session_id).await {
            Ok(Some(data)) => data
                .user
                .map(|username| (session_id, CurrentUser { username })),
            Ok(None) => None,
            Err(e) => {
                warn!("Session lookup failed: {}", e);
                None
            }
        }
    }
}
