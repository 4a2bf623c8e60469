//! LLM Gate Authentication
//!
//! This crate provides password hashing, signed session cookies, the
//! login/logout service and the Axum session middleware.

pub mod cookies;
pub mod error;
pub mod middleware;
pub mod password;
pub mod service;
pub mod session;
pub mod token;

pub use cookies::{CookieConfig, SameSitePolicy};
pub use error::AuthError;
pub use middleware::{require_authenticated, session_middleware};
pub use password::{DEFAULT_COST, MAX_COST, MIN_COST, PasswordHasher};
pub use service::{AuthService, AuthServiceConfig};
pub use session::{CookieChange, CurrentUser, SessionHandle};
pub use token::{SessionClaims, SessionTokenSigner};
