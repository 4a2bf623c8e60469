//! LLM Gate Persistence
//!
//! This crate provides the flat-file credential store and the
//! server-side session store used by the gateway.

pub mod credentials;
pub mod error;
pub mod sessions;

pub use credentials::{CredentialStore, FileCredentialStore, UserRecord};
pub use error::StoreError;
pub use sessions::{MemorySessionStore, SessionData, SessionStore};
