//! LLM Gate Core Business Logic
//!
//! This crate provides the request policy in front of the upstream
//! provider, user provisioning and background session maintenance.

pub mod completion;
pub mod error;
pub mod maintenance;
pub mod policy;
pub mod provision;

pub use completion::CompletionService;
pub use error::CoreError;
pub use maintenance::spawn_session_reaper;
pub use policy::CompletionPolicy;
pub use provision::provision_user;
