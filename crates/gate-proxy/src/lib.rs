//! LLM Gate Upstream Proxy
//!
//! This crate provides the client for the upstream LLM provider's
//! chat-completion and image-generation endpoints.

pub mod client;
pub mod error;
pub mod provider;
pub mod types;

pub use client::{OpenAiClient, OpenAiClientConfig};
pub use error::ProxyError;
pub use provider::LlmProvider;
pub use types::{
    ChatCompletionRequest, ChatMessage, ImageData, ImageGenerationRequest,
    ImageGenerationResponse,
};
