//! Upstream provider trait

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ProxyError;
use crate::types::{ChatCompletionRequest, ImageGenerationRequest, ImageGenerationResponse};

/// An LLM provider the gateway forwards requests to
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run a chat completion and return the raw JSON response body
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<Bytes, ProxyError>;

    /// Generate images for a prompt
    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, ProxyError>;
}
