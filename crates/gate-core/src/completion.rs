//! Chat completion and image generation service
//!
//! Validates client input and the shared secret, shapes the upstream
//! request from the configured policy, and hands it to the provider.
//! Input is always validated before any upstream call is made.

use bytes::Bytes;
use gate_proxy::{ChatCompletionRequest, ChatMessage, ImageGenerationRequest, LlmProvider};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::policy::CompletionPolicy;

/// Which chat route variant a request arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatVariant {
    Prompt,
    Messages,
}

/// Forwards validated requests to the upstream provider
pub struct CompletionService {
    provider: Arc<dyn LlmProvider>,
    policy: CompletionPolicy,
}

impl CompletionService {
    pub fn new(provider: Arc<dyn LlmProvider>, policy: CompletionPolicy) -> Self {
        Self { provider, policy }
    }

    fn check_secret(&self, variant: ChatVariant, provided: Option<&str>) -> Result<(), CoreError> {
        let required = match variant {
            ChatVariant::Prompt => self.policy.require_secret_on_get,
            ChatVariant::Messages => self.policy.require_secret_on_post,
        };
        if !required {
            return Ok(());
        }

        match (self.policy.shared_secret.as_deref(), provided) {
            (Some(expected), Some(provided))
                if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) =>
            {
                Ok(())
            }
            _ => {
                debug!("Shared secret mismatch on {:?} chat request", variant);
                Err(CoreError::InvalidSecret)
            }
        }
    }

    async fn forward_chat(&self, messages: Vec<ChatMessage>) -> Result<Bytes, CoreError> {
        let request = ChatCompletionRequest {
            model: self.policy.chat_model.clone(),
            messages,
            max_tokens: self.policy.max_tokens,
        };

        self.provider.chat_completion(&request).await.map_err(|e| {
            warn!("Chat completion failed: {}", e);
            CoreError::Upstream(e)
        })
    }

    /// Chat completion from a single free-text prompt
    pub async fn chat_from_prompt(
        &self,
        prompt: Option<&str>,
        secret: Option<&str>,
    ) -> Result<Bytes, CoreError> {
        self.check_secret(ChatVariant::Prompt, secret)?;

        let prompt = non_blank(prompt)
            .ok_or_else(|| CoreError::InvalidInput("Missing request parameter".to_string()))?;

        self.forward_chat(vec![ChatMessage::user(prompt)]).await
    }

    /// Chat completion from a pre-built conversation
    pub async fn chat_from_messages(
        &self,
        messages: Option<Vec<ChatMessage>>,
        secret: Option<&str>,
    ) -> Result<Bytes, CoreError> {
        self.check_secret(ChatVariant::Messages, secret)?;

        let messages = messages
            .filter(|messages| !messages.is_empty())
            .ok_or_else(|| CoreError::InvalidInput("Missing messages".to_string()))?;

        if messages.iter().any(|message| message.role.trim().is_empty()) {
            return Err(CoreError::InvalidInput(
                "Every message needs a role".to_string(),
            ));
        }

        self.forward_chat(messages).await
    }

    /// Generate a single image and return its URL
    pub async fn generate_image(&self, prompt: Option<&str>) -> Result<String, CoreError> {
        let prompt =
            non_blank(prompt).ok_or_else(|| CoreError::InvalidInput("Missing prompt".to_string()))?;

        let request = ImageGenerationRequest {
            model: self.policy.image_model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.policy.image_size.clone(),
        };

        let response = self.provider.generate_image(&request).await.map_err(|e| {
            warn!("Image generation failed: {}", e);
            CoreError::Upstream(e)
        })?;

        response
            .first_url()
            .map(str::to_string)
            .ok_or(CoreError::MissingImage)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
