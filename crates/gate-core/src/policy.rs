//! Request policy applied before forwarding upstream

/// How chat and image requests are shaped and guarded
#[derive(Clone)]
pub struct CompletionPolicy {
    /// Model used for chat completions
    pub chat_model: String,
    /// Response-length cap sent with every chat completion
    pub max_tokens: u32,
    /// Model used for image generation
    pub image_model: String,
    /// Resolution requested for generated images
    pub image_size: String,
    /// Static secret required on top of the session for guarded routes
    pub shared_secret: Option<String>,
    /// Whether `GET /chat-completion` requires the shared secret
    pub require_secret_on_get: bool,
    /// Whether `POST /chat-completion` requires the shared secret
    pub require_secret_on_post: bool,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o-mini".to_string(),
            max_tokens: 400,
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            shared_secret: None,
            require_secret_on_get: false,
            require_secret_on_post: true,
        }
    }
}

impl std::fmt::Debug for CompletionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionPolicy")
            .field("chat_model", &self.chat_model)
            .field("max_tokens", &self.max_tokens)
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .field("require_secret_on_get", &self.require_secret_on_get)
            .field("require_secret_on_post", &self.require_secret_on_post)
            .finish()
    }
}
