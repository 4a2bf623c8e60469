//! OpenAI-compatible upstream client

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ProxyError;
use crate::provider::LlmProvider;
use crate::types::{ChatCompletionRequest, ImageGenerationRequest, ImageGenerationResponse};

/// Upper bound on how much of an upstream error body is kept for logs
const MAX_ERROR_BODY_LEN: usize = 512;

/// Upstream client configuration
#[derive(Clone)]
pub struct OpenAiClientConfig {
    /// Base URL of the provider API, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Provider API key. Never logged.
    pub api_key: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// HTTP client for an OpenAI-compatible provider
pub struct OpenAiClient {
    config: OpenAiClientConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new upstream client
    pub fn new(config: OpenAiClientConfig) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Created upstream client for {}", config.base_url);

        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn post_json<T: Serialize>(&self, path: &str, body: &T) -> RequestBuilder {
        self.client
            .post(self.endpoint(path))
            .bearer_auth(&self.config.api_key)
            .json(body)
    }

    /// Send a request and fail on any non-2xx status
    async fn send(&self, request: RequestBuilder) -> Result<Response, ProxyError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY_LEN {
                let mut cut = MAX_ERROR_BODY_LEN;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            warn!("Upstream returned status {}", status.as_u16());
            return Err(ProxyError::UpstreamError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

fn map_transport_error(e: reqwest::Error) -> ProxyError {
    if e.is_timeout() {
        ProxyError::Timeout
    } else {
        ProxyError::Http(e.without_url())
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<Bytes, ProxyError> {
        debug!(
            "Forwarding chat completion: model={}, messages={}, max_tokens={}",
            request.model,
            request.messages.len(),
            request.max_tokens
        );

        let response = self.send(self.post_json("chat/completions", request)).await?;
        response.bytes().await.map_err(map_transport_error)
    }

    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, ProxyError> {
        debug!(
            "Forwarding image generation: model={}, size={}",
            request.model, request.size
        );

        let response = self.send(self.post_json("images/generations", request)).await?;
        let body = response.bytes().await.map_err(map_transport_error)?;

        serde_json::from_slice(&body)
            .map_err(|e| ProxyError::InvalidResponse(format!("Image response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    fn client_for(server: &mockito::ServerGuard, timeout_secs: u64) -> OpenAiClient {
        OpenAiClient::new(OpenAiClientConfig {
            base_url: server.url(),
            api_key: "sk-test".to_string(),
            timeout_secs,
        })
        .unwrap()
    }

    fn chat_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("hello")],
            max_tokens: 400,
        }
    }

    #[tokio::test]
    async fn test_chat_completion_forwards_body_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let upstream_body = r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::Json(json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hello"}],
                "max_tokens": 400
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(upstream_body)
            .create_async()
            .await;

        let body = client_for(&server, 5)
            .chat_completion(&chat_request())
            .await
            .unwrap();

        assert_eq!(body.as_ref(), upstream_body.as_bytes());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_completion_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let result = client_for(&server, 5).chat_completion(&chat_request()).await;

        match result {
            Err(ProxyError::UpstreamError { status, .. }) => assert_eq!(status, 401),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_image_parses_first_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/images/generations")
            .match_body(Matcher::PartialJson(json!({
                "prompt": "a lighthouse",
                "n": 1,
                "size": "1024x1024"
            })))
            .with_status(200)
            .with_body(r#"{"created":1,"data":[{"url":"https://img.example/1.png"},{"url":"https://img.example/2.png"}]}"#)
            .create_async()
            .await;

        let response = client_for(&server, 5)
            .generate_image(&ImageGenerationRequest {
                model: "dall-e-3".to_string(),
                prompt: "a lighthouse".to_string(),
                n: 1,
                size: "1024x1024".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.first_url(), Some("https://img.example/1.png"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_image_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/images/generations")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let result = client_for(&server, 5)
            .generate_image(&ImageGenerationRequest {
                model: "dall-e-3".to_string(),
                prompt: "x".to_string(),
                n: 1,
                size: "1024x1024".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ProxyError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(b"{}")
            })
            .create_async()
            .await;

        let result = client_for(&server, 1).chat_completion(&chat_request()).await;

        assert!(matches!(result, Err(ProxyError::Timeout)), "{:?}", result);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_hides_url() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = OpenAiClient::new(OpenAiClientConfig {
            base_url: format!("http://127.0.0.1:{}/v1", port),
            api_key: "sk-test".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        let err = client.chat_completion(&chat_request()).await.unwrap_err();

        let ProxyError::Http(ref inner) = err else {
            panic!("unexpected error: {:?}", err);
        };
        assert!(inner.url().is_none());
        let rendered = err.to_string();
        assert!(!rendered.contains(&port.to_string()), "{}", rendered);
        assert!(!rendered.contains("sk-test"));
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = OpenAiClientConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: "sk-secret".to_string(),
            timeout_secs: 60,
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
    }
}
