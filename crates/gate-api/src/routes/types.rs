//! Request and response bodies

use gate_proxy::ChatMessage;
use serde::{Deserialize, Serialize};

// ==================== Auth ====================

/// Login request. Fields are optional so that missing ones map to 400.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub username: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ==================== Chat ====================

/// Query string of `GET /chat-completion`
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub request: Option<String>,
    pub secret: Option<String>,
}

/// Body of `POST /chat-completion`
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub messages: Option<Vec<ChatMessage>>,
    pub secret: Option<String>,
}

// ==================== Image ====================

/// Body of `POST /generate-image`
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: Option<String>,
}

/// Image generation result
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image_url: String,
}
