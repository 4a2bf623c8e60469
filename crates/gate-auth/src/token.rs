//! Signed session tokens
//!
//! The session cookie carries a JWT whose only payload is the opaque
//! session identifier and its expiry. Usernames never leave the server.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// Session token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Session identifier
    pub sid: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Signs and validates session tokens with a shared secret
#[derive(Clone)]
pub struct SessionTokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionTokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign a token for a session that lives until `expires_at`
    pub fn sign(&self, session_id: &str, expires_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = SessionClaims {
            sid: session_id.to_string(),
            exp: expires_at.timestamp(),
            iat: Utc::now().timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate a token and return the session identifier
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    debug!("Rejected session token: {}", e);
                    AuthError::InvalidToken
                }
            })?;

        Ok(token_data.claims.sid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_sign_and_verify() {
        let signer = SessionTokenSigner::new("test-session-secret");
        let token = signer
            .sign("sid-123", Utc::now() + Duration::hours(24))
            .unwrap();

        assert_eq!(signer.verify(&token).unwrap(), "sid-123");
    }

    #[test]
    fn test_token_does_not_contain_username_claims() {
        let signer = SessionTokenSigner::new("test-session-secret");
        let token = signer.sign("sid-123", Utc::now() + Duration::hours(1)).unwrap();
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        let claims = decode::<serde_json::Value>(&token, &DecodingKey::from_secret(b""), &validation)
            .unwrap()
            .claims;

        let keys: Vec<&String> = claims.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(claims.get("sid").is_some());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = SessionTokenSigner::new("secret-a");
        let other = SessionTokenSigner::new("secret-b");
        let token = signer.sign("sid", Utc::now() + Duration::hours(1)).unwrap();

        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(signer.verify("garbage"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let signer = SessionTokenSigner::new("test-session-secret");
        let token = signer.sign("sid", Utc::now() - Duration::hours(1)).unwrap();

        assert!(matches!(signer.verify(&token), Err(AuthError::TokenExpired)));
    }
}
