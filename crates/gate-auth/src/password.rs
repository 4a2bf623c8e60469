//! Password hashing with bcrypt
//!
//! bcrypt keeps the gateway compatible with credential files produced by
//! existing provisioning tooling. Hashing and verification run on the
//! blocking pool so they never stall the async runtime.

use tracing::warn;

use crate::error::AuthError;

/// Work factor used when none is configured
pub const DEFAULT_COST: u32 = 10;

/// Work factors bcrypt accepts
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Salted one-way password hasher
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash of a throwaway value at this hasher's cost, for timing
    /// equalisation when no stored hash exists
    pub fn dummy_hash(&self) -> Result<String, AuthError> {
        bcrypt::hash(uuid::Uuid::new_v4().to_string(), self.cost)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Hash a plaintext password
    pub async fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let cost = self.cost;
        let plaintext = plaintext.to_owned();

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// Returns `false` for a missing or malformed hash instead of failing.
    pub async fn verify(&self, plaintext: &str, hash: Option<&str>) -> bool {
        let Some(hash) = hash else {
            return false;
        };

        let plaintext = plaintext.to_owned();
        let hash = hash.to_owned();

        match tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hash)).await {
            Ok(Ok(valid)) => valid,
            Ok(Err(e)) => {
                warn!("Stored password hash could not be checked: {}", e);
                false
            }
            Err(e) => {
                warn!("Password verification task failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("wonderland").await.unwrap();

        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("wonderland", Some(&hash)).await);
        assert!(!hasher.verify("looking-glass", Some(&hash)).await);
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new(4);
        let first = hasher.hash("same").await.unwrap();
        let second = hasher.hash("same").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_verify_missing_or_malformed_hash() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("anything", None).await);
        assert!(!hasher.verify("anything", Some("not-a-hash")).await);
        assert!(!hasher.verify("anything", Some("")).await);
    }

    #[test]
    fn test_dummy_hash_matches_cost() {
        let hash = PasswordHasher::new(5).dummy_hash().unwrap();
        assert!(hash.starts_with("$2b$05$"));

        assert!(PasswordHasher::new(99).dummy_hash().is_err());
    }
}
