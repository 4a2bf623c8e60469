//! User provisioning

use gate_auth::PasswordHasher;
use gate_store::{CredentialStore, UserRecord};
use tracing::info;

use crate::error::CoreError;

/// Add a user to the credential store.
///
/// Duplicate usernames are rejected here, not at login time.
pub async fn provision_user(
    store: &dyn CredentialStore,
    hasher: &PasswordHasher,
    username: &str,
    password: &str,
) -> Result<(), CoreError> {
    if username.is_empty() {
        return Err(CoreError::InvalidInput("Username cannot be empty".to_string()));
    }
    if password.is_empty() {
        return Err(CoreError::InvalidInput("Password cannot be empty".to_string()));
    }

    if store.exists(username).await? {
        return Err(CoreError::DuplicateUser(username.to_string()));
    }

    let password_hash = hasher.hash(password).await?;
    store.append(UserRecord::new(username, password_hash)).await?;

    info!("Provisioned user {}", username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_auth::{AuthService, AuthServiceConfig, CookieConfig, SessionHandle};
    use gate_store::{FileCredentialStore, MemorySessionStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_provision_then_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCredentialStore::new(dir.path().join("users.txt")));
        let hasher = PasswordHasher::new(4);

        provision_user(store.as_ref(), &hasher, "alice", "wonderland")
            .await
            .unwrap();

        let auth = AuthService::new(
            store.clone(),
            Arc::new(MemorySessionStore::new()),
            hasher,
            AuthServiceConfig {
                session_secret: "test-session-secret-value".to_string(),
                session_ttl_hours: 24,
                cookie: CookieConfig::default(),
            },
        );
        let user = auth
            .login(&SessionHandle::anonymous(), "alice", "wonderland")
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_duplicate_user_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("users.txt"));
        let hasher = PasswordHasher::new(4);

        provision_user(&store, &hasher, "alice", "wonderland").await.unwrap();
        let result = provision_user(&store, &hasher, "alice", "other").await;

        assert!(matches!(result, Err(CoreError::DuplicateUser(name)) if name == "alice"));
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("users.txt"));
        let hasher = PasswordHasher::new(4);

        assert!(matches!(
            provision_user(&store, &hasher, "", "pw").await,
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            provision_user(&store, &hasher, "bob", "").await,
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            provision_user(&store, &hasher, "bo,b", "pw").await,
            Err(CoreError::Store(_))
        ));
    }
}
