//! Flat-file credential store
//!
//! Records are stored one per line as `username,passwordHash` with no
//! header. The file is re-read on every call; there is no cache and no
//! locking, so concurrent writers are not supported.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::StoreError;

/// A single user entry in the credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    /// `None` when the stored line had no hash field
    pub password_hash: Option<String>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: Some(password_hash.into()),
        }
    }
}

/// Credential store trait
///
/// Implementations map usernames to password hashes. The auth service only
/// depends on this trait so that a transactional store can replace the
/// flat file without touching login logic.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load every record, in file order
    async fn load(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Append a new record
    async fn append(&self, record: UserRecord) -> Result<(), StoreError>;

    /// Check whether a username is already present
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .load()
            .await?
            .iter()
            .any(|record| record.username == username))
    }
}

/// Credential store backed by a newline-delimited text file
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse the store file contents into records
pub fn parse_records(content: &str) -> Vec<UserRecord> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(',') {
            Some((username, hash)) => UserRecord {
                username: username.to_string(),
                password_hash: Some(hash.to_string()),
            },
            None => {
                warn!("Credential line without a hash field for user: {}", line);
                UserRecord {
                    username: line.to_string(),
                    password_hash: None,
                }
            }
        })
        .collect()
}

/// Validate that a record can be written as a single line
fn validate_record(record: &UserRecord) -> Result<&str, StoreError> {
    let username = record.username.as_str();
    if username.is_empty() {
        return Err(StoreError::InvalidRecord("Username cannot be empty".to_string()));
    }
    if username.contains([',', '\n', '\r']) {
        return Err(StoreError::InvalidRecord(format!(
            "Username contains a reserved character: {:?}",
            username
        )));
    }

    match record.password_hash.as_deref() {
        Some(hash) if !hash.is_empty() && !hash.contains(['\n', '\r']) => Ok(hash),
        _ => Err(StoreError::InvalidRecord(format!(
            "Missing or malformed password hash for user: {}",
            username
        ))),
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Vec<UserRecord>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Credential store {:?} not found, no users yet", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let records = parse_records(&content);
        debug!("Loaded {} credential records from {:?}", records.len(), self.path);
        Ok(records)
    }

    async fn append(&self, record: UserRecord) -> Result<(), StoreError> {
        let hash = validate_record(&record)?;

        // Older files may lack a trailing newline
        let needs_separator = match fs::read(&self.path).await {
            Ok(existing) => !existing.is_empty() && !existing.ends_with(b"\n"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(StoreError::Io(e)),
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut line = String::new();
        if needs_separator {
            line.push('\n');
        }
        line.push_str(&record.username);
        line.push(',');
        line.push_str(hash);
        line.push('\n');

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("Appended credential record for {}", record.username);
        Ok(())
    }
}
