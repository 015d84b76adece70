//! Client-side credential storage.
//!
//! Two keys, kept in sync: a structured `auth` record carrying the token
//! (plus the logged-in user), and a bare `token` duplicate kept for
//! compatibility with older consumers. Clearing removes both.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured `auth` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRecord {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario: Option<Value>,
}

/// Persistent credential storage.
pub trait CredentialStore: Send + Sync {
    /// The structured record, or `None` when absent. A corrupt record is an
    /// error, not `None`: callers decide the fail-safe behavior.
    fn load_record(&self) -> io::Result<Option<AuthRecord>>;

    /// The bare compatibility token.
    fn bare_token(&self) -> io::Result<Option<String>>;

    /// Write both keys.
    fn save(&self, record: &AuthRecord) -> io::Result<()>;

    /// Remove both keys. Absent keys are not an error.
    fn clear(&self) -> io::Result<()>;
}

const AUTH_FILE: &str = "auth.json";
const TOKEN_FILE: &str = "token";

/// File-backed [`CredentialStore`]: one directory, one file per key.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn read_optional(&self, file: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.dir.join(file)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn remove_optional(&self, file: &str) -> io::Result<()> {
        match std::fs::remove_file(self.dir.join(file)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load_record(&self) -> io::Result<Option<AuthRecord>> {
        match self.read_optional(AUTH_FILE)? {
            Some(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            None => Ok(None),
        }
    }

    fn bare_token(&self) -> io::Result<Option<String>> {
        Ok(self
            .read_optional(TOKEN_FILE)?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    fn save(&self, record: &AuthRecord) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(self.dir.join(AUTH_FILE), contents)?;
        std::fs::write(self.dir.join(TOKEN_FILE), &record.token)
    }

    fn clear(&self) -> io::Result<()> {
        self.remove_optional(AUTH_FILE)?;
        self.remove_optional(TOKEN_FILE)
    }
}
