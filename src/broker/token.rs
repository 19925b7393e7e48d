//! Single-slot API credential store.
//!
//! The broker issues one token at a time; a new issuance invalidates
//! the previous one, so the store holds exactly one value and saving
//! replaces whatever was there. The file implementation keeps the token
//! in a single file inside a dedicated directory and clears any stale
//! entries on save.

use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

/// File name the credential is kept under.
const CREDENTIAL_FILE: &str = "credential";

/// One-value credential store. Any backing that satisfies
/// "save replaces the prior value" is conformant.
pub trait CredentialStore: Send + Sync {
    fn save(&self, token: &str) -> io::Result<()>;
    fn load(&self) -> io::Result<Option<String>>;
}

/// Directory-backed store: `{dir}/credential` holds the token.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn credential_path(&self) -> PathBuf {
        self.dir.join(CREDENTIAL_FILE)
    }
}

impl CredentialStore for FileTokenStore {
    fn save(&self, token: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Drop stale entries so the directory never holds two tokens.
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path)?;
            }
        }

        let tmp = self.dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&tmp, token)?;
        fs::rename(&tmp, self.credential_path())?;

        info!(dir = %self.dir.display(), "API credential stored");
        Ok(())
    }

    fn load(&self) -> io::Result<Option<String>> {
        let path = self.credential_path();
        if !path.exists() {
            debug!(dir = %self.dir.display(), "No stored credential");
            return Ok(None);
        }
        let token = fs::read_to_string(&path)?;
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
