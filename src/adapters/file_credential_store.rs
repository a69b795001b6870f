//! API key persistence in a small INI file.
//!
//! ```ini
//! [credentials]
//! av_key = <API key>
//! ```

use configparser::ini::Ini;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::AlphaChartError;
use crate::ports::credential_port::CredentialStore;

const SECTION: &str = "credentials";
pub const KEY_NAME: &str = "av_key";

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>, AlphaChartError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut ini = Ini::new();
        ini.load(&self.path).map_err(|e| AlphaChartError::Credential {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        Ok(ini
            .get(SECTION, KEY_NAME)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()))
    }

    fn save(&self, api_key: &str) -> Result<(), AlphaChartError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AlphaChartError::Credential {
                reason: format!("failed to create {}: {}", parent.display(), e),
            })?;
        }

        let mut ini = Ini::new();
        ini.set(SECTION, KEY_NAME, Some(api_key.to_string()));
        ini.write(&self.path).map_err(|e| AlphaChartError::Credential {
            reason: format!("failed to write {}: {}", self.path.display(), e),
        })?;
        tracing::debug!(path = %self.path.display(), "saved API key");
        Ok(())
    }
}

/// Keeps the key for the lifetime of the process only.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    key: std::sync::Mutex<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn with_key(api_key: &str) -> Self {
        Self {
            key: std::sync::Mutex::new(Some(api_key.to_string())),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<Option<String>, AlphaChartError> {
        Ok(self
            .key
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, api_key: &str) -> Result<(), AlphaChartError> {
        *self
            .key
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(api_key.to_string());
        Ok(())
    }
}
