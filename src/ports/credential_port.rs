//! Persisted API key port trait.

use crate::domain::error::AlphaChartError;

/// Remembers the user's API key across sessions.
///
/// Loaded once at startup; saved whenever the key changes.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, AlphaChartError>;
    fn save(&self, api_key: &str) -> Result<(), AlphaChartError>;
}
