//! Domain error types.

/// Message shown when the provider gives no usable explanation.
pub const GENERIC_FETCH_MESSAGE: &str = "Failed to fetch data";

/// Substring the provider uses in its call-frequency notices.
const RATE_LIMIT_MARKER: &str = "call frequency";

/// Top-level error type for alphachart.
#[derive(Debug, thiserror::Error)]
pub enum AlphaChartError {
    /// Provider `Note` (usually a quota notice), passed through verbatim.
    #[error("{message}")]
    RateLimited { message: String },

    /// Provider `Error Message` (bad symbol, bad key, ...), passed through verbatim.
    #[error("{message}")]
    Provider { message: String },

    #[error("Failed to fetch data")]
    MalformedResponse { reason: String },

    #[error("Failed to fetch data: {reason}")]
    Network { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("credential store error: {reason}")]
    Credential { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AlphaChartError {
    /// Process exit status for the CLI.
    pub fn exit_status(&self) -> u8 {
        match self {
            AlphaChartError::Io(_) => 1,
            AlphaChartError::ConfigParse { .. }
            | AlphaChartError::ConfigMissing { .. }
            | AlphaChartError::ConfigInvalid { .. } => 2,
            AlphaChartError::Network { .. } | AlphaChartError::MalformedResponse { .. } => 3,
            AlphaChartError::RateLimited { .. } | AlphaChartError::Provider { .. } => 4,
            AlphaChartError::Credential { .. } => 5,
        }
    }
}

impl From<&AlphaChartError> for std::process::ExitCode {
    fn from(err: &AlphaChartError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

/// How an error banner should present a stored fetch error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    RateLimit,
    Provider,
    Generic,
}

impl ErrorClass {
    /// Classifies the message text kept as display state.
    pub fn of_message(message: &str) -> Self {
        if message.contains(RATE_LIMIT_MARKER) {
            ErrorClass::RateLimit
        } else if message.starts_with(GENERIC_FETCH_MESSAGE) {
            ErrorClass::Generic
        } else {
            ErrorClass::Provider
        }
    }

    /// Banner text for a stored error message. Transport detail after the
    /// generic message stays in the logs.
    pub fn banner_text(self, message: &str) -> String {
        match self {
            ErrorClass::RateLimit => {
                "Rate limit hit. Using demo key? Wait 1 min or use your own key.".to_string()
            }
            ErrorClass::Provider => message.to_string(),
            ErrorClass::Generic => GENERIC_FETCH_MESSAGE.to_string(),
        }
    }
}
