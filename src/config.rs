use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Venue API credentials as read from the credentials file. The secret
/// never appears in Debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    #[serde(default)]
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Console harness configuration, loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// `host:port` of the venue's FIX endpoint.
    pub endpoint: String,
    pub sender_comp_id: String,
    pub target_comp_id: String,
    /// `deribit`, `coinbase`, or `ftx`; omit for an unsigned logon.
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub begin_string: Option<String>,
    #[serde(default)]
    pub heartbeat_secs: Option<u64>,
    pub credentials: Credentials,
}

impl ConsoleConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|err| ConfigError::Invalid(format!("read {:?}: {err}", path.as_ref())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|err| {
            let msg = err.to_string();
            match msg.strip_prefix("unknown field ") {
                Some(rest) => ConfigError::UnknownField(
                    rest.split(',').next().unwrap_or(rest).trim_matches('`').to_string(),
                ),
                None => ConfigError::Invalid(msg),
            }
        })
    }
}
