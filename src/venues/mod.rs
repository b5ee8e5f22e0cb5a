//! Venue adapters: pre-cooked logon field lists and venue-specific logon
//! signing. These are consumers of the core; nothing in the codec or the
//! session engine knows they exist.

pub mod coinbase;
pub mod deribit;
pub mod ftx;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::Credentials;
use crate::error::ConfigError;
use crate::field::{Field, FieldRegistryBuilder};
use crate::types::UtcTimestamp;

/// Venues the console harness knows how to sign logons for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Deribit,
    Coinbase,
    Ftx,
}

impl Venue {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "deribit" => Ok(Venue::Deribit),
            "coinbase" | "coinbasepro" | "coinbase-pro" => Ok(Venue::Coinbase),
            "ftx" => Ok(Venue::Ftx),
            other => Err(ConfigError::Invalid(format!("unknown venue {other:?}"))),
        }
    }

    /// Extra Logon body fields for this venue, signed with the supplied
    /// credentials.
    pub fn logon_fields(
        &self,
        creds: &Credentials,
        now: UtcTimestamp,
        sender_comp_id: &str,
        target_comp_id: &str,
    ) -> Result<Vec<Field>, ConfigError> {
        match self {
            Venue::Deribit => deribit::logon_fields(creds, now),
            Venue::Coinbase => coinbase::logon_fields(creds, now, sender_comp_id, target_comp_id),
            Venue::Ftx => ftx::logon_fields(creds, now),
        }
    }

    /// Registers the venue's custom tags on top of the base dictionary.
    /// Must run before the registry is sealed.
    pub fn register_fields(&self, builder: &mut FieldRegistryBuilder) -> Result<(), ConfigError> {
        match self {
            Venue::Deribit => deribit::register_fields(builder),
            Venue::Coinbase => coinbase::register_fields(builder),
            Venue::Ftx => ftx::register_fields(builder),
        }
    }
}

pub(crate) fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, ConfigError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|_| ConfigError::Invalid("HMAC key rejected".to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
