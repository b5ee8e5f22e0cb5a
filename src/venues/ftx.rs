//! FTX FIX logon signing: hex HMAC-SHA256 of `{timestamp_ms}A` in
//! RawData, API key in Username.

use crate::config::Credentials;
use crate::error::ConfigError;
use crate::field::{tags, Field, FieldDef, FieldRegistryBuilder, FieldValue};
use crate::types::UtcTimestamp;
use crate::venues::{hmac_sha256, to_hex};

/// FTX's custom session tags.
pub fn register_fields(builder: &mut FieldRegistryBuilder) -> Result<(), ConfigError> {
    builder.register(FieldDef::str_field(8013, "CancelOrdersOnDisconnect"))
}

pub fn logon_fields(creds: &Credentials, now: UtcTimestamp) -> Result<Vec<Field>, ConfigError> {
    let timestamp = now.to_datetime().timestamp_millis();
    let payload = format!("{timestamp}A");
    let signature = to_hex(&hmac_sha256(creds.api_secret.as_bytes(), payload.as_bytes())?);

    Ok(vec![
        Field::new(tags::USERNAME, FieldValue::Str(creds.api_key.clone())),
        Field::new(tags::RAW_DATA_LENGTH, FieldValue::Int(signature.len() as i64)),
        Field::new(tags::RAW_DATA, FieldValue::Str(signature)),
    ])
}
