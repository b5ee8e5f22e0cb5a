//! Deribit FIX logon signing: `RawData = timestamp.nonce`, `Password =
//! base64(SHA256(RawData ++ access_secret))`.

use base64::prelude::*;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Credentials;
use crate::error::ConfigError;
use crate::field::{tags, Field, FieldDef, FieldRegistryBuilder, FieldValue};
use crate::types::UtcTimestamp;

/// Deribit's custom session tags.
pub fn register_fields(builder: &mut FieldRegistryBuilder) -> Result<(), ConfigError> {
    builder.register(FieldDef::bool_field(9001, "CancelOnDisconnect"))?;
    builder.register(FieldDef::str_field(100010, "DeribitLabel"))?;
    Ok(())
}

pub fn logon_fields(creds: &Credentials, now: UtcTimestamp) -> Result<Vec<Field>, ConfigError> {
    let timestamp = now.to_datetime().timestamp_millis();
    let nonce = BASE64_STANDARD.encode(Uuid::new_v4().as_bytes());
    let raw_data = format!("{timestamp}.{nonce}");

    let mut hasher = Sha256::new();
    hasher.update(raw_data.as_bytes());
    hasher.update(creds.api_secret.as_bytes());
    let password = BASE64_STANDARD.encode(hasher.finalize());

    Ok(vec![
        Field::new(tags::RAW_DATA_LENGTH, FieldValue::Int(raw_data.len() as i64)),
        Field::new(tags::RAW_DATA, FieldValue::Str(raw_data)),
        Field::new(tags::USERNAME, FieldValue::Str(creds.api_key.clone())),
        Field::new(tags::PASSWORD, FieldValue::Str(password)),
    ])
}
