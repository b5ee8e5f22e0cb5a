//! Coinbase Pro FIX logon signing: HMAC-SHA256 over the SOH-joined
//! presign string, keyed with the base64-decoded API secret.

use base64::prelude::*;

use crate::config::Credentials;
use crate::error::ConfigError;
use crate::field::{tags, Field, FieldDef, FieldRegistryBuilder, FieldValue};
use crate::types::UtcTimestamp;
use crate::venues::hmac_sha256;

/// Coinbase Pro's custom session tags.
pub fn register_fields(builder: &mut FieldRegistryBuilder) -> Result<(), ConfigError> {
    builder.register(FieldDef::str_field(8013, "CancelOrdersOnDisconnect"))?;
    builder.register(FieldDef::bool_field(9406, "DropCopyFlag"))?;
    Ok(())
}

pub fn logon_fields(
    creds: &Credentials,
    now: UtcTimestamp,
    sender_comp_id: &str,
    target_comp_id: &str,
) -> Result<Vec<Field>, ConfigError> {
    let passphrase = creds
        .passphrase
        .as_deref()
        .ok_or(ConfigError::Missing("coinbase passphrase"))?;

    // The presign covers the logon header fields the venue will see,
    // joined by SOH: SendingTime, MsgType, MsgSeqNum (always 1 at
    // logon), SenderCompID, TargetCompID, Password.
    let presign = [
        &now.to_string(),
        "A",
        "1",
        sender_comp_id,
        target_comp_id,
        passphrase,
    ]
    .join("\x01");

    let secret = BASE64_STANDARD
        .decode(&creds.api_secret)
        .map_err(|_| ConfigError::Invalid("coinbase api_secret is not valid base64".to_string()))?;
    let signature = BASE64_STANDARD.encode(hmac_sha256(&secret, presign.as_bytes())?);

    Ok(vec![
        Field::new(tags::PASSWORD, FieldValue::Str(passphrase.to_string())),
        Field::new(tags::RAW_DATA_LENGTH, FieldValue::Int(signature.len() as i64)),
        Field::new(tags::RAW_DATA, FieldValue::Str(signature)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            api_key: "key".to_string(),
            api_secret: BASE64_STANDARD.encode(b"secret-bytes"),
            passphrase: Some("phrase".to_string()),
        }
    }

    #[test]
    fn signature_is_deterministic() {
        let now = UtcTimestamp::parse("20240101-00:00:00").unwrap();
        let a = logon_fields(&creds(), now, "KEY", "Coinbase").unwrap();
        let b = logon_fields(&creds(), now, "KEY", "Coinbase").unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].tag, tags::PASSWORD);
        assert_eq!(a[2].tag, tags::RAW_DATA);
        assert!(!a[2].wire_value().is_empty());
    }

    #[test]
    fn missing_passphrase_fails() {
        let mut c = creds();
        c.passphrase = None;
        let now = UtcTimestamp::parse("20240101-00:00:00").unwrap();
        assert!(logon_fields(&c, now, "KEY", "Coinbase").is_err());
    }

    #[test]
    fn non_base64_secret_fails() {
        let mut c = creds();
        c.api_secret = "!!not-base64!!".to_string();
        let now = UtcTimestamp::parse("20240101-00:00:00").unwrap();
        assert!(matches!(
            logon_fields(&c, now, "KEY", "Coinbase"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
