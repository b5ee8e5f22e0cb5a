use thiserror::Error;

/// Wire-level failures raised while framing, decoding, or encoding a
/// single FIX message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed header: message must start with 8=BeginString and 9=BodyLength")]
    MalformedHeader,

    #[error("truncated message: body shorter than declared BodyLength")]
    Truncated,

    #[error("checksum mismatch: expected {expected:03}, computed {computed:03}")]
    BadChecksum { expected: u8, computed: u8 },

    #[error("empty value for tag {tag}")]
    EmptyValue { tag: u32 },

    #[error("unknown tag {0}")]
    UnknownTag(u32),

    #[error("unparseable value for tag {tag}: {reason}")]
    UnparseableValue { tag: u32, reason: String },

    #[error("unknown enum value {value:?}")]
    UnknownEnumValue { value: String },
}

/// Session-layer failures. Fatal to the current session but recoverable
/// by the persistent connector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("logon rejected: {text}")]
    LogonRejected { text: String },

    #[error("sequence gap could not be resolved")]
    SequenceGapUnresolved,

    #[error("duplicate sequence number {seq} without PossDupFlag")]
    DuplicateWithoutPossDup { seq: u32 },

    #[error("header error: {detail}")]
    HeaderError { detail: String },

    #[error("session timed out")]
    Timeout,

    #[error("unexpected {msg_type} while {state}")]
    UnexpectedMsgType { msg_type: String, state: String },
}

/// Failures of the underlying byte transport. Always terminal for the
/// session.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer closed the connection")]
    Eof,

    #[error("transport i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Startup configuration failures. Raised before any session runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown configuration field: {0}")]
    UnknownField(String),

    #[error("field registry collision on {what}")]
    RegistryCollision { what: String },

    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum FixError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, FixError>;
