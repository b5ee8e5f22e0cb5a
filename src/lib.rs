#![doc = include_str!("../README.md")]
#![warn(rustdoc::broken_intra_doc_links)]
pub mod config;
pub mod connector;
mod engine;
pub mod error;
pub mod field;
pub mod history;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;
pub mod venues;

pub use config::{ConsoleConfig, Credentials};
pub use connector::{ConnectorEvent, FixHandler, PersistentConnector, RetryConfig};
pub use error::{CodecError, ConfigError, FixError, Result, SessionError, TransportError};
pub use field::{Field, FieldDef, FieldRegistry, FieldRegistryBuilder, FieldValue};
pub use protocol::{FixMessage, MessageItem, RepeatingGroup};
pub use session::{
    connect, DisconnectReason, InboundMessage, SessionConfig, SessionEvent, SessionHandle,
};
pub use types::{MsgType, Side, UtcTimestamp, Version};
