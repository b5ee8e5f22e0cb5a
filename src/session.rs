use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::Engine;
use crate::error::{ConfigError, FixError, Result};
use crate::field::{Field, FieldRegistry};
use crate::protocol::FixMessage;
use crate::types::Version;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The application closed the sink or called logout.
    UserRequested,
    /// The peer initiated a Logout exchange.
    PeerRequested,
    /// The transport reached EOF without a Logout.
    PeerClosed,
    /// A protocol violation made the session unusable.
    ProtocolError,
    /// The peer stopped responding past the watchdog deadline.
    Timeout,
    /// The transport failed with an I/O error.
    TransportFailed,
}

/// Lifecycle notifications surfaced on the session's event channel.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    LoggedOn,
    LogoutSent,
    Disconnected { reason: DisconnectReason },
    /// A non-fatal protocol anomaly worth the application's attention,
    /// e.g. an unexpected MsgType before logon.
    ProtocolWarning { text: String },
}

/// One decoded application message handed to the reader pipe.
/// Administrative traffic never appears here.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub seq: u32,
    pub message: FixMessage,
    /// Set when the peer retransmitted the message (PossDupFlag=Y); the
    /// reader decides whether it already acted on the original.
    pub possible_duplicate: bool,
}

#[derive(Debug)]
pub(crate) enum OutboundItem {
    App(FixMessage),
    Logout,
}

/// Session parameters. Build with [`SessionConfig::builder`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub sender_comp_id: String,
    pub target_comp_id: String,
    pub begin_string: Version,
    pub heartbeat_interval: Duration,
    pub logon_fields: Vec<Field>,
    pub reset_seq_num: bool,
    pub history_capacity: usize,
    pub inbound_buffer: usize,
    pub logon_timeout: Duration,
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    sender_comp_id: Option<String>,
    target_comp_id: Option<String>,
    begin_string: Option<Version>,
    heartbeat_interval: Option<Duration>,
    logon_fields: Vec<Field>,
    reset_seq_num: bool,
    history_capacity: Option<usize>,
    inbound_buffer: Option<usize>,
    logon_timeout: Option<Duration>,
}

impl SessionConfigBuilder {
    pub fn sender_comp_id(mut self, v: impl Into<String>) -> Self {
        self.sender_comp_id = Some(v.into());
        self
    }

    pub fn target_comp_id(mut self, v: impl Into<String>) -> Self {
        self.target_comp_id = Some(v.into());
        self
    }

    pub fn begin_string(mut self, v: Version) -> Self {
        self.begin_string = Some(v);
        self
    }

    pub fn heartbeat_interval(mut self, v: Duration) -> Self {
        self.heartbeat_interval = Some(v);
        self
    }

    /// Extra fields appended to the Logon body (venue credentials,
    /// signatures).
    pub fn logon_fields(mut self, fields: Vec<Field>) -> Self {
        self.logon_fields = fields;
        self
    }

    pub fn reset_seq_num(mut self, v: bool) -> Self {
        self.reset_seq_num = v;
        self
    }

    pub fn history_capacity(mut self, v: usize) -> Self {
        self.history_capacity = Some(v);
        self
    }

    pub fn inbound_buffer(mut self, v: usize) -> Self {
        self.inbound_buffer = Some(v);
        self
    }

    pub fn logon_timeout(mut self, v: Duration) -> Self {
        self.logon_timeout = Some(v);
        self
    }

    pub fn build(self) -> Result<SessionConfig> {
        Ok(SessionConfig {
            sender_comp_id: self.sender_comp_id.ok_or(ConfigError::Missing("sender_comp_id"))?,
            target_comp_id: self.target_comp_id.ok_or(ConfigError::Missing("target_comp_id"))?,
            begin_string: self.begin_string.unwrap_or(Version::FIX44),
            heartbeat_interval: self.heartbeat_interval.unwrap_or(Duration::from_secs(30)),
            logon_fields: self.logon_fields,
            reset_seq_num: self.reset_seq_num,
            history_capacity: self.history_capacity.unwrap_or(1024),
            inbound_buffer: self.inbound_buffer.unwrap_or(1024),
            logon_timeout: self.logon_timeout.unwrap_or(Duration::from_secs(10)),
        })
    }
}

/// Handle to a running session: the outbound sink plus lifecycle
/// channels. Cloneable; the engine task ends when every clone is dropped
/// or [`SessionHandle::logout`] is called.
#[derive(Debug)]
pub struct SessionHandle {
    outbound_tx: mpsc::Sender<OutboundItem>,
    events_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    task: JoinHandle<(DisconnectReason, Option<FixError>)>,
}

impl SessionHandle {
    /// Enqueues an application message. The engine assigns MsgSeqNum in
    /// arrival order and populates the full header.
    pub async fn send(&self, msg: FixMessage) -> Result<()> {
        self.outbound_tx
            .send(OutboundItem::App(msg))
            .await
            .map_err(|_| FixError::ChannelClosed)
    }

    /// Requests a graceful Logout exchange.
    pub async fn logout(&self) -> Result<()> {
        self.outbound_tx
            .send(OutboundItem::Logout)
            .await
            .map_err(|_| FixError::ChannelClosed)
    }

    /// Takes the lifecycle event receiver. Yields `None` after the first
    /// call.
    pub fn events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events_rx.take()
    }

    /// Waits for the engine task to finish and returns how the session
    /// ended.
    pub async fn closed(self) -> (DisconnectReason, Option<FixError>) {
        // Engine exit is not a panic path; a cancelled task reads as a
        // transport failure.
        self.task.await.unwrap_or((
            DisconnectReason::TransportFailed,
            Some(FixError::ChannelClosed),
        ))
    }

    pub fn sender(&self) -> OutboundSender {
        OutboundSender {
            tx: self.outbound_tx.clone(),
        }
    }
}

/// A clonable outbound sink detached from the handle.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    tx: mpsc::Sender<OutboundItem>,
}

impl OutboundSender {
    pub async fn send(&self, msg: FixMessage) -> Result<()> {
        self.tx
            .send(OutboundItem::App(msg))
            .await
            .map_err(|_| FixError::ChannelClosed)
    }

    pub async fn logout(&self) -> Result<()> {
        self.tx
            .send(OutboundItem::Logout)
            .await
            .map_err(|_| FixError::ChannelClosed)
    }
}

/// Opens a FIX session over `transport`: sends the Logon, then runs the
/// session state machine on its own task. Returns the handle and the
/// reader pipe of decoded application messages, delivered in strict
/// sequence order.
pub fn connect<T>(
    transport: T,
    config: SessionConfig,
    registry: Arc<FieldRegistry>,
) -> (SessionHandle, mpsc::Receiver<InboundMessage>)
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (outbound_tx, outbound_rx) = mpsc::channel::<OutboundItem>(1024);
    let (inbound_tx, inbound_rx) = mpsc::channel::<InboundMessage>(config.inbound_buffer);
    let (events_tx, events_rx) = mpsc::unbounded_channel::<SessionEvent>();

    let engine = Engine::new(transport, config, registry, inbound_tx, outbound_rx, events_tx);
    let task = tokio::spawn(engine.run());

    (
        SessionHandle {
            outbound_tx,
            events_rx: Some(events_rx),
            task,
        },
        inbound_rx,
    )
}
