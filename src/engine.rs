use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use uuid::Uuid;

use crate::error::{CodecError, FixError, SessionError, TransportError};
use crate::field::{tags, FieldRegistry, FieldValue};
use crate::history::{SentHistory, SentRecord};
use crate::protocol::{self, FixMessage, FrameBuffer};
use crate::session::{
    DisconnectReason, InboundMessage, OutboundItem, SessionConfig, SessionEvent,
};
use crate::types::{EncryptMethod, MsgType, UtcTimestamp};

const READ_CHUNK: usize = 4096;

// SessionRejectReason (tag 373) codes used by the engine.
const REJECT_TAG_WITHOUT_VALUE: i64 = 4;
const REJECT_VALUE_OUT_OF_RANGE: i64 = 5;
const REJECT_INCORRECT_DATA_FORMAT: i64 = 6;
const REJECT_TAG_APPEARS_MORE_THAN_ONCE: i64 = 13;

// BusinessRejectReason (tag 380).
const BUSINESS_REJECT_UNSUPPORTED_MSG_TYPE: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    LogonSent,
    LoggedOn,
    LogoutSent,
}

/// How a terminated session ended, carried out of the state machine.
struct Terminate {
    reason: DisconnectReason,
    error: Option<FixError>,
}

impl Terminate {
    fn session(reason: DisconnectReason, err: SessionError) -> Self {
        Self {
            reason,
            error: Some(FixError::Session(err)),
        }
    }

    fn transport(reason: DisconnectReason, err: TransportError) -> Self {
        Self {
            reason,
            error: Some(FixError::Transport(err)),
        }
    }
}

type EngineResult<T> = std::result::Result<T, Terminate>;

/// The session state machine. One task owns all of this; the only
/// suspension points are transport reads/writes, pipe sends/receives,
/// and timer awaits.
pub(crate) struct Engine<T> {
    reader: ReadHalf<T>,
    writer: WriteHalf<T>,
    config: SessionConfig,
    registry: Arc<FieldRegistry>,
    frames: FrameBuffer,
    phase: Phase,
    /// Next sequence number to send.
    outgoing_seq: u32,
    /// Next sequence number expected from the peer.
    incoming_seq: u32,
    /// Negotiated heartbeat interval (peer's HeartBtInt wins).
    heartbeat: Duration,
    last_sent: Instant,
    last_recv: Instant,
    outstanding_test_req: Option<String>,
    resend_pending: bool,
    /// Out-of-order arrivals held back until the gap is filled.
    holdback: BTreeMap<u32, FixMessage>,
    history: SentHistory,
    inbound_tx: mpsc::Sender<InboundMessage>,
    outbound_rx: mpsc::Receiver<OutboundItem>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    done: Option<DisconnectReason>,
}

impl<T> Engine<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub(crate) fn new(
        transport: T,
        config: SessionConfig,
        registry: Arc<FieldRegistry>,
        inbound_tx: mpsc::Sender<InboundMessage>,
        outbound_rx: mpsc::Receiver<OutboundItem>,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (reader, writer) = split(transport);
        let now = Instant::now();
        let heartbeat = config.heartbeat_interval;
        let history = SentHistory::new(config.history_capacity);
        Self {
            reader,
            writer,
            config,
            registry,
            frames: FrameBuffer::new(),
            phase: Phase::LogonSent,
            outgoing_seq: 1,
            incoming_seq: 1,
            heartbeat,
            last_sent: now,
            last_recv: now,
            outstanding_test_req: None,
            resend_pending: false,
            holdback: BTreeMap::new(),
            history,
            inbound_tx,
            outbound_rx,
            events_tx,
            done: None,
        }
    }

    pub(crate) async fn run(mut self) -> (DisconnectReason, Option<FixError>) {
        let outcome = self.run_inner().await;
        let (reason, error) = match outcome {
            Ok(reason) => (reason, None),
            Err(t) => (t.reason, t.error),
        };
        match &error {
            Some(err) => tracing::warn!(?reason, %err, "session ended"),
            None => tracing::info!(?reason, "session ended"),
        }
        let _ = self.events_tx.send(SessionEvent::Disconnected { reason });
        (reason, error)
    }

    async fn run_inner(&mut self) -> EngineResult<DisconnectReason> {
        self.send_logon().await?;
        self.await_logon().await?;
        let _ = self.events_tx.send(SessionEvent::LoggedOn);
        tracing::info!(
            sender = %self.config.sender_comp_id,
            target = %self.config.target_comp_id,
            "logged on"
        );
        self.event_loop().await
    }

    /// Handshake: the first inbound message must be the peer's Logon.
    async fn await_logon(&mut self) -> EngineResult<()> {
        let deadline = Instant::now() + self.config.logon_timeout;
        let mut chunk = [0u8; READ_CHUNK];
        while self.phase == Phase::LogonSent {
            let read = tokio::select! {
                r = self.reader.read(&mut chunk) => r,
                _ = sleep_until(deadline) => {
                    return Err(Terminate::session(
                        DisconnectReason::Timeout,
                        SessionError::Timeout,
                    ));
                }
            };
            self.on_read(read, &chunk).await?;
        }
        Ok(())
    }

    async fn event_loop(&mut self) -> EngineResult<DisconnectReason> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(reason) = self.done {
                return Ok(reason);
            }
            let hb_deadline = self.last_sent + self.heartbeat;
            let test_deadline = self.last_recv + self.heartbeat.mul_f64(1.5);
            let kill_deadline = self.last_recv + self.heartbeat.mul_f64(2.5);

            tokio::select! {
                read = self.reader.read(&mut chunk) => {
                    self.on_read(read, &chunk).await?;
                }
                item = self.outbound_rx.recv(), if self.phase == Phase::LoggedOn => {
                    match item {
                        Some(OutboundItem::App(msg)) => self.send_app(msg).await?,
                        Some(OutboundItem::Logout) | None => {
                            self.start_logout(None).await?;
                        }
                    }
                }
                _ = sleep_until(hb_deadline) => {
                    self.send_heartbeat(None).await?;
                }
                _ = sleep_until(test_deadline), if self.outstanding_test_req.is_none() => {
                    self.send_test_request().await?;
                }
                _ = sleep_until(kill_deadline) => {
                    tracing::warn!("no traffic within 2.5x heartbeat interval");
                    return Err(Terminate::session(
                        DisconnectReason::Timeout,
                        SessionError::Timeout,
                    ));
                }
            }
        }
    }

    async fn on_read(
        &mut self,
        read: std::io::Result<usize>,
        chunk: &[u8; READ_CHUNK],
    ) -> EngineResult<()> {
        match read {
            Ok(0) => {
                if self.phase == Phase::LogoutSent {
                    // Peer dropped the connection after our Logout.
                    self.done = Some(DisconnectReason::UserRequested);
                    return Ok(());
                }
                if !self.frames.is_empty() {
                    return Err(Terminate {
                        reason: DisconnectReason::PeerClosed,
                        error: Some(FixError::Codec(CodecError::Truncated)),
                    });
                }
                if !self.holdback.is_empty() {
                    return Err(Terminate::session(
                        DisconnectReason::PeerClosed,
                        SessionError::SequenceGapUnresolved,
                    ));
                }
                Err(Terminate::transport(
                    DisconnectReason::PeerClosed,
                    TransportError::Eof,
                ))
            }
            Ok(n) => {
                self.frames.extend(&chunk[..n]);
                self.drain_frames().await
            }
            Err(err) => Err(Terminate::transport(
                DisconnectReason::TransportFailed,
                TransportError::Io(err),
            )),
        }
    }

    async fn drain_frames(&mut self) -> EngineResult<()> {
        loop {
            if self.done.is_some() {
                return Ok(());
            }
            match self.frames.try_frame() {
                Ok(Some(frame)) => {
                    self.last_recv = Instant::now();
                    self.on_frame(frame).await?;
                }
                Ok(None) => return Ok(()),
                Err(err) => {
                    return Err(Terminate::session(
                        DisconnectReason::ProtocolError,
                        SessionError::HeaderError {
                            detail: err.to_string(),
                        },
                    ));
                }
            }
        }
    }

    async fn on_frame(&mut self, frame: Bytes) -> EngineResult<()> {
        match protocol::decode(&frame, &self.registry) {
            Ok(msg) => self.on_message(msg).await,
            Err(err) => self.on_garbled(frame, err).await,
        }
    }

    /// A frame that failed to decode. Framing-level damage is fatal once
    /// logged on; field-level damage is answered with a Reject when the
    /// header names a referent.
    async fn on_garbled(&mut self, frame: Bytes, err: CodecError) -> EngineResult<()> {
        if self.phase == Phase::LogonSent {
            tracing::warn!(%err, "garbled frame while awaiting logon");
            return Ok(());
        }
        let (ref_tag, reject_reason) = match &err {
            CodecError::EmptyValue { tag } => (Some(*tag), REJECT_TAG_WITHOUT_VALUE),
            CodecError::UnparseableValue { tag, .. } if *tag != 0 => {
                (Some(*tag), REJECT_INCORRECT_DATA_FORMAT)
            }
            CodecError::UnknownEnumValue { .. } => (None, REJECT_VALUE_OUT_OF_RANGE),
            _ => {
                // Framing damage: the stream can no longer be trusted.
                return Err(Terminate::session(
                    DisconnectReason::ProtocolError,
                    SessionError::HeaderError {
                        detail: err.to_string(),
                    },
                ));
            }
        };
        match protocol::scan_header(&frame) {
            Some((ref_seq, ref_msg_type)) => {
                tracing::warn!(%err, ref_seq, "rejecting undecodable message");
                self.send_reject(ref_seq, ref_tag, Some(&ref_msg_type), reject_reason, &err.to_string())
                    .await
            }
            None => Err(Terminate::session(
                DisconnectReason::ProtocolError,
                SessionError::HeaderError {
                    detail: err.to_string(),
                },
            )),
        }
    }

    async fn on_message(&mut self, msg: FixMessage) -> EngineResult<()> {
        let seq = match msg.msg_seq_num() {
            Some(seq) => seq,
            None => {
                self.send_logout_msg(Some("missing MsgSeqNum")).await?;
                return Err(Terminate::session(
                    DisconnectReason::ProtocolError,
                    SessionError::HeaderError {
                        detail: "missing MsgSeqNum(34)".to_string(),
                    },
                ));
            }
        };

        if self.phase == Phase::LogonSent {
            return self.on_handshake_message(seq, msg).await;
        }

        if let Some(dup) = duplicate_header_tag(&msg) {
            tracing::warn!(tag = dup, seq, "header tag appears more than once");
            return self
                .send_reject(
                    seq,
                    Some(dup),
                    Some(msg.msg_type.wire()),
                    REJECT_TAG_APPEARS_MORE_THAN_ONCE,
                    "header tag appears more than once",
                )
                .await;
        }

        // SequenceReset repairs the counter regardless of its own
        // MsgSeqNum; everything else goes through gap detection.
        if msg.msg_type == MsgType::SequenceReset {
            return self.on_sequence_reset(seq, &msg);
        }

        if seq > self.incoming_seq {
            tracing::debug!(seq, expected = self.incoming_seq, "sequence gap detected");
            self.holdback.insert(seq, msg);
            if !self.resend_pending {
                let from = self.incoming_seq;
                self.send_resend_request(from, 0).await?;
                self.resend_pending = true;
            }
            return Ok(());
        }

        if seq < self.incoming_seq {
            if msg.poss_dup() {
                tracing::debug!(seq, "retransmitted message below expected sequence");
                if !msg.msg_type.is_admin() {
                    self.deliver(seq, msg, true).await;
                }
                return Ok(());
            }
            self.send_logout_msg(Some(&format!(
                "MsgSeqNum {seq} lower than expected {} without PossDupFlag",
                self.incoming_seq
            )))
            .await?;
            return Err(Terminate::session(
                DisconnectReason::ProtocolError,
                SessionError::DuplicateWithoutPossDup { seq },
            ));
        }

        self.incoming_seq += 1;
        self.dispatch(seq, msg).await?;
        self.drain_holdback().await
    }

    /// First inbound message of the session; only Logon or Logout are
    /// acceptable here.
    async fn on_handshake_message(&mut self, seq: u32, msg: FixMessage) -> EngineResult<()> {
        match msg.msg_type {
            MsgType::Logon => {
                if let Some(interval) = msg.get_int(tags::HEART_BT_INT) {
                    if interval > 0 && interval as u64 != self.heartbeat.as_secs() {
                        tracing::debug!(interval, "adopting peer heartbeat interval");
                        self.heartbeat = Duration::from_secs(interval as u64);
                    }
                }
                if seq == self.incoming_seq {
                    self.incoming_seq += 1;
                } else if seq > self.incoming_seq {
                    // Peer is ahead; ask for the missing range once the
                    // session is up.
                    let from = self.incoming_seq;
                    self.send_resend_request(from, 0).await?;
                    self.resend_pending = true;
                } else if !msg.poss_dup() {
                    return Err(Terminate::session(
                        DisconnectReason::ProtocolError,
                        SessionError::DuplicateWithoutPossDup { seq },
                    ));
                }
                self.phase = Phase::LoggedOn;
                Ok(())
            }
            MsgType::Logout => {
                let text = msg
                    .get_str(tags::TEXT)
                    .unwrap_or("logon rejected by peer")
                    .to_string();
                Err(Terminate::session(
                    DisconnectReason::ProtocolError,
                    SessionError::LogonRejected { text },
                ))
            }
            ref other => {
                let _ = self.events_tx.send(SessionEvent::ProtocolWarning {
                    text: format!("unexpected MsgType {} before logon", other.wire()),
                });
                Err(Terminate::session(
                    DisconnectReason::ProtocolError,
                    SessionError::UnexpectedMsgType {
                        msg_type: other.wire().to_string(),
                        state: "awaiting logon".to_string(),
                    },
                ))
            }
        }
    }

    async fn dispatch(&mut self, seq: u32, msg: FixMessage) -> EngineResult<()> {
        match msg.msg_type.clone() {
            MsgType::Heartbeat => {
                if let (Some(pending), Some(echoed)) = (
                    self.outstanding_test_req.as_deref(),
                    msg.get_str(tags::TEST_REQ_ID),
                ) {
                    if pending == echoed {
                        self.outstanding_test_req = None;
                    }
                }
                Ok(())
            }
            MsgType::TestRequest => {
                let id = msg.get_str(tags::TEST_REQ_ID).map(str::to_string);
                self.send_heartbeat(id.as_deref()).await
            }
            MsgType::ResendRequest => {
                let begin = msg.get_int(tags::BEGIN_SEQ_NO).unwrap_or(1) as u32;
                let end = msg.get_int(tags::END_SEQ_NO).unwrap_or(0) as u32;
                self.replay(begin, end).await
            }
            MsgType::SequenceReset => self.on_sequence_reset(seq, &msg),
            MsgType::Logout => {
                if self.phase == Phase::LogoutSent {
                    self.done = Some(DisconnectReason::UserRequested);
                } else {
                    tracing::info!("peer requested logout");
                    self.send_logout_msg(None).await?;
                    self.done = Some(DisconnectReason::PeerRequested);
                }
                Ok(())
            }
            MsgType::Logon => {
                let _ = self.events_tx.send(SessionEvent::ProtocolWarning {
                    text: "unexpected Logon while logged on".to_string(),
                });
                Ok(())
            }
            MsgType::Reject => {
                tracing::warn!(
                    text = msg.get_str(tags::TEXT).unwrap_or(""),
                    ref_seq = msg.get_int(tags::REF_SEQ_NUM),
                    "peer rejected a message"
                );
                let _ = self.events_tx.send(SessionEvent::ProtocolWarning {
                    text: format!(
                        "peer Reject: {}",
                        msg.get_str(tags::TEXT).unwrap_or("(no text)")
                    ),
                });
                Ok(())
            }
            MsgType::Other(wire) => {
                tracing::warn!(msg_type = %wire, seq, "unsupported MsgType");
                self.send_business_reject(seq, &wire).await
            }
            _ => {
                let dup = msg.poss_dup();
                self.deliver(seq, msg, dup).await;
                Ok(())
            }
        }
    }

    fn on_sequence_reset(&mut self, seq: u32, msg: &FixMessage) -> EngineResult<()> {
        let new_seq = match msg.get_int(tags::NEW_SEQ_NO) {
            Some(n) if n > 0 => n as u32,
            _ => {
                tracing::warn!(seq, "SequenceReset without a usable NewSeqNo");
                return Ok(());
            }
        };
        let gap_fill = msg.get_bool(tags::GAP_FILL_FLAG).unwrap_or(false);
        if gap_fill {
            // GapFill only moves the counter forward from a sequence we
            // have not consumed yet.
            if seq >= self.incoming_seq {
                tracing::debug!(seq, new_seq, "gap fill");
                self.incoming_seq = new_seq;
            } else {
                tracing::debug!(seq, new_seq, "stale gap fill ignored");
            }
        } else {
            tracing::info!(new_seq, "sequence reset");
            self.incoming_seq = new_seq;
        }
        Ok(())
    }

    async fn drain_holdback(&mut self) -> EngineResult<()> {
        // Entries at or below the counter were superseded by a reset or
        // a replay.
        let floor = self.incoming_seq;
        self.holdback.retain(|seq, _| *seq >= floor);
        while self.holdback.first_key_value().map(|(seq, _)| *seq) == Some(self.incoming_seq) {
            let (seq, msg) = self.holdback.pop_first().expect("checked non-empty");
            self.incoming_seq += 1;
            self.dispatch(seq, msg).await?;
        }
        if self.holdback.is_empty() {
            self.resend_pending = false;
        }
        Ok(())
    }

    async fn deliver(&mut self, seq: u32, message: FixMessage, possible_duplicate: bool) {
        let inbound = InboundMessage {
            seq,
            message,
            possible_duplicate,
        };
        // A dropped reader is non-destructive for the session; messages
        // are discarded once nobody is listening.
        if self.inbound_tx.send(inbound).await.is_err() {
            tracing::debug!(seq, "reader pipe closed, dropping inbound message");
        }
    }

    /// Replays `[begin, end]` (`end == 0` means everything sent so far)
    /// from history: application messages go out again with PossDupFlag
    /// and their original SendingTime; runs of administrative messages
    /// collapse into one SequenceReset-GapFill; evicted runs are answered
    /// with SequenceReset-Reset.
    async fn replay(&mut self, begin: u32, end: u32) -> EngineResult<()> {
        let last_sent = self.outgoing_seq.saturating_sub(1);
        let end = if end == 0 { last_sent } else { end.min(last_sent) };
        tracing::info!(begin, end, "resend requested");
        let mut seq = begin;
        while seq <= end {
            match self.history.get(seq).cloned() {
                Some(SentRecord::App {
                    message,
                    sending_time,
                }) => {
                    self.resend_app(seq, message, sending_time).await?;
                    seq += 1;
                }
                first => {
                    let run_start = seq;
                    let mut evicted = first.is_none();
                    seq += 1;
                    while seq <= end {
                        match self.history.get(seq) {
                            Some(SentRecord::App { .. }) => break,
                            Some(SentRecord::Admin) => {}
                            None => evicted = true,
                        }
                        seq += 1;
                    }
                    // NewSeqNo points at the next message sent normally.
                    self.send_sequence_reset(run_start, seq, !evicted).await?;
                }
            }
        }
        Ok(())
    }

    // ---- outbound paths ------------------------------------------------

    fn alloc_seq(&mut self) -> u32 {
        let seq = self.outgoing_seq;
        self.outgoing_seq += 1;
        seq
    }

    /// Full header population: BeginString, MsgType, MsgSeqNum,
    /// SenderCompID, TargetCompID, SendingTime, then the caller's body.
    fn build_wire(
        &self,
        msg: &FixMessage,
        seq: u32,
        sending_time: UtcTimestamp,
        orig_sending_time: Option<UtcTimestamp>,
    ) -> Bytes {
        let mut wire = FixMessage::new(msg.msg_type.clone());
        wire.begin_string = self.config.begin_string;
        wire.push_field(tags::MSG_SEQ_NUM, FieldValue::Int(seq as i64));
        wire.push_field(
            tags::SENDER_COMP_ID,
            FieldValue::Str(self.config.sender_comp_id.clone()),
        );
        wire.push_field(
            tags::TARGET_COMP_ID,
            FieldValue::Str(self.config.target_comp_id.clone()),
        );
        wire.push_field(tags::SENDING_TIME, FieldValue::Timestamp(sending_time));
        if let Some(orig) = orig_sending_time {
            wire.push_field(tags::POSS_DUP_FLAG, FieldValue::Bool(true));
            wire.push_field(tags::ORIG_SENDING_TIME, FieldValue::Timestamp(orig));
        }
        wire.body.extend(msg.body.iter().cloned());
        protocol::encode(&wire)
    }

    async fn write_frame(&mut self, bytes: &Bytes) -> EngineResult<()> {
        self.writer.write_all(bytes).await.map_err(|err| {
            Terminate::transport(DisconnectReason::TransportFailed, TransportError::Io(err))
        })?;
        self.writer.flush().await.map_err(|err| {
            Terminate::transport(DisconnectReason::TransportFailed, TransportError::Io(err))
        })?;
        self.last_sent = Instant::now();
        Ok(())
    }

    async fn send_app(&mut self, msg: FixMessage) -> EngineResult<()> {
        let seq = self.alloc_seq();
        let now = UtcTimestamp::now();
        let bytes = self.build_wire(&msg, seq, now, None);
        self.history.record_app(seq, msg, now);
        self.write_frame(&bytes).await
    }

    async fn send_admin(&mut self, msg: FixMessage) -> EngineResult<()> {
        let seq = self.alloc_seq();
        let bytes = self.build_wire(&msg, seq, UtcTimestamp::now(), None);
        self.history.record_admin(seq);
        self.write_frame(&bytes).await
    }

    async fn resend_app(
        &mut self,
        seq: u32,
        msg: FixMessage,
        orig_sending_time: UtcTimestamp,
    ) -> EngineResult<()> {
        let bytes = self.build_wire(&msg, seq, UtcTimestamp::now(), Some(orig_sending_time));
        self.write_frame(&bytes).await
    }

    async fn send_logon(&mut self) -> EngineResult<()> {
        let mut msg = FixMessage::new(MsgType::Logon);
        msg.push_field(
            tags::ENCRYPT_METHOD,
            FieldValue::EncryptMethod(EncryptMethod::None),
        );
        msg.push_field(
            tags::HEART_BT_INT,
            FieldValue::Int(self.config.heartbeat_interval.as_secs() as i64),
        );
        if self.config.reset_seq_num {
            msg.push_field(tags::RESET_SEQ_NUM_FLAG, FieldValue::Bool(true));
        }
        for field in self.config.logon_fields.clone() {
            msg.push_field(field.tag, field.value);
        }
        tracing::debug!("sending logon");
        self.send_admin(msg).await
    }

    async fn send_heartbeat(&mut self, test_req_id: Option<&str>) -> EngineResult<()> {
        let mut msg = FixMessage::new(MsgType::Heartbeat);
        if let Some(id) = test_req_id {
            msg.push_field(tags::TEST_REQ_ID, FieldValue::Str(id.to_string()));
        }
        self.send_admin(msg).await
    }

    async fn send_test_request(&mut self) -> EngineResult<()> {
        let id = Uuid::new_v4().to_string();
        tracing::debug!(%id, "no traffic within 1.5x heartbeat interval, sending test request");
        let mut msg = FixMessage::new(MsgType::TestRequest);
        msg.push_field(tags::TEST_REQ_ID, FieldValue::Str(id.clone()));
        self.outstanding_test_req = Some(id);
        self.send_admin(msg).await
    }

    async fn send_resend_request(&mut self, begin: u32, end: u32) -> EngineResult<()> {
        let mut msg = FixMessage::new(MsgType::ResendRequest);
        msg.push_field(tags::BEGIN_SEQ_NO, FieldValue::Int(begin as i64));
        msg.push_field(tags::END_SEQ_NO, FieldValue::Int(end as i64));
        self.send_admin(msg).await
    }

    /// SequenceReset stamped at `stamp_seq` (the first sequence of the
    /// run it replaces), moving the peer's expectation to `new_seq_no`.
    /// A GapFill is a retransmission of known admin traffic and carries
    /// PossDupFlag; a Reset covers sequences with no prior transmission
    /// to reference, so it carries neither PossDupFlag nor
    /// OrigSendingTime.
    async fn send_sequence_reset(
        &mut self,
        stamp_seq: u32,
        new_seq_no: u32,
        gap_fill: bool,
    ) -> EngineResult<()> {
        let mut msg = FixMessage::new(MsgType::SequenceReset);
        if gap_fill {
            msg.push_field(tags::GAP_FILL_FLAG, FieldValue::Bool(true));
        }
        msg.push_field(tags::NEW_SEQ_NO, FieldValue::Int(new_seq_no as i64));
        let orig = if gap_fill {
            Some(UtcTimestamp::now())
        } else {
            None
        };
        let bytes = self.build_wire(&msg, stamp_seq, UtcTimestamp::now(), orig);
        self.write_frame(&bytes).await
    }

    async fn send_logout_msg(&mut self, text: Option<&str>) -> EngineResult<()> {
        let mut msg = FixMessage::new(MsgType::Logout);
        if let Some(text) = text {
            msg.push_field(tags::TEXT, FieldValue::Str(text.to_string()));
        }
        self.send_admin(msg).await
    }

    async fn start_logout(&mut self, text: Option<&str>) -> EngineResult<()> {
        tracing::info!("logging out");
        self.send_logout_msg(text).await?;
        self.phase = Phase::LogoutSent;
        let _ = self.events_tx.send(SessionEvent::LogoutSent);
        Ok(())
    }

    async fn send_reject(
        &mut self,
        ref_seq: u32,
        ref_tag: Option<u32>,
        ref_msg_type: Option<&str>,
        reason: i64,
        text: &str,
    ) -> EngineResult<()> {
        let mut msg = FixMessage::new(MsgType::Reject);
        msg.push_field(tags::REF_SEQ_NUM, FieldValue::Int(ref_seq as i64));
        if let Some(tag) = ref_tag {
            msg.push_field(tags::REF_TAG_ID, FieldValue::Int(tag as i64));
        }
        if let Some(mt) = ref_msg_type {
            msg.push_field(tags::REF_MSG_TYPE, FieldValue::Str(mt.to_string()));
        }
        msg.push_field(tags::SESSION_REJECT_REASON, FieldValue::Int(reason));
        msg.push_field(tags::TEXT, FieldValue::Str(text.to_string()));
        self.send_admin(msg).await
    }

    async fn send_business_reject(&mut self, ref_seq: u32, msg_type: &str) -> EngineResult<()> {
        let mut msg = FixMessage::new(MsgType::BusinessMessageReject);
        msg.push_field(tags::REF_SEQ_NUM, FieldValue::Int(ref_seq as i64));
        msg.push_field(tags::REF_MSG_TYPE, FieldValue::Str(msg_type.to_string()));
        msg.push_field(
            tags::BUSINESS_REJECT_REASON,
            FieldValue::Int(BUSINESS_REJECT_UNSUPPORTED_MSG_TYPE),
        );
        msg.push_field(
            tags::TEXT,
            FieldValue::Str(format!("unsupported MsgType {msg_type}")),
        );
        self.send_admin(msg).await
    }
}

/// Header tags that must appear exactly once. The codec already pulled
/// 8, 9, and 35 out of the body, so their mere presence there is a
/// duplicate; 34, 49, 56, and 52 may appear once.
fn duplicate_header_tag(msg: &FixMessage) -> Option<u32> {
    let mut counts: [(u32, u32); 4] = [
        (tags::MSG_SEQ_NUM, 0),
        (tags::SENDER_COMP_ID, 0),
        (tags::TARGET_COMP_ID, 0),
        (tags::SENDING_TIME, 0),
    ];
    for field in msg.fields() {
        if matches!(
            field.tag,
            tags::BEGIN_STRING | tags::BODY_LENGTH | tags::MSG_TYPE
        ) {
            return Some(field.tag);
        }
        for (tag, count) in counts.iter_mut() {
            if field.tag == *tag {
                *count += 1;
                if *count > 1 {
                    return Some(*tag);
                }
            }
        }
    }
    None
}
