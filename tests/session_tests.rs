//! Session-engine integration tests: the engine runs over an in-memory
//! duplex while the test plays the acceptor side, frame by frame.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use fixwire::field::{tags, Field, FieldRegistry, FieldValue};
use fixwire::protocol::{self, FixMessage, FrameBuffer};
use fixwire::session::{
    connect, DisconnectReason, InboundMessage, SessionConfig, SessionEvent, SessionHandle,
};
use fixwire::types::{MsgType, UtcTimestamp};
use fixwire::{FixError, SessionError};

/// The acceptor side of the wire, speaking raw frames.
struct Peer {
    stream: DuplexStream,
    frames: FrameBuffer,
    registry: Arc<FieldRegistry>,
    seq: u32,
}

impl Peer {
    fn new(stream: DuplexStream, registry: Arc<FieldRegistry>) -> Self {
        Self {
            stream,
            frames: FrameBuffer::new(),
            registry,
            seq: 1,
        }
    }

    async fn recv(&mut self) -> FixMessage {
        loop {
            if let Some(frame) = self.frames.try_frame().unwrap() {
                return protocol::decode(&frame, &self.registry).unwrap();
            }
            let mut buf = [0u8; 4096];
            let n = self.stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "engine closed the stream while a frame was expected");
            self.frames.extend(&buf[..n]);
        }
    }

    /// Reads frames until one of the given type shows up.
    async fn recv_type(&mut self, msg_type: MsgType) -> FixMessage {
        loop {
            let msg = self.recv().await;
            if msg.msg_type == msg_type {
                return msg;
            }
        }
    }

    async fn send_with_seq(&mut self, msg_type: MsgType, seq: u32, extra: &[Field]) {
        let mut msg = FixMessage::new(msg_type);
        msg.push_field(tags::MSG_SEQ_NUM, FieldValue::Int(seq as i64));
        msg.push_field(tags::SENDER_COMP_ID, FieldValue::Str("SERVER".into()));
        msg.push_field(tags::TARGET_COMP_ID, FieldValue::Str("CLIENT".into()));
        msg.push_field(tags::SENDING_TIME, FieldValue::Timestamp(UtcTimestamp::now()));
        for field in extra {
            msg.push_field(field.tag, field.value.clone());
        }
        self.send_raw(&protocol::encode(&msg)).await;
    }

    async fn send(&mut self, msg_type: MsgType, extra: &[Field]) {
        let seq = self.seq;
        self.seq += 1;
        self.send_with_seq(msg_type, seq, extra).await;
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    /// Answers the engine's Logon.
    async fn accept_logon(&mut self) -> FixMessage {
        let logon = self.recv().await;
        assert_eq!(logon.msg_type, MsgType::Logon);
        self.send(MsgType::Logon, &[Field::int(tags::HEART_BT_INT, 30)])
            .await;
        logon
    }
}

fn config(heartbeat: Duration) -> SessionConfig {
    SessionConfig::builder()
        .sender_comp_id("CLIENT")
        .target_comp_id("SERVER")
        .heartbeat_interval(heartbeat)
        .build()
        .unwrap()
}

fn start(heartbeat: Duration) -> (SessionHandle, tokio::sync::mpsc::Receiver<InboundMessage>, Peer) {
    let (client_side, server_side) = tokio::io::duplex(16 * 1024);
    let registry = FieldRegistry::fix44();
    let (session, inbound) = connect(client_side, config(heartbeat), registry.clone());
    (session, inbound, Peer::new(server_side, registry))
}

fn exec_report(order_id: &str) -> Vec<Field> {
    vec![
        Field::str(37, order_id),
        Field::str(17, "e-1"),
        Field::str(150, "0"),
        Field::str(39, "0"),
    ]
}

#[tokio::test]
async fn logon_handshake_and_ordered_delivery() {
    let (session, mut inbound, mut peer) = start(Duration::from_secs(30));

    // Engine opens with a well-formed Logon at seq 1.
    let logon = peer.recv().await;
    assert_eq!(logon.msg_type, MsgType::Logon);
    assert_eq!(logon.msg_seq_num(), Some(1));
    assert_eq!(logon.get_str(tags::SENDER_COMP_ID), Some("CLIENT"));
    assert_eq!(logon.get_str(tags::TARGET_COMP_ID), Some("SERVER"));
    assert_eq!(logon.get(tags::ENCRYPT_METHOD).unwrap().wire(), "0");
    assert_eq!(logon.get_int(tags::HEART_BT_INT), Some(30));
    assert!(logon.sending_time().is_some());
    peer.send(MsgType::Logon, &[Field::int(tags::HEART_BT_INT, 30)])
        .await;

    // Inbound application message reaches the reader.
    peer.send(MsgType::ExecutionReport, &exec_report("o-1")).await;
    let got = inbound.recv().await.unwrap();
    assert_eq!(got.seq, 2);
    assert_eq!(got.message.msg_type, MsgType::ExecutionReport);
    assert_eq!(got.message.get_str(37), Some("o-1"));
    assert!(!got.possible_duplicate);

    // Outbound application message gets the full header. The engine's
    // Logon used seq 1, so the first app message is seq 2.
    let mut order = FixMessage::new(MsgType::NewOrderSingle);
    order
        .push_field(11, FieldValue::Str("ord-1".into()))
        .push_field(55, FieldValue::Str("BTC-PERPETUAL".into()))
        .push_field(54, FieldValue::Str("1".into()))
        .push_field(38, FieldValue::Float(10.0));
    let (sent, received) = futures::future::join(session.send(order), peer.recv()).await;
    sent.unwrap();
    assert_eq!(received.msg_type, MsgType::NewOrderSingle);
    assert_eq!(received.msg_seq_num(), Some(2));
    assert_eq!(received.get_str(tags::SENDER_COMP_ID), Some("CLIENT"));
    assert_eq!(received.get_str(tags::TARGET_COMP_ID), Some("SERVER"));
    assert!(received.sending_time().is_some());
    assert_eq!(received.get_str(11), Some("ord-1"));
}

#[tokio::test]
async fn outbound_sequence_numbers_are_strictly_increasing() {
    let (session, _inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    let mut last = 1; // the Logon
    for i in 0..5 {
        let mut msg = FixMessage::new(MsgType::NewOrderSingle);
        msg.push_field(11, FieldValue::Str(format!("ord-{i}")));
        session.send(msg).await.unwrap();
        let seen = peer.recv().await.msg_seq_num().unwrap();
        assert_eq!(seen, last + 1);
        last = seen;
    }
}

#[tokio::test]
async fn gap_triggers_resend_request_and_ordered_recovery() {
    let (_session, mut inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    // Seqs 1 (logon) and 2 in order, then 5: a gap at 3.
    peer.send_with_seq(MsgType::ExecutionReport, 2, &exec_report("o-2"))
        .await;
    peer.send_with_seq(MsgType::ExecutionReport, 5, &exec_report("o-5"))
        .await;

    let resend = peer.recv_type(MsgType::ResendRequest).await;
    assert_eq!(resend.get_int(tags::BEGIN_SEQ_NO), Some(3));
    assert_eq!(resend.get_int(tags::END_SEQ_NO), Some(0));

    // Replay the missing range with PossDupFlag.
    let mut replay3 = exec_report("o-3");
    replay3.push(Field::bool(tags::POSS_DUP_FLAG, true));
    let mut replay4 = exec_report("o-4");
    replay4.push(Field::bool(tags::POSS_DUP_FLAG, true));
    peer.send_with_seq(MsgType::ExecutionReport, 3, &replay3).await;
    peer.send_with_seq(MsgType::ExecutionReport, 4, &replay4).await;

    // The reader observes 2, 3, 4, 5 in order, exactly once each.
    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(inbound.recv().await.unwrap().seq);
    }
    assert_eq!(seen, vec![2, 3, 4, 5]);

    // And only one ResendRequest was emitted: the next frame the peer
    // sees must be a reply to fresh traffic, not another request.
    peer.send_with_seq(MsgType::TestRequest, 6, &[Field::str(tags::TEST_REQ_ID, "alive")])
        .await;
    let next = peer.recv().await;
    assert_eq!(next.msg_type, MsgType::Heartbeat);
    assert_eq!(next.get_str(tags::TEST_REQ_ID), Some("alive"));
}

#[tokio::test]
async fn resend_request_replays_history_with_gap_fill() {
    let (session, _inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    // App messages at seqs 2 and 3.
    for i in 0..2 {
        let mut msg = FixMessage::new(MsgType::NewOrderSingle);
        msg.push_field(11, FieldValue::Str(format!("ord-{i}")));
        session.send(msg).await.unwrap();
    }
    let first = peer.recv().await;
    let original_sending_time = first.sending_time().unwrap();
    assert_eq!(first.msg_seq_num(), Some(2));
    assert_eq!(peer.recv().await.msg_seq_num(), Some(3));

    // An admin message at seq 4 (heartbeat echoing a test request).
    peer.send(MsgType::TestRequest, &[Field::str(tags::TEST_REQ_ID, "t-1")])
        .await;
    assert_eq!(peer.recv().await.msg_type, MsgType::Heartbeat);

    // One more app message at seq 5.
    let mut msg = FixMessage::new(MsgType::NewOrderSingle);
    msg.push_field(11, FieldValue::Str("ord-last".into()));
    session.send(msg).await.unwrap();
    assert_eq!(peer.recv().await.msg_seq_num(), Some(5));

    // Ask for everything back.
    peer.send(MsgType::ResendRequest, &[
        Field::int(tags::BEGIN_SEQ_NO, 2),
        Field::int(tags::END_SEQ_NO, 5),
    ])
    .await;

    // App 2 and 3 come back flagged, with the original SendingTime moved
    // into OrigSendingTime.
    let r2 = peer.recv().await;
    assert_eq!(r2.msg_type, MsgType::NewOrderSingle);
    assert_eq!(r2.msg_seq_num(), Some(2));
    assert!(r2.poss_dup());
    assert_eq!(
        r2.get(tags::ORIG_SENDING_TIME).unwrap().as_timestamp().unwrap(),
        original_sending_time
    );
    let r3 = peer.recv().await;
    assert_eq!(r3.msg_seq_num(), Some(3));
    assert!(r3.poss_dup());

    // The heartbeat at 4 collapses into a single GapFill pointing at 5.
    let gap = peer.recv().await;
    assert_eq!(gap.msg_type, MsgType::SequenceReset);
    assert_eq!(gap.msg_seq_num(), Some(4));
    assert_eq!(gap.get_bool(tags::GAP_FILL_FLAG), Some(true));
    assert_eq!(gap.get_int(tags::NEW_SEQ_NO), Some(5));

    let r5 = peer.recv().await;
    assert_eq!(r5.msg_seq_num(), Some(5));
    assert!(r5.poss_dup());
}

#[tokio::test]
async fn trailing_admin_range_resolves_to_gap_fill_past_the_end() {
    let (session, _inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    // Seq 2 app, seqs 3 and 4 admin (heartbeats via test requests).
    let mut msg = FixMessage::new(MsgType::NewOrderSingle);
    msg.push_field(11, FieldValue::Str("ord".into()));
    session.send(msg).await.unwrap();
    assert_eq!(peer.recv().await.msg_seq_num(), Some(2));
    for id in ["a", "b"] {
        peer.send(MsgType::TestRequest, &[Field::str(tags::TEST_REQ_ID, id)])
            .await;
        assert_eq!(peer.recv().await.msg_type, MsgType::Heartbeat);
    }

    peer.send(MsgType::ResendRequest, &[
        Field::int(tags::BEGIN_SEQ_NO, 2),
        Field::int(tags::END_SEQ_NO, 4),
    ])
    .await;

    let r2 = peer.recv().await;
    assert!(r2.poss_dup());
    assert_eq!(r2.msg_seq_num(), Some(2));
    let gap = peer.recv_type(MsgType::SequenceReset).await;
    assert_eq!(gap.msg_seq_num(), Some(3));
    assert_eq!(gap.get_bool(tags::GAP_FILL_FLAG), Some(true));
    // NewSeqNo points one past the requested range: the next normal send.
    assert_eq!(gap.get_int(tags::NEW_SEQ_NO), Some(5));
}

#[tokio::test]
async fn resend_past_history_bound_answers_with_sequence_reset() {
    let (client_side, server_side) = tokio::io::duplex(16 * 1024);
    let registry = FieldRegistry::fix44();
    let small_history = SessionConfig::builder()
        .sender_comp_id("CLIENT")
        .target_comp_id("SERVER")
        .heartbeat_interval(Duration::from_secs(30))
        .history_capacity(2)
        .build()
        .unwrap();
    let (session, _inbound) = connect(client_side, small_history, registry.clone());
    let mut peer = Peer::new(server_side, registry);
    peer.accept_logon().await;

    // App messages at seqs 2..=5; capacity 2 leaves only 4 and 5 in
    // history.
    for i in 0..4 {
        let mut msg = FixMessage::new(MsgType::NewOrderSingle);
        msg.push_field(11, FieldValue::Str(format!("ord-{i}")));
        session.send(msg).await.unwrap();
        peer.recv().await;
    }

    peer.send(MsgType::ResendRequest, &[
        Field::int(tags::BEGIN_SEQ_NO, 2),
        Field::int(tags::END_SEQ_NO, 5),
    ])
    .await;

    // The evicted prefix 2..=3 has no prior transmission to replay: a
    // SequenceReset-Reset with no GapFillFlag, no PossDupFlag, and no
    // OrigSendingTime, pointing at the first replayable sequence.
    let reset = peer.recv().await;
    assert_eq!(reset.msg_type, MsgType::SequenceReset);
    assert_eq!(reset.msg_seq_num(), Some(2));
    assert_eq!(reset.get_int(tags::NEW_SEQ_NO), Some(4));
    assert!(!reset.get_bool(tags::GAP_FILL_FLAG).unwrap_or(false));
    assert!(!reset.poss_dup());
    assert!(reset.get(tags::ORIG_SENDING_TIME).is_none());

    // The retained tail still replays normally.
    let r4 = peer.recv().await;
    assert_eq!(r4.msg_seq_num(), Some(4));
    assert!(r4.poss_dup());
    let r5 = peer.recv().await;
    assert_eq!(r5.msg_seq_num(), Some(5));
    assert!(r5.poss_dup());
}

#[tokio::test]
async fn sequence_reset_reset_and_stale_gap_fill() {
    let (_session, mut inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    // Reset mode applies unconditionally.
    peer.send_with_seq(MsgType::SequenceReset, 2, &[Field::int(tags::NEW_SEQ_NO, 10)])
        .await;
    peer.send_with_seq(MsgType::ExecutionReport, 10, &exec_report("o-10"))
        .await;
    assert_eq!(inbound.recv().await.unwrap().seq, 10);

    // A gap fill stamped below the expectation is ignored.
    peer.send_with_seq(
        MsgType::SequenceReset,
        5,
        &[
            Field::int(tags::NEW_SEQ_NO, 3),
            Field::bool(tags::GAP_FILL_FLAG, true),
            Field::bool(tags::POSS_DUP_FLAG, true),
        ],
    )
    .await;
    peer.send_with_seq(MsgType::ExecutionReport, 11, &exec_report("o-11"))
        .await;
    assert_eq!(inbound.recv().await.unwrap().seq, 11);
}

#[tokio::test]
async fn duplicate_without_poss_dup_is_fatal() {
    let (session, mut inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    peer.send_with_seq(MsgType::ExecutionReport, 2, &exec_report("o-2"))
        .await;
    assert_eq!(inbound.recv().await.unwrap().seq, 2);

    // Same sequence again, no PossDupFlag: RFC-mandated fatal logout.
    peer.send_with_seq(MsgType::ExecutionReport, 2, &exec_report("o-2"))
        .await;
    let logout = peer.recv_type(MsgType::Logout).await;
    assert!(logout.get_str(tags::TEXT).unwrap().contains("PossDupFlag"));

    let (reason, error) = session.closed().await;
    assert_eq!(reason, DisconnectReason::ProtocolError);
    match error {
        Some(FixError::Session(SessionError::DuplicateWithoutPossDup { seq: 2 })) => {}
        other => panic!("expected DuplicateWithoutPossDup, got {other:?}"),
    }
}

#[tokio::test]
async fn retransmission_with_poss_dup_is_delivered_as_duplicate() {
    let (_session, mut inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    peer.send_with_seq(MsgType::ExecutionReport, 2, &exec_report("o-2"))
        .await;
    assert!(!inbound.recv().await.unwrap().possible_duplicate);

    let mut dup = exec_report("o-2");
    dup.push(Field::bool(tags::POSS_DUP_FLAG, true));
    peer.send_with_seq(MsgType::ExecutionReport, 2, &dup).await;
    let redelivered = inbound.recv().await.unwrap();
    assert_eq!(redelivered.seq, 2);
    assert!(redelivered.possible_duplicate);
}

#[tokio::test]
async fn logon_rejection_surfaces_text() {
    let (client_side, server_side) = tokio::io::duplex(16 * 1024);
    let registry = FieldRegistry::fix44();
    let (session, _inbound) = connect(client_side, config(Duration::from_secs(30)), registry.clone());
    let mut peer = Peer::new(server_side, registry);

    assert_eq!(peer.recv().await.msg_type, MsgType::Logon);
    peer.send(MsgType::Logout, &[Field::str(tags::TEXT, "bad credentials")])
        .await;

    let (reason, error) = session.closed().await;
    assert_eq!(reason, DisconnectReason::ProtocolError);
    match error {
        Some(FixError::Session(SessionError::LogonRejected { text })) => {
            assert_eq!(text, "bad credentials");
        }
        other => panic!("expected LogonRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn garbled_frame_after_logon_is_fatal() {
    let (session, _inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    // A structurally valid frame with a flipped checksum digit.
    let mut msg = FixMessage::new(MsgType::Heartbeat);
    msg.push_field(tags::MSG_SEQ_NUM, FieldValue::Int(2))
        .push_field(tags::SENDER_COMP_ID, FieldValue::Str("SERVER".into()))
        .push_field(tags::TARGET_COMP_ID, FieldValue::Str("CLIENT".into()))
        .push_field(tags::SENDING_TIME, FieldValue::Timestamp(UtcTimestamp::now()));
    let mut bytes = protocol::encode(&msg).to_vec();
    let n = bytes.len();
    bytes[n - 2] = if bytes[n - 2] == b'0' { b'1' } else { b'0' };
    peer.send_raw(&bytes).await;

    let (reason, error) = session.closed().await;
    assert_eq!(reason, DisconnectReason::ProtocolError);
    match error {
        Some(FixError::Session(SessionError::HeaderError { detail })) => {
            assert!(detail.contains("checksum"), "{detail}");
        }
        other => panic!("expected HeaderError, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_value_is_answered_with_reject() {
    let (_session, _inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    // Side "Z" fails typed decoding; the engine can still name seq 2.
    peer.send_with_seq(
        MsgType::NewOrderSingle,
        2,
        &[Field::str(11, "bad-ord"), Field::str(54, "Z")],
    )
    .await;

    let reject = peer.recv_type(MsgType::Reject).await;
    assert_eq!(reject.get_int(tags::REF_SEQ_NUM), Some(2));
    assert_eq!(reject.get_int(tags::REF_TAG_ID), Some(54));
    assert_eq!(reject.get_int(tags::SESSION_REJECT_REASON), Some(6));
}

#[tokio::test]
async fn unsupported_msg_type_gets_business_reject() {
    let (_session, _inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    peer.send_with_seq(MsgType::Other("ZZ".to_string()), 2, &[]).await;

    let reject = peer.recv_type(MsgType::BusinessMessageReject).await;
    assert_eq!(reject.get_int(tags::REF_SEQ_NUM), Some(2));
    assert_eq!(reject.get_str(tags::REF_MSG_TYPE), Some("ZZ"));
    assert_eq!(reject.get_int(tags::BUSINESS_REJECT_REASON), Some(3));
}

#[tokio::test]
async fn duplicated_header_tag_is_rejected() {
    let (_session, _inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    peer.send_with_seq(
        MsgType::ExecutionReport,
        2,
        &[Field::str(tags::SENDER_COMP_ID, "SERVER"), Field::str(37, "o")],
    )
    .await;

    let reject = peer.recv_type(MsgType::Reject).await;
    assert_eq!(reject.get_int(tags::REF_TAG_ID), Some(tags::SENDER_COMP_ID as i64));
    assert_eq!(reject.get_int(tags::SESSION_REJECT_REASON), Some(13));
}

#[tokio::test]
async fn graceful_logout_handshake() {
    let (mut session, _inbound, mut peer) = start(Duration::from_secs(30));
    let mut events = session.events().unwrap();
    peer.accept_logon().await;

    session.logout().await.unwrap();
    let logout = peer.recv().await;
    assert_eq!(logout.msg_type, MsgType::Logout);
    peer.send(MsgType::Logout, &[]).await;

    let (reason, error) = session.closed().await;
    assert_eq!(reason, DisconnectReason::UserRequested);
    assert!(error.is_none());

    let mut saw = Vec::new();
    while let Ok(event) = events.try_recv() {
        saw.push(event);
    }
    assert!(saw.iter().any(|e| matches!(e, SessionEvent::LoggedOn)));
    assert!(saw.iter().any(|e| matches!(e, SessionEvent::LogoutSent)));
    assert!(saw.iter().any(|e| matches!(
        e,
        SessionEvent::Disconnected {
            reason: DisconnectReason::UserRequested
        }
    )));
}

#[tokio::test]
async fn peer_initiated_logout_is_confirmed() {
    let (session, _inbound, mut peer) = start(Duration::from_secs(30));
    peer.accept_logon().await;

    peer.send(MsgType::Logout, &[]).await;
    let confirm = peer.recv_type(MsgType::Logout).await;
    assert_eq!(confirm.get_str(tags::SENDER_COMP_ID), Some("CLIENT"));

    let (reason, error) = session.closed().await;
    assert_eq!(reason, DisconnectReason::PeerRequested);
    assert!(error.is_none());
}

#[tokio::test(start_paused = true)]
async fn heartbeat_test_request_and_watchdog_timeline() {
    let (session, _inbound, mut peer) = start(Duration::from_secs(1));
    let started = tokio::time::Instant::now();
    peer.accept_logon().await;

    // Quiet wire: a Heartbeat goes out once the interval elapses.
    let hb = peer.recv_type(MsgType::Heartbeat).await;
    assert!(hb.get_str(tags::TEST_REQ_ID).is_none());
    let at_heartbeat = started.elapsed();
    assert!(at_heartbeat >= Duration::from_secs(1), "{at_heartbeat:?}");
    assert!(at_heartbeat < Duration::from_millis(1500), "{at_heartbeat:?}");

    // Still nothing received: a TestRequest with a fresh id at 1.5x.
    let test_req = peer.recv_type(MsgType::TestRequest).await;
    assert!(!test_req.get_str(tags::TEST_REQ_ID).unwrap().is_empty());
    let at_test_req = started.elapsed();
    assert!(at_test_req >= Duration::from_millis(1500), "{at_test_req:?}");
    assert!(at_test_req < Duration::from_millis(2500), "{at_test_req:?}");

    // And at 2.5x without traffic, the session gives up.
    let (reason, error) = session.closed().await;
    assert_eq!(reason, DisconnectReason::Timeout);
    assert!(matches!(
        error,
        Some(FixError::Session(SessionError::Timeout))
    ));
    let at_close = started.elapsed();
    assert!(at_close >= Duration::from_millis(2500), "{at_close:?}");
}

#[tokio::test(start_paused = true)]
async fn heartbeat_answered_in_time_keeps_the_session_alive() {
    let (session, _inbound, mut peer) = start(Duration::from_secs(1));
    peer.accept_logon().await;

    // Answer each TestRequest by echoing its id; the session must ride
    // through several intervals.
    for _ in 0..3 {
        let msg = peer.recv().await;
        match msg.msg_type {
            MsgType::Heartbeat => {}
            MsgType::TestRequest => {
                let id = msg.get_str(tags::TEST_REQ_ID).unwrap().to_string();
                peer.send(MsgType::Heartbeat, &[Field::str(tags::TEST_REQ_ID, &id)])
                    .await;
            }
            other => panic!("unexpected {other:?} on a quiet wire"),
        }
    }

    // The session is still up: a logout round-trip completes cleanly.
    session.logout().await.unwrap();
    peer.recv_type(MsgType::Logout).await;
    peer.send(MsgType::Logout, &[]).await;
    let (reason, _) = session.closed().await;
    assert_eq!(reason, DisconnectReason::UserRequested);
}
