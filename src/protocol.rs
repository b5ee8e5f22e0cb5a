use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CodecError;
use crate::field::{encode_field, parse_raw, tags, Field, FieldRegistry, FieldValue};
use crate::types::{MsgType, UtcTimestamp, Version};

pub const SOH: u8 = 0x01; // ASCII control-A

/// Length of the fixed trailer: `10=` + three digits + SOH.
const TRAILER_LEN: usize = 7;

/// Count-tag to delimiter-tag table for the repeating groups the core
/// understands. The delimiter opens every block of the group.
const GROUP_DELIMITERS: &[(u32, u32)] = &[
    (146, 55),  // NoRelatedSym -> Symbol
    (267, 269), // NoMDEntryTypes -> MDEntryType
    (268, 269), // NoMDEntries -> MDEntryType
    (382, 375), // NoContraBrokers -> ContraBroker
    (453, 448), // NoPartyIDs -> PartyID
    (555, 600), // NoLegs -> LegSymbol
];

pub fn group_delimiter(count_tag: u32) -> Option<u32> {
    GROUP_DELIMITERS
        .iter()
        .find(|(count, _)| *count == count_tag)
        .map(|(_, delim)| *delim)
}

/// A repeating group: a count field followed by `blocks.len()` field
/// blocks, each beginning with the group's delimiter tag. Field order
/// within a block is preserved exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatingGroup {
    pub count_tag: u32,
    pub blocks: Vec<Vec<Field>>,
}

/// One element of a message body, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageItem {
    Field(Field),
    Group(RepeatingGroup),
}

/// A FIX message: its type plus an ordered body of fields and repeating
/// groups. The standard framing fields (8, 9, 10) and the MsgType itself
/// never appear in `body`; header fields such as MsgSeqNum and
/// SendingTime do, in the order they were received or pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct FixMessage {
    pub begin_string: Version,
    pub msg_type: MsgType,
    pub body: Vec<MessageItem>,
}

impl FixMessage {
    pub fn new(msg_type: MsgType) -> Self {
        Self {
            begin_string: Version::FIX44,
            msg_type,
            body: Vec::new(),
        }
    }

    pub fn push_field(&mut self, tag: u32, value: FieldValue) -> &mut Self {
        self.body.push(MessageItem::Field(Field::new(tag, value)));
        self
    }

    pub fn push_group(&mut self, group: RepeatingGroup) -> &mut Self {
        self.body.push(MessageItem::Group(group));
        self
    }

    /// First top-level field with the given tag.
    pub fn get(&self, tag: u32) -> Option<&FieldValue> {
        self.fields().find(|f| f.tag == tag).map(|f| &f.value)
    }

    pub fn get_str(&self, tag: u32) -> Option<&str> {
        self.get(tag).and_then(|v| v.as_str())
    }

    pub fn get_int(&self, tag: u32) -> Option<i64> {
        self.get(tag).and_then(|v| v.as_int())
    }

    pub fn get_bool(&self, tag: u32) -> Option<bool> {
        self.get(tag).and_then(|v| v.as_bool())
    }

    pub fn get_group(&self, count_tag: u32) -> Option<&RepeatingGroup> {
        self.body.iter().find_map(|item| match item {
            MessageItem::Group(g) if g.count_tag == count_tag => Some(g),
            _ => None,
        })
    }

    /// Top-level fields in order, skipping group contents.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.body.iter().filter_map(|item| match item {
            MessageItem::Field(f) => Some(f),
            MessageItem::Group(_) => None,
        })
    }

    pub fn msg_seq_num(&self) -> Option<u32> {
        self.get_int(tags::MSG_SEQ_NUM).map(|n| n as u32)
    }

    pub fn poss_dup(&self) -> bool {
        self.get_bool(tags::POSS_DUP_FLAG).unwrap_or(false)
    }

    pub fn sending_time(&self) -> Option<UtcTimestamp> {
        self.get(tags::SENDING_TIME).and_then(|v| v.as_timestamp())
    }
}

fn compute_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Encodes a message with full framing: `8=` first, `9=` second, `35=`
/// third, `10=` (three digits) last. Body items are emitted in the order
/// the caller pushed them; group blocks keep their internal order.
pub fn encode(msg: &FixMessage) -> Bytes {
    let mut body = BytesMut::with_capacity(256);
    encode_field(
        &Field::new(tags::MSG_TYPE, FieldValue::MsgType(msg.msg_type.clone())),
        &mut body,
    );
    for item in &msg.body {
        match item {
            MessageItem::Field(f) => {
                encode_field(f, &mut body);
            }
            MessageItem::Group(g) => {
                encode_field(
                    &Field::int(g.count_tag, g.blocks.len() as i64),
                    &mut body,
                );
                for block in &g.blocks {
                    for f in block {
                        encode_field(f, &mut body);
                    }
                }
            }
        }
    }

    let mut out = BytesMut::with_capacity(body.len() + 32);
    encode_field(
        &Field::new(tags::BEGIN_STRING, FieldValue::Version(msg.begin_string)),
        &mut out,
    );
    encode_field(&Field::int(tags::BODY_LENGTH, body.len() as i64), &mut out);
    out.extend_from_slice(&body);

    let checksum = compute_checksum(&out);
    out.put_slice(b"10=");
    out.put_slice(format!("{:03}", checksum).as_bytes());
    out.put_u8(SOH);
    out.freeze()
}

/// Decodes one complete frame into a message, validating the framing
/// invariants and the checksum, then typing every body field through the
/// registry.
pub fn decode(buf: &[u8], registry: &FieldRegistry) -> Result<FixMessage, CodecError> {
    // 8=BeginString
    if !buf.starts_with(b"8=") {
        return Err(CodecError::MalformedHeader);
    }
    let begin_end = memchr::memchr(SOH, buf).ok_or(CodecError::MalformedHeader)?;
    let begin_string = field_str(&buf[2..begin_end])?;
    let begin_string = Version::parse(begin_string).map_err(|_| CodecError::UnparseableValue {
        tag: tags::BEGIN_STRING,
        reason: format!("bad BeginString: {begin_string:?}"),
    })?;

    // 9=BodyLength
    let rest = &buf[begin_end + 1..];
    if !rest.starts_with(b"9=") {
        return Err(CodecError::MalformedHeader);
    }
    let len_end = memchr::memchr(SOH, rest).ok_or(CodecError::MalformedHeader)?;
    let body_len: usize = field_str(&rest[2..len_end])?
        .parse()
        .map_err(|_| CodecError::MalformedHeader)?;

    // Exactly body_len bytes of body, then the trailer.
    let body_start = begin_end + 1 + len_end + 1;
    let trailer_start = body_start + body_len;
    if buf.len() < trailer_start + TRAILER_LEN {
        return Err(CodecError::Truncated);
    }
    let trailer = &buf[trailer_start..trailer_start + TRAILER_LEN];
    if !trailer.starts_with(b"10=") || trailer[TRAILER_LEN - 1] != SOH {
        return Err(CodecError::MalformedHeader);
    }
    let expected: u8 = field_str(&trailer[3..6])?
        .parse()
        .map_err(|_| CodecError::UnparseableValue {
            tag: tags::CHECK_SUM,
            reason: "checksum is not a three-digit number".to_string(),
        })?;
    let computed = compute_checksum(&buf[..trailer_start]);
    if computed != expected {
        return Err(CodecError::BadChecksum { expected, computed });
    }

    let body = &buf[body_start..trailer_start];
    if !body.ends_with(&[SOH]) {
        return Err(CodecError::MalformedHeader);
    }

    // Split into raw pairs, then type them, folding repeating groups.
    let mut raws = Vec::new();
    for piece in body[..body.len() - 1].split(|b| *b == SOH) {
        raws.push(parse_raw(field_str(piece)?)?);
    }

    let mut msg_type: Option<MsgType> = None;
    let mut items: Vec<MessageItem> = Vec::with_capacity(raws.len());
    let mut i = 0;
    while i < raws.len() {
        let (tag, raw) = raws[i];
        if msg_type.is_none() {
            if tag != tags::MSG_TYPE {
                return Err(CodecError::MalformedHeader);
            }
            msg_type = Some(MsgType::parse(raw));
            i += 1;
            continue;
        }
        match group_delimiter(tag) {
            Some(delim) => {
                let count = raw.parse::<usize>().map_err(|_| CodecError::UnparseableValue {
                    tag,
                    reason: format!("group count is not an integer: {raw:?}"),
                })?;
                i += 1;
                let (group, consumed) =
                    decode_group(tag, delim, count, &raws[i..], registry)?;
                i += consumed;
                items.push(MessageItem::Group(group));
            }
            None => {
                if seen_duplicate(&items, tag) {
                    tracing::debug!(tag, "duplicate tag in message body");
                }
                items.push(MessageItem::Field(registry.decode_field(tag, raw)?));
                i += 1;
            }
        }
    }

    Ok(FixMessage {
        begin_string,
        msg_type: msg_type.ok_or(CodecError::MalformedHeader)?,
        body: items,
    })
}

/// Consumes `count` delimiter-initiated blocks. Blocks end at the next
/// delimiter occurrence; the final block extends to the start of another
/// known group or the end of the body. The engine always places groups
/// after scalar fields, so round-trips are exact.
fn decode_group(
    count_tag: u32,
    delim: u32,
    count: usize,
    raws: &[(u32, &str)],
    registry: &FieldRegistry,
) -> Result<(RepeatingGroup, usize), CodecError> {
    let mut blocks = Vec::with_capacity(count);
    let mut i = 0;
    while blocks.len() < count {
        match raws.get(i) {
            Some((tag, _)) if *tag == delim => {}
            _ => {
                return Err(CodecError::UnparseableValue {
                    tag: count_tag,
                    reason: format!(
                        "group declares {count} blocks but block {} does not begin with tag {delim}",
                        blocks.len() + 1
                    ),
                });
            }
        }
        let mut block = Vec::new();
        block.push(registry.decode_field(raws[i].0, raws[i].1)?);
        i += 1;
        while let Some((tag, raw)) = raws.get(i) {
            // The delimiter opens the next block; another count tag opens
            // the next group.
            if *tag == delim || group_delimiter(*tag).is_some() {
                break;
            }
            block.push(registry.decode_field(*tag, raw)?);
            i += 1;
        }
        blocks.push(block);
    }
    Ok((RepeatingGroup { count_tag, blocks }, i))
}

fn seen_duplicate(items: &[MessageItem], tag: u32) -> bool {
    items.iter().any(|item| matches!(item, MessageItem::Field(f) if f.tag == tag))
}

fn field_str(bytes: &[u8]) -> Result<&str, CodecError> {
    std::str::from_utf8(bytes).map_err(|_| CodecError::UnparseableValue {
        tag: 0,
        reason: "non-utf8 field".to_string(),
    })
}

/// Best-effort scan of a frame's raw pairs, used to name a referent
/// (RefSeqNum / RefMsgType) in a Reject when full decoding failed.
pub fn scan_header(buf: &[u8]) -> Option<(u32, String)> {
    let mut seq = None;
    let mut msg_type = None;
    for piece in buf.split(|b| *b == SOH) {
        let s = std::str::from_utf8(piece).ok()?;
        if let Ok((tag, raw)) = parse_raw(s) {
            match tag {
                tags::MSG_SEQ_NUM => seq = raw.parse::<u32>().ok(),
                tags::MSG_TYPE => msg_type = Some(raw.to_string()),
                _ => {}
            }
        }
        if let (Some(s), Some(m)) = (seq, msg_type.as_ref()) {
            return Some((s, m.clone()));
        }
    }
    None
}

/// Accumulates transport bytes and carves complete frames out of them.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns one complete raw frame when the buffer holds one,
    /// `Ok(None)` when more bytes are needed, and `MalformedHeader` when
    /// the stream provably does not begin with `8=...\x019=<n>\x01`.
    pub fn try_frame(&mut self) -> Result<Option<Bytes>, CodecError> {
        let data: &[u8] = self.buf.as_ref();
        if data.is_empty() {
            return Ok(None);
        }
        if !data.starts_with(&b"8="[..data.len().min(2)]) {
            return Err(CodecError::MalformedHeader);
        }
        let begin_end = match memchr::memchr(SOH, data) {
            Some(i) => i,
            None => return Ok(None),
        };
        let rest = &data[begin_end + 1..];
        if !rest.starts_with(&b"9="[..rest.len().min(2)]) {
            if rest.len() >= 2 {
                return Err(CodecError::MalformedHeader);
            }
            return Ok(None);
        }
        let len_end = match memchr::memchr(SOH, rest) {
            Some(i) => i,
            None => return Ok(None),
        };
        let body_len: usize = match std::str::from_utf8(&rest[2..len_end])
            .ok()
            .and_then(|s| s.parse().ok())
        {
            Some(n) => n,
            None => return Err(CodecError::MalformedHeader),
        };
        let total = begin_end + 1 + len_end + 1 + body_len + TRAILER_LEN;
        if data.len() < total {
            return Ok(None);
        }
        Ok(Some(self.buf.split_to(total).freeze()))
    }
}
