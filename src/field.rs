use bytes::{BufMut, BytesMut};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{CodecError, ConfigError};
use crate::types::{
    parse_yes_or_no, print_yes_or_no, Date, EncryptMethod, ExecType, MsgType, OrdStatus, OrdType,
    Side, TimeInForce, TzTimeOnly, UtcTimestamp, Version,
};

/// Well-known tag numbers used by the session layer and the base
/// dictionary.
pub mod tags {
    pub const BEGIN_SEQ_NO: u32 = 7;
    pub const BEGIN_STRING: u32 = 8;
    pub const BODY_LENGTH: u32 = 9;
    pub const CHECK_SUM: u32 = 10;
    pub const END_SEQ_NO: u32 = 16;
    pub const MSG_SEQ_NUM: u32 = 34;
    pub const MSG_TYPE: u32 = 35;
    pub const NEW_SEQ_NO: u32 = 36;
    pub const POSS_DUP_FLAG: u32 = 43;
    pub const REF_SEQ_NUM: u32 = 45;
    pub const SENDER_COMP_ID: u32 = 49;
    pub const SENDING_TIME: u32 = 52;
    pub const TARGET_COMP_ID: u32 = 56;
    pub const TEXT: u32 = 58;
    pub const RAW_DATA_LENGTH: u32 = 95;
    pub const RAW_DATA: u32 = 96;
    pub const ENCRYPT_METHOD: u32 = 98;
    pub const HEART_BT_INT: u32 = 108;
    pub const TEST_REQ_ID: u32 = 112;
    pub const ORIG_SENDING_TIME: u32 = 122;
    pub const GAP_FILL_FLAG: u32 = 123;
    pub const RESET_SEQ_NUM_FLAG: u32 = 141;
    pub const REF_TAG_ID: u32 = 371;
    pub const REF_MSG_TYPE: u32 = 372;
    pub const SESSION_REJECT_REASON: u32 = 373;
    pub const BUSINESS_REJECT_REASON: u32 = 380;
    pub const USERNAME: u32 = 553;
    pub const PASSWORD: u32 = 554;
}

/// The typed universe of FIX field values. A closed union over the value
/// kinds the core understands, with a `Raw` arm preserving tags the
/// registry does not know. Unknown-but-valid tags must flow through for
/// inspection, never be dropped.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(UtcTimestamp),
    Date(Date),
    TimeOnly(TzTimeOnly),
    Version(Version),
    MsgType(MsgType),
    Side(Side),
    OrdType(OrdType),
    OrdStatus(OrdStatus),
    TimeInForce(TimeInForce),
    ExecType(ExecType),
    EncryptMethod(EncryptMethod),
    Raw(String),
}

impl FieldValue {
    /// Wire representation of the value, exactly as it is serialized.
    pub fn wire(&self) -> String {
        match self {
            FieldValue::Str(s) | FieldValue::Raw(s) => s.clone(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Bool(b) => print_yes_or_no(*b).to_string(),
            FieldValue::Timestamp(t) => t.to_string(),
            FieldValue::Date(d) => d.to_string(),
            FieldValue::TimeOnly(t) => t.to_string(),
            FieldValue::Version(v) => v.to_string(),
            FieldValue::MsgType(m) => m.wire().to_string(),
            FieldValue::Side(s) => s.wire().to_string(),
            FieldValue::OrdType(o) => o.wire().to_string(),
            FieldValue::OrdStatus(o) => o.wire().to_string(),
            FieldValue::TimeInForce(t) => t.wire().to_string(),
            FieldValue::ExecType(e) => e.wire().to_string(),
            FieldValue::EncryptMethod(e) => e.wire().to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) | FieldValue::Raw(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            // Tolerate integers that arrived through an unregistered tag.
            FieldValue::Str(s) | FieldValue::Raw(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Str(s) | FieldValue::Raw(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Str(s) | FieldValue::Raw(s) => parse_yes_or_no(s).ok(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<UtcTimestamp> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            FieldValue::Str(s) | FieldValue::Raw(s) => UtcTimestamp::parse(s).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}

// Equality is representation equality: two values compare equal when they
// serialize to the same bytes.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.wire() == other.wire()
    }
}

impl Eq for FieldValue {}

/// One tag-value pair. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub tag: u32,
    pub value: FieldValue,
}

impl Field {
    pub fn new(tag: u32, value: FieldValue) -> Self {
        Self { tag, value }
    }

    pub fn str(tag: u32, value: impl Into<String>) -> Self {
        Self::new(tag, FieldValue::Str(value.into()))
    }

    pub fn int(tag: u32, value: i64) -> Self {
        Self::new(tag, FieldValue::Int(value))
    }

    pub fn bool(tag: u32, value: bool) -> Self {
        Self::new(tag, FieldValue::Bool(value))
    }

    pub fn wire_value(&self) -> String {
        self.value.wire()
    }
}

/// Writes `tag=value\x01` into `buf`, returning the number of bytes
/// written and their arithmetic byte-sum for the checksum feed.
pub fn encode_field(field: &Field, buf: &mut BytesMut) -> (usize, u32) {
    let start = buf.len();
    buf.put_slice(field.tag.to_string().as_bytes());
    buf.put_u8(b'=');
    buf.put_slice(field.wire_value().as_bytes());
    buf.put_u8(crate::protocol::SOH);
    let written = &buf[start..];
    let sum = written.iter().map(|b| *b as u32).sum();
    (written.len(), sum)
}

/// Splits a raw `tag=value` pair. Fails when there is no `=` or the tag
/// is not a positive integer.
pub fn parse_raw(s: &str) -> Result<(u32, &str), CodecError> {
    let (tag, value) = s.split_once('=').ok_or_else(|| CodecError::UnparseableValue {
        tag: 0,
        reason: format!("not a tag=value pair: {s:?}"),
    })?;
    let tag = tag.parse::<u32>().map_err(|_| CodecError::UnparseableValue {
        tag: 0,
        reason: format!("non-integer tag: {tag:?}"),
    })?;
    Ok((tag, value))
}

type FieldParser = fn(u32, &str) -> Result<FieldValue, CodecError>;

/// Descriptor for one known tag: its printable name and the parser that
/// turns raw wire text into a typed value.
#[derive(Clone)]
pub struct FieldDef {
    pub tag: u32,
    pub name: &'static str,
    pub parse: FieldParser,
}

impl FieldDef {
    pub fn new(tag: u32, name: &'static str, parse: FieldParser) -> Self {
        Self { tag, name, parse }
    }

    // Typed constructors for extension code: venue adapters register
    // their tags without reaching into the parser table.

    pub fn str_field(tag: u32, name: &'static str) -> Self {
        Self::new(tag, name, p_str)
    }

    pub fn int_field(tag: u32, name: &'static str) -> Self {
        Self::new(tag, name, p_int)
    }

    pub fn float_field(tag: u32, name: &'static str) -> Self {
        Self::new(tag, name, p_float)
    }

    pub fn bool_field(tag: u32, name: &'static str) -> Self {
        Self::new(tag, name, p_bool)
    }

    pub fn timestamp_field(tag: u32, name: &'static str) -> Self {
        Self::new(tag, name, p_timestamp)
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("tag", &self.tag)
            .field("name", &self.name)
            .finish()
    }
}

// Parsers for the base dictionary. Each maps one raw value to one typed
// arm; failures carry the offending tag.

fn p_str(_tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    Ok(FieldValue::Str(raw.to_string()))
}

fn p_int(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    raw.parse::<i64>()
        .map(FieldValue::Int)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("not an integer: {raw:?}"),
        })
}

fn p_float(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    raw.parse::<f64>()
        .map(FieldValue::Float)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("not a number: {raw:?}"),
        })
}

fn p_bool(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    parse_yes_or_no(raw)
        .map(FieldValue::Bool)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("expected Y or N, got {raw:?}"),
        })
}

fn p_timestamp(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    UtcTimestamp::parse(raw)
        .map(FieldValue::Timestamp)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad UTC timestamp: {raw:?}"),
        })
}

fn p_date(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    Date::parse(raw)
        .map(FieldValue::Date)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad date: {raw:?}"),
        })
}

fn p_time_only(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    TzTimeOnly::parse(raw)
        .map(FieldValue::TimeOnly)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad time of day: {raw:?}"),
        })
}

fn p_version(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    Version::parse(raw)
        .map(FieldValue::Version)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad version: {raw:?}"),
        })
}

fn p_msg_type(_tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    Ok(FieldValue::MsgType(MsgType::parse(raw)))
}

fn p_side(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    Side::parse(raw)
        .map(FieldValue::Side)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad side: {raw:?}"),
        })
}

fn p_ord_type(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    OrdType::parse(raw)
        .map(FieldValue::OrdType)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad order type: {raw:?}"),
        })
}

fn p_ord_status(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    OrdStatus::parse(raw)
        .map(FieldValue::OrdStatus)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad order status: {raw:?}"),
        })
}

fn p_tif(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    TimeInForce::parse(raw)
        .map(FieldValue::TimeInForce)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad time in force: {raw:?}"),
        })
}

fn p_exec_type(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    ExecType::parse(raw)
        .map(FieldValue::ExecType)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad exec type: {raw:?}"),
        })
}

fn p_encrypt_method(tag: u32, raw: &str) -> Result<FieldValue, CodecError> {
    EncryptMethod::parse(raw)
        .map(FieldValue::EncryptMethod)
        .map_err(|_| CodecError::UnparseableValue {
            tag,
            reason: format!("bad encrypt method: {raw:?}"),
        })
}

/// The FIX 4.4 base dictionary: every tag the session layer touches plus
/// the common application-message tags.
fn fix44_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new(1, "Account", p_str),
        FieldDef::new(6, "AvgPx", p_float),
        FieldDef::new(7, "BeginSeqNo", p_int),
        FieldDef::new(8, "BeginString", p_version),
        FieldDef::new(9, "BodyLength", p_int),
        FieldDef::new(10, "CheckSum", p_str),
        FieldDef::new(11, "ClOrdID", p_str),
        FieldDef::new(12, "Commission", p_float),
        FieldDef::new(14, "CumQty", p_float),
        FieldDef::new(15, "Currency", p_str),
        FieldDef::new(16, "EndSeqNo", p_int),
        FieldDef::new(17, "ExecID", p_str),
        FieldDef::new(18, "ExecInst", p_str),
        FieldDef::new(19, "ExecRefID", p_str),
        FieldDef::new(21, "HandlInst", p_str),
        FieldDef::new(22, "SecurityIDSource", p_str),
        FieldDef::new(31, "LastPx", p_float),
        FieldDef::new(32, "LastQty", p_float),
        FieldDef::new(34, "MsgSeqNum", p_int),
        FieldDef::new(35, "MsgType", p_msg_type),
        FieldDef::new(36, "NewSeqNo", p_int),
        FieldDef::new(37, "OrderID", p_str),
        FieldDef::new(38, "OrderQty", p_float),
        FieldDef::new(39, "OrdStatus", p_ord_status),
        FieldDef::new(40, "OrdType", p_ord_type),
        FieldDef::new(41, "OrigClOrdID", p_str),
        FieldDef::new(43, "PossDupFlag", p_bool),
        FieldDef::new(44, "Price", p_float),
        FieldDef::new(45, "RefSeqNum", p_int),
        FieldDef::new(48, "SecurityID", p_str),
        FieldDef::new(49, "SenderCompID", p_str),
        FieldDef::new(50, "SenderSubID", p_str),
        FieldDef::new(52, "SendingTime", p_timestamp),
        FieldDef::new(54, "Side", p_side),
        FieldDef::new(55, "Symbol", p_str),
        FieldDef::new(56, "TargetCompID", p_str),
        FieldDef::new(57, "TargetSubID", p_str),
        FieldDef::new(58, "Text", p_str),
        FieldDef::new(59, "TimeInForce", p_tif),
        FieldDef::new(60, "TransactTime", p_timestamp),
        FieldDef::new(64, "SettlDate", p_date),
        FieldDef::new(75, "TradeDate", p_date),
        FieldDef::new(95, "RawDataLength", p_int),
        FieldDef::new(96, "RawData", p_str),
        FieldDef::new(97, "PossResend", p_bool),
        FieldDef::new(98, "EncryptMethod", p_encrypt_method),
        FieldDef::new(99, "StopPx", p_float),
        FieldDef::new(102, "CxlRejReason", p_int),
        FieldDef::new(103, "OrdRejReason", p_int),
        FieldDef::new(108, "HeartBtInt", p_int),
        FieldDef::new(112, "TestReqID", p_str),
        FieldDef::new(122, "OrigSendingTime", p_timestamp),
        FieldDef::new(123, "GapFillFlag", p_bool),
        FieldDef::new(131, "QuoteReqID", p_str),
        FieldDef::new(141, "ResetSeqNumFlag", p_bool),
        FieldDef::new(146, "NoRelatedSym", p_int),
        FieldDef::new(150, "ExecType", p_exec_type),
        FieldDef::new(151, "LeavesQty", p_float),
        FieldDef::new(262, "MDReqID", p_str),
        FieldDef::new(263, "SubscriptionRequestType", p_str),
        FieldDef::new(264, "MarketDepth", p_int),
        FieldDef::new(265, "MDUpdateType", p_int),
        FieldDef::new(267, "NoMDEntryTypes", p_int),
        FieldDef::new(268, "NoMDEntries", p_int),
        FieldDef::new(269, "MDEntryType", p_str),
        FieldDef::new(270, "MDEntryPx", p_float),
        FieldDef::new(271, "MDEntrySize", p_float),
        FieldDef::new(272, "MDEntryDate", p_date),
        FieldDef::new(273, "MDEntryTime", p_time_only),
        FieldDef::new(279, "MDUpdateAction", p_str),
        FieldDef::new(281, "MDReqRejReason", p_str),
        FieldDef::new(336, "TradingSessionID", p_str),
        FieldDef::new(371, "RefTagID", p_int),
        FieldDef::new(372, "RefMsgType", p_str),
        FieldDef::new(373, "SessionRejectReason", p_int),
        FieldDef::new(380, "BusinessRejectReason", p_int),
        FieldDef::new(382, "NoContraBrokers", p_int),
        FieldDef::new(375, "ContraBroker", p_str),
        FieldDef::new(448, "PartyID", p_str),
        FieldDef::new(452, "PartyRole", p_int),
        FieldDef::new(453, "NoPartyIDs", p_int),
        FieldDef::new(553, "Username", p_str),
        FieldDef::new(554, "Password", p_str),
        FieldDef::new(555, "NoLegs", p_int),
        FieldDef::new(600, "LegSymbol", p_str),
        FieldDef::new(625, "TradingSessionSubID", p_str),
    ]
}

/// Process-wide catalog of field descriptors. Built once at startup,
/// sealed into an `Arc`, and handed to every codec/session; there is no
/// mutation API after [`FieldRegistryBuilder::build`].
#[derive(Debug)]
pub struct FieldRegistry {
    by_tag: HashMap<u32, FieldDef>,
    by_name: HashMap<&'static str, u32>,
}

impl FieldRegistry {
    pub fn builder() -> FieldRegistryBuilder {
        FieldRegistryBuilder::default()
    }

    /// Registry with the FIX 4.4 base dictionary and nothing else.
    pub fn fix44() -> Arc<FieldRegistry> {
        FieldRegistry::builder()
            .with_fix44_fields()
            .build()
            .expect("base dictionary has no collisions")
    }

    pub fn name_of(&self, tag: u32) -> Option<&'static str> {
        self.by_tag.get(&tag).map(|d| d.name)
    }

    pub fn tag_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Descriptor lookup that fails with [`CodecError::UnknownTag`] when
    /// the tag is unregistered.
    pub fn require(&self, tag: u32) -> Result<&FieldDef, CodecError> {
        self.by_tag.get(&tag).ok_or(CodecError::UnknownTag(tag))
    }

    /// Decodes one raw value through the tag's descriptor. Unknown tags
    /// are preserved as opaque [`FieldValue::Raw`] fields.
    pub fn decode_field(&self, tag: u32, raw: &str) -> Result<Field, CodecError> {
        if raw.is_empty() {
            return Err(CodecError::EmptyValue { tag });
        }
        match self.by_tag.get(&tag) {
            Some(def) => Ok(Field::new(tag, (def.parse)(tag, raw)?)),
            None => {
                tracing::trace!(tag, "unregistered tag preserved as raw");
                Ok(Field::new(tag, FieldValue::Raw(raw.to_string())))
            }
        }
    }

    /// Debug rendering, `Name(tag)=value` when the tag is known.
    pub fn render(&self, field: &Field) -> String {
        match self.name_of(field.tag) {
            Some(name) => format!("{}({})={}", name, field.tag, field.wire_value()),
            None => format!("{}={}", field.tag, field.wire_value()),
        }
    }
}

#[derive(Debug, Default)]
pub struct FieldRegistryBuilder {
    by_tag: HashMap<u32, FieldDef>,
    by_name: HashMap<&'static str, u32>,
}

impl FieldRegistryBuilder {
    pub fn with_fix44_fields(mut self) -> Self {
        for def in fix44_fields() {
            // The base table is collision-free by construction.
            self.by_name.insert(def.name, def.tag);
            self.by_tag.insert(def.tag, def);
        }
        self
    }

    /// Registers an extension descriptor (venue adapters call this before
    /// any session starts). Colliding tags or names are a startup error.
    pub fn register(&mut self, def: FieldDef) -> Result<(), ConfigError> {
        if self.by_tag.contains_key(&def.tag) {
            return Err(ConfigError::RegistryCollision {
                what: format!("tag {}", def.tag),
            });
        }
        if self.by_name.contains_key(def.name) {
            return Err(ConfigError::RegistryCollision {
                what: format!("name {:?}", def.name),
            });
        }
        self.by_name.insert(def.name, def.tag);
        self.by_tag.insert(def.tag, def);
        Ok(())
    }

    pub fn build(self) -> Result<Arc<FieldRegistry>, ConfigError> {
        Ok(Arc::new(FieldRegistry {
            by_tag: self.by_tag,
            by_name: self.by_name,
        }))
    }
}
