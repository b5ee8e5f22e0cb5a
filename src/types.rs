use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use std::fmt;

use crate::error::CodecError;

fn unparseable(value: &str) -> CodecError {
    CodecError::UnknownEnumValue {
        value: value.to_string(),
    }
}

fn bad_scalar(kind: &str, value: &str) -> CodecError {
    CodecError::UnparseableValue {
        tag: 0,
        reason: format!("bad {kind}: {value:?}"),
    }
}

/// UTC timestamp in FIX wire form: `YYYYMMDD-HH:MM:SS` with optional
/// `.sss` milliseconds. Printing emits the millisecond form only when the
/// fractional part is nonzero, so values round-trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcTimestamp(NaiveDateTime);

impl UtcTimestamp {
    pub fn new(dt: NaiveDateTime) -> Self {
        Self(truncate_to_millis(dt))
    }

    /// Current wall-clock time, millisecond precision.
    pub fn now() -> Self {
        Self::new(Utc::now().naive_utc())
    }

    pub fn parse(s: &str) -> Result<Self, CodecError> {
        let (base, millis) = match s.split_once('.') {
            Some((base, frac)) => {
                if frac.len() != 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(bad_scalar("UTC timestamp", s));
                }
                (base, frac.parse::<u32>().map_err(|_| bad_scalar("UTC timestamp", s))?)
            }
            None => (s, 0),
        };
        let dt = NaiveDateTime::parse_from_str(base, "%Y%m%d-%H:%M:%S")
            .map_err(|_| bad_scalar("UTC timestamp", s))?;
        Ok(Self(dt + chrono::Duration::milliseconds(millis as i64)))
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.0)
    }

    pub fn millis(&self) -> u32 {
        self.0.and_utc().timestamp_subsec_millis()
    }
}

fn truncate_to_millis(dt: NaiveDateTime) -> NaiveDateTime {
    let nanos = dt.and_utc().timestamp_subsec_nanos();
    dt - chrono::Duration::nanoseconds((nanos % 1_000_000) as i64)
}

impl fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.millis();
        if millis == 0 {
            write!(f, "{}", self.0.format("%Y%m%d-%H:%M:%S"))
        } else {
            write!(f, "{}.{:03}", self.0.format("%Y%m%d-%H:%M:%S"), millis)
        }
    }
}

/// Local date, `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDate);

impl Date {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn parse(s: &str) -> Result<Self, CodecError> {
        if s.len() != 8 {
            return Err(bad_scalar("date", s));
        }
        NaiveDate::parse_from_str(s, "%Y%m%d")
            .map(Self)
            .map_err(|_| bad_scalar("date", s))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

/// Timezone suffix of a [`TzTimeOnly`], kept verbatim so the value prints
/// back in the form it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TzSuffix {
    None,
    Utc,
    Offset { hours: i8, minutes: Option<u8> },
}

/// Time of day with optional milliseconds and optional timezone:
/// `HH:MM:SS[.sss][Z|+HH|-HH|+HH:MM|-HH:MM]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TzTimeOnly {
    time: NaiveTime,
    millis: Option<u32>,
    suffix: TzSuffix,
}

impl TzTimeOnly {
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        // Split off the timezone suffix first.
        let (rest, suffix) = if let Some(stripped) = s.strip_suffix('Z') {
            (stripped, TzSuffix::Utc)
        } else if let Some(sign_pos) = s.get(1..).and_then(|t| t.rfind(['+', '-'])).map(|i| i + 1) {
            let (head, tz) = s.split_at(sign_pos);
            let sign: i8 = if tz.starts_with('-') { -1 } else { 1 };
            let tz = &tz[1..];
            let (hours, minutes) = match tz.split_once(':') {
                Some((h, m)) => (
                    h.parse::<i8>().map_err(|_| bad_scalar("time of day", s))?,
                    Some(m.parse::<u8>().map_err(|_| bad_scalar("time of day", s))?),
                ),
                None => (tz.parse::<i8>().map_err(|_| bad_scalar("time of day", s))?, None),
            };
            (
                head,
                TzSuffix::Offset {
                    hours: sign * hours,
                    minutes,
                },
            )
        } else {
            (s, TzSuffix::None)
        };

        let (base, millis) = match rest.split_once('.') {
            Some((base, frac)) => {
                if frac.len() != 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(bad_scalar("time of day", s));
                }
                (base, Some(frac.parse::<u32>().map_err(|_| bad_scalar("time of day", s))?))
            }
            None => (rest, None),
        };
        let time = NaiveTime::parse_from_str(base, "%H:%M:%S").map_err(|_| bad_scalar("time of day", s))?;
        Ok(Self {
            time,
            millis,
            suffix,
        })
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }
}

impl fmt::Display for TzTimeOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%H:%M:%S"))?;
        if let Some(ms) = self.millis {
            write!(f, ".{:03}", ms)?;
        }
        match self.suffix {
            TzSuffix::None => Ok(()),
            TzSuffix::Utc => write!(f, "Z"),
            TzSuffix::Offset { hours, minutes } => {
                write!(f, "{}{:02}", if hours < 0 { '-' } else { '+' }, hours.abs())?;
                if let Some(m) = minutes {
                    write!(f, ":{:02}", m)?;
                }
                Ok(())
            }
        }
    }
}

/// FIX protocol version, `FIX.m.n` or `FIXT.m.n` (tag 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    Fix(u8, u8),
    Fixt(u8, u8),
}

impl Version {
    pub const FIX44: Version = Version::Fix(4, 4);
    pub const FIX42: Version = Version::Fix(4, 2);
    pub const FIXT11: Version = Version::Fixt(1, 1);

    pub fn parse(s: &str) -> Result<Self, CodecError> {
        let (ctor, rest): (fn(u8, u8) -> Version, &str) =
            if let Some(rest) = s.strip_prefix("FIXT.") {
                (Version::Fixt, rest)
            } else if let Some(rest) = s.strip_prefix("FIX.") {
                (Version::Fix, rest)
            } else {
                return Err(bad_scalar("version", s));
            };
        let (major, minor) = rest.split_once('.').ok_or_else(|| bad_scalar("version", s))?;
        Ok(ctor(
            major.parse().map_err(|_| bad_scalar("version", s))?,
            minor.parse().map_err(|_| bad_scalar("version", s))?,
        ))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Fix(m, n) => write!(f, "FIX.{}.{}", m, n),
            Version::Fixt(m, n) => write!(f, "FIXT.{}.{}", m, n),
        }
    }
}

/// Message type (tag 35). Administrative types are handled inside the
/// session engine; application types flow through to the reader pipe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MsgType {
    Heartbeat,
    TestRequest,
    ResendRequest,
    Reject,
    SequenceReset,
    Logout,
    Logon,
    NewOrderSingle,
    OrderCancelRequest,
    OrderCancelReplaceRequest,
    OrderStatusRequest,
    ExecutionReport,
    OrderCancelReject,
    BusinessMessageReject,
    MarketDataRequest,
    MarketDataSnapshot,
    MarketDataIncrementalRefresh,
    MarketDataRequestReject,
    SecurityListRequest,
    SecurityList,
    Other(String),
}

impl MsgType {
    pub fn parse(s: &str) -> Self {
        match s {
            "0" => MsgType::Heartbeat,
            "1" => MsgType::TestRequest,
            "2" => MsgType::ResendRequest,
            "3" => MsgType::Reject,
            "4" => MsgType::SequenceReset,
            "5" => MsgType::Logout,
            "A" => MsgType::Logon,
            "D" => MsgType::NewOrderSingle,
            "F" => MsgType::OrderCancelRequest,
            "G" => MsgType::OrderCancelReplaceRequest,
            "H" => MsgType::OrderStatusRequest,
            "8" => MsgType::ExecutionReport,
            "9" => MsgType::OrderCancelReject,
            "j" => MsgType::BusinessMessageReject,
            "V" => MsgType::MarketDataRequest,
            "W" => MsgType::MarketDataSnapshot,
            "X" => MsgType::MarketDataIncrementalRefresh,
            "Y" => MsgType::MarketDataRequestReject,
            "x" => MsgType::SecurityListRequest,
            "y" => MsgType::SecurityList,
            other => MsgType::Other(other.to_string()),
        }
    }

    pub fn wire(&self) -> &str {
        match self {
            MsgType::Heartbeat => "0",
            MsgType::TestRequest => "1",
            MsgType::ResendRequest => "2",
            MsgType::Reject => "3",
            MsgType::SequenceReset => "4",
            MsgType::Logout => "5",
            MsgType::Logon => "A",
            MsgType::NewOrderSingle => "D",
            MsgType::OrderCancelRequest => "F",
            MsgType::OrderCancelReplaceRequest => "G",
            MsgType::OrderStatusRequest => "H",
            MsgType::ExecutionReport => "8",
            MsgType::OrderCancelReject => "9",
            MsgType::BusinessMessageReject => "j",
            MsgType::MarketDataRequest => "V",
            MsgType::MarketDataSnapshot => "W",
            MsgType::MarketDataIncrementalRefresh => "X",
            MsgType::MarketDataRequestReject => "Y",
            MsgType::SecurityListRequest => "x",
            MsgType::SecurityList => "y",
            MsgType::Other(s) => s.as_str(),
        }
    }

    /// MsgType in {0, 1, 2, 3, 4, 5, A}: owned by the session layer,
    /// never delivered to the application.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            MsgType::Heartbeat
                | MsgType::TestRequest
                | MsgType::ResendRequest
                | MsgType::Reject
                | MsgType::SequenceReset
                | MsgType::Logout
                | MsgType::Logon
        )
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire())
    }
}

/// Side of an order (tag 54), full FIX 4.4 code set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
    BuyMinus,
    SellPlus,
    SellShort,
    SellShortExempt,
    Undisclosed,
    Cross,
    CrossShort,
}

impl Side {
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        Ok(match s {
            "1" => Side::Buy,
            "2" => Side::Sell,
            "3" => Side::BuyMinus,
            "4" => Side::SellPlus,
            "5" => Side::SellShort,
            "6" => Side::SellShortExempt,
            "7" => Side::Undisclosed,
            "8" => Side::Cross,
            "9" => Side::CrossShort,
            other => return Err(unparseable(other)),
        })
    }

    pub fn wire(&self) -> &'static str {
        match self {
            Side::Buy => "1",
            Side::Sell => "2",
            Side::BuyMinus => "3",
            Side::SellPlus => "4",
            Side::SellShort => "5",
            Side::SellShortExempt => "6",
            Side::Undisclosed => "7",
            Side::Cross => "8",
            Side::CrossShort => "9",
        }
    }
}

/// Order type (tag 40), full FIX 4.4 code set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrdType {
    Market,
    Limit,
    Stop,
    StopLimit,
    WithOrWithout,
    LimitOrBetter,
    LimitWithOrWithout,
    OnBasis,
    OnClose,
    LimitOnClose,
    PreviouslyQuoted,
    PreviouslyIndicated,
    ForexSwap,
    Funari,
    MarketIfTouched,
    MarketWithLeftoverAsLimit,
    PreviousFundValuationPoint,
    NextFundValuationPoint,
    Pegged,
}

impl OrdType {
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        Ok(match s {
            "1" => OrdType::Market,
            "2" => OrdType::Limit,
            "3" => OrdType::Stop,
            "4" => OrdType::StopLimit,
            "6" => OrdType::WithOrWithout,
            "7" => OrdType::LimitOrBetter,
            "8" => OrdType::LimitWithOrWithout,
            "9" => OrdType::OnBasis,
            "A" => OrdType::OnClose,
            "B" => OrdType::LimitOnClose,
            "D" => OrdType::PreviouslyQuoted,
            "E" => OrdType::PreviouslyIndicated,
            "G" => OrdType::ForexSwap,
            "I" => OrdType::Funari,
            "J" => OrdType::MarketIfTouched,
            "K" => OrdType::MarketWithLeftoverAsLimit,
            "L" => OrdType::PreviousFundValuationPoint,
            "M" => OrdType::NextFundValuationPoint,
            "P" => OrdType::Pegged,
            other => return Err(unparseable(other)),
        })
    }

    pub fn wire(&self) -> &'static str {
        match self {
            OrdType::Market => "1",
            OrdType::Limit => "2",
            OrdType::Stop => "3",
            OrdType::StopLimit => "4",
            OrdType::WithOrWithout => "6",
            OrdType::LimitOrBetter => "7",
            OrdType::LimitWithOrWithout => "8",
            OrdType::OnBasis => "9",
            OrdType::OnClose => "A",
            OrdType::LimitOnClose => "B",
            OrdType::PreviouslyQuoted => "D",
            OrdType::PreviouslyIndicated => "E",
            OrdType::ForexSwap => "G",
            OrdType::Funari => "I",
            OrdType::MarketIfTouched => "J",
            OrdType::MarketWithLeftoverAsLimit => "K",
            OrdType::PreviousFundValuationPoint => "L",
            OrdType::NextFundValuationPoint => "M",
            OrdType::Pegged => "P",
        }
    }
}

/// Order status (tag 39), full FIX 4.4 code set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrdStatus {
    New,
    PartiallyFilled,
    Filled,
    DoneForDay,
    Canceled,
    Replaced,
    PendingCancel,
    Stopped,
    Rejected,
    Suspended,
    PendingNew,
    Calculated,
    Expired,
    AcceptedForBidding,
    PendingReplace,
}

impl OrdStatus {
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        Ok(match s {
            "0" => OrdStatus::New,
            "1" => OrdStatus::PartiallyFilled,
            "2" => OrdStatus::Filled,
            "3" => OrdStatus::DoneForDay,
            "4" => OrdStatus::Canceled,
            "5" => OrdStatus::Replaced,
            "6" => OrdStatus::PendingCancel,
            "7" => OrdStatus::Stopped,
            "8" => OrdStatus::Rejected,
            "9" => OrdStatus::Suspended,
            "A" => OrdStatus::PendingNew,
            "B" => OrdStatus::Calculated,
            "C" => OrdStatus::Expired,
            "D" => OrdStatus::AcceptedForBidding,
            "E" => OrdStatus::PendingReplace,
            other => return Err(unparseable(other)),
        })
    }

    pub fn wire(&self) -> &'static str {
        match self {
            OrdStatus::New => "0",
            OrdStatus::PartiallyFilled => "1",
            OrdStatus::Filled => "2",
            OrdStatus::DoneForDay => "3",
            OrdStatus::Canceled => "4",
            OrdStatus::Replaced => "5",
            OrdStatus::PendingCancel => "6",
            OrdStatus::Stopped => "7",
            OrdStatus::Rejected => "8",
            OrdStatus::Suspended => "9",
            OrdStatus::PendingNew => "A",
            OrdStatus::Calculated => "B",
            OrdStatus::Expired => "C",
            OrdStatus::AcceptedForBidding => "D",
            OrdStatus::PendingReplace => "E",
        }
    }
}

/// Time in force (tag 59).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeInForce {
    Day,
    GoodTillCancel,
    AtTheOpening,
    ImmediateOrCancel,
    FillOrKill,
    GoodTillCrossing,
    GoodTillDate,
    AtTheClose,
}

impl TimeInForce {
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        Ok(match s {
            "0" => TimeInForce::Day,
            "1" => TimeInForce::GoodTillCancel,
            "2" => TimeInForce::AtTheOpening,
            "3" => TimeInForce::ImmediateOrCancel,
            "4" => TimeInForce::FillOrKill,
            "5" => TimeInForce::GoodTillCrossing,
            "6" => TimeInForce::GoodTillDate,
            "7" => TimeInForce::AtTheClose,
            other => return Err(unparseable(other)),
        })
    }

    pub fn wire(&self) -> &'static str {
        match self {
            TimeInForce::Day => "0",
            TimeInForce::GoodTillCancel => "1",
            TimeInForce::AtTheOpening => "2",
            TimeInForce::ImmediateOrCancel => "3",
            TimeInForce::FillOrKill => "4",
            TimeInForce::GoodTillCrossing => "5",
            TimeInForce::GoodTillDate => "6",
            TimeInForce::AtTheClose => "7",
        }
    }
}

/// Execution type (tag 150), full FIX 4.4 code set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecType {
    New,
    DoneForDay,
    Canceled,
    Replaced,
    PendingCancel,
    Stopped,
    Rejected,
    Suspended,
    PendingNew,
    Calculated,
    Expired,
    Restated,
    PendingReplace,
    Trade,
    TradeCorrect,
    TradeCancel,
    OrderStatus,
}

impl ExecType {
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        Ok(match s {
            "0" => ExecType::New,
            "3" => ExecType::DoneForDay,
            "4" => ExecType::Canceled,
            "5" => ExecType::Replaced,
            "6" => ExecType::PendingCancel,
            "7" => ExecType::Stopped,
            "8" => ExecType::Rejected,
            "9" => ExecType::Suspended,
            "A" => ExecType::PendingNew,
            "B" => ExecType::Calculated,
            "C" => ExecType::Expired,
            "D" => ExecType::Restated,
            "E" => ExecType::PendingReplace,
            "F" => ExecType::Trade,
            "G" => ExecType::TradeCorrect,
            "H" => ExecType::TradeCancel,
            "I" => ExecType::OrderStatus,
            other => return Err(unparseable(other)),
        })
    }

    pub fn wire(&self) -> &'static str {
        match self {
            ExecType::New => "0",
            ExecType::DoneForDay => "3",
            ExecType::Canceled => "4",
            ExecType::Replaced => "5",
            ExecType::PendingCancel => "6",
            ExecType::Stopped => "7",
            ExecType::Rejected => "8",
            ExecType::Suspended => "9",
            ExecType::PendingNew => "A",
            ExecType::Calculated => "B",
            ExecType::Expired => "C",
            ExecType::Restated => "D",
            ExecType::PendingReplace => "E",
            ExecType::Trade => "F",
            ExecType::TradeCorrect => "G",
            ExecType::TradeCancel => "H",
            ExecType::OrderStatus => "I",
        }
    }
}

/// Encryption method (tag 98). Sessions here always use `None`; the full
/// set decodes what a peer might send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptMethod {
    None,
    Pkcs,
    Des,
    PkcsDes,
    PgpDes,
    PgpDesMd5,
    Pem,
}

impl EncryptMethod {
    pub fn parse(s: &str) -> Result<Self, CodecError> {
        Ok(match s {
            "0" => EncryptMethod::None,
            "1" => EncryptMethod::Pkcs,
            "2" => EncryptMethod::Des,
            "3" => EncryptMethod::PkcsDes,
            "4" => EncryptMethod::PgpDes,
            "5" => EncryptMethod::PgpDesMd5,
            "6" => EncryptMethod::Pem,
            other => return Err(unparseable(other)),
        })
    }

    pub fn wire(&self) -> &'static str {
        match self {
            EncryptMethod::None => "0",
            EncryptMethod::Pkcs => "1",
            EncryptMethod::Des => "2",
            EncryptMethod::PkcsDes => "3",
            EncryptMethod::PgpDes => "4",
            EncryptMethod::PgpDesMd5 => "5",
            EncryptMethod::Pem => "6",
        }
    }
}

/// FIX boolean, `Y`/`N` (e.g. PossDupFlag, GapFillFlag, ResetSeqNumFlag).
pub fn parse_yes_or_no(s: &str) -> Result<bool, CodecError> {
    match s {
        "Y" => Ok(true),
        "N" => Ok(false),
        other => Err(unparseable(other)),
    }
}

pub fn print_yes_or_no(v: bool) -> &'static str {
    if v {
        "Y"
    } else {
        "N"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trip_without_millis() {
        let ts = UtcTimestamp::parse("20200101-00:00:00").unwrap();
        assert_eq!(ts.to_string(), "20200101-00:00:00");
    }

    #[test]
    fn timestamp_round_trip_with_millis() {
        let ts = UtcTimestamp::parse("20231130-09:15:42.007").unwrap();
        assert_eq!(ts.millis(), 7);
        assert_eq!(ts.to_string(), "20231130-09:15:42.007");
    }

    #[test]
    fn timestamp_always_zero_padded() {
        let ts = UtcTimestamp::parse("20240102-03:04:05").unwrap();
        assert_eq!(ts.to_string(), "20240102-03:04:05");
    }

    #[test]
    fn timestamp_rejects_short_fraction() {
        assert!(UtcTimestamp::parse("20200101-00:00:00.5").is_err());
        assert!(UtcTimestamp::parse("2020-01-01 00:00:00").is_err());
    }

    #[test]
    fn date_round_trip() {
        let d = Date::parse("19991231").unwrap();
        assert_eq!(d.to_string(), "19991231");
        assert!(Date::parse("1999123").is_err());
    }

    #[test]
    fn tz_time_only_forms() {
        for s in [
            "07:39:00",
            "07:39:00.123",
            "07:39:00Z",
            "07:39:00.123Z",
            "07:39:00+05",
            "07:39:00-08",
            "07:39:00+05:30",
            "07:39:00.001-03:30",
        ] {
            let t = TzTimeOnly::parse(s).unwrap();
            assert_eq!(t.to_string(), s, "round-trip of {s}");
        }
        assert!(TzTimeOnly::parse("7:39:00").is_err());
    }

    #[test]
    fn version_parse_print() {
        assert_eq!(Version::parse("FIX.4.4").unwrap(), Version::FIX44);
        assert_eq!(Version::parse("FIXT.1.1").unwrap(), Version::FIXT11);
        assert_eq!(Version::FIXT11.to_string(), "FIXT.1.1");
        assert!(Version::parse("FIX44").is_err());
    }

    #[test]
    fn msg_type_admin_set() {
        for s in ["0", "1", "2", "3", "4", "5", "A"] {
            assert!(MsgType::parse(s).is_admin(), "{s} is admin");
        }
        assert!(!MsgType::parse("D").is_admin());
        assert_eq!(MsgType::parse("ZZ"), MsgType::Other("ZZ".to_string()));
        assert_eq!(MsgType::parse("ZZ").wire(), "ZZ");
    }

    #[test]
    fn enums_reject_unknown_values() {
        assert!(Side::parse("X").is_err());
        assert!(OrdStatus::parse("Z").is_err());
        assert!(ExecType::parse("1").is_err());
        assert!(parse_yes_or_no("y").is_err());
    }

    #[test]
    fn side_full_set_round_trips() {
        for s in ["1", "2", "3", "4", "5", "6", "7", "8", "9"] {
            assert_eq!(Side::parse(s).unwrap().wire(), s);
        }
    }

    #[test]
    fn ord_status_covers_fix44() {
        for s in [
            "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "A", "B", "C", "D", "E",
        ] {
            assert_eq!(OrdStatus::parse(s).unwrap().wire(), s);
        }
    }
}
