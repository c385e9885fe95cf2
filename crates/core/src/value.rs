//! Typed cell values and their CQL literal form
//!
//! `CqlValue` is what a row cursor yields per cell. [`CqlValue::to_cql_literal`]
//! is the value codec: it turns a cell into the literal text that, spliced into
//! an INSERT or UPDATE, writes the same value back. Top-level nulls have no
//! literal (`None`); the encoder leaves such columns out.
//!
//! ## Literal conventions
//!
//! - Strings, timestamps, dates, times and inets are single-quoted
//! - Blobs are `0x`-prefixed lowercase hex
//! - Non-finite floats are `NaN`, `Infinity`, `-Infinity`
//! - Nulls nested inside tuples or UDTs are written `null`

use std::fmt::Write as _;
use std::net::IpAddr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::cql::{quote_identifier, quote_string};

/// Day number of 1970-01-01 in the CQL `date` encoding (unsigned, centered at 2^31)
pub const DATE_EPOCH_OFFSET: u32 = 1 << 31;

/// A decoded cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    /// Absent value
    Null,
    /// `ascii`
    Ascii(String),
    /// `text` / `varchar`
    Text(String),
    /// `bigint`
    BigInt(i64),
    /// `counter`
    Counter(i64),
    /// `int`
    Int(i32),
    /// `smallint`
    SmallInt(i16),
    /// `tinyint`
    TinyInt(i8),
    /// `boolean`
    Boolean(bool),
    /// `double`
    Double(f64),
    /// `float`
    Float(f32),
    /// `blob`
    Blob(Vec<u8>),
    /// `uuid`
    Uuid(Uuid),
    /// `timeuuid`
    TimeUuid(Uuid),
    /// `timestamp`, milliseconds since the Unix epoch
    Timestamp(i64),
    /// `date`, days with the epoch at [`DATE_EPOCH_OFFSET`]
    Date(u32),
    /// `time`, nanoseconds since midnight
    Time(i64),
    /// `inet`
    Inet(IpAddr),
    /// `varint`, big-endian two's complement
    VarInt(Vec<u8>),
    /// `decimal`: unscaled big-endian two's complement value and scale
    Decimal {
        /// Power-of-ten scale (value = unscaled * 10^-scale)
        scale: i32,
        /// Unscaled value bytes
        unscaled: Vec<u8>,
    },
    /// `duration`
    Duration {
        /// Months
        months: i32,
        /// Days
        days: i32,
        /// Nanoseconds
        nanos: i64,
    },
    /// `list<T>`
    List(Vec<CqlValue>),
    /// `set<T>`
    Set(Vec<CqlValue>),
    /// `map<K, V>`, in stored order
    Map(Vec<(CqlValue, CqlValue)>),
    /// `tuple<...>`
    Tuple(Vec<CqlValue>),
    /// User-defined type value, fields in declaration order
    Udt(Vec<(String, CqlValue)>),
    /// Value of a custom marshal type, kept as raw bytes
    Custom(Vec<u8>),
}

impl CqlValue {
    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }

    /// Literal text for this value, `None` for null.
    pub fn to_cql_literal(&self) -> Option<String> {
        if self.is_null() {
            return None;
        }
        let mut out = String::new();
        self.write_literal(&mut out);
        Some(out)
    }

    fn write_literal(&self, out: &mut String) {
        match self {
            CqlValue::Null => out.push_str("null"),
            CqlValue::Ascii(s) | CqlValue::Text(s) => out.push_str(&quote_string(s)),
            CqlValue::BigInt(v) | CqlValue::Counter(v) => {
                let _ = write!(out, "{}", v);
            }
            CqlValue::Int(v) => {
                let _ = write!(out, "{}", v);
            }
            CqlValue::SmallInt(v) => {
                let _ = write!(out, "{}", v);
            }
            CqlValue::TinyInt(v) => {
                let _ = write!(out, "{}", v);
            }
            CqlValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
            CqlValue::Double(v) => out.push_str(&format_float(*v)),
            CqlValue::Float(v) => out.push_str(&format_float32(*v)),
            CqlValue::Blob(bytes) | CqlValue::Custom(bytes) => out.push_str(&format_blob(bytes)),
            CqlValue::Uuid(u) | CqlValue::TimeUuid(u) => {
                let _ = write!(out, "{}", u.hyphenated());
            }
            CqlValue::Timestamp(millis) => out.push_str(&format_timestamp(*millis)),
            CqlValue::Date(days) => out.push_str(&format_date(*days)),
            CqlValue::Time(nanos) => out.push_str(&format_time(*nanos)),
            CqlValue::Inet(addr) => out.push_str(&quote_string(&addr.to_string())),
            CqlValue::VarInt(bytes) => out.push_str(&varint_to_string(bytes)),
            CqlValue::Decimal { scale, unscaled } => {
                out.push_str(&format_decimal(*scale, unscaled))
            }
            CqlValue::Duration {
                months,
                days,
                nanos,
            } => out.push_str(&format_duration(*months, *days, *nanos)),
            CqlValue::List(items) => write_seq(out, '[', ']', items),
            CqlValue::Set(items) => write_seq(out, '{', '}', items),
            CqlValue::Tuple(items) => write_seq(out, '(', ')', items),
            CqlValue::Map(entries) => {
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.write_literal(out);
                    out.push_str(": ");
                    v.write_literal(out);
                }
                out.push('}');
            }
            CqlValue::Udt(fields) => {
                out.push('{');
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&quote_identifier(name));
                    out.push_str(": ");
                    v.write_literal(out);
                }
                out.push('}');
            }
        }
    }
}

fn write_seq(out: &mut String, open: char, close: char, items: &[CqlValue]) {
    out.push(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_literal(out);
    }
    out.push(close);
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else {
        format!("{:?}", v)
    }
}

fn format_float32(v: f32) -> String {
    if v.is_finite() {
        format!("{:?}", v)
    } else {
        format_float(f64::from(v))
    }
}

/// `0x` followed by lowercase hex
pub fn format_blob(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Quoted ISO-8601 UTC with millisecond precision; bare millis when out of range
pub fn format_timestamp(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(dt) => quote_string(&dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
        None => millis.to_string(),
    }
}

/// Quoted `YYYY-MM-DD`; the raw day number when out of range
pub fn format_date(days: u32) -> String {
    let offset = i64::from(days) - i64::from(DATE_EPOCH_OFFSET);
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1);
    match epoch.and_then(|e| e.checked_add_signed(Duration::days(offset))) {
        Some(date) => quote_string(&date.format("%Y-%m-%d").to_string()),
        None => days.to_string(),
    }
}

/// Quoted `HH:MM:SS.nnnnnnnnn`
pub fn format_time(nanos: i64) -> String {
    let secs = nanos.div_euclid(1_000_000_000);
    let frac = nanos.rem_euclid(1_000_000_000);
    match u32::try_from(secs)
        .ok()
        .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, frac as u32))
    {
        Some(t) => quote_string(&t.format("%H:%M:%S%.9f").to_string()),
        None => nanos.to_string(),
    }
}

/// CQL duration literal, e.g. `1mo2d3ns`
pub fn format_duration(months: i32, days: i32, nanos: i64) -> String {
    if months == 0 && days == 0 && nanos == 0 {
        return "0ns".to_string();
    }
    let negative = months < 0 || days < 0 || nanos < 0;
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if months != 0 {
        let _ = write!(out, "{}mo", months.unsigned_abs());
    }
    if days != 0 {
        let _ = write!(out, "{}d", days.unsigned_abs());
    }
    if nanos != 0 {
        let _ = write!(out, "{}ns", nanos.unsigned_abs());
    }
    out
}

/// Decimal digits of a big-endian two's complement integer
pub fn varint_to_string(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "0".to_string();
    }
    let negative = bytes[0] & 0x80 != 0;
    let mut magnitude: Vec<u8> = bytes.to_vec();
    if negative {
        // two's complement negate: invert then add one
        for b in magnitude.iter_mut() {
            *b = !*b;
        }
        for b in magnitude.iter_mut().rev() {
            let (v, carry) = b.overflowing_add(1);
            *b = v;
            if !carry {
                break;
            }
        }
    }
    let mut digits = Vec::new();
    while magnitude.iter().any(|&b| b != 0) {
        let mut rem: u32 = 0;
        for b in magnitude.iter_mut() {
            let cur = (rem << 8) | u32::from(*b);
            *b = (cur / 10) as u8;
            rem = cur % 10;
        }
        digits.push(b'0' + rem as u8);
    }
    if digits.is_empty() {
        digits.push(b'0');
    }
    if negative {
        digits.push(b'-');
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Minimal big-endian two's complement encoding of a decimal integer string
pub fn varint_from_str(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // little-endian magnitude while accumulating
    let mut mag: Vec<u8> = vec![0];
    for d in digits.bytes() {
        let mut carry = u32::from(d - b'0');
        for b in mag.iter_mut() {
            let cur = u32::from(*b) * 10 + carry;
            *b = (cur & 0xff) as u8;
            carry = cur >> 8;
        }
        while carry > 0 {
            mag.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    // room for the sign bit
    if mag.last().map_or(false, |b| b & 0x80 != 0) {
        mag.push(0);
    }
    if negative {
        for b in mag.iter_mut() {
            *b = !*b;
        }
        for b in mag.iter_mut() {
            let (v, carry) = b.overflowing_add(1);
            *b = v;
            if !carry {
                break;
            }
        }
    }
    mag.reverse();
    // trim redundant sign-extension bytes
    while mag.len() > 1
        && ((mag[0] == 0x00 && mag[1] & 0x80 == 0) || (mag[0] == 0xff && mag[1] & 0x80 != 0))
    {
        mag.remove(0);
    }
    Some(mag)
}

/// Plain decimal notation for `unscaled * 10^-scale`
pub fn format_decimal(scale: i32, unscaled: &[u8]) -> String {
    let digits = varint_to_string(unscaled);
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(d) => ("-", d.to_string()),
        None => ("", digits),
    };
    if scale <= 0 {
        if scale == 0 || digits == "0" {
            return format!("{}{}", sign, digits);
        }
        return format!("{}{}E{}", sign, digits, -i64::from(scale));
    }
    let scale = scale as usize;
    if digits.len() > scale {
        let (int_part, frac) = digits.split_at(digits.len() - scale);
        format!("{}{}.{}", sign, int_part, frac)
    } else {
        format!("{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
    }
}
