//! Typing of parsed literals against column types

use std::net::IpAddr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};
use cqldump_core::value::{varint_from_str, DATE_EPOCH_OFFSET};
use cqldump_core::{ColumnType, CqlValue, UserType};
use uuid::Uuid;

use super::cql::{Literal, ParseResult};

/// Convert `literal` to a value of type `column_type`
pub(crate) fn to_value(
    literal: &Literal,
    column_type: &ColumnType,
    user_types: &[UserType],
) -> ParseResult<CqlValue> {
    if *literal == Literal::Null {
        return Ok(CqlValue::Null);
    }
    let mismatch = || format!("{:?} is not a valid {} literal", literal, column_type);
    let value = match (column_type, literal) {
        (ColumnType::Frozen(inner), _) => return to_value(literal, inner, user_types),
        (ColumnType::Ascii, Literal::Str(s)) => CqlValue::Ascii(s.clone()),
        (ColumnType::Text, Literal::Str(s)) => CqlValue::Text(s.clone()),
        (ColumnType::BigInt, Literal::Word(w)) => CqlValue::BigInt(number(w)?),
        (ColumnType::Counter, Literal::Word(w)) => CqlValue::Counter(number(w)?),
        (ColumnType::Int, Literal::Word(w)) => CqlValue::Int(number(w)?),
        (ColumnType::SmallInt, Literal::Word(w)) => CqlValue::SmallInt(number(w)?),
        (ColumnType::TinyInt, Literal::Word(w)) => CqlValue::TinyInt(number(w)?),
        (ColumnType::Boolean, Literal::Word(w)) => match w.to_ascii_lowercase().as_str() {
            "true" => CqlValue::Boolean(true),
            "false" => CqlValue::Boolean(false),
            _ => return Err(mismatch()),
        },
        (ColumnType::Double, Literal::Word(w)) => CqlValue::Double(float(w)?),
        (ColumnType::Float, Literal::Word(w)) => CqlValue::Float(float(w)? as f32),
        (ColumnType::Blob, Literal::Word(w)) => CqlValue::Blob(hex(w)?),
        (ColumnType::Custom(_), Literal::Word(w)) => CqlValue::Custom(hex(w)?),
        (ColumnType::Uuid, Literal::Word(w)) => CqlValue::Uuid(uuid(w)?),
        (ColumnType::TimeUuid, Literal::Word(w)) => CqlValue::TimeUuid(uuid(w)?),
        (ColumnType::Timestamp, Literal::Word(w)) => CqlValue::Timestamp(number(w)?),
        (ColumnType::Timestamp, Literal::Str(s)) => {
            let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| e.to_string())?;
            CqlValue::Timestamp(parsed.timestamp_millis())
        }
        (ColumnType::Date, Literal::Str(s)) => {
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())?;
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or_else(mismatch)?;
            let days = (date - epoch).num_days() + i64::from(DATE_EPOCH_OFFSET);
            CqlValue::Date(u32::try_from(days).map_err(|e| e.to_string())?)
        }
        (ColumnType::Date, Literal::Word(w)) => CqlValue::Date(number(w)?),
        (ColumnType::Time, Literal::Str(s)) => {
            let time = NaiveTime::parse_from_str(s, "%H:%M:%S%.f").map_err(|e| e.to_string())?;
            CqlValue::Time(
                i64::from(time.num_seconds_from_midnight()) * 1_000_000_000
                    + i64::from(time.nanosecond()),
            )
        }
        (ColumnType::Time, Literal::Word(w)) => CqlValue::Time(number(w)?),
        (ColumnType::Inet, Literal::Str(s)) => {
            CqlValue::Inet(s.parse::<IpAddr>().map_err(|e| e.to_string())?)
        }
        (ColumnType::VarInt, Literal::Word(w)) => {
            CqlValue::VarInt(varint_from_str(w).ok_or_else(mismatch)?)
        }
        (ColumnType::Decimal, Literal::Word(w)) => decimal(w).ok_or_else(mismatch)?,
        (ColumnType::Duration, Literal::Word(w)) => duration(w).ok_or_else(mismatch)?,
        (ColumnType::List(inner), Literal::List(items)) => CqlValue::List(
            items
                .iter()
                .map(|i| to_value(i, inner, user_types))
                .collect::<ParseResult<_>>()?,
        ),
        (ColumnType::Set(inner), Literal::Braces(entries)) => {
            let mut items = Vec::with_capacity(entries.len());
            for (item, value) in entries {
                if value.is_some() {
                    return Err(mismatch());
                }
                items.push(to_value(item, inner, user_types)?);
            }
            CqlValue::Set(items)
        }
        (ColumnType::Map(k, v), Literal::Braces(entries)) => {
            let mut pairs = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                let value = value.as_ref().ok_or_else(mismatch)?;
                pairs.push((
                    to_value(key, k, user_types)?,
                    to_value(value, v, user_types)?,
                ));
            }
            CqlValue::Map(pairs)
        }
        (ColumnType::Tuple(types), Literal::Tuple(items)) => {
            if items.len() > types.len() {
                return Err(mismatch());
            }
            let mut values = Vec::with_capacity(types.len());
            for (i, t) in types.iter().enumerate() {
                values.push(match items.get(i) {
                    Some(item) => to_value(item, t, user_types)?,
                    None => CqlValue::Null,
                });
            }
            CqlValue::Tuple(values)
        }
        (ColumnType::UserDefined { name, .. }, Literal::Braces(entries)) => {
            let ut = user_types
                .iter()
                .find(|u| u.name == *name)
                .ok_or_else(|| format!("unknown type {}", name))?;
            let mut given = Vec::new();
            for (field, value) in entries {
                let field = match field {
                    Literal::Ident(f) => f.clone(),
                    Literal::Word(f) => f.to_lowercase(),
                    _ => return Err(mismatch()),
                };
                given.push((field, value.as_ref().ok_or_else(mismatch)?));
            }
            let mut fields = Vec::with_capacity(ut.fields.len());
            for (field, field_type) in &ut.fields {
                let value = match given.iter().find(|(f, _)| f == field) {
                    Some((_, literal)) => to_value(literal, field_type, user_types)?,
                    None => CqlValue::Null,
                };
                fields.push((field.clone(), value));
            }
            if given
                .iter()
                .any(|(f, _)| !ut.fields.iter().any(|(name, _)| name == f))
            {
                return Err(format!("unknown field in {:?} for type {}", literal, name));
            }
            CqlValue::Udt(fields)
        }
        _ => return Err(mismatch()),
    };
    Ok(value)
}

fn number<T: std::str::FromStr>(text: &str) -> ParseResult<T>
where
    T::Err: std::fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| format!("invalid number {}: {}", text, e))
}

fn float(text: &str) -> ParseResult<f64> {
    match text {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        _ => number(text),
    }
}

fn hex(text: &str) -> ParseResult<Vec<u8>> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| format!("invalid blob {}", text))?;
    if digits.len() % 2 != 0 {
        return Err(format!("odd-length blob {}", text));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|e| format!("invalid blob: {}", e))
        })
        .collect()
}

fn uuid(text: &str) -> ParseResult<Uuid> {
    Uuid::parse_str(text).map_err(|e| e.to_string())
}

fn decimal(text: &str) -> Option<CqlValue> {
    let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
        Some(i) => (&text[..i], text[i + 1..].parse::<i32>().ok()?),
        None => (text, 0),
    };
    let (int_part, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{}{}", int_part, frac);
    let scale = i32::try_from(frac.len()).ok()? - exponent;
    Some(CqlValue::Decimal {
        scale,
        unscaled: varint_from_str(&digits)?,
    })
}

fn duration(text: &str) -> Option<CqlValue> {
    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, text),
    };
    if rest.is_empty() {
        return None;
    }
    let (mut months, mut days, mut nanos) = (0i64, 0i64, 0i64);
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let amount: i64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];
        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];
        match unit.to_ascii_lowercase().as_str() {
            "y" => months += amount * 12,
            "mo" => months += amount,
            "w" => days += amount * 7,
            "d" => days += amount,
            "h" => nanos += amount * 3_600_000_000_000,
            "m" => nanos += amount * 60_000_000_000,
            "s" => nanos += amount * 1_000_000_000,
            "ms" => nanos += amount * 1_000_000,
            "us" | "µs" => nanos += amount * 1_000,
            "ns" => nanos += amount,
            _ => return None,
        }
    }
    let sign = if negative { -1 } else { 1 };
    Some(CqlValue::Duration {
        months: i32::try_from(months * sign).ok()?,
        days: i32::try_from(days * sign).ok()?,
        nanos: nanos * sign,
    })
}
