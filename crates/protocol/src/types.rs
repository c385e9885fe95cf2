//! Type options and value decoding
//!
//! Result metadata describes each column with an `[option]`: a short type id,
//! followed by type parameters for collections, tuples and user types.
//! Values arrive as `[bytes]` in the type's binary encoding.
//!
//! A null cell decodes to [`CqlValue::Null`]. So does an empty value of a
//! fixed-width type; Thrift-era tables can hold those.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ByteOrder};
use cqldump_core::{ColumnType, CqlValue, Error, Result};
use uuid::Uuid;

use crate::codec::BodyReader;

/// Read one `[option]` type description
pub fn read_type(reader: &mut BodyReader<'_>) -> Result<ColumnType> {
    let id = reader.short()?;
    let t = match id {
        0x0000 => ColumnType::Custom(reader.string()?),
        0x0001 => ColumnType::Ascii,
        0x0002 => ColumnType::BigInt,
        0x0003 => ColumnType::Blob,
        0x0004 => ColumnType::Boolean,
        0x0005 => ColumnType::Counter,
        0x0006 => ColumnType::Decimal,
        0x0007 => ColumnType::Double,
        0x0008 => ColumnType::Float,
        0x0009 => ColumnType::Int,
        0x000B => ColumnType::Timestamp,
        0x000C => ColumnType::Uuid,
        0x000D => ColumnType::Text,
        0x000E => ColumnType::VarInt,
        0x000F => ColumnType::TimeUuid,
        0x0010 => ColumnType::Inet,
        0x0011 => ColumnType::Date,
        0x0012 => ColumnType::Time,
        0x0013 => ColumnType::SmallInt,
        0x0014 => ColumnType::TinyInt,
        0x0015 => ColumnType::Duration,
        0x0020 => ColumnType::List(Box::new(read_type(reader)?)),
        0x0021 => {
            let key = read_type(reader)?;
            let value = read_type(reader)?;
            ColumnType::Map(Box::new(key), Box::new(value))
        }
        0x0022 => ColumnType::Set(Box::new(read_type(reader)?)),
        0x0030 => {
            let _keyspace = reader.string()?;
            let name = reader.string()?;
            let n = reader.short()?;
            let mut fields = Vec::with_capacity(n as usize);
            for _ in 0..n {
                let field = reader.string()?;
                fields.push((field, read_type(reader)?));
            }
            ColumnType::UserDefined { name, fields }
        }
        0x0031 => {
            let n = reader.short()?;
            let types = (0..n)
                .map(|_| read_type(reader))
                .collect::<Result<Vec<_>>>()?;
            ColumnType::Tuple(types)
        }
        other => {
            return Err(Error::Protocol(format!("unknown type id 0x{:04x}", other)));
        }
    };
    Ok(t)
}

fn invalid(column_type: &ColumnType, len: usize) -> Error {
    Error::Protocol(format!("{} bytes is not a valid {} value", len, column_type))
}

fn fixed<'a>(bytes: &'a [u8], len: usize, column_type: &ColumnType) -> Result<&'a [u8]> {
    if bytes.len() != len {
        return Err(invalid(column_type, bytes.len()));
    }
    Ok(bytes)
}

/// Decode one cell; `None` is a null cell
pub fn decode_value(bytes: Option<&[u8]>, column_type: &ColumnType) -> Result<CqlValue> {
    let Some(bytes) = bytes else {
        return Ok(CqlValue::Null);
    };
    let keeps_empty = matches!(
        column_type,
        ColumnType::Ascii | ColumnType::Text | ColumnType::Blob | ColumnType::Custom(_)
    );
    if bytes.is_empty() && !keeps_empty {
        return Ok(CqlValue::Null);
    }

    let value = match column_type {
        ColumnType::Ascii => CqlValue::Ascii(utf8(bytes)?),
        ColumnType::Text => CqlValue::Text(utf8(bytes)?),
        ColumnType::Blob => CqlValue::Blob(bytes.to_vec()),
        ColumnType::Custom(_) => CqlValue::Custom(bytes.to_vec()),
        ColumnType::BigInt => CqlValue::BigInt(BigEndian::read_i64(fixed(bytes, 8, column_type)?)),
        ColumnType::Counter => {
            CqlValue::Counter(BigEndian::read_i64(fixed(bytes, 8, column_type)?))
        }
        ColumnType::Timestamp => {
            CqlValue::Timestamp(BigEndian::read_i64(fixed(bytes, 8, column_type)?))
        }
        ColumnType::Time => CqlValue::Time(BigEndian::read_i64(fixed(bytes, 8, column_type)?)),
        ColumnType::Int => CqlValue::Int(BigEndian::read_i32(fixed(bytes, 4, column_type)?)),
        ColumnType::Date => CqlValue::Date(BigEndian::read_u32(fixed(bytes, 4, column_type)?)),
        ColumnType::SmallInt => {
            CqlValue::SmallInt(BigEndian::read_i16(fixed(bytes, 2, column_type)?))
        }
        ColumnType::TinyInt => CqlValue::TinyInt(fixed(bytes, 1, column_type)?[0] as i8),
        ColumnType::Boolean => CqlValue::Boolean(fixed(bytes, 1, column_type)?[0] != 0),
        ColumnType::Double => CqlValue::Double(BigEndian::read_f64(fixed(bytes, 8, column_type)?)),
        ColumnType::Float => CqlValue::Float(BigEndian::read_f32(fixed(bytes, 4, column_type)?)),
        ColumnType::Uuid | ColumnType::TimeUuid => {
            let uuid = Uuid::from_slice(bytes).map_err(|_| invalid(column_type, bytes.len()))?;
            if *column_type == ColumnType::Uuid {
                CqlValue::Uuid(uuid)
            } else {
                CqlValue::TimeUuid(uuid)
            }
        }
        ColumnType::Inet => match bytes.len() {
            4 => CqlValue::Inet(IpAddr::V4(Ipv4Addr::new(
                bytes[0], bytes[1], bytes[2], bytes[3],
            ))),
            16 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(bytes);
                CqlValue::Inet(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            n => return Err(invalid(column_type, n)),
        },
        ColumnType::VarInt => CqlValue::VarInt(bytes.to_vec()),
        ColumnType::Decimal => {
            if bytes.len() < 5 {
                return Err(invalid(column_type, bytes.len()));
            }
            CqlValue::Decimal {
                scale: BigEndian::read_i32(&bytes[..4]),
                unscaled: bytes[4..].to_vec(),
            }
        }
        ColumnType::Duration => {
            let mut pos = 0;
            let months = read_signed_vint(bytes, &mut pos)?;
            let days = read_signed_vint(bytes, &mut pos)?;
            let nanos = read_signed_vint(bytes, &mut pos)?;
            CqlValue::Duration {
                months: months as i32,
                days: days as i32,
                nanos,
            }
        }
        ColumnType::List(element) => CqlValue::List(decode_elements(bytes, element)?),
        ColumnType::Set(element) => CqlValue::Set(decode_elements(bytes, element)?),
        ColumnType::Map(key_type, value_type) => {
            let mut reader = BodyReader::new(bytes);
            let n = reader.int()?;
            let mut entries = Vec::with_capacity(n.max(0) as usize);
            for _ in 0..n {
                let key = decode_value(reader.bytes()?, key_type)?;
                let value = decode_value(reader.bytes()?, value_type)?;
                entries.push((key, value));
            }
            CqlValue::Map(entries)
        }
        ColumnType::Tuple(types) => {
            let mut reader = BodyReader::new(bytes);
            let mut values = Vec::with_capacity(types.len());
            for t in types {
                let cell = if reader.remaining() > 0 {
                    reader.bytes()?
                } else {
                    None
                };
                values.push(decode_value(cell, t)?);
            }
            CqlValue::Tuple(values)
        }
        ColumnType::UserDefined { fields, .. } => {
            let mut reader = BodyReader::new(bytes);
            let mut values = Vec::with_capacity(fields.len());
            for (name, t) in fields {
                // values written before a field was added stop early
                let cell = if reader.remaining() > 0 {
                    reader.bytes()?
                } else {
                    None
                };
                values.push((name.clone(), decode_value(cell, t)?));
            }
            CqlValue::Udt(values)
        }
        ColumnType::Frozen(inner) => return decode_value(Some(bytes), inner),
    };
    Ok(value)
}

fn decode_elements(bytes: &[u8], element: &ColumnType) -> Result<Vec<CqlValue>> {
    let mut reader = BodyReader::new(bytes);
    let n = reader.int()?;
    (0..n.max(0))
        .map(|_| decode_value(reader.bytes()?, element))
        .collect()
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::Protocol(format!("invalid UTF-8 in text value: {}", e)))
}

/// Cassandra's variable-length unsigned integer: the count of leading one
/// bits in the first byte is the count of extra bytes.
fn read_unsigned_vint(bytes: &[u8], pos: &mut usize) -> Result<u64> {
    let first = *bytes
        .get(*pos)
        .ok_or_else(|| Error::Protocol("truncated vint".to_string()))?;
    *pos += 1;
    let extra = first.leading_ones() as usize;
    let mut value = u64::from(first & 0xffu8.checked_shr(extra as u32).unwrap_or(0));
    if *pos + extra > bytes.len() {
        return Err(Error::Protocol("truncated vint".to_string()));
    }
    for b in &bytes[*pos..*pos + extra] {
        value = (value << 8) | u64::from(*b);
    }
    *pos += extra;
    Ok(value)
}

fn read_signed_vint(bytes: &[u8], pos: &mut usize) -> Result<i64> {
    let n = read_unsigned_vint(bytes, pos)?;
    Ok((n >> 1) as i64 ^ -((n & 1) as i64))
}
