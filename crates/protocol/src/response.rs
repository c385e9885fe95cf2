//! Response decoding

use cqldump_core::{ColumnSpec, CqlValue, Error, Result};
use tracing::warn;

use crate::codec::BodyReader;
use crate::frame::{Frame, Opcode, FLAG_CUSTOM_PAYLOAD, FLAG_TRACING, FLAG_WARNING};
use crate::types::{decode_value, read_type};

const ROWS_GLOBAL_TABLES_SPEC: i32 = 0x0001;
const ROWS_HAS_MORE_PAGES: i32 = 0x0002;
const ROWS_NO_METADATA: i32 = 0x0004;

/// A decoded server message
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Server error
    Error {
        /// Protocol error code
        code: i32,
        /// Server message
        message: String,
    },
    /// STARTUP accepted
    Ready,
    /// Authentication required, with the authenticator class
    Authenticate(String),
    /// SASL challenge
    AuthChallenge,
    /// Authentication accepted
    AuthSuccess,
    /// Supported startup options
    Supported(Vec<(String, Vec<String>)>),
    /// Statement result
    Result(QueryResult),
    /// Pushed event; never requested
    Event,
}

/// Body of a RESULT message
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// No data
    Void,
    /// One page of rows
    Rows(RowsPage),
    /// `USE` result
    SetKeyspace(String),
    /// Prepared statement id; never requested
    Prepared,
    /// DDL result
    SchemaChange {
        /// CREATED, UPDATED or DROPPED
        change: String,
        /// KEYSPACE, TABLE, TYPE, FUNCTION or AGGREGATE
        target: String,
        /// Affected keyspace
        keyspace: String,
    },
}

/// One page of a rows result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowsPage {
    /// Result columns, in order
    pub columns: Vec<ColumnSpec>,
    /// Decoded rows
    pub rows: Vec<Vec<CqlValue>>,
    /// Token for the next page, `None` on the last page
    pub paging_state: Option<Vec<u8>>,
}

impl Response {
    /// Decode a response frame
    pub fn decode(frame: &Frame) -> Result<Response> {
        let mut reader = BodyReader::new(&frame.body);
        if frame.flags & FLAG_TRACING != 0 {
            reader.raw(16)?;
        }
        if frame.flags & FLAG_WARNING != 0 {
            for message in reader.string_list()? {
                warn!(message = %message, "Server warning");
            }
        }
        if frame.flags & FLAG_CUSTOM_PAYLOAD != 0 {
            let n = reader.short()?;
            for _ in 0..n {
                reader.string()?;
                reader.bytes()?;
            }
        }

        let response = match frame.opcode {
            Opcode::Error => Response::Error {
                code: reader.int()?,
                message: reader.string()?,
            },
            Opcode::Ready => Response::Ready,
            Opcode::Authenticate => Response::Authenticate(reader.string()?),
            Opcode::AuthChallenge => Response::AuthChallenge,
            Opcode::AuthSuccess => Response::AuthSuccess,
            Opcode::Supported => Response::Supported(reader.string_multimap()?),
            Opcode::Result => Response::Result(decode_result(&mut reader)?),
            Opcode::Event => Response::Event,
            other => {
                return Err(Error::Protocol(format!(
                    "unexpected {:?} frame from server",
                    other
                )))
            }
        };
        Ok(response)
    }
}

fn decode_result(reader: &mut BodyReader<'_>) -> Result<QueryResult> {
    let kind = reader.int()?;
    let result = match kind {
        0x0001 => QueryResult::Void,
        0x0002 => QueryResult::Rows(decode_rows(reader)?),
        0x0003 => QueryResult::SetKeyspace(reader.string()?),
        0x0004 => QueryResult::Prepared,
        0x0005 => QueryResult::SchemaChange {
            change: reader.string()?,
            target: reader.string()?,
            keyspace: reader.string()?,
        },
        other => {
            return Err(Error::Protocol(format!("unknown result kind {}", other)));
        }
    };
    Ok(result)
}

fn decode_rows(reader: &mut BodyReader<'_>) -> Result<RowsPage> {
    let flags = reader.int()?;
    let column_count = reader.int()?.max(0) as usize;
    let paging_state = if flags & ROWS_HAS_MORE_PAGES != 0 {
        reader.bytes()?.map(|b| b.to_vec())
    } else {
        None
    };
    if flags & ROWS_NO_METADATA != 0 {
        return Err(Error::Protocol(
            "rows result without metadata".to_string(),
        ));
    }
    if flags & ROWS_GLOBAL_TABLES_SPEC != 0 {
        reader.string()?;
        reader.string()?;
    }
    let mut columns = Vec::with_capacity(column_count);
    for _ in 0..column_count {
        if flags & ROWS_GLOBAL_TABLES_SPEC == 0 {
            reader.string()?;
            reader.string()?;
        }
        let name = reader.string()?;
        columns.push(ColumnSpec::new(name, read_type(reader)?));
    }

    let row_count = reader.int()?.max(0) as usize;
    let mut rows = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let row = columns
            .iter()
            .map(|c| decode_value(reader.bytes()?, &c.column_type))
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    Ok(RowsPage {
        columns,
        rows,
        paging_state,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Response bodies for tests

    use crate::codec::BodyWriter;
    use crate::frame::{Frame, Opcode, PROTOCOL_VERSION, RESPONSE_BIT};

    pub fn response(stream: i16, opcode: Opcode, body: Vec<u8>) -> Frame {
        Frame {
            version: PROTOCOL_VERSION | RESPONSE_BIT,
            flags: 0,
            stream,
            opcode,
            body,
        }
    }

    /// Rows result with one text column `name`, one row per value
    pub fn text_rows(values: &[&str], paging_state: Option<&[u8]>) -> Vec<u8> {
        let mut body = BodyWriter::new();
        body.int(0x0002);
        let flags = 0x0001 | if paging_state.is_some() { 0x0002 } else { 0 };
        body.int(flags).int(1);
        if let Some(state) = paging_state {
            body.bytes(Some(state));
        }
        body.string("ks").string("t").string("name").short(0x000D);
        body.int(values.len() as i32);
        for v in values {
            body.bytes(Some(v.as_bytes()));
        }
        body.into_bytes()
    }

    pub fn void() -> Vec<u8> {
        let mut body = BodyWriter::new();
        body.int(0x0001);
        body.into_bytes()
    }

    pub fn error(code: i32, message: &str) -> Vec<u8> {
        let mut body = BodyWriter::new();
        body.int(code).string(message);
        body.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use cqldump_core::ColumnType;

    #[test]
    fn test_decode_rows_page() {
        let frame = response(1, Opcode::Result, text_rows(&["a", "b"], Some(&b"next"[..])));
        match Response::decode(&frame).unwrap() {
            Response::Result(QueryResult::Rows(page)) => {
                assert_eq!(page.columns, vec![ColumnSpec::new("name", ColumnType::Text)]);
                assert_eq!(page.rows.len(), 2);
                assert_eq!(page.rows[1], vec![CqlValue::Text("b".to_string())]);
                assert_eq!(page.paging_state.as_deref(), Some(&b"next"[..]));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_error() {
        let frame = response(1, Opcode::Error, error(0x2200, "unconfigured table t"));
        assert_eq!(
            Response::decode(&frame).unwrap(),
            Response::Error {
                code: 0x2200,
                message: "unconfigured table t".to_string()
            }
        );
    }

    #[test]
    fn test_warnings_are_skipped() {
        let mut body = crate::codec::BodyWriter::new();
        body.short(1).string("batch too large");
        let mut bytes = body.into_bytes();
        bytes.extend(void());
        let mut frame = response(1, Opcode::Result, bytes);
        frame.flags = FLAG_WARNING;
        assert_eq!(
            Response::decode(&frame).unwrap(),
            Response::Result(QueryResult::Void)
        );
    }

    #[test]
    fn test_schema_change() {
        let mut body = crate::codec::BodyWriter::new();
        body.int(0x0005).string("CREATED").string("TABLE").string("ks").string("t");
        let frame = response(1, Opcode::Result, body.into_bytes());
        match Response::decode(&frame).unwrap() {
            Response::Result(QueryResult::SchemaChange { change, target, keyspace }) => {
                assert_eq!((change.as_str(), target.as_str(), keyspace.as_str()), ("CREATED", "TABLE", "ks"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
