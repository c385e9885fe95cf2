//! Body encoding primitives
//!
//! The notation types of the native protocol, big-endian throughout:
//!
//! ```text
//! [short]        u16
//! [int]          i32
//! [string]       [short] length + UTF-8
//! [long string]  [int] length + UTF-8
//! [bytes]        [int] length (negative = null) + bytes
//! [short bytes]  [short] length + bytes
//! [string map]   [short] n + n * ([string] key, [string] value)
//! ```

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use cqldump_core::{Error, Result};

/// Builder for a request body
#[derive(Debug, Default)]
pub struct BodyWriter {
    buf: Vec<u8>,
}

impl BodyWriter {
    /// Empty body
    pub fn new() -> Self {
        BodyWriter::default()
    }

    /// `[byte]`
    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    /// `[short]`
    pub fn short(&mut self, value: u16) -> &mut Self {
        // writes into a Vec cannot fail
        let _ = self.buf.write_u16::<BigEndian>(value);
        self
    }

    /// `[int]`
    pub fn int(&mut self, value: i32) -> &mut Self {
        let _ = self.buf.write_i32::<BigEndian>(value);
        self
    }

    /// `[string]`
    pub fn string(&mut self, value: &str) -> &mut Self {
        self.short(value.len() as u16);
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// `[long string]`
    pub fn long_string(&mut self, value: &str) -> &mut Self {
        self.int(value.len() as i32);
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// `[bytes]`, `None` written as null
    pub fn bytes(&mut self, value: Option<&[u8]>) -> &mut Self {
        match value {
            Some(bytes) => {
                self.int(bytes.len() as i32);
                self.buf.extend_from_slice(bytes);
            }
            None => {
                self.int(-1);
            }
        }
        self
    }

    /// `[string map]`
    pub fn string_map(&mut self, entries: &[(&str, &str)]) -> &mut Self {
        self.short(entries.len() as u16);
        for (key, value) in entries {
            self.string(key);
            self.string(value);
        }
        self
    }

    /// Finished body
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reader over a response body
pub struct BodyReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

fn truncated(what: &str) -> Error {
    Error::Protocol(format!("truncated frame body reading {}", what))
}

impl<'a> BodyReader<'a> {
    /// Read from the start of `body`
    pub fn new(body: &'a [u8]) -> Self {
        BodyReader {
            cursor: Cursor::new(body),
        }
    }

    /// Bytes not read yet
    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        (len - self.cursor.position().min(len)) as usize
    }

    /// `[byte]`
    pub fn byte(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| truncated("byte"))
    }

    /// `[short]`
    pub fn short(&mut self) -> Result<u16> {
        self.cursor
            .read_u16::<BigEndian>()
            .map_err(|_| truncated("short"))
    }

    /// `[int]`
    pub fn int(&mut self) -> Result<i32> {
        self.cursor
            .read_i32::<BigEndian>()
            .map_err(|_| truncated("int"))
    }

    /// `[long]`
    pub fn long(&mut self) -> Result<i64> {
        self.cursor
            .read_i64::<BigEndian>()
            .map_err(|_| truncated("long"))
    }

    /// Exactly `len` raw bytes
    pub fn raw(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(truncated("raw bytes"));
        }
        let start = self.cursor.position() as usize;
        let body: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + len) as u64);
        Ok(&body[start..start + len])
    }

    /// `[string]`
    pub fn string(&mut self) -> Result<String> {
        let len = self.short()? as usize;
        utf8(self.raw(len)?)
    }

    /// `[long string]`
    pub fn long_string(&mut self) -> Result<String> {
        let len = self.int()?;
        if len < 0 {
            return Err(Error::Protocol("negative long string length".to_string()));
        }
        utf8(self.raw(len as usize)?)
    }

    /// `[bytes]`, `None` for null
    pub fn bytes(&mut self) -> Result<Option<&'a [u8]>> {
        let len = self.int()?;
        if len < 0 {
            return Ok(None);
        }
        self.raw(len as usize).map(Some)
    }

    /// `[short bytes]`
    pub fn short_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.short()? as usize;
        self.raw(len)
    }

    /// `[string list]`
    pub fn string_list(&mut self) -> Result<Vec<String>> {
        let n = self.short()?;
        (0..n).map(|_| self.string()).collect()
    }

    /// `[string multimap]`
    pub fn string_multimap(&mut self) -> Result<Vec<(String, Vec<String>)>> {
        let n = self.short()?;
        (0..n)
            .map(|_| Ok((self.string()?, self.string_list()?)))
            .collect()
    }

    /// Everything not read yet
    pub fn rest(&mut self) -> Result<&'a [u8]> {
        let n = self.remaining();
        self.raw(n)
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::Protocol(format!("invalid UTF-8 in string: {}", e)))
}
