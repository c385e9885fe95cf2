//! Native protocol framing
//!
//! ## Frame Layout (version 4)
//!
//! ```text
//! [version: u8]   0x04 request, 0x84 response
//! [flags: u8]
//! [stream: i16 BE]
//! [opcode: u8]
//! [length: u32 BE]
//! [body: length bytes]
//! ```

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// Protocol version spoken on the wire
pub const PROTOCOL_VERSION: u8 = 0x04;

/// Direction bit set on response frames
pub const RESPONSE_BIT: u8 = 0x80;

/// Header length in bytes
pub const HEADER_LEN: usize = 9;

/// Largest body accepted (the protocol's own limit)
pub const MAX_BODY_LEN: u32 = 256 * 1024 * 1024;

/// Body starts with a tracing session id
pub const FLAG_TRACING: u8 = 0x02;
/// Body starts with a custom payload
pub const FLAG_CUSTOM_PAYLOAD: u8 = 0x04;
/// Body starts with server warnings
pub const FLAG_WARNING: u8 = 0x08;

/// Frame opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Error response
    Error = 0x00,
    /// Connection setup
    Startup = 0x01,
    /// Setup finished
    Ready = 0x02,
    /// Authentication required
    Authenticate = 0x03,
    /// Ask for supported options
    Options = 0x05,
    /// Supported options
    Supported = 0x06,
    /// Run a CQL statement
    Query = 0x07,
    /// Statement result
    Result = 0x08,
    /// Prepare a statement
    Prepare = 0x09,
    /// Run a prepared statement
    Execute = 0x0A,
    /// Subscribe to events
    Register = 0x0B,
    /// Server push event
    Event = 0x0C,
    /// Batch of statements
    Batch = 0x0D,
    /// SASL challenge
    AuthChallenge = 0x0E,
    /// SASL response
    AuthResponse = 0x0F,
    /// Authentication finished
    AuthSuccess = 0x10,
}

impl Opcode {
    /// Opcode for a header byte
    pub fn from_u8(byte: u8) -> Option<Self> {
        let op = match byte {
            0x00 => Opcode::Error,
            0x01 => Opcode::Startup,
            0x02 => Opcode::Ready,
            0x03 => Opcode::Authenticate,
            0x05 => Opcode::Options,
            0x06 => Opcode::Supported,
            0x07 => Opcode::Query,
            0x08 => Opcode::Result,
            0x09 => Opcode::Prepare,
            0x0A => Opcode::Execute,
            0x0B => Opcode::Register,
            0x0C => Opcode::Event,
            0x0D => Opcode::Batch,
            0x0E => Opcode::AuthChallenge,
            0x0F => Opcode::AuthResponse,
            0x10 => Opcode::AuthSuccess,
            _ => return None,
        };
        Some(op)
    }
}

/// One protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Version byte, direction bit included
    pub version: u8,
    /// Header flags
    pub flags: u8,
    /// Stream id pairing requests with responses
    pub stream: i16,
    /// Message kind
    pub opcode: Opcode,
    /// Message body
    pub body: Vec<u8>,
}

impl Frame {
    /// A request frame
    pub fn request(stream: i16, opcode: Opcode, body: Vec<u8>) -> Self {
        Frame {
            version: PROTOCOL_VERSION,
            flags: 0,
            stream,
            opcode,
            body,
        }
    }

    /// Whether this frame travels server to client
    pub fn is_response(&self) -> bool {
        self.version & RESPONSE_BIT != 0
    }

    /// Serialize header and body
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.write_u8(self.version)?;
        header.write_u8(self.flags)?;
        header.write_i16::<BigEndian>(self.stream)?;
        header.write_u8(self.opcode as u8)?;
        header.write_u32::<BigEndian>(self.body.len() as u32)?;
        out.write_all(&header)?;
        out.write_all(&self.body)?;
        out.flush()
    }

    /// Read one frame
    ///
    /// I/O failures are returned as they are; malformed headers become
    /// protocol errors.
    pub fn read_from<R: Read>(input: &mut R) -> std::result::Result<Frame, FrameError> {
        let version = input.read_u8()?;
        let flags = input.read_u8()?;
        let stream = input.read_i16::<BigEndian>()?;
        let opcode_byte = input.read_u8()?;
        let length = input.read_u32::<BigEndian>()?;

        if version & !RESPONSE_BIT != PROTOCOL_VERSION {
            return Err(FrameError::Invalid(format!(
                "unsupported protocol version 0x{:02x}",
                version
            )));
        }
        let opcode = Opcode::from_u8(opcode_byte)
            .ok_or_else(|| FrameError::Invalid(format!("unknown opcode 0x{:02x}", opcode_byte)))?;
        if length > MAX_BODY_LEN {
            return Err(FrameError::Invalid(format!("frame body of {} bytes", length)));
        }
        let mut body = vec![0u8; length as usize];
        input.read_exact(&mut body)?;
        Ok(Frame {
            version,
            flags,
            stream,
            opcode,
            body,
        })
    }
}

/// Failure reading a frame
#[derive(Debug, Error)]
pub enum FrameError {
    /// Transport failure
    #[error("transport failure: {0}")]
    Io(#[from] io::Error),
    /// Bytes that are not a valid frame
    #[error("invalid frame: {0}")]
    Invalid(String),
}

impl From<FrameError> for cqldump_core::Error {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Io(e) => cqldump_core::Error::Connection(e.to_string()),
            FrameError::Invalid(reason) => cqldump_core::Error::Protocol(reason),
        }
    }
}
