//! Native protocol connection
//!
//! One connection, one request in flight. Requests carry increasing stream
//! ids; frames for other streams (server events) are skipped.
//!
//! # Handshake
//!
//! ```text
//! STARTUP {CQL_VERSION: 3.0.0}  ->  READY
//!                               ->  AUTHENTICATE <class>
//! AUTH_RESPONSE \0user\0pass    ->  AUTH_SUCCESS
//! ```

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use cqldump_core::{ConsistencyLevel, Error, Result};
use tracing::{debug, info};

use crate::codec::BodyWriter;
use crate::frame::{Frame, FrameError, Opcode};
use crate::options::ConnectOptions;
use crate::response::{QueryResult, Response};

/// CQL version announced in STARTUP
pub const CQL_VERSION: &str = "3.0.0";

const QUERY_FLAG_PAGE_SIZE: u8 = 0x04;
const QUERY_FLAG_PAGING_STATE: u8 = 0x08;

/// A handshaken connection over any byte transport
pub struct Connection<T: Read + Write = TcpStream> {
    transport: T,
    next_stream: i16,
}

impl Connection<TcpStream> {
    /// Connect to the first reachable address of `options.host`
    pub fn open(options: &ConnectOptions) -> Result<Self> {
        let addrs = (options.host.as_str(), options.port)
            .to_socket_addrs()
            .map_err(|e| Error::Connection(format!("can't resolve {}: {}", options.host, e)))?;

        let mut last_error = None;
        for addr in addrs {
            debug!(%addr, "Connecting");
            match TcpStream::connect_timeout(&addr, options.connect_timeout()) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(options.request_timeout()))?;
                    stream.set_write_timeout(Some(options.request_timeout()))?;
                    stream.set_nodelay(true)?;
                    let mut connection = Connection::new(stream);
                    connection.startup(options.credentials())?;
                    info!(%addr, "Connected");
                    return Ok(connection);
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(Error::Connection(match last_error {
            Some(e) => format!("can't connect to {}:{}: {}", options.host, options.port, e),
            None => format!("no address for {}", options.host),
        }))
    }
}

impl<T: Read + Write> Connection<T> {
    /// Wrap a transport; no handshake yet
    pub fn new(transport: T) -> Self {
        Connection {
            transport,
            next_stream: 1,
        }
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// STARTUP, plus password authentication when the server asks for it
    pub fn startup(&mut self, credentials: Option<(&str, &str)>) -> Result<()> {
        let mut body = BodyWriter::new();
        body.string_map(&[("CQL_VERSION", CQL_VERSION)]);
        match self.request(Opcode::Startup, body.into_bytes())? {
            Response::Ready => Ok(()),
            Response::Authenticate(class) => {
                let Some((user, password)) = credentials else {
                    return Err(Error::configuration(format!(
                        "server requires authentication ({}); set --protocol-version, --username and --password",
                        class
                    )));
                };
                debug!(authenticator = %class, "Authenticating");
                let mut token = Vec::with_capacity(user.len() + password.len() + 2);
                token.push(0);
                token.extend_from_slice(user.as_bytes());
                token.push(0);
                token.extend_from_slice(password.as_bytes());
                let mut body = BodyWriter::new();
                body.bytes(Some(token.as_slice()));
                match self.request(Opcode::AuthResponse, body.into_bytes())? {
                    Response::AuthSuccess => Ok(()),
                    other => Err(unexpected("AUTH_RESPONSE", &other)),
                }
            }
            other => Err(unexpected("STARTUP", &other)),
        }
    }

    /// Run one QUERY and return its result
    ///
    /// `page_size` asks for paged rows; `paging_state` continues a previous
    /// page.
    pub fn query(
        &mut self,
        cql: &str,
        consistency: ConsistencyLevel,
        page_size: Option<i32>,
        paging_state: Option<&[u8]>,
    ) -> Result<QueryResult> {
        let mut flags = 0u8;
        if page_size.is_some() {
            flags |= QUERY_FLAG_PAGE_SIZE;
        }
        if paging_state.is_some() {
            flags |= QUERY_FLAG_PAGING_STATE;
        }
        let mut body = BodyWriter::new();
        body.long_string(cql).short(consistency.code()).byte(flags);
        if let Some(size) = page_size {
            body.int(size);
        }
        if let Some(state) = paging_state {
            body.bytes(Some(state));
        }
        match self.request(Opcode::Query, body.into_bytes())? {
            Response::Result(result) => Ok(result),
            other => Err(unexpected("QUERY", &other)),
        }
    }

    /// Send a request and wait for its response; server errors become
    /// [`Error::Server`]
    fn request(&mut self, opcode: Opcode, body: Vec<u8>) -> Result<Response> {
        let stream = self.next_stream;
        self.next_stream = if stream == i16::MAX { 1 } else { stream + 1 };

        Frame::request(stream, opcode, body)
            .write_to(&mut self.transport)
            .map_err(transport_error)?;
        loop {
            let frame = Frame::read_from(&mut self.transport).map_err(|e| match e {
                FrameError::Io(e) => transport_error(e),
                invalid => invalid.into(),
            })?;
            if frame.stream != stream {
                debug!(stream = frame.stream, opcode = ?frame.opcode, "Skipping frame");
                continue;
            }
            return match Response::decode(&frame)? {
                Response::Error { code, message } => Err(Error::Server { code, message }),
                response => Ok(response),
            };
        }
    }
}

fn transport_error(e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => {
            Error::Connection("request timed out".to_string())
        }
        _ => Error::Connection(e.to_string()),
    }
}

fn unexpected(request: &str, response: &Response) -> Error {
    Error::Protocol(format!("unexpected response to {}: {:?}", request, response))
}
