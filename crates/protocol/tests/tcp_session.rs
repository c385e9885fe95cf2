//! NativeSession against a scripted server on a loopback socket.

use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use cqldump_core::{ConsistencyLevel, CqlValue, Error, Session};
use cqldump_protocol::codec::{BodyReader, BodyWriter};
use cqldump_protocol::frame::{PROTOCOL_VERSION, RESPONSE_BIT};
use cqldump_protocol::{ConnectOptions, Frame, NativeSession, Opcode};

/// Serve one connection: for each scripted reply, read a request and answer
/// on the same stream id. Returns the requests seen.
fn serve(replies: Vec<(Opcode, Vec<u8>)>) -> (u16, JoinHandle<Vec<Frame>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        let mut seen = Vec::new();
        for (opcode, body) in replies {
            let request = Frame::read_from(&mut socket).unwrap();
            let reply = Frame {
                version: PROTOCOL_VERSION | RESPONSE_BIT,
                flags: 0,
                stream: request.stream,
                opcode,
                body,
            };
            reply.write_to(&mut socket).unwrap();
            seen.push(request);
        }
        seen
    });
    (port, handle)
}

fn options(port: u16) -> ConnectOptions {
    ConnectOptions::new().with_host("127.0.0.1").with_port(port)
}

fn void() -> Vec<u8> {
    let mut body = BodyWriter::new();
    body.int(0x0001);
    body.into_bytes()
}

fn int_rows(values: &[i32]) -> Vec<u8> {
    let mut body = BodyWriter::new();
    body.int(0x0002).int(0x0001).int(1);
    body.string("ks").string("t").string("id").short(0x0009);
    body.int(values.len() as i32);
    for v in values {
        body.bytes(Some(&v.to_be_bytes()[..]));
    }
    body.into_bytes()
}

#[test]
fn test_startup_and_query() {
    let (port, server) = serve(vec![
        (Opcode::Ready, Vec::new()),
        (Opcode::Result, int_rows(&[4, 2])),
    ]);

    let mut session = NativeSession::connect(&options(port)).unwrap();
    let mut rows = Vec::new();
    {
        let mut cursor = session
            .query("SELECT id FROM ks.t", ConsistencyLevel::One)
            .unwrap();
        assert_eq!(cursor.columns()[0].name, "id");
        while let Some(row) = cursor.next_row().unwrap() {
            rows.push(row);
        }
    }
    assert_eq!(rows, vec![vec![CqlValue::Int(4)], vec![CqlValue::Int(2)]]);

    let requests = server.join().unwrap();
    assert_eq!(requests[0].opcode, Opcode::Startup);
    assert_eq!(requests[1].opcode, Opcode::Query);
    let mut body = BodyReader::new(&requests[1].body);
    assert_eq!(body.long_string().unwrap(), "SELECT id FROM ks.t");
    assert_eq!(body.short().unwrap(), ConsistencyLevel::One.code());
}

#[test]
fn test_password_authentication() {
    let (port, server) = serve(vec![
        (Opcode::Authenticate, {
            let mut body = BodyWriter::new();
            body.string("org.apache.cassandra.auth.PasswordAuthenticator");
            body.into_bytes()
        }),
        (Opcode::AuthSuccess, {
            let mut body = BodyWriter::new();
            body.bytes(None);
            body.into_bytes()
        }),
        (Opcode::Result, void()),
    ]);

    let options = options(port)
        .with_protocol_version(4)
        .with_credentials("admin", "secret");
    let mut session = NativeSession::connect(&options).unwrap();
    session
        .execute("DROP TABLE IF EXISTS ks.t", ConsistencyLevel::All)
        .unwrap();

    let requests = server.join().unwrap();
    assert_eq!(requests[1].opcode, Opcode::AuthResponse);
    let mut body = BodyReader::new(&requests[1].body);
    assert_eq!(body.bytes().unwrap(), Some(&b"\0admin\0secret"[..]));
}

#[test]
fn test_server_error_on_execute() {
    let (port, server) = serve(vec![
        (Opcode::Ready, Vec::new()),
        (Opcode::Error, {
            let mut body = BodyWriter::new();
            body.int(0x2200).string("unconfigured table t");
            body.into_bytes()
        }),
    ]);

    let mut session = NativeSession::connect(&options(port)).unwrap();
    let err = session
        .execute("INSERT INTO ks.t (id) VALUES (1)", ConsistencyLevel::One)
        .unwrap_err();
    match err {
        Error::Execution { statement, reason } => {
            assert!(statement.starts_with("INSERT"));
            assert!(reason.contains("unconfigured table"));
        }
        other => panic!("unexpected {:?}", other),
    }
    server.join().unwrap();
}

#[test]
fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    match NativeSession::connect(&options(port).with_connect_timeout_secs(1)) {
        Err(err) => assert!(matches!(err, Error::Connection(_))),
        Ok(_) => panic!("connected to a closed port"),
    }
}
