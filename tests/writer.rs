//! Cache writes: dry-run, stubbed clients and the memcached protocol.

use anyhow::Result;
use appsload::codec::{decode, encode};
use appsload::logging::LogLevel;
use appsload::testing::{MemorySink, StubClient};
use appsload::writer::{CacheClient, CacheWriter, MemcacheClient};
use appsload::{AppsInstalled, WriteError};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn payload() -> Vec<u8> {
    encode(&AppsInstalled {
        dev_type: "idfa".to_string(),
        dev_id: "abc".to_string(),
        lat: 55.55,
        lon: 42.42,
        apps: vec![1423, 43, 567],
    })
    .expect("encode")
}

/// Accept one connection, capture the `set` request and answer with `reply`.
fn fake_memcached(reply: &'static str) -> Result<(String, thread::JoinHandle<(String, Vec<u8>)>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let address = listener.local_addr()?.to_string();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut header = String::new();
        reader.read_line(&mut header).expect("header");
        let len: usize = header
            .trim_end()
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .expect("length");
        let mut body = vec![0u8; len + 2];
        reader.read_exact(&mut body).expect("body");
        body.truncate(len);
        (&stream).write_all(reply.as_bytes()).expect("reply");
        (header, body)
    });
    Ok((address, handle))
}

#[test]
fn dry_run_logs_without_touching_client() {
    let sink = Arc::new(MemorySink::new());
    let client = Arc::new(StubClient::failing());
    let writer = CacheWriter::new(client.clone(), true, sink.clone());

    assert!(writer.write("127.0.0.1:33013", "idfa:abc", &payload()));
    assert!(client.puts().is_empty());
    assert_eq!(
        sink.find(LogLevel::Debug, "127.0.0.1:33013 - idfa:abc -> lat: 55.55 lon: 42.42 apps: 1423 apps: 43 apps: 567")
            .len(),
        1
    );
}

#[test]
fn live_write_reaches_client() -> Result<()> {
    let sink = Arc::new(MemorySink::new());
    let client = Arc::new(StubClient::new());
    let writer = CacheWriter::new(client.clone(), false, sink);

    assert!(writer.write("10.0.0.1:11211", "idfa:abc", &payload()));
    let puts = client.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].0, "10.0.0.1:11211");
    assert_eq!(puts[0].1, "idfa:abc");
    assert_eq!(decode(&puts[0].2)?.apps, vec![1423, 43, 567]);
    Ok(())
}

#[test]
fn failed_write_is_logged_and_reported() {
    let sink = Arc::new(MemorySink::new());
    let writer = CacheWriter::new(Arc::new(StubClient::failing()), false, sink.clone());

    assert!(!writer.write("10.0.0.1:11211", "idfa:abc", &payload()));
    let errors = sink.find(LogLevel::Error, "Cannot write to memc 10.0.0.1:11211");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("SERVER_ERROR stub"));
}

#[test]
fn memcache_client_sends_set_command() -> Result<()> {
    let (address, server) = fake_memcached("STORED\r\n")?;
    let client = MemcacheClient::new(Duration::from_secs(1));
    let value = payload();

    client.put(&address, "idfa:abc", &value)?;

    let (header, body) = server.join().expect("server thread");
    assert_eq!(header, format!("set idfa:abc 0 0 {}\r\n", value.len()));
    assert_eq!(body, value);
    Ok(())
}

#[test]
fn memcache_client_reports_rejection() -> Result<()> {
    let (address, server) = fake_memcached("SERVER_ERROR out of memory\r\n")?;
    let client = MemcacheClient::default();

    let err = client.put(&address, "idfa:abc", &payload()).unwrap_err();
    server.join().expect("server thread");
    match err {
        WriteError::Rejected { reply, .. } => assert_eq!(reply, "SERVER_ERROR out of memory"),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn memcache_client_fails_on_closed_port() -> Result<()> {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.to_string()
    };
    let client = MemcacheClient::new(Duration::from_millis(200));
    assert!(matches!(
        client.put(&address, "idfa:abc", &payload()),
        Err(WriteError::Connect { .. })
    ));
    Ok(())
}

#[test]
fn memcache_client_rejects_bad_key_before_connecting() {
    let client = MemcacheClient::default();
    assert!(matches!(
        client.put("127.0.0.1:1", "idfa:has space", &payload()),
        Err(WriteError::InvalidKey { .. })
    ));
}

#[test]
fn unresolvable_address_is_an_error() {
    let client = MemcacheClient::default();
    assert!(matches!(
        client.put("not-an-address", "idfa:abc", &payload()),
        Err(WriteError::Resolve { .. })
    ));
}
