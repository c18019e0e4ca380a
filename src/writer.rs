//! Routed cache writes.
//!
//! [`CacheClient`] is the capability the loader needs from a cache: store
//! bytes under a key at an address. [`MemcacheClient`] speaks the memcached
//! text protocol. [`CacheWriter`] wraps a client, adds dry-run handling, and
//! turns every failure into a logged `false` so callers only count outcomes.

use crate::codec;
use crate::error::WriteError;
use crate::sink::Sink;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

/// Longest key memcached accepts.
pub const MAX_KEY_LEN: usize = 250;

/// Default connect and I/O timeout for a single write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Store `value` under `key` on the cache node at `address`.
///
/// Implementations must not retry; a failed put is reported once.
pub trait CacheClient: Send + Sync {
    /// # Errors
    ///
    /// Any [`WriteError`]: the address does not resolve, the node is
    /// unreachable or times out, the key is invalid, or the node does not
    /// reply `STORED`.
    fn put(&self, address: &str, key: &str, value: &[u8]) -> Result<(), WriteError>;
}

/// Memcached text-protocol client. Opens one connection per put.
#[derive(Debug, Clone)]
pub struct MemcacheClient {
    timeout: Duration,
}

impl MemcacheClient {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn connect(&self, address: &str) -> Result<TcpStream, WriteError> {
        let addrs = address.to_socket_addrs().map_err(|e| WriteError::Resolve {
            address: address.to_string(),
            source: Some(e),
        })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(match last_err {
            Some(source) => WriteError::Connect {
                address: address.to_string(),
                source,
            },
            None => WriteError::Resolve {
                address: address.to_string(),
                source: None,
            },
        })
    }
}

impl Default for MemcacheClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl CacheClient for MemcacheClient {
    fn put(&self, address: &str, key: &str, value: &[u8]) -> Result<(), WriteError> {
        validate_key(key)?;
        let stream = self.connect(address)?;
        let io_err = |source| WriteError::Io {
            address: address.to_string(),
            source,
        };
        stream.set_read_timeout(Some(self.timeout)).map_err(io_err)?;
        stream.set_write_timeout(Some(self.timeout)).map_err(io_err)?;
        stream.set_nodelay(true).map_err(io_err)?;

        let mut request = format!("set {key} 0 0 {}\r\n", value.len()).into_bytes();
        request.extend_from_slice(value);
        request.extend_from_slice(b"\r\n");
        (&stream).write_all(&request).map_err(io_err)?;

        let mut reply = String::new();
        BufReader::new(&stream)
            .read_line(&mut reply)
            .map_err(io_err)?;
        match reply.trim_end() {
            "STORED" => Ok(()),
            "" => Err(WriteError::Rejected {
                address: address.to_string(),
                reply: "connection closed without reply".to_string(),
            }),
            other => Err(WriteError::Rejected {
                address: address.to_string(),
                reply: other.to_string(),
            }),
        }
    }
}

/// Reject keys memcached would refuse: empty, too long, or containing
/// whitespace and control bytes.
///
/// # Examples
///
/// ```
/// use appsload::writer::validate_key;
///
/// assert!(validate_key("idfa:1rfw452y52g2gq4g").is_ok());
/// assert!(validate_key("idfa:two words").is_err());
/// ```
///
/// # Errors
///
/// [`WriteError::InvalidKey`] naming the reason.
pub fn validate_key(key: &str) -> Result<(), WriteError> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key.len() > MAX_KEY_LEN {
        "key is longer than 250 bytes"
    } else if key.bytes().any(|b| b <= b' ' || b == 0x7f) {
        "key contains whitespace or control characters"
    } else {
        return Ok(());
    };
    Err(WriteError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

/// Performs routed writes, or only logs them in dry-run mode.
#[derive(Clone)]
pub struct CacheWriter {
    client: Arc<dyn CacheClient>,
    dry_run: bool,
    sink: Arc<dyn Sink>,
}

impl CacheWriter {
    pub fn new(client: Arc<dyn CacheClient>, dry_run: bool, sink: Arc<dyn Sink>) -> Self {
        Self {
            client,
            dry_run,
            sink,
        }
    }

    /// Write `payload` under `key` at `address`. Returns `true` on success.
    ///
    /// Dry-run never touches the client and always succeeds.
    pub fn write(&self, address: &str, key: &str, payload: &[u8]) -> bool {
        if self.dry_run {
            let rendered = match codec::decode(payload) {
                Ok(ua) => ua.to_string(),
                Err(e) => format!("<{} undecodable bytes: {e}>", payload.len()),
            };
            self.sink.debug(&format!("{address} - {key} -> {rendered}"));
            return true;
        }

        match self.client.put(address, key, payload) {
            Ok(()) => {
                self.sink.debug(&format!("Stored {key} at {address}"));
                true
            }
            Err(e) => {
                self.sink
                    .exception(&format!("Cannot write to memc {address}"), &e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_regular_keys() {
        assert!(validate_key("idfa:1rfw452y52g2gq4g").is_ok());
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("idfa:has space").is_err());
        assert!(validate_key("idfa:tab\there").is_err());
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN + 1)).is_err());
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN)).is_ok());
    }
}
