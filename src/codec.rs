//! Binary payload stored per device.
//!
//! The payload holds coordinates and the app list; device type and id live in
//! the cache key (`"{dev_type}:{dev_id}"`). Payloads are `postcard`-encoded,
//! which is deterministic for a given [`UserApps`] value.

use crate::record::{AppsInstalled, parse_appsinstalled};
use crate::sink::Sink;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Line used by the self-test.
pub const SAMPLE_LINE: &str = "idfa\t1rfw452y52g2gq4g\t55.55\t42.42\t1423,43,567";

/// Value stored in the cache for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserApps {
    pub lat: f64,
    pub lon: f64,
    pub apps: Vec<u32>,
}

impl From<&AppsInstalled> for UserApps {
    fn from(rec: &AppsInstalled) -> Self {
        Self {
            lat: rec.lat,
            lon: rec.lon,
            apps: rec.apps.clone(),
        }
    }
}

/// One-line text rendering used for dry-run logs.
impl fmt::Display for UserApps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat: {} lon: {}", self.lat, self.lon)?;
        for app in &self.apps {
            write!(f, " apps: {app}")?;
        }
        Ok(())
    }
}

/// Cache key for a record.
#[must_use]
pub fn record_key(rec: &AppsInstalled) -> String {
    format!("{}:{}", rec.dev_type, rec.dev_id)
}

/// Split a key into `(dev_type, dev_id)` at the first colon.
#[must_use]
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':')
}

/// Encode the payload of `rec`.
///
/// # Errors
///
/// Returns the `postcard` error if serialization fails. With an in-memory
/// buffer this does not happen for well-formed values.
pub fn encode(rec: &AppsInstalled) -> Result<Vec<u8>, postcard::Error> {
    encode_user_apps(&UserApps::from(rec))
}

/// # Errors
///
/// Same as [`encode`].
pub fn encode_user_apps(ua: &UserApps) -> Result<Vec<u8>, postcard::Error> {
    postcard::to_allocvec(ua)
}

/// Decode a payload produced by [`encode`].
///
/// # Examples
///
/// ```
/// use appsload::codec::{UserApps, decode, encode_user_apps};
///
/// let ua = UserApps { lat: 55.55, lon: 42.42, apps: vec![1423, 43, 567] };
/// let bytes = encode_user_apps(&ua)?;
/// assert_eq!(decode(&bytes)?, ua);
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Fails on truncated or otherwise malformed bytes.
pub fn decode(payload: &[u8]) -> Result<UserApps, postcard::Error> {
    postcard::from_bytes(payload)
}

/// Rebuild the full record from a stored key and payload.
///
/// # Errors
///
/// Fails when `key` has no `:` separator or `payload` does not decode.
pub fn decode_entry(key: &str, payload: &[u8]) -> Result<AppsInstalled> {
    let (dev_type, dev_id) =
        split_key(key).with_context(|| format!("key {key:?} has no ':' separator"))?;
    let ua = decode(payload).with_context(|| format!("decode payload for {key}"))?;
    Ok(AppsInstalled {
        dev_type: dev_type.to_string(),
        dev_id: dev_id.to_string(),
        lat: ua.lat,
        lon: ua.lon,
        apps: ua.apps,
    })
}

/// Check the encode/decode round-trip on [`SAMPLE_LINE`].
///
/// # Errors
///
/// Fails if the sample does not parse, does not decode back to the same
/// record, or re-encodes to different bytes.
pub fn self_test(sink: &dyn Sink) -> Result<()> {
    let rec = parse_appsinstalled(SAMPLE_LINE, sink).context("parse sample line")?;
    let key = record_key(&rec);
    let packed = encode(&rec).context("encode sample record")?;
    let unpacked = decode_entry(&key, &packed)?;
    ensure!(
        unpacked == rec,
        "round-trip mismatch: {rec:?} became {unpacked:?}"
    );
    ensure!(
        encode(&unpacked).context("re-encode sample record")? == packed,
        "encoding of {key} is not stable"
    );
    sink.info(&format!("Self-test passed: {key} -> {}", UserApps::from(&rec)));
    Ok(())
}
