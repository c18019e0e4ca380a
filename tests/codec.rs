//! Payload encoding, cache keys and the self-test.

use anyhow::Result;
use appsload::codec::{
    SAMPLE_LINE, decode, decode_entry, encode, record_key, self_test, split_key,
};
use appsload::record::parse_appsinstalled;
use appsload::testing::MemorySink;
use appsload::{AppsInstalled, UserApps};

fn record(dev_id: &str, apps: Vec<u32>) -> AppsInstalled {
    AppsInstalled {
        dev_type: "gaid".to_string(),
        dev_id: dev_id.to_string(),
        lat: -33.8688,
        lon: 151.2093,
        apps,
    }
}

#[test]
fn decode_restores_encoded_payload() -> Result<()> {
    let rec = record("7d2c", vec![5, 1, 5, 4_000_000_000]);
    let ua = decode(&encode(&rec)?)?;
    assert_eq!(
        ua,
        UserApps {
            lat: -33.8688,
            lon: 151.2093,
            apps: vec![5, 1, 5, 4_000_000_000],
        }
    );
    Ok(())
}

#[test]
fn full_record_survives_key_and_payload() -> Result<()> {
    let rec = record("id:with:colons", vec![1, 2, 3]);
    let key = record_key(&rec);
    assert_eq!(key, "gaid:id:with:colons");
    assert_eq!(split_key(&key), Some(("gaid", "id:with:colons")));
    assert_eq!(decode_entry(&key, &encode(&rec)?)?, rec);
    Ok(())
}

#[test]
fn encoding_is_deterministic() -> Result<()> {
    let rec = record("abc", vec![10, 20, 30]);
    assert_eq!(encode(&rec)?, encode(&rec.clone())?);
    Ok(())
}

#[test]
fn key_without_separator_cannot_be_decoded() -> Result<()> {
    let rec = record("abc", vec![1]);
    assert!(decode_entry("nocolon", &encode(&rec)?).is_err());
    Ok(())
}

#[test]
fn truncated_payload_is_an_error() -> Result<()> {
    let payload = encode(&record("abc", vec![1, 2, 3]))?;
    assert!(decode(&payload[..payload.len() - 1]).is_err());
    Ok(())
}

#[test]
fn display_is_single_line() {
    let ua = UserApps {
        lat: 55.55,
        lon: 42.42,
        apps: vec![1423, 43],
    };
    assert_eq!(ua.to_string(), "lat: 55.55 lon: 42.42 apps: 1423 apps: 43");
}

#[test]
fn self_test_passes_on_sample() -> Result<()> {
    let sink = MemorySink::new();
    self_test(&sink)?;
    assert!(sink.contains("Self-test passed: idfa:1rfw452y52g2gq4g"));

    let rec = parse_appsinstalled(SAMPLE_LINE, &sink)?;
    assert_eq!(rec.apps, vec![1423, 43, 567]);
    Ok(())
}
