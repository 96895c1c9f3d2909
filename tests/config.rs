#![cfg(feature = "serde")]

use std::time::Duration;

use config::{Config, File, FileFormat};
use idlepool::{PoolConfig, DEFAULT_RECLAIM_INTERVAL};

fn load(json: &str) -> PoolConfig {
    Config::builder()
        .add_source(File::from_str(json, FileFormat::Json))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

#[test]
fn from_json() {
    let cfg = load(
        r#"{
            "idle_ttl": { "secs": 30, "nanos": 0 },
            "reclaim_interval": { "secs": 5, "nanos": 0 }
        }"#,
    );
    assert_eq!(cfg.idle_ttl, Duration::from_secs(30));
    assert_eq!(cfg.reclaim_interval, Duration::from_secs(5));
}

#[test]
fn missing_fields_use_defaults() {
    let cfg = load(r#"{ "idle_ttl": { "secs": 120, "nanos": 0 } }"#);
    assert_eq!(cfg, PoolConfig::new(Duration::from_secs(120)));
    assert_eq!(cfg.reclaim_interval, DEFAULT_RECLAIM_INTERVAL);
}

#[test]
fn empty_is_default() {
    assert_eq!(load("{}"), PoolConfig::default());
}
