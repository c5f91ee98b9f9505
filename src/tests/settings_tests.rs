// Settings Tests

use crate::settings::{Settings, SSDP_MULTICAST};
use crate::upnp::IgdNextBackend;
use crate::Error;
use std::net::SocketAddr;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.lease_duration_secs, 0);
    assert_eq!(settings.bind_address, "0.0.0.0:0".parse::<SocketAddr>().unwrap());
    assert_eq!(settings.broadcast_address, SSDP_MULTICAST);
    assert_eq!(settings.broadcast_address.to_string(), "239.255.255.250:1900");
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn test_settings_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load(dir.path().join("nope.json")).expect("Failed to load");

    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_load_empty_file() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "  \n").unwrap();

    let settings = Settings::load(file.path()).expect("Failed to load");
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("upnp.json");

    let mut settings = Settings::default();
    settings.lease_duration_secs = 3600;
    settings.bind_address = "192.168.1.20:0".parse().unwrap();
    settings.log_filter = "igd_primitives=debug".to_string();
    settings.save(&path).expect("Failed to save");

    let loaded = Settings::load(&path).expect("Failed to load");
    assert_eq!(loaded, settings);
}

#[test]
fn test_settings_partial_file_uses_defaults() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), r#"{ "lease_duration_secs": 600 }"#).unwrap();

    let settings = Settings::load(file.path()).expect("Failed to load");
    assert_eq!(settings.lease_duration_secs, 600);
    assert_eq!(settings.broadcast_address, SSDP_MULTICAST);
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn test_settings_malformed_file() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "{ not json").unwrap();

    let err = Settings::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("Failed to parse settings")));
}

#[test]
fn test_backend_from_settings() {
    let mut settings = Settings::default();
    settings.broadcast_address = "192.168.1.255:1900".parse().unwrap();

    let backend = IgdNextBackend::from_settings(&settings);
    let debug = format!("{:?}", backend);
    assert!(debug.contains("192.168.1.255:1900"));
}

#[test]
fn test_init_with_filter_is_idempotent() {
    crate::init_with_filter("igd_primitives=debug");
    crate::init_with_filter("warn");
}

#[test]
fn test_settings_init_logging_uses_filter() {
    let mut settings = Settings::default();
    settings.log_filter = "igd_primitives=trace".to_string();

    settings.init_logging();
    settings.init_logging();
}
