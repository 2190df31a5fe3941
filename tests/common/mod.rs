// Common test utilities and helpers
#![allow(dead_code)]

use serde_json::{json, Value};
use session_bootstrap::{resolve, BootstrapResult, CliOptions, FileConfig, SessionConfiguration, SessionDefaults};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const COINBASE_KEY: &str = "0123456789abcdef0123456789abcdef";
pub const COINBASE_SECRET: &str = "c2VjcmV0LXNlY3JldC1zZWNyZXQ+/w==";
pub const COINBASE_PASSPHRASE: &str = "abc123def4";
pub const COINBASE_URL: &str = "https://api.pro.coinbase.com";
pub const BINANCE_URL: &str = "https://api.binance.com";

pub fn binance_key() -> String {
    "Kx7".repeat(21) + "A"
}

pub fn binance_secret() -> String {
    "s3Cr".repeat(16)
}

/// Nested coinbasepro block with the given `config` settings
pub fn coinbase_block(settings: Value) -> Value {
    json!({
        "api_key": COINBASE_KEY,
        "api_secret": COINBASE_SECRET,
        "api_passphrase": COINBASE_PASSPHRASE,
        "api_url": COINBASE_URL,
        "config": settings
    })
}

/// Nested binance block with the given `config` settings
pub fn binance_block(settings: Value) -> Value {
    json!({
        "api_key": binance_key(),
        "api_secret": binance_secret(),
        "api_url": BINANCE_URL,
        "config": settings
    })
}

pub fn coinbase_file(settings: Value) -> FileConfig {
    FileConfig::from_value(json!({ "coinbasepro": coinbase_block(settings) })).expect("valid document")
}

pub fn binance_file(settings: Value) -> FileConfig {
    FileConfig::from_value(json!({ "binance": binance_block(settings) })).expect("valid document")
}

pub fn resolve_with(file: &FileConfig, cli: CliOptions) -> BootstrapResult<SessionConfiguration> {
    resolve(&SessionDefaults::default(), file, &cli)
}

pub fn dummy_cli() -> CliOptions {
    CliOptions {
        exchange: Some("dummy".to_string()),
        ..Default::default()
    }
}

/// Write a config document into a fresh temp directory
pub fn write_config(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join(name);
    fs::write(&path, content).expect("Failed to write config file");
    (temp_dir, path)
}
