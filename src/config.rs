//! Centralized configuration for advault.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - AdvConfig::from_env() reads ADV_* variables; fluent setters override them.
//!
//! Defaults:
//! - fsync = true (block device writes are synced after both copies)
//! - config_tag = 0x0A
//! - mirror_fallback = true (read the mirror copy when the primary is invalid)

use std::fmt;

use crate::consts::CONFIG_TAG;

/// Top-level configuration for reading/writing an ADV device.
#[derive(Clone, Debug)]
pub struct AdvConfig {
    /// sync_all() after writing both copies.
    /// Env: ADV_FSYNC (default true; "0|false|off|no" => false)
    pub fsync: bool,

    /// Tag id that carries the configuration document.
    /// Env: ADV_CONFIG_TAG (decimal or 0x-hex, default 0x0A)
    pub config_tag: u8,

    /// When the primary copy is invalid, try the mirror at RECORD_LENGTH.
    /// Env: ADV_MIRROR_FALLBACK (default true)
    pub mirror_fallback: bool,
}

impl Default for AdvConfig {
    fn default() -> Self {
        Self {
            fsync: true,
            config_tag: CONFIG_TAG,
            mirror_fallback: true,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let v = std::env::var(name).ok()?;
    let s = v.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Разобрать id тега: десятичный, 0x-hex, 0o, 0b.
pub fn parse_tag(s: &str) -> Result<u8, String> {
    let s = s.trim();
    if let Some(x) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(x, 16).map_err(|e| e.to_string())
    } else if let Some(x) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        u8::from_str_radix(x, 8).map_err(|e| e.to_string())
    } else if let Some(x) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        u8::from_str_radix(x, 2).map_err(|e| e.to_string())
    } else {
        s.parse::<u8>().map_err(|e| e.to_string())
    }
}

impl AdvConfig {
    /// Load configuration from environment variables. Unparsable values keep defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(on) = env_flag("ADV_FSYNC") {
            cfg.fsync = on;
        }

        if let Ok(v) = std::env::var("ADV_CONFIG_TAG") {
            if let Ok(t) = parse_tag(&v) {
                cfg.config_tag = t;
            }
        }

        if let Some(on) = env_flag("ADV_MIRROR_FALLBACK") {
            cfg.mirror_fallback = on;
        }

        cfg
    }

    pub fn with_fsync(mut self, on: bool) -> Self {
        self.fsync = on;
        self
    }

    pub fn with_config_tag(mut self, tag: u8) -> Self {
        self.config_tag = tag;
        self
    }

    pub fn with_mirror_fallback(mut self, on: bool) -> Self {
        self.mirror_fallback = on;
        self
    }
}

impl fmt::Display for AdvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AdvConfig {{ fsync: {}, config_tag: {:#04x}, mirror_fallback: {} }}",
            self.fsync, self.config_tag, self.mirror_fallback
        )
    }
}
