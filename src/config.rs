//! Client configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! The gateway, the session store and the CLI host all read from one
//! `ClientConfig`. Parsing is split into a pure `from_lookup` core so tests
//! never touch process-global environment state.

use std::path::PathBuf;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_BASE_URL: &str = "https://moneymanager-k9l6.onrender.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Value of `MONEY_SESSION_FILE` that disables durable session storage.
pub const MEMORY_STORAGE_SENTINEL: &str = "memory";

/// Path substrings that never receive an injected bearer credential.
pub const EXEMPT_PATHS: [&str; 3] = ["/login", "/register", "/activate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Where the session survives process restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub exempt_paths: Vec<String>,
    pub storage: StorageLocation,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            exempt_paths: EXEMPT_PATHS.iter().map(|p| (*p).to_owned()).collect(),
            storage: StorageLocation::Memory,
            timeouts: Timeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Build config from process environment variables.
    ///
    /// Optional:
    /// - `MONEY_API_BASE_URL`: remote API base address
    /// - `MONEY_SESSION_FILE`: session file path, or `memory`
    /// - `MONEY_REQUEST_TIMEOUT_SECS`: default 30
    /// - `MONEY_CONNECT_TIMEOUT_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = normalize_base_url(&lookup("MONEY_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()));
        let storage = match lookup("MONEY_SESSION_FILE") {
            Some(raw) => parse_storage_location(&raw),
            None => default_session_file(lookup("HOME").as_deref()),
        };
        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("MONEY_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("MONEY_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Self { base_url, storage, timeouts, ..Self::default() }
    }

    /// Override the base URL, applying the same normalization as `from_env`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    #[must_use]
    pub fn with_storage(mut self, storage: StorageLocation) -> Self {
        self.storage = storage;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

/// Interpret a session-file setting; blank or `memory` disables durable storage.
pub fn parse_storage_location(raw: &str) -> StorageLocation {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(MEMORY_STORAGE_SENTINEL) {
        StorageLocation::Memory
    } else {
        StorageLocation::File(PathBuf::from(trimmed))
    }
}

fn default_session_file(home: Option<&str>) -> StorageLocation {
    match home {
        Some(home) if !home.trim().is_empty() => {
            StorageLocation::File(PathBuf::from(home).join(".moneymanager").join("session.json"))
        }
        _ => StorageLocation::Memory,
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}
