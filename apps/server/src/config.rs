// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use grevit_core::{codec, Catalog};
use grevit_transport::ReceiverConfig;

use crate::error::ServerError;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Per-line socket timeout in milliseconds.
    pub timeout_ms: u64,
    /// Delay before the listener closes after a collection arrived.
    pub grace_ms: u64,
    /// JSON catalog of families preloaded into the document.
    pub catalog_path: Option<PathBuf>,
    /// Directory receiving each payload and its run report.
    pub snapshot_dir: Option<PathBuf>,
    /// Emit logs as JSON lines instead of the pretty format.
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            bind: std::env::var("GREVIT_BIND")
                .unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("GREVIT_PORT")
                .unwrap_or_else(|_| "8002".into())
                .parse()
                .unwrap_or(8002),
            timeout_ms: std::env::var("GREVIT_TIMEOUT_MS")
                .unwrap_or_else(|_| "10000".into())
                .parse()
                .unwrap_or(10_000),
            grace_ms: std::env::var("GREVIT_GRACE_MS")
                .unwrap_or_else(|_| "1000".into())
                .parse()
                .unwrap_or(1000),
            catalog_path: std::env::var("GREVIT_CATALOG")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            snapshot_dir: std::env::var("GREVIT_SNAPSHOT_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            log_json: std::env::var("GREVIT_LOG_FORMAT")
                .map(|format| is_json_format(&format))
                .unwrap_or(false),
        }
    }

    pub fn receiver(&self) -> ReceiverConfig {
        ReceiverConfig {
            bind: self.bind.clone(),
            port: self.port,
            timeout: Duration::from_millis(self.timeout_ms),
            grace_delay: Duration::from_millis(self.grace_ms),
        }
    }

    /// Reads the preloaded catalog, empty when none is configured.
    pub fn load_catalog(&self) -> Result<Catalog, ServerError> {
        let Some(path) = &self.catalog_path else {
            return Ok(Catalog::new());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::Catalog {
            path: path.clone(),
            source,
        })?;
        codec::decode_catalog(text.trim()).map_err(|source| ServerError::CatalogFormat {
            path: path.clone(),
            source,
        })
    }
}

fn is_json_format(format: &str) -> bool {
    format.trim().eq_ignore_ascii_case("json")
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
