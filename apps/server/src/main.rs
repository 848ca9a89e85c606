// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grevit Server - headless receiver for component collections.
//!
//! Listens for Grevit senders, applies every received collection onto an
//! in-memory document and answers each connection with the document's
//! current catalog. After each applied collection a fresh listener is
//! bound, so senders can keep pushing updates.
//!
//! # Environment
//!
//! - `GREVIT_BIND` - listen address (default `0.0.0.0`)
//! - `GREVIT_PORT` - listen port (default `8002`)
//! - `GREVIT_TIMEOUT_MS` - socket timeout per line (default `10000`)
//! - `GREVIT_GRACE_MS` - delay before the listener closes (default `1000`)
//! - `GREVIT_CATALOG` - JSON catalog of preloaded families
//! - `GREVIT_SNAPSHOT_DIR` - directory receiving payloads and run reports
//! - `GREVIT_LOG_FORMAT` - `json` for JSON log lines (default pretty)

use anyhow::Context;
use grevit_sync::{default_router, MemoryDocument, Reconciler};
use grevit_transport::Receiver;

mod config;
mod error;
mod session;

use config::Config;
use session::ReportRecord;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Initialize logging
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,grevit_server=debug,grevit_sync=debug".into());
    if config.log_json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .init();
    }

    tracing::info!(
        bind = %config.bind,
        port = config.port,
        timeout_ms = config.timeout_ms,
        grace_ms = config.grace_ms,
        catalog = ?config.catalog_path,
        snapshot_dir = ?config.snapshot_dir,
        "Starting Grevit Server"
    );

    let catalog = config.load_catalog()?;
    let mut document = MemoryDocument::with_catalog(catalog);
    let reconciler = Reconciler::new(default_router());

    let mut session = 0u64;
    loop {
        let receiver = Receiver::bind(config.receiver(), &document.catalog())
            .await
            .context("binding receiver")?;

        let stop = receiver.stop_handle();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                stop.stop();
            }
        });

        let received = receiver.run().await;
        ctrl_c.abort();

        let collection = match received {
            Ok(Some(collection)) => collection,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "Receiver failed");
                return Err(err.into());
            }
        };

        session += 1;
        let report = session::apply(session, &mut document, &reconciler, &collection);

        if let Some(dir) = &config.snapshot_dir {
            let record = report
                .as_ref()
                .map(|report| ReportRecord::new(session, report, &document));
            match session::write_snapshot(dir, session, &collection, record.as_ref()) {
                Ok(path) => tracing::debug!(session, path = %path.display(), "Snapshot written"),
                Err(err) => tracing::warn!(session, error = %err, "Snapshot failed"),
            }
        }
    }

    tracing::info!(sessions = session, elements = document.len(), "Grevit Server stopped");
    Ok(())
}
