// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Receiving side of the handshake.
//!
//! A [`Receiver`] is a single-shot rendezvous: it accepts connections until
//! one of them delivers a collection with at least one component, then
//! stops listening and hands that collection back.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use grevit_core::{codec, Catalog, ComponentCollection};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinSet};

use crate::error::{Result, TransportError};
use crate::line::{read_line, write_line};
use crate::sender::{DEFAULT_PORT, DEFAULT_TIMEOUT};

/// Receiver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    pub bind: String,
    pub port: u16,
    /// Bound on each line read or written on an accepted connection.
    pub timeout: Duration,
    /// Pause before the listener is closed after a collection arrived.
    pub grace_delay: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            grace_delay: Duration::from_millis(1000),
        }
    }
}

impl ReceiverConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Default)]
struct StopState {
    stopped: AtomicBool,
    notify: Notify,
}

/// Cooperative stop request for a running [`Receiver`].
///
/// Checked before every accept. Connections already accepted still finish.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    state: Arc<StopState>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.state.stopped.store(true, Ordering::SeqCst);
        self.state.notify.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }
}

/// Bound listener waiting for one collection.
pub struct Receiver {
    listener: TcpListener,
    catalog_line: Arc<str>,
    config: ReceiverConfig,
    stop: StopHandle,
}

impl Receiver {
    /// Binds the listener. Every connection is answered with `catalog`.
    pub async fn bind(config: ReceiverConfig, catalog: &Catalog) -> Result<Self> {
        let catalog_line: Arc<str> = codec::encode_catalog(catalog)?.into();
        let addr = config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.clone(),
                source,
            })?;

        tracing::info!(address = %addr, "Receiver listening");

        Ok(Self {
            listener,
            catalog_line,
            config,
            stop: StopHandle::default(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Accepts until a non-empty collection arrives or a stop is requested.
    ///
    /// Returns `None` when stopped first. Malformed payloads, empty
    /// collections and failed connections are logged and ignored.
    pub async fn run(self) -> Result<Option<ComponentCollection>> {
        let mut tasks: JoinSet<Result<Option<ComponentCollection>>> = JoinSet::new();
        let mut received = None;

        while !self.stop.is_stopped() {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(peer = %peer, "Accepted connection");
                        tasks.spawn(handle_connection(
                            stream,
                            peer,
                            Arc::clone(&self.catalog_line),
                            self.config.timeout,
                        ));
                    }
                    Err(err) => tracing::warn!(error = %err, "Accept failed"),
                },
                Some(joined) = tasks.join_next() => {
                    if let Some(collection) = completed(joined) {
                        received = Some(collection);
                        break;
                    }
                }
                _ = self.stop.state.notify.notified() => {}
            }
        }

        // Connections already accepted run to completion.
        while let Some(joined) = tasks.join_next().await {
            if let Some(collection) = completed(joined) {
                if received.is_none() {
                    received = Some(collection);
                } else {
                    tracing::warn!(
                        items = collection.len(),
                        "Dropping collection that arrived after the first one"
                    );
                }
            }
        }

        if let Some(collection) = &received {
            tracing::info!(
                items = collection.len(),
                update = collection.update,
                delete = collection.delete,
                "Collection received"
            );
            tokio::time::sleep(self.config.grace_delay).await;
        } else {
            tracing::info!("Receiver stopped without a collection");
        }

        drop(self.listener);
        Ok(received)
    }
}

/// Unwraps a finished connection task, logging what went wrong.
fn completed(
    joined: std::result::Result<Result<Option<ComponentCollection>>, JoinError>,
) -> Option<ComponentCollection> {
    match joined {
        Ok(Ok(collection)) => collection,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Connection failed");
            None
        }
        Err(err) => {
            tracing::error!(error = %err, "Connection task panicked or was cancelled");
            None
        }
    }
}

/// Echo, catalog, decode. `None` for an empty collection.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    catalog_line: Arc<str>,
    after: Duration,
) -> Result<Option<ComponentCollection>> {
    stream.set_nodelay(true).ok();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let payload = read_line(&mut reader, "payload", after).await?;
    write_line(&mut write_half, &payload, "echo", after).await?;
    write_line(&mut write_half, &catalog_line, "catalog", after).await?;

    let collection = codec::decode(&payload)?;
    if collection.is_empty() {
        tracing::info!(peer = %peer, "Received an empty collection, still listening");
        return Ok(None);
    }
    Ok(Some(collection))
}
