// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sending side of the handshake.
//!
//! One attempt is connect, write the payload line, read the echo line. If
//! the echo is not byte-identical to the payload the whole attempt is
//! repeated on a fresh connection. After a matching echo the receiver's
//! catalog line is read.

use std::time::Duration;

use grevit_core::{codec, Catalog, ComponentCollection};
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{Result, TransportError};
use crate::line::{read_line, write_line};

/// Default receiver port.
pub const DEFAULT_PORT: u16 = 8002;

/// Default per-operation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Sender configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub host: String,
    pub port: u16,
    /// Bound on connect and on each line read or written.
    pub timeout: Duration,
    /// Give up after this many mismatched echoes. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: None,
        }
    }
}

impl SenderConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Result of a completed handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    /// Connections it took until the echo matched
    pub attempts: u32,
    /// Catalog line as received
    pub raw_catalog: String,
    /// Decoded catalog, `None` if the line was not a valid catalog
    pub catalog: Option<Catalog>,
}

/// Client for a Grevit receiver.
#[derive(Debug, Clone, Default)]
pub struct Sender {
    config: SenderConfig,
}

impl Sender {
    pub fn new(config: SenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Encodes and sends a collection.
    pub async fn send(&self, collection: &ComponentCollection) -> Result<SendOutcome> {
        let payload = codec::encode(collection)?;
        self.send_payload(&payload).await
    }

    /// Sends an already encoded payload line.
    ///
    /// Socket and timeout errors end the call. Only an echo mismatch is
    /// retried.
    pub async fn send_payload(&self, payload: &str) -> Result<SendOutcome> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            match self.exchange(payload).await? {
                Some(raw_catalog) => {
                    let catalog = match codec::decode_catalog(&raw_catalog) {
                        Ok(catalog) => Some(catalog),
                        Err(err) => {
                            tracing::warn!(
                                error = %err,
                                "Receiver answered with an unreadable catalog"
                            );
                            None
                        }
                    };
                    tracing::info!(
                        address = %self.config.address(),
                        attempts,
                        bytes = payload.len(),
                        "Payload delivered"
                    );
                    return Ok(SendOutcome {
                        attempts,
                        raw_catalog,
                        catalog,
                    });
                }
                None => {
                    if let Some(max) = self.config.max_attempts {
                        if attempts >= max {
                            return Err(TransportError::EchoExhausted { attempts });
                        }
                    }
                    tracing::warn!(attempts, "Echo did not match payload, retrying");
                }
            }
        }
    }

    /// One connection. `None` when the echo did not match.
    async fn exchange(&self, payload: &str) -> Result<Option<String>> {
        let addr = self.config.address();
        let after = self.config.timeout;

        let stream = timeout(after, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::Timeout {
                stage: "connect",
                after,
            })?
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream.set_nodelay(true).ok();

        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        write_line(&mut write_half, payload, "payload", after).await?;

        let echo = read_line(&mut reader, "echo", after).await?;
        if echo != payload {
            tracing::debug!(
                sent = payload.len(),
                echoed = echo.len(),
                "Echo mismatch"
            );
            return Ok(None);
        }

        read_line(&mut reader, "catalog", after).await.map(Some)
    }
}
