// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Newline framed reads and writes with a deadline.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::{Result, TransportError};

/// Reads one line without its terminator.
pub(crate) async fn read_line<R>(
    reader: &mut R,
    stage: &'static str,
    after: Duration,
) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = timeout(after, reader.read_line(&mut line))
        .await
        .map_err(|_| TransportError::Timeout { stage, after })??;
    if read == 0 {
        return Err(TransportError::ConnectionClosed(stage));
    }
    Ok(grevit_core::codec::strip_terminator(&line).to_string())
}

/// Writes one line and flushes.
pub(crate) async fn write_line<W>(
    writer: &mut W,
    line: &str,
    stage: &'static str,
    after: Duration,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut framed = String::with_capacity(line.len() + 1);
    framed.push_str(line);
    framed.push('\n');

    timeout(after, async {
        writer.write_all(framed.as_bytes()).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| TransportError::Timeout { stage, after })??;
    Ok(())
}
