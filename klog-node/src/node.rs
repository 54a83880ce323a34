//! Node message loop
//!
//! Reads one request per line, answers it synchronously from the handler,
//! and hands the reply to a single writer task that owns the output.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::handler::Handler;

/// Serve requests from `input` until it is exhausted.
///
/// Returns once every queued reply has been written to `output`.
pub async fn run<R, W>(
    handler: Arc<Handler>,
    input: R,
    output: W,
    reply_buffer: usize,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<String>(reply_buffer.max(1));
    let writer = tokio::spawn(write_replies(rx, output));

    let read_result = read_requests(&handler, input, &tx).await;

    // Queued replies are written even when reading failed.
    drop(tx);
    let write_result = writer.await.map_err(io::Error::other)?;

    let handled = read_result?;
    write_result?;
    info!(handled, "Input closed, node stopped");
    Ok(())
}

/// Feed input lines to the handler until input ends or the writer stops.
///
/// Returns the number of non-blank lines seen.
async fn read_requests<R>(
    handler: &Handler,
    mut input: R,
    tx: &mpsc::Sender<String>,
) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut handled = 0u64;
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(handled);
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!(error = %e, "Dropping message that is not valid UTF-8");
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        handled += 1;

        if let Some(reply) = handler.handle_line(line)
            && tx.send(reply).await.is_err()
        {
            debug!("Reply writer stopped, no longer reading input");
            return Ok(handled);
        }
    }
}

async fn write_replies<W>(mut rx: mpsc::Receiver<String>, mut output: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(reply) = rx.recv().await {
        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(())
}
