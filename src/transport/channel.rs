//! Line-framed duplex channel over any async reader/writer pair

use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use crate::error::{BuildClientError, Result};

use super::Inbound;

/// Line-framed duplex channel with a per-read timeout
///
/// Reads go through [`LinesCodec`], which buffers partial lines across
/// reads, strips `\n`/`\r\n` and enforces a maximum line length.
pub struct LineChannel<R, W> {
    reader: FramedRead<R, LinesCodec>,
    writer: W,
    timeout: Duration,
}

impl<R, W> LineChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a channel
    pub fn new(reader: R, writer: W, max_line_length: usize, timeout: Duration) -> Self {
        Self {
            reader: FramedRead::new(reader, LinesCodec::new_with_max_length(max_line_length)),
            writer,
            timeout,
        }
    }

    /// Set the per-read timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Current per-read timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Write `line` followed by `\n` and flush
    ///
    /// # Errors
    /// Returns `Transport` if the write or flush fails
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        self.writer
            .write_all(&buf)
            .await
            .map_err(|e| BuildClientError::transport(format!("Failed to write request: {e}")))?;

        self.writer
            .flush()
            .await
            .map_err(|e| BuildClientError::transport(format!("Failed to flush request: {e}")))?;

        Ok(())
    }

    /// Read one line, `Inbound::TimedOut` if none arrives in time, or
    /// `Inbound::Closed` at end of stream
    ///
    /// Cancel safe: a partial line stays buffered for the next call.
    ///
    /// # Errors
    /// Returns `Transport` on an oversized line, `Io` on read failure
    pub async fn read_line(&mut self) -> Result<Inbound> {
        match tokio::time::timeout(self.timeout, self.reader.next()).await {
            Err(_) => Ok(Inbound::TimedOut),
            Ok(None) => Ok(Inbound::Closed),
            Ok(Some(Ok(line))) => Ok(Inbound::Line(line)),
            Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded))) => {
                Err(BuildClientError::transport(format!(
                    "response exceeded maximum line length of {} bytes",
                    self.reader.decoder().max_length()
                )))
            }
            Ok(Some(Err(LinesCodecError::Io(e)))) => Err(BuildClientError::Io(e)),
        }
    }

    /// Shut down the write half, signalling end of input
    ///
    /// # Errors
    /// Returns `Transport` if the shutdown fails
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer
            .shutdown()
            .await
            .map_err(|e| BuildClientError::transport(format!("Failed to close stdin: {e}")))
    }
}
