//! Newline-delimited text frames for push connections.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Duration};

use crate::config::MAX_FRAME_LEN;

const READ_CHUNK: usize = 1024;

/// Default time allowed for writing one frame.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Splits a byte stream into frames.
///
/// [`FrameReader::next_frame`] is cancel safe: bytes already read stay
/// buffered until the next call, so it can sit in a `select!`.
pub struct FrameReader<R> {
    inner: R,
    buf: Vec<u8>,
    max_len: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_len(inner, MAX_FRAME_LEN)
    }

    pub fn with_max_len(inner: R, max_len: usize) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            max_len,
        }
    }

    /// Next frame without its line terminator, or `None` once the peer has
    /// closed and nothing is buffered. A trailing unterminated line is
    /// returned as a final frame.
    pub async fn next_frame(&mut self) -> anyhow::Result<Option<String>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop();
                return self.finish(line).map(Some);
            }
            if self.buf.len() > self.max_len {
                return Err(anyhow::anyhow!(
                    "Frame too large: more than {} bytes without a newline",
                    self.max_len
                ));
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self
                .inner
                .read(&mut chunk)
                .await
                .map_err(|e| anyhow::anyhow!("Read error: {}", e))?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let rest = std::mem::take(&mut self.buf);
                return self.finish(rest).map(Some);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn finish(&self, mut line: Vec<u8>) -> anyhow::Result<String> {
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.len() > self.max_len {
            return Err(anyhow::anyhow!(
                "Frame too large: {} bytes (max: {})",
                line.len(),
                self.max_len
            ));
        }
        String::from_utf8(line).map_err(|_| anyhow::anyhow!("Frame is not valid UTF-8"))
    }
}

/// Writes frames, each followed by `\n`.
pub struct FrameWriter<W> {
    inner: W,
    timeout_duration: Duration,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_timeout(inner, WRITE_TIMEOUT)
    }

    pub fn with_timeout(inner: W, timeout_duration: Duration) -> Self {
        Self {
            inner,
            timeout_duration,
        }
    }

    pub async fn send(&mut self, frame: &str) -> anyhow::Result<()> {
        let write_op = async {
            self.inner.write_all(frame.as_bytes()).await?;
            self.inner.write_all(b"\n").await?;
            self.inner.flush().await
        };
        timeout(self.timeout_duration, write_op)
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.timeout_duration))?
            .map_err(|e| anyhow::anyhow!("Write error: {}", e))
    }

    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        self.inner
            .shutdown()
            .await
            .map_err(|e| anyhow::anyhow!("Shutdown error: {}", e))
    }
}
