use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::transport::Transport;

/// Default timeout for network operations (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum encoded message size (1 MiB).
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

/// Bincode messages behind a 4-byte big-endian length prefix.
pub struct TcpTransport {
    stream: TcpStream,
    timeout_duration: Duration,
    max_message_size: u32,
}

fn write_error(e: std::io::Error) -> anyhow::Error {
    if e.kind() == std::io::ErrorKind::BrokenPipe || e.kind() == std::io::ErrorKind::ConnectionReset {
        anyhow::anyhow!("Connection closed by peer")
    } else {
        anyhow::anyhow!("Write error: {}", e)
    }
}

fn read_error(e: std::io::Error) -> anyhow::Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        anyhow::anyhow!("Connection closed by peer")
    } else if e.kind() == std::io::ErrorKind::ConnectionReset {
        anyhow::anyhow!("Connection reset by peer")
    } else {
        anyhow::anyhow!("Read error: {}", e)
    }
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE)
    }

    pub fn with_timeout(stream: TcpStream, timeout_duration: Duration) -> Self {
        Self::with_config(stream, timeout_duration, MAX_MESSAGE_SIZE)
    }

    pub fn with_config(stream: TcpStream, timeout_duration: Duration, max_message_size: u32) -> Self {
        Self {
            stream,
            timeout_duration,
            max_message_size,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

#[async_trait::async_trait]
impl<M> Transport<M> for TcpTransport
where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    async fn send(&mut self, msg: M) -> anyhow::Result<()> {
        let data = bincode::serialize(&msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
        if data.len() > self.max_message_size as usize {
            return Err(anyhow::anyhow!(
                "Message too large: {} bytes (max: {})",
                data.len(),
                self.max_message_size
            ));
        }

        let send_op = async {
            let len = (data.len() as u32).to_be_bytes();
            self.stream.write_all(&len).await.map_err(write_error)?;
            self.stream.write_all(&data).await.map_err(write_error)?;
            self.stream.flush().await.map_err(write_error)?;
            anyhow::Ok(())
        };

        timeout(self.timeout_duration, send_op)
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.timeout_duration))?
    }

    async fn recv(&mut self) -> anyhow::Result<M> {
        let max = self.max_message_size;
        let recv_op = async {
            let mut len_buf = [0u8; 4];
            self.stream.read_exact(&mut len_buf).await.map_err(read_error)?;

            let len = u32::from_be_bytes(len_buf);
            if len > max {
                return Err(anyhow::anyhow!("Message too large: {} bytes (max: {})", len, max));
            }
            if len == 0 {
                return Err(anyhow::anyhow!("Invalid message length: 0"));
            }

            let mut buf = vec![0u8; len as usize];
            self.stream.read_exact(&mut buf).await.map_err(read_error)?;

            let msg = bincode::deserialize(&buf).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))?;
            anyhow::Ok(msg)
        };

        timeout(self.timeout_duration, recv_op)
            .await
            .map_err(|_| anyhow::anyhow!("Receive timeout after {:?}", self.timeout_duration))?
    }
}
