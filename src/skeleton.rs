use anyhow::anyhow;

use crate::api::{dispatch, GameApi};
use crate::protocol::{Response, RpcMessage, PROTOCOL_VERSION};
use crate::transport::Transport;

/// Serves [`GameApi`] requests arriving on one transport.
pub struct Skeleton<E: GameApi, T: Transport<RpcMessage>> {
    engine: E,
    transport: T,
}

impl<E: GameApi, T: Transport<RpcMessage>> Skeleton<E, T> {
    pub fn new(engine: E, transport: T) -> Self {
        Self { engine, transport }
    }

    /// Handshake, then answer requests until the peer goes away.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        match self.transport.recv().await? {
            RpcMessage::Hello { version } if version == PROTOCOL_VERSION => {
                self.transport
                    .send(RpcMessage::HelloAck {
                        version: PROTOCOL_VERSION,
                    })
                    .await?;
            }
            RpcMessage::Hello { version } => {
                self.transport
                    .send(RpcMessage::HelloAck {
                        version: PROTOCOL_VERSION,
                    })
                    .await?;
                return Err(anyhow!(
                    "Protocol version mismatch: expected {}, got {}",
                    PROTOCOL_VERSION,
                    version
                ));
            }
            _ => return Err(anyhow!("Expected handshake")),
        }

        while let Ok(msg) = self.transport.recv().await {
            let reply = match msg {
                RpcMessage::Request(request) => {
                    log::debug!("rpc request: {:?}", request);
                    dispatch(&self.engine, request).await
                }
                other => Response::Error(format!("Unexpected message: {:?}", other)),
            };
            self.transport.send(RpcMessage::Response(reply)).await?;
        }
        Ok(())
    }
}
