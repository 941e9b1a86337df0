use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use tokio::sync::Mutex;

use crate::api::GameApi;
use crate::engine::AttackReport;
use crate::game::{GameId, GameSnapshot, Role, UserId};
use crate::protocol::{Request, Response, RpcMessage, PROTOCOL_VERSION};
use crate::service::RematchOutcome;
use crate::ship::ShipPlacement;
use crate::transport::Transport;

/// Remote [`GameApi`] client. Requests are serialized over one transport.
pub struct Stub<T: Transport<RpcMessage>> {
    transport: Mutex<T>,
    handshaken: AtomicBool,
}

impl<T: Transport<RpcMessage>> Stub<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
            handshaken: AtomicBool::new(false),
        }
    }

    async fn ensure_handshake(&self, transport: &mut T) -> anyhow::Result<()> {
        if self.handshaken.load(Ordering::SeqCst) {
            return Ok(());
        }
        transport
            .send(RpcMessage::Hello {
                version: PROTOCOL_VERSION,
            })
            .await?;
        match transport.recv().await? {
            RpcMessage::HelloAck { version } if version == PROTOCOL_VERSION => {
                self.handshaken.store(true, Ordering::SeqCst);
                Ok(())
            }
            RpcMessage::HelloAck { version } => Err(anyhow!(
                "Protocol version mismatch: expected {}, got {}",
                PROTOCOL_VERSION,
                version
            )),
            _ => Err(anyhow!("Unexpected message")),
        }
    }

    /// Send one request and wait for its response. A [`Response::Error`]
    /// becomes `Err`.
    pub async fn call(&self, request: Request) -> anyhow::Result<Response> {
        let mut transport = self.transport.lock().await;
        self.ensure_handshake(&mut transport).await?;
        transport.send(RpcMessage::Request(request)).await?;
        match transport.recv().await? {
            RpcMessage::Response(Response::Error(msg)) => Err(anyhow!(msg)),
            RpcMessage::Response(response) => Ok(response),
            _ => Err(anyhow!("Unexpected message")),
        }
    }
}

fn unexpected(response: Response) -> anyhow::Error {
    anyhow!("Unexpected response: {:?}", response)
}

#[async_trait::async_trait]
impl<T: Transport<RpcMessage>> GameApi for Stub<T> {
    async fn create_game(&self, host: UserId) -> anyhow::Result<GameId> {
        match self.call(Request::CreateGame { host }).await? {
            Response::Created(id) => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    async fn create_bot_game(&self, host: UserId) -> anyhow::Result<GameId> {
        match self.call(Request::CreateBotGame { host }).await? {
            Response::Created(id) => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    async fn join_game(&self, game: GameId, user: UserId) -> anyhow::Result<Role> {
        match self.call(Request::JoinGame { game, user }).await? {
            Response::Joined(role) => Ok(role),
            other => Err(unexpected(other)),
        }
    }

    async fn place_ships(&self, game: GameId, user: UserId, ships: Vec<ShipPlacement>) -> anyhow::Result<bool> {
        match self.call(Request::PlaceShips { game, user, ships }).await? {
            Response::Placed { started } => Ok(started),
            other => Err(unexpected(other)),
        }
    }

    async fn attack(&self, game: GameId, user: UserId, x: u8, y: u8) -> anyhow::Result<AttackReport> {
        match self.call(Request::Attack { game, user, x, y }).await? {
            Response::Attack(report) => Ok(report),
            other => Err(unexpected(other)),
        }
    }

    async fn pass_turn(&self, game: GameId, user: UserId) -> anyhow::Result<()> {
        match self.call(Request::PassTurn { game, user }).await? {
            Response::TurnPassed => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn abandon(&self, game: GameId, user: UserId) -> anyhow::Result<()> {
        match self.call(Request::Abandon { game, user }).await? {
            Response::Abandoned => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn reassign_roles(&self, game: GameId, host: UserId) -> anyhow::Result<()> {
        match self.call(Request::ReassignRoles { game, host }).await? {
            Response::RolesReassigned => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn rematch(&self, game: GameId, user: UserId) -> anyhow::Result<RematchOutcome> {
        match self.call(Request::Rematch { game, user }).await? {
            Response::Rematch(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    async fn snapshot(&self, game: GameId, viewer: UserId) -> anyhow::Result<GameSnapshot> {
        match self.call(Request::Snapshot { game, viewer }).await? {
            Response::Snapshot(snapshot) => Ok(*snapshot),
            other => Err(unexpected(other)),
        }
    }
}
