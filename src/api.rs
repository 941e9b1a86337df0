//! Request/response surface of the game core.
//!
//! Implemented locally by [`GameService`] and remotely by
//! [`crate::stub::Stub`], so callers are indifferent to where the core runs.

use async_trait::async_trait;

use crate::engine::AttackReport;
use crate::game::{GameId, GameSnapshot, Role, UserId};
use crate::protocol::{Request, Response};
use crate::service::{GameService, RematchOutcome};
use crate::ship::ShipPlacement;

#[async_trait]
pub trait GameApi: Send + Sync {
    async fn create_game(&self, host: UserId) -> anyhow::Result<GameId>;
    async fn create_bot_game(&self, host: UserId) -> anyhow::Result<GameId>;
    async fn join_game(&self, game: GameId, user: UserId) -> anyhow::Result<Role>;
    /// Returns `true` when this placement started the shot phase.
    async fn place_ships(&self, game: GameId, user: UserId, ships: Vec<ShipPlacement>) -> anyhow::Result<bool>;
    async fn attack(&self, game: GameId, user: UserId, x: u8, y: u8) -> anyhow::Result<AttackReport>;
    async fn pass_turn(&self, game: GameId, user: UserId) -> anyhow::Result<()>;
    async fn abandon(&self, game: GameId, user: UserId) -> anyhow::Result<()>;
    async fn reassign_roles(&self, game: GameId, host: UserId) -> anyhow::Result<()>;
    async fn rematch(&self, game: GameId, user: UserId) -> anyhow::Result<RematchOutcome>;
    async fn snapshot(&self, game: GameId, viewer: UserId) -> anyhow::Result<GameSnapshot>;
}

#[async_trait]
impl GameApi for GameService {
    async fn create_game(&self, host: UserId) -> anyhow::Result<GameId> {
        Ok(GameService::create_game(self, host).await?)
    }

    async fn create_bot_game(&self, host: UserId) -> anyhow::Result<GameId> {
        Ok(GameService::create_bot_game(self, host).await?)
    }

    async fn join_game(&self, game: GameId, user: UserId) -> anyhow::Result<Role> {
        Ok(GameService::join_game(self, game, user).await?)
    }

    async fn place_ships(&self, game: GameId, user: UserId, ships: Vec<ShipPlacement>) -> anyhow::Result<bool> {
        Ok(GameService::place_ships(self, game, user, &ships).await?)
    }

    async fn attack(&self, game: GameId, user: UserId, x: u8, y: u8) -> anyhow::Result<AttackReport> {
        Ok(GameService::attack(self, game, user, x, y).await?)
    }

    async fn pass_turn(&self, game: GameId, user: UserId) -> anyhow::Result<()> {
        GameService::pass_turn(self, game, user).await?;
        Ok(())
    }

    async fn abandon(&self, game: GameId, user: UserId) -> anyhow::Result<()> {
        GameService::abandon(self, game, user).await?;
        Ok(())
    }

    async fn reassign_roles(&self, game: GameId, host: UserId) -> anyhow::Result<()> {
        Ok(GameService::reassign_roles(self, game, host).await?)
    }

    async fn rematch(&self, game: GameId, user: UserId) -> anyhow::Result<RematchOutcome> {
        Ok(self.request_rematch(game, user).await?)
    }

    async fn snapshot(&self, game: GameId, viewer: UserId) -> anyhow::Result<GameSnapshot> {
        Ok(GameService::snapshot(self, game, viewer).await?)
    }
}

/// Run one request against `api`. Failures become [`Response::Error`].
pub async fn dispatch<E: GameApi + ?Sized>(api: &E, request: Request) -> Response {
    let result = match request {
        Request::CreateGame { host } => api.create_game(host).await.map(Response::Created),
        Request::CreateBotGame { host } => api.create_bot_game(host).await.map(Response::Created),
        Request::JoinGame { game, user } => api.join_game(game, user).await.map(Response::Joined),
        Request::PlaceShips { game, user, ships } => api
            .place_ships(game, user, ships)
            .await
            .map(|started| Response::Placed { started }),
        Request::Attack { game, user, x, y } => api.attack(game, user, x, y).await.map(Response::Attack),
        Request::PassTurn { game, user } => api.pass_turn(game, user).await.map(|()| Response::TurnPassed),
        Request::Abandon { game, user } => api.abandon(game, user).await.map(|()| Response::Abandoned),
        Request::ReassignRoles { game, host } => api
            .reassign_roles(game, host)
            .await
            .map(|()| Response::RolesReassigned),
        Request::Rematch { game, user } => api.rematch(game, user).await.map(Response::Rematch),
        Request::Snapshot { game, viewer } => api
            .snapshot(game, viewer)
            .await
            .map(|s| Response::Snapshot(Box::new(s))),
    };
    result.unwrap_or_else(|e| Response::Error(e.to_string()))
}
