//! Seams to services that live outside the game core.
//!
//! Statistics and chat persistence are owned by other systems. The core only
//! hands them facts and never waits on them for game progress.

use async_trait::async_trait;

use crate::game::{GameId, UserId};

/// Receives finished-game results for aggregate statistics.
#[async_trait]
pub trait StatsSink: Send + Sync {
    async fn record_result(&self, game: GameId, winner: UserId, loser: Option<UserId>) -> anyhow::Result<()>;
}

/// Stores chat lines sent inside a game.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn store_message(&self, game: GameId, from: UserId, text: &str) -> anyhow::Result<()>;
}

/// Default collaborator that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl StatsSink for LogSink {
    async fn record_result(&self, game: GameId, winner: UserId, loser: Option<UserId>) -> anyhow::Result<()> {
        log::info!("stats: game {} won by {} (loser {:?})", game, winner, loser);
        Ok(())
    }
}

#[async_trait]
impl ChatSink for LogSink {
    async fn store_message(&self, game: GameId, from: UserId, text: &str) -> anyhow::Result<()> {
        log::debug!("chat: game {} user {}: {}", game, from, text);
        Ok(())
    }
}
