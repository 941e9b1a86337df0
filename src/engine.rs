//! Attack resolution.
//!
//! An attack holds its game's lock from validation until the last push,
//! including the bot's whole streak and the pauses between its shots, so
//! shots within one game are totally ordered.

use serde::{Deserialize, Serialize};

use crate::config::BOT_USER_ID;
use crate::game::{Game, GameError, GameId, ShotOutcome, UserId};
use crate::protocol::{Event, ShotReport};
use crate::service::GameService;

impl From<&ShotOutcome> for ShotReport {
    fn from(outcome: &ShotOutcome) -> Self {
        ShotReport {
            x: outcome.x,
            y: outcome.y,
            result: outcome.result,
        }
    }
}

/// Everything that happened as a consequence of one attack call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    pub shot: ShotReport,
    /// Bot shots fired in reply, in order.
    pub bot_shots: Vec<ShotReport>,
    pub winner: Option<UserId>,
}

impl GameService {
    /// `user` fires at (`x`, `y`) on the opponent's board.
    pub async fn attack(&self, game_id: GameId, user: UserId, x: u8, y: u8) -> Result<AttackReport, GameError> {
        let shared = self.store().get(game_id)?;
        let mut game = shared.lock().await;
        let outcome = game.attack(user, x, y)?;
        self.publish_shot(&game, &outcome);

        let mut report = AttackReport {
            shot: ShotReport::from(&outcome),
            bot_shots: Vec::new(),
            winner: outcome.winner,
        };
        if let Some(winner) = outcome.winner {
            self.announce_winner(&game, winner);
        } else if game.is_bot_game() && !outcome.result.keeps_turn() {
            report.winner = self.run_bot_streak(&mut game, &mut report.bot_shots).await;
        } else {
            self.announce_turn(&game);
        }
        Ok(report)
    }

    /// Turn holder gives up the rest of the turn. In a bot game the bot
    /// plays its streak at once; its shots are returned in order.
    pub async fn pass_turn(&self, game_id: GameId, user: UserId) -> Result<Vec<ShotReport>, GameError> {
        let shared = self.store().get(game_id)?;
        let mut game = shared.lock().await;
        game.pass_turn(user)?;
        log::debug!("game {}: user {} passed", game_id, user);
        let mut bot_shots = Vec::new();
        if game.is_bot_game() {
            self.run_bot_streak(&mut game, &mut bot_shots).await;
        } else {
            self.announce_turn(&game);
        }
        Ok(bot_shots)
    }

    /// Bot keeps firing while it hits or sinks. Stops on a miss, which hands
    /// the turn back, or when the game ends. Returns the winner if the bot
    /// finished the game.
    async fn run_bot_streak(&self, game: &mut Game, shots: &mut Vec<ShotReport>) -> Option<UserId> {
        let delay = self.config().bot_shot_delay;
        loop {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let outcome = match self.with_rng(|rng| game.bot_attack(rng)) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::error!("game {}: bot turn aborted: {}", game.id(), e);
                    if let Err(e) = game.pass_turn(BOT_USER_ID) {
                        log::error!("game {}: could not return the turn: {}", game.id(), e);
                    }
                    break;
                }
            };
            self.publish_shot(game, &outcome);
            shots.push(ShotReport::from(&outcome));
            if let Some(winner) = outcome.winner {
                self.announce_winner(game, winner);
                return Some(winner);
            }
            if !outcome.result.keeps_turn() {
                break;
            }
        }
        self.announce_turn(game);
        None
    }

    /// Result to the shooter, the same shot to the target.
    fn publish_shot(&self, game: &Game, outcome: &ShotOutcome) {
        log::debug!(
            "game {}: {:?} fired at ({}, {}): {}",
            game.id(),
            outcome.role,
            outcome.x,
            outcome.y,
            outcome.result
        );
        let report = ShotReport::from(outcome);
        self.notify(outcome.shooter, Event::AttackResult(report));
        if let Some(target) = game.user_for(outcome.role.opponent()) {
            self.notify(target, Event::EnemyAttack(report));
        }
    }

    fn announce_turn(&self, game: &Game) {
        if let Some(user) = game.turn().and_then(|role| game.user_for(role)) {
            self.notify(user, Event::YourTurn(game.id()));
        }
    }
}
