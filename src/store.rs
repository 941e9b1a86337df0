//! In-memory arena of games keyed by id.
//!
//! Each game sits behind its own async mutex. Holding the guard is what
//! orders every operation on one game; different games never contend.
//! Alongside the games the store keeps a seat index of every user's live
//! games, so lookups by user never touch a game lock. Nothing here survives
//! a restart.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::config::BOT_USER_ID;
use crate::game::{Game, GameError, GameId, UserId};

pub type SharedGame = Arc<Mutex<Game>>;

pub struct GameStore {
    games: DashMap<GameId, SharedGame>,
    seats: DashMap<UserId, BTreeSet<GameId>>,
    next_id: AtomicU64,
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore {
    pub fn new() -> Self {
        Self {
            games: DashMap::new(),
            seats: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Build a game with a fresh id and store it.
    pub fn create<F>(&self, build: F) -> (GameId, SharedGame)
    where
        F: FnOnce(GameId) -> Game,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let game = build(id);
        self.track(&game);
        let game = Arc::new(Mutex::new(game));
        self.games.insert(id, Arc::clone(&game));
        (id, game)
    }

    pub fn get(&self, id: GameId) -> Result<SharedGame, GameError> {
        self.games
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(GameError::GameNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Bring the seat index in line with `game`. Call with the game's guard
    /// held, after every change to its participants or state.
    pub fn track(&self, game: &Game) {
        for p in game.participants() {
            if p.user_id == BOT_USER_ID {
                continue;
            }
            if game.is_live_for(p.user_id) {
                self.seats.entry(p.user_id).or_default().insert(game.id());
            } else {
                self.seats.remove_if_mut(&p.user_id, |_, games| {
                    games.remove(&game.id());
                    games.is_empty()
                });
            }
        }
    }

    /// Games where `user` holds an active seat and play is not over, in id
    /// order.
    pub fn live_games_of(&self, user: UserId) -> Vec<GameId> {
        self.seats
            .get(&user)
            .map(|games| games.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_playing(&self, user: UserId) -> bool {
        self.seats.contains_key(&user)
    }
}
