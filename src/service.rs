//! Game service: owns the game store, matchmaking queue, connection registry
//! and collaborators, and runs every lifecycle operation against them.
//!
//! Each operation locks the affected game for its whole duration and pushes
//! the resulting events before releasing it.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::collaborators::{ChatSink, LogSink, StatsSink};
use crate::config::EngineConfig;
use crate::game::{AbandonOutcome, Game, GameError, GameId, GameSnapshot, RematchStep, Role, UserId};
use crate::matchmaking::MatchQueue;
use crate::protocol::Event;
use crate::registry::{ConnectionRegistry, Presence};
use crate::ship::ShipPlacement;
use crate::store::GameStore;

/// What a rematch request led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RematchOutcome {
    /// Waiting for the other participant.
    Requested,
    /// Both agreed; this is the new game.
    Created(GameId),
}

struct Inner {
    store: GameStore,
    queue: MatchQueue,
    registry: ConnectionRegistry,
    stats: Arc<dyn StatsSink>,
    chat: Arc<dyn ChatSink>,
    config: EngineConfig,
    rng: Mutex<SmallRng>,
}

/// Cloneable handle to the game core.
#[derive(Clone)]
pub struct GameService {
    inner: Arc<Inner>,
}

impl GameService {
    /// Service with its own queue and registry and log-only collaborators.
    pub fn new(config: EngineConfig) -> Self {
        let queue = MatchQueue::new();
        let registry = ConnectionRegistry::new(queue.clone());
        Self::with_parts(config, queue, registry, Arc::new(LogSink), Arc::new(LogSink))
    }

    pub fn with_parts(
        config: EngineConfig,
        queue: MatchQueue,
        registry: ConnectionRegistry,
        stats: Arc<dyn StatsSink>,
        chat: Arc<dyn ChatSink>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let mut seed_rng = rand::rng();
                SmallRng::from_rng(&mut seed_rng)
            }
        };
        Self {
            inner: Arc::new(Inner {
                store: GameStore::new(),
                queue,
                registry,
                stats,
                chat,
                config,
                rng: Mutex::new(rng),
            }),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.inner.registry
    }

    pub fn queue(&self) -> &MatchQueue {
        &self.inner.queue
    }

    pub fn store(&self) -> &GameStore {
        &self.inner.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub(crate) fn with_rng<T>(&self, f: impl FnOnce(&mut SmallRng) -> T) -> T {
        let mut rng = self
            .inner
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    pub(crate) fn notify(&self, user: UserId, event: Event) {
        self.inner.registry.notify(user, event);
    }

    /// `user` took a seat: leave the matchmaking queue and show as playing.
    fn seat(&self, user: UserId) {
        if self.inner.queue.cancel(user) {
            log::debug!("user {} left matchmaking to play", user);
        }
        self.inner.registry.set_presence(user, Presence::Playing);
    }

    /// Back to plain `Connected` unless the user still sits in a live game.
    fn release(&self, user: UserId) {
        if !self.inner.store.is_playing(user) {
            self.inner.registry.set_presence(user, Presence::Connected);
        }
    }

    /// New game with `host` seated as Host.
    pub async fn create_game(&self, host: UserId) -> Result<GameId, GameError> {
        let (id, shared) = self.inner.store.create(Game::new);
        let mut game = shared.lock().await;
        game.join(host)?;
        self.inner.store.track(&game);
        log::info!("game {} created by user {}", id, host);
        self.notify(host, Event::GameCreated(id));
        self.seat(host);
        Ok(id)
    }

    /// New game of `human` against the bot, whose fleet is placed at random.
    pub async fn create_bot_game(&self, human: UserId) -> Result<GameId, GameError> {
        let fleet = self.with_rng(|rng| Board::random_fleet(rng))?;
        let (id, _) = self
            .inner
            .store
            .create(|id| Game::new_bot_game(id, human, fleet));
        log::info!("bot game {} created for user {}", id, human);
        self.notify(human, Event::GameCreated(id));
        self.seat(human);
        Ok(id)
    }

    pub async fn join_game(&self, game_id: GameId, user: UserId) -> Result<Role, GameError> {
        let shared = self.inner.store.get(game_id)?;
        let mut game = shared.lock().await;
        let role = game.join(user)?;
        self.inner.store.track(&game);
        log::info!("user {} joined game {} as {:?}", user, game_id, role);

        self.notify(user, Event::GameJoined(game_id));
        for other in game.others(user) {
            self.notify(other, Event::PlayerJoined { game: game_id, user });
        }
        self.seat(user);
        if game.state().is_shot_phase() {
            self.announce_start(&game);
        }
        Ok(role)
    }

    /// Place `user`'s fleet. Returns `true` if the shot phase started.
    pub async fn place_ships(
        &self,
        game_id: GameId,
        user: UserId,
        ships: &[ShipPlacement],
    ) -> Result<bool, GameError> {
        let shared = self.inner.store.get(game_id)?;
        let mut game = shared.lock().await;
        let started = game.place_ships(user, ships)?;
        log::debug!("user {} placed ships in game {}", user, game_id);

        self.notify(user, Event::ShipsPlaced(game_id));
        for other in game.others(user) {
            self.notify(other, Event::ShipsPlaced(game_id));
        }
        if started {
            self.announce_start(&game);
        }
        Ok(started)
    }

    fn announce_start(&self, game: &Game) {
        log::info!("game {} entered the shot phase", game.id());
        for p in game.participants().iter().filter(|p| p.is_active()) {
            self.notify(p.user_id, Event::GameStarted(game.id()));
        }
        if let Some(host) = game.user_for(Role::Host) {
            self.notify(host, Event::YourTurn(game.id()));
        }
    }

    pub async fn abandon(&self, game_id: GameId, user: UserId) -> Result<AbandonOutcome, GameError> {
        let shared = self.inner.store.get(game_id)?;
        let mut game = shared.lock().await;
        let outcome = game.abandon(user)?;
        log::info!("user {} left game {}: {:?}", user, game_id, outcome);
        self.inner.store.track(&game);
        match outcome {
            AbandonOutcome::Finished { winner } => self.announce_winner(&game, winner),
            AbandonOutcome::AfterFinish => {}
            AbandonOutcome::Reset | AbandonOutcome::Reopened => self.release(user),
        }
        Ok(outcome)
    }

    pub async fn reassign_roles(&self, game_id: GameId, host: UserId) -> Result<(), GameError> {
        let shared = self.inner.store.get(game_id)?;
        let mut game = shared.lock().await;
        game.reassign_roles(host)?;
        log::debug!("game {}: user {} is now Host", game_id, host);
        Ok(())
    }

    /// Rematch protocol on a finished game.
    pub async fn request_rematch(&self, game_id: GameId, user: UserId) -> Result<RematchOutcome, GameError> {
        let shared = self.inner.store.get(game_id)?;
        let mut old = shared.lock().await;
        let bot_fleet = if old.is_bot_game() && old.state().is_finished() {
            Some(self.with_rng(|rng| Board::random_fleet(rng))?)
        } else {
            None
        };

        match old.request_rematch(user, Instant::now(), self.inner.config.rematch_window)? {
            RematchStep::Requested => {
                log::debug!("game {}: rematch requested by user {}", game_id, user);
                for p in old.participants().iter().filter(|p| p.user_id != user) {
                    self.notify(p.user_id, Event::RematchRequested(game_id));
                }
                Ok(RematchOutcome::Requested)
            }
            RematchStep::Accepted { host, guest } => {
                let (new_id, _) = self
                    .inner
                    .store
                    .create(|id| Game::seated(id, host, guest, bot_fleet));
                old.record_rematch(new_id);
                log::info!("game {}: rematch created as game {}", game_id, new_id);
                for seat in [host, guest] {
                    self.notify(seat, Event::RematchCreated(new_id));
                    self.seat(seat);
                }
                Ok(RematchOutcome::Created(new_id))
            }
        }
    }

    pub async fn snapshot(&self, game_id: GameId, viewer: UserId) -> Result<GameSnapshot, GameError> {
        let shared = self.inner.store.get(game_id)?;
        let game = shared.lock().await;
        game.snapshot(viewer)
    }

    /// Queue `user` for a random opponent and pair whoever is waiting.
    /// Returns the games created by this call.
    pub async fn enqueue_match(&self, user: UserId) -> Result<Vec<GameId>, GameError> {
        if let Some(live) = self.inner.store.live_games_of(user).first() {
            return Err(GameError::AlreadyInGame(*live));
        }
        if !self.inner.queue.enqueue(user) {
            log::debug!("user {} already queued", user);
        }
        let store = &self.inner.store;
        let mut created = Vec::new();
        for (host, guest) in self.inner.queue.drain_available_pairs(|u| !store.is_playing(u)) {
            let (id, _) = self
                .inner
                .store
                .create(|id| Game::seated(id, host, guest, None));
            log::info!("matched users {} and {} in game {}", host, guest, id);
            for seat in [host, guest] {
                self.notify(seat, Event::MatchFound(id));
                self.seat(seat);
            }
            created.push(id);
        }
        Ok(created)
    }

    pub fn cancel_match(&self, user: UserId) -> bool {
        self.inner.queue.cancel(user)
    }

    /// Hand a chat line to the chat collaborator and relay it to the other
    /// participants.
    pub async fn chat(&self, game_id: GameId, from: UserId, text: &str) -> Result<(), GameError> {
        let shared = self.inner.store.get(game_id)?;
        let others = {
            let game = shared.lock().await;
            if game.participant(from).is_none() {
                return Err(GameError::UnknownParticipant { game: game_id, user: from });
            }
            game.others(from)
        };
        let chat = Arc::clone(&self.inner.chat);
        let line = text.to_string();
        tokio::spawn(async move {
            if let Err(e) = chat.store_message(game_id, from, &line).await {
                log::warn!("chat collaborator failed for game {}: {}", game_id, e);
            }
        });
        for other in others {
            self.notify(
                other,
                Event::Chat {
                    game: game_id,
                    from,
                    text: text.to_string(),
                },
            );
        }
        Ok(())
    }

    /// Connection of `user` ended: drop it from the registry and abandon
    /// every game the user is still playing.
    pub async fn disconnect(&self, user: UserId, connection_id: u64) {
        if !self.inner.registry.unregister(user, connection_id) {
            return;
        }
        for game_id in self.inner.store.live_games_of(user) {
            if let Err(e) = self.abandon(game_id, user).await {
                log::warn!("could not abandon game {} for user {}: {}", game_id, user, e);
            }
        }
    }

    /// Tell every participant who won, report to stats, and return the
    /// players to plain connected presence.
    pub(crate) fn announce_winner(&self, game: &Game, winner: UserId) {
        log::info!("game {} won by user {}", game.id(), winner);
        let loser = game
            .participants()
            .iter()
            .map(|p| p.user_id)
            .find(|u| *u != winner);
        self.inner.store.track(game);
        for p in game.participants() {
            self.notify(p.user_id, Event::GameOver(winner.to_string()));
            self.release(p.user_id);
        }

        let stats = Arc::clone(&self.inner.stats);
        let game_id = game.id();
        tokio::spawn(async move {
            if let Err(e) = stats.record_result(game_id, winner, loser).await {
                log::warn!("stats collaborator failed for game {}: {}", game_id, e);
            }
        });
    }
}
