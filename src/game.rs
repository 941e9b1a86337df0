//! Per-game state machine: participants, readiness, turn ownership,
//! abandonment and rematch bookkeeping.

use core::fmt;
use std::time::{Duration, Instant, SystemTime};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell};
use crate::bot;
use crate::common::{BoardError, ShotResult};
use crate::config::{BOT_USER_ID, FLEET};
use crate::ship::{Ship, ShipPlacement};

pub type UserId = u64;
pub type GameId = u64;

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    WaitingForPlayers,
    WaitingForPlayer1Ships,
    WaitingForPlayer2Ships,
    WaitingForPlayer1Shot,
    WaitingForPlayer2Shot,
    Finished,
}

impl GameState {
    pub fn is_shot_phase(self) -> bool {
        matches!(
            self,
            GameState::WaitingForPlayer1Shot | GameState::WaitingForPlayer2Shot
        )
    }

    pub fn is_placement(self) -> bool {
        matches!(
            self,
            GameState::WaitingForPlayer1Ships | GameState::WaitingForPlayer2Ships
        )
    }

    pub fn is_finished(self) -> bool {
        self == GameState::Finished
    }

    fn shot_for(role: Role) -> Self {
        match role {
            Role::Host => GameState::WaitingForPlayer1Shot,
            Role::Guest => GameState::WaitingForPlayer2Shot,
        }
    }
}

/// Seat of a participant. The Host's fleet lives on board 0 (Player1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub fn opponent(self) -> Role {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }

    /// Index of the board carrying this role's fleet.
    pub fn fleet_index(self) -> usize {
        match self {
            Role::Host => 0,
            Role::Guest => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub role: Role,
    pub ready: bool,
    pub abandoned: bool,
}

impl Participant {
    fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            ready: false,
            abandoned: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.abandoned
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Joined,
    ShipsPlaced,
    GameStarted,
    Attack,
    BotAttack,
    PassTurn,
    Abandoned,
    RolesReassigned,
    RematchRequested,
    RematchCreated,
    Finished,
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameAction {
    pub actor: UserId,
    pub kind: ActionKind,
    pub detail: String,
    pub at: SystemTime,
    pub coords: Option<(u8, u8)>,
}

#[derive(Debug, Clone)]
struct RematchRequest {
    requesters: Vec<UserId>,
    started: Instant,
}

/// Result of one shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotOutcome {
    pub shooter: UserId,
    pub role: Role,
    pub x: u8,
    pub y: u8,
    pub result: ShotResult,
    /// Set when this shot finished the game.
    pub winner: Option<UserId>,
}

impl ShotOutcome {
    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonOutcome {
    /// Nobody active is left; the game waits for players again.
    Reset,
    /// The remaining participant wins.
    Finished { winner: UserId },
    /// Back to ship placement with a vacant slot.
    Reopened,
    /// The game was already over; only the flag changed.
    AfterFinish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RematchStep {
    /// A window is open, waiting for the other participant.
    Requested,
    /// Both agreed; a new game should be created with these seats.
    Accepted { host: UserId, guest: UserId },
}

/// Validation failure of a game operation. State is unchanged whenever one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    GameNotFound(GameId),
    UnknownParticipant { game: GameId, user: UserId },
    InvalidStage { action: &'static str, state: GameState },
    NotYourTurn,
    GameFull,
    AlreadyJoined,
    ShipsAlreadyPlaced,
    InvalidFleet(String),
    Board(BoardError),
    BotOpponent,
    RematchAlreadyRequested,
    RematchExists(GameId),
    AlreadyInGame(GameId),
}

impl From<BoardError> for GameError {
    fn from(err: BoardError) -> Self {
        GameError::Board(err)
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::GameNotFound(id) => write!(f, "Game {} not found", id),
            GameError::UnknownParticipant { game, user } => {
                write!(f, "User {} is not a participant of game {}", user, game)
            }
            GameError::InvalidStage { action, state } => {
                write!(f, "Cannot {} while game is {:?}", action, state)
            }
            GameError::NotYourTurn => write!(f, "Not your turn"),
            GameError::GameFull => write!(f, "Game already has two players"),
            GameError::AlreadyJoined => write!(f, "Already joined this game"),
            GameError::ShipsAlreadyPlaced => write!(f, "Ships already placed"),
            GameError::InvalidFleet(msg) => write!(f, "Invalid fleet: {}", msg),
            GameError::Board(e) => write!(f, "{}", e),
            GameError::BotOpponent => write!(f, "The bot opponent is driven by the server"),
            GameError::RematchAlreadyRequested => write!(f, "Rematch already requested"),
            GameError::RematchExists(id) => write!(f, "Rematch already created as game {}", id),
            GameError::AlreadyInGame(id) => write!(f, "Already playing in game {}", id),
        }
    }
}

impl std::error::Error for GameError {}

/// Cells and ships of one board as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub cells: Vec<Cell>,
    pub ships: Vec<Ship>,
}

impl BoardView {
    fn own(board: &Board) -> Self {
        Self {
            cells: board.cells().collect(),
            ships: board.ships().to_vec(),
        }
    }

    /// Only shot cells reveal ships, and only sunk ships are listed.
    fn target(board: &Board) -> Self {
        Self {
            cells: board
                .cells()
                .map(|c| Cell {
                    has_ship: c.has_ship && c.is_hit,
                    ..c
                })
                .collect(),
            ships: board.ships().iter().filter(|s| s.is_sunk()).cloned().collect(),
        }
    }
}

/// Point-in-time view of a game for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: GameId,
    pub state: GameState,
    pub winner: Option<UserId>,
    pub bot_game: bool,
    pub turn: Option<UserId>,
    pub created_at: SystemTime,
    pub participants: Vec<Participant>,
    pub own_board: BoardView,
    pub target_board: BoardView,
    pub actions: Vec<GameAction>,
}

/// One game session.
#[derive(Debug, Clone)]
pub struct Game {
    id: GameId,
    state: GameState,
    created_at: SystemTime,
    winner: Option<UserId>,
    boards: [Board; 2],
    participants: Vec<Participant>,
    actions: Vec<GameAction>,
    bot_game: bool,
    rematch: Option<RematchRequest>,
    rematch_game: Option<GameId>,
}

impl Game {
    /// An empty game waiting for players.
    pub fn new(id: GameId) -> Self {
        Self {
            id,
            state: GameState::WaitingForPlayers,
            created_at: SystemTime::now(),
            winner: None,
            boards: [Board::new(), Board::new()],
            participants: Vec::with_capacity(2),
            actions: Vec::new(),
            bot_game: false,
            rematch: None,
            rematch_game: None,
        }
    }

    /// Two seated participants, nobody ready. With `bot_fleet` the Guest is
    /// the bot and is ready with that fleet.
    pub fn seated(id: GameId, host: UserId, guest: UserId, bot_fleet: Option<Board>) -> Self {
        let mut game = Game::new(id);
        game.participants.push(Participant::new(host, Role::Host));
        game.participants.push(Participant::new(guest, Role::Guest));
        game.log(host, ActionKind::Joined, "Joined as Host", None);
        game.log(guest, ActionKind::Joined, "Joined as Guest", None);
        if let Some(fleet) = bot_fleet {
            game.bot_game = true;
            game.boards[Role::Guest.fleet_index()] = fleet;
            game.participants[1].ready = true;
            game.log(guest, ActionKind::ShipsPlaced, "Bot fleet placed", None);
        }
        game.state = game.placement_state();
        game
    }

    /// Human Host against the bot with the given fleet.
    pub fn new_bot_game(id: GameId, human: UserId, bot_fleet: Board) -> Self {
        Self::seated(id, human, BOT_USER_ID, Some(bot_fleet))
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn winner(&self) -> Option<UserId> {
        self.winner
    }

    pub fn is_bot_game(&self) -> bool {
        self.bot_game
    }

    pub fn rematch_game(&self) -> Option<GameId> {
        self.rematch_game
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn actions(&self) -> &[GameAction] {
        &self.actions
    }

    /// Fleet board of `role`.
    pub fn board(&self, role: Role) -> &Board {
        &self.boards[role.fleet_index()]
    }

    pub fn participant(&self, user: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user)
    }

    fn active(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Role of an active participant.
    pub fn role_of(&self, user: UserId) -> Option<Role> {
        self.active().find(|p| p.user_id == user).map(|p| p.role)
    }

    /// Active participant sitting in `role`.
    pub fn user_for(&self, role: Role) -> Option<UserId> {
        self.active().find(|p| p.role == role).map(|p| p.user_id)
    }

    /// Whether `user` holds a seat in a game that is not over.
    pub fn is_live_for(&self, user: UserId) -> bool {
        !self.state.is_finished() && self.role_of(user).is_some()
    }

    /// Role whose turn it is during the shot phase.
    pub fn turn(&self) -> Option<Role> {
        match self.state {
            GameState::WaitingForPlayer1Shot => Some(Role::Host),
            GameState::WaitingForPlayer2Shot => Some(Role::Guest),
            _ => None,
        }
    }

    /// Users of active participants other than `user`.
    pub fn others(&self, user: UserId) -> Vec<UserId> {
        self.active()
            .filter(|p| p.user_id != user)
            .map(|p| p.user_id)
            .collect()
    }

    fn require_role(&self, user: UserId) -> Result<Role, GameError> {
        self.role_of(user).ok_or(GameError::UnknownParticipant {
            game: self.id,
            user,
        })
    }

    fn log(&mut self, actor: UserId, kind: ActionKind, detail: impl Into<String>, coords: Option<(u8, u8)>) {
        self.actions.push(GameAction {
            actor,
            kind,
            detail: detail.into(),
            at: SystemTime::now(),
            coords,
        });
    }

    fn placement_state(&self) -> GameState {
        let host_ready = self
            .active()
            .any(|p| p.role == Role::Host && p.ready);
        if host_ready {
            GameState::WaitingForPlayer2Ships
        } else {
            GameState::WaitingForPlayer1Ships
        }
    }

    /// Moves out of placement once two active participants are ready.
    /// Returns `true` when the shot phase starts.
    fn advance_if_ready(&mut self) -> bool {
        if self.active_count() < 2 {
            return false;
        }
        if self.active().all(|p| p.ready) {
            self.state = GameState::WaitingForPlayer1Shot;
            let host = self.user_for(Role::Host).unwrap_or_default();
            self.log(host, ActionKind::GameStarted, "All fleets ready", None);
            true
        } else {
            self.state = self.placement_state();
            false
        }
    }

    /// Add `user` to the game. A slot left by an abandoned participant is
    /// reused with its role and a cleared board.
    pub fn join(&mut self, user: UserId) -> Result<Role, GameError> {
        if self.state.is_finished() || self.state.is_shot_phase() {
            return Err(GameError::InvalidStage {
                action: "join",
                state: self.state,
            });
        }
        if self.role_of(user).is_some() {
            return Err(GameError::AlreadyJoined);
        }
        if self.active_count() >= 2 {
            return Err(GameError::GameFull);
        }
        let role = match self.participants.iter().position(|p| p.abandoned) {
            Some(slot) => {
                let role = self.participants[slot].role;
                self.participants[slot] = Participant::new(user, role);
                self.boards[role.fleet_index()] = Board::new();
                role
            }
            None => {
                let role = if self.participants.iter().any(|p| p.role == Role::Host) {
                    Role::Guest
                } else {
                    Role::Host
                };
                self.participants.push(Participant::new(user, role));
                role
            }
        };
        self.log(user, ActionKind::Joined, format!("Joined as {:?}", role), None);
        if self.active_count() == 2 {
            self.advance_if_ready();
        }
        Ok(role)
    }

    /// Place `user`'s whole fleet. Returns `true` if this started the shot
    /// phase.
    pub fn place_ships(&mut self, user: UserId, placements: &[ShipPlacement]) -> Result<bool, GameError> {
        if !(self.state == GameState::WaitingForPlayers || self.state.is_placement()) {
            return Err(GameError::InvalidStage {
                action: "place ships",
                state: self.state,
            });
        }
        let role = self.require_role(user)?;
        if self.boards[role.fleet_index()].has_fleet() {
            return Err(GameError::ShipsAlreadyPlaced);
        }

        let mut expected: Vec<usize> = FLEET.iter().map(|s| s.length()).collect();
        let mut got: Vec<usize> = placements.iter().map(|p| p.size as usize).collect();
        expected.sort_unstable();
        got.sort_unstable();
        if expected != got {
            return Err(GameError::InvalidFleet(format!(
                "expected ship sizes {:?}, got {:?}",
                expected, got
            )));
        }

        let mut used = [false; FLEET.len()];
        let mut board = Board::new();
        for placement in placements {
            let slot = FLEET
                .iter()
                .enumerate()
                .position(|(i, def)| !used[i] && def.length() == placement.size as usize)
                .ok_or_else(|| GameError::InvalidFleet(format!("unexpected ship of size {}", placement.size)))?;
            used[slot] = true;
            board.place_ship(Ship::from_placement(FLEET[slot].name(), placement))?;
        }

        self.boards[role.fleet_index()] = board;
        if let Some(p) = self.participants.iter_mut().find(|p| p.user_id == user && p.is_active()) {
            p.ready = true;
        }
        self.log(user, ActionKind::ShipsPlaced, format!("{} ships placed", placements.len()), None);
        Ok(self.advance_if_ready())
    }

    /// A participant's shot at the opponent's board.
    pub fn attack(&mut self, user: UserId, x: u8, y: u8) -> Result<ShotOutcome, GameError> {
        if !self.state.is_shot_phase() {
            return Err(GameError::InvalidStage {
                action: "attack",
                state: self.state,
            });
        }
        if self.bot_game && user == BOT_USER_ID {
            return Err(GameError::BotOpponent);
        }
        let role = self.require_role(user)?;
        if self.turn() != Some(role) {
            return Err(GameError::NotYourTurn);
        }
        self.fire(role, x, y, ActionKind::Attack)
    }

    /// The bot picks and fires its next shot at the Host's board.
    pub fn bot_attack<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<ShotOutcome, GameError> {
        if !self.bot_game || self.turn() != Some(Role::Guest) {
            return Err(GameError::InvalidStage {
                action: "take the bot's turn",
                state: self.state,
            });
        }
        let ((x, y), mode) = bot::choose_target(self.board(Role::Host), rng)?;
        log::debug!("game {}: bot targets ({}, {}) in {:?} mode", self.id, x, y, mode);
        self.fire(Role::Guest, x, y, ActionKind::BotAttack)
    }

    fn fire(&mut self, role: Role, x: u8, y: u8, kind: ActionKind) -> Result<ShotOutcome, GameError> {
        let shooter = self.user_for(role).unwrap_or_default();
        let target = &mut self.boards[role.opponent().fleet_index()];
        let result = target.resolve_shot(x, y)?;
        let fleet_gone = result == ShotResult::Sunk && target.all_ships_sunk();
        self.log(shooter, kind, result.as_str(), Some((x, y)));

        let mut winner = None;
        if fleet_gone {
            self.finish(shooter);
            winner = Some(shooter);
        } else if !result.keeps_turn() {
            self.state = GameState::shot_for(role.opponent());
        }
        Ok(ShotOutcome {
            shooter,
            role,
            x,
            y,
            result,
            winner,
        })
    }

    fn finish(&mut self, winner: UserId) {
        self.state = GameState::Finished;
        self.winner = Some(winner);
        self.log(winner, ActionKind::Finished, format!("Winner: {}", winner), None);
    }

    /// Hand the turn to the other role. Returns the role now holding it.
    pub fn pass_turn(&mut self, user: UserId) -> Result<Role, GameError> {
        if !self.state.is_shot_phase() {
            return Err(GameError::InvalidStage {
                action: "pass the turn",
                state: self.state,
            });
        }
        let role = self.require_role(user)?;
        if self.turn() != Some(role) {
            return Err(GameError::NotYourTurn);
        }
        self.state = GameState::shot_for(role.opponent());
        self.log(user, ActionKind::PassTurn, "Passed the turn", None);
        Ok(role.opponent())
    }

    /// Mark `user` as having left and recompute the game from the remaining
    /// active participants.
    pub fn abandon(&mut self, user: UserId) -> Result<AbandonOutcome, GameError> {
        let role = self.require_role(user)?;
        if let Some(p) = self.participants.iter_mut().find(|p| p.user_id == user && p.is_active()) {
            p.abandoned = true;
            p.ready = false;
        }
        self.log(user, ActionKind::Abandoned, "Left the game", None);
        if self.state.is_finished() {
            return Ok(AbandonOutcome::AfterFinish);
        }

        let remaining: Vec<UserId> = self.active().map(|p| p.user_id).collect();
        let outcome = match remaining.as_slice() {
            [] => {
                self.state = GameState::WaitingForPlayers;
                self.boards = [Board::new(), Board::new()];
                AbandonOutcome::Reset
            }
            [winner] => {
                self.finish(*winner);
                AbandonOutcome::Finished { winner: *winner }
            }
            _ => {
                self.boards[role.fleet_index()] = Board::new();
                for p in self.participants.iter_mut() {
                    p.ready = p.is_active() && p.ready;
                }
                self.state = self.placement_state();
                AbandonOutcome::Reopened
            }
        };
        Ok(outcome)
    }

    /// Seat `host` as Host and everybody else as Guest. Only allowed before
    /// anyone has placed ships.
    pub fn reassign_roles(&mut self, host: UserId) -> Result<(), GameError> {
        let movable = self.state == GameState::WaitingForPlayers || self.state.is_placement();
        if !movable || self.active().any(|p| p.ready) {
            return Err(GameError::InvalidStage {
                action: "reassign roles",
                state: self.state,
            });
        }
        self.require_role(host)?;
        for p in self.participants.iter_mut() {
            p.role = if p.user_id == host && p.is_active() {
                Role::Host
            } else {
                Role::Guest
            };
        }
        self.log(host, ActionKind::RolesReassigned, "Now hosting", None);
        Ok(())
    }

    /// Rematch handshake on a finished game. The first request opens a
    /// window of `window`; a different participant inside it accepts. A
    /// request after the window closed starts a fresh one.
    pub fn request_rematch(
        &mut self,
        user: UserId,
        now: Instant,
        window: Duration,
    ) -> Result<RematchStep, GameError> {
        if !self.state.is_finished() {
            return Err(GameError::InvalidStage {
                action: "request a rematch",
                state: self.state,
            });
        }
        if self.participant(user).is_none() {
            return Err(GameError::UnknownParticipant {
                game: self.id,
                user,
            });
        }
        if let Some(id) = self.rematch_game {
            return Err(GameError::RematchExists(id));
        }

        if self.bot_game {
            let (host, guest) = self.seats();
            self.log(user, ActionKind::RematchRequested, "Rematch against the bot", None);
            return Ok(RematchStep::Accepted { host, guest });
        }

        match &self.rematch {
            Some(req) if now.saturating_duration_since(req.started) <= window => {
                if req.requesters.contains(&user) {
                    return Err(GameError::RematchAlreadyRequested);
                }
                let (host, guest) = self.seats();
                self.rematch = None;
                self.log(user, ActionKind::RematchRequested, "Accepted rematch", None);
                Ok(RematchStep::Accepted { host, guest })
            }
            stale => {
                let detail = if stale.is_some() {
                    "Previous rematch request expired; requested again"
                } else {
                    "Requested rematch"
                };
                self.rematch = Some(RematchRequest {
                    requesters: vec![user],
                    started: now,
                });
                self.log(user, ActionKind::RematchRequested, detail, None);
                Ok(RematchStep::Requested)
            }
        }
    }

    /// Users seated as Host and Guest, abandoned or not.
    fn seats(&self) -> (UserId, UserId) {
        let seat = |role| {
            self.participants
                .iter()
                .find(|p| p.role == role)
                .map(|p| p.user_id)
                .unwrap_or_default()
        };
        (seat(Role::Host), seat(Role::Guest))
    }

    /// Link this finished game to the game created as its rematch.
    pub fn record_rematch(&mut self, new_game: GameId) {
        self.rematch_game = Some(new_game);
        let actor = self.user_for(Role::Host).unwrap_or_default();
        self.log(actor, ActionKind::RematchCreated, format!("Rematch is game {}", new_game), None);
    }

    /// View of the game for `viewer`.
    pub fn snapshot(&self, viewer: UserId) -> Result<GameSnapshot, GameError> {
        let role = self
            .participant(viewer)
            .map(|p| p.role)
            .ok_or(GameError::UnknownParticipant {
                game: self.id,
                user: viewer,
            })?;
        Ok(GameSnapshot {
            id: self.id,
            state: self.state,
            winner: self.winner,
            bot_game: self.bot_game,
            turn: self.turn().and_then(|r| self.user_for(r)),
            created_at: self.created_at,
            participants: self.participants.clone(),
            own_board: BoardView::own(self.board(role)),
            target_board: BoardView::target(self.board(role.opponent())),
            actions: self.actions.clone(),
        })
    }
}
