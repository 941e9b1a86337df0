//! Wire messages.
//!
//! Push connections carry newline-delimited text frames of the form
//! `name|arg|arg...` in both directions. Inbound frames parse into an
//! [`Action`]; outbound pushes are [`Event`]s. The request/response surface
//! exchanges [`RpcMessage`]s through a [`crate::transport::Transport`].

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::common::ShotResult;
use crate::engine::AttackReport;
use crate::game::{GameId, GameSnapshot, Role, UserId};
use crate::registry::Presence;
use crate::service::RematchOutcome;
use crate::ship::{Orientation, ShipPlacement};

/// Version exchanged in the RPC handshake.
pub const PROTOCOL_VERSION: u16 = 1;

pub const FIELD_SEPARATOR: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchmakingCommand {
    Random,
    Cancel,
}

/// Inbound push action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Identifies the connection; must come first.
    Hello { user: UserId },
    CreateGame,
    PlayBot,
    JoinGame { game: GameId },
    PlaceShips {
        game: GameId,
        player: UserId,
        ships: Vec<ShipPlacement>,
    },
    PassTurn { game: GameId },
    Attack { game: GameId, x: u8, y: u8 },
    Chat { game: GameId, text: String },
    Matchmaking(MatchmakingCommand),
    Abandon { game: GameId },
    Rematch { game: GameId },
    GetState { game: GameId },
}

/// Why an inbound frame could not become an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownAction(String),
    Malformed { action: &'static str, reason: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "Empty frame"),
            ParseError::UnknownAction(name) => write!(f, "Unknown action: {}", name),
            ParseError::Malformed { action, reason } => write!(f, "Malformed {}: {}", action, reason),
        }
    }
}

impl std::error::Error for ParseError {}

fn malformed(action: &'static str, reason: impl Into<String>) -> ParseError {
    ParseError::Malformed {
        action,
        reason: reason.into(),
    }
}

fn number<T: std::str::FromStr>(action: &'static str, what: &str, raw: Option<&str>) -> Result<T, ParseError> {
    let raw = raw.ok_or_else(|| malformed(action, format!("missing {}", what)))?;
    raw.trim()
        .parse()
        .map_err(|_| malformed(action, format!("invalid {} '{}'", what, raw)))
}

/// Parses `x,y,size,orientation` tuples separated by `;`.
pub fn parse_ship_list(list: &str) -> Result<Vec<ShipPlacement>, ParseError> {
    const ACTION: &str = "placeShips";
    list.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|tuple| {
            let mut parts = tuple.split(',');
            let x = number(ACTION, "x", parts.next())?;
            let y = number(ACTION, "y", parts.next())?;
            let size = number(ACTION, "size", parts.next())?;
            let raw = parts
                .next()
                .ok_or_else(|| malformed(ACTION, format!("missing orientation in '{}'", tuple)))?;
            let orientation = Orientation::parse(raw)
                .ok_or_else(|| malformed(ACTION, format!("invalid orientation '{}'", raw)))?;
            if parts.next().is_some() {
                return Err(malformed(ACTION, format!("too many fields in '{}'", tuple)));
            }
            Ok(ShipPlacement::new(x, y, size, orientation))
        })
        .collect()
}

impl Action {
    /// Parse one inbound frame. Action names are matched without regard to
    /// case.
    pub fn parse(frame: &str) -> Result<Action, ParseError> {
        let frame = frame.trim_end_matches(&['\r', '\n'][..]);
        if frame.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let (name, rest) = match frame.split_once(FIELD_SEPARATOR) {
            Some((name, rest)) => (name, Some(rest)),
            None => (frame, None),
        };
        let mut args = rest.map(|r| r.split(FIELD_SEPARATOR)).into_iter().flatten();

        let action = match name.trim().to_ascii_lowercase().as_str() {
            "hello" => Action::Hello {
                user: number("Hello", "user id", args.next())?,
            },
            "creategame" => Action::CreateGame,
            "playbot" => Action::PlayBot,
            "joingame" => Action::JoinGame {
                game: number("joinGame", "game id", args.next())?,
            },
            "placeships" => {
                let game = number("placeShips", "game id", args.next())?;
                let player = number("placeShips", "player id", args.next())?;
                let list = args
                    .next()
                    .ok_or_else(|| malformed("placeShips", "missing ship list"))?;
                Action::PlaceShips {
                    game,
                    player,
                    ships: parse_ship_list(list)?,
                }
            }
            "passturn" => Action::PassTurn {
                game: number("passTurn", "game id", args.next())?,
            },
            "attack" => Action::Attack {
                game: number("Attack", "game id", args.next())?,
                x: number("Attack", "x", args.next())?,
                y: number("Attack", "y", args.next())?,
            },
            "chatmessage" => {
                // text may itself contain separators, so take the raw rest
                let rest = rest.ok_or_else(|| malformed("ChatMessage", "missing payload"))?;
                let (game, text) = rest
                    .split_once(':')
                    .ok_or_else(|| malformed("ChatMessage", "expected gameId:text"))?;
                Action::Chat {
                    game: number("ChatMessage", "game id", Some(game))?,
                    text: text.to_string(),
                }
            }
            "matchmaking" => match args.next().map(|a| a.trim().to_ascii_lowercase()) {
                Some(cmd) if cmd == "random" => Action::Matchmaking(MatchmakingCommand::Random),
                Some(cmd) if cmd == "cancel" => Action::Matchmaking(MatchmakingCommand::Cancel),
                other => {
                    return Err(malformed(
                        "Matchmaking",
                        format!("expected random or cancel, got {:?}", other),
                    ))
                }
            },
            "abandon" => Action::Abandon {
                game: number("abandon", "game id", args.next())?,
            },
            "rematch" => Action::Rematch {
                game: number("rematch", "game id", args.next())?,
            },
            "getstate" => Action::GetState {
                game: number("getState", "game id", args.next())?,
            },
            _ => return Err(ParseError::UnknownAction(name.trim().to_string())),
        };
        Ok(action)
    }
}

/// Body of `AttackResult` and `EnemyAttack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotReport {
    pub x: u8,
    pub y: u8,
    pub result: ShotResult,
}

/// Outbound push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Welcome(UserId),
    GameCreated(GameId),
    GameJoined(GameId),
    PlayerJoined { game: GameId, user: UserId },
    GameStarted(GameId),
    ShipsPlaced(GameId),
    YourTurn(GameId),
    AttackResult(ShotReport),
    EnemyAttack(ShotReport),
    /// Winner id, or a message when there is none.
    GameOver(String),
    MatchFound(GameId),
    RematchRequested(GameId),
    RematchCreated(GameId),
    UserStatus { user: UserId, presence: Presence },
    Chat { game: GameId, from: UserId, text: String },
    /// JSON-encoded [`GameSnapshot`].
    GameState(String),
    Error(String),
    UnknownAction(String),
}

fn json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to encode event payload: {}", e);
            "{}".to_string()
        }
    }
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Welcome(_) => "Welcome",
            Event::GameCreated(_) => "GameCreated",
            Event::GameJoined(_) => "GameJoined",
            Event::PlayerJoined { .. } => "PlayerJoined",
            Event::GameStarted(_) => "GameStarted",
            Event::ShipsPlaced(_) => "ShipsPlaced",
            Event::YourTurn(_) => "YourTurn",
            Event::AttackResult(_) => "AttackResult",
            Event::EnemyAttack(_) => "EnemyAttack",
            Event::GameOver(_) => "GameOver",
            Event::MatchFound(_) => "MatchFound",
            Event::RematchRequested(_) => "RematchRequested",
            Event::RematchCreated(_) => "RematchCreated",
            Event::UserStatus { .. } => "UserStatus",
            Event::Chat { .. } => "ChatMessage",
            Event::GameState(_) => "GameState",
            Event::Error(_) => "Error",
            Event::UnknownAction(_) => "UnknownAction",
        }
    }

    fn payload(&self) -> String {
        match self {
            Event::Welcome(id) => id.to_string(),
            Event::GameCreated(id)
            | Event::GameJoined(id)
            | Event::GameStarted(id)
            | Event::ShipsPlaced(id)
            | Event::YourTurn(id)
            | Event::MatchFound(id)
            | Event::RematchRequested(id)
            | Event::RematchCreated(id) => id.to_string(),
            Event::PlayerJoined { game, user } => format!("{}:{}", game, user),
            Event::AttackResult(report) | Event::EnemyAttack(report) => json(report),
            Event::GameOver(msg) => msg.clone(),
            Event::UserStatus { user, presence } => format!("{}:{}", user, presence),
            Event::Chat { game, from, text } => format!("{}:{}:{}", game, from, text),
            Event::GameState(snapshot) => snapshot.clone(),
            Event::Error(msg) => msg.clone(),
            Event::UnknownAction(name) => name.clone(),
        }
    }

    /// `name|payload` text frame, without the trailing newline.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.name(), FIELD_SEPARATOR, self.payload())
    }

    pub fn game_state(snapshot: &GameSnapshot) -> Event {
        Event::GameState(json(snapshot))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Imperative operation on the request/response surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    CreateGame { host: UserId },
    CreateBotGame { host: UserId },
    JoinGame { game: GameId, user: UserId },
    PlaceShips { game: GameId, user: UserId, ships: Vec<ShipPlacement> },
    Attack { game: GameId, user: UserId, x: u8, y: u8 },
    PassTurn { game: GameId, user: UserId },
    Abandon { game: GameId, user: UserId },
    ReassignRoles { game: GameId, host: UserId },
    Rematch { game: GameId, user: UserId },
    Snapshot { game: GameId, viewer: UserId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Created(GameId),
    Joined(Role),
    Placed { started: bool },
    Attack(AttackReport),
    TurnPassed,
    Abandoned,
    RolesReassigned,
    Rematch(RematchOutcome),
    Snapshot(Box<GameSnapshot>),
    Error(String),
}

/// Envelope carried by RPC transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcMessage {
    Hello { version: u16 },
    HelloAck { version: u16 },
    Request(Request),
    Response(Response),
}
