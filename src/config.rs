use std::net::SocketAddr;
use std::time::Duration;

use crate::ship::ShipType;

pub const BOARD_SIZE: u8 = 10;
pub const CELL_COUNT: usize = BOARD_SIZE as usize * BOARD_SIZE as usize;
pub const NUM_SHIPS: usize = 5;
pub const FLEET: [ShipType; NUM_SHIPS] = [
    ShipType::new("Carrier", 5),
    ShipType::new("Battleship", 4),
    ShipType::new("Cruiser", 3),
    ShipType::new("Submarine", 3),
    ShipType::new("Destroyer", 2),
];

/// Identity reserved for the built-in bot opponent.
pub const BOT_USER_ID: u64 = 0;

/// How long a first rematch request waits for the other participant.
pub const REMATCH_WINDOW: Duration = Duration::from_secs(30);

/// Pause before each bot shot so a streak is readable on the client.
pub const DEFAULT_BOT_SHOT_DELAY: Duration = Duration::from_millis(700);

/// Longest accepted text frame on a push connection, newline excluded.
pub const MAX_FRAME_LEN: usize = 8 * 1024;

/// Total number of ship cells in a standard fleet.
pub const fn fleet_cells() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < NUM_SHIPS {
        total += FLEET[i].length();
        i += 1;
    }
    total
}

/// Tunables for the game engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub bot_shot_delay: Duration,
    pub rematch_window: Duration,
    /// Fixed RNG seed for the bot, for reproducible sessions.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bot_shot_delay: DEFAULT_BOT_SHOT_DELAY,
            rematch_window: REMATCH_WINDOW,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Configuration without pacing delays, used by tests and the simulator.
    pub fn instant(seed: u64) -> Self {
        Self {
            bot_shot_delay: Duration::ZERO,
            rematch_window: REMATCH_WINDOW,
            seed: Some(seed),
        }
    }
}

/// Listener addresses plus engine settings for a running server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub push_bind: SocketAddr,
    pub rpc_bind: SocketAddr,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            push_bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            rpc_bind: SocketAddr::from(([0, 0, 0, 0], 8081)),
            engine: EngineConfig::default(),
        }
    }
}
