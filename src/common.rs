//! Common types for the board model: shot results and board errors.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a shot at a board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotResult {
    /// Shot landed on open water.
    Miss,
    /// Shot damaged a ship that is still afloat.
    Hit,
    /// Shot hit the last intact segment of a ship.
    Sunk,
}

impl ShotResult {
    /// Hits and sinks let the shooter keep the turn.
    pub fn keeps_turn(self) -> bool {
        !matches!(self, ShotResult::Miss)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShotResult::Miss => "miss",
            ShotResult::Hit => "hit",
            ShotResult::Sunk => "sunk",
        }
    }
}

impl fmt::Display for ShotResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a ship could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementIssue {
    /// Ship has no segments.
    Empty,
    /// A segment falls outside the board.
    OutOfBounds,
    /// A segment overlaps another ship.
    Overlaps,
}

/// Errors returned by Board operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Coordinates are outside the board.
    OutOfBounds { x: u8, y: u8 },
    /// The cell was already shot.
    AlreadyAttacked { x: u8, y: u8 },
    /// Placement rejected, naming the ship.
    InvalidPlacement { ship: String, issue: PlacementIssue },
    /// Random placement ran out of attempts.
    UnableToPlaceShip,
    /// Every cell of the board has already been shot.
    NoCellsAvailable,
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::OutOfBounds { x, y } => write!(f, "Coordinates ({}, {}) are out of bounds", x, y),
            BoardError::AlreadyAttacked { x, y } => write!(f, "Cell ({}, {}) was already attacked", x, y),
            BoardError::InvalidPlacement { ship, issue } => match issue {
                PlacementIssue::Empty => write!(f, "Invalid placement for {}: ship has no segments", ship),
                PlacementIssue::OutOfBounds => write!(f, "Invalid placement for {}: ship is out of bounds", ship),
                PlacementIssue::Overlaps => write!(f, "Invalid placement for {}: ship overlaps another ship", ship),
            },
            BoardError::UnableToPlaceShip => write!(f, "Unable to place ship"),
            BoardError::NoCellsAvailable => write!(f, "No cells available to attack"),
        }
    }
}

impl std::error::Error for BoardError {}
