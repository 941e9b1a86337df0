//! Game board: a fleet of ships over a 10×10 grid of cells.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::{BoardError, PlacementIssue, ShotResult};
use crate::config::{BOARD_SIZE, FLEET};
use crate::grid::{in_bounds, CellMask};
use crate::ship::{Orientation, Ship};

/// Display status of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    Empty,
    Hit,
    Miss,
}

/// View of one board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub x: u8,
    pub y: u8,
    pub has_ship: bool,
    pub is_hit: bool,
}

impl Cell {
    pub fn status(&self) -> CellStatus {
        match (self.is_hit, self.has_ship) {
            (false, _) => CellStatus::Empty,
            (true, true) => CellStatus::Hit,
            (true, false) => CellStatus::Miss,
        }
    }
}

/// Ship placements, occupancy and shots for one side of a game.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Board {
    ships: Vec<Ship>,
    occupied: CellMask,
    shots: CellMask,
}

impl Board {
    /// Create an empty board (no ships placed, no shots).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board carrying the standard fleet at random positions.
    pub fn random_fleet<R: Rng + ?Sized>(rng: &mut R) -> Result<Self, BoardError> {
        let mut board = Board::new();
        for def in FLEET.iter() {
            let ship = board.random_placement(rng, def.name(), def.length() as u8)?;
            board.place_ship(ship)?;
        }
        Ok(board)
    }

    /// Returns a random non-overlapping ship of `size` named `name`.
    pub fn random_placement<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        name: &str,
        size: u8,
    ) -> Result<Ship, BoardError> {
        if size == 0 || size > BOARD_SIZE {
            return Err(BoardError::UnableToPlaceShip);
        }
        for _ in 0..100 {
            let orientation = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_x, max_y) = match orientation {
                Orientation::Horizontal => (BOARD_SIZE - size, BOARD_SIZE - 1),
                Orientation::Vertical => (BOARD_SIZE - 1, BOARD_SIZE - size),
            };
            let x = rng.random_range(0..=max_x);
            let y = rng.random_range(0..=max_y);
            let ship = Ship::new(name, x, y, size, orientation);
            if (self.occupied & ship.mask()).is_empty() {
                return Ok(ship);
            }
        }
        Err(BoardError::UnableToPlaceShip)
    }

    /// Place a ship. Every segment must be in bounds and on a free cell;
    /// otherwise nothing changes and the error names the ship.
    pub fn place_ship(&mut self, ship: Ship) -> Result<(), BoardError> {
        let invalid = |issue| BoardError::InvalidPlacement {
            ship: ship.name().to_string(),
            issue,
        };
        if ship.size() == 0 {
            return Err(invalid(PlacementIssue::Empty));
        }
        if ship.coordinates().iter().any(|c| !in_bounds(c.x, c.y)) {
            return Err(invalid(PlacementIssue::OutOfBounds));
        }
        let mask = ship.mask();
        // a ship that folds onto itself cannot come from Ship::new, but the
        // mask would undercount it
        if mask.count() != ship.size() || !(self.occupied & mask).is_empty() {
            return Err(invalid(PlacementIssue::Overlaps));
        }
        self.occupied |= mask;
        self.ships.push(ship);
        Ok(())
    }

    /// Fire at (`x`, `y`).
    pub fn resolve_shot(&mut self, x: u8, y: u8) -> Result<ShotResult, BoardError> {
        if !in_bounds(x, y) {
            return Err(BoardError::OutOfBounds { x, y });
        }
        if self.shots.get(x, y) {
            return Err(BoardError::AlreadyAttacked { x, y });
        }
        self.shots.set(x, y);
        if !self.occupied.get(x, y) {
            return Ok(ShotResult::Miss);
        }
        match self.ships.iter_mut().find(|s| s.occupies(x, y)) {
            Some(ship) => {
                ship.register_hit(x, y);
                if ship.is_sunk() {
                    Ok(ShotResult::Sunk)
                } else {
                    Ok(ShotResult::Hit)
                }
            }
            // occupancy is only ever set from a placed ship
            None => Ok(ShotResult::Miss),
        }
    }

    /// Returns `true` when every ship is sunk.
    pub fn all_ships_sunk(&self) -> bool {
        self.ships.iter().all(|s| s.is_sunk())
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn has_fleet(&self) -> bool {
        !self.ships.is_empty()
    }

    /// Number of cells covered by ships.
    pub fn occupied_count(&self) -> usize {
        self.occupied.count()
    }

    pub fn is_attacked(&self, x: u8, y: u8) -> bool {
        self.shots.get(x, y)
    }

    /// Cells that have not been shot yet, row-major.
    pub fn unattacked(&self) -> Vec<(u8, u8)> {
        self.shots.complement().iter().collect()
    }

    pub fn shot_count(&self) -> usize {
        self.shots.count()
    }

    pub fn cell(&self, x: u8, y: u8) -> Option<Cell> {
        in_bounds(x, y).then(|| Cell {
            x,
            y,
            has_ship: self.occupied.get(x, y),
            is_hit: self.shots.get(x, y),
        })
    }

    /// All 100 cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..BOARD_SIZE).flat_map(move |y| {
            (0..BOARD_SIZE).map(move |x| Cell {
                x,
                y,
                has_ship: self.occupied.get(x, y),
                is_hit: self.shots.get(x, y),
            })
        })
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Board {{\n  occupied: {:?},\n  shots: {:?},\n  ships: {:?}\n}}",
            self.occupied, self.shots, self.ships
        )
    }
}
