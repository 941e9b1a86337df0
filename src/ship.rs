//! Ship definitions and their per-segment hit tracking.

use serde::{Deserialize, Serialize};

use crate::grid::CellMask;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Extends along increasing `x`.
    Horizontal,
    /// Extends along increasing `y`.
    Vertical,
}

impl Orientation {
    /// Parses `h`, `horizontal`, `v` or `vertical`, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Some(Orientation::Horizontal),
            "v" | "vertical" => Some(Orientation::Vertical),
            _ => None,
        }
    }
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipType {
    name: &'static str,
    length: usize,
}

impl ShipType {
    /// Create a new ship type.
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Ship's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ship's length.
    pub const fn length(&self) -> usize {
        self.length
    }
}

/// One segment of a ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u8,
    pub y: u8,
    pub is_hit: bool,
}

/// Client-supplied position of a ship before it is named and placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub x: u8,
    pub y: u8,
    pub size: u8,
    pub orientation: Orientation,
}

impl ShipPlacement {
    pub fn new(x: u8, y: u8, size: u8, orientation: Orientation) -> Self {
        Self {
            x,
            y,
            size,
            orientation,
        }
    }
}

/// A ship with an ordered list of segments. Only the hit flags change after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    name: String,
    coords: Vec<Coordinate>,
}

impl Ship {
    /// Lay a ship of `size` segments starting at (`x`, `y`). Segments that
    /// would run past `u8::MAX` are clamped there, which the board rejects as
    /// out of bounds.
    pub fn new(name: impl Into<String>, x: u8, y: u8, size: u8, orientation: Orientation) -> Self {
        let coords = (0..size)
            .map(|i| {
                let (cx, cy) = match orientation {
                    Orientation::Horizontal => (x.saturating_add(i), y),
                    Orientation::Vertical => (x, y.saturating_add(i)),
                };
                Coordinate {
                    x: cx,
                    y: cy,
                    is_hit: false,
                }
            })
            .collect();
        Ship {
            name: name.into(),
            coords,
        }
    }

    pub fn from_placement(name: impl Into<String>, placement: &ShipPlacement) -> Self {
        Self::new(
            name,
            placement.x,
            placement.y,
            placement.size,
            placement.orientation,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placement that lays out this ship again.
    pub fn placement(&self) -> ShipPlacement {
        let (x, y) = self.coords.first().map(|c| (c.x, c.y)).unwrap_or((0, 0));
        let orientation = match self.coords.get(1) {
            Some(next) if next.x == x => Orientation::Vertical,
            _ => Orientation::Horizontal,
        };
        ShipPlacement::new(x, y, self.coords.len() as u8, orientation)
    }

    pub fn size(&self) -> usize {
        self.coords.len()
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coords
    }

    /// Whether the ship has a segment at (`x`, `y`).
    pub fn occupies(&self, x: u8, y: u8) -> bool {
        self.coords.iter().any(|c| c.x == x && c.y == y)
    }

    /// Occupancy of the ship as a board mask.
    pub fn mask(&self) -> CellMask {
        CellMask::from_cells(self.coords.iter().map(|c| (c.x, c.y)))
    }

    /// Flag the segment at (`x`, `y`) as hit. Returns `true` if the ship has
    /// a segment there.
    pub fn register_hit(&mut self, x: u8, y: u8) -> bool {
        match self.coords.iter_mut().find(|c| c.x == x && c.y == y) {
            Some(c) => {
                c.is_hit = true;
                true
            }
            None => false,
        }
    }

    /// All segments hit.
    pub fn is_sunk(&self) -> bool {
        !self.coords.is_empty() && self.coords.iter().all(|c| c.is_hit)
    }

    /// Some, but not all, segments hit.
    pub fn is_damaged(&self) -> bool {
        self.coords.iter().any(|c| c.is_hit) && !self.is_sunk()
    }

    /// Segments that have been hit.
    pub fn hits(&self) -> impl Iterator<Item = &Coordinate> {
        self.coords.iter().filter(|c| c.is_hit)
    }
}
