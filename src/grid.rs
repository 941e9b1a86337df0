//! Fixed 10×10 cell mask packed into a `u128`.
//!
//! Bit `y * BOARD_SIZE + x` stands for cell `(x, y)`. Boards keep one mask
//! for ship occupancy and one for shots, so every cell always exists and is
//! derived from the two masks.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign};

use crate::config::{BOARD_SIZE, CELL_COUNT};

const N: usize = BOARD_SIZE as usize;
const FULL: u128 = (1u128 << CELL_COUNT) - 1;

/// Returns `true` when `(x, y)` lies on the board.
#[inline]
pub fn in_bounds(x: u8, y: u8) -> bool {
    x < BOARD_SIZE && y < BOARD_SIZE
}

/// Set of board cells.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CellMask {
    bits: u128,
}

impl CellMask {
    /// Empty mask.
    #[inline]
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Mask with every cell set.
    #[inline]
    pub const fn full() -> Self {
        Self { bits: FULL }
    }

    #[inline]
    fn index(x: u8, y: u8) -> Option<usize> {
        in_bounds(x, y).then(|| y as usize * N + x as usize)
    }

    /// Whether `(x, y)` is set. Out-of-bounds cells are never set.
    #[inline]
    pub fn get(&self, x: u8, y: u8) -> bool {
        Self::index(x, y).is_some_and(|idx| (self.bits >> idx) & 1 == 1)
    }

    /// Sets `(x, y)`. Returns `false` and leaves the mask alone when the
    /// cell is off the board.
    #[inline]
    pub fn set(&mut self, x: u8, y: u8) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.bits |= 1u128 << idx;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Cells of the board that are not in this mask.
    #[inline]
    pub fn complement(&self) -> Self {
        Self {
            bits: !self.bits & FULL,
        }
    }

    /// Builds a mask from `(x, y)` pairs, skipping off-board pairs.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (u8, u8)>,
    {
        let mut mask = Self::new();
        for (x, y) in cells {
            mask.set(x, y);
        }
        mask
    }

    /// Iterator over set cells in row-major order, yielding `(x, y)`.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        (0..CELL_COUNT)
            .filter(move |idx| (self.bits >> idx) & 1 == 1)
            .map(|idx| ((idx % N) as u8, (idx / N) as u8))
    }
}

impl BitAnd for CellMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self {
            bits: self.bits & rhs.bits,
        }
    }
}

impl BitOr for CellMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOrAssign for CellMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl fmt::Debug for CellMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CellMask ({} set):", self.count())?;
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                let c = if self.get(x, y) { '■' } else { '□' };
                write!(f, "{} ", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
