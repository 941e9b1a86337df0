//! Hunt/random targeting for the bot opponent.
//!
//! Works from the target board's recorded hits alone; keeps no memory between
//! turns.

use rand::Rng;

use crate::board::Board;
use crate::common::BoardError;
use crate::grid::{in_bounds, CellMask};

/// How a target was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// Next to a hit on a damaged ship that is still afloat.
    Hunt,
    /// Uniform over every unshot cell.
    Random,
}

/// Unshot, in-bounds orthogonal neighbours of every hit segment belonging to
/// a damaged, unsunk ship. Row-major and free of duplicates.
pub fn hunt_candidates(board: &Board) -> Vec<(u8, u8)> {
    let mut pool = CellMask::new();
    for ship in board.ships().iter().filter(|s| s.is_damaged()) {
        for hit in ship.hits() {
            for (dx, dy) in [(0i16, -1i16), (1, 0), (0, 1), (-1, 0)] {
                let nx = hit.x as i16 + dx;
                let ny = hit.y as i16 + dy;
                if nx < 0 || ny < 0 {
                    continue;
                }
                let (nx, ny) = (nx as u8, ny as u8);
                if in_bounds(nx, ny) && !board.is_attacked(nx, ny) {
                    pool.set(nx, ny);
                }
            }
        }
    }
    pool.iter().collect()
}

/// Pick the bot's next shot on `board`.
pub fn choose_target<R: Rng + ?Sized>(
    board: &Board,
    rng: &mut R,
) -> Result<((u8, u8), TargetMode), BoardError> {
    let pool = hunt_candidates(board);
    if !pool.is_empty() {
        let pick = pool[rng.random_range(0..pool.len())];
        return Ok((pick, TargetMode::Hunt));
    }
    let open = board.unattacked();
    if open.is_empty() {
        return Err(BoardError::NoCellsAvailable);
    }
    Ok((open[rng.random_range(0..open.len())], TargetMode::Random))
}
