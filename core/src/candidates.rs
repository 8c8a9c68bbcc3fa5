use alloc::vec::Vec;
use core::cmp::Reverse;
use serde::{Deserialize, Serialize};

use crate::*;

/// Where the reveal candidates came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidatePool {
    /// Hidden cells touching at least one revealed cell.
    Frontier,
    /// No frontier exists, every hidden cell is a blind guess.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    pub moves: Vec<Move>,
    pub pool: CandidatePool,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }
}

/// Ranked, bounded list of plausible next moves.
///
/// Reveals come first, then flags when `mode` allows them, then chords. Reveal
/// and flag candidates share one pool ranked by revealed-neighbor count, chords
/// are ranked by how many hidden neighbors they would open and are never cut
/// below `chord_floor`.
pub fn generate(board: &Board, mode: TutorMode, limit: usize, chord_floor: usize) -> CandidateSet {
    if board.is_finished() {
        return CandidateSet {
            moves: Vec::new(),
            pool: CandidatePool::Frontier,
        };
    }

    let mut frontier: Vec<(u8, Coord2)> = Vec::new();
    let mut hidden: Vec<(u8, Coord2)> = Vec::new();
    let mut chords: Vec<(u8, Coord2)> = Vec::new();

    for cell in board.cells() {
        let coords = cell.coords();
        if cell.is_hidden() {
            let revealed_neighbors = board.count_revealed_neighbors(coords);
            hidden.push((revealed_neighbors, coords));
            if revealed_neighbors > 0 {
                frontier.push((revealed_neighbors, coords));
            }
        } else if cell.is_revealed() && cell.neighbor_mines() > 0 {
            let hidden_neighbors = board.count_hidden_neighbors(coords);
            if hidden_neighbors > 0 {
                chords.push((hidden_neighbors, coords));
            }
        }
    }

    let (mut pool_cells, pool) = if frontier.is_empty() {
        (hidden, CandidatePool::Fallback)
    } else {
        (frontier, CandidatePool::Frontier)
    };
    rank(&mut pool_cells);
    rank(&mut chords);

    let mut moves = Vec::new();
    let pool_len = pool_cells.len().min(limit);
    moves.extend(pool_cells[..pool_len].iter().map(|&(_, coords)| Move::reveal(coords)));
    if mode.allows_flags() {
        moves.extend(pool_cells[..pool_len].iter().map(|&(_, coords)| Move::flag(coords)));
    }
    let chord_len = chords.len().min(limit.max(chord_floor));
    moves.extend(chords[..chord_len].iter().map(|&(_, coords)| Move::chord(coords)));

    log::trace!(
        "Generated {} candidates from {:?}, limit {}",
        moves.len(),
        pool,
        limit
    );
    CandidateSet { moves, pool }
}

/// Score descending, then row-major.
fn rank(cells: &mut [(u8, Coord2)]) {
    cells.sort_by_key(|&(score, coords)| (Reverse(score), coords));
}
