//! Board value ("3BV") segmentation.
//!
//! A value unit is the smallest thing one click can clear: either a connected
//! region of zero cells together with the numbered cells bordering it, or a
//! numbered cell that touches no zero cell at all.

use alloc::vec;
use alloc::vec::Vec;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::*;

/// Index of a value unit, dense from zero in discovery order.
pub type UnitId = CellCount;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueUnits {
    unit_of: Array2<Option<UnitId>>,
    members: Vec<SmallVec<[Coord2; 1]>>,
}

impl ValueUnits {
    /// Board value total.
    pub fn total(&self) -> CellCount {
        self.members.len() as CellCount
    }

    pub fn unit_of(&self, coords: Coord2) -> Option<UnitId> {
        self.unit_of
            .get(coords.to_nd_index())
            .copied()
            .flatten()
    }

    pub fn members(&self, id: UnitId) -> &[Coord2] {
        self.members
            .get(usize::from(id))
            .map(|members| members.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &[Coord2])> {
        self.members
            .iter()
            .enumerate()
            .map(|(id, members)| (id as UnitId, members.as_slice()))
    }

    pub fn is_resolved(&self, board: &Board, id: UnitId, rule: ProgressRule) -> bool {
        rule.is_resolved(board, self.members(id))
    }
}

/// When a unit counts as cleared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressRule {
    /// Every member is revealed. The only rule the advisor scores with.
    AllRevealed,
    /// At least one member is revealed. Cheaper display shortcut that
    /// over-counts zero regions opened only along their border.
    AnyRevealed,
}

impl ProgressRule {
    fn is_resolved(self, board: &Board, members: &[Coord2]) -> bool {
        let revealed = |&coords: &Coord2| board.cell(coords).is_revealed();
        match self {
            Self::AllRevealed => members.iter().all(revealed),
            Self::AnyRevealed => members.iter().any(revealed),
        }
    }
}

impl Default for ProgressRule {
    fn default() -> Self {
        Self::AllRevealed
    }
}

/// Partitions every non-mine cell into value units.
///
/// Depends only on the mine layout, so the result is the same for every
/// state of the same board.
pub fn segment(board: &Board) -> ValueUnits {
    let size = board.size();
    let mut unit_of: Array2<Option<UnitId>> = Array2::from_elem(size.to_nd_index(), None);
    let mut members: Vec<SmallVec<[Coord2; 1]>> = Vec::new();

    for start in iter_coords(size) {
        let cell = board.cell(start);
        if cell.is_mine() || cell.neighbor_mines() != 0 || unit_of[start.to_nd_index()].is_some() {
            continue;
        }

        let id = members.len() as UnitId;
        let mut cluster: SmallVec<[Coord2; 1]> = smallvec![start];
        unit_of[start.to_nd_index()] = Some(id);

        // only zero cells are ever pushed
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for neighbor in board.iter_neighbors(current) {
                let neighbor_cell = board.cell(neighbor);
                if neighbor_cell.is_mine() || unit_of[neighbor.to_nd_index()].is_some() {
                    continue;
                }
                unit_of[neighbor.to_nd_index()] = Some(id);
                cluster.push(neighbor);
                if neighbor_cell.neighbor_mines() == 0 {
                    stack.push(neighbor);
                }
            }
        }
        members.push(cluster);
    }

    for coords in iter_coords(size) {
        if board.cell(coords).is_mine() || unit_of[coords.to_nd_index()].is_some() {
            continue;
        }
        unit_of[coords.to_nd_index()] = Some(members.len() as UnitId);
        members.push(smallvec![coords]);
    }

    log::trace!("Segmented {:?} board into {} units", size, members.len());
    ValueUnits { unit_of, members }
}

/// Units whose every member is revealed.
pub fn progress(board: &Board, units: &ValueUnits) -> CellCount {
    progress_with(board, units, ProgressRule::AllRevealed)
}

pub fn progress_with(board: &Board, units: &ValueUnits, rule: ProgressRule) -> CellCount {
    units
        .members
        .iter()
        .filter(|members| rule.is_resolved(board, members))
        .count() as CellCount
}
