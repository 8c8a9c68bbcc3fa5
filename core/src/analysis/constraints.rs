use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Observation;
use crate::*;

/// "Exactly `mines` of `cells` are mines", read off one revealed number.
///
/// Flagged neighbors are trusted and already subtracted from `mines`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueEquation {
    pub clue: Coord2,
    pub cells: SmallVec<[Coord2; 8]>,
    pub mines: u8,
}

/// A revealed number that no assignment of its hidden neighbors can satisfy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contradiction {
    pub clue: Coord2,
    pub needed: i16,
    pub available: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub equations: Vec<ClueEquation>,
    pub contradictions: Vec<Contradiction>,
}

pub fn build_constraints(obs: &Observation) -> ConstraintSet {
    let mut set = ConstraintSet::default();
    if obs.validate().is_err() {
        return set;
    }

    for clue in iter_coords(obs.size) {
        let Some(count) = obs.revealed[clue.to_nd_index()] else {
            continue;
        };

        let mut needed = i16::from(count);
        let mut cells: SmallVec<[Coord2; 8]> = SmallVec::new();
        for neighbor in obs.revealed.iter_neighbors(clue) {
            if obs.flags[neighbor.to_nd_index()] {
                needed -= 1;
            } else if obs.is_hidden(neighbor) {
                cells.push(neighbor);
            }
        }

        if needed < 0 || (needed as usize) > cells.len() {
            set.contradictions.push(Contradiction {
                clue,
                needed,
                available: cells.len(),
            });
            continue;
        }
        if cells.is_empty() {
            continue;
        }
        set.equations.push(ClueEquation {
            clue,
            cells,
            mines: needed as u8,
        });
    }

    set
}
