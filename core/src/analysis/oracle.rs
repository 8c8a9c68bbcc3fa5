use alloc::boxed::Box;
use core::fmt;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{Observation, build_constraints};
use crate::*;

/// What an oracle knows about one hidden cell.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Assessment {
    Safe,
    Mine,
    /// Chance of a mine, in `[0, 1]`.
    Probability(f32),
}

/// Read-only mine solver consulted next to the tutor.
///
/// Gets only what the player sees and returns one entry per cell, `None` for
/// cells it has nothing to say about (revealed, or no information).
pub trait MineOracle: Send + Sync {
    fn assess(&self, obs: &Observation) -> Array2<Option<Assessment>>;
}

#[derive(Default)]
pub enum SolverCapability {
    #[default]
    Unavailable,
    Available(Box<dyn MineOracle>),
}

impl SolverCapability {
    pub fn local() -> Self {
        Self::Available(Box::new(LocalClueOracle))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn assess(&self, obs: &Observation) -> Option<Array2<Option<Assessment>>> {
        match self {
            Self::Unavailable => None,
            Self::Available(oracle) => Some(oracle.assess(obs)),
        }
    }
}

impl fmt::Debug for SolverCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "Unavailable"),
            Self::Available(_) => write!(f, "Available(..)"),
        }
    }
}

/// Single-clue propagation to a fixed point, then uniform density for the rest.
///
/// Flags are taken at face value. Cells left undetermined get the remaining
/// mine count spread evenly over them when the total is known.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalClueOracle;

impl MineOracle for LocalClueOracle {
    fn assess(&self, obs: &Observation) -> Array2<Option<Assessment>> {
        let mut out = Array2::from_elem(obs.size.to_nd_index(), None);
        let set = build_constraints(obs);
        if !set.contradictions.is_empty() {
            log::debug!("{} contradicting clues, skipping propagation", set.contradictions.len());
        } else {
            propagate(&set.equations, &mut out);
        }

        let flagged = obs.flags.iter().filter(|&&flag| flag).count();
        let mut known_mines = flagged;
        let mut open = 0usize;
        for coords in iter_coords(obs.size) {
            if !obs.is_hidden(coords) {
                continue;
            }
            match out[coords.to_nd_index()] {
                Some(Assessment::Mine) => known_mines += 1,
                Some(_) => {}
                None => open += 1,
            }
        }

        let Some(total) = obs.mine_count else {
            return out;
        };
        if open == 0 {
            return out;
        }
        let left = usize::from(total).saturating_sub(known_mines).min(open);
        let density = left as f32 / open as f32;
        for coords in iter_coords(obs.size) {
            let index = coords.to_nd_index();
            if obs.is_hidden(coords) && out[index].is_none() {
                out[index] = Some(match left {
                    0 => Assessment::Safe,
                    _ if left == open => Assessment::Mine,
                    _ => Assessment::Probability(density),
                });
            }
        }
        out
    }
}

fn propagate(equations: &[ClueEquation], out: &mut Array2<Option<Assessment>>) {
    let mut changed = true;
    while changed {
        changed = false;
        for equation in equations {
            let mut mines = 0u8;
            let mut unknown = 0u8;
            for &cell in &equation.cells {
                match out[cell.to_nd_index()] {
                    Some(Assessment::Mine) => mines += 1,
                    Some(_) => {}
                    None => unknown += 1,
                }
            }
            if unknown == 0 || mines > equation.mines {
                continue;
            }

            let fill = if mines == equation.mines {
                Assessment::Safe
            } else if equation.mines - mines == unknown {
                Assessment::Mine
            } else {
                continue;
            };
            for &cell in &equation.cells {
                let slot = &mut out[cell.to_nd_index()];
                if slot.is_none() {
                    *slot = Some(fill);
                    changed = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::board;

    #[test]
    fn unavailable_capability_says_nothing() {
        let board = board((3, 3), &[(0, 0)]);
        let obs = Observation::from_board(&board);

        assert!(SolverCapability::default().assess(&obs).is_none());
        assert!(SolverCapability::local().is_available());
    }

    #[test]
    fn undetermined_cells_share_the_mine() {
        let mut board = board((3, 2), &[(0, 0)]);
        board.reveal((2, 0)).unwrap();

        let obs = Observation::from_board(&board);
        let out = LocalClueOracle.assess(&obs);

        // (2,x) are zeros, (1,x) are ones, so the top row holds the single mine
        assert_eq!(out[(2, 0)], None);
        assert_eq!(out[(0, 0)], Some(Assessment::Probability(0.5)));
        assert_eq!(out[(0, 1)], Some(Assessment::Probability(0.5)));
    }

    #[test]
    fn propagation_chains_through_clues() {
        // 1 2 1 row under two mines, one of them flagged
        let mut board = board((3, 3), &[(0, 0), (0, 2)]);
        board.reveal((2, 1)).unwrap();
        board.toggle_flag((0, 0)).unwrap();

        let obs = Observation::from_board(&board);
        let out = LocalClueOracle.assess(&obs);

        assert_eq!(out[(0, 0)], None);
        // the 1 at (1,0) is satisfied by the flag
        assert_eq!(out[(0, 1)], Some(Assessment::Safe));
        // which leaves the 2 at (1,1) one mine short
        assert_eq!(out[(0, 2)], Some(Assessment::Mine));
    }

    #[test]
    fn density_fills_unconstrained_cells() {
        let board = board((2, 2), &[(0, 0), (1, 1)]);
        let out = LocalClueOracle.assess(&Observation::from_board(&board));

        for value in out.iter() {
            assert_eq!(*value, Some(Assessment::Probability(0.5)));
        }
    }
}
