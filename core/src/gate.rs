use alloc::vec::Vec;
use core::fmt;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Per-cell highlight derived from a classification.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellTag {
    #[default]
    None,
    Reveal,
    Flag,
    Chord,
    Guess,
}

impl Classification {
    /// Reveal wins over flag, flag over chord, chord over guess.
    pub fn tag(&self, coords: Coord2) -> CellTag {
        if self.reveal.contains(&coords) {
            CellTag::Reveal
        } else if self.flag.contains(&coords) {
            CellTag::Flag
        } else if self.chord.contains(&coords) {
            CellTag::Chord
        } else if self.guess.contains(&coords) {
            CellTag::Guess
        } else {
            CellTag::None
        }
    }

    pub fn tags(&self, size: Coord2) -> Array2<CellTag> {
        Array2::from_shape_fn(size.to_nd_index(), |(row, col)| {
            self.tag((row as Coord, col as Coord))
        })
    }
}

/// Whether the tutor lets `kind` on `coords` through.
pub fn permits(kind: MoveKind, coords: Coord2, classification: &Classification) -> bool {
    if classification.is_empty() {
        true
    } else if classification.is_guess() {
        kind == MoveKind::Reveal && classification.guess.contains(&coords)
    } else {
        classification.bucket(kind).contains(&coords)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Permitted,
    /// Cells the player should have picked, with what to do there.
    Rejected { highlight: Vec<(Coord2, CellTag)> },
}

impl Verdict {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted)
    }
}

pub fn check(mv: Move, classification: &Classification) -> Verdict {
    if permits(mv.kind, mv.coords, classification) {
        return Verdict::Permitted;
    }

    let mut highlight: Vec<(Coord2, CellTag)> = classification
        .reveal
        .iter()
        .chain(&classification.flag)
        .chain(&classification.chord)
        .chain(&classification.guess)
        .map(|&coords| (coords, classification.tag(coords)))
        .collect();
    highlight.sort_unstable();
    highlight.dedup();
    log::debug!("Rejected {:?}, {} cells to highlight", mv, highlight.len());
    Verdict::Rejected { highlight }
}

/// One-line summary of what the tutor wants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Banner {
    Off,
    Finished(GameStatus),
    /// Nothing gains value right now, any move is accepted.
    Unconstrained,
    Guess { cells: usize },
    Advice {
        reveal: usize,
        flag: usize,
        chord: usize,
        gain: CellCount,
        clicks: u8,
        truncated: bool,
    },
}

impl Banner {
    pub fn new(mode: TutorMode, status: GameStatus, classification: &Classification) -> Self {
        if status.is_finished() {
            return Self::Finished(status);
        }
        if !mode.is_active() {
            return Self::Off;
        }
        if classification.is_guess() {
            return Self::Guess {
                cells: classification.guess.len(),
            };
        }
        match (classification.best_gain, classification.best_clicks) {
            (Some(gain), Some(clicks)) if !classification.is_empty() => Self::Advice {
                reveal: classification.reveal.len(),
                flag: classification.flag.len(),
                chord: classification.chord.len(),
                gain,
                clicks,
                truncated: classification.truncated,
            },
            _ => Self::Unconstrained,
        }
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "tutor off"),
            Self::Finished(GameStatus::Won) => write!(f, "cleared"),
            Self::Finished(_) => write!(f, "boom"),
            Self::Unconstrained => write!(f, "no efficient move stands out, play anything"),
            Self::Guess { cells } => write!(f, "no information yet, open any of {cells} cells"),
            Self::Advice {
                reveal,
                flag,
                chord,
                gain,
                clicks,
                truncated,
            } => {
                write!(f, "+{gain} value in {clicks} clicks:")?;
                for (count, what) in [(reveal, "reveal"), (flag, "flag"), (chord, "chord")] {
                    if *count > 0 {
                        write!(f, " {what} {count}")?;
                    }
                }
                if *truncated {
                    write!(f, " (search cut short)")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::string::ToString;

    fn set(cells: &[Coord2]) -> BTreeSet<Coord2> {
        cells.iter().copied().collect()
    }

    fn advice() -> Classification {
        Classification {
            reveal: set(&[(0, 1)]),
            flag: set(&[(1, 1), (0, 1)]),
            chord: set(&[(2, 2)]),
            best_gain: Some(3),
            best_clicks: Some(2),
            ..Classification::default()
        }
    }

    #[test]
    fn empty_classification_permits_everything() {
        let empty = Classification::default();

        for kind in [MoveKind::Reveal, MoveKind::Flag, MoveKind::Chord] {
            assert!(permits(kind, (4, 4), &empty));
        }
        assert_eq!(check(Move::flag((0, 0)), &empty), Verdict::Permitted);
    }

    #[test]
    fn guess_set_only_permits_reveals_inside_it() {
        let guess = Classification {
            guess: set(&[(0, 0), (0, 1)]),
            ..Classification::default()
        };

        assert!(permits(MoveKind::Reveal, (0, 1), &guess));
        assert!(!permits(MoveKind::Reveal, (1, 1), &guess));
        assert!(!permits(MoveKind::Flag, (0, 1), &guess));
        assert!(!permits(MoveKind::Chord, (0, 0), &guess));
    }

    #[test]
    fn buckets_are_matched_by_kind() {
        let classification = advice();

        assert!(permits(MoveKind::Reveal, (0, 1), &classification));
        assert!(permits(MoveKind::Flag, (1, 1), &classification));
        assert!(!permits(MoveKind::Reveal, (1, 1), &classification));
        assert!(!permits(MoveKind::Flag, (2, 2), &classification));
        assert!(permits(MoveKind::Chord, (2, 2), &classification));
    }

    #[test]
    fn rejection_highlights_winning_cells() {
        let verdict = check(Move::reveal((5, 5)), &advice());

        assert_eq!(
            verdict,
            Verdict::Rejected {
                highlight: alloc::vec![
                    ((0, 1), CellTag::Reveal),
                    ((1, 1), CellTag::Flag),
                    ((2, 2), CellTag::Chord),
                ]
            }
        );
    }

    #[test]
    fn tags_follow_priority() {
        let classification = advice();
        let tags = classification.tags((3, 3));

        assert_eq!(tags[[0, 1]], CellTag::Reveal);
        assert_eq!(tags[[1, 1]], CellTag::Flag);
        assert_eq!(tags[[2, 2]], CellTag::Chord);
        assert_eq!(tags[[0, 0]], CellTag::None);
    }

    #[test]
    fn banner_summarizes_classification() {
        let banner = Banner::new(TutorMode::Classic, GameStatus::Playing, &advice());
        assert_eq!(banner.to_string(), "+3 value in 2 clicks: reveal 1 flag 2 chord 1");

        let guess = Classification {
            guess: set(&[(0, 0)]),
            ..Classification::default()
        };
        assert_eq!(
            Banner::new(TutorMode::Classic, GameStatus::Idle, &guess),
            Banner::Guess { cells: 1 }
        );
        assert_eq!(
            Banner::new(TutorMode::Off, GameStatus::Playing, &advice()),
            Banner::Off
        );
        assert_eq!(
            Banner::new(TutorMode::Classic, GameStatus::Lost, &advice()).to_string(),
            "boom"
        );
        assert_eq!(
            Banner::new(TutorMode::NoFlag, GameStatus::Playing, &Classification::default()),
            Banner::Unconstrained
        );
    }
}
