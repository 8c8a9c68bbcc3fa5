use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    Reveal,
    Flag,
    Chord,
}

/// One player action on one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Move {
    pub kind: MoveKind,
    pub coords: Coord2,
}

impl Move {
    pub const fn reveal(coords: Coord2) -> Self {
        Self {
            kind: MoveKind::Reveal,
            coords,
        }
    }

    pub const fn flag(coords: Coord2) -> Self {
        Self {
            kind: MoveKind::Flag,
            coords,
        }
    }

    pub const fn chord(coords: Coord2) -> Self {
        Self {
            kind: MoveKind::Chord,
            coords,
        }
    }

    /// What a primary click on `coords` means: chord on a revealed number, reveal otherwise.
    pub fn primary(board: &Board, coords: Coord2) -> Self {
        match board.get(coords) {
            Some(cell) if cell.is_revealed() && cell.neighbor_mines() > 0 => Self::chord(coords),
            _ => Self::reveal(coords),
        }
    }
}

/// Something that happened while a move was applied.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// The move was a no-op under the board rules.
    NoEffect,
    Revealed(Coord2),
    Exploded(Coord2),
    FlagPlaced(Coord2),
    FlagRemoved(Coord2),
    Won,
    Lost,
}

/// Ordered record of the effects of one move.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    entries: SmallVec<[Effect; 8]>,
    #[serde(skip)]
    muted: bool,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that drops everything, for live moves nobody inspects.
    pub(crate) fn muted() -> Self {
        Self {
            entries: SmallVec::new(),
            muted: true,
        }
    }

    pub(crate) fn push(&mut self, effect: Effect) {
        if !self.muted {
            self.entries.push(effect);
        }
    }

    pub fn entries(&self) -> &[Effect] {
        &self.entries
    }

    pub fn is_no_effect(&self) -> bool {
        self.entries.iter().all(|effect| matches!(effect, Effect::NoEffect))
    }

    pub fn exploded(&self) -> bool {
        self.entries
            .iter()
            .any(|effect| matches!(effect, Effect::Exploded(_)))
    }

    pub fn revealed_cells(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.entries.iter().filter_map(|effect| match effect {
            Effect::Revealed(coords) => Some(*coords),
            _ => None,
        })
    }
}

/// Result of applying a move to a copy of a board.
#[derive(Clone, Debug, PartialEq)]
pub struct Simulation {
    pub board: Board,
    pub exploded: bool,
    pub log: ActionLog,
}

impl Simulation {
    pub fn is_no_effect(&self) -> bool {
        self.log.is_no_effect()
    }
}

/// Applies `mv` to a copy of `board`. The input is never touched.
pub fn apply(board: &Board, mv: Move) -> Result<Simulation> {
    let mut next = board.clone();
    let log = apply_in_place(&mut next, mv)?;
    Ok(Simulation {
        board: next,
        exploded: log.exploded(),
        log,
    })
}

/// Applies `mv` to `board` itself, recording what happened.
pub fn apply_in_place(board: &mut Board, mv: Move) -> Result<ActionLog> {
    let mut log = ActionLog::new();
    match mv.kind {
        MoveKind::Reveal => {
            board.reveal_logged(mv.coords, &mut log)?;
        }
        MoveKind::Flag => {
            board.toggle_flag_logged(mv.coords, &mut log)?;
        }
        MoveKind::Chord => {
            board.chord_logged(mv.coords, &mut log)?;
        }
    }
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::board;
    use alloc::vec::Vec;

    #[test]
    fn apply_leaves_input_untouched() {
        let board = board((3, 5), &[(1, 2)]);
        let before = board.clone();

        let sim = apply(&board, Move::reveal((2, 0))).unwrap();

        assert_eq!(board, before);
        assert!(!sim.exploded);
        assert!(!sim.is_no_effect());
        assert_eq!(sim.log.revealed_cells().count(), 6);
        assert_eq!(sim.board.revealed_count(), 6);
    }

    #[test]
    fn reveal_of_revealed_number_is_no_effect() {
        let mut board = board((3, 3), &[(0, 0)]);
        board.reveal((1, 1)).unwrap();

        let sim = apply(&board, Move::reveal((1, 1))).unwrap();

        assert_eq!(sim.board, board);
        assert!(sim.is_no_effect());
        assert_eq!(sim.log.entries(), &[Effect::NoEffect]);
    }

    #[test]
    fn flag_on_revealed_cell_is_no_effect() {
        let mut board = board((3, 3), &[(0, 0)]);
        board.reveal((1, 1)).unwrap();

        let sim = apply(&board, Move::flag((1, 1))).unwrap();
        assert!(sim.is_no_effect());

        let sim = apply(&board, Move::flag((0, 0))).unwrap();
        assert_eq!(sim.log.entries(), &[Effect::FlagPlaced((0, 0))]);
        let sim = apply(&sim.board, Move::flag((0, 0))).unwrap();
        assert_eq!(sim.log.entries(), &[Effect::FlagRemoved((0, 0))]);
    }

    #[test]
    fn exploding_move_is_reported() {
        let board = board((3, 3), &[(0, 0)]);

        let sim = apply(&board, Move::reveal((0, 0))).unwrap();

        assert!(sim.exploded);
        assert_eq!(
            sim.log.entries(),
            &[Effect::Exploded((0, 0)), Effect::Lost]
        );
        assert_eq!(sim.board.status(), GameStatus::Lost);
        assert_eq!(board.status(), GameStatus::Idle);
    }

    #[test]
    fn chord_off_by_one_flag_leaves_board_unchanged() {
        let mut board = board((3, 3), &[(0, 1), (2, 1)]);
        board.reveal((1, 1)).unwrap();
        board.toggle_flag((0, 1)).unwrap();

        let short = apply(&board, Move::chord((1, 1))).unwrap();
        assert!(short.is_no_effect());
        assert_eq!(short.board, board);

        board.toggle_flag((2, 1)).unwrap();
        let exact = apply(&board, Move::chord((1, 1))).unwrap();
        let revealed: Vec<_> = exact.log.revealed_cells().collect();
        assert_eq!(revealed, [(0, 0), (0, 2), (1, 0), (1, 2), (2, 0), (2, 2)]);
        assert_eq!(exact.log.entries().last(), Some(&Effect::Won));
    }

    #[test]
    fn primary_click_chords_numbers_only() {
        let mut board = board((3, 3), &[(0, 0)]);
        assert_eq!(Move::primary(&board, (1, 1)), Move::reveal((1, 1)));

        board.reveal((1, 1)).unwrap();
        assert_eq!(Move::primary(&board, (1, 1)), Move::chord((1, 1)));
        assert_eq!(Move::primary(&board, (9, 9)), Move::reveal((9, 9)));
    }

    #[test]
    fn moves_order_by_kind_then_coords() {
        let mut moves = [
            Move::chord((0, 0)),
            Move::reveal((1, 0)),
            Move::flag((0, 0)),
            Move::reveal((0, 5)),
        ];
        moves.sort();

        assert_eq!(
            moves,
            [
                Move::reveal((0, 5)),
                Move::reveal((1, 0)),
                Move::flag((0, 0)),
                Move::chord((0, 0)),
            ]
        );
    }
}
