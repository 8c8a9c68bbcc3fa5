use alloc::collections::VecDeque;
use core::num::Saturating;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Idle -> Playing
/// - Idle -> Won
/// - Idle -> Lost
/// - Playing -> Won
/// - Playing -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Idle,
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// The live grid: mine layout, per-cell state and game status.
///
/// Cloning a board gives a fully independent snapshot, which is what the
/// simulator and the advisor work on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    layout: MineLayout,
    cells: Array2<Cell>,
    total_units: CellCount,
    revealed_count: Saturating<CellCount>,
    flagged_count: Saturating<CellCount>,
    status: GameStatus,
    triggered_mine: Option<Coord2>,
}

impl Board {
    /// Builds a fresh board, deriving neighbor counts and value units from the layout.
    pub fn new(layout: MineLayout) -> Self {
        let size = layout.size();
        let cells = Array2::from_shape_fn(size.to_nd_index(), |(row, col)| {
            let coords = (row as Coord, col as Coord);
            if layout.contains_mine(coords) {
                Cell::new(coords, true, 0)
            } else {
                Cell::new(coords, false, layout.adjacent_mine_count(coords))
            }
        });

        let mut board = Self {
            layout,
            cells,
            total_units: 0,
            revealed_count: Saturating(0),
            flagged_count: Saturating(0),
            status: GameStatus::Idle,
            triggered_mine: None,
        };
        board.assign_units();
        board
    }

    /// Random board for `config`, keeping `safe_cell` free of mines when given.
    pub fn generate<R: Rng + ?Sized>(
        config: GameConfig,
        safe_cell: Option<Coord2>,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Self::new(place_mines(config, safe_cell, rng)?))
    }

    /// Rebuilds a mid-game board from a layout plus revealed and flagged masks.
    pub fn restore(
        layout: MineLayout,
        revealed: &Array2<bool>,
        flagged: &Array2<bool>,
    ) -> Result<Self> {
        let mut board = Self::new(layout);
        let shape = board.cells.dim();
        if revealed.dim() != shape || flagged.dim() != shape {
            return Err(GameError::InvalidBoardShape);
        }

        for cell in board.cells.iter_mut() {
            let index = cell.coords.to_nd_index();
            let (is_revealed, is_flagged) = (revealed[index], flagged[index]);
            if (is_revealed && is_flagged) || (is_revealed && cell.is_mine) {
                return Err(GameError::InconsistentSnapshot);
            }
            cell.is_revealed = is_revealed;
            cell.is_flagged = is_flagged;
            if is_revealed {
                board.revealed_count += 1;
            }
            if is_flagged {
                board.flagged_count += 1;
            }
        }

        if board.revealed_count.0 == board.layout.safe_cell_count() {
            board.end_game(true, &mut ActionLog::muted());
        } else if board.revealed_count.0 > 0 || board.flagged_count.0 > 0 {
            board.status = GameStatus::Playing;
        }
        Ok(board)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn layout(&self) -> &MineLayout {
        &self.layout
    }

    pub fn size(&self) -> Coord2 {
        self.layout.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.layout.mine_count()
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.layout.safe_cell_count()
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count.0
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count.0
    }

    /// How many mines have not been flagged yet, negative when over-flagged.
    pub fn mines_left(&self) -> isize {
        (self.layout.mine_count() as isize) - (self.flagged_count.0 as isize)
    }

    /// Total board value, fixed when the board is built.
    pub fn total_units(&self) -> CellCount {
        self.total_units
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        self.layout.validate_coords(coords)
    }

    /// Panics when `coords` is out of bounds, use [`Board::get`] for unchecked input.
    pub fn cell(&self, coords: Coord2) -> &Cell {
        &self.cells[coords.to_nd_index()]
    }

    pub fn get(&self, coords: Coord2) -> Option<&Cell> {
        self.cells.get(coords.to_nd_index())
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn view(&self) -> Array2<CellView> {
        self.cells.map(Cell::view)
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.layout.iter_neighbors(coords)
    }

    pub fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        self.count_neighbors(coords, |cell| cell.is_flagged)
    }

    pub fn count_revealed_neighbors(&self, coords: Coord2) -> u8 {
        self.count_neighbors(coords, |cell| cell.is_revealed)
    }

    pub fn count_hidden_neighbors(&self, coords: Coord2) -> u8 {
        self.count_neighbors(coords, Cell::is_hidden)
    }

    fn count_neighbors(&self, coords: Coord2, predicate: impl Fn(&Cell) -> bool) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| predicate(self.cell(pos)))
            .count() as u8
    }

    pub fn has_revealed_cells(&self) -> bool {
        self.revealed_count.0 > 0
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        self.reveal_logged(coords, &mut ActionLog::muted())
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        self.toggle_flag_logged(coords, &mut ActionLog::muted())
    }

    pub fn chord(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        self.chord_logged(coords, &mut ActionLog::muted())
    }

    pub(crate) fn reveal_logged(
        &mut self,
        coords: Coord2,
        log: &mut ActionLog,
    ) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        self.check_not_finished()?;

        if self.cell(coords).is_hidden() {
            Ok(self.reveal_single_cell(coords, log))
        } else {
            log.push(Effect::NoEffect);
            Ok(RevealOutcome::NoChange)
        }
    }

    pub(crate) fn toggle_flag_logged(
        &mut self,
        coords: Coord2,
        log: &mut ActionLog,
    ) -> Result<MarkOutcome> {
        let coords = self.validate_coords(coords)?;
        self.check_not_finished()?;

        let cell = &mut self.cells[coords.to_nd_index()];
        if cell.is_revealed {
            log.push(Effect::NoEffect);
            return Ok(MarkOutcome::NoChange);
        }

        cell.is_flagged = !cell.is_flagged;
        if cell.is_flagged {
            self.flagged_count += 1;
            log.push(Effect::FlagPlaced(coords));
        } else {
            self.flagged_count -= 1;
            log.push(Effect::FlagRemoved(coords));
        }
        self.mark_started();
        Ok(MarkOutcome::Changed)
    }

    pub(crate) fn chord_logged(
        &mut self,
        coords: Coord2,
        log: &mut ActionLog,
    ) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        self.check_not_finished()?;

        let target = *self.cell(coords);
        if !target.is_revealed
            || target.neighbor_mines == 0
            || self.count_flagged_neighbors(coords) != target.neighbor_mines
        {
            log.push(Effect::NoEffect);
            return Ok(RevealOutcome::NoChange);
        }

        let mut outcome = RevealOutcome::NoChange;
        for neighbor in self.iter_neighbors(coords) {
            if !self.cell(neighbor).is_hidden() {
                continue;
            }
            outcome = outcome | self.reveal_single_cell(neighbor, log);
            if self.is_finished() {
                if outcome == RevealOutcome::HitMine {
                    log::debug!("Chord at {:?} hit a mine at {:?}", coords, neighbor);
                }
                break;
            }
        }

        if outcome == RevealOutcome::NoChange {
            log.push(Effect::NoEffect);
        }
        Ok(outcome)
    }

    /// Reveals a hidden cell, flooding through zero cells.
    fn reveal_single_cell(&mut self, coords: Coord2, log: &mut ActionLog) -> RevealOutcome {
        if self.cell(coords).is_mine {
            self.explode(coords, log);
            return RevealOutcome::HitMine;
        }

        self.flood_reveal(coords, log);
        self.mark_started();

        if self.revealed_count.0 == self.layout.safe_cell_count() {
            self.end_game(true, log);
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        }
    }

    fn flood_reveal(&mut self, start: Coord2, log: &mut ActionLog) {
        let mut to_visit = VecDeque::new();
        if self.open_cell(start, log) == 0 {
            to_visit.push_back(start);
        }

        while let Some(visit_coords) = to_visit.pop_front() {
            for neighbor in self.iter_neighbors(visit_coords) {
                let cell = self.cell(neighbor);
                if !cell.is_hidden() || cell.is_mine {
                    continue;
                }
                if self.open_cell(neighbor, log) == 0 {
                    to_visit.push_back(neighbor);
                }
            }
        }
        log::trace!("Flood from {:?} done, {} cells open", start, self.revealed_count.0);
    }

    /// Marks a safe cell revealed and returns its neighbor count.
    fn open_cell(&mut self, coords: Coord2, log: &mut ActionLog) -> u8 {
        let cell = &mut self.cells[coords.to_nd_index()];
        cell.is_revealed = true;
        self.revealed_count += 1;
        log.push(Effect::Revealed(coords));
        cell.neighbor_mines
    }

    fn explode(&mut self, coords: Coord2, log: &mut ActionLog) {
        let cell = &mut self.cells[coords.to_nd_index()];
        cell.is_revealed = true;
        cell.is_exploded = true;
        self.triggered_mine = Some(coords);
        log.push(Effect::Exploded(coords));
        self.end_game(false, log);
    }

    fn mark_started(&mut self) {
        if self.status.is_idle() {
            self.status = GameStatus::Playing;
        }
    }

    /// Finalizes the grid: on a loss shows mines and wrong flags, on a win flags every mine.
    fn end_game(&mut self, won: bool, log: &mut ActionLog) {
        if self.status.is_finished() {
            return;
        }

        self.status = if won {
            GameStatus::Won
        } else {
            GameStatus::Lost
        };

        let mut flagged_count = Saturating(0);
        for cell in self.cells.iter_mut() {
            match (cell.is_mine, won) {
                (true, true) => cell.is_flagged = true,
                (true, false) => {
                    cell.is_flagged = false;
                    cell.is_revealed = true;
                }
                (false, true) => {
                    cell.is_flagged = false;
                    cell.is_wrong_flag = false;
                }
                (false, false) => cell.is_wrong_flag = cell.is_flagged,
            }
            if cell.is_flagged {
                flagged_count += 1;
            }
        }
        self.flagged_count = flagged_count;

        if won {
            self.triggered_mine = None;
            log.push(Effect::Won);
        } else {
            log.push(Effect::Lost);
        }
        log::debug!("Game ended, won: {}", won);
    }

    fn assign_units(&mut self) {
        let units = segment(self);
        for (id, members) in units.iter() {
            for &coords in members {
                self.cells[coords.to_nd_index()].unit = Some(id);
            }
        }
        self.total_units = units.total();
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.status.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}
