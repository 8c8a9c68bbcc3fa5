use serde::{Deserialize, Serialize};

use crate::{Coord2, UnitId};

/// Full state of one board cell, including the parts hidden from the player.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub(crate) coords: Coord2,
    pub(crate) is_mine: bool,
    pub(crate) is_flagged: bool,
    pub(crate) is_revealed: bool,
    pub(crate) neighbor_mines: u8,
    pub(crate) is_exploded: bool,
    pub(crate) is_wrong_flag: bool,
    pub(crate) unit: Option<UnitId>,
}

impl Cell {
    pub(crate) const fn new(coords: Coord2, is_mine: bool, neighbor_mines: u8) -> Self {
        Self {
            coords,
            is_mine,
            is_flagged: false,
            is_revealed: false,
            neighbor_mines,
            is_exploded: false,
            is_wrong_flag: false,
            unit: None,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        self.coords
    }

    pub const fn is_mine(&self) -> bool {
        self.is_mine
    }

    pub const fn is_flagged(&self) -> bool {
        self.is_flagged
    }

    pub const fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    /// Unrevealed and unflagged.
    pub const fn is_hidden(&self) -> bool {
        !self.is_revealed && !self.is_flagged
    }

    /// Mines among the up to eight neighbors. Zero for mine cells.
    pub const fn neighbor_mines(&self) -> u8 {
        self.neighbor_mines
    }

    pub const fn is_exploded(&self) -> bool {
        self.is_exploded
    }

    pub const fn is_wrong_flag(&self) -> bool {
        self.is_wrong_flag
    }

    /// Board value unit this cell belongs to, `None` for mines.
    pub const fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    /// What a player is allowed to see of this cell.
    pub const fn view(&self) -> CellView {
        match (self.is_revealed, self.is_mine) {
            (true, true) if self.is_exploded => CellView::Exploded,
            (true, true) => CellView::Mine,
            (true, false) => CellView::Revealed(self.neighbor_mines),
            (false, _) if self.is_wrong_flag => CellView::WrongFlag,
            (false, _) if self.is_flagged => CellView::Flagged,
            (false, _) => CellView::Hidden,
        }
    }
}

/// Player-visible cell state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Hidden,
    Revealed(u8),
    Flagged,
    // these are only shown after the game is lost:
    Exploded,
    Mine,
    WrongFlag,
}

impl Default for CellView {
    fn default() -> Self {
        Self::Hidden
    }
}
