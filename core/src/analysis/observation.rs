use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// What a player can see: revealed numbers and flags, no mine positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub size: Coord2,
    pub mine_count: Option<CellCount>,
    pub revealed: Array2<Option<u8>>,
    pub flags: Array2<bool>,
}

impl Observation {
    pub fn new(
        size: Coord2,
        mine_count: Option<CellCount>,
        revealed: Array2<Option<u8>>,
        flags: Array2<bool>,
    ) -> Result<Self> {
        let obs = Self {
            size,
            mine_count,
            revealed,
            flags,
        };
        obs.validate()?;
        Ok(obs)
    }

    pub fn from_board(board: &Board) -> Self {
        let size = board.size();
        let mut revealed = Array2::from_elem(size.to_nd_index(), None);
        let mut flags = Array2::from_elem(size.to_nd_index(), false);

        for cell in board.cells() {
            let index = cell.coords().to_nd_index();
            match cell.view() {
                CellView::Revealed(count) => revealed[index] = Some(count),
                CellView::Flagged => flags[index] = true,
                _ => {}
            }
        }

        Self {
            size,
            mine_count: Some(board.total_mines()),
            revealed,
            flags,
        }
    }

    pub fn is_hidden(&self, coords: Coord2) -> bool {
        let index = coords.to_nd_index();
        self.revealed[index].is_none() && !self.flags[index]
    }

    pub fn validate(&self) -> Result<()> {
        let expected = (usize::from(self.size.0), usize::from(self.size.1));
        if self.revealed.dim() != expected || self.flags.dim() != expected {
            return Err(GameError::InvalidBoardShape);
        }

        let max = mult(self.size.0, self.size.1);
        match self.mine_count {
            Some(mines) if mines > max => Err(ConfigError::TooManyMines { mines, max }.into()),
            _ => Ok(()),
        }
    }
}
