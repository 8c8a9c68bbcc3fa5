use thiserror::Error;

use crate::{CellCount, Coord};

/// Rejected board or tutor configuration. Raised before anything is mutated.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Board size {rows}x{cols} is outside the supported range")]
    InvalidDimensions { rows: Coord, cols: Coord },
    #[error("A board needs at least one mine")]
    NoMines,
    #[error("Too many mines: {mines} requested but at most {max} fit")]
    TooManyMines { mines: CellCount, max: CellCount },
    #[error("Search depth {0} is outside the supported range")]
    InvalidDepth(u8),
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Snapshot has a cell that is both revealed and flagged, or a revealed mine")]
    InconsistentSnapshot,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = core::result::Result<T, GameError>;
