use thiserror::Error;

use crate::{CellCount, Coord2};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board must be at least 1x1")]
    EmptyBoard,
    #[error("Too many mines, requested {requested} but at most {capacity} fit")]
    TooManyMines {
        requested: CellCount,
        capacity: CellCount,
    },
    #[error("Coordinates {coords:?} are outside the board")]
    OutOfBounds { coords: Coord2 },
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
}

pub type Result<T> = core::result::Result<T, GameError>;
