use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub use engine::*;
pub use error::*;
pub use field::*;
pub use generator::*;
pub use score::*;
pub use session::*;
pub use tile::*;
pub use types::*;

mod engine;
mod error;
mod field;
mod generator;
mod score;
mod session;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub(crate) const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Validates a board of `size` (width, height) holding `mines` mines.
    ///
    /// At least one cell must stay free of mines.
    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::EmptyBoard);
        }
        let capacity = mult(size.0, size.1) - 1;
        if mines > capacity {
            return Err(GameError::TooManyMines {
                requested: mines,
                capacity,
            });
        }
        Ok(Self::new_unchecked(size, mines))
    }

    pub const fn beginner() -> Self {
        Self::new_unchecked((9, 9), 10)
    }

    pub const fn intermediate() -> Self {
        Self::new_unchecked((16, 16), 40)
    }

    pub const fn expert() -> Self {
        Self::new_unchecked((30, 16), 99)
    }

    /// 10x10 with 10 mines.
    pub const fn classic() -> Self {
        Self::new_unchecked((10, 10), 10)
    }

    pub const fn width(&self) -> Coord {
        self.size.0
    }

    pub const fn height(&self) -> Coord {
        self.size.1
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::classic()
    }
}

/// Condition under which a game counts as won.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinRule {
    /// Every safe cell is revealed, flags are irrelevant.
    RevealAllSafe,
    /// Every mine carries a flag and no cell is left plainly hidden.
    ///
    /// Wrong flags on safe cells do not prevent a win under this rule.
    FlagAllMines,
}

impl Default for WinRule {
    fn default() -> Self {
        Self::RevealAllSafe
    }
}

/// Valid transitions:
/// - InProgress -> Won
/// - InProgress -> Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    InProgress,
    Won,
    Lost,
}

impl GameOutcome {
    /// Indicates the game has ended and no moves can be made anymore.
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameOutcome {
    fn default() -> Self {
        Self::InProgress
    }
}

/// Cells whose cover tag changed during one operation, in the order they changed.
pub type ChangeSet = SmallVec<[(Coord2, CoverTag); 8]>;

/// What a mutating engine call did, enough for a renderer to redraw incrementally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealResult {
    pub changed: ChangeSet,
    pub outcome: GameOutcome,
    pub mines_left: isize,
    /// Set only by the call that ended the game.
    pub transition: Option<GameOutcome>,
}

impl RevealResult {
    /// Whether this result could have caused an update to the game.
    pub fn has_update(&self) -> bool {
        !self.changed.is_empty()
    }
}
