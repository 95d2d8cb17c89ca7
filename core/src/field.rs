use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Immutable mine layout with precomputed adjacency counts.
///
/// Serialized as its mine mask only; deserializing recomputes the hints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MineMask", into = "MineMask")]
pub struct HintField {
    hints: Array2<Hint>,
    mine_count: CellCount,
}

impl HintField {
    /// Builds the field from a `(row, column)` mine mask.
    ///
    /// Mine membership comes only from the mask; counts are derived afterwards by
    /// bumping every non-mine neighbor of every mine.
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let size = grid_size(&mine_mask).ok_or(GameError::InvalidBoardShape)?;
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::EmptyBoard);
        }

        let mine_count: CellCount = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .map_err(|_| GameError::InvalidBoardShape)?;
        let capacity = mult(size.0, size.1) - 1;
        if mine_count > capacity {
            return Err(GameError::TooManyMines {
                requested: mine_count,
                capacity,
            });
        }

        let mut hints: Array2<Hint> = mine_mask.map(|&is_mine| {
            if is_mine {
                Hint::Mine
            } else {
                Hint::Count(0)
            }
        });

        for ((row, column), &is_mine) in mine_mask.indexed_iter() {
            if !is_mine {
                continue;
            }
            let center = (column as Coord, row as Coord);
            for pos in NeighborIter::new(center, size) {
                if let Hint::Count(count) = &mut hints[pos.to_nd_index()] {
                    *count += 1;
                }
            }
        }

        Ok(Self { hints, mine_count })
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::EmptyBoard);
        }
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::OutOfBounds { coords });
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Self::from_mine_mask(mine_mask)
    }

    /// Board size and mine count this field satisfies.
    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size(), self.mine_count)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds { coords })
        }
    }

    /// Board size as `(width, height)`.
    pub fn size(&self) -> Coord2 {
        let (rows, columns) = self.hints.dim();
        (columns as Coord, rows as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        self.hints.len() as CellCount
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn hint_at(&self, coords: Coord2) -> Hint {
        self[coords]
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords].is_mine()
    }

    /// Hints in flat index order (`row * width + column`).
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, Hint)> + '_ {
        self.hints
            .indexed_iter()
            .map(|((row, column), &hint)| ((column as Coord, row as Coord), hint))
    }

    pub fn mine_coords(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.iter()
            .filter(|(_, hint)| hint.is_mine())
            .map(|(coords, _)| coords)
    }

    /// Counts mines around `coords` directly from the layout.
    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| self.contains_mine(pos))
            .count() as u8
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }
}

#[derive(Serialize, Deserialize)]
struct MineMask {
    mine_mask: Array2<bool>,
}

impl TryFrom<MineMask> for HintField {
    type Error = GameError;

    fn try_from(mask: MineMask) -> Result<Self> {
        Self::from_mine_mask(mask.mine_mask)
    }
}

impl From<HintField> for MineMask {
    fn from(field: HintField) -> Self {
        Self {
            mine_mask: field.hints.map(|hint| hint.is_mine()),
        }
    }
}

impl Index<Coord2> for HintField {
    type Output = Hint;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.hints[coords.to_nd_index()]
    }
}
