use ndarray::Array2;

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(column, row)`.
pub type Coord2 = (Coord, Coord);

/// Grids are stored `(row, column)` so that the standard-layout slice order of an
/// [`Array2`] is the flat index `row * width + column`.
pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.1.into(), self.0.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Flat index of `coords` on a board of `size`.
pub const fn flat_index(coords: Coord2, size: Coord2) -> usize {
    coords.1 as usize * size.0 as usize + coords.0 as usize
}

/// Inverse of [`flat_index`], `None` when `index` is past the end of the board.
pub fn coords_of(index: usize, size: Coord2) -> Option<Coord2> {
    let width = usize::from(size.0);
    if width == 0 || index >= width * usize::from(size.1) {
        return None;
    }
    let column = (index % width).try_into().ok()?;
    let row = (index / width).try_into().ok()?;
    Some((column, row))
}

/// Size `(width, height)` of a grid stored with [`ToNdIndex`] ordering.
pub(crate) fn grid_size<T>(grid: &Array2<T>) -> Option<Coord2> {
    let (rows, columns) = grid.dim();
    Some((columns.try_into().ok()?, rows.try_into().ok()?))
}

static DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// `coords` moved by `delta`, or `None` once it leaves `0..bounds` on either axis.
fn apply_delta(coords: Coord2, delta: (i8, i8), bounds: Coord2) -> Option<Coord2> {
    let x = coords.0.checked_add_signed(delta.0).filter(|&x| x < bounds.0)?;
    let y = coords.1.checked_add_signed(delta.1).filter(|&y| y < bounds.1)?;
    Some((x, y))
}

/// Iterates the up to 8 in-bounds neighbors of a cell, never the cell itself.
#[derive(Debug, Clone)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    deltas: core::slice::Iter<'static, (i8, i8)>,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            deltas: DISPLACEMENTS.iter(),
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        let (center, bounds) = (self.center, self.bounds);
        self.deltas.find_map(|&delta| apply_delta(center, delta, bounds))
    }
}
