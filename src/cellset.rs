//! Fixed-size cell bitset.
//!
//! The board is small and fixed, so a set of cells is a single `u128` keyed by
//! `HexGrid::index_of`. Sets are `Copy`: extending one returns a new value and
//! never disturbs the original, which is what sibling branches of the game
//! tree rely on.

use crate::error::EngineError;
use crate::grid::HexGrid;
use crate::types::Cell;

/// Largest board the bitset can index
pub const MAX_CELLS: usize = 128;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CellSet {
    bits: u128,
}

/// Walls currently on the board (plus hypothetical ones during search)
pub type ObstacleSet = CellSet;

impl CellSet {
    pub const fn empty() -> Self {
        CellSet { bits: 0 }
    }

    /// Builds a set from caller-supplied cells, rejecting any off the board.
    /// Duplicates collapse.
    pub fn from_cells<'a, I>(grid: &HexGrid, cells: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        let mut set = CellSet::empty();
        for &cell in cells {
            let index = grid
                .index_of(cell)
                .ok_or(EngineError::InvalidObstacle { cell })?;
            set.insert_index(index);
        }
        Ok(set)
    }

    #[inline]
    pub fn contains_index(&self, index: usize) -> bool {
        index < MAX_CELLS && self.bits & (1u128 << index) != 0
    }

    #[inline]
    pub fn insert_index(&mut self, index: usize) {
        if index < MAX_CELLS {
            self.bits |= 1u128 << index;
        }
    }

    /// Off-board cells are never members
    #[inline]
    pub fn contains(&self, grid: &HexGrid, cell: Cell) -> bool {
        grid.index_of(cell)
            .map_or(false, |index| self.contains_index(index))
    }

    /// Adds an on-board cell; returns false if it was off the board
    pub fn insert(&mut self, grid: &HexGrid, cell: Cell) -> bool {
        match grid.index_of(cell) {
            Some(index) => {
                self.insert_index(index);
                true
            }
            None => false,
        }
    }

    /// Copy of this set with one more cell
    #[inline]
    #[must_use]
    pub fn with(mut self, grid: &HexGrid, cell: Cell) -> Self {
        self.insert(grid, cell);
        self
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Members in index order (row-major), which is also the canonical order
    pub fn cells<'g>(&self, grid: &'g HexGrid) -> impl Iterator<Item = Cell> + 'g {
        let bits = self.bits;
        (0..grid.cell_count())
            .filter(move |&index| bits & (1u128 << index) != 0)
            .filter_map(move |index| grid.cell_at(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_does_not_touch_original() {
        let grid = HexGrid::reference();
        let base = CellSet::empty().with(&grid, Cell::new(1, 1));
        let extended = base.with(&grid, Cell::new(2, 2));

        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert!(!base.contains(&grid, Cell::new(2, 2)));
        assert!(extended.contains(&grid, Cell::new(1, 1)));
    }

    #[test]
    fn test_from_cells_collapses_duplicates() {
        let grid = HexGrid::reference();
        let cells = [Cell::new(3, 3), Cell::new(3, 3), Cell::new(0, 10)];
        let set = CellSet::from_cells(&grid, cells.iter()).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_from_cells_rejects_off_grid() {
        let grid = HexGrid::reference();
        let cells = [Cell::new(1, 1), Cell::new(-1, 4)];
        assert_eq!(
            CellSet::from_cells(&grid, cells.iter()),
            Err(EngineError::InvalidObstacle {
                cell: Cell::new(-1, 4)
            })
        );
    }

    #[test]
    fn test_cells_are_listed_in_row_major_order() {
        let grid = HexGrid::reference();
        let cells = [Cell::new(4, 10), Cell::new(0, 0), Cell::new(3, 1)];
        let set = CellSet::from_cells(&grid, cells.iter()).unwrap();
        let listed: Vec<Cell> = set.cells(&grid).collect();
        assert_eq!(
            listed,
            vec![Cell::new(0, 0), Cell::new(3, 1), Cell::new(4, 10)]
        );
    }

    #[test]
    fn test_off_grid_cells_are_never_members() {
        let grid = HexGrid::reference();
        let mut set = CellSet::empty();
        assert!(!set.insert(&grid, Cell::new(7, 7)));
        assert!(set.is_empty());
        assert!(!set.contains(&grid, Cell::new(7, 7)));
    }
}
