// Hex grid topology: bounds, odd-row offset adjacency and edge classification
//
// Rows are staggered (pointy-top, odd rows shifted right), so the six
// neighbours of a cell come from one of two direction tables depending on row
// parity. The enumeration order of those tables is load-bearing: BFS tie-breaks
// and move ordering downstream follow it.

use serde::{Deserialize, Serialize};

use crate::cellset::MAX_CELLS;
use crate::error::EngineError;
use crate::types::Cell;

/// Directions for even rows: E, NE, NW, W, SW, SE
const EVEN_ROW_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (0, -1), (-1, -1), (-1, 0), (-1, 1), (0, 1)];

/// Directions for odd rows: E, NE, NW, W, SW, SE
const ODD_ROW_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (0, 1), (1, 1)];

/// Inclusive column/row bounds of the board
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub col_min: i32,
    pub col_max: i32,
    pub row_min: i32,
    pub row_max: i32,
}

impl GridBounds {
    /// The 5 x 11 board the game is played on
    pub const REFERENCE: GridBounds = GridBounds {
        col_min: 0,
        col_max: 4,
        row_min: 0,
        row_max: 10,
    };

    pub fn width(&self) -> i32 {
        self.col_max - self.col_min + 1
    }

    pub fn height(&self) -> i32 {
        self.row_max - self.row_min + 1
    }
}

/// Validated board geometry. Cheap to copy; all queries are pure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexGrid {
    bounds: GridBounds,
}

impl HexGrid {
    /// Builds a grid, rejecting bounds that are empty or too large to index
    pub fn new(bounds: GridBounds) -> Result<Self, EngineError> {
        if bounds.width() <= 0 || bounds.height() <= 0 {
            return Err(EngineError::EmptyGrid);
        }

        let cells = (bounds.width() as usize) * (bounds.height() as usize);
        if cells > MAX_CELLS {
            return Err(EngineError::GridTooLarge {
                cells,
                max: MAX_CELLS,
            });
        }

        Ok(HexGrid { bounds })
    }

    /// The 5 x 11 reference board
    pub fn reference() -> Self {
        HexGrid {
            bounds: GridBounds::REFERENCE,
        }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn cell_count(&self) -> usize {
        (self.bounds.width() as usize) * (self.bounds.height() as usize)
    }

    pub fn is_valid(&self, cell: Cell) -> bool {
        cell.q >= self.bounds.col_min
            && cell.q <= self.bounds.col_max
            && cell.r >= self.bounds.row_min
            && cell.r <= self.bounds.row_max
    }

    /// True iff the cell is on the board and touches any of its four edges
    pub fn is_escape(&self, cell: Cell) -> bool {
        self.is_valid(cell)
            && (cell.q == self.bounds.col_min
                || cell.q == self.bounds.col_max
                || cell.r == self.bounds.row_min
                || cell.r == self.bounds.row_max)
    }

    /// On-board neighbours in fixed direction order (E, NE, NW, W, SW, SE)
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        let directions = if cell.r.rem_euclid(2) == 0 {
            &EVEN_ROW_DIRECTIONS
        } else {
            &ODD_ROW_DIRECTIONS
        };

        directions
            .iter()
            .map(move |&(dq, dr)| Cell::new(cell.q + dq, cell.r + dr))
            .filter(move |&next| self.is_valid(next))
    }

    /// Dense index of a cell, row-major from the top-left corner
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        if !self.is_valid(cell) {
            return None;
        }
        let row = (cell.r - self.bounds.row_min) as usize;
        let col = (cell.q - self.bounds.col_min) as usize;
        Some(row * self.bounds.width() as usize + col)
    }

    /// Inverse of `index_of`
    pub fn cell_at(&self, index: usize) -> Option<Cell> {
        if index >= self.cell_count() {
            return None;
        }
        let width = self.bounds.width() as usize;
        Some(Cell::new(
            self.bounds.col_min + (index % width) as i32,
            self.bounds.row_min + (index / width) as i32,
        ))
    }

    /// All cells in index order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cell_count()).filter_map(move |index| self.cell_at(index))
    }

    /// Where the pig starts: middle column, middle row
    pub fn center(&self) -> Cell {
        Cell::new(
            self.bounds.col_min + (self.bounds.width() - 1) / 2,
            self.bounds.row_min + (self.bounds.height() - 1) / 2,
        )
    }
}
