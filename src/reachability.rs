// Reachability oracle: breadth-first search from the pig to the nearest edge cell
//
// Called at every node of the game tree, so it works on bitsets and a
// stack-allocated queue. Each cell is enqueued at most once, which bounds the
// queue by the cell count and the work by the reachable region.

use serde::Serialize;
use std::fmt;

use crate::cellset::{CellSet, ObstacleSet, MAX_CELLS};
use crate::grid::HexGrid;
use crate::types::Cell;

/// Length of the shortest escape route, or `Trapped` when none exists.
/// `Steps(_)` orders below `Trapped`, so trapped compares as infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EscapeDistance {
    Steps(u32),
    Trapped,
}

impl EscapeDistance {
    pub fn is_trapped(&self) -> bool {
        matches!(self, EscapeDistance::Trapped)
    }

    pub fn steps(&self) -> Option<u32> {
        match self {
            EscapeDistance::Steps(steps) => Some(*steps),
            EscapeDistance::Trapped => None,
        }
    }
}

impl fmt::Display for EscapeDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscapeDistance::Steps(steps) => write!(f, "{}", steps),
            EscapeDistance::Trapped => write!(f, "trapped"),
        }
    }
}

/// Shortest-route summary: distance plus the first step along it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeRoute {
    pub distance: EscapeDistance,
    /// None when already on the edge or trapped
    pub first_step: Option<Cell>,
}

impl EscapeRoute {
    const ESCAPED: EscapeRoute = EscapeRoute {
        distance: EscapeDistance::Steps(0),
        first_step: None,
    };

    const TRAPPED: EscapeRoute = EscapeRoute {
        distance: EscapeDistance::Trapped,
        first_step: None,
    };
}

/// Marker for "no first step yet" in the packed queue
const NO_STEP: u8 = u8::MAX;

/// Distance to the nearest edge cell and the first step of a shortest path.
///
/// Neighbours are expanded in the grid's fixed direction order, and the first
/// edge cell discovered wins, so among equally short routes the result is
/// always the same one.
pub fn shortest_escape(grid: &HexGrid, position: Cell, obstacles: ObstacleSet) -> EscapeRoute {
    if grid.is_escape(position) {
        return EscapeRoute::ESCAPED;
    }
    let start = match grid.index_of(position) {
        Some(index) => index,
        None => return EscapeRoute::TRAPPED,
    };

    // (cell index, distance, first step index)
    let mut queue = [(0u8, 0u32, NO_STEP); MAX_CELLS];
    let mut head = 0;
    let mut tail = 0;
    let mut visited = CellSet::empty();

    visited.insert_index(start);
    queue[tail] = (start as u8, 0, NO_STEP);
    tail += 1;

    while head < tail {
        let (index, distance, first) = queue[head];
        head += 1;

        let cell = match grid.cell_at(index as usize) {
            Some(cell) => cell,
            None => continue,
        };

        for next in grid.neighbors(cell) {
            let next_index = match grid.index_of(next) {
                Some(next_index) => next_index,
                None => continue,
            };
            if visited.contains_index(next_index) || obstacles.contains_index(next_index) {
                continue;
            }

            let first = if first == NO_STEP {
                next_index as u8
            } else {
                first
            };

            if grid.is_escape(next) {
                return EscapeRoute {
                    distance: EscapeDistance::Steps(distance + 1),
                    first_step: grid.cell_at(first as usize),
                };
            }

            visited.insert_index(next_index);
            queue[tail] = (next_index as u8, distance + 1, first);
            tail += 1;
        }
    }

    EscapeRoute::TRAPPED
}

/// Full shortest path, pig's cell first and the edge cell last.
///
/// Follows the same expansion order as `shortest_escape`, so `path[1]` is its
/// first step. `None` when trapped.
pub fn escape_path(grid: &HexGrid, position: Cell, obstacles: ObstacleSet) -> Option<Vec<Cell>> {
    if grid.is_escape(position) {
        return Some(vec![position]);
    }
    let start = grid.index_of(position)?;

    let mut parent = [usize::MAX; MAX_CELLS];
    let mut queue = [0usize; MAX_CELLS];
    let mut head = 0;
    let mut tail = 0;
    let mut visited = CellSet::empty();

    visited.insert_index(start);
    queue[tail] = start;
    tail += 1;

    while head < tail {
        let index = queue[head];
        head += 1;
        let cell = grid.cell_at(index)?;

        for next in grid.neighbors(cell) {
            let next_index = match grid.index_of(next) {
                Some(next_index) => next_index,
                None => continue,
            };
            if visited.contains_index(next_index) || obstacles.contains_index(next_index) {
                continue;
            }
            parent[next_index] = index;

            if grid.is_escape(next) {
                let mut path = vec![next];
                let mut cursor = index;
                while cursor != usize::MAX {
                    path.push(grid.cell_at(cursor)?);
                    cursor = parent[cursor];
                }
                path.reverse();
                return Some(path);
            }

            visited.insert_index(next_index);
            queue[tail] = next_index;
            tail += 1;
        }
    }

    None
}

/// Every cell the pig can walk to (including its own), ignoring the edge rule
pub fn reachable_cells(grid: &HexGrid, position: Cell, obstacles: ObstacleSet) -> CellSet {
    let mut visited = CellSet::empty();
    let start = match grid.index_of(position) {
        Some(index) => index,
        None => return visited,
    };

    let mut stack = [0usize; MAX_CELLS];
    let mut depth = 0;
    visited.insert_index(start);
    stack[depth] = start;
    depth += 1;

    while depth > 0 {
        depth -= 1;
        let cell = match grid.cell_at(stack[depth]) {
            Some(cell) => cell,
            None => continue,
        };
        for next in grid.neighbors(cell) {
            if let Some(next_index) = grid.index_of(next) {
                if !visited.contains_index(next_index) && !obstacles.contains_index(next_index) {
                    visited.insert_index(next_index);
                    stack[depth] = next_index;
                    depth += 1;
                }
            }
        }
    }

    visited
}
