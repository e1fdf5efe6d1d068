//! Adversarial search over alternating blocker / pig plies.
//!
//! The blocker (maximizing) gets a full alpha-beta search over every free cell
//! next to the pig. The pig is modelled as greedy: on its ply it always steps
//! to the first cell of its current shortest escape route. That asymmetry sets
//! the difficulty of the game and is intentional.
//!
//! Scores are plain `i32`:
//! - pig trapped: `WIN_BASE - depth` (faster traps score higher)
//! - pig escaped: `-WIN_BASE + depth` (later losses hurt less)
//! - depth limit: the pig's escape distance (longer is better for the blocker)

use crate::cellset::ObstacleSet;
use crate::grid::HexGrid;
use crate::reachability::{shortest_escape, EscapeDistance};
use crate::types::Cell;

/// Magnitude of terminal scores; far above any escape distance on a 128-cell board
pub const WIN_BASE: i32 = 1000;

/// Alpha-beta window bounds
pub const SCORE_MIN: i32 = i32::MIN + 1;
pub const SCORE_MAX: i32 = i32::MAX;

/// Whose ply it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Blocker,
    Evader,
}

impl Role {
    pub fn opponent(self) -> Role {
        match self {
            Role::Blocker => Role::Evader,
            Role::Evader => Role::Blocker,
        }
    }
}

/// One position in the game tree. Lives only for the duration of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchNode {
    pub evader: Cell,
    pub obstacles: ObstacleSet,
    pub turn: Role,
    pub depth: u32,
}

impl SearchNode {
    /// Position right after the blocker placed `wall` at the root
    pub fn after_wall(grid: &HexGrid, evader: Cell, obstacles: ObstacleSet, wall: Cell) -> Self {
        SearchNode {
            evader,
            obstacles: obstacles.with(grid, wall),
            turn: Role::Evader,
            depth: 1,
        }
    }
}

#[inline]
pub fn trapped_score(depth: u32) -> i32 {
    WIN_BASE - depth as i32
}

#[inline]
pub fn escaped_score(depth: u32) -> i32 {
    -WIN_BASE + depth as i32
}

/// Search counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Calls to `minimax`
    pub nodes: u64,
    /// Beta cutoffs at blocker plies
    pub cutoffs: u64,
    /// Nodes that ended on a trapped/escaped score
    pub terminal_nodes: u64,
    /// Nodes that ended at the depth limit
    pub horizon_nodes: u64,
}

impl SearchStats {
    /// Combine counters from another worker
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.cutoffs += other.cutoffs;
        self.terminal_nodes += other.terminal_nodes;
        self.horizon_nodes += other.horizon_nodes;
    }
}

/// Single-threaded alpha-beta searcher. One per worker; holds only counters.
pub struct Searcher<'g> {
    grid: &'g HexGrid,
    stats: SearchStats,
}

impl<'g> Searcher<'g> {
    pub fn new(grid: &'g HexGrid) -> Self {
        Searcher {
            grid,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Scores `node` from the blocker's point of view, looking at most
    /// `max_depth` plies from the root.
    pub fn minimax(&mut self, node: SearchNode, mut alpha: i32, beta: i32, max_depth: u32) -> i32 {
        self.stats.nodes += 1;

        let route = shortest_escape(self.grid, node.evader, node.obstacles);
        let steps = match route.distance {
            EscapeDistance::Trapped => {
                self.stats.terminal_nodes += 1;
                return trapped_score(node.depth);
            }
            EscapeDistance::Steps(0) => {
                self.stats.terminal_nodes += 1;
                return escaped_score(node.depth);
            }
            EscapeDistance::Steps(steps) => steps,
        };

        if node.depth >= max_depth {
            self.stats.horizon_nodes += 1;
            return steps as i32;
        }

        match node.turn {
            Role::Blocker => {
                let grid = self.grid;
                let first_step = route.first_step;

                // Pig's next step first, then the rest in direction order
                let moves = first_step.into_iter().chain(
                    grid.neighbors(node.evader)
                        .filter(move |&cell| Some(cell) != first_step),
                );

                let mut best = SCORE_MIN;
                let mut any_move = false;

                for wall in moves {
                    if node.obstacles.contains(grid, wall) {
                        continue;
                    }
                    any_move = true;

                    let child = SearchNode {
                        evader: node.evader,
                        obstacles: node.obstacles.with(grid, wall),
                        turn: node.turn.opponent(),
                        depth: node.depth + 1,
                    };
                    let score = self.minimax(child, alpha, beta, max_depth);

                    best = best.max(score);
                    alpha = alpha.max(score);
                    if beta <= alpha {
                        self.stats.cutoffs += 1;
                        break;
                    }
                }

                if any_move {
                    best
                } else {
                    escaped_score(node.depth)
                }
            }
            Role::Evader => {
                let step = match route.first_step {
                    Some(step) => step,
                    None => return trapped_score(node.depth),
                };
                if self.grid.is_escape(step) {
                    self.stats.terminal_nodes += 1;
                    return escaped_score(node.depth);
                }

                let child = SearchNode {
                    evader: step,
                    obstacles: node.obstacles,
                    turn: node.turn.opponent(),
                    depth: node.depth + 1,
                };
                self.minimax(child, alpha, beta, max_depth)
            }
        }
    }

    /// Full-window score of placing `wall` with the pig at `evader`
    pub fn score_wall(&mut self, evader: Cell, obstacles: ObstacleSet, wall: Cell, max_depth: u32) -> i32 {
        let node = SearchNode::after_wall(self.grid, evader, obstacles, wall);
        self.minimax(node, SCORE_MIN, SCORE_MAX, max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cellset::CellSet;

    fn walls(grid: &HexGrid, cells: &[(i32, i32)]) -> ObstacleSet {
        let cells: Vec<Cell> = cells.iter().map(|&(q, r)| Cell::new(q, r)).collect();
        CellSet::from_cells(grid, cells.iter()).unwrap()
    }

    #[test]
    fn test_trapped_node_scores_win_minus_depth() {
        let grid = HexGrid::reference();
        let obstacles = walls(&grid, &[(3, 5), (3, 4), (2, 4), (1, 5), (3, 6)]);
        let mut searcher = Searcher::new(&grid);

        let score = searcher.score_wall(Cell::new(2, 5), obstacles, Cell::new(2, 6), 8);
        assert_eq!(score, WIN_BASE - 1);
    }

    #[test]
    fn test_escaped_node_scores_loss_plus_depth() {
        let grid = HexGrid::reference();
        let mut searcher = Searcher::new(&grid);
        let node = SearchNode {
            evader: Cell::new(0, 3),
            obstacles: ObstacleSet::empty(),
            turn: Role::Blocker,
            depth: 3,
        };
        assert_eq!(searcher.minimax(node, SCORE_MIN, SCORE_MAX, 10), -WIN_BASE + 3);
    }

    #[test]
    fn test_horizon_returns_escape_distance() {
        let grid = HexGrid::reference();
        let mut searcher = Searcher::new(&grid);
        let node = SearchNode {
            evader: Cell::new(2, 5),
            obstacles: ObstacleSet::empty(),
            turn: Role::Blocker,
            depth: 4,
        };
        assert_eq!(searcher.minimax(node, SCORE_MIN, SCORE_MAX, 4), 2);
        assert_eq!(searcher.stats().horizon_nodes, 1);
    }

    #[test]
    fn test_pig_one_step_from_edge_escapes_on_its_ply() {
        let grid = HexGrid::reference();
        let mut searcher = Searcher::new(&grid);
        // (1, 5) touches (0, 5); a wall far away does not stop it
        let score = searcher.score_wall(Cell::new(1, 5), ObstacleSet::empty(), Cell::new(3, 8), 6);
        assert_eq!(score, escaped_score(1));
    }

    #[test]
    fn test_search_does_not_mutate_root_obstacles() {
        let grid = HexGrid::reference();
        let obstacles = walls(&grid, &[(1, 1), (3, 9)]);
        let before = obstacles;
        let mut searcher = Searcher::new(&grid);
        searcher.score_wall(Cell::new(2, 5), obstacles, Cell::new(3, 5), 8);
        assert_eq!(obstacles, before);
        assert!(searcher.stats().nodes > 1);
    }

    #[test]
    fn test_role_alternates() {
        assert_eq!(Role::Blocker.opponent(), Role::Evader);
        assert_eq!(Role::Evader.opponent(), Role::Blocker);
    }
}
