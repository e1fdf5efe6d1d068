// Game-loop simulation: walls go down, then the pig runs
//
// The pig starts in the middle of the board. For the first `opening_walls`
// placements it stays put; after that every wall is answered by the pig
// stepping along its shortest escape route. The blocker wins once the pig has
// no route out and loses once the pig stands on an edge cell.

use log::debug;
use rand::Rng;
use serde::Serialize;

use crate::cellset::{CellSet, ObstacleSet};
use crate::config::GameConfig;
use crate::error::EngineError;
use crate::grid::HexGrid;
use crate::reachability::shortest_escape;
use crate::selector::MoveSelector;
use crate::types::{Cell, GamePhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameStatus {
    InProgress,
    /// Pig cut off from every edge cell
    Won,
    /// Pig reached an edge cell
    Lost,
}

/// Summary of a finished (or abandoned) game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    /// `InProgress` here means the turn limit was hit
    pub status: GameStatus,
    pub turns: u32,
    pub walls: usize,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    grid: HexGrid,
    pig: Cell,
    walls: ObstacleSet,
    walls_placed: u32,
    opening_walls: u32,
    status: GameStatus,
}

impl GameSession {
    /// Starts a game from an explicit board
    pub fn new(grid: HexGrid, pig: Cell, walls: &[Cell], opening_walls: u32) -> Result<Self, EngineError> {
        if !grid.is_valid(pig) {
            return Err(EngineError::InvalidPosition { cell: pig });
        }
        let walls = CellSet::from_cells(&grid, walls)?;
        if walls.contains(&grid, pig) {
            return Err(EngineError::ObstacleOnEvader { cell: pig });
        }

        let mut session = GameSession {
            grid,
            pig,
            walls,
            walls_placed: 0,
            opening_walls,
            status: GameStatus::InProgress,
        };
        session.status = session.evaluate();
        Ok(session)
    }

    /// Pig in the centre, a random number of random walls around it
    pub fn new_random<R: Rng>(grid: HexGrid, rng: &mut R, rules: &GameConfig) -> Self {
        let pig = grid.center();
        let free_cells = grid.cell_count().saturating_sub(1);
        let target = rng
            .random_range(rules.min_initial_walls..=rules.max_initial_walls)
            .min(free_cells);

        let mut walls = CellSet::empty();
        while walls.len() < target {
            let index = rng.random_range(0..grid.cell_count());
            if let Some(cell) = grid.cell_at(index) {
                if cell != pig {
                    walls.insert_index(index);
                }
            }
        }

        let mut session = GameSession {
            grid,
            pig,
            walls,
            walls_placed: 0,
            opening_walls: rules.opening_walls,
            status: GameStatus::InProgress,
        };
        session.status = session.evaluate();
        session
    }

    pub fn pig(&self) -> Cell {
        self.pig
    }

    pub fn obstacles(&self) -> ObstacleSet {
        self.walls
    }

    pub fn walls(&self) -> Vec<Cell> {
        self.walls.cells(&self.grid).collect()
    }

    pub fn walls_placed(&self) -> u32 {
        self.walls_placed
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Opening while the pig is still held in place
    pub fn phase(&self) -> GamePhase {
        if self.walls_placed < self.opening_walls {
            GamePhase::Opening
        } else {
            GamePhase::Main
        }
    }

    /// Places a wall and, outside the opening, lets the pig answer
    pub fn place_wall(&mut self, cell: Cell) -> Result<GameStatus, EngineError> {
        if self.status != GameStatus::InProgress {
            return Err(EngineError::GameOver);
        }
        if !self.grid.is_valid(cell) || cell == self.pig || self.walls.contains(&self.grid, cell) {
            return Err(EngineError::IllegalWall { cell });
        }

        let pig_moves = self.phase() == GamePhase::Main;
        self.walls.insert(&self.grid, cell);
        self.walls_placed += 1;

        self.status = self.evaluate();
        if self.status != GameStatus::InProgress || !pig_moves {
            return Ok(self.status);
        }

        if let Some(step) = shortest_escape(&self.grid, self.pig, self.walls).first_step {
            debug!("Pig moves {} -> {}", self.pig, step);
            self.pig = step;
        }
        self.status = self.evaluate();
        Ok(self.status)
    }

    /// Lets `selector` play the blocker until the game ends or `max_turns` walls are placed
    pub fn play_out(&mut self, selector: &MoveSelector, max_turns: u32) -> Result<GameOutcome, EngineError> {
        let mut turns = 0;
        while self.status == GameStatus::InProgress && turns < max_turns {
            let decision = selector.decide(self.pig, self.walls, None);
            let cell = match decision.cell() {
                Some(cell) => cell,
                None => break,
            };
            self.place_wall(cell)?;
            turns += 1;
        }

        Ok(GameOutcome {
            status: self.status,
            turns,
            walls: self.walls.len(),
        })
    }

    fn evaluate(&self) -> GameStatus {
        if self.grid.is_escape(self.pig) {
            GameStatus::Lost
        } else if shortest_escape(&self.grid, self.pig, self.walls).distance.is_trapped() {
            GameStatus::Won
        } else {
            GameStatus::InProgress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pig_holds_still_during_opening() {
        let grid = HexGrid::reference();
        let mut game = GameSession::new(grid, Cell::new(2, 5), &[], 2).unwrap();

        assert_eq!(game.phase(), GamePhase::Opening);
        game.place_wall(Cell::new(0, 0)).unwrap();
        game.place_wall(Cell::new(0, 1)).unwrap();
        assert_eq!(game.pig(), Cell::new(2, 5));
        assert_eq!(game.phase(), GamePhase::Main);

        game.place_wall(Cell::new(0, 2)).unwrap();
        assert_eq!(game.pig(), Cell::new(3, 5));
    }

    #[test]
    fn test_pig_reaching_edge_loses_the_game() {
        let grid = HexGrid::reference();
        let mut game = GameSession::new(grid, Cell::new(3, 5), &[], 0).unwrap();

        assert_eq!(game.place_wall(Cell::new(1, 1)).unwrap(), GameStatus::Lost);
        assert_eq!(game.pig(), Cell::new(4, 5));
        assert_eq!(game.place_wall(Cell::new(1, 2)), Err(EngineError::GameOver));
    }

    #[test]
    fn test_closing_last_gap_wins() {
        let grid = HexGrid::reference();
        let walls = [
            Cell::new(3, 5),
            Cell::new(3, 4),
            Cell::new(2, 4),
            Cell::new(1, 5),
            Cell::new(3, 6),
        ];
        let mut game = GameSession::new(grid, Cell::new(2, 5), &walls, 0).unwrap();
        assert_eq!(game.place_wall(Cell::new(2, 6)).unwrap(), GameStatus::Won);
        assert_eq!(game.pig(), Cell::new(2, 5));
    }

    #[test]
    fn test_wall_on_pig_or_existing_wall_is_illegal() {
        let grid = HexGrid::reference();
        let mut game = GameSession::new(grid, Cell::new(2, 5), &[Cell::new(1, 1)], 3).unwrap();
        assert_eq!(
            game.place_wall(Cell::new(2, 5)),
            Err(EngineError::IllegalWall { cell: Cell::new(2, 5) })
        );
        assert_eq!(
            game.place_wall(Cell::new(1, 1)),
            Err(EngineError::IllegalWall { cell: Cell::new(1, 1) })
        );
        assert_eq!(
            game.place_wall(Cell::new(5, 1)),
            Err(EngineError::IllegalWall { cell: Cell::new(5, 1) })
        );
    }
}
