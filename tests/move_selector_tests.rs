//! Move selector behaviour on hand-built and random boards
//!
//! Expected cells for the forced-trap boards were worked out by hand and
//! cross-checked with an exhaustive search.

use block_the_pig::cache::MoveCache;
use block_the_pig::error::EngineError;
use block_the_pig::grid::HexGrid;
use block_the_pig::reachability::shortest_escape;
use block_the_pig::selector::{MoveDecision, MoveSelector, SelectorSettings};
use block_the_pig::types::{Cell, NoMoveReason, SelectionKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn cells(list: &[(i32, i32)]) -> Vec<Cell> {
    list.iter().map(|&(q, r)| Cell::new(q, r)).collect()
}

fn selector() -> MoveSelector {
    MoveSelector::new(HexGrid::reference(), SelectorSettings::default())
}

const CENTER: Cell = Cell::new(2, 5);

/// Pig in the centre with five of six neighbours walled
const FIVE_WALLS: [(i32, i32); 5] = [(3, 5), (3, 4), (2, 4), (1, 5), (3, 6)];

/// Random board where a trap is forced in three blocker moves
const FORCED_IN_THREE: [(i32, i32); 15] = [
    (0, 1),
    (0, 8),
    (0, 9),
    (1, 1),
    (1, 2),
    (1, 5),
    (1, 7),
    (2, 4),
    (2, 7),
    (2, 9),
    (3, 0),
    (4, 4),
    (4, 5),
    (4, 6),
    (4, 7),
];

/// Random board where a trap is forced in four blocker moves
const FORCED_IN_FOUR: [(i32, i32); 12] = [
    (1, 3),
    (1, 4),
    (1, 7),
    (2, 2),
    (2, 6),
    (2, 10),
    (3, 0),
    (3, 1),
    (3, 3),
    (3, 6),
    (3, 8),
    (4, 1),
];

#[test]
fn test_immediate_trap_closes_last_gap() {
    let decision = selector().select_move(CENTER, &cells(&FIVE_WALLS)).unwrap();
    let selection = decision.selection().expect("should place a wall");

    assert_eq!(selection.cell, Cell::new(2, 6));
    assert_eq!(selection.kind, SelectionKind::ImmediateTrap);
    assert!(!selection.timed_out);
}

#[test]
fn test_fully_surrounded_pig_has_no_legal_cells() {
    let mut walls = cells(&FIVE_WALLS);
    walls.push(Cell::new(2, 6));
    let decision = selector().select_move(CENTER, &walls).unwrap();
    assert_eq!(decision, MoveDecision::NoMove(NoMoveReason::NoLegalCells));
}

#[test]
fn test_pig_in_closed_pocket_is_already_trapped() {
    // Pig can still step to (2, 6) but that pocket has no way out
    let walls = cells(&[(3, 5), (3, 4), (2, 4), (1, 5), (3, 6), (1, 6), (1, 7), (2, 7)]);
    let decision = selector().select_move(CENTER, &walls).unwrap();
    assert_eq!(decision, MoveDecision::NoMove(NoMoveReason::AlreadyTrapped));
}

#[test]
fn test_pig_on_edge_has_already_escaped() {
    let decision = selector().select_move(Cell::new(0, 5), &[]).unwrap();
    assert_eq!(decision, MoveDecision::NoMove(NoMoveReason::AlreadyEscaped));
    assert_eq!(decision.cell(), None);
}

#[test]
fn test_forced_trap_in_three_is_found() {
    let decision = selector().select_move(CENTER, &cells(&FORCED_IN_THREE)).unwrap();
    let selection = decision.selection().unwrap();

    assert_eq!(selection.cell, Cell::new(3, 4));
    assert_eq!(selection.score, Some(995));
    assert_eq!(selection.kind, SelectionKind::Search);
    assert_eq!(selection.depth, 6);
    assert_eq!(selection.ranked[0].cell, selection.cell);
}

#[test]
fn test_forced_trap_in_four_is_found() {
    let decision = selector().select_move(CENTER, &cells(&FORCED_IN_FOUR)).unwrap();
    let selection = decision.selection().unwrap();

    assert_eq!(selection.cell, Cell::new(3, 5));
    assert_eq!(selection.score, Some(993));
    assert_eq!(selection.depth, 8);
}

#[test]
fn test_empty_board_blocks_the_direct_route() {
    let decision = selector().select_move(CENTER, &[]).unwrap();
    let selection = decision.selection().unwrap();
    let grid = HexGrid::reference();

    assert_eq!(selection.cell, Cell::new(3, 5));
    assert_eq!(selection.kind, SelectionKind::Search);

    // The pig's reply after this wall does not reach the edge
    let walls = cells(&[(3, 5)]);
    let obstacles = selector().validate(CENTER, &walls).unwrap();
    let route = shortest_escape(&grid, CENTER, obstacles);
    assert_eq!(route.distance.steps(), Some(2));
    assert!(!grid.is_escape(route.first_step.unwrap()));
}

#[test]
fn test_pig_next_to_edge_gets_its_exit_blocked() {
    let decision = selector().select_move(Cell::new(1, 5), &[]).unwrap();
    assert_eq!(decision.cell(), Some(Cell::new(0, 5)));
}

#[test]
fn test_same_board_gives_same_answer() {
    let walls = cells(&FORCED_IN_FOUR);
    let first = selector().select_move(CENTER, &walls).unwrap();
    let second = selector().select_move(CENTER, &walls).unwrap();
    assert_eq!(first.cell(), second.cell());
    assert_eq!(
        first.selection().unwrap().score,
        second.selection().unwrap().score
    );
}

#[test]
fn test_wall_order_and_duplicates_do_not_matter() {
    let mut shuffled = cells(&FORCED_IN_THREE);
    shuffled.reverse();
    shuffled.push(Cell::new(0, 1));

    let ordered = selector().select_move(CENTER, &cells(&FORCED_IN_THREE)).unwrap();
    let messy = selector().select_move(CENTER, &shuffled).unwrap();
    assert_eq!(ordered.cell(), messy.cell());
}

#[test]
fn test_parallel_and_sequential_agree() {
    let grid = HexGrid::reference();
    let sequential = MoveSelector::new(grid, SelectorSettings::default().with_parallel(false));
    let parallel = MoveSelector::new(grid, SelectorSettings::default().with_parallel(true));

    for walls in [cells(&[]), cells(&FORCED_IN_THREE), cells(&FORCED_IN_FOUR)] {
        let a = sequential.select_move(CENTER, &walls).unwrap();
        let b = parallel.select_move(CENTER, &walls).unwrap();
        assert_eq!(a.cell(), b.cell(), "walls {:?}", walls);
        assert_eq!(a.selection().unwrap().score, b.selection().unwrap().score);
    }
}

#[test]
fn test_cached_answer_matches_fresh_search() {
    let cache = Arc::new(MoveCache::new(16));
    let cached = selector().with_cache(cache.clone());
    let walls = cells(&FORCED_IN_FOUR);

    let first = cached.select_move(CENTER, &walls).unwrap();
    let second = cached.select_move(CENTER, &walls).unwrap();
    let fresh = selector().select_move(CENTER, &walls).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.cell(), fresh.cell());
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_off_board_pig_is_rejected() {
    let result = selector().select_move(Cell::new(7, 5), &[]);
    assert_eq!(
        result,
        Err(EngineError::InvalidPosition {
            cell: Cell::new(7, 5)
        })
    );
}

#[test]
fn test_off_board_wall_is_rejected() {
    let result = selector().select_move(CENTER, &cells(&[(1, 1), (2, 11)]));
    assert_eq!(
        result,
        Err(EngineError::InvalidObstacle {
            cell: Cell::new(2, 11)
        })
    );
}

#[test]
fn test_wall_on_pig_is_rejected() {
    let result = selector().select_move(CENTER, &[CENTER]);
    assert_eq!(result, Err(EngineError::ObstacleOnEvader { cell: CENTER }));
}

#[test]
fn test_chosen_cell_is_always_free_on_random_boards() {
    let grid = HexGrid::reference();
    let selector = MoveSelector::new(grid, SelectorSettings::default().with_max_depth(6));
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..40 {
        let count = rng.random_range(5..=15);
        let mut walls = Vec::new();
        while walls.len() < count {
            let cell = grid.cell_at(rng.random_range(0..grid.cell_count())).unwrap();
            if cell != CENTER && !walls.contains(&cell) {
                walls.push(cell);
            }
        }

        let decision = selector.select_move(CENTER, &walls).unwrap();
        let route = shortest_escape(&grid, CENTER, selector.validate(CENTER, &walls).unwrap());
        match decision {
            MoveDecision::Block(selection) => {
                assert!(grid.is_valid(selection.cell));
                assert_ne!(selection.cell, CENTER);
                assert!(!walls.contains(&selection.cell));
                assert!(!route.distance.is_trapped());
            }
            MoveDecision::NoMove(reason) => {
                assert!(matches!(
                    reason,
                    NoMoveReason::AlreadyTrapped | NoMoveReason::NoLegalCells
                ));
                assert!(route.distance.is_trapped());
            }
        }
    }
}
