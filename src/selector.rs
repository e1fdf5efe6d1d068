//! Move selector: picks one cell to block per call.
//!
//! Order of business:
//! 1. Pig already on the edge, boxed in, or already cut off: no move.
//! 2. Build root candidates (by default the free cells within two steps).
//! 3. Fast path: any candidate that cuts the pig off right now wins.
//! 4. Iterative-deepening minimax over the candidates until the deadline,
//!    the depth cap, or a forced trap.
//! 5. Nothing scored before the deadline: fall back to the pig's next step.
//!
//! Calls are independent. The optional cache only short-circuits repeat
//! boards.

use log::debug;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::MoveCache;
use crate::cellset::{CellSet, ObstacleSet};
use crate::config::{CandidateScope, Config};
use crate::error::EngineError;
use crate::grid::HexGrid;
use crate::reachability::shortest_escape;
use crate::search::{trapped_score, SearchStats, Searcher};
use crate::types::{Cell, NoMoveReason, SelectionKind};

/// Tuning knobs of one selector
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSettings {
    pub initial_depth: u32,
    pub depth_step: u32,
    pub max_depth: u32,
    pub win_threshold: i32,
    pub parallel: bool,
    pub min_candidates_for_parallel: usize,
    pub scope: CandidateScope,
    pub time_budget: Duration,
}

impl SelectorSettings {
    pub fn from_config(config: &Config) -> Self {
        SelectorSettings {
            initial_depth: config.search.initial_depth,
            depth_step: config.search.depth_step.max(1),
            max_depth: config.search.max_depth,
            win_threshold: config.search.win_threshold,
            parallel: config.search.parallel,
            min_candidates_for_parallel: config.search.min_candidates_for_parallel,
            scope: config.candidates.scope,
            time_budget: Duration::from_millis(config.timing.search_budget_ms()),
        }
    }

    #[must_use]
    pub fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl Default for SelectorSettings {
    fn default() -> Self {
        SelectorSettings::from_config(&Config::default_hardcoded())
    }
}

/// Root candidate with its best score over the iterations it took part in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedCandidate {
    pub cell: Cell,
    /// None if the deadline hit before it was scored
    pub score: Option<i32>,
}

/// A chosen wall and how it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub cell: Cell,
    pub score: Option<i32>,
    pub kind: SelectionKind,
    /// Deepest iteration that scored at least one candidate
    pub depth: u32,
    pub timed_out: bool,
    /// Best first; `ranked[0].cell == cell`
    pub ranked: Vec<RankedCandidate>,
    pub stats: SearchStats,
}

/// Result of one selector call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveDecision {
    Block(Selection),
    NoMove(NoMoveReason),
}

impl MoveDecision {
    pub fn cell(&self) -> Option<Cell> {
        match self {
            MoveDecision::Block(selection) => Some(selection.cell),
            MoveDecision::NoMove(_) => None,
        }
    }

    pub fn reason(&self) -> Option<NoMoveReason> {
        match self {
            MoveDecision::Block(_) => None,
            MoveDecision::NoMove(reason) => Some(*reason),
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            MoveDecision::Block(selection) => Some(selection),
            MoveDecision::NoMove(_) => None,
        }
    }
}

const NO_CELL: u32 = u32::MAX;

/// Lock-free view of a running search, read by the async poller
#[derive(Debug)]
pub struct SearchProgress {
    /// Grid index of the best cell so far
    best_cell: AtomicU32,
    best_score: AtomicI32,
    current_depth: AtomicU32,
    complete: AtomicBool,
}

impl SearchProgress {
    pub fn new() -> Self {
        SearchProgress {
            best_cell: AtomicU32::new(NO_CELL),
            best_score: AtomicI32::new(i32::MIN),
            current_depth: AtomicU32::new(0),
            complete: AtomicBool::new(false),
        }
    }

    fn publish(&self, grid: &HexGrid, cell: Cell, score: i32) {
        if let Some(index) = grid.index_of(cell) {
            self.best_cell.store(index as u32, Ordering::Release);
            self.best_score.store(score, Ordering::Release);
        }
    }

    fn set_depth(&self, depth: u32) {
        self.current_depth.store(depth, Ordering::Release);
    }

    fn mark_complete(&self) {
        self.complete.store(true, Ordering::Release);
    }

    /// Best (cell, score) published so far
    pub fn best(&self, grid: &HexGrid) -> Option<(Cell, i32)> {
        match self.best_cell.load(Ordering::Acquire) {
            NO_CELL => None,
            index => grid
                .cell_at(index as usize)
                .map(|cell| (cell, self.best_score.load(Ordering::Acquire))),
        }
    }

    pub fn current_depth(&self) -> u32 {
        self.current_depth.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }
}

impl Default for SearchProgress {
    fn default() -> Self {
        SearchProgress::new()
    }
}

/// Chooses the wall to place. Cheap to clone; clones share the cache.
#[derive(Debug, Clone)]
pub struct MoveSelector {
    grid: HexGrid,
    settings: SelectorSettings,
    cache: Option<Arc<MoveCache>>,
}

impl MoveSelector {
    pub fn new(grid: HexGrid, settings: SelectorSettings) -> Self {
        MoveSelector {
            grid,
            settings,
            cache: None,
        }
    }

    /// Grid, settings and (if enabled) a cache, all from configuration
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let grid = HexGrid::new(config.grid)?;
        let selector = MoveSelector::new(grid, SelectorSettings::from_config(config));
        if config.cache.enabled {
            Ok(selector.with_cache(Arc::new(MoveCache::new(config.cache.capacity))))
        } else {
            Ok(selector)
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<MoveCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn settings(&self) -> &SelectorSettings {
        &self.settings
    }

    pub fn cache(&self) -> Option<&Arc<MoveCache>> {
        self.cache.as_ref()
    }

    /// Checks caller input and turns the wall list into a bitset
    pub fn validate(&self, evader: Cell, walls: &[Cell]) -> Result<ObstacleSet, EngineError> {
        if !self.grid.is_valid(evader) {
            return Err(EngineError::InvalidPosition { cell: evader });
        }
        let obstacles = CellSet::from_cells(&self.grid, walls)?;
        if obstacles.contains(&self.grid, evader) {
            return Err(EngineError::ObstacleOnEvader { cell: evader });
        }
        Ok(obstacles)
    }

    /// Picks the wall for this turn
    pub fn select_move(&self, evader: Cell, walls: &[Cell]) -> Result<MoveDecision, EngineError> {
        let obstacles = self.validate(evader, walls)?;
        Ok(self.decide(evader, obstacles, None))
    }

    /// Same as `select_move`, publishing intermediate results to `progress`
    pub fn select_move_with_progress(
        &self,
        evader: Cell,
        walls: &[Cell],
        progress: &SearchProgress,
    ) -> Result<MoveDecision, EngineError> {
        let obstacles = match self.validate(evader, walls) {
            Ok(obstacles) => obstacles,
            Err(e) => {
                progress.mark_complete();
                return Err(e);
            }
        };
        Ok(self.decide(evader, obstacles, Some(progress)))
    }

    /// Core decision on validated input: `evader` on the grid and not in `obstacles`
    pub fn decide(
        &self,
        evader: Cell,
        obstacles: ObstacleSet,
        progress: Option<&SearchProgress>,
    ) -> MoveDecision {
        let decision = self.decide_inner(evader, obstacles, progress);
        if let Some(progress) = progress {
            progress.mark_complete();
        }
        decision
    }

    fn decide_inner(
        &self,
        evader: Cell,
        obstacles: ObstacleSet,
        progress: Option<&SearchProgress>,
    ) -> MoveDecision {
        let deadline = Instant::now() + self.settings.time_budget;
        let grid = &self.grid;

        if grid.is_escape(evader) {
            return MoveDecision::NoMove(NoMoveReason::AlreadyEscaped);
        }
        if !grid
            .neighbors(evader)
            .any(|cell| !obstacles.contains(grid, cell))
        {
            return MoveDecision::NoMove(NoMoveReason::NoLegalCells);
        }

        let route = shortest_escape(grid, evader, obstacles);
        if route.distance.is_trapped() {
            return MoveDecision::NoMove(NoMoveReason::AlreadyTrapped);
        }

        let cache_key = self
            .cache
            .as_ref()
            .map(|_| MoveCache::key(grid, evader, obstacles));
        if let (Some(cache), Some(key)) = (self.cache.as_ref(), cache_key.as_ref()) {
            if let Some(decision) = cache.get(key) {
                debug!("Cache hit for {}", key);
                if let (Some(progress), Some(selection)) = (progress, decision.selection()) {
                    progress.publish(grid, selection.cell, selection.score.unwrap_or(0));
                }
                return decision;
            }
        }

        let candidates = self.candidates(evader, obstacles, route.first_step);
        if candidates.is_empty() {
            return MoveDecision::NoMove(NoMoveReason::NoLegalCells);
        }
        debug!(
            "Pig at {} (escape distance {}), {} candidates",
            evader,
            route.distance,
            candidates.len()
        );

        let selection = match self.immediate_trap(evader, obstacles, &candidates) {
            Some(cell) => {
                let score = trapped_score(1);
                if let Some(progress) = progress {
                    progress.publish(grid, cell, score);
                }
                Selection {
                    cell,
                    score: Some(score),
                    kind: SelectionKind::ImmediateTrap,
                    depth: 1,
                    timed_out: false,
                    ranked: vec![RankedCandidate {
                        cell,
                        score: Some(score),
                    }],
                    stats: SearchStats::default(),
                }
            }
            None => self.iterative_deepening(evader, obstacles, &candidates, deadline, progress),
        };

        let decision = MoveDecision::Block(selection);
        if let (Some(cache), Some(key)) = (self.cache.as_ref(), cache_key) {
            if !decision.selection().map_or(false, |s| s.timed_out) {
                cache.insert(key, decision.clone());
            }
        }
        decision
    }

    /// Root candidates in generation order, the pig's next step moved to the front
    pub fn candidates(&self, evader: Cell, obstacles: ObstacleSet, first_step: Option<Cell>) -> Vec<Cell> {
        let grid = &self.grid;
        let mut seen = CellSet::empty().with(grid, evader);
        let mut candidates = Vec::new();

        for cell in grid.neighbors(evader) {
            if !obstacles.contains(grid, cell) {
                seen.insert(grid, cell);
                candidates.push(cell);
            }
        }

        match self.settings.scope {
            CandidateScope::Neighbors => {}
            CandidateScope::TwoRing => {
                let ring = candidates.clone();
                for cell in ring {
                    for next in grid.neighbors(cell) {
                        if !obstacles.contains(grid, next) && !seen.contains(grid, next) {
                            seen.insert(grid, next);
                            candidates.push(next);
                        }
                    }
                }
            }
            CandidateScope::FullBoard => {
                for cell in grid.cells() {
                    if !obstacles.contains(grid, cell) && !seen.contains(grid, cell) {
                        seen.insert(grid, cell);
                        candidates.push(cell);
                    }
                }
            }
        }

        if let Some(step) = first_step {
            if let Some(position) = candidates.iter().position(|&cell| cell == step) {
                let step = candidates.remove(position);
                candidates.insert(0, step);
            }
        }

        candidates
    }

    /// First candidate whose wall leaves the pig with no route out
    fn immediate_trap(&self, evader: Cell, obstacles: ObstacleSet, candidates: &[Cell]) -> Option<Cell> {
        candidates.iter().copied().find(|&cell| {
            shortest_escape(&self.grid, evader, obstacles.with(&self.grid, cell))
                .distance
                .is_trapped()
        })
    }

    /// Scores one root wall at `max_depth`; None once the deadline has passed
    fn evaluate(
        &self,
        evader: Cell,
        obstacles: ObstacleSet,
        wall: Cell,
        max_depth: u32,
        deadline: Instant,
    ) -> Option<(i32, SearchStats)> {
        if Instant::now() >= deadline {
            return None;
        }
        let mut searcher = Searcher::new(&self.grid);
        let score = searcher.score_wall(evader, obstacles, wall, max_depth);
        Some((score, searcher.stats()))
    }

    fn iterative_deepening(
        &self,
        evader: Cell,
        obstacles: ObstacleSet,
        candidates: &[Cell],
        deadline: Instant,
        progress: Option<&SearchProgress>,
    ) -> Selection {
        let settings = &self.settings;
        let parallel = settings.parallel && candidates.len() >= settings.min_candidates_for_parallel;

        let mut best_scores: Vec<Option<i32>> = vec![None; candidates.len()];
        let mut stats = SearchStats::default();
        let mut depth_reached = 0;
        let mut timed_out = false;
        let mut depth = settings.initial_depth;

        while depth <= settings.max_depth {
            if Instant::now() >= deadline {
                timed_out = true;
                break;
            }
            if let Some(progress) = progress {
                progress.set_depth(depth);
            }

            let results: Vec<Option<(i32, SearchStats)>> = if parallel {
                candidates
                    .par_iter()
                    .map(|&wall| self.evaluate(evader, obstacles, wall, depth, deadline))
                    .collect()
            } else {
                let mut results = Vec::with_capacity(candidates.len());
                for &wall in candidates {
                    let result = self.evaluate(evader, obstacles, wall, depth, deadline);
                    let forced = matches!(result, Some((score, _)) if score >= settings.win_threshold);
                    results.push(result);
                    if forced {
                        break;
                    }
                }
                results
            };

            let mut winner = None;
            for (index, result) in results.iter().enumerate() {
                match result {
                    Some((score, worker_stats)) => {
                        stats.merge(worker_stats);
                        depth_reached = depth;
                        let best = best_scores[index].map_or(*score, |best| best.max(*score));
                        best_scores[index] = Some(best);
                        if winner.is_none() && *score >= settings.win_threshold {
                            winner = Some(index);
                        }
                    }
                    None => timed_out = true,
                }
            }

            debug!(
                "Depth {} done: {} nodes, {} cutoffs so far",
                depth, stats.nodes, stats.cutoffs
            );

            if let Some(index) = winner {
                let cell = candidates[index];
                let score = best_scores[index].unwrap_or(settings.win_threshold);
                if let Some(progress) = progress {
                    progress.publish(&self.grid, cell, score);
                }
                let mut ranked = rank(candidates, &best_scores);
                if let Some(position) = ranked.iter().position(|entry| entry.cell == cell) {
                    let entry = ranked.remove(position);
                    ranked.insert(0, entry);
                }
                return Selection {
                    cell,
                    score: Some(score),
                    kind: SelectionKind::Search,
                    depth,
                    timed_out: false,
                    ranked,
                    stats,
                };
            }

            if let (Some(progress), Some(best)) = (progress, rank(candidates, &best_scores).first()) {
                if let Some(score) = best.score {
                    progress.publish(&self.grid, best.cell, score);
                }
            }

            if timed_out {
                break;
            }
            depth = depth.saturating_add(settings.depth_step);
        }

        let ranked = rank(candidates, &best_scores);
        match ranked.first().copied() {
            Some(RankedCandidate {
                cell,
                score: Some(score),
            }) => Selection {
                cell,
                score: Some(score),
                kind: SelectionKind::Search,
                depth: depth_reached,
                timed_out,
                ranked,
                stats,
            },
            _ => Selection {
                cell: candidates[0],
                score: None,
                kind: SelectionKind::Fallback,
                depth: 0,
                timed_out: true,
                ranked: candidates
                    .iter()
                    .map(|&cell| RankedCandidate { cell, score: None })
                    .collect(),
                stats,
            },
        }
    }
}

/// Highest score first; ties keep candidate order; unscored last
fn rank(candidates: &[Cell], scores: &[Option<i32>]) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .zip(scores)
        .map(|(&cell, &score)| RankedCandidate { cell, score })
        .collect();
    // Option<i32> orders None below Some, so reverse comparison puts unscored last
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> MoveSelector {
        MoveSelector::new(HexGrid::reference(), SelectorSettings::default())
    }

    #[test]
    fn test_two_ring_candidates_start_with_first_step() {
        let selector = selector();
        let candidates = selector.candidates(Cell::new(2, 5), ObstacleSet::empty(), Some(Cell::new(3, 5)));
        assert_eq!(candidates.len(), 18);
        assert_eq!(candidates[0], Cell::new(3, 5));
        assert!(!candidates.contains(&Cell::new(2, 5)));
    }

    #[test]
    fn test_first_step_moves_to_front_keeping_the_rest_in_order() {
        let selector = selector();
        let candidates = selector.candidates(Cell::new(2, 5), ObstacleSet::empty(), Some(Cell::new(1, 5)));
        assert_eq!(
            &candidates[..6],
            &[
                Cell::new(1, 5),
                Cell::new(3, 5),
                Cell::new(3, 4),
                Cell::new(2, 4),
                Cell::new(2, 6),
                Cell::new(3, 6),
            ]
        );
    }

    #[test]
    fn test_neighbor_scope_limits_candidates() {
        let grid = HexGrid::reference();
        let mut settings = SelectorSettings::default();
        settings.scope = CandidateScope::Neighbors;
        let selector = MoveSelector::new(grid, settings);
        let candidates = selector.candidates(Cell::new(2, 5), ObstacleSet::empty(), None);
        assert_eq!(candidates.len(), 6);
    }

    #[test]
    fn test_full_board_scope_lists_every_free_cell() {
        let grid = HexGrid::reference();
        let mut settings = SelectorSettings::default();
        settings.scope = CandidateScope::FullBoard;
        let selector = MoveSelector::new(grid, settings);
        let walls = ObstacleSet::empty().with(&grid, Cell::new(0, 0));
        let candidates = selector.candidates(Cell::new(2, 5), walls, None);
        assert_eq!(candidates.len(), 53);
    }

    #[test]
    fn test_rank_is_stable_and_puts_unscored_last() {
        let cells = [Cell::new(1, 1), Cell::new(2, 2), Cell::new(3, 3), Cell::new(1, 2)];
        let scores = [Some(2), None, Some(5), Some(5)];
        let ranked = rank(&cells, &scores);
        let order: Vec<Cell> = ranked.iter().map(|entry| entry.cell).collect();
        assert_eq!(
            order,
            vec![Cell::new(3, 3), Cell::new(1, 2), Cell::new(1, 1), Cell::new(2, 2)]
        );
    }

    #[test]
    fn test_zero_budget_falls_back_to_first_step() {
        let grid = HexGrid::reference();
        let settings = SelectorSettings::default().with_time_budget(Duration::from_millis(0));
        let selector = MoveSelector::new(grid, settings);

        let decision = selector.select_move(Cell::new(2, 5), &[]).unwrap();
        let selection = decision.selection().unwrap();
        assert_eq!(selection.kind, SelectionKind::Fallback);
        assert_eq!(selection.cell, Cell::new(3, 5));
        assert!(selection.timed_out);
        assert_eq!(selection.score, None);
    }

    #[test]
    fn test_progress_is_marked_complete() {
        let selector = selector();
        let progress = SearchProgress::new();
        let decision = selector
            .select_move_with_progress(Cell::new(2, 5), &[], &progress)
            .unwrap();
        assert!(progress.is_complete());
        assert_eq!(progress.best(selector.grid()).map(|(cell, _)| cell), decision.cell());
    }
}
