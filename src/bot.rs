// Request-level orchestration of the block-the-pig engine
//
// The selector is CPU-bound and synchronous, so each request runs it on a
// blocking thread while the async side polls a shared progress record. If the
// response budget lapses first, the best cell published so far is returned.
// The optional verifier gate runs after the search, on the ranked candidates.

use log::{error, info, warn};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cellset::ObstacleSet;
use crate::config::Config;
use crate::error::EngineError;
use crate::grid::HexGrid;
use crate::reachability::{escape_path, shortest_escape, EscapeRoute};
use crate::search::{SearchStats, WIN_BASE};
use crate::selector::{MoveDecision, MoveSelector, RankedCandidate, SearchProgress, Selection};
use crate::types::{Cell, GamePhase, MoveRequest, MoveResponse, NoMoveReason, SelectionKind};
use crate::verifier::VerifierGate;

/// Engine front-end shared by the HTTP handlers
pub struct Bot {
    config: Config,
    selector: MoveSelector,
    gate: Option<VerifierGate>,
}

impl Bot {
    /// Builds selector, cache and (if enabled) verifier from `config`
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let selector = MoveSelector::from_config(&config)?;
        let gate = VerifierGate::from_config(&config.verifier, *selector.grid());
        Ok(Bot {
            config,
            selector,
            gate,
        })
    }

    /// Replaces the configured verifier
    #[must_use]
    pub fn with_verifier(mut self, gate: VerifierGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn selector(&self) -> &MoveSelector {
        &self.selector
    }

    /// Engine metadata, served on GET /
    pub fn info(&self) -> Value {
        info!("INFO");

        let bounds = self.selector.grid().bounds();
        json!({
            "apiversion": "1",
            "engine": "block-the-pig",
            "version": env!("CARGO_PKG_VERSION"),
            "grid": {
                "col_min": bounds.col_min,
                "col_max": bounds.col_max,
                "row_min": bounds.row_min,
                "row_max": bounds.row_max,
            },
            "max_depth": self.config.search.max_depth,
            "verifier": self.gate.as_ref().map(|gate| gate.name().to_string()),
        })
    }

    /// Computes the wall for one request within the response budget
    pub async fn get_move(&self, request: &MoveRequest) -> Result<MoveResponse, EngineError> {
        let start_time = Instant::now();
        let grid = *self.selector.grid();
        let pig = request.pig_pos;

        info!(
            "Move request: pig at {}, {} walls, phase {:?}",
            pig,
            request.walls.len(),
            request.phase
        );

        let obstacles = self.selector.validate(pig, &request.walls)?;
        let route = shortest_escape(&grid, pig, obstacles);

        let mut thoughts = vec![format!(
            "Analyzing board: pig at {}, {} walls",
            pig,
            obstacles.len()
        )];
        if request.phase == GamePhase::Opening {
            thoughts.push("Opening phase: the pig holds still this turn".to_string());
        }
        thoughts.push(format!("Pig's escape distance: {}", route.distance));
        if let Some(path) = escape_path(&grid, pig, obstacles) {
            if path.len() > 1 {
                let steps: Vec<String> = path.iter().map(|cell| cell.to_string()).collect();
                thoughts.push(format!("Shortest escape path: {}", steps.join(" -> ")));
            }
        }

        let progress = Arc::new(SearchProgress::new());
        let progress_clone = progress.clone();
        let selector = self.selector.clone();

        let handle = tokio::task::spawn_blocking(move || selector.decide(pig, obstacles, Some(&progress_clone)));

        let effective_budget = self.config.timing.effective_budget_ms();
        let polling_interval = Duration::from_millis(self.config.timing.polling_interval_ms.max(1));

        loop {
            if handle.is_finished() {
                break;
            }
            if start_time.elapsed().as_millis() as u64 >= effective_budget {
                break;
            }
            tokio::time::sleep(polling_interval).await;
        }

        let decision = if handle.is_finished() {
            match handle.await {
                Ok(decision) => decision,
                Err(e) => {
                    error!("Search task failed: {}", e);
                    anytime_decision(&grid, &progress, &route, obstacles)
                }
            }
        } else {
            warn!(
                "Search still running after {}ms, answering with best so far",
                start_time.elapsed().as_millis()
            );
            anytime_decision(&grid, &progress, &route, obstacles)
        };

        let response = match decision {
            MoveDecision::NoMove(reason) => {
                thoughts.push(no_move_thought(reason));
                MoveResponse {
                    chosen: None,
                    reason: Some(reason),
                    score: None,
                    depth: 0,
                    kind: None,
                    timed_out: false,
                    thoughts,
                    verifier: Vec::new(),
                }
            }
            MoveDecision::Block(selection) => {
                self.respond_with_selection(request, selection, thoughts).await
            }
        };

        info!(
            "Pig at {}: chose {} (score: {:?}, depth: {}, time: {}ms)",
            pig,
            response
                .chosen
                .map_or_else(|| "nothing".to_string(), |cell| cell.to_string()),
            response.score,
            response.depth,
            start_time.elapsed().as_millis()
        );

        Ok(response)
    }

    async fn respond_with_selection(
        &self,
        request: &MoveRequest,
        selection: Selection,
        mut thoughts: Vec<String>,
    ) -> MoveResponse {
        thoughts.push(format!("Considering {} candidate cells", selection.ranked.len()));
        thoughts.extend(selection_thoughts(&selection, self.config.search.win_threshold));

        let mut chosen = selection.cell;
        let mut reports = Vec::new();

        if let Some(gate) = &self.gate {
            let ranked: Vec<Cell> = selection.ranked.iter().map(|entry| entry.cell).collect();
            if let Some(outcome) = gate.review(request.pig_pos, &request.walls, &ranked).await {
                for report in &outcome.reports {
                    thoughts.push(format!(
                        "Verifier {} {} {}: {}",
                        report.verifier,
                        if report.accepted { "accepted" } else { "rejected" },
                        report.candidate,
                        report.justification
                    ));
                }
                if outcome.all_rejected {
                    thoughts.push(format!("Every checked cell was rejected, keeping {}", selection.cell));
                } else if outcome.chosen != selection.cell {
                    thoughts.push(format!("Switching to {} on the verifier's advice", outcome.chosen));
                }
                chosen = outcome.chosen;
                reports = outcome.reports;
            }
        }

        thoughts.push(format!("Decision: block {}", chosen));

        let score = selection
            .ranked
            .iter()
            .find(|entry| entry.cell == chosen)
            .and_then(|entry| entry.score)
            .or(if chosen == selection.cell { selection.score } else { None });

        MoveResponse {
            chosen: Some(chosen),
            reason: None,
            score,
            depth: selection.depth,
            kind: Some(selection.kind),
            timed_out: selection.timed_out,
            thoughts,
            verifier: reports,
        }
    }
}

/// Decision built from whatever the search published before the budget lapsed
fn anytime_decision(
    grid: &HexGrid,
    progress: &SearchProgress,
    route: &EscapeRoute,
    obstacles: ObstacleSet,
) -> MoveDecision {
    if let Some((cell, score)) = progress.best(grid) {
        return MoveDecision::Block(Selection {
            cell,
            score: Some(score),
            kind: SelectionKind::Search,
            depth: progress.current_depth(),
            timed_out: true,
            ranked: vec![RankedCandidate {
                cell,
                score: Some(score),
            }],
            stats: SearchStats::default(),
        });
    }

    match route.first_step {
        Some(cell) if !obstacles.contains(grid, cell) => MoveDecision::Block(Selection {
            cell,
            score: None,
            kind: SelectionKind::Fallback,
            depth: 0,
            timed_out: true,
            ranked: vec![RankedCandidate { cell, score: None }],
            stats: SearchStats::default(),
        }),
        _ if route.distance.steps() == Some(0) => MoveDecision::NoMove(NoMoveReason::AlreadyEscaped),
        _ => MoveDecision::NoMove(NoMoveReason::AlreadyTrapped),
    }
}

fn selection_thoughts(selection: &Selection, win_threshold: i32) -> Vec<String> {
    let mut thoughts = Vec::new();
    match selection.kind {
        SelectionKind::ImmediateTrap => {
            thoughts.push(format!("Found winning move at {}: traps the pig!", selection.cell));
        }
        SelectionKind::Search => {
            thoughts.push(format!("Searched to depth {}", selection.depth));
            if let Some(score) = selection.score {
                if score >= win_threshold {
                    thoughts.push(format!(
                        "Forced trap found: pig is caught within {} plies",
                        WIN_BASE - score
                    ));
                } else if score < 0 {
                    thoughts.push("Pig escapes against best play; delaying it as long as possible".to_string());
                } else {
                    thoughts.push(format!("Best line keeps the pig {} steps from the edge", score));
                }
            }
        }
        SelectionKind::Fallback => {
            thoughts.push(format!(
                "Out of time before any cell was scored, blocking the pig's next step {}",
                selection.cell
            ));
        }
    }
    if selection.timed_out && selection.kind != SelectionKind::Fallback {
        thoughts.push("Search stopped at the time limit".to_string());
    }
    thoughts
}

fn no_move_thought(reason: NoMoveReason) -> String {
    match reason {
        NoMoveReason::AlreadyEscaped => "Pig is already on the edge; nothing left to block".to_string(),
        NoMoveReason::NoLegalCells => "Pig is boxed in on every side; no wall needed".to_string(),
        NoMoveReason::AlreadyTrapped => "Pig is already cut off from every edge cell".to_string(),
    }
}
