// Advisory move verification
//
// A verifier may veto a proposed wall, but it can never stop a move from being
// produced: failures, panics and timeouts all count as acceptance. When a
// verifier rejects, the gate offers the next-ranked cell; if everything offered
// is rejected the selector's top choice stands.

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cellset::CellSet;
use crate::config::{VerifierConfig, VerifierKind};
use crate::grid::HexGrid;
use crate::reachability::{shortest_escape, EscapeDistance};
use crate::types::{Cell, VerifierReport};

/// What a verifier is asked to judge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub evader: Cell,
    pub walls: Vec<Cell>,
    pub candidate: Cell,
}

/// A conclusive answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub justification: String,
}

impl Verdict {
    pub fn accept(justification: impl Into<String>) -> Self {
        Verdict {
            accepted: true,
            justification: justification.into(),
        }
    }

    pub fn reject(justification: impl Into<String>) -> Self {
        Verdict {
            accepted: false,
            justification: justification.into(),
        }
    }
}

/// Reasons a verifier could not answer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierError {
    #[error("verifier unavailable: {0}")]
    Unavailable(String),

    #[error("verifier result indeterminate: {0}")]
    Indeterminate(String),
}

/// Pluggable check on a proposed wall. Runs on a blocking thread.
pub trait MoveVerifier: Send + Sync {
    fn name(&self) -> &str;

    fn verify(&self, request: &VerificationRequest) -> Result<Verdict, VerifierError>;
}

/// In-process verifier: rejects a wall after which the pig's greedy step lands on the edge
#[derive(Debug, Clone)]
pub struct EscapeCheckVerifier {
    grid: HexGrid,
}

impl EscapeCheckVerifier {
    pub fn new(grid: HexGrid) -> Self {
        EscapeCheckVerifier { grid }
    }
}

impl MoveVerifier for EscapeCheckVerifier {
    fn name(&self) -> &str {
        "escape-check"
    }

    fn verify(&self, request: &VerificationRequest) -> Result<Verdict, VerifierError> {
        let grid = &self.grid;
        let walls = CellSet::from_cells(grid, &request.walls)
            .map_err(|e| VerifierError::Indeterminate(e.to_string()))?;

        let candidate = request.candidate;
        if !grid.is_valid(candidate) || walls.contains(grid, candidate) || candidate == request.evader {
            return Ok(Verdict::reject(format!("{} cannot hold a wall", candidate)));
        }

        let route = shortest_escape(grid, request.evader, walls.with(grid, candidate));
        match (route.distance, route.first_step) {
            (EscapeDistance::Trapped, _) => Ok(Verdict::accept(format!(
                "wall at {} leaves the pig no way out",
                candidate
            ))),
            (_, Some(step)) if grid.is_escape(step) => Ok(Verdict::reject(format!(
                "pig escapes through {} right after the wall at {}",
                step, candidate
            ))),
            (distance, _) => Ok(Verdict::accept(format!(
                "pig still needs {} steps after the wall at {}",
                distance, candidate
            ))),
        }
    }
}

/// Result of running ranked candidates past the verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub chosen: Cell,
    pub reports: Vec<VerifierReport>,
    /// True when every offered cell was rejected and the top choice was kept anyway
    pub all_rejected: bool,
}

/// Runs a verifier with a timeout and default-accept semantics
#[derive(Clone)]
pub struct VerifierGate {
    verifier: Arc<dyn MoveVerifier>,
    timeout: Duration,
    max_candidates: usize,
}

impl VerifierGate {
    pub fn new(verifier: Arc<dyn MoveVerifier>, timeout: Duration, max_candidates: usize) -> Self {
        VerifierGate {
            verifier,
            timeout,
            max_candidates: max_candidates.max(1),
        }
    }

    /// Builds the configured built-in verifier, or None when disabled
    pub fn from_config(config: &VerifierConfig, grid: HexGrid) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let verifier: Arc<dyn MoveVerifier> = match config.kind {
            VerifierKind::EscapeCheck => Arc::new(EscapeCheckVerifier::new(grid)),
        };
        Some(VerifierGate::new(
            verifier,
            Duration::from_millis(config.timeout_ms),
            config.max_candidates,
        ))
    }

    pub fn name(&self) -> &str {
        self.verifier.name()
    }

    /// Offers `ranked` cells best-first until one is accepted.
    /// Returns None only when `ranked` is empty.
    pub async fn review(&self, evader: Cell, walls: &[Cell], ranked: &[Cell]) -> Option<GateOutcome> {
        let top = *ranked.first()?;
        let mut reports = Vec::new();

        for &candidate in ranked.iter().take(self.max_candidates) {
            let report = self
                .consult(VerificationRequest {
                    evader,
                    walls: walls.to_vec(),
                    candidate,
                })
                .await;
            let accepted = report.accepted;
            reports.push(report);

            if accepted {
                return Some(GateOutcome {
                    chosen: candidate,
                    reports,
                    all_rejected: false,
                });
            }
        }

        warn!(
            "Verifier {} rejected all {} offered cells, keeping {}",
            self.name(),
            reports.len(),
            top
        );
        Some(GateOutcome {
            chosen: top,
            reports,
            all_rejected: true,
        })
    }

    async fn consult(&self, request: VerificationRequest) -> VerifierReport {
        let verifier = Arc::clone(&self.verifier);
        let name = verifier.name().to_string();
        let candidate = request.candidate;

        let task = tokio::task::spawn_blocking(move || verifier.verify(&request));

        let (accepted, conclusive, justification) = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(verdict))) => (verdict.accepted, true, verdict.justification),
            Ok(Ok(Err(e))) => {
                warn!("Verifier {} failed on {}: {}", name, candidate, e);
                (true, false, format!("{}; accepted by default", e))
            }
            Ok(Err(e)) => {
                warn!("Verifier {} crashed on {}: {}", name, candidate, e);
                (true, false, "verifier crashed; accepted by default".to_string())
            }
            Err(_) => {
                warn!(
                    "Verifier {} timed out on {} after {}ms",
                    name,
                    candidate,
                    self.timeout.as_millis()
                );
                (
                    true,
                    false,
                    format!("no answer within {}ms; accepted by default", self.timeout.as_millis()),
                )
            }
        };

        debug!("Verifier {} on {}: accepted={} ({})", name, candidate, accepted, justification);

        VerifierReport {
            verifier: name,
            candidate,
            accepted,
            conclusive,
            justification,
        }
    }
}
