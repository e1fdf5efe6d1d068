// Block-the-pig API types
// Wire format shared with the browser front end: cells are {q, r} objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid cell as (column, row)
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub q: i32,
    pub r: i32,
}

impl Cell {
    pub const fn new(q: i32, r: i32) -> Self {
        Cell { q, r }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Game phase reported by the front end
///
/// During the opening the pig stays put while walls go down. The engine is
/// phase-agnostic; the flag is only echoed into the thoughts.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Opening,
    Main,
}

impl Default for GamePhase {
    fn default() -> Self {
        GamePhase::Main
    }
}

/// Why no cell was returned
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoMoveReason {
    /// The pig has no path to the edge; the blocker already won
    AlreadyTrapped,
    /// The pig stands on an edge cell; the blocker already lost
    AlreadyEscaped,
    /// Nothing around the pig can be blocked
    NoLegalCells,
}

impl NoMoveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoMoveReason::AlreadyTrapped => "ALREADY_TRAPPED",
            NoMoveReason::AlreadyEscaped => "ALREADY_ESCAPED",
            NoMoveReason::NoLegalCells => "NO_LEGAL_CELLS",
        }
    }
}

/// How the selector arrived at its cell
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionKind {
    /// Placing the wall cuts the pig off immediately
    ImmediateTrap,
    /// Chosen by iterative-deepening minimax
    Search,
    /// Deadline hit before any candidate was scored
    Fallback,
}

/// Body of POST /api/move
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MoveRequest {
    pub pig_pos: Cell,
    #[serde(default)]
    pub walls: Vec<Cell>,
    #[serde(default)]
    pub phase: GamePhase,
}

/// Outcome of one verifier consultation, echoed back to the caller
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifierReport {
    pub verifier: String,
    pub candidate: Cell,
    pub accepted: bool,
    /// False when acceptance was defaulted because the verifier failed or timed out
    pub conclusive: bool,
    pub justification: String,
}

/// Response of POST /api/move
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MoveResponse {
    #[serde(rename = "move")]
    pub chosen: Option<Cell>,
    pub reason: Option<NoMoveReason>,
    pub score: Option<i32>,
    pub depth: u32,
    pub kind: Option<SelectionKind>,
    pub timed_out: bool,
    pub thoughts: Vec<String>,
    pub verifier: Vec<VerifierReport>,
}
