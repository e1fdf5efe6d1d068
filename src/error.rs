//! Error types for the engine boundary and configuration loading.
//!
//! Trapped, escaped and "nothing to block" are normal game outcomes and are
//! reported through `MoveDecision::NoMove`, not through these types.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Cell;

/// Caller-visible failures: malformed input or misuse of the game session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Pig coordinate outside the grid.
    #[error("pig position {cell} is outside the grid")]
    InvalidPosition { cell: Cell },

    /// Wall coordinate outside the grid.
    #[error("wall {cell} is outside the grid")]
    InvalidObstacle { cell: Cell },

    /// A wall was reported on the pig's own cell.
    #[error("wall {cell} overlaps the pig")]
    ObstacleOnEvader { cell: Cell },

    /// Bounds describe more cells than the bitset can index.
    #[error("grid has {cells} cells, at most {max} are supported")]
    GridTooLarge { cells: usize, max: usize },

    /// Bounds describe no cells at all.
    #[error("grid bounds are empty")]
    EmptyGrid,

    /// Wall placement on a blocked, occupied or off-grid cell.
    #[error("cannot place a wall at {cell}")]
    IllegalWall { cell: Cell },

    /// Move attempted after the game already ended.
    #[error("game is already over")]
    GameOver,
}

/// Failures while loading `Pig.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
