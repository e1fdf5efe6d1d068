// Configuration module for reading Pig.toml
// Every tuning constant of the engine lives here; nothing in the search is hard-coded

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::cellset::MAX_CELLS;
use crate::error::ConfigError;
use crate::grid::GridBounds;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub grid: GridBounds,
    pub timing: TimingConfig,
    pub search: SearchConfig,
    pub candidates: CandidateConfig,
    pub cache: CacheConfig,
    pub verifier: VerifierConfig,
    pub game: GameConfig,
}

/// Timing and response budget
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
    pub polling_interval_ms: u64,
    /// Search stops starting new work once less than this remains
    pub min_time_remaining_ms: u64,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }

    /// Budget handed to the selector itself
    pub fn search_budget_ms(&self) -> u64 {
        self.effective_budget_ms()
            .saturating_sub(self.min_time_remaining_ms)
    }
}

/// Iterative deepening parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SearchConfig {
    pub initial_depth: u32,
    /// Plies added per iteration; 2 keeps every iteration ending on a full blocker/pig pair
    pub depth_step: u32,
    pub max_depth: u32,
    /// Scores at or above this are a forced trap; the search stops there
    pub win_threshold: i32,
    pub parallel: bool,
    pub min_candidates_for_parallel: usize,
}

/// Which cells are considered at the root
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateScope {
    /// Free cells next to the pig
    Neighbors,
    /// Neighbours plus neighbours-of-neighbours
    TwoRing,
    /// Every free cell on the board
    FullBoard,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CandidateConfig {
    pub scope: CandidateScope,
}

/// Memo of previous decisions
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

/// Built-in verifier implementations
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerifierKind {
    EscapeCheck,
}

/// Advisory move verification
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct VerifierConfig {
    pub enabled: bool,
    pub kind: VerifierKind,
    pub timeout_ms: u64,
    /// How many ranked candidates may be offered before keeping the top one
    pub max_candidates: usize,
}

/// Game loop rules used by the simulator
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GameConfig {
    /// Walls placed before the pig starts moving
    pub opening_walls: u32,
    pub min_initial_walls: usize,
    pub max_initial_walls: usize,
    pub max_turns: u32,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Pig.toml configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Pig.toml in the project root
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_file("Pig.toml")
    }

    /// Rejects settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let width = self.grid.width();
        let height = self.grid.height();
        if width <= 0 || height <= 0 {
            return Err(ConfigError::Invalid("grid bounds are empty".to_string()));
        }
        if (width as usize) * (height as usize) > MAX_CELLS {
            return Err(ConfigError::Invalid(format!(
                "grid has {} cells, at most {} are supported",
                width * height,
                MAX_CELLS
            )));
        }
        if self.search.initial_depth == 0 {
            return Err(ConfigError::Invalid("search.initial_depth must be positive".to_string()));
        }
        if self.search.depth_step == 0 {
            return Err(ConfigError::Invalid("search.depth_step must be positive".to_string()));
        }
        if self.search.initial_depth > self.search.max_depth {
            return Err(ConfigError::Invalid(format!(
                "search.initial_depth ({}) exceeds search.max_depth ({})",
                self.search.initial_depth, self.search.max_depth
            )));
        }
        if self.game.min_initial_walls > self.game.max_initial_walls {
            return Err(ConfigError::Invalid(
                "game.min_initial_walls exceeds game.max_initial_walls".to_string(),
            ));
        }
        if self.timing.polling_interval_ms == 0 {
            return Err(ConfigError::Invalid("timing.polling_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Pig.toml
    pub fn default_hardcoded() -> Self {
        Config {
            grid: GridBounds::REFERENCE,
            timing: TimingConfig {
                response_time_budget_ms: 2000,
                network_overhead_ms: 100,
                polling_interval_ms: 10,
                min_time_remaining_ms: 50,
            },
            search: SearchConfig {
                initial_depth: 2,
                depth_step: 2,
                max_depth: 16,
                win_threshold: 900,
                parallel: true,
                min_candidates_for_parallel: 4,
            },
            candidates: CandidateConfig {
                scope: CandidateScope::TwoRing,
            },
            cache: CacheConfig {
                enabled: true,
                capacity: 4096,
            },
            verifier: VerifierConfig {
                enabled: false,
                kind: VerifierKind::EscapeCheck,
                timeout_ms: 200,
                max_candidates: 3,
            },
            game: GameConfig {
                opening_walls: 3,
                min_initial_walls: 5,
                max_initial_walls: 15,
                max_turns: 50,
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Pig.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
