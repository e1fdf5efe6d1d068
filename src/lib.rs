// Library exports for the block-the-pig move engine
// The HTTP server and the simulate tool both drive the engine through these modules

pub mod bot;
pub mod cache;
pub mod cellset;
pub mod config;
pub mod error;
pub mod game;
pub mod grid;
pub mod reachability;
pub mod search;
pub mod selector;
pub mod types;
pub mod verifier;
