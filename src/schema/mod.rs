//! Schema module - Configuration types for the player.

mod config;

pub use config::*;
