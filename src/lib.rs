//! Snake Duel - two self-driving snakes on a wrapping grid
//!
//! This library provides:
//! - Core simulation (game module)
//! - Sound cues derived from game events (audio module)
//! - TUI rendering (render module)
//! - Keyboard controls (input module)
//! - Match statistics (metrics module)
//! - Execution modes (watch, headless)

pub mod audio;
pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
