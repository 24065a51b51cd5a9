//! Core simulation for the snake duel
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! Presentation and audio only ever see the [`WorldSnapshot`] produced by each tick.

pub mod action;
pub mod config;
pub mod controller;
pub mod effects;
pub mod engine;
pub mod error;
pub mod grid;
pub mod items;
pub mod snapshot;
pub mod state;

// Re-export commonly used types
pub use action::Direction;
pub use config::{ActorConfig, GameConfig, InvincibilityDecay, PowerUpConfig, Variant};
pub use controller::{ControllerSettings, ControllerView, HeuristicController, Personality};
pub use effects::{ActiveEffect, EffectKind, StatusEffects};
pub use engine::GameEngine;
pub use error::ConfigError;
pub use grid::Grid;
pub use items::{FoodField, PowerUp, PowerUpKind, PowerUpManager};
pub use snapshot::{ActorView, Body, GameEvent, ItemKind, WorldSnapshot};
pub use state::{GameState, Position, Snake};
