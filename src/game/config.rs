use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::controller::{ControllerSettings, Personality};
use super::error::ConfigError;
use super::grid::Grid;
use super::state::Position;

/// Largest grid accepted, in cells. Every cell is drawn each frame.
pub const MAX_GRID_CELLS: usize = 1 << 20;

/// The two preset rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// One food item, no power-ups, plain controllers
    Basic,
    /// Several food items, power-ups, personality-driven controllers
    Enhanced,
}

/// Where invincibility is spent each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvincibilityDecay {
    /// The self-collision check spends one tick; the rival check never does
    OnSelfCheck,
    /// Collision checks are side-effect free and invincibility counts down
    /// with the other effects at the end of the tick
    Uniform,
}

/// Configuration for one snake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorConfig {
    pub name: String,
    #[serde(default)]
    pub personality: Option<Personality>,
    /// Starting cell; spread evenly along the middle row when absent
    #[serde(default)]
    pub start: Option<Position>,
}

impl ActorConfig {
    pub fn new(name: impl Into<String>, personality: Option<Personality>) -> Self {
        Self {
            name: name.into(),
            personality,
            start: None,
        }
    }
}

/// Power-up spawning and effect parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpConfig {
    /// Ticks between spawns
    pub spawn_interval: u32,
    /// Most power-ups on the grid at once
    pub max_active: usize,
    /// Ticks an uncollected power-up stays on the grid
    pub lifetime: u32,
    /// Ticks a collected effect lasts
    pub effect_duration: u32,
    /// Segments added by a growth boost
    pub growth_amount: u32,
    /// Cells moved per tick under a speed boost
    pub speed_multiplier: i32,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 300,
            max_active: 2,
            lifetime: 600,
            effect_duration: 100,
            growth_amount: 3,
            speed_multiplier: 2,
        }
    }
}

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,
    /// Simulated milliseconds per tick
    pub tick_interval_ms: u64,

    /// Food count kept on the grid
    pub food_min: usize,
    pub food_max: usize,

    /// Minimum simulated time between heading changes
    pub heading_cooldown_ms: u64,
    /// Distance penalty for turning
    pub turn_penalty: f32,

    /// `None` disables power-ups
    pub power_ups: Option<PowerUpConfig>,

    /// Snakes in update order
    pub actors: Vec<ActorConfig>,

    /// Random cells tried before a spawn is skipped
    pub max_spawn_attempts: u32,
    pub invincibility_decay: InvincibilityDecay,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::basic()
    }
}

impl GameConfig {
    /// The plain duel: one food item, no power-ups
    pub fn basic() -> Self {
        Self {
            grid_width: 40,
            grid_height: 30,
            tick_interval_ms: 100,
            food_min: 1,
            food_max: 1,
            heading_cooldown_ms: 200,
            turn_penalty: 0.5,
            power_ups: None,
            actors: vec![ActorConfig::new("Red", None), ActorConfig::new("Blue", None)],
            max_spawn_attempts: 1000,
            invincibility_decay: InvincibilityDecay::OnSelfCheck,
            seed: None,
        }
    }

    /// Power-ups, several food items and personalities
    pub fn enhanced() -> Self {
        Self {
            grid_width: 50,
            grid_height: 35,
            tick_interval_ms: 83,
            food_min: 2,
            food_max: 3,
            heading_cooldown_ms: 150,
            turn_penalty: 0.3,
            power_ups: Some(PowerUpConfig::default()),
            actors: vec![
                ActorConfig::new("Aggressive Red", Some(Personality::Aggressive)),
                ActorConfig::new("Defensive Blue", Some(Personality::Defensive)),
            ],
            ..Self::basic()
        }
    }

    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Basic => Self::basic(),
            Variant::Enhanced => Self::enhanced(),
        }
    }

    /// Same rules on a different grid
    pub fn with_grid(mut self, width: usize, height: usize) -> Self {
        self.grid_width = width;
        self.grid_height = height;
        self
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::basic().with_grid(10, 10)
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.grid_width, self.grid_height)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            cooldown_ms: self.heading_cooldown_ms,
            turn_penalty: self.turn_penalty,
            ..ControllerSettings::default()
        }
    }

    /// Cells moved per tick under a speed boost (1 when power-ups are off)
    pub fn speed_multiplier(&self) -> i32 {
        self.power_ups.map_or(1, |p| p.speed_multiplier)
    }

    /// Starting cell for the actor at `index`: its configured start, or an
    /// even spread along the middle row
    pub fn start_position(&self, index: usize) -> Position {
        if let Some(start) = self.actors.get(index).and_then(|a| a.start) {
            return start;
        }
        let n = self.actors.len().max(1);
        let x = (2 * index + 1) * self.grid_width / (2 * n);
        Position::new(x as i32, (self.grid_height / 2) as i32)
    }

    /// Load a JSON file whose fields override `base`
    pub fn from_file(path: &Path, base: &GameConfig) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents, base)
    }

    /// Parse a JSON document whose fields override `base`, then validate
    pub fn parse(json: &str, base: &GameConfig) -> Result<Self, ConfigError> {
        let overrides: Value = serde_json::from_str(json)?;
        let mut merged = serde_json::to_value(base)?;
        merge(&mut merged, overrides);

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }

        // Positions are i32, so each side must fit one
        if i32::try_from(self.grid_width).is_err() || i32::try_from(self.grid_height).is_err() {
            return Err(ConfigError::Invalid(format!(
                "grid sides must not exceed {}, got {}x{}",
                i32::MAX,
                self.grid_width,
                self.grid_height
            )));
        }

        match self.grid_width.checked_mul(self.grid_height) {
            Some(cells) if cells <= MAX_GRID_CELLS => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "grid {}x{} exceeds the limit of {} cells",
                    self.grid_width, self.grid_height, MAX_GRID_CELLS
                )));
            }
        }

        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be at least 1".to_string(),
            ));
        }

        if self.food_min == 0 {
            return Err(ConfigError::Invalid("food_min must be at least 1".to_string()));
        }

        if self.food_min > self.food_max {
            return Err(ConfigError::Invalid(format!(
                "food_min ({}) cannot exceed food_max ({})",
                self.food_min, self.food_max
            )));
        }

        if self.actors.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "at least 2 actors are required, got {}",
                self.actors.len()
            )));
        }

        let cells = self.grid_width * self.grid_height;
        if self.actors.len() + self.food_max > cells {
            return Err(ConfigError::Invalid(format!(
                "{} actors and {} food items do not fit on {} cells",
                self.actors.len(),
                self.food_max,
                cells
            )));
        }

        let grid = self.grid();
        let starts: Vec<Position> = (0..self.actors.len()).map(|i| self.start_position(i)).collect();
        for (i, start) in starts.iter().enumerate() {
            if !grid.contains(*start) {
                return Err(ConfigError::Invalid(format!(
                    "start cell ({}, {}) of actor '{}' is outside the grid",
                    start.x, start.y, self.actors[i].name
                )));
            }
            if starts[..i].contains(start) {
                return Err(ConfigError::Invalid(format!(
                    "actor '{}' shares its start cell ({}, {})",
                    self.actors[i].name, start.x, start.y
                )));
            }
        }

        if self.max_spawn_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_spawn_attempts must be at least 1".to_string(),
            ));
        }

        if self.turn_penalty.is_nan() || self.turn_penalty < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "turn_penalty must be non-negative, got {}",
                self.turn_penalty
            )));
        }

        if let Some(power_ups) = &self.power_ups {
            if power_ups.spawn_interval == 0 {
                return Err(ConfigError::Invalid(
                    "power_ups.spawn_interval must be at least 1".to_string(),
                ));
            }
            if power_ups.max_active == 0 {
                return Err(ConfigError::Invalid(
                    "power_ups.max_active must be at least 1".to_string(),
                ));
            }
            if power_ups.speed_multiplier < 2 {
                return Err(ConfigError::Invalid(format!(
                    "power_ups.speed_multiplier must be at least 2, got {}",
                    power_ups.speed_multiplier
                )));
            }
        }

        Ok(())
    }
}

/// Overlay `overrides` onto `base`, recursing into objects
fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
