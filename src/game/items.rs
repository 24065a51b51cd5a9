//! Food and power-up placement
//!
//! Free cells are found by rejection sampling with a bounded number of
//! attempts. When the grid is too crowded to find one, the spawn is skipped
//! and reported as a [`GameEvent::SpawnSkipped`] instead of looping forever.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::PowerUpConfig;
use super::grid::Grid;
use super::snapshot::{GameEvent, ItemKind};
use super::state::Position;

/// Sample random cells until one is not blocked, giving up after `attempts`
pub fn find_free_cell<R, F>(grid: &Grid, rng: &mut R, attempts: u32, is_blocked: F) -> Option<Position>
where
    R: Rng + ?Sized,
    F: Fn(Position) -> bool,
{
    (0..attempts)
        .map(|_| grid.random_cell(rng))
        .find(|&pos| !is_blocked(pos))
}

/// Food items on the grid, kept between a minimum and maximum count
#[derive(Debug, Clone, PartialEq)]
pub struct FoodField {
    positions: Vec<Position>,
    min: usize,
    max: usize,
}

impl FoodField {
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            positions: Vec::with_capacity(max),
            min,
            max: max.max(min),
        }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions.contains(&pos)
    }

    /// Place food directly, ignoring the count bounds (scenario setup)
    pub fn place(&mut self, pos: Position) {
        if !self.contains(pos) {
            self.positions.push(pos);
        }
    }

    /// Remove the item at `pos`. Returns whether one was there.
    pub fn remove(&mut self, pos: Position) -> bool {
        let before = self.positions.len();
        self.positions.retain(|&p| p != pos);
        self.positions.len() != before
    }

    /// Discard all food and spawn a fresh batch of uniformly random size
    /// in `[min, max]`.
    pub fn populate<R, F>(
        &mut self,
        grid: &Grid,
        rng: &mut R,
        attempts: u32,
        is_blocked: F,
        events: &mut Vec<GameEvent>,
    ) where
        R: Rng + ?Sized,
        F: Fn(Position) -> bool,
    {
        self.positions.clear();
        let target = rng.gen_range(self.min..=self.max);
        self.fill_to(target, grid, rng, attempts, &is_blocked, events);
    }

    /// Spawn replacements until the field is back at its minimum
    pub fn replenish<R, F>(
        &mut self,
        grid: &Grid,
        rng: &mut R,
        attempts: u32,
        is_blocked: F,
        events: &mut Vec<GameEvent>,
    ) where
        R: Rng + ?Sized,
        F: Fn(Position) -> bool,
    {
        self.fill_to(self.min, grid, rng, attempts, &is_blocked, events);
    }

    fn fill_to<R, F>(
        &mut self,
        target: usize,
        grid: &Grid,
        rng: &mut R,
        attempts: u32,
        is_blocked: &F,
        events: &mut Vec<GameEvent>,
    ) where
        R: Rng + ?Sized,
        F: Fn(Position) -> bool,
    {
        while self.positions.len() < target {
            let free = find_free_cell(grid, rng, attempts, |pos| {
                is_blocked(pos) || self.positions.contains(&pos)
            });

            match free {
                Some(pos) => {
                    self.positions.push(pos);
                    events.push(GameEvent::FoodSpawned { at: pos });
                }
                None => {
                    warn!(attempts, "no free cell for food, skipping spawn");
                    events.push(GameEvent::SpawnSkipped {
                        item: ItemKind::Food,
                    });
                    break;
                }
            }
        }
    }
}

/// The kinds of power-up that can appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    SpeedBoost,
    GrowthBoost,
    Invincibility,
    DoublePoints,
    SlowOpponent,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::GrowthBoost,
        PowerUpKind::Invincibility,
        PowerUpKind::DoublePoints,
        PowerUpKind::SlowOpponent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PowerUpKind::SpeedBoost => "speed boost",
            PowerUpKind::GrowthBoost => "growth boost",
            PowerUpKind::Invincibility => "invincibility",
            PowerUpKind::DoublePoints => "double points",
            PowerUpKind::SlowOpponent => "slow opponent",
        }
    }
}

/// A power-up lying on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUp {
    pub position: Position,
    pub kind: PowerUpKind,
    /// Ticks until it vanishes unclaimed
    pub remaining_lifetime: u32,
    /// Ticks the effect lasts once collected
    pub effect_duration: u32,
}

/// Timer-driven spawning and expiry of power-ups
#[derive(Debug, Clone, PartialEq)]
pub struct PowerUpManager {
    settings: Option<PowerUpConfig>,
    active: Vec<PowerUp>,
    spawn_timer: u32,
}

impl PowerUpManager {
    /// `None` disables power-ups entirely
    pub fn new(settings: Option<PowerUpConfig>) -> Self {
        Self {
            settings,
            active: Vec::new(),
            spawn_timer: 0,
        }
    }

    pub fn active(&self) -> &[PowerUp] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.active.iter().any(|p| p.position == pos)
    }

    /// Place a power-up directly (scenario setup)
    pub fn place(&mut self, power_up: PowerUp) {
        self.active.push(power_up);
    }

    /// Advance one tick: age every power-up, drop the expired ones, and spawn
    /// a new one when the interval has elapsed and there is room.
    pub fn advance<R, F>(
        &mut self,
        grid: &Grid,
        rng: &mut R,
        attempts: u32,
        is_blocked: F,
        events: &mut Vec<GameEvent>,
    ) where
        R: Rng + ?Sized,
        F: Fn(Position) -> bool,
    {
        let Some(settings) = self.settings else {
            return;
        };

        self.spawn_timer += 1;

        for power_up in self.active.iter_mut() {
            power_up.remaining_lifetime = power_up.remaining_lifetime.saturating_sub(1);
        }
        self.active.retain(|p| {
            if p.remaining_lifetime == 0 {
                debug!(kind = p.kind.label(), x = p.position.x, y = p.position.y, "power-up expired");
                events.push(GameEvent::PowerUpExpired {
                    kind: p.kind,
                    at: p.position,
                });
                false
            } else {
                true
            }
        });

        if self.spawn_timer < settings.spawn_interval || self.active.len() >= settings.max_active {
            return;
        }

        let free = find_free_cell(grid, rng, attempts, |pos| {
            is_blocked(pos) || self.contains(pos)
        });

        match free {
            Some(position) => {
                let kind = *PowerUpKind::ALL
                    .choose(rng)
                    .unwrap_or(&PowerUpKind::SpeedBoost);
                self.active.push(PowerUp {
                    position,
                    kind,
                    remaining_lifetime: settings.lifetime,
                    effect_duration: settings.effect_duration,
                });
                self.spawn_timer = 0;
                events.push(GameEvent::PowerUpSpawned { kind, at: position });
            }
            None => {
                // Timer stays armed so the spawn is retried next tick
                warn!(attempts, "no free cell for power-up, skipping spawn");
                events.push(GameEvent::SpawnSkipped {
                    item: ItemKind::PowerUp,
                });
            }
        }
    }

    /// Remove and return the power-up at `pos`, if any
    pub fn take_at(&mut self, pos: Position) -> Option<PowerUp> {
        let index = self.active.iter().position(|p| p.position == pos)?;
        Some(self.active.remove(index))
    }
}
