use std::time::{Duration, Instant};

use crate::game::GameEvent;

/// Running totals for one actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorStats {
    pub food_eaten: u32,
    pub power_ups_collected: u32,
    pub collisions: u32,
}

/// Statistics for the current match, fed from each tick's events
pub struct MatchMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    pub ticks: u64,
    pub actors: Vec<ActorStats>,
    pub food_spawned: u32,
    pub power_ups_spawned: u32,
    pub power_ups_expired: u32,
    pub spawns_skipped: u32,
    pub matches_played: u32,
}

impl MatchMetrics {
    pub fn new(actor_count: usize) -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            ticks: 0,
            actors: vec![ActorStats::default(); actor_count],
            food_spawned: 0,
            power_ups_spawned: 0,
            power_ups_expired: 0,
            spawns_skipped: 0,
            matches_played: 0,
        }
    }

    pub fn update(&mut self) {
        self.elapsed_time = self.start_time.elapsed();
    }

    /// Clear the per-match counters for a fresh world
    pub fn on_match_start(&mut self) {
        let count = self.actors.len();
        *self = Self {
            matches_played: self.matches_played + 1,
            ..Self::new(count)
        };
    }

    /// Fold one tick's events into the totals
    pub fn record(&mut self, events: &[GameEvent]) {
        self.ticks += 1;

        for event in events {
            match *event {
                GameEvent::FoodEaten { actor, .. } => {
                    if let Some(stats) = self.actors.get_mut(actor) {
                        stats.food_eaten += 1;
                    }
                }
                GameEvent::PowerUpCollected { actor, .. } => {
                    if let Some(stats) = self.actors.get_mut(actor) {
                        stats.power_ups_collected += 1;
                    }
                }
                GameEvent::Collision { actor, .. } => {
                    if let Some(stats) = self.actors.get_mut(actor) {
                        stats.collisions += 1;
                    }
                }
                GameEvent::FoodSpawned { .. } => self.food_spawned += 1,
                GameEvent::PowerUpSpawned { .. } => self.power_ups_spawned += 1,
                GameEvent::PowerUpExpired { .. } => self.power_ups_expired += 1,
                GameEvent::SpawnSkipped { .. } => self.spawns_skipped += 1,
            }
        }
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}
