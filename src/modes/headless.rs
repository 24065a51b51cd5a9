//! Run a duel without a terminal
//!
//! Steps the engine a fixed number of ticks as fast as possible, optionally
//! writing every snapshot as one JSON line, and reports the final standings.

use anyhow::{Context, Result};
use std::io::Write;
use tracing::info;

use crate::audio::AudioDispatcher;
use crate::game::{GameConfig, GameEngine, GameState, WorldSnapshot};
use crate::metrics::MatchMetrics;

/// Final standings after a headless run
#[derive(Debug, Clone)]
pub struct HeadlessSummary {
    pub ticks: u64,
    pub scores: Vec<(String, u32)>,
    pub lengths: Vec<usize>,
    /// Index of the outright leader; `None` on a tie
    pub leader: Option<usize>,
}

pub struct HeadlessMode {
    engine: GameEngine,
    state: GameState,
    metrics: MatchMetrics,
    audio: AudioDispatcher,
    ticks: u64,
}

impl HeadlessMode {
    pub fn new(config: GameConfig, ticks: u64, audio: AudioDispatcher) -> Self {
        let mut engine = GameEngine::new(config);
        let state = engine.reset();
        let metrics = MatchMetrics::new(state.snakes.len());

        Self {
            engine,
            state,
            metrics,
            audio,
            ticks,
        }
    }

    /// Run every tick, streaming snapshots to `out` when given
    pub fn run<W: Write>(&mut self, mut out: Option<W>) -> Result<HeadlessSummary> {
        self.print_header();

        let mut last = WorldSnapshot::capture(&self.state, Vec::new());
        for _ in 0..self.ticks {
            last = self.engine.step(&mut self.state);
            self.metrics.record(&last.events);
            self.audio.dispatch(&last.events);

            if let Some(out) = out.as_mut() {
                serde_json::to_writer(&mut *out, &last)
                    .with_context(|| format!("Failed to write snapshot for tick {}", last.tick))?;
                writeln!(out).context("Failed to write snapshot")?;
            }
        }
        if let Some(out) = out.as_mut() {
            out.flush().context("Failed to flush snapshot output")?;
        }
        self.metrics.update();

        let summary = HeadlessSummary {
            ticks: last.tick,
            scores: last.actors.iter().map(|a| (a.name.clone(), a.score)).collect(),
            lengths: last.actors.iter().map(|a| a.body.len()).collect(),
            leader: last.leader(),
        };

        info!(
            ticks = summary.ticks,
            leader = ?summary.leader.map(|i| &summary.scores[i].0),
            elapsed = %self.metrics.format_time(),
            "headless run complete"
        );

        Ok(summary)
    }

    /// Stop the audio task after the queued cues have played
    pub async fn finish(self) {
        self.audio.shutdown().await;
    }

    fn print_header(&self) {
        let config = self.engine.config();
        info!(
            ticks = self.ticks,
            width = config.grid_width,
            height = config.grid_height,
            actors = config.actors.len(),
            power_ups = config.power_ups.is_some(),
            seed = ?config.seed,
            "headless run starting"
        );
    }

    /// Human-readable standings for the end of a run
    pub fn format_summary(&self, summary: &HeadlessSummary) -> String {
        let mut lines = vec![format!("Ticks: {}", summary.ticks)];
        for (i, (name, score)) in summary.scores.iter().enumerate() {
            let stats = self.metrics.actors.get(i).copied().unwrap_or_default();
            lines.push(format!(
                "  {}: score {}, length {}, food {}, power-ups {}, collisions {}",
                name,
                score,
                summary.lengths[i],
                stats.food_eaten,
                stats.power_ups_collected,
                stats.collisions
            ));
        }
        lines.push(format!(
            "Spawned: {} food, {} power-ups ({} expired, {} spawns skipped)",
            self.metrics.food_spawned,
            self.metrics.power_ups_spawned,
            self.metrics.power_ups_expired,
            self.metrics.spawns_skipped
        ));
        lines.push(match summary.leader {
            Some(i) => format!("Leader: {}", summary.scores[i].0),
            None => "Leader: tie".to_string(),
        });
        lines.join("\n")
    }
}
