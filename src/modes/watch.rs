//! Interactive terminal view of a running duel
//!
//! # Controls
//!
//! - Space/P: Pause/unpause
//! - R: Reset the match
//! - 1-4: Speed control (1=slow, 2=normal, 3=fast, 4=very fast)
//! - Q/Esc: Quit

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, Write, stderr};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::info;

use crate::audio::{AudioDispatcher, DeferredBell};
use crate::game::{GameConfig, GameEngine, GameState, WorldSnapshot};
use crate::input::{InputHandler, KeyAction, PlaybackSpeed};
use crate::metrics::MatchMetrics;
use crate::render::{Renderer, ViewStatus};

pub struct WatchMode {
    engine: GameEngine,
    state: GameState,
    snapshot: WorldSnapshot,
    metrics: MatchMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    audio: AudioDispatcher,
    /// Cues waiting to be rung on the terminal; `None` when muted
    bell: Option<DeferredBell>,
    should_quit: bool,
    paused: bool,
    speed: PlaybackSpeed,
}

impl WatchMode {
    /// Unless `mute` is set, this starts the audio task and so must be
    /// called inside a tokio runtime.
    pub fn new(config: GameConfig, mute: bool) -> Self {
        let (audio, bell) = if mute {
            (AudioDispatcher::muted(), None)
        } else {
            let bell = DeferredBell::new();
            (AudioDispatcher::spawn(bell.clone()), Some(bell))
        };

        let mut engine = GameEngine::new(config);
        let state = engine.reset();
        let snapshot = WorldSnapshot::capture(&state, Vec::new());
        let metrics = MatchMetrics::new(state.snakes.len());

        Self {
            engine,
            state,
            snapshot,
            metrics,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            audio,
            bell,
            should_quit: false,
            paused: false,
            speed: PlaybackSpeed::Normal,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        info!(
            actors = self.state.snakes.len(),
            tick_ms = self.engine.config().tick_interval_ms,
            "watch mode started"
        );

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        let cleanup = self.cleanup_terminal(&mut terminal);

        info!(
            ticks = self.metrics.ticks,
            scores = ?self.snapshot.actors.iter().map(|a| a.score).collect::<Vec<_>>(),
            "watch mode finished"
        );
        self.audio.shutdown().await;

        result.and(cleanup)
    }

    fn base_interval(&self) -> Duration {
        Duration::from_millis(self.engine.config().tick_interval_ms)
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        let mut tick_timer = interval(self.speed.tick_interval(self.base_interval()));
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, &mut tick_timer);
                    }
                }

                // Game logic tick
                _ = tick_timer.tick() => {
                    if !self.paused {
                        self.update_game();
                    }
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update();
                    let status = ViewStatus { paused: self.paused, speed: self.speed };
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &self.snapshot, &self.metrics, status);
                    }).context("Failed to draw frame")?;
                    self.ring_pending_bell(terminal.backend_mut())?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event, tick_timer: &mut Interval) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::TogglePause => {
                    self.paused = !self.paused;
                    info!(paused = self.paused, tick = self.state.tick, "pause toggled");
                }
                KeyAction::Restart => {
                    self.reset_game();
                }
                KeyAction::Speed(speed) => {
                    self.change_speed(speed, tick_timer);
                }
                KeyAction::Quit => {
                    self.should_quit = true;
                }
                KeyAction::None => {}
            }
        }
    }

    fn update_game(&mut self) {
        self.snapshot = self.engine.step(&mut self.state);
        self.metrics.record(&self.snapshot.events);
        self.audio.dispatch(&self.snapshot.events);
    }

    /// Ring once for everything queued since the last frame
    fn ring_pending_bell<W: Write>(&self, out: &mut W) -> Result<()> {
        let Some(bell) = &self.bell else {
            return Ok(());
        };
        if bell.take_pending() > 0 {
            out.write_all(b"\x07").context("Failed to ring terminal bell")?;
            out.flush().context("Failed to flush terminal bell")?;
        }
        Ok(())
    }

    fn reset_game(&mut self) {
        info!(tick = self.state.tick, "match reset");
        self.state = self.engine.reset();
        self.snapshot = WorldSnapshot::capture(&self.state, Vec::new());
        self.metrics.on_match_start();
    }

    fn change_speed(&mut self, speed: PlaybackSpeed, tick_timer: &mut Interval) {
        self.speed = speed;
        let period = speed.tick_interval(self.base_interval());
        *tick_timer = interval(period);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(speed = speed.label(), period_ms = period.as_millis() as u64, "playback speed changed");
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}
