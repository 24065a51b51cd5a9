//! Sound cues for game events
//!
//! The simulation never waits on sound. Each tick's events are turned into
//! [`SoundCue`]s and pushed onto a channel; a background task plays them.
//! A cue that fails to play is logged and dropped.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::game::{GameEvent, PowerUpKind};

/// A named sound, one per kind of audible event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Eat,
    Collision,
    /// A power-up appeared on the grid
    PowerUp,
    Speed,
    Growth,
    Invincible,
    Double,
    Slow,
}

impl SoundCue {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Eat => "eat",
            Self::Collision => "collision",
            Self::PowerUp => "powerup",
            Self::Speed => "speed",
            Self::Growth => "growth",
            Self::Invincible => "invincible",
            Self::Double => "double",
            Self::Slow => "slow",
        }
    }

    /// The cue for an event, if the event is audible
    pub fn from_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::FoodEaten { .. } => Some(Self::Eat),
            GameEvent::Collision { .. } => Some(Self::Collision),
            GameEvent::PowerUpSpawned { .. } => Some(Self::PowerUp),
            GameEvent::PowerUpCollected { kind, .. } => Some(match kind {
                PowerUpKind::SpeedBoost => Self::Speed,
                PowerUpKind::GrowthBoost => Self::Growth,
                PowerUpKind::Invincibility => Self::Invincible,
                PowerUpKind::DoublePoints => Self::Double,
                PowerUpKind::SlowOpponent => Self::Slow,
            }),
            GameEvent::FoodSpawned { .. }
            | GameEvent::PowerUpExpired { .. }
            | GameEvent::SpawnSkipped { .. } => None,
        }
    }
}

/// Errors raised while playing a cue
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// The output device could not be written.
    #[error("audio output failed: {0}")]
    Io(#[from] io::Error),

    /// The player does not know how to play this cue.
    #[error("no sound for cue `{0}`")]
    Unsupported(&'static str),
}

/// Something that can make a noise for a cue
pub trait CuePlayer: Send + 'static {
    fn play(&mut self, cue: SoundCue) -> Result<(), AudioError>;
}

/// Plays every cue as a terminal bell
pub struct BellPlayer<W> {
    out: W,
}

impl BellPlayer<io::Stderr> {
    pub fn stderr() -> Self {
        Self { out: io::stderr() }
    }
}

impl<W: Write + Send + 'static> BellPlayer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send + 'static> CuePlayer for BellPlayer<W> {
    fn play(&mut self, _cue: SoundCue) -> Result<(), AudioError> {
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Counts cues so the owner of the terminal can ring the bell itself,
/// between frames, instead of racing the UI for the output stream
#[derive(Debug, Clone, Default)]
pub struct DeferredBell {
    pending: Arc<AtomicUsize>,
}

impl DeferredBell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues played since the last call
    pub fn take_pending(&self) -> usize {
        self.pending.swap(0, Ordering::AcqRel)
    }
}

impl CuePlayer for DeferredBell {
    fn play(&mut self, _cue: SoundCue) -> Result<(), AudioError> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

/// Fire-and-forget front end to a [`CuePlayer`] running on its own task
pub struct AudioDispatcher {
    tx: Option<UnboundedSender<SoundCue>>,
    handle: Option<JoinHandle<()>>,
}

impl AudioDispatcher {
    /// Start a background task that plays cues with `player`.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn spawn<P: CuePlayer>(mut player: P) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SoundCue>();

        let handle = tokio::spawn(async move {
            while let Some(cue) = rx.recv().await {
                if let Err(e) = player.play(cue) {
                    warn!(cue = cue.tag(), error = %e, "failed to play sound cue");
                }
            }
            debug!("audio task finished");
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// A dispatcher that drops every cue
    pub fn muted() -> Self {
        Self {
            tx: None,
            handle: None,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.tx.is_none()
    }

    /// Queue the cues for a tick's events. Never blocks.
    pub fn dispatch(&self, events: &[GameEvent]) {
        let Some(tx) = &self.tx else {
            return;
        };

        for cue in events.iter().filter_map(SoundCue::from_event) {
            if tx.send(cue).is_err() {
                warn!(cue = cue.tag(), "audio task is gone, dropping cue");
                return;
            }
        }
    }

    /// Stop accepting cues and wait for the queued ones to play
    pub async fn shutdown(mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "audio task panicked");
            }
        }
    }
}
