use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Playback rate of the watch view, relative to the configured tick interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSpeed {
    /// Half speed
    Slow,
    /// The configured tick interval
    Normal,
    /// Twice as fast
    Fast,
    /// Four times as fast
    VeryFast,
}

impl PlaybackSpeed {
    /// Real-time delay between ticks at this speed
    pub fn tick_interval(&self, base: Duration) -> Duration {
        let scaled = match self {
            Self::Slow => base * 2,
            Self::Normal => base,
            Self::Fast => base / 2,
            Self::VeryFast => base / 4,
        };
        scaled.max(Duration::from_millis(1))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::VeryFast => "Very Fast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePause,
    Restart,
    Quit,
    Speed(PlaybackSpeed),
    None,
}

pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => KeyAction::TogglePause,

            // Playback speed
            KeyCode::Char('1') => KeyAction::Speed(PlaybackSpeed::Slow),
            KeyCode::Char('2') => KeyAction::Speed(PlaybackSpeed::Normal),
            KeyCode::Char('3') => KeyAction::Speed(PlaybackSpeed::Fast),
            KeyCode::Char('4') => KeyAction::Speed(PlaybackSpeed::VeryFast),

            // Controls
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,

            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}
