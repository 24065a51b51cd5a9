//! Timed status effects carried by a snake
//!
//! Effects are a small tagged set rather than one counter field per kind:
//! each entry is a kind plus the ticks it has left. An effect is active while
//! it has an entry; entries are dropped as soon as they count down to zero.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Moves several cells per tick
    SpeedBoost,
    /// Collisions are ignored
    Invincible,
    /// Growth scores double
    DoublePoints,
    /// Moves only every other tick
    Slowed,
}

impl EffectKind {
    pub fn label(&self) -> &'static str {
        match self {
            EffectKind::SpeedBoost => "SPEED",
            EffectKind::Invincible => "INVINCIBLE",
            EffectKind::DoublePoints => "DOUBLE POINTS",
            EffectKind::Slowed => "SLOWED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub remaining: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    active: Vec<ActiveEffect>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an effect, or restart it with a fresh duration if already active.
    /// A zero duration clears the effect.
    pub fn apply(&mut self, kind: EffectKind, ticks: u32) {
        if ticks == 0 {
            self.active.retain(|e| e.kind != kind);
            return;
        }

        match self.active.iter_mut().find(|e| e.kind == kind) {
            Some(effect) => effect.remaining = ticks,
            None => self.active.push(ActiveEffect {
                kind,
                remaining: ticks,
            }),
        }
    }

    pub fn remaining(&self, kind: EffectKind) -> u32 {
        self.active
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.remaining)
            .unwrap_or(0)
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.remaining(kind) > 0
    }

    /// Spend one tick of a single effect. Returns whether it was active.
    pub fn consume(&mut self, kind: EffectKind) -> bool {
        let Some(effect) = self.active.iter_mut().find(|e| e.kind == kind) else {
            return false;
        };
        effect.remaining -= 1;
        self.active.retain(|e| e.remaining > 0);
        true
    }

    /// Count every effect down by one tick, except the kinds listed in `exempt`
    pub fn decay(&mut self, exempt: &[EffectKind]) {
        for effect in self.active.iter_mut() {
            if !exempt.contains(&effect.kind) {
                effect.remaining = effect.remaining.saturating_sub(1);
            }
        }
        self.active.retain(|e| e.remaining > 0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.active.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
