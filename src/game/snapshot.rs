//! Read-only view of the world handed to presentation and audio after each tick

use serde::Serialize;

use super::action::Direction;
use super::controller::Personality;
use super::effects::ActiveEffect;
use super::grid::Grid;
use super::items::{PowerUp, PowerUpKind};
use super::state::{GameState, Position, Snake};

/// What a snake ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    /// Its own body
    Own,
    /// The body of the snake at this index
    Actor(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Food,
    PowerUp,
}

/// Something that happened during a tick, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    FoodEaten { actor: usize, at: Position },
    FoodSpawned { at: Position },
    PowerUpSpawned { kind: PowerUpKind, at: Position },
    PowerUpExpired { kind: PowerUpKind, at: Position },
    PowerUpCollected { actor: usize, kind: PowerUpKind, at: Position },
    Collision { actor: usize, with: Body },
    /// No free cell could be found for an item this tick
    SpawnSkipped { item: ItemKind },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorView {
    pub name: String,
    pub personality: Option<Personality>,
    pub body: Vec<Position>,
    pub heading: Direction,
    pub score: u32,
    pub effects: Vec<ActiveEffect>,
    /// Recently vacated head cells, oldest first
    pub trail: Vec<Position>,
}

impl ActorView {
    fn of(snake: &Snake) -> Self {
        Self {
            name: snake.name.clone(),
            personality: snake.personality,
            body: snake.body.clone(),
            heading: snake.direction,
            score: snake.score,
            effects: snake.effects.iter().copied().collect(),
            trail: snake.trail.iter().copied().collect(),
        }
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }
}

/// Immutable copy of the world after a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub grid: Grid,
    pub actors: Vec<ActorView>,
    pub food: Vec<Position>,
    pub power_ups: Vec<PowerUp>,
    pub events: Vec<GameEvent>,
}

impl WorldSnapshot {
    pub fn capture(state: &GameState, events: Vec<GameEvent>) -> Self {
        Self {
            tick: state.tick,
            grid: state.grid,
            actors: state.snakes.iter().map(ActorView::of).collect(),
            food: state.food.positions().to_vec(),
            power_ups: state.power_ups.active().to_vec(),
            events,
        }
    }

    /// Index of the highest-scoring actor; `None` on a tie for the lead
    pub fn leader(&self) -> Option<usize> {
        let best = self.actors.iter().map(|a| a.score).max()?;
        let mut leaders = self
            .actors
            .iter()
            .enumerate()
            .filter(|(_, a)| a.score == best);
        let (index, _) = leaders.next()?;
        match leaders.next() {
            Some(_) => None,
            None => Some(index),
        }
    }
}
