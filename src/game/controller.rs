//! Greedy one-step-lookahead heading controller
//!
//! Each tick, every candidate heading is scored by the flat distance from the
//! cell it leads to, to the chosen target, plus a small penalty for turning.
//! Nothing is searched beyond that one step and nothing is remembered apart
//! from the snake's own heading-change timestamp.

use serde::{Deserialize, Serialize};

use super::action::Direction;
use super::grid::Grid;
use super::items::PowerUp;
use super::state::{Position, Snake};

/// How much risk a snake takes around rivals and power-ups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Chases nearby power-ups and ignores rival bodies
    Aggressive,
    /// Never steps onto a rival body and never chases power-ups
    Defensive,
    /// Risks a rival body only when that rival is not longer than itself
    Balanced,
}

impl Personality {
    pub fn label(&self) -> &'static str {
        match self {
            Personality::Aggressive => "aggressive",
            Personality::Defensive => "defensive",
            Personality::Balanced => "balanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Minimum simulated time between accepted heading changes
    pub cooldown_ms: u64,
    /// Added to the score of every candidate that turns
    pub turn_penalty: f32,
    /// An aggressive snake prefers a power-up closer than this multiple of
    /// the nearest food's distance
    pub power_up_reach: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            cooldown_ms: 200,
            turn_penalty: 0.5,
            power_up_reach: 1.5,
        }
    }
}

/// Everything the controller may look at, borrowed read-only from the world
pub struct ControllerView<'a> {
    pub grid: &'a Grid,
    pub food: &'a [Position],
    pub power_ups: &'a [PowerUp],
    pub rivals: &'a [&'a Snake],
    /// Simulated time in milliseconds
    pub now: u64,
}

#[derive(Debug, Clone)]
pub struct HeuristicController {
    settings: ControllerSettings,
}

impl HeuristicController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self { settings }
    }

    /// Choose the next heading for `snake`.
    ///
    /// Pure: the caller adopts the result with [`Snake::set_heading`], which
    /// stamps the cooldown when the heading actually changes.
    pub fn decide(&self, snake: &Snake, view: &ControllerView<'_>) -> Direction {
        if snake.in_cooldown(view.now, self.settings.cooldown_ms) {
            return snake.direction;
        }

        let head = snake.head();
        let target = self.select_target(snake, view);

        let mut best = snake.direction;
        let mut best_score = f32::INFINITY;

        for direction in Direction::ALL {
            let next = view.grid.step(head, direction, 1);

            if lands_on_self(snake, next) {
                continue;
            }
            if view
                .rivals
                .iter()
                .any(|rival| rival.body.contains(&next) && !tolerates(snake, rival))
            {
                continue;
            }

            let mut score = target.map_or(0.0, |t| Grid::distance(next, t));
            if direction != snake.direction {
                score += self.settings.turn_penalty;
            }

            if score < best_score {
                best_score = score;
                best = direction;
            }
        }

        if best_score.is_infinite() {
            // Boxed in: settle for anything that at least misses our own body
            return Direction::ALL
                .into_iter()
                .find(|&d| !lands_on_self(snake, view.grid.step(head, d, 1)))
                .unwrap_or(snake.direction);
        }

        best
    }

    /// Nearest food, overridden by the nearest power-up for aggressive snakes
    /// when it is not much farther away
    fn select_target(&self, snake: &Snake, view: &ControllerView<'_>) -> Option<Position> {
        let head = snake.head();
        let nearest_food = nearest(head, view.food.iter().copied());

        if snake.personality != Some(Personality::Aggressive) {
            return nearest_food;
        }

        let Some(power_up) = nearest(head, view.power_ups.iter().map(|p| p.position)) else {
            return nearest_food;
        };

        match nearest_food {
            Some(food)
                if Grid::distance(head, power_up)
                    >= Grid::distance(head, food) * self.settings.power_up_reach =>
            {
                Some(food)
            }
            _ => Some(power_up),
        }
    }
}

/// The tail is vacated this tick, so only the other cells count
fn lands_on_self(snake: &Snake, cell: Position) -> bool {
    snake.cells_kept_next_move().contains(&cell)
}

fn tolerates(snake: &Snake, rival: &Snake) -> bool {
    match snake.personality {
        Some(Personality::Aggressive) => true,
        Some(Personality::Balanced) => rival.len() <= snake.len(),
        Some(Personality::Defensive) | None => false,
    }
}

/// First cell with the smallest flat distance from `from`
fn nearest(from: Position, cells: impl Iterator<Item = Position>) -> Option<Position> {
    let mut best: Option<(Position, f32)> = None;
    for cell in cells {
        let distance = Grid::distance(from, cell);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((cell, distance));
        }
    }
    best.map(|(cell, _)| cell)
}
