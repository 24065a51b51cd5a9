use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::action::Direction;
use super::controller::Personality;
use super::effects::{EffectKind, StatusEffects};
use super::grid::Grid;
use super::items::{FoodField, PowerUpKind, PowerUpManager};

/// Number of vacated head cells remembered for the visual trail
pub const TRAIL_LENGTH: usize = 5;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta (no wrapping, see [`Grid::wrap`])
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// An autonomously controlled snake
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    pub name: String,
    /// Body segments, with head at index 0. Never empty.
    pub body: Vec<Position>,
    /// Current direction of movement
    pub direction: Direction,
    /// Controller strategy; `None` is the plain controller that never
    /// risks a rival's body and ignores power-ups
    pub personality: Option<Personality>,
    pub score: u32,
    /// Simulated time (ms) of the most recent accepted heading change
    pub last_heading_change: Option<u64>,
    pub effects: StatusEffects,
    /// Recently vacated head cells, oldest first
    pub trail: VecDeque<Position>,
    /// Tail cell dropped by the latest move, re-appended by `grow`
    vacated_tail: Option<Position>,
    /// Whether the previous slowed tick was skipped
    skipped_last_move: bool,
}

impl Snake {
    /// Create a one-cell snake
    pub fn new(name: impl Into<String>, head: Position, direction: Direction) -> Self {
        Self::with_body(name, vec![head], direction)
    }

    /// Create a snake from explicit segments, head first.
    ///
    /// An empty `body` is not a valid snake; callers must supply at least
    /// the head.
    pub fn with_body(name: impl Into<String>, body: Vec<Position>, direction: Direction) -> Self {
        debug_assert!(!body.is_empty(), "a snake needs at least a head");
        Self {
            name: name.into(),
            body,
            direction,
            personality: None,
            score: 0,
            last_heading_change: None,
            effects: StatusEffects::new(),
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
            vacated_tail: None,
            skipped_last_move: false,
        }
    }

    pub fn with_personality(mut self, personality: Option<Personality>) -> Self {
        self.personality = personality;
        self
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Get the tail position (last segment)
    pub fn tail(&self) -> Position {
        self.body[self.body.len() - 1]
    }

    /// Get body segments (excluding head)
    pub fn body_segments(&self) -> &[Position] {
        &self.body[1..]
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().contains(&pos)
    }

    /// Cells that stay occupied after the next move: everything but the tail
    pub fn cells_kept_next_move(&self) -> &[Position] {
        &self.body[..self.body.len() - 1]
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Advance one tick along the current heading and return the tail cell
    /// that was vacated.
    ///
    /// A speed boost moves `boost` cells at once. While slowed, every other
    /// call is skipped; a skipped call leaves the body untouched and returns
    /// the current tail.
    pub fn advance(&mut self, grid: &Grid, boost: i32) -> Position {
        if self.effects.is_active(EffectKind::Slowed) {
            self.skipped_last_move = !self.skipped_last_move;
            if self.skipped_last_move {
                self.vacated_tail = None;
                return self.tail();
            }
        } else {
            self.skipped_last_move = false;
        }

        let distance = if self.effects.is_active(EffectKind::SpeedBoost) {
            boost.max(1)
        } else {
            1
        };
        let new_head = grid.step(self.head(), self.direction, distance);

        if self.trail.len() >= TRAIL_LENGTH {
            self.trail.pop_front();
        }
        self.trail.push_back(self.head());

        self.body.insert(0, new_head);
        let removed = self.body.pop().unwrap_or(new_head);
        self.vacated_tail = Some(removed);
        removed
    }

    /// Re-append the vacated tail `amount` times and score the growth.
    ///
    /// Each segment is worth one point, two while double points is active.
    pub fn grow(&mut self, amount: u32) {
        let tail = self.vacated_tail.unwrap_or_else(|| self.tail());
        let points = if self.effects.is_active(EffectKind::DoublePoints) {
            2
        } else {
            1
        };

        for _ in 0..amount {
            self.body.push(tail);
            self.score += points;
        }
    }

    /// Self-collision test that spends one tick of invincibility when it
    /// is suppressed.
    pub fn check_self_collision(&mut self) -> bool {
        if self.effects.consume(EffectKind::Invincible) {
            return false;
        }
        self.collides_with_body(self.head())
    }

    /// Self-collision test without side effects
    pub fn self_collides(&self) -> bool {
        !self.effects.is_active(EffectKind::Invincible) && self.collides_with_body(self.head())
    }

    /// True if this snake's head lies anywhere on `other`'s body
    pub fn check_collision_with(&self, other: &Snake) -> bool {
        if self.effects.is_active(EffectKind::Invincible) {
            return false;
        }
        other.body.contains(&self.head())
    }

    /// Turn around. The only consequence of any collision.
    pub fn handle_collision(&mut self) {
        self.direction = self.direction.opposite();
    }

    /// Whether a heading change at `now` would fall inside the cooldown window
    pub fn in_cooldown(&self, now: u64, cooldown_ms: u64) -> bool {
        self.last_heading_change
            .is_some_and(|changed| now.saturating_sub(changed) < cooldown_ms)
    }

    /// Adopt a controller decision, stamping the change time if it differs
    pub fn set_heading(&mut self, heading: Direction, now: u64) {
        if heading != self.direction {
            self.direction = heading;
            self.last_heading_change = Some(now);
        }
    }

    /// Apply a collected power-up to this snake.
    ///
    /// Slow-opponent does nothing here; it targets the other snakes.
    pub fn apply_power_up(&mut self, kind: PowerUpKind, effect_ticks: u32, growth_amount: u32) {
        match kind {
            PowerUpKind::SpeedBoost => self.effects.apply(EffectKind::SpeedBoost, effect_ticks),
            PowerUpKind::GrowthBoost => self.grow(growth_amount),
            PowerUpKind::Invincibility => self.effects.apply(EffectKind::Invincible, effect_ticks),
            PowerUpKind::DoublePoints => self.effects.apply(EffectKind::DoublePoints, effect_ticks),
            PowerUpKind::SlowOpponent => {}
        }
    }
}

/// The whole world: grid, snakes and items
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub grid: Grid,
    /// Snakes in their fixed update order
    pub snakes: Vec<Snake>,
    pub food: FoodField,
    pub power_ups: PowerUpManager,
    pub tick: u64,
}

impl GameState {
    pub fn new(grid: Grid, snakes: Vec<Snake>, food: FoodField, power_ups: PowerUpManager) -> Self {
        Self {
            grid,
            snakes,
            food,
            power_ups,
            tick: 0,
        }
    }

    /// Check if a position is occupied by any snake
    pub fn is_occupied_by_snake(&self, pos: Position) -> bool {
        self.snakes.iter().any(|s| s.body.contains(&pos))
    }

    /// Every snake except the one at `index`
    pub fn rivals_of(&self, index: usize) -> Vec<&Snake> {
        self.snakes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, s)| s)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(20, 20)
    }

    #[test]
    fn test_position_movement() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.moved_by(1, 0), Position::new(6, 5));
        assert_eq!(pos.moved_by(-1, 0), Position::new(4, 5));
        assert_eq!(pos.moved_by(0, -3), Position::new(5, 2));
    }

    #[test]
    fn test_snake_creation() {
        let snake = Snake::new("a", Position::new(5, 5), Direction::Right);
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Position::new(5, 5));
        assert_eq!(snake.tail(), Position::new(5, 5));
        assert_eq!(snake.score, 0);
        assert!(snake.effects.is_empty());
    }

    #[test]
    fn test_advance_preserves_length() {
        let body = vec![Position::new(5, 5), Position::new(4, 5), Position::new(3, 5)];
        let mut snake = Snake::with_body("a", body, Direction::Right);

        let removed = snake.advance(&grid(), 2);
        assert_eq!(removed, Position::new(3, 5));
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(6, 5));
        assert_eq!(snake.trail.back(), Some(&Position::new(5, 5)));
    }

    #[test]
    fn test_advance_wraps_right_edge() {
        let mut snake = Snake::new("a", Position::new(19, 7), Direction::Right);
        snake.advance(&grid(), 2);
        assert_eq!(snake.head(), Position::new(0, 7));
    }

    #[test]
    fn test_advance_wraps_top_edge() {
        let mut snake = Snake::new("a", Position::new(3, 0), Direction::Up);
        snake.advance(&grid(), 2);
        assert_eq!(snake.head(), Position::new(3, 19));
    }

    #[test]
    fn test_speed_boost_moves_multiple_cells() {
        let mut snake = Snake::new("a", Position::new(5, 5), Direction::Down);
        snake.effects.apply(EffectKind::SpeedBoost, 10);
        snake.advance(&grid(), 2);
        assert_eq!(snake.head(), Position::new(5, 7));
        assert_eq!(snake.len(), 1);
    }

    #[test]
    fn test_slowed_snake_moves_every_other_tick() {
        let mut snake = Snake::with_body(
            "a",
            vec![Position::new(5, 5), Position::new(4, 5)],
            Direction::Right,
        );
        snake.effects.apply(EffectKind::Slowed, 10);

        let tail = snake.advance(&grid(), 2);
        assert_eq!(snake.head(), Position::new(5, 5));
        assert_eq!(tail, Position::new(4, 5));

        snake.advance(&grid(), 2);
        assert_eq!(snake.head(), Position::new(6, 5));

        snake.advance(&grid(), 2);
        assert_eq!(snake.head(), Position::new(6, 5));
    }

    #[test]
    fn test_trail_is_bounded() {
        let mut snake = Snake::new("a", Position::new(0, 0), Direction::Right);
        for _ in 0..12 {
            snake.advance(&grid(), 2);
        }
        assert_eq!(snake.trail.len(), TRAIL_LENGTH);
        assert_eq!(snake.trail.back(), Some(&Position::new(11, 0)));
    }

    #[test]
    fn test_grow_restores_vacated_tail() {
        let body = vec![Position::new(5, 5), Position::new(4, 5)];
        let mut snake = Snake::with_body("a", body, Direction::Right);
        snake.advance(&grid(), 2);
        snake.grow(1);

        assert_eq!(snake.len(), 3);
        assert_eq!(
            snake.body,
            vec![Position::new(6, 5), Position::new(5, 5), Position::new(4, 5)]
        );
        assert_eq!(snake.score, 1);
    }

    #[test]
    fn test_grow_amount_and_double_points() {
        let mut snake = Snake::new("a", Position::new(5, 5), Direction::Right);
        snake.grow(3);
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.score, 3);

        snake.effects.apply(EffectKind::DoublePoints, 5);
        snake.grow(2);
        assert_eq!(snake.len(), 6);
        assert_eq!(snake.score, 7);
    }

    #[test]
    fn test_self_collision_detection() {
        // Head folded back onto its own body
        let body = vec![
            Position::new(5, 5),
            Position::new(5, 6),
            Position::new(6, 6),
            Position::new(6, 5),
            Position::new(5, 5),
        ];
        let mut snake = Snake::with_body("a", body, Direction::Up);
        assert!(snake.self_collides());
        assert!(snake.check_self_collision());

        let straight = Snake::with_body(
            "b",
            vec![Position::new(5, 5), Position::new(4, 5)],
            Direction::Right,
        );
        assert!(!straight.self_collides());
    }

    #[test]
    fn test_invincible_self_collision_consumes_a_tick() {
        let body = vec![Position::new(5, 5), Position::new(5, 6), Position::new(5, 5)];
        let mut snake = Snake::with_body("a", body, Direction::Up);
        snake.effects.apply(EffectKind::Invincible, 3);

        assert!(!snake.check_self_collision());
        assert_eq!(snake.effects.remaining(EffectKind::Invincible), 2);
    }

    #[test]
    fn test_pure_self_check_does_not_consume() {
        let body = vec![Position::new(5, 5), Position::new(5, 6), Position::new(5, 5)];
        let mut snake = Snake::with_body("a", body, Direction::Up);
        snake.effects.apply(EffectKind::Invincible, 3);

        assert!(!snake.self_collides());
        assert_eq!(snake.effects.remaining(EffectKind::Invincible), 3);
    }

    #[test]
    fn test_rival_collision() {
        let a = Snake::new("a", Position::new(5, 5), Direction::Right);
        let b = Snake::with_body(
            "b",
            vec![Position::new(5, 4), Position::new(5, 5)],
            Direction::Up,
        );
        assert!(a.check_collision_with(&b));
        assert!(!b.check_collision_with(&a));
    }

    #[test]
    fn test_invincible_rival_collision_has_no_side_effect() {
        let mut a = Snake::new("a", Position::new(5, 5), Direction::Right);
        a.effects.apply(EffectKind::Invincible, 3);
        let b = Snake::new("b", Position::new(5, 5), Direction::Left);

        assert!(!a.check_collision_with(&b));
        assert_eq!(a.effects.remaining(EffectKind::Invincible), 3);
    }

    #[test]
    fn test_handle_collision_reverses_only_heading() {
        let body = vec![Position::new(5, 5), Position::new(4, 5)];
        let mut snake = Snake::with_body("a", body.clone(), Direction::Right);
        snake.score = 4;

        snake.handle_collision();
        assert_eq!(snake.direction, Direction::Left);
        assert_eq!(snake.body, body);
        assert_eq!(snake.score, 4);
    }

    #[test]
    fn test_heading_cooldown() {
        let mut snake = Snake::new("a", Position::new(5, 5), Direction::Right);
        assert!(!snake.in_cooldown(0, 200));

        snake.set_heading(Direction::Right, 100);
        assert_eq!(snake.last_heading_change, None);

        snake.set_heading(Direction::Up, 100);
        assert_eq!(snake.last_heading_change, Some(100));
        assert!(snake.in_cooldown(299, 200));
        assert!(!snake.in_cooldown(300, 200));
    }

    #[test]
    fn test_apply_power_ups() {
        let mut snake = Snake::new("a", Position::new(5, 5), Direction::Right);

        snake.apply_power_up(PowerUpKind::Invincibility, 100, 3);
        assert_eq!(snake.effects.remaining(EffectKind::Invincible), 100);

        snake.apply_power_up(PowerUpKind::GrowthBoost, 100, 3);
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.score, 3);

        snake.apply_power_up(PowerUpKind::SlowOpponent, 100, 3);
        assert!(!snake.effects.is_active(EffectKind::Slowed));
    }
}
