//! Toroidal grid arithmetic
//!
//! Every position handed out by the simulation passes through [`Grid::wrap`],
//! so no actor or item ever occupies a cell outside `[0, width) x [0, height)`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::action::Direction;
use super::state::Position;

/// Dimensions of the playing field in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Bring a position back into range, component-wise modulo the grid size
    pub fn wrap(&self, pos: Position) -> Position {
        Position::new(
            pos.x.rem_euclid(self.width as i32),
            pos.y.rem_euclid(self.height as i32),
        )
    }

    /// Cell reached by moving `distance` cells from `from` in `direction`
    pub fn step(&self, from: Position, direction: Direction, distance: i32) -> Position {
        let (dx, dy) = direction.delta();
        self.wrap(from.moved_by(dx * distance, dy * distance))
    }

    /// Euclidean distance on the flat grid.
    ///
    /// Wraparound shortcuts are deliberately ignored, so the controller
    /// sometimes takes the long way round near the edges.
    pub fn distance(a: Position, b: Position) -> f32 {
        let dx = (a.x - b.x) as f32;
        let dy = (a.y - b.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Check if a position is within the grid bounds
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width as i32 && pos.y >= 0 && pos.y < self.height as i32
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Uniformly random cell
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let x = rng.gen_range(0..self.width) as i32;
        let y = rng.gen_range(0..self.height) as i32;
        Position::new(x, y)
    }
}
