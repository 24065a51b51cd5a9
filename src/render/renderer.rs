use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::game::{ActorView, EffectKind, Position, PowerUpKind, WorldSnapshot};
use crate::input::PlaybackSpeed;
use crate::metrics::MatchMetrics;

const ACTOR_COLORS: [Color; 6] = [
    Color::Red,
    Color::Blue,
    Color::Green,
    Color::Magenta,
    Color::Yellow,
    Color::Cyan,
];

/// Playback state of the watch view, shown alongside the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewStatus {
    pub paused: bool,
    pub speed: PlaybackSpeed,
}

impl Default for ViewStatus {
    fn default() -> Self {
        Self {
            paused: false,
            speed: PlaybackSpeed::Normal,
        }
    }
}

/// What occupies a cell, in drawing priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Trail(usize),
    Food,
    PowerUp(PowerUpKind),
    Body(usize),
    Head(usize),
}

impl Cell {
    fn rank(&self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Trail(_) => 1,
            Cell::Food => 2,
            Cell::PowerUp(_) => 3,
            Cell::Body(_) => 4,
            Cell::Head(_) => 5,
        }
    }
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        snapshot: &WorldSnapshot,
        metrics: &MatchMetrics,
        status: ViewStatus,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(snapshot, metrics), chunks[0]);
        frame.render_widget(self.render_grid(snapshot, status), chunks[1]);
        frame.render_widget(self.render_controls(status), chunks[2]);
    }

    fn layout_cells(&self, snapshot: &WorldSnapshot) -> Vec<Cell> {
        let grid = snapshot.grid;
        let mut cells = vec![Cell::Empty; grid.cell_count()];

        let mut put = |pos: Position, cell: Cell| {
            if !grid.contains(pos) {
                return;
            }
            let index = pos.y as usize * grid.width + pos.x as usize;
            if cell.rank() > cells[index].rank() {
                cells[index] = cell;
            }
        };

        for (i, actor) in snapshot.actors.iter().enumerate() {
            for &pos in &actor.trail {
                put(pos, Cell::Trail(i));
            }
        }
        for &pos in &snapshot.food {
            put(pos, Cell::Food);
        }
        for power_up in &snapshot.power_ups {
            put(power_up.position, Cell::PowerUp(power_up.kind));
        }
        for (i, actor) in snapshot.actors.iter().enumerate() {
            for &pos in &actor.body[1..] {
                put(pos, Cell::Body(i));
            }
            put(actor.head(), Cell::Head(i));
        }

        cells
    }

    fn render_grid(&self, snapshot: &WorldSnapshot, status: ViewStatus) -> Paragraph<'_> {
        let grid = snapshot.grid;
        let cells = self.layout_cells(snapshot);

        let lines: Vec<Line> = cells
            .chunks(grid.width.max(1))
            .map(|row| {
                Line::from(
                    row.iter()
                        .map(|&cell| self.cell_span(cell, snapshot))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        let title = if status.paused {
            " Snake Duel - PAUSED ".to_string()
        } else {
            format!(" Snake Duel - tick {} ", snapshot.tick)
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(if status.paused {
                        Color::Yellow
                    } else {
                        Color::White
                    }))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn cell_span(&self, cell: Cell, snapshot: &WorldSnapshot) -> Span<'static> {
        match cell {
            Cell::Empty => Span::styled(". ", Style::default().fg(Color::DarkGray)),
            Cell::Trail(i) => Span::styled(
                "· ",
                Style::default()
                    .fg(actor_color(i))
                    .add_modifier(Modifier::DIM),
            ),
            Cell::Food => Span::styled(
                "O ",
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
            ),
            Cell::PowerUp(kind) => Span::styled(
                power_up_glyph(kind),
                Style::default()
                    .fg(power_up_color(kind))
                    .add_modifier(Modifier::BOLD),
            ),
            Cell::Body(i) => Span::styled("□ ", Style::default().fg(actor_color(i))),
            Cell::Head(i) => {
                let color = snapshot
                    .actors
                    .get(i)
                    .and_then(head_color)
                    .unwrap_or_else(|| actor_color(i));
                Span::styled("■ ", Style::default().fg(color).add_modifier(Modifier::BOLD))
            }
        }
    }

    fn render_stats(&self, snapshot: &WorldSnapshot, metrics: &MatchMetrics) -> Paragraph<'_> {
        let leader = snapshot.leader();

        let mut scores = Vec::new();
        let mut banners = Vec::new();
        for (i, actor) in snapshot.actors.iter().enumerate() {
            if i > 0 {
                scores.push(Span::raw("    "));
            }
            let mut name_style = Style::default().fg(actor_color(i));
            if leader == Some(i) {
                name_style = name_style.add_modifier(Modifier::BOLD);
            }
            let name = match actor.personality {
                Some(personality) => format!("{} [{}]: ", actor.name, personality.label()),
                None => format!("{}: ", actor.name),
            };
            scores.push(Span::styled(name, name_style));
            scores.push(Span::styled(
                actor.score.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
            if let Some(stats) = metrics.actors.get(i) {
                scores.push(Span::styled(
                    format!(
                        " (food {}, power-ups {}, hits {})",
                        stats.food_eaten, stats.power_ups_collected, stats.collisions
                    ),
                    Style::default().fg(Color::Gray),
                ));
            }

            for effect in &actor.effects {
                banners.push(Span::styled(
                    format!(" {} {}: {} ", actor.name, effect.kind.label(), effect.remaining),
                    Style::default()
                        .fg(Color::Black)
                        .bg(effect_color(effect.kind)),
                ));
                banners.push(Span::raw(" "));
            }
        }

        let timing = Line::from(vec![
            Span::styled("Time: ", Style::default().fg(Color::Yellow)),
            Span::styled(metrics.format_time(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Tick: ", Style::default().fg(Color::Yellow)),
            Span::styled(snapshot.tick.to_string(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Spawned: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!(
                    "{} food, {} power-ups",
                    metrics.food_spawned, metrics.power_ups_spawned
                ),
                Style::default().fg(Color::White),
            ),
        ]);

        Paragraph::new(vec![Line::from(scores), Line::from(banners), timing])
            .alignment(Alignment::Center)
    }

    fn render_controls(&self, status: ViewStatus) -> Paragraph<'_> {
        let mut spans = Vec::new();
        if status.paused {
            spans.push(Span::styled(
                "PAUSED ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans.extend([
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("R", Style::default().fg(Color::Green)),
            Span::raw(" reset | "),
            Span::styled("1-4", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" speed ({}) | ", status.speed.label())),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ]);

        Paragraph::new(vec![Line::from(""), Line::from(spans)]).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn actor_color(index: usize) -> Color {
    ACTOR_COLORS[index % ACTOR_COLORS.len()]
}

/// Heads take the colour of their most visible effect
fn head_color(actor: &ActorView) -> Option<Color> {
    [
        EffectKind::Invincible,
        EffectKind::DoublePoints,
        EffectKind::SpeedBoost,
        EffectKind::Slowed,
    ]
    .into_iter()
    .find(|&kind| actor.effects.iter().any(|e| e.kind == kind))
    .map(effect_color)
}

fn effect_color(kind: EffectKind) -> Color {
    match kind {
        EffectKind::Invincible => Color::Yellow,
        EffectKind::DoublePoints => Color::Magenta,
        EffectKind::SpeedBoost => Color::Cyan,
        EffectKind::Slowed => Color::Gray,
    }
}

fn power_up_glyph(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::SpeedBoost => "» ",
        PowerUpKind::GrowthBoost => "+ ",
        PowerUpKind::Invincibility => "◆ ",
        PowerUpKind::DoublePoints => "x2",
        PowerUpKind::SlowOpponent => "~ ",
    }
}

fn power_up_color(kind: PowerUpKind) -> Color {
    match kind {
        PowerUpKind::SpeedBoost => Color::Cyan,
        PowerUpKind::GrowthBoost => Color::Green,
        PowerUpKind::Invincibility => Color::Yellow,
        PowerUpKind::DoublePoints => Color::Magenta,
        PowerUpKind::SlowOpponent => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Direction, GameConfig, GameState, Personality, PowerUp, Snake};
    use crate::game::{FoodField, PowerUpManager};
    use ratatui::{Terminal, backend::TestBackend};

    fn sample_snapshot() -> WorldSnapshot {
        let config = GameConfig::enhanced().with_grid(8, 6);
        let mut red = Snake::with_body(
            "Red",
            vec![Position::new(2, 2), Position::new(1, 2)],
            Direction::Right,
        );
        red.score = 3;
        red.effects.apply(EffectKind::Invincible, 40);
        let blue = Snake::new("Blue", Position::new(6, 4), Direction::Left)
            .with_personality(Some(Personality::Defensive));

        let mut food = FoodField::new(1, 1);
        food.place(Position::new(4, 1));
        let mut power_ups = PowerUpManager::new(config.power_ups);
        power_ups.place(PowerUp {
            position: Position::new(0, 5),
            kind: PowerUpKind::DoublePoints,
            remaining_lifetime: 10,
            effect_duration: 10,
        });

        let state = GameState::new(config.grid(), vec![red, blue], food, power_ups);
        WorldSnapshot::capture(&state, Vec::new())
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_cell_priority() {
        let renderer = Renderer::new();
        let snapshot = sample_snapshot();
        let cells = renderer.layout_cells(&snapshot);

        let at = |x: usize, y: usize| cells[y * 8 + x];
        assert_eq!(at(2, 2), Cell::Head(0));
        assert_eq!(at(1, 2), Cell::Body(0));
        assert_eq!(at(6, 4), Cell::Head(1));
        assert_eq!(at(4, 1), Cell::Food);
        assert_eq!(at(0, 5), Cell::PowerUp(PowerUpKind::DoublePoints));
        assert_eq!(at(7, 0), Cell::Empty);
    }

    #[test]
    fn test_render_shows_scores_and_banners() {
        let renderer = Renderer::new();
        let snapshot = sample_snapshot();
        let metrics = MatchMetrics::new(2);

        let mut terminal = Terminal::new(TestBackend::new(120, 16)).unwrap();
        terminal
            .draw(|frame| renderer.render(frame, &snapshot, &metrics, ViewStatus::default()))
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Red: 3"));
        assert!(text.contains("Blue [defensive]: 0"));
        assert!(text.contains("INVINCIBLE: 40"));
        assert!(text.contains("Normal"));
        assert!(!text.contains("PAUSED"));
    }

    #[test]
    fn test_render_paused() {
        let renderer = Renderer::new();
        let snapshot = sample_snapshot();
        let metrics = MatchMetrics::new(2);
        let status = ViewStatus {
            paused: true,
            speed: PlaybackSpeed::Fast,
        };

        let mut terminal = Terminal::new(TestBackend::new(120, 16)).unwrap();
        terminal
            .draw(|frame| renderer.render(frame, &snapshot, &metrics, status))
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("PAUSED"));
        assert!(text.contains("Fast"));
    }
}
