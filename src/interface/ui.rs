use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Gauge, List, ListItem, Paragraph, Sparkline, Tabs, Wrap},
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::core::grid::{CellKind, Grid, Pos, RunState};
use crate::interface::state::{AppMode, AppState, WorkerStatus};
use crate::solvers::Algorithm;

// --- Color Palette ---
const COL_FG: Color = Color::White;
const COL_HIGHLIGHT: Color = Color::Yellow;
const COL_ACCENT: Color = Color::Cyan;
const COL_WALL: Color = Color::DarkGray;
const COL_ROAD: Color = Color::Black;
const COL_HEAVY: Color = Color::Rgb(60, 50, 30);
const COL_VISITED: Color = Color::Blue;
const COL_EXPLORING: Color = Color::LightMagenta;
const COL_RESULT: Color = Color::LightYellow;
const COL_START: Color = Color::Green;
const COL_GOAL: Color = Color::Red;
const COL_SUCCESS: Color = Color::Green;
const COL_FAIL: Color = Color::Red;

pub fn draw(f: &mut Frame, app: &mut AppState) {
    if f.area().width < 40 || f.area().height < 10 {
        let p = Paragraph::new("Terminal too small.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, f.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);

    match app.mode {
        AppMode::Maze => draw_dashboard(f, app, chunks[1]),
        AppMode::Config => draw_config(f, app, chunks[1]),
        AppMode::Help => draw_help(f, chunks[1]),
    }

    draw_footer(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, app: &AppState, area: Rect) {
    let titles: Vec<String> = Algorithm::ALL
        .iter()
        .enumerate()
        .map(|(i, a)| format!(" {}:{} ", i + 1, a.label()))
        .collect();
    let idx = Algorithm::ALL.iter().position(|a| *a == app.selected).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .select(idx)
        .highlight_style(Style::default().fg(COL_HIGHLIGHT).add_modifier(Modifier::BOLD));

    f.render_widget(tabs, area);
}

fn draw_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let status_str = match app.worker_status {
        WorkerStatus::Running => "RUNNING",
        WorkerStatus::Idle => "IDLE",
        WorkerStatus::Finished => "DONE",
        WorkerStatus::Cancelled => "CANCELLED",
        WorkerStatus::Disconnected => "OFFLINE",
    };

    let color = match app.worker_status {
        WorkerStatus::Running => COL_SUCCESS,
        WorkerStatus::Disconnected => COL_FAIL,
        WorkerStatus::Cancelled => COL_HIGHLIGHT,
        _ => COL_FG,
    };

    let maze = app.grid().map(|g| g.label().to_string()).unwrap_or_else(|| "-".to_string());

    let text = Line::from(vec![
        Span::styled(format!(" STATUS: {:<9}", status_str), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled(maze, Style::default().fg(COL_ACCENT)),
        Span::raw(" | "),
        Span::raw(format!("Delay: {}ms", app.pacing.get())),
        Span::raw(" | [R]un [C]ancel [X]Reset [N]ext +/- [?]Help [Q]uit"),
    ]);

    let p = Paragraph::new(text)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(p, area);
}

fn draw_dashboard(f: &mut Frame, app: &AppState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(area);

    match app.grid() {
        Some(grid) => draw_maze(f, grid, &app.mirror, cols[0]),
        None => f.render_widget(Block::default().title(" No maze loaded ").borders(Borders::ALL), cols[0]),
    }

    let right_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .split(cols[1]);

    draw_metrics(f, app, right_rows[0]);
    draw_evolution(f, app, right_rows[1]);
    draw_logs(f, app, right_rows[2]);
}

fn cell_color(grid: &Grid, state: &RunState, pos: Pos) -> Color {
    match grid.kind(pos) {
        CellKind::Wall => return COL_WALL,
        CellKind::Start => return COL_START,
        CellKind::Goal => return COL_GOAL,
        CellKind::Road => {}
    }
    if state.is_result(pos) {
        COL_RESULT
    } else if state.is_exploring(pos) {
        COL_EXPLORING
    } else if state.is_visited(pos) {
        COL_VISITED
    } else if grid.weight(pos) > 1 {
        COL_HEAVY
    } else {
        COL_ROAD
    }
}

fn draw_maze(f: &mut Frame, grid: &Grid, state: &RunState, area: Rect) {
    let block = Block::default()
        .title(format!(" {} ({}x{}) ", grid.label(), grid.rows(), grid.cols()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);

    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width < 2 || inner.height < 1 { return; }
    if state.dims() != (grid.rows(), grid.cols()) {
        f.render_widget(Paragraph::new("Waiting for run state...").style(Style::default().fg(Color::DarkGray)), inner);
        return;
    }

    // Two terminal columns per cell keeps the maze roughly square.
    let visible_rows = grid.rows().min(inner.height as usize);
    let visible_cols = grid.cols().min(inner.width as usize / 2);

    let lines: Vec<Line> = (0..visible_rows)
        .map(|r| {
            let spans: Vec<Span> = (0..visible_cols)
                .map(|c| {
                    let pos = Pos::new(r, c);
                    let label = match grid.kind(pos) {
                        CellKind::Start => "S ",
                        CellKind::Goal => "G ",
                        _ => "  ",
                    };
                    Span::styled(label, Style::default().bg(cell_color(grid, state, pos)).fg(Color::Black))
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);

    if visible_rows < grid.rows() || visible_cols < grid.cols() {
        let overlay = Paragraph::new("(clipped)").style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
        let overlay_area = Rect { x: inner.x + inner.width.saturating_sub(10), y: inner.y, width: 10.min(inner.width), height: 1 };
        f.render_widget(overlay, overlay_area);
    }
}

fn draw_metrics(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" Metrics ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let kv = |k: &str, v: String, col: Color| -> Line {
        Line::from(vec![
            Span::styled(format!("{:<14}", k), Style::default().fg(Color::Gray)),
            Span::styled(v, Style::default().fg(col)),
        ])
    };
    let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    let running = app.running.map(|a| a.label()).unwrap_or("-");
    let text = match &app.last_metrics {
        Some(m) => vec![
            kv("Algorithm:", m.algorithm.label().to_string(), COL_HIGHLIGHT),
            kv("Running:", running.to_string(), COL_ACCENT),
            kv("Cost:", opt(m.cost.map(|c| c.to_string())), COL_SUCCESS),
            kv("Steps:", opt(m.steps.map(|s| s.to_string())), COL_SUCCESS),
            kv("Visited:", opt(m.visited.map(|v| v.to_string())), COL_FG),
            kv("Time:", format!("{} ms", m.elapsed_ms), COL_FG),
            kv("Visited wt:", opt(m.visited_weight_sum.map(|w| w.to_string())), COL_FG),
        ],
        None => vec![
            kv("Algorithm:", app.selected.label().to_string(), COL_HIGHLIGHT),
            kv("Running:", running.to_string(), COL_ACCENT),
            kv("Visited:", app.mirror.visited_count().to_string(), COL_FG),
        ],
    };

    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn draw_evolution(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(format!(" Evolution (gen {}) ", app.generation)).borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.telemetry.best_fitness_history.is_empty() || inner.height < 2 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    // Lower fitness is better, so the sparkline plots the inverted value.
    let min = app.telemetry.global_min_fitness;
    let max = app.telemetry.global_max_fitness;
    let range = (max - min).max(1.0);

    let width = inner.width as usize;
    let data: Vec<u64> = app.telemetry.best_fitness_history.iter()
        .rev()
        .take(width)
        .map(|(_, fit)| {
            let norm = 1.0 - (fit - min) / range;
            (norm * 10.0) as u64
        })
        .collect();
    let data_rev: Vec<u64> = data.into_iter().rev().collect();

    let spark = Sparkline::default()
        .style(Style::default().fg(COL_ACCENT))
        .data(&data_rev);
    f.render_widget(spark, chunks[0]);

    let reached = app.telemetry.reached_history.back().map(|&(_, r)| r).unwrap_or(0.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(COL_SUCCESS).bg(Color::DarkGray))
        .ratio((reached / 100.0).clamp(0.0, 1.0))
        .label(format!("Reached goal: {:.0}%", reached));
    f.render_widget(gauge, chunks[1]);
}

fn draw_logs(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().title(" System Log ").borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let items: Vec<ListItem> = app.logs.iter().rev().map(|line| {
        let style = if line.to_lowercase().contains("error") || line.contains("failed") || line.contains("no solution") {
            Style::default().fg(COL_FAIL)
        } else if line.contains(">>>") {
            Style::default().fg(COL_SUCCESS)
        } else {
            Style::default().fg(Color::Gray)
        };

        ListItem::new(Line::from(vec![
            Span::styled(">", Style::default().fg(Color::DarkGray)),
            Span::raw(" "),
            Span::raw(line.as_str()),
        ])).style(style)
    }).collect();

    f.render_widget(List::new(items), inner);
}

fn draw_config(f: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Solver Parameters ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let p = &app.config;

    let kv = |k: &str, v: String| -> ListItem {
        ListItem::new(Line::from(vec![
            Span::styled(format!("{:<16}", k), Style::default().fg(COL_ACCENT)),
            Span::raw(v),
        ]))
    };

    let items = vec![
        kv("Delay:", format!("{} ms", app.pacing.get())),
        kv("Mazes loaded:", app.mazes.len().to_string()),
        ListItem::new(Line::from(" ")),
        kv("Pop Size:", p.population_size.to_string()),
        kv("Generations:", p.generations.to_string()),
        kv("Mutation Rate:", format!("{:.3}", p.mutation_rate)),
        kv("Goal Bias:", format!("{:.2}", p.goal_bias)),
        kv("Elitism:", p.elitism_count.to_string()),
        kv("Seed:", p.seed.to_string()),
        ListItem::new(Line::from(" ")),
        kv("Animate every:", format!("{} gen", p.animate_every)),
        kv("Report every:", format!("{} gen", p.report_every)),
    ];

    f.render_widget(List::new(items), inner);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let keys = [
        ("1-5", "Select algorithm"),
        ("r / Enter", "Run selected algorithm"),
        ("c", "Cancel current run"),
        ("x", "Cancel and clear the view"),
        ("n", "Next maze"),
        ("+ / -", "Slower / faster animation"),
        ("m / p", "Maze view / parameters"),
        ("? / h", "Toggle this help"),
        ("q / Esc", "Quit"),
    ];

    let items: Vec<ListItem> = keys
        .iter()
        .map(|(k, v)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<12}", k), Style::default().fg(COL_HIGHLIGHT)),
                Span::raw(*v),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Keys "));
    f.render_widget(list, area);
}
