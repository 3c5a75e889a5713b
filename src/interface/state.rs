use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::analysis::ledger::RunLedger;
use crate::core::config::{SolverConfig, MAX_DELAY_MS};
use crate::core::grid::{Grid, RunState};
use crate::engine::control::{CancelToken, Pacing};
use crate::solvers::runner::Command;
use crate::solvers::{Algorithm, GenStats, Metrics, SolverEvent};

// --- Constants ---
const HISTORY_CAPACITY: usize = 1000;
const LOG_CAPACITY: usize = 200;
const EVENTS_PER_TICK: usize = 2000;
const DELAY_STEP_MS: u64 = 5;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Maze,
    Config,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Running,
    Finished,
    Cancelled,
    Disconnected,
}

// --- Telemetry ---

#[derive(Debug, Clone)]
pub struct Telemetry {
    // History Queues for Sparklines
    pub best_fitness_history: VecDeque<(f64, f64)>, // (Generation, Fitness)
    pub avg_fitness_history: VecDeque<(f64, f64)>,
    pub reached_history: VecDeque<(f64, f64)>,      // (Generation, Reached %)

    // Global Bounds for Chart Scaling
    pub global_min_fitness: f64,
    pub global_max_fitness: f64,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            best_fitness_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            avg_fitness_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            reached_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            global_min_fitness: f64::MAX,
            global_max_fitness: f64::MIN,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn ingest(&mut self, stats: &GenStats) {
        if self.best_fitness_history.len() >= HISTORY_CAPACITY {
            self.best_fitness_history.pop_front();
            self.avg_fitness_history.pop_front();
            self.reached_history.pop_front();
        }

        let best = stats.best_fitness as f64;
        let worst = stats.worst_fitness as f64;
        if best < self.global_min_fitness { self.global_min_fitness = best; }
        if worst > self.global_max_fitness { self.global_max_fitness = worst; }

        // Avoid a zero range on the first point
        if (self.global_max_fitness - self.global_min_fitness).abs() < 1e-6 {
            self.global_max_fitness += 1.0;
        }

        let x = stats.generation as f64;
        let reached_pct = if stats.pop_size > 0 {
            stats.reached_count as f64 * 100.0 / stats.pop_size as f64
        } else {
            0.0
        };

        self.best_fitness_history.push_back((x, best));
        self.avg_fitness_history.push_back((x, stats.avg_fitness));
        self.reached_history.push_back((x, reached_pct));
    }
}

// --- The Master State ---

/// Presentation-side view of the engine. Mirrors the worker's run state from
/// the event stream and turns key presses into runner commands.
pub struct AppState {
    // System
    pub should_quit: bool,
    pub mode: AppMode,
    pub config: SolverConfig,

    // Mazes
    pub mazes: Vec<Arc<Grid>>,
    pub maze_index: usize,
    pub mirror: RunState,

    // Worker
    pub rx: Option<Receiver<SolverEvent>>,
    pub commands: Option<Sender<Command>>,
    pub cancel: CancelToken,
    pub pacing: Pacing,
    pub worker_status: WorkerStatus,
    pub selected: Algorithm,
    pub running: Option<Algorithm>,

    // Results
    pub last_metrics: Option<Metrics>,
    pub generation: usize,
    pub telemetry: Telemetry,
    pub logs: VecDeque<String>,
    pub ledger: Option<RunLedger>,
}

impl AppState {
    pub fn new(mazes: Vec<Arc<Grid>>, config: SolverConfig, cancel: CancelToken, pacing: Pacing) -> Self {
        let mirror = mazes
            .first()
            .map(|g| RunState::for_grid(g))
            .unwrap_or_else(|| RunState::new(0, 0));

        Self {
            should_quit: false,
            mode: AppMode::Maze,
            config,
            mazes,
            maze_index: 0,
            mirror,
            rx: None,
            commands: None,
            cancel,
            pacing,
            worker_status: WorkerStatus::Idle,
            selected: Algorithm::default(),
            running: None,
            last_metrics: None,
            generation: 0,
            telemetry: Telemetry::new(),
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            ledger: None,
        }
    }

    pub fn set_channels(&mut self, rx: Receiver<SolverEvent>, commands: Sender<Command>) {
        self.rx = Some(rx);
        self.commands = Some(commands);
    }

    pub fn set_ledger(&mut self, ledger: RunLedger) {
        self.ledger = Some(ledger);
    }

    pub fn grid(&self) -> Option<&Arc<Grid>> {
        self.mazes.get(self.maze_index)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn tick(&mut self) {
        let Some(rx) = self.rx.clone() else { return };
        for _ in 0..EVENTS_PER_TICK {
            match rx.try_recv() {
                Ok(evt) => self.handle_event(evt),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.worker_status = WorkerStatus::Disconnected;
                    self.running = None;
                    self.log("Worker disconnected.");
                    self.rx = None;
                    break;
                }
            }
        }
    }

    pub fn handle_event(&mut self, event: SolverEvent) {
        match event {
            SolverEvent::Log(msg) => self.log(msg),

            SolverEvent::Started { algorithm, rows, cols } => {
                if self.mirror.dims() != (rows, cols) {
                    self.mirror = RunState::new(rows, cols);
                }
                self.mirror.reset();
                self.running = Some(algorithm);
                self.worker_status = WorkerStatus::Running;
            }

            SolverEvent::Step { pos, exploring } => self.mirror.set_exploring(pos, exploring),

            SolverEvent::ClearTrail => self.mirror.clear_exploring(),

            SolverEvent::Snapshot(state) => self.mirror = *state,

            SolverEvent::GenerationUpdate(stats) => {
                self.generation = stats.generation;
                self.telemetry.ingest(&stats);
            }

            SolverEvent::Metrics { metrics, partial } => {
                if !partial {
                    self.log(format!(">>> {}", metrics));
                    self.record(&metrics);
                }
                self.last_metrics = Some(metrics);
            }

            SolverEvent::Finished { cancelled } => {
                self.running = None;
                self.worker_status = if cancelled { WorkerStatus::Cancelled } else { WorkerStatus::Finished };
            }
        }
    }

    fn record(&mut self, metrics: &Metrics) {
        let Some(ledger) = &self.ledger else { return };
        let maze = self.grid().map(|g| g.label().to_string()).unwrap_or_default();
        if let Err(e) = ledger.append(&maze, metrics) {
            self.log(format!("Ledger write failed: {:#}", e));
        }
    }

    /// Logs a message to the internal buffer.
    pub fn log(&mut self, msg: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    fn send(&mut self, cmd: Command) -> bool {
        let sent = self.commands.as_ref().map_or(false, |tx| tx.send(cmd).is_ok());
        if !sent {
            self.worker_status = WorkerStatus::Disconnected;
            self.log("Worker is not accepting commands.");
        }
        sent
    }

    // --- Controls ---

    /// Queues a run of the selected algorithm. Ignored while a run is active.
    pub fn request_run(&mut self) {
        if self.is_running() {
            return;
        }
        self.cancel.reset();
        self.mirror.reset();
        self.telemetry.clear();
        self.generation = 0;
        self.last_metrics = None;

        let algorithm = self.selected;
        if self.send(Command::Run(algorithm)) {
            self.running = Some(algorithm);
            self.worker_status = WorkerStatus::Running;
        }
    }

    pub fn cancel_run(&mut self) {
        if self.is_running() {
            self.cancel.cancel();
            self.log("Cancel requested.");
        }
    }

    /// Cancels any run and clears the view.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.mirror.reset();
        self.last_metrics = None;
        self.telemetry.clear();
        self.generation = 0;
    }

    /// Switches the worker to the next loaded maze. Refused mid-run.
    pub fn next_maze(&mut self) {
        if self.is_running() {
            self.log("Cannot switch maze while a run is active.");
            return;
        }
        if self.mazes.len() < 2 {
            return;
        }
        self.maze_index = (self.maze_index + 1) % self.mazes.len();
        let grid = self.mazes[self.maze_index].clone();
        self.mirror = RunState::for_grid(&grid);
        self.last_metrics = None;
        self.telemetry.clear();
        self.log(format!("Loaded maze {}", grid.label()));
        self.send(Command::SetGrid(grid));
    }

    pub fn adjust_delay(&mut self, faster: bool) {
        let cur = self.pacing.get();
        let next = if faster {
            cur.saturating_sub(DELAY_STEP_MS)
        } else {
            (cur + DELAY_STEP_MS).min(MAX_DELAY_MS)
        };
        self.pacing.set(next);
        self.config.delay_ms = next;
    }

    pub fn on_key(&mut self, key: char) {
        match key {
            'q' => self.should_quit = true,
            '1'..='5' => {
                if !self.is_running() {
                    let idx = key as usize - '1' as usize;
                    self.selected = Algorithm::ALL[idx];
                }
            }
            'r' | '\n' => self.request_run(),
            'c' => self.cancel_run(),
            'x' => self.reset(),
            'n' => self.next_maze(),
            '+' => self.adjust_delay(false),
            '-' => self.adjust_delay(true),
            'm' => self.mode = AppMode::Maze,
            'p' => self.mode = AppMode::Config,
            '?' | 'h' => {
                self.mode = if self.mode == AppMode::Help { AppMode::Maze } else { AppMode::Help };
            }
            _ => {}
        }
    }
}
