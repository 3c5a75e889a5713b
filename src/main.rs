use std::error::Error;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, LevelFilter};
use ratatui::{backend::CrosstermBackend, Terminal};

use maze_runner::analysis::ledger::RunLedger;
use maze_runner::core::config::SolverConfig;
use maze_runner::core::grid::Grid;
use maze_runner::interface::logging::{self, LogBridge};
use maze_runner::interface::state::AppState;
use maze_runner::interface::ui;
use maze_runner::solvers::runner::{Command, Runner};
use maze_runner::solvers::{Algorithm, SolverEvent};

const TUI_DEFAULT_DELAY_MS: u64 = 15;

// --- CLI Definitions ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Maze Runner: weighted maze solving with classical search and genetic algorithms", long_about = None)]
struct Args {
    /// Maze files to load (the first one is shown at startup)
    #[arg(required = true)]
    mazes: Vec<PathBuf>,

    /// Algorithm to run (Dijkstra, A*, BFS, Genetic, PureGA)
    #[arg(short, long, default_value = "Dijkstra")]
    algo: String,

    /// JSON file with solver parameters; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Animation delay per step in milliseconds (0-200)
    #[arg(short, long)]
    delay: Option<u64>,

    /// GA population size
    #[arg(short, long)]
    population: Option<usize>,

    /// GA generation cap
    #[arg(short, long)]
    generations: Option<usize>,

    /// GA per-gene mutation rate
    #[arg(short, long)]
    mutation: Option<f64>,

    /// Probability that the goal-biased GA follows the distance map
    #[arg(long)]
    goal_bias: Option<f64>,

    /// Number of elites carried unchanged into the next generation
    #[arg(short, long)]
    elitism: Option<usize>,

    /// Seed for the GA random streams
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of worker threads for parallel GA evaluation
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Run every maze once without the TUI and print the metrics
    #[arg(long)]
    headless: bool,

    /// Cancel a headless run after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Append final metrics of every run to this CSV file
    #[arg(long)]
    record: Option<PathBuf>,

    /// Log verbosity (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

impl Args {
    fn solver_config(&self) -> Result<SolverConfig> {
        let mut cfg = match &self.config {
            Some(path) => SolverConfig::load(path)?,
            None => SolverConfig {
                delay_ms: if self.headless { 0 } else { TUI_DEFAULT_DELAY_MS },
                ..SolverConfig::default()
            },
        };

        if let Some(v) = self.delay { cfg.delay_ms = v; }
        if let Some(v) = self.population { cfg.population_size = v; }
        if let Some(v) = self.generations { cfg.generations = v; }
        if let Some(v) = self.mutation { cfg.mutation_rate = v; }
        if let Some(v) = self.goal_bias { cfg.goal_bias = v; }
        if let Some(v) = self.elitism { cfg.elitism_count = v; }
        if let Some(v) = self.seed { cfg.seed = v; }

        Ok(cfg.normalized())
    }
}

// --- Terminal Guard (RAII) ---

struct TuiContext {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TuiContext {
    fn new() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to setup terminal alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("Failed to create terminal backend")?;
        Ok(Self { terminal })
    }
}

impl Drop for TuiContext {
    fn drop(&mut self) {
        // Best-effort restoration of terminal state
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

// --- Initialization Helpers ---

fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Forcefully restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));
}

fn load_mazes(paths: &[PathBuf]) -> Result<Vec<Arc<Grid>>> {
    paths
        .iter()
        .map(|p| {
            Grid::load(p)
                .map(Arc::new)
                .with_context(|| format!("Failed to load maze {}", p.display()))
        })
        .collect()
}

// --- Headless Mode ---

fn run_headless(args: &Args, algorithm: Algorithm, config: SolverConfig, mazes: Vec<Arc<Grid>>) -> Result<()> {
    logging::init_stderr(args.log_level)?;

    let ledger = args.record.clone().map(RunLedger::new);
    let (tx, rx) = unbounded();

    // Drain the event stream so step events never pile up.
    let printer = thread::Builder::new()
        .name("Event-Printer".to_string())
        .spawn(move || {
            for evt in rx {
                if let SolverEvent::Log(msg) = evt {
                    eprintln!("{}", msg);
                }
            }
        })?;

    let mut runner = Runner::new(mazes[0].clone(), config, tx);
    let cancel = runner.cancel_token();

    for grid in mazes {
        runner.set_grid(grid.clone());
        cancel.reset();

        let deadline = args.timeout_secs.map(|secs| cancel.cancel_after(Duration::from_secs(secs)));
        let result = runner.run(algorithm);
        drop(deadline);

        match result {
            Ok(outcome) => {
                let metrics = outcome.metrics();
                println!("{}\t{}{}", grid.label(), metrics, if outcome.cancelled { " (cancelled)" } else { "" });
                if let (Some(ledger), false) = (&ledger, outcome.cancelled) {
                    let id = ledger.append(grid.label(), &metrics)?;
                    info!("Recorded run {} in {}", id, ledger.path().display());
                }
            }
            Err(e) => eprintln!("{}\t{}: {}", grid.label(), algorithm, e),
        }
    }

    drop(runner);
    let _ = printer.join();
    Ok(())
}

// --- Main ---

fn main() -> Result<(), Box<dyn Error>> {
    // 1. Safety & Parsing
    let args = Args::parse();

    // 2. Configuration
    let algorithm: Algorithm = args.algo.parse()?;
    let config = args.solver_config()?;
    let mazes = load_mazes(&args.mazes)?;

    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global();

    if args.headless {
        run_headless(&args, algorithm, config, mazes)?;
        return Ok(());
    }

    setup_panic_hook();

    // 3. Spawn Solver Thread
    let (tx, rx) = unbounded();
    let (cmd_tx, cmd_rx) = unbounded();

    LogBridge::new(tx.clone(), args.log_level)
        .install()
        .map_err(|e| anyhow!("Failed to install logger: {}", e))?;

    let runner = Runner::new(mazes[0].clone(), config.clone(), tx);
    let cancel = runner.cancel_token();
    let pacing = runner.pacing();

    let worker = thread::Builder::new()
        .name("Solver-Worker".to_string())
        .spawn(move || runner.serve(cmd_rx))?;

    // 4. Setup TUI & App State
    let mut tui = TuiContext::new().context("Failed to initialize TUI")?;
    let mut app = AppState::new(mazes, config, cancel.clone(), pacing);
    app.set_channels(rx, cmd_tx.clone());
    app.selected = algorithm;
    if let Some(path) = &args.record {
        app.set_ledger(RunLedger::new(path));
    }
    app.log(format!("Loaded {} maze(s). Press r to run {}.", app.mazes.len(), algorithm));

    // 5. Event Loop
    let tick_rate = Duration::from_millis(50); // 20 FPS
    let mut last_tick = Instant::now();

    while !app.should_quit {
        // Draw
        tui.terminal.draw(|f| ui::draw(f, &mut app))?;

        // Handle Input
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == event::KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char(c) => app.on_key(c),
                        KeyCode::Enter => app.request_run(),
                        KeyCode::Esc => app.should_quit = true,
                        _ => {}
                    }
                }
            }
        }

        // Logic Tick
        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }

    // 6. Shutdown
    cancel.cancel();
    let _ = cmd_tx.send(Command::Shutdown);
    drop(app);
    let _ = worker.join();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_flag() {
        let args = Args::try_parse_from(["maze_runner", "a.maze", "--log-level", "debug"]).unwrap();
        assert_eq!(args.log_level, LevelFilter::Debug);

        let args = Args::try_parse_from(["maze_runner", "a.maze"]).unwrap();
        assert_eq!(args.log_level, LevelFilter::Info);

        assert!(Args::try_parse_from(["maze_runner", "a.maze", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_headless_config_has_no_delay() {
        let args = Args::try_parse_from(["maze_runner", "a.maze", "--headless", "-p", "40"]).unwrap();
        let cfg = args.solver_config().unwrap();
        assert_eq!(cfg.delay_ms, 0);
        assert_eq!(cfg.population_size, 40);
    }
}
