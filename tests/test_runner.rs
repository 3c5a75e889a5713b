use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use maze_runner::analysis::ledger::RunLedger;
use maze_runner::core::config::SolverConfig;
use maze_runner::core::error::SolverError;
use maze_runner::core::grid::Pos;
use maze_runner::engine::control::{CancelToken, Pacing};
use maze_runner::interface::logging::{trace_level, LogBridge};
use maze_runner::interface::state::{AppState, WorkerStatus};
use maze_runner::solvers::runner::{Command, Runner};
use maze_runner::solvers::{Algorithm, Metrics, SolverEvent};
use log::{Level, LevelFilter, Log, Record};
use tracing_subscriber::filter::LevelFilter as TraceLevel;
use uuid::Uuid;

mod common;

use crate::common::{fast_config, grid, CORRIDOR, ENCLOSED, OPEN_UNIFORM, WEIGHTED};

fn temp_path(ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("maze_runner_{}.{}", Uuid::new_v4(), ext))
}

#[test]
fn test_algorithm_names() {
    for algo in Algorithm::ALL {
        assert_eq!(algo.label().parse::<Algorithm>().unwrap(), algo);
    }
    assert_eq!(Algorithm::default(), Algorithm::Dijkstra);
    assert!("Astar".parse::<Algorithm>().is_err());
    assert!("dijkstra".parse::<Algorithm>().is_err());
    assert!(Algorithm::Genetic.is_genetic());
    assert!(!Algorithm::Bfs.is_genetic());
}

#[test]
fn test_run_event_sequence() {
    let g = Arc::new(grid(CORRIDOR));
    let (tx, rx) = unbounded();
    let mut runner = Runner::new(g, fast_config(), tx);

    let out = runner.run(Algorithm::Dijkstra).unwrap();
    assert_eq!(out.steps, Some(4));

    let events: Vec<SolverEvent> = rx.try_iter().collect();
    assert!(matches!(
        events.first(),
        Some(SolverEvent::Started { algorithm: Algorithm::Dijkstra, rows: 5, cols: 5 })
    ));
    assert!(matches!(events.last(), Some(SolverEvent::Finished { cancelled: false })));

    let finals: Vec<&Metrics> = events
        .iter()
        .filter_map(|e| match e {
            SolverEvent::Metrics { metrics, partial: false } => Some(metrics),
            _ => None,
        })
        .collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].cost, Some(4));
    assert_eq!(finals[0].steps, Some(4));
    assert_eq!(finals[0].visited, Some(5));

    let snapshot = events.iter().find_map(|e| match e {
        SolverEvent::Snapshot(s) => Some(s),
        _ => None,
    });
    let snapshot = snapshot.expect("snapshot sent");
    assert_eq!(snapshot.result_count(), 5);
    assert_eq!(runner.state(), snapshot.as_ref());
}

#[test]
fn test_run_resets_previous_marks() {
    let g = Arc::new(grid(OPEN_UNIFORM));
    let (tx, _rx) = unbounded();
    let mut runner = Runner::new(g, fast_config(), tx);

    runner.run(Algorithm::Bfs).unwrap();
    let first = runner.state().visited_count();
    let out = runner.run(Algorithm::AStar).unwrap();
    assert_eq!(runner.state().visited_count(), out.visited);
    assert!(first > 0);
}

#[test]
fn test_unsolvable_maze_reports_no_solution() {
    let g = Arc::new(grid(ENCLOSED));
    let (tx, rx) = unbounded();
    let mut runner = Runner::new(g, fast_config(), tx);

    let out = runner.run(Algorithm::Bfs).unwrap();
    assert!(!out.reached);

    let events: Vec<SolverEvent> = rx.try_iter().collect();
    assert!(events.iter().any(|e| matches!(e, SolverEvent::Log(m) if m.contains("no solution"))));
    assert!(events.iter().any(|e| matches!(
        e,
        SolverEvent::Metrics { metrics: Metrics { cost: None, steps: None, .. }, partial: false }
    )));
}

#[test]
fn test_missing_start_still_finishes() {
    let g = Arc::new(grid("\"1\" \"1\" G\n"));
    let (tx, rx) = unbounded();
    let mut runner = Runner::new(g, fast_config(), tx);

    for algo in Algorithm::ALL {
        assert_eq!(runner.run(algo).unwrap_err(), SolverError::MissingStart);
    }

    let events: Vec<SolverEvent> = rx.try_iter().collect();
    let finished = events.iter().filter(|e| matches!(e, SolverEvent::Finished { .. })).count();
    assert_eq!(finished, 5);
    assert!(!events.iter().any(|e| matches!(e, SolverEvent::Metrics { .. })));
}

#[test]
fn test_cancelled_run_sends_no_metrics() {
    let g = Arc::new(grid(OPEN_UNIFORM));
    let (tx, rx) = unbounded();
    let mut runner = Runner::new(g, fast_config(), tx);

    runner.cancel_token().cancel();
    let out = runner.run(Algorithm::Dijkstra).unwrap();
    assert!(out.cancelled);

    let events: Vec<SolverEvent> = rx.try_iter().collect();
    assert!(!events.iter().any(|e| matches!(e, SolverEvent::Metrics { .. })));
    assert!(matches!(events.last(), Some(SolverEvent::Finished { cancelled: true })));
}

#[test]
fn test_serve_processes_commands_in_order() {
    let first = Arc::new(grid(WEIGHTED));
    let second = Arc::new(grid(OPEN_UNIFORM));
    let (tx, rx) = unbounded();
    let (cmd_tx, cmd_rx) = unbounded();

    let runner = Runner::new(first, fast_config(), tx);
    let worker = thread::spawn(move || runner.serve(cmd_rx));

    cmd_tx.send(Command::Run(Algorithm::Bfs)).unwrap();
    cmd_tx.send(Command::SetGrid(second)).unwrap();
    cmd_tx.send(Command::SetConfig(SolverConfig { delay_ms: 0, ..fast_config() })).unwrap();
    cmd_tx.send(Command::Run(Algorithm::Dijkstra)).unwrap();
    cmd_tx.send(Command::Shutdown).unwrap();
    worker.join().unwrap();

    let started: Vec<(Algorithm, usize, usize)> = rx
        .try_iter()
        .filter_map(|e| match e {
            SolverEvent::Started { algorithm, rows, cols } => Some((algorithm, rows, cols)),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![(Algorithm::Bfs, 4, 4), (Algorithm::Dijkstra, 5, 5)]);
}

#[test]
fn test_log_bridge_filters_and_forwards() {
    let (tx, rx) = unbounded();
    let bridge = LogBridge::new(tx, LevelFilter::Info);

    bridge.log(&Record::builder().level(Level::Debug).target("ga").args(format_args!("hidden")).build());
    bridge.log(&Record::builder().level(Level::Warn).target("ga").args(format_args!("shown")).build());

    let lines: Vec<String> = rx
        .try_iter()
        .filter_map(|e| match e {
            SolverEvent::Log(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(lines, vec!["[WARN] ga: shown".to_string()]);
}

#[test]
fn test_stderr_levels_follow_cli_levels() {
    assert_eq!(trace_level(LevelFilter::Off), TraceLevel::OFF);
    assert_eq!(trace_level(LevelFilter::Warn), TraceLevel::WARN);
    assert_eq!(trace_level(LevelFilter::Trace), TraceLevel::TRACE);
}

#[test]
fn test_deadline_fires_while_armed() {
    let cancel = CancelToken::new();
    let deadline = cancel.cancel_after(Duration::from_millis(20));
    thread::sleep(Duration::from_millis(200));
    assert!(cancel.is_cancelled());
    drop(deadline);
}

#[test]
fn test_dropped_deadline_never_reaches_next_run() {
    let g = Arc::new(grid(CORRIDOR));
    let (tx, _rx) = unbounded();
    let mut runner = Runner::new(g, fast_config(), tx);
    let cancel = runner.cancel_token();

    // A fast first run disarms its timer on completion
    let deadline = cancel.cancel_after(Duration::from_millis(100));
    assert!(!runner.run(Algorithm::Bfs).unwrap().cancelled);
    drop(deadline);

    thread::sleep(Duration::from_millis(250));
    assert!(!cancel.is_cancelled());

    cancel.reset();
    let out = runner.run(Algorithm::Dijkstra).unwrap();
    assert!(!out.cancelled);
    assert!(out.reached);
}

#[test]
fn test_config_normalization() {
    let cfg = SolverConfig {
        delay_ms: 5000,
        population_size: 2,
        elitism_count: 50,
        generations: 0,
        mutation_rate: 3.0,
        goal_bias: -1.0,
        animate_every: 0,
        report_every: 0,
        ..SolverConfig::default()
    }
    .normalized();

    assert_eq!(cfg.delay_ms, 200);
    assert_eq!(cfg.population_size, 10);
    assert_eq!(cfg.elitism_count, 9);
    assert_eq!(cfg.generations, 1);
    assert_eq!(cfg.mutation_rate, 1.0);
    assert_eq!(cfg.goal_bias, 0.0);
    assert_eq!(cfg.animate_every, 1);
    assert_eq!(cfg.report_every, 1);
}

#[test]
fn test_config_loads_partial_json() {
    let path = temp_path("json");
    fs::write(&path, r#"{ "population_size": 80, "seed": 9 }"#).unwrap();

    let cfg = SolverConfig::load(&path).unwrap();
    assert_eq!(cfg.population_size, 80);
    assert_eq!(cfg.seed, 9);
    assert_eq!(cfg.generations, SolverConfig::default().generations);

    fs::remove_file(&path).ok();
    assert!(SolverConfig::load(&path).is_err());
}

#[test]
fn test_ledger_round_trip() {
    let path = temp_path("csv");
    let ledger = RunLedger::new(&path);
    let metrics = Metrics {
        algorithm: Algorithm::AStar,
        cost: Some(12),
        steps: Some(9),
        visited: Some(30),
        elapsed_ms: 4,
        visited_weight_sum: Some(41),
    };
    let ga_metrics = Metrics {
        algorithm: Algorithm::Genetic,
        cost: None,
        steps: None,
        visited: Some(7),
        elapsed_ms: 120,
        visited_weight_sum: None,
    };

    let id = ledger.append("a.maze", &metrics).unwrap();
    ledger.append("b.maze", &ga_metrics).unwrap();

    let rows = ledger.read_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].run_id, id);
    assert_eq!(rows[0].algorithm, "A*");
    assert_eq!(rows[0].cost, Some(12));
    assert_eq!(rows[1].maze, "b.maze");
    assert_eq!(rows[1].cost, None);
    assert_eq!(rows[1].visited_weight_sum, None);

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("run_id").count(), 1);
    fs::remove_file(&path).ok();
}

// --- Presentation state ---

fn app() -> (AppState, crossbeam_channel::Sender<SolverEvent>, crossbeam_channel::Receiver<Command>) {
    let mazes = vec![Arc::new(grid(CORRIDOR)), Arc::new(grid(OPEN_UNIFORM))];
    let mut app = AppState::new(mazes, fast_config(), CancelToken::new(), Pacing::new(10));
    let (tx, rx) = unbounded();
    let (cmd_tx, cmd_rx) = unbounded();
    app.set_channels(rx, cmd_tx);
    (app, tx, cmd_rx)
}

#[test]
fn test_app_mirrors_event_stream() {
    let (mut app, tx, _cmds) = app();
    let p = Pos::new(0, 1);

    tx.send(SolverEvent::Started { algorithm: Algorithm::Bfs, rows: 5, cols: 5 }).unwrap();
    tx.send(SolverEvent::Step { pos: p, exploring: true }).unwrap();
    app.tick();
    assert!(app.mirror.is_exploring(p));
    assert_eq!(app.worker_status, WorkerStatus::Running);
    assert_eq!(app.running, Some(Algorithm::Bfs));

    tx.send(SolverEvent::ClearTrail).unwrap();
    tx.send(SolverEvent::Finished { cancelled: false }).unwrap();
    app.tick();
    assert!(!app.mirror.is_exploring(p));
    assert_eq!(app.worker_status, WorkerStatus::Finished);
    assert!(!app.is_running());
}

#[test]
fn test_app_keys_queue_commands() {
    let (mut app, _tx, cmds) = app();
    app.cancel.cancel();

    app.on_key('2');
    assert_eq!(app.selected, Algorithm::AStar);
    app.on_key('r');
    assert!(!app.cancel.is_cancelled());
    assert!(matches!(cmds.try_recv(), Ok(Command::Run(Algorithm::AStar))));

    // Busy: selection, runs and maze switches are refused
    app.on_key('4');
    app.on_key('r');
    app.on_key('n');
    assert_eq!(app.selected, Algorithm::AStar);
    assert!(cmds.try_recv().is_err());

    app.on_key('c');
    assert!(app.cancel.is_cancelled());

    app.handle_event(SolverEvent::Finished { cancelled: true });
    assert_eq!(app.worker_status, WorkerStatus::Cancelled);

    app.on_key('n');
    assert_eq!(app.maze_index, 1);
    assert!(matches!(cmds.try_recv(), Ok(Command::SetGrid(_))));
    assert_eq!(app.mirror.dims(), (5, 5));

    app.on_key('q');
    assert!(app.should_quit);
}

#[test]
fn test_app_delay_controls() {
    let (mut app, _tx, _cmds) = app();
    app.on_key('-');
    assert_eq!(app.pacing.get(), 5);
    app.on_key('-');
    app.on_key('-');
    assert_eq!(app.pacing.get(), 0);

    for _ in 0..100 {
        app.on_key('+');
    }
    assert_eq!(app.pacing.get(), 200);
    assert_eq!(app.config.delay_ms, 200);
}

#[test]
fn test_app_records_final_metrics() {
    let (mut app, _tx, _cmds) = app();
    let path = temp_path("csv");
    app.set_ledger(RunLedger::new(&path));

    let metrics = Metrics {
        algorithm: Algorithm::Bfs,
        cost: None,
        steps: Some(4),
        visited: Some(5),
        elapsed_ms: 1,
        visited_weight_sum: Some(5),
    };
    app.handle_event(SolverEvent::Metrics { metrics: metrics.clone(), partial: true });
    app.handle_event(SolverEvent::Metrics { metrics, partial: false });

    let rows = RunLedger::new(&path).read_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].steps, Some(4));
    assert!(app.last_metrics.is_some());
    fs::remove_file(&path).ok();
}
