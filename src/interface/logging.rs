use crossbeam_channel::Sender;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use tracing_subscriber::filter::LevelFilter as TraceLevel;

use crate::solvers::SolverEvent;

/// Bridges the `log` facade into the TUI log panel via the solver event
/// channel.
#[derive(Debug)]
pub struct LogBridge {
    tx: Sender<SolverEvent>,
    level: LevelFilter,
}

impl LogBridge {
    pub fn new(tx: Sender<SolverEvent>, level: LevelFilter) -> Self {
        Self { tx, level }
    }

    /// Installs the bridge as the global logger.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_logger(Box::leak(Box::new(self)))?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn format(record: &Record) -> String {
        format!("[{}] {}: {}", record.level(), record.target(), record.args())
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = self.tx.send(SolverEvent::Log(Self::format(record)));
    }

    fn flush(&self) {}
}

pub fn trace_level(level: LevelFilter) -> TraceLevel {
    match level {
        LevelFilter::Off => TraceLevel::OFF,
        LevelFilter::Error => TraceLevel::ERROR,
        LevelFilter::Warn => TraceLevel::WARN,
        LevelFilter::Info => TraceLevel::INFO,
        LevelFilter::Debug => TraceLevel::DEBUG,
        LevelFilter::Trace => TraceLevel::TRACE,
    }
}

/// Headless logging: a `tracing` fmt subscriber on stderr. `log` records
/// reach it through the subscriber's `tracing-log` bridge.
pub fn init_stderr(level: LevelFilter) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(trace_level(level))
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}
