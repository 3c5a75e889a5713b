use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::core::error::ParseAlgorithmError;
use crate::core::grid::{Pos, RunState};

/// The five solving strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
    Bfs,
    Genetic,
    PureGa,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Dijkstra,
        Algorithm::AStar,
        Algorithm::Bfs,
        Algorithm::Genetic,
        Algorithm::PureGa,
    ];

    /// The display name, also accepted by `from_str`.
    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "Dijkstra",
            Algorithm::AStar => "A*",
            Algorithm::Bfs => "BFS",
            Algorithm::Genetic => "Genetic",
            Algorithm::PureGa => "PureGA",
        }
    }

    pub fn is_genetic(self) -> bool {
        matches!(self, Algorithm::Genetic | Algorithm::PureGa)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    /// Case-sensitive; unknown names are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.label() == s)
            .ok_or_else(|| ParseAlgorithmError(s.to_string()))
    }
}

/// Detailed statistics for a single GA generation.
/// Used for telemetry and UI visualization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenStats {
    pub generation: usize,
    pub best_fitness: u64,
    pub avg_fitness: f64,
    pub worst_fitness: u64,
    pub reached_count: usize, // Candidates whose walk ended on the goal
    pub pop_size: usize,
    pub stagnation: usize,
    pub restarts: usize,
}

/// The metrics report handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub algorithm: Algorithm,
    pub cost: Option<u64>,
    pub steps: Option<usize>,
    pub visited: Option<usize>,
    pub elapsed_ms: u64,
    /// Sum of weights over every finalised cell, the start (weight 1)
    /// included. Absent for the genetic solvers.
    pub visited_weight_sum: Option<u64>,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map_or_else(|| "-".to_string(), |x| x.to_string())
        }
        write!(
            f,
            "{}: cost={} steps={} visited={} time={}ms visited_weight={}",
            self.algorithm,
            opt(&self.cost),
            opt(&self.steps),
            opt(&self.visited),
            self.elapsed_ms,
            opt(&self.visited_weight_sum),
        )
    }
}

/// What a solver hands back when it stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub algorithm: Algorithm,
    pub reached: bool,
    pub cancelled: bool,
    pub cost: Option<u64>,
    /// Moves on the final route (cells on the route minus one).
    pub steps: Option<usize>,
    pub visited: usize,
    /// See [`Metrics::visited_weight_sum`].
    pub visited_weight_sum: Option<u64>,
    pub elapsed: Duration,
    /// The final route from start to goal; empty when unreached.
    pub path: Vec<Pos>,
}

impl Outcome {
    pub fn metrics(&self) -> Metrics {
        Metrics {
            algorithm: self.algorithm,
            cost: self.cost,
            steps: self.steps,
            visited: Some(self.visited),
            elapsed_ms: self.elapsed.as_millis() as u64,
            visited_weight_sum: self.visited_weight_sum,
        }
    }
}

/// Events emitted by a run to the presentation layer.
#[derive(Debug, Clone)]
pub enum SolverEvent {
    /// Diagnostic log message.
    Log(String),

    /// A run began on a grid of the given size.
    Started {
        algorithm: Algorithm,
        rows: usize,
        cols: usize,
    },

    /// An animated step: set or clear the exploring mark on a cell.
    Step { pos: Pos, exploring: bool },

    /// All exploring marks were cleared.
    ClearTrail,

    /// Full run state, sent when a run ends.
    Snapshot(Box<RunState>),

    /// A completed GA generation with statistics.
    GenerationUpdate(GenStats),

    /// A metrics report; `partial` for periodic GA updates.
    Metrics { metrics: Metrics, partial: bool },

    /// The run has ended.
    Finished { cancelled: bool },
}

pub mod astar;
pub mod bfs;
pub mod dijkstra;
pub mod ga;
pub mod population;
pub mod pure_ga;
pub mod runner;
