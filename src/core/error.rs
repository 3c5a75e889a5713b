use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading a maze from its text form.
#[derive(Debug, Error)]
pub enum MazeError {
    #[error("Invalid file path: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Maze is empty")]
    Empty,

    #[error("Invalid maze row length at line {line}: expected {expected} cells, got {found}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid token {token:?} at line {line}, column {column}")]
    InvalidToken {
        line: usize,
        column: usize,
        token: String,
    },

    #[error("Duplicate {kind} cell at line {line}, column {column}")]
    Duplicate {
        kind: &'static str,
        line: usize,
        column: usize,
    },
}

/// Failures that stop a solver before any search begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolverError {
    #[error("No start position 'S' found in maze")]
    MissingStart,

    #[error("No goal position 'G' found in maze")]
    MissingGoal,

    #[error("Run state is {found:?} but the grid is {expected:?}")]
    StateMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// An algorithm name outside the supported set.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown algorithm {0:?}; expected one of Dijkstra, A*, BFS, Genetic, PureGA")]
pub struct ParseAlgorithmError(pub String);
