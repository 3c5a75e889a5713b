use crate::core::error::SolverError;
use crate::core::grid::{Grid, RunState};
use crate::engine::animator::Animator;
use crate::solvers::dijkstra::best_first;
use crate::solvers::{Algorithm, Outcome};

/// Heuristic search ordered by `cost + manhattan(pos, goal)`.
///
/// Shares the uniform-cost frontier, closed set included: a finalised cell is
/// never reopened. Entry weights are at least 1 and Manhattan distance drops
/// by exactly one per move, so the estimate never overshoots and the
/// reported cost matches the uniform-cost optimum.
pub fn solve(grid: &Grid, state: &mut RunState, animator: &Animator) -> Result<Outcome, SolverError> {
    let (_, goal) = grid.endpoints()?;
    best_first(grid, state, animator, Algorithm::AStar, |p| p.manhattan(goal) as u64)
}
