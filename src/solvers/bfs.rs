use std::collections::VecDeque;
use std::time::Instant;

use log::info;

use crate::core::error::SolverError;
use crate::core::grid::{Grid, RunState};
use crate::engine::animator::Animator;
use crate::engine::arena::NodeArena;
use crate::solvers::{Algorithm, Outcome};

/// Breadth-first search over open cells. Minimises hop count and ignores
/// weights, so the outcome never carries a cost.
pub fn solve(grid: &Grid, state: &mut RunState, animator: &Animator) -> Result<Outcome, SolverError> {
    state.ensure_matches(grid)?;
    let (start, goal) = grid.endpoints()?;
    info!("BFS from {:?} to {:?}", start, goal);

    let t0 = Instant::now();
    let mut queued = vec![false; grid.area()];
    let mut arena = NodeArena::with_capacity(grid.area());
    let mut queue = VecDeque::new();

    queued[grid.index(start)] = true;
    queue.push_back(arena.push(start, 0, None));

    let mut visited = 0;
    let mut weight_sum = 0;
    let mut end = None;

    while !animator.is_cancelled() {
        let Some(id) = queue.pop_front() else { break };
        let node = *arena.get(id);

        state.mark_visited(node.pos);
        visited += 1;
        weight_sum += grid.weight(node.pos);
        animator.record_step(state, node.pos, true);

        if node.pos == goal {
            end = Some(id);
            break;
        }

        for (_, nb) in grid.open_neighbors(node.pos) {
            let slot = &mut queued[grid.index(nb)];
            if !*slot {
                *slot = true;
                queue.push_back(arena.push(nb, node.cost + 1, Some(id)));
            }
        }
    }

    let elapsed = t0.elapsed();
    let cancelled = end.is_none() && animator.is_cancelled();
    let (steps, path) = match end {
        Some(id) => (Some(animator.materialize_path(state, &arena, id)), arena.path_to(id)),
        None => (None, Vec::new()),
    };

    Ok(Outcome {
        algorithm: Algorithm::Bfs,
        reached: end.is_some(),
        cancelled,
        cost: None,
        steps,
        visited,
        visited_weight_sum: Some(weight_sum),
        elapsed,
        path,
    })
}
