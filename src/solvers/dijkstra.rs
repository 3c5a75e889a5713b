use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

use log::info;

use crate::core::error::SolverError;
use crate::core::grid::{Grid, Pos, RunState};
use crate::engine::animator::Animator;
use crate::engine::arena::NodeArena;
use crate::solvers::{Algorithm, Outcome};

/// Uniform-cost search keyed by cumulative entry weight.
pub fn solve(grid: &Grid, state: &mut RunState, animator: &Animator) -> Result<Outcome, SolverError> {
    best_first(grid, state, animator, Algorithm::Dijkstra, |_| 0)
}

/// Shared frontier loop for the weighted solvers.
///
/// Entries are ordered by `cost + heuristic(pos)`, ties broken by insertion
/// order. Relaxation pushes a fresh entry instead of decreasing a key, so a
/// popped entry is skipped when its cell is already finalised or a cheaper
/// entry for it has been recorded since. Finalised cells are never reopened.
pub(crate) fn best_first<H>(
    grid: &Grid,
    state: &mut RunState,
    animator: &Animator,
    algorithm: Algorithm,
    heuristic: H,
) -> Result<Outcome, SolverError>
where
    H: Fn(Pos) -> u64,
{
    state.ensure_matches(grid)?;
    let (start, goal) = grid.endpoints()?;
    info!("{} search from {:?} to {:?}", algorithm, start, goal);

    let t0 = Instant::now();
    let mut dist = vec![u64::MAX; grid.area()];
    let mut arena = NodeArena::with_capacity(grid.area());
    let mut open = BinaryHeap::new();
    let mut seq: u64 = 0;

    dist[grid.index(start)] = 0;
    let root = arena.push(start, 0, None);
    open.push(Reverse((heuristic(start), seq, root)));

    let mut visited = 0;
    let mut weight_sum = 0;
    let mut end = None;

    while !animator.is_cancelled() {
        let Some(Reverse((_, _, id))) = open.pop() else { break };
        let node = *arena.get(id);
        if state.is_visited(node.pos) || node.cost > dist[grid.index(node.pos)] {
            continue;
        }

        state.mark_visited(node.pos);
        visited += 1;
        weight_sum += grid.weight(node.pos);
        animator.record_step(state, node.pos, true);

        if node.pos == goal {
            end = Some(id);
            break;
        }

        for (_, nb) in grid.open_neighbors(node.pos) {
            if state.is_visited(nb) {
                continue;
            }
            let cost = node.cost + grid.weight(nb);
            let slot = &mut dist[grid.index(nb)];
            if cost < *slot {
                *slot = cost;
                let child = arena.push(nb, cost, Some(id));
                seq += 1;
                open.push(Reverse((cost + heuristic(nb), seq, child)));
            }
        }
    }

    let elapsed = t0.elapsed();
    let cancelled = end.is_none() && animator.is_cancelled();

    let outcome = match end {
        Some(id) => {
            let steps = animator.materialize_path(state, &arena, id);
            Outcome {
                algorithm,
                reached: true,
                cancelled: false,
                cost: Some(arena.get(id).cost),
                steps: Some(steps),
                visited,
                visited_weight_sum: Some(weight_sum),
                elapsed,
                path: arena.path_to(id),
            }
        }
        None => Outcome {
            algorithm,
            reached: false,
            cancelled,
            cost: None,
            steps: None,
            visited,
            visited_weight_sum: Some(weight_sum),
            elapsed,
            path: Vec::new(),
        },
    };
    Ok(outcome)
}
