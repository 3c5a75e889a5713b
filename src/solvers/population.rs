use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::core::grid::{Grid, Pos, RunState};
use crate::engine::animator::Animator;
use crate::engine::evaluator::{Evaluation, Evaluator};
use crate::engine::operators::crossover_single_point;
use crate::solvers::{Algorithm, GenStats, Outcome};

/// A genome and the evaluation computed from exactly that genome.
/// The pair is never split once built.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub genome: Vec<u8>,
    pub eval: Evaluation,
}

/// Ranking rule applied after the reached-before-unreached split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Lower fitness first.
    Fitness,
    /// Finished routes by true route cost then length; unfinished by fitness.
    RouteThenLength,
}

pub fn compare(a: &Candidate, b: &Candidate, order: RankOrder) -> Ordering {
    let (ea, eb) = (&a.eval, &b.eval);
    match (ea.reached, eb.reached) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    match order {
        RankOrder::RouteThenLength if ea.reached => ea
            .route_cost
            .cmp(&eb.route_cost)
            .then(ea.path.len().cmp(&eb.path.len())),
        _ => ea.fitness.cmp(&eb.fitness),
    }
}

/// Stable sort, best first.
pub fn rank(pop: &mut [Candidate], order: RankOrder) {
    pop.sort_by(|a, b| compare(a, b, order));
}

/// Evaluates every genome in parallel. Each genome gets its own RNG stream
/// derived from `seed` and its index, so results do not depend on thread
/// scheduling.
pub fn evaluate_batch(evaluator: &dyn Evaluator, genomes: Vec<Vec<u8>>, seed: u64) -> Vec<Candidate> {
    genomes
        .into_par_iter()
        .enumerate()
        .map(|(i, genome)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed ^ (i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let eval = evaluator.evaluate(&genome, &mut rng);
            Candidate { genome, eval }
        })
        .collect()
}

/// Fills the next generation up to `target` with children of two parents
/// drawn from the top `parent_pool` ranked candidates.
pub fn breed<F>(
    ranked: &[Candidate],
    next: &mut Vec<Vec<u8>>,
    target: usize,
    parent_pool: usize,
    rng: &mut ChaCha8Rng,
    mut mutate: F,
) where
    F: FnMut(&mut Vec<u8>, &mut ChaCha8Rng),
{
    let pool = parent_pool.clamp(1, ranked.len().max(1));
    if ranked.is_empty() {
        return;
    }
    while next.len() < target {
        let p1 = &ranked[rng.gen_range(0..pool)].genome;
        let p2 = &ranked[rng.gen_range(0..pool)].genome;
        let mut child = crossover_single_point(p1, p2, rng);
        mutate(&mut child, rng);
        next.push(child);
    }
}

pub fn gen_stats(generation: usize, ranked: &[Candidate], stagnation: usize, restarts: usize) -> GenStats {
    let n = ranked.len();
    if n == 0 {
        return GenStats { generation, stagnation, restarts, ..Default::default() };
    }
    let sum: u64 = ranked.iter().map(|c| c.eval.fitness).sum();
    let worst = ranked.iter().map(|c| c.eval.fitness).max().unwrap_or(0);
    GenStats {
        generation,
        best_fitness: ranked[0].eval.fitness,
        avg_fitness: sum as f64 / n as f64,
        worst_fitness: worst,
        reached_count: ranked.iter().filter(|c| c.eval.reached).count(),
        pop_size: n,
        stagnation,
        restarts,
    }
}

/// Genome length for the goal-biased variant: the hop estimate scaled up on
/// large mazes, capped, and never shorter than `rows + cols`.
pub fn biased_genome_length(estimated_steps: usize, rows: usize, cols: usize) -> usize {
    let area = rows * cols;
    let scale = if area >= 2500 { 3.0 } else { 1.5 };
    let upper = (area / 2).max(300);
    let scaled = (estimated_steps as f64 * scale).round() as usize;
    scaled.min(upper).max(rows + cols)
}

/// Genome length for the unguided variant; much longer, since nothing
/// steers it.
pub fn pure_genome_length(estimated_steps: usize, rows: usize, cols: usize) -> usize {
    let est = estimated_steps.max(rows + cols);
    (est * 4).max((rows * cols).clamp(200, 800))
}

/// Removes loops from a walk: on revisiting a cell, everything since its
/// first visit is cut away.
pub fn loop_erase(path: &[Pos]) -> Vec<Pos> {
    let mut route: Vec<Pos> = Vec::with_capacity(path.len());
    let mut index: HashMap<Pos, usize> = HashMap::new();
    for &p in path {
        if let Some(&i) = index.get(&p) {
            for dropped in route.drain(i + 1..) {
                index.remove(&dropped);
            }
        } else {
            index.insert(p, route.len());
            route.push(p);
        }
    }
    route
}

/// Sum of entry weights, excluding the first cell.
pub fn route_cost(grid: &Grid, route: &[Pos]) -> u64 {
    route.iter().skip(1).map(|&p| grid.weight(p)).sum()
}

/// Distinct cells touched by any simulated walk during a run.
#[derive(Debug, Clone)]
pub struct Coverage {
    cols: usize,
    seen: Vec<bool>,
    count: usize,
}

impl Coverage {
    pub fn new(grid: &Grid) -> Self {
        Self { cols: grid.cols(), seen: vec![false; grid.area()], count: 0 }
    }

    pub fn extend(&mut self, path: &[Pos]) {
        for p in path {
            let slot = &mut self.seen[p.row * self.cols + p.col];
            if !*slot {
                *slot = true;
                self.count += 1;
            }
        }
    }

    /// Marks every open cell connected to `from`. Used when the goal is cut
    /// off, so the count matches the region an exhaustive search would see.
    pub fn flood(&mut self, grid: &Grid, from: Pos) {
        let mut queue = VecDeque::from([from]);
        self.extend(&[from]);
        while let Some(cur) = queue.pop_front() {
            for (_, nb) in grid.open_neighbors(cur) {
                let slot = &mut self.seen[nb.row * self.cols + nb.col];
                if !*slot {
                    *slot = true;
                    self.count += 1;
                    queue.push_back(nb);
                }
            }
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Clears the trail and replays `path` through the animator.
pub fn animate_route(animator: &Animator, state: &mut RunState, path: &[Pos]) {
    animator.clear_trail(state);
    for &pos in path {
        if animator.is_cancelled() {
            break;
        }
        animator.record_step(state, pos, true);
    }
}

/// Wipes the run state, marks the best route (if it reached the goal) and
/// builds the outcome. Cost and steps are measured on the loop-erased route.
pub fn finish(
    algorithm: Algorithm,
    grid: &Grid,
    state: &mut RunState,
    animator: &Animator,
    best: Option<&Candidate>,
    coverage: &Coverage,
    t0: Instant,
) -> Outcome {
    let elapsed = t0.elapsed();
    state.reset();

    let route = best
        .filter(|b| b.eval.reached)
        .map(|b| loop_erase(&b.eval.path))
        .unwrap_or_default();
    let reached = !route.is_empty();

    let (cost, steps) = if reached {
        let steps = animator.mark_route(state, &route);
        (Some(route_cost(grid, &route)), Some(steps))
    } else {
        (None, None)
    };

    Outcome {
        algorithm,
        reached,
        cancelled: animator.is_cancelled(),
        cost,
        steps,
        visited: coverage.count(),
        visited_weight_sum: None,
        elapsed,
        path: route,
    }
}
