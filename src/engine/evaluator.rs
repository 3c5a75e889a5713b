use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::grid::{Direction, Grid, Pos};
use crate::engine::operators::Guide;

pub const INVALID_MOVE_PENALTY: u64 = 50;
pub const REVISIT_PENALTY: u64 = 2;
/// Per-hop weight of the remaining-distance penalty (goal-biased).
pub const BIASED_DISTANCE_WEIGHT: u64 = 120;
/// Per-hop weight of the remaining-distance penalty (random walk).
pub const RANDOM_DISTANCE_WEIGHT: u64 = 200;
/// Multiplier applied when the end cell cannot reach the goal at all.
pub const UNREACHABLE_SCALE: u64 = 5;

/// The result of simulating one genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Selection score, lower is better.
    pub fitness: u64,
    /// Sum of entry weights along the walk.
    pub route_cost: u64,
    /// Cells visited in order, starting with the entrance.
    pub path: Vec<Pos>,
    pub reached: bool,
}

/// Scores genomes against a maze. Implementations must be thread-safe,
/// populations are evaluated in parallel.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, genome: &[u8], rng: &mut ChaCha8Rng) -> Evaluation;

    fn name(&self) -> &str;
}

/// Raw outcome of walking a genome before the remaining-distance term.
#[derive(Debug, Clone)]
pub struct Walk {
    pub route_cost: u64,
    pub penalty: u64,
    pub path: Vec<Pos>,
    pub end: Pos,
    pub reached: bool,
}

/// Walks `genome` from `start`. `pick` chooses the move for each gene.
/// Blocked moves cost [`INVALID_MOVE_PENALTY`] and leave the walker in place;
/// re-entering a cell already seen costs [`REVISIT_PENALTY`] on top of its
/// weight. The walk stops as soon as it enters `goal`.
pub fn simulate<F>(grid: &Grid, start: Pos, goal: Pos, genome: &[u8], mut pick: F) -> Walk
where
    F: FnMut(Pos, u8) -> Direction,
{
    let mut seen = vec![false; grid.area()];
    let mut pos = start;
    let mut route_cost = 0;
    let mut penalty = 0;
    let mut path = Vec::with_capacity(genome.len() + 1);

    path.push(pos);
    seen[grid.index(pos)] = true;

    if pos != goal {
        for &gene in genome {
            let dir = pick(pos, gene);
            let Some(next) = grid.step(pos, dir) else {
                penalty += INVALID_MOVE_PENALTY;
                continue;
            };
            pos = next;
            route_cost += grid.weight(pos);

            let slot = &mut seen[grid.index(pos)];
            if *slot {
                penalty += REVISIT_PENALTY;
            } else {
                *slot = true;
            }
            path.push(pos);

            if pos == goal {
                break;
            }
        }
    }

    Walk {
        route_cost,
        penalty,
        path,
        end: pos,
        reached: pos == goal,
    }
}

/// Goal-biased scoring: each gene may be overridden by a move that descends
/// the distance map, and unfinished walks pay for their remaining hops.
pub struct GoalBiasedEvaluator<'a> {
    guide: &'a Guide<'a>,
    goal_bias: f64,
}

impl<'a> GoalBiasedEvaluator<'a> {
    pub fn new(guide: &'a Guide<'a>, goal_bias: f64) -> Self {
        Self { guide, goal_bias }
    }

    fn remaining(&self, end: Pos) -> u64 {
        match self.guide.distances.get(end) {
            Some(d) => d as u64,
            None => end.manhattan(self.guide.goal) as u64 * UNREACHABLE_SCALE,
        }
    }
}

impl Evaluator for GoalBiasedEvaluator<'_> {
    fn evaluate(&self, genome: &[u8], rng: &mut ChaCha8Rng) -> Evaluation {
        let guide = self.guide;
        let walk = simulate(guide.grid, guide.start, guide.goal, genome, |pos, gene| {
            if rng.gen::<f64>() < self.goal_bias {
                guide.directed_move(pos, &mut *rng)
            } else {
                Direction::from_gene(gene)
            }
        });

        let mut fitness = walk.route_cost + walk.penalty;
        if !walk.reached {
            fitness += self.remaining(walk.end) * BIASED_DISTANCE_WEIGHT;
        }

        Evaluation {
            fitness,
            route_cost: walk.route_cost,
            path: walk.path,
            reached: walk.reached,
        }
    }

    fn name(&self) -> &str {
        "Goal-biased"
    }
}

/// Unguided scoring: genes are taken literally and unfinished walks pay by
/// raw Manhattan distance. Shorter walks win ties.
pub struct RandomWalkEvaluator<'a> {
    grid: &'a Grid,
    start: Pos,
    goal: Pos,
}

impl<'a> RandomWalkEvaluator<'a> {
    pub fn new(grid: &'a Grid, start: Pos, goal: Pos) -> Self {
        Self { grid, start, goal }
    }
}

impl Evaluator for RandomWalkEvaluator<'_> {
    fn evaluate(&self, genome: &[u8], _rng: &mut ChaCha8Rng) -> Evaluation {
        let walk = simulate(self.grid, self.start, self.goal, genome, |_, gene| {
            Direction::from_gene(gene)
        });

        let mut fitness = walk.route_cost + walk.penalty;
        if !walk.reached {
            fitness += walk.end.manhattan(self.goal) as u64 * RANDOM_DISTANCE_WEIGHT;
        }
        fitness += walk.path.len() as u64;

        Evaluation {
            fitness,
            route_cost: walk.route_cost,
            path: walk.path,
            reached: walk.reached,
        }
    }

    fn name(&self) -> &str {
        "Random walk"
    }
}
