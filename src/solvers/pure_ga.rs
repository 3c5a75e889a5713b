use std::time::Instant;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::SolverConfig;
use crate::core::error::SolverError;
use crate::core::grid::{Grid, RunState};
use crate::engine::animator::Animator;
use crate::engine::distance::DistanceMap;
use crate::engine::evaluator::RandomWalkEvaluator;
use crate::engine::operators::{random_genome, Mutator};
use crate::solvers::population::{
    animate_route, breed, compare, evaluate_batch, finish, gen_stats, pure_genome_length, rank, Candidate,
    Coverage, RankOrder,
};
use crate::solvers::{Algorithm, Metrics, Outcome, SolverEvent};

/// Stagnant generations before an unsolved population is reseeded.
pub const RESTART_AFTER: usize = 200;
/// Stagnant generations tolerated once the goal has been reached.
pub const SOLVED_PATIENCE: usize = 120;
const PARENT_POOL: usize = 20;

/// Baseline genetic search with no steering at all: random seeding,
/// literal genes, no repair. Only elitism, crossover and point mutation.
///
/// Until the goal is reached this never gives up on its own; stagnant
/// populations are reseeded instead. Bound it with the cancel token.
pub struct PureGeneticAlgorithm {
    config: SolverConfig,
}

impl PureGeneticAlgorithm {
    pub fn new(config: SolverConfig) -> Self {
        Self { config: config.normalized() }
    }

    fn fresh_population(&self, genome_len: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<u8>> {
        (0..self.config.population_size)
            .map(|_| random_genome(genome_len, rng))
            .collect()
    }

    pub fn solve(
        &self,
        grid: &Grid,
        state: &mut RunState,
        distances: &DistanceMap,
        animator: &Animator,
    ) -> Result<Outcome, SolverError> {
        state.ensure_matches(grid)?;
        let (start, goal) = grid.endpoints()?;
        let cfg = &self.config;
        let t0 = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);

        let evaluator = RandomWalkEvaluator::new(grid, start, goal);
        let genome_len = pure_genome_length(distances.estimate_steps(start, goal), grid.rows(), grid.cols());
        let pop_size = cfg.population_size;
        let elites = cfg.elitism_count;
        let parent_pool = elites.max(pop_size.min(PARENT_POOL));
        let improve_budget = cfg.generations;
        let mutator = Mutator::new().point(cfg.mutation_rate);

        info!("PureGA: population {}, genome length {}", pop_size, genome_len);
        animator.log(format!("Initializing random population ({} x {} genes)...", pop_size, genome_len));

        let mut genomes = self.fresh_population(genome_len, &mut rng);
        let mut coverage = Coverage::new(grid);
        let mut best: Option<Candidate> = None;
        let mut stagnation = 0;
        let mut restarts = 0;
        let mut generation = 0;
        let mut improve_generations = 0;

        while !animator.is_cancelled() {
            generation += 1;

            let mut ranked = evaluate_batch(&evaluator, genomes, rng.gen());
            for c in &ranked {
                coverage.extend(&c.eval.path);
            }
            rank(&mut ranked, RankOrder::RouteThenLength);

            let leader = &ranked[0];
            let improved = best
                .as_ref()
                .map_or(true, |b| compare(leader, b, RankOrder::RouteThenLength).is_lt());
            if improved {
                if leader.eval.reached && !best.as_ref().map_or(false, |b| b.eval.reached) {
                    animator.log(format!(">>> Goal reached at generation {}", generation));
                }
                best = Some(leader.clone());
                stagnation = 0;
            } else {
                stagnation += 1;
            }
            let solved = best.as_ref().map_or(false, |b| b.eval.reached);

            animator.emit(SolverEvent::GenerationUpdate(gen_stats(generation, &ranked, stagnation, restarts)));
            if generation % cfg.report_every == 0 {
                animator.emit(SolverEvent::Metrics {
                    metrics: Metrics {
                        algorithm: Algorithm::PureGa,
                        cost: best.as_ref().filter(|b| b.eval.reached).map(|b| b.eval.route_cost),
                        steps: None,
                        visited: Some(coverage.count()),
                        elapsed_ms: t0.elapsed().as_millis() as u64,
                        visited_weight_sum: None,
                    },
                    partial: true,
                });
            }
            if generation % cfg.animate_every == 0 {
                animate_route(animator, state, &ranked[0].eval.path);
            }

            if !solved && stagnation > RESTART_AFTER {
                restarts += 1;
                debug!("PureGA: restart #{} at generation {}", restarts, generation);
                animator.log(format!("Restart (stagnation {}) -> reseeding", stagnation));
                genomes = self.fresh_population(genome_len, &mut rng);
                stagnation = 0;
                continue;
            }

            if solved {
                improve_generations += 1;
                if stagnation > SOLVED_PATIENCE || improve_generations >= improve_budget {
                    break;
                }
            }

            let mut next: Vec<Vec<u8>> = ranked.iter().take(elites).map(|c| c.genome.clone()).collect();
            breed(&ranked, &mut next, pop_size, parent_pool, &mut rng, |child, rng| {
                mutator.apply(child, None, rng);
            });
            genomes = next;
        }

        if !distances.is_reachable(start) {
            coverage.flood(grid, start);
        }
        animator.log(format!("PureGA finished after {} generations ({} restarts)", generation, restarts));
        Ok(finish(Algorithm::PureGa, grid, state, animator, best.as_ref(), &coverage, t0))
    }
}
