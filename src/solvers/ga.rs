use std::time::Instant;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::SolverConfig;
use crate::core::error::SolverError;
use crate::core::grid::{Grid, RunState};
use crate::engine::animator::Animator;
use crate::engine::distance::DistanceMap;
use crate::engine::evaluator::GoalBiasedEvaluator;
use crate::engine::operators::{random_genome, Guide, Mutator};
use crate::solvers::population::{
    animate_route, biased_genome_length, breed, compare, evaluate_batch, finish, gen_stats, rank, Candidate,
    Coverage, RankOrder,
};
use crate::solvers::{Algorithm, Metrics, Outcome, SolverEvent};

/// Generations without strict improvement before evolution gives up.
pub const STAGNATION_LIMIT: usize = 80;
const SEGMENT_CHANCE: f64 = 0.15;
const REPAIR_CHANCE: f64 = 0.2;
const MIN_PARENT_POOL: usize = 4;

/// Genetic search steered by the goal distance map.
pub struct GeneticAlgorithm {
    config: SolverConfig,
}

impl GeneticAlgorithm {
    pub fn new(config: SolverConfig) -> Self {
        Self { config: config.normalized() }
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

        let guide = Guide::new(grid, distances, start, goal);
        let evaluator = GoalBiasedEvaluator::new(&guide, cfg.goal_bias);
        let genome_len = biased_genome_length(distances.estimate_steps(start, goal), grid.rows(), grid.cols());
        let pop_size = cfg.population_size;
        let elites = cfg.elitism_count;
        let parent_pool = elites.max(MIN_PARENT_POOL).min(pop_size);
        let mutator = Mutator::new()
            .point(cfg.mutation_rate)
            .directed_segment(SEGMENT_CHANCE)
            .repair(REPAIR_CHANCE);

        info!("Genetic: population {}, genome length {}", pop_size, genome_len);
        animator.log(format!("Initializing population ({} x {} genes)...", pop_size, genome_len));

        // 1. Seeding: a minority of directed genomes, the rest random
        let seeded = (pop_size / 10).max(2).min(pop_size);
        let mut genomes: Vec<Vec<u8>> = (0..pop_size)
            .map(|i| {
                if i < seeded {
                    guide.directed_genome(genome_len, &mut rng)
                } else {
                    random_genome(genome_len, &mut rng)
                }
            })
            .collect();

        let mut coverage = Coverage::new(grid);
        let mut best: Option<Candidate> = None;
        let mut stagnation = 0;
        let mut generation = 0;

        // 2. Evolution Loop
        while generation < cfg.generations && !animator.is_cancelled() {
            generation += 1;

            // A. Evaluation & ranking
            let mut ranked = evaluate_batch(&evaluator, genomes, rng.gen());
            for c in &ranked {
                coverage.extend(&c.eval.path);
            }
            rank(&mut ranked, RankOrder::Fitness);

            // B. Stagnation tracking
            let leader = &ranked[0];
            let improved = best
                .as_ref()
                .map_or(true, |b| compare(leader, b, RankOrder::Fitness).is_lt());
            if improved {
                if leader.eval.reached && !best.as_ref().map_or(false, |b| b.eval.reached) {
                    animator.log(format!(">>> Goal reached at generation {}", generation));
                }
                best = Some(leader.clone());
                stagnation = 0;
            } else {
                stagnation += 1;
            }

            // C. Telemetry
            animator.emit(SolverEvent::GenerationUpdate(gen_stats(generation, &ranked, stagnation, 0)));
            if generation % cfg.report_every == 0 {
                animator.emit(SolverEvent::Metrics {
                    metrics: Metrics {
                        algorithm: Algorithm::Genetic,
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

            if stagnation >= STAGNATION_LIMIT {
                debug!("Genetic: {} stagnant generations, stopping", stagnation);
                animator.log(format!("Stagnation ({}) -> stopping", stagnation));
                break;
            }

            // D. Elitism with repair for elites that have not arrived
            let mut next = Vec::with_capacity(pop_size);
            for c in ranked.iter().take(elites) {
                let mut genome = c.genome.clone();
                if !c.eval.reached {
                    guide.greedy_repair(&mut genome, &mut rng);
                }
                next.push(genome);
            }

            // E. Breeding
            breed(&ranked, &mut next, pop_size, parent_pool, &mut rng, |child, rng| {
                mutator.apply(child, Some(&guide), rng);
            });
            genomes = next;
        }

        if !distances.is_reachable(start) {
            coverage.flood(grid, start);
        }
        animator.log(format!("Genetic finished after {} generations", generation));
        Ok(finish(Algorithm::Genetic, grid, state, animator, best.as_ref(), &coverage, t0))
    }
}
