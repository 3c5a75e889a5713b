use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::grid::{Direction, Grid, Pos};
use crate::engine::distance::DistanceMap;

/// Probability that a seeded genome takes the directed move at each gene.
const SEED_DIRECTED_PROB: f64 = 0.85;

/// A genome of `len` uniformly random direction codes.
pub fn random_genome<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<u8> {
    (0..len).map(|_| rng.gen_range(0..4u8)).collect()
}

/// Single-point crossover. The cut lies in `1..len`, so both parents
/// contribute at least one gene.
pub fn crossover_single_point<R: Rng + ?Sized>(p1: &[u8], p2: &[u8], rng: &mut R) -> Vec<u8> {
    let n = p1.len().min(p2.len());
    if n < 2 {
        return p1.to_vec();
    }
    let cut = rng.gen_range(1..n);
    let mut child = Vec::with_capacity(n);
    child.extend_from_slice(&p1[..cut]);
    child.extend_from_slice(&p2[cut..n]);
    child
}

/// Replaces each gene with a random direction with probability `rate`.
pub fn point_mutation<R: Rng + ?Sized>(genome: &mut [u8], rate: f64, rng: &mut R) {
    for gene in genome.iter_mut() {
        if rng.gen::<f64>() < rate {
            *gene = rng.gen_range(0..4);
        }
    }
}

/// Everything the goal-directed operators need to know about a maze.
#[derive(Debug, Clone, Copy)]
pub struct Guide<'a> {
    pub grid: &'a Grid,
    pub distances: &'a DistanceMap,
    pub start: Pos,
    pub goal: Pos,
}

impl<'a> Guide<'a> {
    pub fn new(grid: &'a Grid, distances: &'a DistanceMap, start: Pos, goal: Pos) -> Self {
        Self { grid, distances, start, goal }
    }

    /// The open move that strictly lowers the distance to the goal; failing
    /// that any open move; failing that any direction at all.
    pub fn directed_move<R: Rng + ?Sized>(&self, pos: Pos, rng: &mut R) -> Direction {
        let mut best = None;
        let mut best_d = self.distances.raw(pos);
        for (dir, nb) in self.grid.open_neighbors(pos) {
            let d = self.distances.raw(nb);
            if d < best_d {
                best_d = d;
                best = Some(dir);
            }
        }
        if let Some(dir) = best {
            return dir;
        }

        let open: Vec<Direction> = self.grid.open_neighbors(pos).map(|(d, _)| d).collect();
        match open.choose(rng) {
            Some(&dir) => dir,
            None => Direction::from_gene(rng.gen_range(0..4)),
        }
    }

    /// Position after replaying `genes` literally from the start, and whether
    /// the goal was entered on the way.
    pub fn replay(&self, genes: &[u8]) -> (Pos, bool) {
        let mut pos = self.start;
        if pos == self.goal {
            return (pos, true);
        }
        for &gene in genes {
            if let Some(next) = self.grid.step(pos, Direction::from_gene(gene)) {
                pos = next;
                if pos == self.goal {
                    return (pos, true);
                }
            }
        }
        (pos, false)
    }

    /// Rewrites `genome[from..to]` with directed moves starting at `pos`.
    /// Stops early on a blocked move or on reaching the goal.
    fn steer_slice<R: Rng + ?Sized>(&self, genome: &mut [u8], from: usize, to: usize, mut pos: Pos, rng: &mut R) {
        for gene in genome[from..to].iter_mut() {
            let dir = self.directed_move(pos, rng);
            *gene = dir.gene();
            match self.grid.step(pos, dir) {
                Some(next) => pos = next,
                None => break,
            }
            if pos == self.goal {
                break;
            }
        }
    }

    /// A genome that mostly follows directed moves, with occasional random
    /// genes to get out of dead ends. Genes after the goal are random.
    pub fn directed_genome<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<u8> {
        let mut genome = random_genome(len, rng);
        let mut pos = self.start;
        for gene in genome.iter_mut() {
            if pos == self.goal {
                break;
            }
            let dir = if rng.gen::<f64>() < SEED_DIRECTED_PROB {
                self.directed_move(pos, rng)
            } else {
                Direction::from_gene(rng.gen_range(0..4))
            };
            *gene = dir.gene();
            if let Some(next) = self.grid.step(pos, dir) {
                pos = next;
            }
        }
        genome
    }

    /// Overwrites a random contiguous slice with directed moves computed from
    /// the position the walker has at the start of that slice.
    pub fn directed_segment<R: Rng + ?Sized>(&self, genome: &mut [u8], rng: &mut R) {
        let len = genome.len();
        if len == 0 {
            return;
        }
        let seg_len = (len / 6).clamp(5, 20).min(len);
        let from = rng.gen_range(0..(len - seg_len).max(1));
        let (pos, reached) = self.replay(&genome[..from]);
        if reached {
            return;
        }
        self.steer_slice(genome, from, (from + seg_len).min(len), pos, rng);
    }

    /// Leaves a genome that already reaches the goal untouched; otherwise
    /// rewrites its tail with directed moves from where the prefix ends.
    /// Returns true when the genome was modified.
    pub fn greedy_repair<R: Rng + ?Sized>(&self, genome: &mut [u8], rng: &mut R) -> bool {
        let len = genome.len();
        if self.replay(genome).1 {
            return false;
        }
        let tail = (len / 4).min(20);
        if tail == 0 {
            return false;
        }
        let from = len - tail;
        let (pos, _) = self.replay(&genome[..from]);
        self.steer_slice(genome, from, len, pos, rng);
        true
    }
}

/// A composable mutation builder.
#[derive(Clone, Debug, Default)]
pub struct Mutator {
    point_rate: Option<f64>,        // Per-gene replacement probability
    segment_chance: Option<f64>,    // Chance of a directed segment rewrite
    repair_chance: Option<f64>,     // Chance of a greedy tail repair
}

impl Mutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point(mut self, rate: f64) -> Self {
        self.point_rate = Some(rate);
        self
    }

    pub fn directed_segment(mut self, chance: f64) -> Self {
        self.segment_chance = Some(chance);
        self
    }

    pub fn repair(mut self, chance: f64) -> Self {
        self.repair_chance = Some(chance);
        self
    }

    /// Applies point mutation, then the directed operators when a guide is
    /// available. Directed operators are skipped without one.
    pub fn apply<R: Rng + ?Sized>(&self, genome: &mut [u8], guide: Option<&Guide<'_>>, rng: &mut R) {
        if let Some(rate) = self.point_rate {
            point_mutation(genome, rate, rng);
        }

        let Some(guide) = guide else { return };

        if let Some(chance) = self.segment_chance {
            if rng.gen::<f64>() < chance {
                guide.directed_segment(genome, rng);
            }
        }

        if let Some(chance) = self.repair_chance {
            if rng.gen::<f64>() < chance {
                guide.greedy_repair(genome, rng);
            }
        }
    }
}
