use maze_runner::core::config::SolverConfig;
use maze_runner::core::error::SolverError;
use maze_runner::core::grid::{Grid, RunState};
use maze_runner::engine::animator::Animator;
use maze_runner::engine::control::CancelToken;
use maze_runner::engine::distance::DistanceMap;
use maze_runner::solvers::ga::GeneticAlgorithm;
use maze_runner::solvers::pure_ga::PureGeneticAlgorithm;
use maze_runner::solvers::{astar, bfs, dijkstra, Outcome};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::thread;
use std::time::{Duration, Instant};

type Solve = fn(&Grid, &mut RunState, &Animator) -> Result<Outcome, SolverError>;

const SIZE: usize = 31;
const WALL_DENSITY: f64 = 0.22;

/// Random weighted maze with S top-left and G bottom-right.
fn generate(seed: u64) -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut text = String::new();
    for r in 0..SIZE {
        let row: Vec<String> = (0..SIZE)
            .map(|c| {
                if (r, c) == (0, 0) {
                    "S".to_string()
                } else if (r, c) == (SIZE - 1, SIZE - 1) {
                    "G".to_string()
                } else if rng.gen::<f64>() < WALL_DENSITY {
                    "#".to_string()
                } else {
                    format!("\"{}\"", rng.gen_range(1..=9))
                }
            })
            .collect();
        text.push_str(&row.join(" "));
        text.push('\n');
    }
    text.parse::<Grid>().expect("generated maze is well formed")
}

fn report(name: &str, out: &Outcome, wall: Duration) {
    println!(
        "{:<10} reached={:<5} cost={:<6} steps={:<5} visited={:<5} time={:?}",
        name,
        out.reached,
        out.cost.map_or("-".to_string(), |c| c.to_string()),
        out.steps.map_or("-".to_string(), |s| s.to_string()),
        out.visited,
        wall,
    );
}

fn main() {
    // First seed whose maze has a route
    let grid = (0..100)
        .map(generate)
        .find(|g| {
            let anim = Animator::silent(CancelToken::new());
            bfs::solve(g, &mut RunState::for_grid(g), &anim).map_or(false, |o| o.reached)
        })
        .expect("a solvable maze within 100 seeds");

    println!("Benchmarking on a {}x{} maze", grid.rows(), grid.cols());

    let (_, goal) = grid.endpoints().expect("endpoints present");
    let distances = DistanceMap::from_goal(&grid, goal);
    let config = SolverConfig {
        population_size: 100,
        generations: 300,
        elitism_count: 10,
        ..Default::default()
    };

    let classical: [(&str, Solve); 3] = [("Dijkstra", dijkstra::solve), ("A*", astar::solve), ("BFS", bfs::solve)];
    for (name, solve) in classical {
        let anim = Animator::silent(CancelToken::new());
        let t0 = Instant::now();
        let out = solve(&grid, &mut RunState::for_grid(&grid), &anim).expect("endpoints present");
        report(name, &out, t0.elapsed());
    }

    let anim = Animator::silent(CancelToken::new());
    let t0 = Instant::now();
    let out = GeneticAlgorithm::new(config.clone())
        .solve(&grid, &mut RunState::for_grid(&grid), &distances, &anim)
        .expect("endpoints present");
    report("Genetic", &out, t0.elapsed());

    // The unguided variant only stops by itself once solved; bound it.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(10));
            cancel.cancel();
        });
    }
    let anim = Animator::silent(cancel.clone());
    let t0 = Instant::now();
    let out = PureGeneticAlgorithm::new(config)
        .solve(&grid, &mut RunState::for_grid(&grid), &distances, &anim)
        .expect("endpoints present");
    report("PureGA", &out, t0.elapsed());
}
