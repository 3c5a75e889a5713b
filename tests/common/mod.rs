#![allow(dead_code)]

use maze_runner::core::config::SolverConfig;
use maze_runner::core::grid::{Grid, Pos, RunState};
use maze_runner::core::loader::parse_maze;
use maze_runner::engine::animator::Animator;
use maze_runner::engine::control::CancelToken;

/// A single open row; the rest is wall.
pub const CORRIDOR: &str = r#"
S "1" "1" "1" G
# # # # #
# # # # #
# # # # #
# # # # #
"#;

/// Fully open, every weight 1.
pub const OPEN_UNIFORM: &str = r#"
S "1" "1" "1" "1"
"1" "1" "1" "1" "1"
"1" "1" # "1" "1"
"1" "1" "1" "1" "1"
"1" "1" "1" "1" G
"#;

/// The short way round is expensive.
pub const WEIGHTED: &str = r#"
S "1" "9" "1"
"1" # "9" "1"
"1" "1" "1" "1"
"5" # "1" G
"#;

/// Heavier mix, several competing routes.
pub const WEIGHTED_MIX: &str = r#"
S "3" "1" "1" "7"
"1" # "4" # "1"
"2" "2" "9" "1" "1"
"6" # "1" # "2"
"1" "1" "1" "8" G
"#;

/// Goal walled off; six cells reachable from the start.
pub const ENCLOSED: &str = r#"
S "1" "1" #
"1" "1" "1" #
# # # #
"1" "1" # G
"#;

pub fn grid(text: &str) -> Grid {
    parse_maze(text).expect("fixture maze should parse")
}

pub fn state_for(grid: &Grid) -> RunState {
    RunState::for_grid(grid)
}

pub fn silent() -> Animator {
    Animator::silent(CancelToken::new())
}

/// Small, quick GA settings.
pub fn fast_config() -> SolverConfig {
    SolverConfig {
        delay_ms: 0,
        population_size: 30,
        generations: 120,
        elitism_count: 3,
        seed: 7,
        ..SolverConfig::default()
    }
}

/// Minimum entry-weight cost over every simple path, by exhaustive search.
pub fn brute_force_min_cost(grid: &Grid) -> Option<u64> {
    let (start, goal) = grid.endpoints().ok()?;
    let mut seen = vec![false; grid.area()];
    let mut best = None;
    seen[grid.index(start)] = true;
    dfs(grid, start, goal, 0, &mut seen, &mut best);
    best
}

fn dfs(grid: &Grid, pos: Pos, goal: Pos, cost: u64, seen: &mut [bool], best: &mut Option<u64>) {
    if pos == goal {
        if best.map_or(true, |b| cost < b) {
            *best = Some(cost);
        }
        return;
    }
    let neighbors: Vec<Pos> = grid.open_neighbors(pos).map(|(_, p)| p).collect();
    for nb in neighbors {
        let i = grid.index(nb);
        if seen[i] {
            continue;
        }
        seen[i] = true;
        dfs(grid, nb, goal, cost + grid.weight(nb), seen, best);
        seen[i] = false;
    }
}

/// True when consecutive cells of `path` are orthogonal neighbours.
pub fn is_connected(path: &[Pos]) -> bool {
    path.windows(2).all(|w| w[0].manhattan(w[1]) == 1)
}
