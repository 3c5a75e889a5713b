use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use maze_runner::core::error::SolverError;
use maze_runner::core::grid::{Pos, RunState};
use maze_runner::engine::animator::Animator;
use maze_runner::engine::control::{CancelToken, Pacing};
use maze_runner::solvers::{astar, bfs, dijkstra, Algorithm, SolverEvent};

mod common;

use crate::common::{
    brute_force_min_cost, grid, is_connected, silent, state_for, CORRIDOR, ENCLOSED, OPEN_UNIFORM, WEIGHTED,
    WEIGHTED_MIX,
};

#[test]
fn test_uniform_weights_agree_on_steps() {
    let g = grid(OPEN_UNIFORM);
    let anim = silent();

    let d = dijkstra::solve(&g, &mut state_for(&g), &anim).unwrap();
    let a = astar::solve(&g, &mut state_for(&g), &anim).unwrap();
    let b = bfs::solve(&g, &mut state_for(&g), &anim).unwrap();

    assert!(d.reached && a.reached && b.reached);
    assert_eq!(d.steps, Some(8));
    assert_eq!(a.steps, d.steps);
    assert_eq!(b.steps, d.steps);

    // Uniform weights: cost equals steps
    assert_eq!(d.cost, Some(8));
    assert_eq!(a.cost, Some(8));
    assert_eq!(b.cost, None);
}

#[test]
fn test_corridor_metrics() {
    let g = grid(CORRIDOR);
    let anim = silent();

    for solve in [dijkstra::solve, astar::solve, bfs::solve] {
        let mut state = state_for(&g);
        let out = solve(&g, &mut state, &anim).unwrap();
        assert!(out.reached);
        assert_eq!(out.steps, Some(4));
        assert_eq!(out.path.len(), 5);
        assert_eq!(out.path.first(), Some(&Pos::new(0, 0)));
        assert_eq!(out.path.last(), Some(&Pos::new(0, 4)));
        assert_eq!(state.result_count(), 5);
        if out.algorithm != Algorithm::Bfs {
            assert_eq!(out.cost, Some(4));
        }
    }
}

#[test]
fn test_dijkstra_matches_brute_force() {
    for text in [WEIGHTED, WEIGHTED_MIX, OPEN_UNIFORM] {
        let g = grid(text);
        let out = dijkstra::solve(&g, &mut state_for(&g), &silent()).unwrap();
        assert_eq!(out.cost, brute_force_min_cost(&g));
        assert!(is_connected(&out.path));

        // Reported cost is the sum of entry weights along the reported path
        let along: u64 = out.path.iter().skip(1).map(|&p| g.weight(p)).sum();
        assert_eq!(out.cost, Some(along));
    }
}

#[test]
fn test_astar_never_beats_dijkstra() {
    // The straight line to the goal is expensive; the detour is cheap
    let lure = "S \"9\" \"9\" G\n\"1\" \"1\" \"1\" \"1\"\n";
    for text in [WEIGHTED, WEIGHTED_MIX, OPEN_UNIFORM, CORRIDOR, lure] {
        let g = grid(text);
        let d = dijkstra::solve(&g, &mut state_for(&g), &silent()).unwrap();
        let a = astar::solve(&g, &mut state_for(&g), &silent()).unwrap();
        assert!(a.reached);
        assert!(a.cost >= d.cost, "A* reported {:?} below Dijkstra {:?}", a.cost, d.cost);
        // Entry weights are at least 1, so the closed set never locks in a detour
        assert_eq!(a.cost, brute_force_min_cost(&g));
    }
}

#[test]
fn test_bfs_minimises_hops_not_weight() {
    let g = grid(WEIGHTED);
    let b = bfs::solve(&g, &mut state_for(&g), &silent()).unwrap();
    let d = dijkstra::solve(&g, &mut state_for(&g), &silent()).unwrap();

    assert!(b.steps <= d.steps);
    assert_eq!(b.steps, Some(g.entrance().unwrap().manhattan(g.exit().unwrap())));
}

#[test]
fn test_enclosed_goal_visits_reachable_region() {
    let g = grid(ENCLOSED);
    for solve in [dijkstra::solve, astar::solve, bfs::solve] {
        let mut state = state_for(&g);
        let out = solve(&g, &mut state, &silent()).unwrap();
        assert!(!out.reached);
        assert!(!out.cancelled);
        assert_eq!(out.cost, None);
        assert_eq!(out.steps, None);
        assert_eq!(out.visited, 6);
        assert_eq!(state.visited_count(), 6);
        assert_eq!(state.result_count(), 0);
    }
}

#[test]
fn test_visited_weight_sum() {
    let g = grid(CORRIDOR);
    let out = dijkstra::solve(&g, &mut state_for(&g), &silent()).unwrap();
    // Five cells finalised, each weighing 1
    assert_eq!(out.visited, 5);
    assert_eq!(out.visited_weight_sum, Some(5));
    assert_eq!(out.metrics().visited_weight_sum, Some(5));

    // The start counts with its fixed weight of 1
    let g = grid("S \"7\" G\n");
    let out = dijkstra::solve(&g, &mut state_for(&g), &silent()).unwrap();
    assert_eq!(out.visited, 3);
    assert_eq!(out.visited_weight_sum, Some(1 + 7 + 1));
}

#[test]
fn test_missing_endpoints() {
    let no_start = grid("\"1\" \"1\" G\n");
    let no_goal = grid("S \"1\" \"1\"\n");

    for solve in [dijkstra::solve, astar::solve, bfs::solve] {
        let err = solve(&no_start, &mut state_for(&no_start), &silent()).unwrap_err();
        assert_eq!(err, SolverError::MissingStart);
        let err = solve(&no_goal, &mut state_for(&no_goal), &silent()).unwrap_err();
        assert_eq!(err, SolverError::MissingGoal);
    }
}

#[test]
fn test_state_size_mismatch_rejected() {
    let g = grid(CORRIDOR);
    let mut wrong = RunState::new(2, 2);
    let err = dijkstra::solve(&g, &mut wrong, &silent()).unwrap_err();
    assert!(matches!(err, SolverError::StateMismatch { .. }));
}

#[test]
fn test_cancelled_before_start() {
    let g = grid(OPEN_UNIFORM);
    let cancel = CancelToken::new();
    cancel.cancel();
    let anim = Animator::silent(cancel);

    for solve in [dijkstra::solve, astar::solve, bfs::solve] {
        let out = solve(&g, &mut state_for(&g), &anim).unwrap();
        assert!(out.cancelled);
        assert!(!out.reached);
        assert_eq!(out.visited, 0);
    }
}

#[test]
fn test_cancel_mid_run() {
    let g = grid(OPEN_UNIFORM);
    let cancel = CancelToken::new();
    let (tx, _rx) = unbounded();
    // 24 steps at 20ms each would take about half a second
    let anim = Animator::new(tx, cancel.clone(), Pacing::new(20));

    let canceller = {
        let cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            cancel.cancel();
        })
    };

    let mut state = state_for(&g);
    let out = dijkstra::solve(&g, &mut state, &anim).unwrap();
    canceller.join().unwrap();

    assert!(out.cancelled);
    assert!(!out.reached);
    assert!(out.visited > 0 && out.visited < 24);
    assert_eq!(state.result_count(), 0);
}

#[test]
fn test_step_events_emitted() {
    let g = grid(CORRIDOR);
    let (tx, rx) = unbounded();
    let anim = Animator::new(tx, CancelToken::new(), Pacing::new(0));

    let out = bfs::solve(&g, &mut state_for(&g), &anim).unwrap();
    drop(anim);

    let steps: Vec<Pos> = rx
        .try_iter()
        .filter_map(|e| match e {
            SolverEvent::Step { pos, exploring: true } => Some(pos),
            _ => None,
        })
        .collect();

    assert_eq!(steps.len(), out.visited);
    assert_eq!(steps.first(), Some(&Pos::new(0, 0)));
    assert_eq!(steps.last(), Some(&Pos::new(0, 4)));
}
