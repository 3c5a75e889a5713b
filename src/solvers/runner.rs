use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};

use crate::core::config::SolverConfig;
use crate::core::error::SolverError;
use crate::core::grid::{Grid, RunState};
use crate::engine::animator::Animator;
use crate::engine::control::{CancelToken, Pacing};
use crate::engine::distance::DistanceMap;
use crate::solvers::ga::GeneticAlgorithm;
use crate::solvers::pure_ga::PureGeneticAlgorithm;
use crate::solvers::{astar, bfs, dijkstra, Algorithm, Outcome, SolverEvent};

/// Requests accepted by [`Runner::serve`].
#[derive(Debug, Clone)]
pub enum Command {
    Run(Algorithm),
    SetGrid(Arc<Grid>),
    SetConfig(SolverConfig),
    Shutdown,
}

/// Owns the run state and dispatches one run at a time.
pub struct Runner {
    grid: Arc<Grid>,
    state: RunState,
    config: SolverConfig,
    cancel: CancelToken,
    pacing: Pacing,
    tx: Sender<SolverEvent>,
}

impl Runner {
    pub fn new(grid: Arc<Grid>, config: SolverConfig, tx: Sender<SolverEvent>) -> Self {
        let config = config.normalized();
        Self {
            state: RunState::for_grid(&grid),
            pacing: Pacing::new(config.delay_ms),
            cancel: CancelToken::new(),
            grid,
            config,
            tx,
        }
    }

    /// Swaps in a newly loaded maze. The run state is resized to match.
    pub fn set_grid(&mut self, grid: Arc<Grid>) {
        info!("Grid set to {} ({}x{})", grid.label(), grid.rows(), grid.cols());
        self.state = RunState::for_grid(&grid);
        self.grid = grid;
    }

    pub fn set_config(&mut self, config: SolverConfig) {
        self.config = config.normalized();
        self.pacing.set(self.config.delay_ms);
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Handle for cancelling the current run from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Handle for retuning the animation delay from another thread.
    pub fn pacing(&self) -> Pacing {
        self.pacing.clone()
    }

    /// Resets the run state and runs `algorithm` to completion or
    /// cancellation. Final metrics are forwarded unless the run was
    /// cancelled; a snapshot and `Finished` are always sent.
    pub fn run(&mut self, algorithm: Algorithm) -> Result<Outcome, SolverError> {
        self.state.reset();
        let animator = Animator::new(self.tx.clone(), self.cancel.clone(), self.pacing.clone());
        animator.emit(SolverEvent::Started {
            algorithm,
            rows: self.grid.rows(),
            cols: self.grid.cols(),
        });
        info!("Running {} on {}", algorithm, self.grid.label());

        let result = self.dispatch(algorithm, &animator);

        match &result {
            Ok(outcome) => {
                let metrics = outcome.metrics();
                if outcome.cancelled {
                    animator.log(format!("{} cancelled", algorithm));
                } else {
                    if !outcome.reached {
                        animator.log(format!("{}: the maze has no solution", algorithm));
                    }
                    animator.emit(SolverEvent::Metrics { metrics: metrics.clone(), partial: false });
                }
                info!("{}", metrics);
            }
            Err(e) => {
                warn!("{} failed: {}", algorithm, e);
                animator.log(format!("Run failed: {}", e));
            }
        }

        animator.snapshot(&self.state);
        animator.emit(SolverEvent::Finished {
            cancelled: result.as_ref().map_or(false, |o| o.cancelled),
        });
        result
    }

    fn dispatch(&mut self, algorithm: Algorithm, animator: &Animator) -> Result<Outcome, SolverError> {
        let grid = &*self.grid;
        let state = &mut self.state;
        match algorithm {
            Algorithm::Dijkstra => dijkstra::solve(grid, state, animator),
            Algorithm::AStar => astar::solve(grid, state, animator),
            Algorithm::Bfs => bfs::solve(grid, state, animator),
            Algorithm::Genetic => {
                let (_, goal) = grid.endpoints()?;
                let distances = DistanceMap::from_goal(grid, goal);
                GeneticAlgorithm::new(self.config.clone()).solve(grid, state, &distances, animator)
            }
            Algorithm::PureGa => {
                let (_, goal) = grid.endpoints()?;
                let distances = DistanceMap::from_goal(grid, goal);
                PureGeneticAlgorithm::new(self.config.clone()).solve(grid, state, &distances, animator)
            }
        }
    }

    /// Worker loop: processes commands in order until `Shutdown` or until
    /// every sender is dropped. Runs are therefore serialised.
    pub fn serve(mut self, commands: Receiver<Command>) {
        for cmd in commands {
            match cmd {
                Command::Run(algorithm) => {
                    let _ = self.run(algorithm);
                }
                Command::SetGrid(grid) => self.set_grid(grid),
                Command::SetConfig(config) => self.set_config(config),
                Command::Shutdown => break,
            }
        }
        info!("Runner stopped");
    }
}
