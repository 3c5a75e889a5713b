use std::thread;

use crossbeam_channel::Sender;

use crate::core::grid::{Pos, RunState};
use crate::engine::arena::NodeArena;
use crate::engine::control::{CancelToken, Pacing};
use crate::solvers::SolverEvent;

/// Per-run stepping interface.
///
/// Every exploration step becomes a [`SolverEvent::Step`] on the channel (the
/// redraw request) and then the worker pauses for the configured delay. A
/// presentation layer drains the channel on its own schedule.
#[derive(Debug, Clone)]
pub struct Animator {
    tx: Option<Sender<SolverEvent>>,
    cancel: CancelToken,
    pacing: Pacing,
}

impl Animator {
    pub fn new(tx: Sender<SolverEvent>, cancel: CancelToken, pacing: Pacing) -> Self {
        Self { tx: Some(tx), cancel, pacing }
    }

    /// No channel, no delay.
    pub fn silent(cancel: CancelToken) -> Self {
        Self { tx: None, cancel, pacing: Pacing::new(0) }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn emit(&self, event: SolverEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn log(&self, msg: impl Into<String>) {
        self.emit(SolverEvent::Log(msg.into()));
    }

    /// Marks (or clears) the exploring flag on `pos`, requests a redraw and
    /// pauses. A no-op once the run is cancelled.
    pub fn record_step(&self, state: &mut RunState, pos: Pos, exploring: bool) {
        if self.is_cancelled() {
            return;
        }
        state.set_exploring(pos, exploring);
        self.emit(SolverEvent::Step { pos, exploring });

        let delay = self.pacing.delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    pub fn clear_trail(&self, state: &mut RunState) {
        state.clear_exploring();
        self.emit(SolverEvent::ClearTrail);
    }

    /// Walks parent links from `terminal` to the root marking each cell as
    /// part of the result. Returns the number of moves on the path.
    pub fn materialize_path(&self, state: &mut RunState, arena: &NodeArena, terminal: usize) -> usize {
        let mut cells: usize = 0;
        for node in arena.lineage(terminal) {
            state.mark_result(node.pos);
            cells += 1;
        }
        cells.saturating_sub(1)
    }

    /// Marks an explicit route as the result. Returns the number of moves.
    pub fn mark_route(&self, state: &mut RunState, route: &[Pos]) -> usize {
        for &pos in route {
            state.mark_result(pos);
        }
        route.len().saturating_sub(1)
    }

    pub fn snapshot(&self, state: &RunState) {
        self.emit(SolverEvent::Snapshot(Box::new(state.clone())));
    }
}
