use std::collections::VecDeque;

use crate::core::grid::{Grid, Pos};

/// Goal-rooted hop counts over open cells, ignoring weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMap {
    cols: usize,
    dist: Vec<u32>,
}

impl DistanceMap {
    /// Marker for cells the goal cannot reach.
    pub const UNREACHABLE: u32 = u32::MAX;

    /// Breadth-first flood from `goal` across every open cell.
    pub fn from_goal(grid: &Grid, goal: Pos) -> Self {
        let mut dist = vec![Self::UNREACHABLE; grid.area()];
        let mut queue = VecDeque::new();

        if grid.is_open(goal) {
            dist[grid.index(goal)] = 0;
            queue.push_back(goal);
        }

        while let Some(cur) = queue.pop_front() {
            let next = dist[grid.index(cur)] + 1;
            for (_, nb) in grid.open_neighbors(cur) {
                let slot = &mut dist[grid.index(nb)];
                if *slot == Self::UNREACHABLE {
                    *slot = next;
                    queue.push_back(nb);
                }
            }
        }

        Self { cols: grid.cols(), dist }
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Option<u32> {
        match self.dist[pos.row * self.cols + pos.col] {
            Self::UNREACHABLE => None,
            d => Some(d),
        }
    }

    #[inline]
    pub fn raw(&self, pos: Pos) -> u32 {
        self.dist[pos.row * self.cols + pos.col]
    }

    pub fn is_reachable(&self, pos: Pos) -> bool {
        self.get(pos).is_some()
    }

    /// Hop estimate for a start cell: the exact distance when reachable,
    /// otherwise Manhattan distance plus fixed padding.
    pub fn estimate_steps(&self, start: Pos, goal: Pos) -> usize {
        match self.get(start) {
            Some(d) => d as usize,
            None => start.manhattan(goal) + 20,
        }
    }
}
