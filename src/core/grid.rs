use serde::{Deserialize, Serialize};

use crate::core::error::SolverError;

/// The four kinds of maze cell. Only `Wall` blocks movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Wall,
    Road,
    Start,
    Goal,
}

impl CellKind {
    #[inline]
    pub fn is_open(self) -> bool {
        !matches!(self, CellKind::Wall)
    }
}

/// A cell coordinate. `row` grows downwards, `col` grows rightwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn manhattan(self, other: Pos) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// Orthogonal moves. The discriminant doubles as the genome code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    #[inline]
    pub fn from_gene(gene: u8) -> Self {
        Self::ALL[(gene % 4) as usize]
    }

    #[inline]
    pub fn gene(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
        }
    }
}

/// Read-only maze model: cell kinds plus per-cell entry weights.
/// Storage is flattened row-major, `index = row * cols + col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellKind>,
    weights: Vec<i32>,
    start: Option<Pos>,
    goal: Option<Pos>,
    label: String,
}

impl Grid {
    /// Builds a grid from flattened row-major storage.
    /// The first `Start`/`Goal` cell found becomes the entrance/exit.
    pub fn new(rows: usize, cols: usize, cells: Vec<CellKind>, weights: Vec<i32>) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        debug_assert_eq!(weights.len(), rows * cols);

        let locate = |kind: CellKind| {
            cells
                .iter()
                .position(|&c| c == kind)
                .map(|i| Pos::new(i / cols.max(1), i % cols.max(1)))
        };
        let start = locate(CellKind::Start);
        let goal = locate(CellKind::Goal);

        Self {
            rows,
            cols,
            cells,
            weights,
            start,
            goal,
            label: format!("{}x{}", rows, cols),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn in_bounds(&self, row: isize, col: isize) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    #[inline]
    pub fn index(&self, pos: Pos) -> usize {
        pos.row * self.cols + pos.col
    }

    #[inline]
    pub fn pos_of(&self, index: usize) -> Pos {
        Pos::new(index / self.cols, index % self.cols)
    }

    #[inline]
    pub fn kind(&self, pos: Pos) -> CellKind {
        self.cells[self.index(pos)]
    }

    #[inline]
    pub fn is_open(&self, pos: Pos) -> bool {
        self.kind(pos).is_open()
    }

    /// Raw stored weight, as read from the maze source.
    #[inline]
    pub fn stored_weight(&self, pos: Pos) -> i32 {
        self.weights[self.index(pos)]
    }

    /// Cost of entering `pos`. Start and Goal always cost 1, and any
    /// non-positive stored weight is normalised to 1.
    #[inline]
    pub fn weight(&self, pos: Pos) -> u64 {
        match self.kind(pos) {
            CellKind::Start | CellKind::Goal => 1,
            _ => {
                let w = self.stored_weight(pos);
                if w > 0 { w as u64 } else { 1 }
            }
        }
    }

    pub fn entrance(&self) -> Option<Pos> {
        self.start
    }

    pub fn exit(&self) -> Option<Pos> {
        self.goal
    }

    /// Locates both endpoints or fails before any search can begin.
    pub fn endpoints(&self) -> Result<(Pos, Pos), SolverError> {
        let start = self.start.ok_or(SolverError::MissingStart)?;
        let goal = self.goal.ok_or(SolverError::MissingGoal)?;
        Ok((start, goal))
    }

    /// The in-bounds neighbour of `pos` in direction `dir`, whatever its kind.
    #[inline]
    pub fn neighbor(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        let (dr, dc) = dir.delta();
        let r = pos.row as isize + dr;
        let c = pos.col as isize + dc;
        if self.in_bounds(r, c) {
            Some(Pos::new(r as usize, c as usize))
        } else {
            None
        }
    }

    /// The neighbour in direction `dir` if it can be entered.
    #[inline]
    pub fn step(&self, pos: Pos, dir: Direction) -> Option<Pos> {
        self.neighbor(pos, dir).filter(|&p| self.is_open(p))
    }

    /// Enterable orthogonal neighbours in up/right/down/left order.
    pub fn open_neighbors(&self, pos: Pos) -> impl Iterator<Item = (Direction, Pos)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |d| self.step(pos, d).map(|p| (d, p)))
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.area()).map(move |i| self.pos_of(i))
    }
}

/// Per-run mutable overlay sized to a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    rows: usize,
    cols: usize,
    visited: Vec<bool>,
    exploring: Vec<bool>,
    result: Vec<bool>,
}

impl RunState {
    pub fn new(rows: usize, cols: usize) -> Self {
        let n = rows * cols;
        Self {
            rows,
            cols,
            visited: vec![false; n],
            exploring: vec![false; n],
            result: vec![false; n],
        }
    }

    pub fn for_grid(grid: &Grid) -> Self {
        Self::new(grid.rows(), grid.cols())
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn ensure_matches(&self, grid: &Grid) -> Result<(), SolverError> {
        if self.dims() == (grid.rows(), grid.cols()) {
            Ok(())
        } else {
            Err(SolverError::StateMismatch {
                expected: (grid.rows(), grid.cols()),
                found: self.dims(),
            })
        }
    }

    /// Clears all three layers in one pass.
    pub fn reset(&mut self) {
        for ((v, e), r) in self
            .visited
            .iter_mut()
            .zip(self.exploring.iter_mut())
            .zip(self.result.iter_mut())
        {
            *v = false;
            *e = false;
            *r = false;
        }
    }

    #[inline]
    fn slot(&self, pos: Pos) -> Option<usize> {
        if pos.row < self.rows && pos.col < self.cols {
            Some(pos.row * self.cols + pos.col)
        } else {
            None
        }
    }

    pub fn mark_visited(&mut self, pos: Pos) {
        if let Some(i) = self.slot(pos) {
            self.visited[i] = true;
        }
    }

    pub fn mark_exploring(&mut self, pos: Pos) {
        if let Some(i) = self.slot(pos) {
            self.exploring[i] = true;
        }
    }

    pub fn set_exploring(&mut self, pos: Pos, on: bool) {
        if let Some(i) = self.slot(pos) {
            self.exploring[i] = on;
        }
    }

    pub fn mark_result(&mut self, pos: Pos) {
        if let Some(i) = self.slot(pos) {
            self.result[i] = true;
        }
    }

    pub fn clear_exploring(&mut self) {
        self.exploring.iter_mut().for_each(|e| *e = false);
    }

    pub fn is_visited(&self, pos: Pos) -> bool {
        self.slot(pos).map_or(false, |i| self.visited[i])
    }

    pub fn is_exploring(&self, pos: Pos) -> bool {
        self.slot(pos).map_or(false, |i| self.exploring[i])
    }

    pub fn is_result(&self, pos: Pos) -> bool {
        self.slot(pos).map_or(false, |i| self.result[i])
    }

    pub fn visited_count(&self) -> usize {
        self.visited.iter().filter(|&&v| v).count()
    }

    pub fn result_count(&self) -> usize {
        self.result.iter().filter(|&&r| r).count()
    }

    /// True when no layer holds a mark.
    pub fn is_clear(&self) -> bool {
        self.visited
            .iter()
            .chain(self.exploring.iter())
            .chain(self.result.iter())
            .all(|&b| !b)
    }
}
