use crate::core::grid::Pos;

/// A frontier record. `parent` indexes into the owning [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchNode {
    pub pos: Pos,
    pub cost: u64,
    pub parent: Option<usize>,
}

/// Growable store of search nodes for one run. Parent links always point at
/// earlier indices, so the links form a tree rooted at the first node.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<SearchNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self { nodes: Vec::with_capacity(n) }
    }

    pub fn push(&mut self, pos: Pos, cost: u64, parent: Option<usize>) -> usize {
        debug_assert!(parent.map_or(true, |p| p < self.nodes.len()));
        self.nodes.push(SearchNode { pos, cost, parent });
        self.nodes.len() - 1
    }

    #[inline]
    pub fn get(&self, id: usize) -> &SearchNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks parent links from `id` back to the root.
    pub fn lineage(&self, id: usize) -> Lineage<'_> {
        Lineage { arena: self, next: Some(id) }
    }

    /// Cells from the root to `id`, in travel order.
    pub fn path_to(&self, id: usize) -> Vec<Pos> {
        let mut path: Vec<Pos> = self.lineage(id).map(|n| n.pos).collect();
        path.reverse();
        path
    }
}

pub struct Lineage<'a> {
    arena: &'a NodeArena,
    next: Option<usize>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a SearchNode;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.arena.get(id);
        self.next = node.parent;
        Some(node)
    }
}
