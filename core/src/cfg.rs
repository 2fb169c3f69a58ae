//! Control-flow graph (spec 3 "Control-flow graph", spec 4.8).

use indexmap::IndexMap;

use crate::ast::Stmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    FallThrough,
    BranchTaken,
    BranchNotTaken,
    LoopBack,
    BreakTarget,
    ContinueTarget,
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    /// The statements belonging to this block, in source order. Blocks
    /// hold cloned statements rather than AST indices - nested control
    /// flow has no stable flat index space to point into, and statements
    /// are cheap, structurally-shared-free values here.
    pub statements: Vec<Stmt>,
    pub successors: Vec<(BlockId, EdgeKind)>,
    pub terminal: bool,
}

impl BasicBlock {
    fn new(id: BlockId) -> Self {
        Self { id, statements: Vec::new(), successors: Vec::new(), terminal: false }
    }
}

#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    blocks: IndexMap<BlockId, BasicBlock>,
    pub entry: BlockId,
    pub exits: Vec<BlockId>,
    next_id: usize,
}

impl ControlFlowGraph {
    pub fn new() -> Self {
        let mut blocks = IndexMap::new();
        let entry = BlockId(0);
        blocks.insert(entry, BasicBlock::new(entry));
        Self { blocks, entry, exits: Vec::new(), next_id: 1 }
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        self.blocks.get(&id).expect("block id must exist")
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        self.blocks.get_mut(&id).expect("block id must exist")
    }

    pub fn add_edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind) {
        self.block_mut(from).successors.push((to, kind));
    }

    pub fn mark_terminal(&mut self, id: BlockId) {
        self.block_mut(id).terminal = true;
        if !self.exits.contains(&id) {
            self.exits.push(id);
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// All blocks reachable from `entry` via a DFS over successor edges.
    pub fn reachable_from_entry(&self) -> std::collections::HashSet<BlockId> {
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![self.entry];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            for (next, _) in &self.block(id).successors {
                if !seen.contains(next) {
                    stack.push(*next);
                }
            }
        }
        seen
    }
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}
