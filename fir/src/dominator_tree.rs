//! Dominator and post-dominator trees (spec.md §4.4 E).
//!
//! Grounded on `cranelift-codegen/src/dominator_tree.rs`'s iterative
//! Cooper-Harvey-Kennedy `compute_idom`/`intersect` shape, cross-checked
//! against `original_source/src/analysis/dom_tree.c`'s `SIZE_MAX`-sentinel,
//! postorder-indexed variant of the same algorithm. One [`DominatorTree`] is
//! built over the forward post-order for the ordinary dominator tree, and a
//! second is built over the backward post-order (with edges reversed) for
//! the post-dominator tree — same algorithm, parameterized by
//! [`crate::flowgraph::Direction`].
//!
//! `dom_tree.c`'s `dom_tree_create` derives each node's `depth` by reading
//! its immediate dominator's already-computed `depth` while iterating
//! vertices in ascending postorder-index order; since an idom's postorder
//! index is always *greater than or equal to* the index of any node it
//! dominates, that only works if the dominator has already been visited —
//! which requires iterating in the opposite (descending) order from what a
//! plain ascending loop gives. This port iterates depths in explicitly
//! descending postorder-index order (root first) so every idom is resolved
//! before the node it dominates, avoiding that ordering hazard.

use crate::flowgraph::{ControlFlowGraph, Direction};
use crate::ir::entities::Block;
use fir_entity::SecondaryMap;

/// A dominator (or post-dominator) tree over one [`ControlFlowGraph`].
pub struct DominatorTree {
    root: Block,
    idom: SecondaryMap<Block, Option<Block>>,
    depth: SecondaryMap<Block, u32>,
    reachable: SecondaryMap<Block, bool>,
}

impl DominatorTree {
    /// Compute the dominator tree (`dir = Forward`) or post-dominator tree
    /// (`dir = Backward`) of `cfg`.
    pub fn compute(cfg: &ControlFlowGraph, dir: Direction) -> DominatorTree {
        let (root, order, order_index) = match dir {
            Direction::Forward => (cfg.source(), cfg.post_order(), |cfg: &ControlFlowGraph, b: Block| cfg.post_order_index(b)),
            Direction::Backward => (cfg.sink(), cfg.post_order_back(), |cfg: &ControlFlowGraph, b: Block| cfg.post_order_back_index(b)),
        };
        let n = order.len();

        let mut idom: SecondaryMap<Block, Option<Block>> = SecondaryMap::new();
        idom.resize(cfg.node_count());
        let mut reachable: SecondaryMap<Block, bool> = SecondaryMap::with_default(false);
        reachable.resize(cfg.node_count());
        for &b in order {
            reachable[b] = true;
        }

        // order[n - 1] is always `root` (finishes last in its own postorder).
        idom[root] = Some(root);

        let index = |b: Block| order_index(cfg, b).expect("node absent from its own postorder");

        let mut changed = true;
        while changed {
            changed = false;
            for i in (0..n.saturating_sub(1)).rev() {
                let b = order[i];
                let preds = cfg.edges(b, dir.reverse());
                let mut new_idom: Option<Block> = None;
                for &p in preds {
                    if idom[p].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => p,
                        Some(cur) => intersect(&idom, &index, cur, p),
                    });
                }
                if new_idom.is_some() && idom[b] != new_idom {
                    idom[b] = new_idom;
                    changed = true;
                }
            }
        }

        idom[root] = None;

        let mut depth: SecondaryMap<Block, u32> = SecondaryMap::new();
        depth.resize(cfg.node_count());
        depth[root] = 0;
        for i in (0..n.saturating_sub(1)).rev() {
            let b = order[i];
            if let Some(d) = idom[b] {
                depth[b] = depth[d] + 1;
            }
        }

        DominatorTree {
            root,
            idom,
            depth,
            reachable,
        }
    }

    /// Is `block` reachable in the direction this tree was computed over?
    pub fn is_reachable(&self, block: Block) -> bool {
        self.reachable.get(block).copied().unwrap_or(false)
    }

    /// The immediate dominator of `block`, or `None` for the root or an
    /// unreachable block.
    pub fn idom(&self, block: Block) -> Option<Block> {
        self.idom.get(block).copied().flatten()
    }

    /// This block's depth in the tree (root is 0).
    pub fn depth(&self, block: Block) -> u32 {
        self.depth.get(block).copied().unwrap_or(0)
    }

    /// Does `a` dominate `b` (reflexively: every block dominates itself)?
    pub fn dominates(&self, a: Block, b: Block) -> bool {
        if !self.is_reachable(b) {
            return false;
        }
        let mut cur = b;
        loop {
            if cur == a {
                return true;
            }
            match self.idom(cur) {
                Some(next) => cur = next,
                None => return cur == a,
            }
        }
    }

    /// The deeper of two blocks in the tree (used by the scheduler's
    /// "deepest dominating block" meet).
    pub fn deepest(&self, a: Block, b: Block) -> Block {
        if self.depth(a) >= self.depth(b) {
            a
        } else {
            b
        }
    }

    /// The nearest common dominator of `a` and `b`.
    pub fn common_dominator(&self, mut a: Block, mut b: Block) -> Block {
        while a != b {
            while self.depth(a) > self.depth(b) {
                a = self.idom(a).unwrap_or(self.root);
            }
            while self.depth(b) > self.depth(a) {
                b = self.idom(b).unwrap_or(self.root);
            }
            if a != b && self.depth(a) == self.depth(b) {
                a = self.idom(a).unwrap_or(self.root);
                b = self.idom(b).unwrap_or(self.root);
            }
        }
        a
    }
}

fn intersect(
    idom: &SecondaryMap<Block, Option<Block>>,
    index: &impl Fn(Block) -> u32,
    mut a: Block,
    mut b: Block,
) -> Block {
    while a != b {
        while index(a) < index(b) {
            a = idom[a].expect("walked past a node with no idom during intersect");
        }
        while index(b) < index(a) {
            b = idom[b].expect("walked past a node with no idom during intersect");
        }
    }
    a
}
