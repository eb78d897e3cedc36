//! Block liveness for the global code scheduler (spec.md §4.6 G).
//!
//! Grounded on `original_source/src/analysis/liveness.c`: rather than the
//! classic dataflow fixed point over def/use sets, this walks backward from
//! a single `(def, use)` pair at a time, which is all the scheduler ever
//! needs (a candidate placement block and the late-schedule block a value
//! is actually used from). A block is "partially live" once any walk
//! reaches it, and "fully live" once every one of its successors is fully
//! live — so liveness only ever needs to be asked about one value's
//! def/use pair, not recomputed whole-function.

use crate::flowgraph::ControlFlowGraph;
use crate::ir::entities::Block;
use fir_entity::EntitySet;

/// Reusable liveness state for one function's scheduler run.
///
/// One instance is built once per function and `reset()` between values,
/// rather than reallocating its sets for every scheduled node.
pub struct Liveness {
    partially_live: EntitySet<Block>,
    fully_live: EntitySet<Block>,
    /// Insertion order of `partially_live` members, so `finalize` doesn't
    /// need an iterator over the bitset.
    partial_order: Vec<Block>,
    stack: Vec<Block>,
}

impl Liveness {
    /// Create empty liveness state.
    pub fn new() -> Liveness {
        Liveness {
            partially_live: EntitySet::new(),
            fully_live: EntitySet::new(),
            partial_order: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Mark the path from `def` (exclusive) to `use_` (inclusive) as live,
    /// walking backward over the CFG's incoming edges.
    pub fn mark_blocks(&mut self, cfg: &ControlFlowGraph, def: Block, use_: Block) {
        if self.partially_live.insert(use_) {
            self.partial_order.push(use_);
        }
        self.fully_live.insert(use_);
        self.stack.push(use_);

        while let Some(block) = self.stack.pop() {
            for &pred in cfg.predecessors(block) {
                if pred == def {
                    continue;
                }
                if self.partially_live.insert(pred) {
                    self.partial_order.push(pred);
                    self.stack.push(pred);
                }
            }
        }
    }

    /// Promote every partially live block whose successors are all fully
    /// live to fully live, to a fixed point.
    pub fn finalize(&mut self, cfg: &ControlFlowGraph) {
        let mut changed = true;
        while changed {
            changed = false;
            for &block in &self.partial_order {
                if self.fully_live.contains(block) {
                    continue;
                }
                if cfg
                    .successors(block)
                    .iter()
                    .all(|&s| self.fully_live.contains(s))
                {
                    self.fully_live.insert(block);
                    changed = true;
                }
            }
        }
    }

    /// Is `block` live on at least one path to the value's use?
    pub fn is_partially_live(&self, block: Block) -> bool {
        self.partially_live.contains(block)
    }

    /// Is `block` live on every path out of it?
    pub fn is_fully_live(&self, block: Block) -> bool {
        self.fully_live.contains(block)
    }

    /// Iterate the fully live blocks. Every fully live block was marked
    /// partially live first (`finalize` only ever promotes), so filtering
    /// `partial_order` finds them all without needing a set iterator.
    pub fn fully_live_iter(&self) -> impl Iterator<Item = Block> + '_ {
        self.partial_order
            .iter()
            .copied()
            .filter(move |&b| self.fully_live.contains(b))
    }

    /// Clear all state for reuse on the next value.
    pub fn reset(&mut self) {
        self.partially_live = EntitySet::new();
        self.fully_live = EntitySet::new();
        self.partial_order.clear();
        self.stack.clear();
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Liveness::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::Linkage;
    use crate::module::Module;

    fn diamond(m: &mut Module) -> crate::ir::entities::NodeRef {
        let i32_ty = m.int_type(32);
        let noret = m.noret_type();
        let cont_ty = m.func_type(i32_ty, noret);
        let func_ty = m.func_type(i32_ty, i32_ty);
        let func = m.create_function(func_ty, Linkage::Exported);
        let ret_cont = m.create_function(cont_ty, Linkage::Internal);
        let t_cont = m.create_function(cont_ty, Linkage::Internal);
        let f_cont = m.create_function(cont_ty, Linkage::Internal);
        let ret_param = m.param(ret_cont);
        m.set_op(ret_cont, 0, ret_param);
        let func_param = m.param(func);
        let zero = m.const_int(i32_ty, 0);
        let cond = m.icmp_eq(m.bool_type(), func_param, zero);
        let branch = m.branch(noret, cond, t_cont, f_cont);
        m.set_op(func, 0, branch);
        let t_body = m.call(ret_cont, func_param);
        m.set_op(t_cont, 0, t_body);
        let f_body = m.call(ret_cont, func_param);
        m.set_op(f_cont, 0, f_body);
        func
    }

    #[test]
    fn use_in_one_arm_is_not_fully_live_at_entry() {
        let mut m = Module::new("t");
        let func = diamond(&mut m);
        let cfg = ControlFlowGraph::compute(&m, func);
        let entry = cfg.block_of(func).unwrap();
        let t_cont = cfg.successors(entry)[0];

        let mut live = Liveness::new();
        live.mark_blocks(&cfg, entry, t_cont);
        live.finalize(&cfg);

        assert!(live.is_partially_live(t_cont));
        assert!(live.is_partially_live(entry));
        assert!(!live.is_fully_live(entry));
    }

    #[test]
    fn reset_clears_all_state() {
        let mut m = Module::new("t");
        let func = diamond(&mut m);
        let cfg = ControlFlowGraph::compute(&m, func);
        let entry = cfg.block_of(func).unwrap();
        let t_cont = cfg.successors(entry)[0];

        let mut live = Liveness::new();
        live.mark_blocks(&cfg, entry, t_cont);
        live.reset();
        assert!(!live.is_partially_live(t_cont));
        assert!(!live.is_partially_live(entry));
    }
}
