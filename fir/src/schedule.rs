//! The global code scheduler (spec.md §4.7 H) and its block-list pool
//! (spec.md §4.8).
//!
//! Grounded on `original_source/src/analysis/schedule.c`, a direct port of
//! C. Click's "Global Code Motion -- Global Value Numbering" two-phase
//! early/late scheduler, extended (per that file's own header comment) so
//! that no node is ever partially dead: every node is assigned to a *set* of
//! blocks rather than a single one, and a live-range analysis prunes that
//! set before it is finalized. Early and late schedules are each computed
//! with an explicit restart stack (spec.md §9), mirroring `schedule.c`'s
//! `early_stack`/`late_stack`/`visit_stack` exactly.

use crate::flowgraph::ControlFlowGraph;
use crate::dominator_tree::DominatorTree;
use crate::ir::entities::{Block, BlockListRef, NodeRef};
use crate::ir::tag::{Tag, TypeTag};
use crate::liveness::Liveness;
use crate::loop_analysis::LoopForest;
use crate::module::Module;
use fir_entity::{EntitySet, PrimaryMap, SecondaryMap};
use std::collections::HashMap;

/// Interns sorted, de-duplicated sets of [`Block`]s (spec.md §4.8), keyed by
/// their sorted contents. One pool is owned by one [`Schedule`].
pub struct BlockListPool {
    lists: PrimaryMap<BlockListRef, Vec<Block>>,
    intern: HashMap<Vec<Block>, BlockListRef>,
}

impl BlockListPool {
    /// An empty pool.
    pub fn new() -> BlockListPool {
        BlockListPool {
            lists: PrimaryMap::new(),
            intern: HashMap::new(),
        }
    }

    /// Intern the set `blocks`, sorting and de-duplicating first so that two
    /// calls with the same elements in different orders return the same
    /// reference (spec.md §4.8: "keyed by `(len, ids)`").
    pub fn intern(&mut self, blocks: &[Block]) -> BlockListRef {
        let mut sorted: Vec<Block> = blocks.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&existing) = self.intern.get(&sorted) {
            return existing;
        }
        let r = self.lists.push(sorted.clone());
        self.intern.insert(sorted, r);
        r
    }

    /// The blocks making up an interned block list.
    pub fn blocks(&self, r: BlockListRef) -> &[Block] {
        &self.lists[r]
    }
}

impl Default for BlockListPool {
    fn default() -> Self {
        BlockListPool::new()
    }
}

/// The result of scheduling one function: every in-schedule node's block
/// set, and every block's ordered contents (spec.md §3 Schedule).
pub struct Schedule {
    late_blocks: HashMap<NodeRef, BlockListRef>,
    block_contents: SecondaryMap<Block, Vec<NodeRef>>,
    block_list_pool: BlockListPool,
}

impl Schedule {
    /// Run the scheduler over `cfg`, using `dom` (the *forward* dominator
    /// tree of `cfg`) and `loop_forest` to place every non-invariant,
    /// non-nominal node of `cfg.func()` into one or more blocks.
    pub fn compute(module: &Module, cfg: &ControlFlowGraph, dom: &DominatorTree, loop_forest: &LoopForest) -> Schedule {
        let mut scheduler = Scheduler {
            early_blocks: HashMap::new(),
            late_blocks: HashMap::new(),
            early_stack: Vec::new(),
            late_stack: Vec::new(),
            pushed: EntitySet::new(),
            visit_stack: Vec::new(),
            liveness: Liveness::new(),
            block_contents: SecondaryMap::new(),
            block_list_pool: BlockListPool::new(),
        };
        scheduler.block_contents.resize(cfg.node_count());

        for &block in cfg.post_order() {
            if let Some(func) = cfg.func_of(block) {
                if let Some(&body) = module.node(func).operands.get(0) {
                    if is_in_schedule(module, body) {
                        scheduler.visit_node(module, cfg, dom, loop_forest, body);
                    }
                }
            }
        }

        log::debug!(
            "schedule({}): {} nodes placed",
            cfg.func(),
            scheduler.late_blocks.len()
        );

        Schedule {
            late_blocks: scheduler.late_blocks,
            block_contents: scheduler.block_contents,
            block_list_pool: scheduler.block_list_pool,
        }
    }

    /// The nodes placed in `block`, in the producer-before-consumer order
    /// the driver built them in (spec.md §4.7 "Ordering guarantees").
    pub fn block_contents(&self, block: Block) -> &[NodeRef] {
        self.block_contents.get(block).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The block set `node` was scheduled into, or `None` if it was never
    /// visited by the scheduler (out of schedule, or unreachable).
    pub fn blocks_of(&self, node: NodeRef) -> Option<&[Block]> {
        self.late_blocks
            .get(&node)
            .map(|&bl| self.block_list_pool.blocks(bl))
    }

    /// Is `node` scheduled into `block`?
    pub fn is_in_block(&self, node: NodeRef, block: Block) -> bool {
        self.blocks_of(node).map_or(false, |bs| bs.contains(&block))
    }
}

/// spec.md §4.7 "Classification predicates used — in-schedule": not marked
/// invariant, not a type, not a `func`, not a `global`.
fn is_in_schedule(module: &Module, node: NodeRef) -> bool {
    let data = module.node(node);
    !data.invariant && !data.is_ty() && !data.is_nominal()
}

/// spec.md §4.7 "A block's function node is its entry for ordinary
/// functions, else the continuation itself."
fn find_func_block(module: &Module, cfg: &ControlFlowGraph, func: NodeRef) -> Block {
    let ty = module.node(func).ty.expect("func node has no type");
    if module.is_continuation_type(ty) {
        cfg.block_of(func).expect("continuation not present in this function's CFG")
    } else {
        cfg.block_of(func).unwrap_or_else(|| cfg.source())
    }
}

fn is_noret(module: &Module, ty: NodeRef) -> bool {
    module.node(ty).type_tag == Some(TypeTag::NoRet)
}

/// Transient scheduling state, alive only for the duration of one
/// [`Schedule::compute`] call; `early_blocks` is discarded once every node's
/// late block set has been computed.
struct Scheduler {
    early_blocks: HashMap<NodeRef, Block>,
    late_blocks: HashMap<NodeRef, BlockListRef>,
    early_stack: Vec<NodeRef>,
    late_stack: Vec<NodeRef>,
    /// Every node ever pushed onto `visit_stack`, so the driver visits each
    /// node's subtree exactly once across the whole function.
    pushed: EntitySet<NodeRef>,
    visit_stack: Vec<(NodeRef, usize)>,
    liveness: Liveness,
    block_contents: SecondaryMap<Block, Vec<NodeRef>>,
    block_list_pool: BlockListPool,
}

impl Scheduler {
    /// `early(n)`: the deepest block in the dominator tree that dominates
    /// every operand's early block (spec.md §4.7 "Early schedule").
    fn schedule_early(&mut self, module: &Module, cfg: &ControlFlowGraph, dom: &DominatorTree, target: NodeRef) -> Block {
        debug_assert!(self.early_stack.is_empty());
        if let Some(&b) = self.early_blocks.get(&target) {
            return b;
        }
        self.early_stack.push(target);

        while let Some(&node) = self.early_stack.last() {
            if self.early_blocks.contains_key(&node) {
                self.early_stack.pop();
                continue;
            }
            let data = module.node(node);
            let early = if data.tag() == Tag::Param {
                Some(find_func_block(module, cfg, data.operands[0]))
            } else if data.invariant || data.is_nominal() {
                Some(cfg.block_of(node).unwrap_or_else(|| cfg.source()))
            } else {
                self.compute_early_block(module, cfg, dom, node)
            };
            match early {
                Some(b) => {
                    self.early_blocks.insert(node, b);
                    self.early_stack.pop();
                }
                // An unresolved operand was pushed; restart at the new top.
                None => continue,
            }
        }

        self.early_blocks[&target]
    }

    /// The operand-meet part of `schedule_early`; `None` means an operand's
    /// early block isn't known yet and has been pushed onto `early_stack`
    /// (spec.md §9's restart discipline).
    fn compute_early_block(&mut self, module: &Module, cfg: &ControlFlowGraph, dom: &DominatorTree, node: NodeRef) -> Option<Block> {
        let mut early = cfg.source();
        let operands = module.node(node).operands.clone();
        for &op in &operands {
            if !is_in_schedule(module, op) {
                continue;
            }
            match self.early_blocks.get(&op).copied() {
                Some(b) => early = dom.deepest(early, b),
                None => {
                    self.early_stack.push(op);
                    return None;
                }
            }
        }

        // Stores must not be scheduled earlier than any load reading the
        // same memory token (spec.md §4.7).
        if module.node(node).tag() == Tag::Store {
            let mem = operands[0];
            let loads: Vec<NodeRef> = module
                .uses_of(mem)
                .filter(|&(user, _)| module.node(user).tag == Some(Tag::Load))
                .map(|(user, _)| user)
                .collect();
            for load in loads {
                match self.early_blocks.get(&load).copied() {
                    Some(b) => early = dom.deepest(early, b),
                    None => {
                        self.early_stack.push(load);
                        return None;
                    }
                }
            }
        }

        Some(early)
    }

    /// `late(n)`: the pruned set of blocks `n` may be placed in (spec.md
    /// §4.7 "Late schedule").
    fn schedule_late(
        &mut self,
        module: &Module,
        cfg: &ControlFlowGraph,
        dom: &DominatorTree,
        loop_forest: &LoopForest,
        target: NodeRef,
    ) -> BlockListRef {
        debug_assert!(self.late_stack.is_empty());
        self.late_stack.push(target);

        while let Some(&node) = self.late_stack.last() {
            if self.late_blocks.contains_key(&node) {
                self.late_stack.pop();
                continue;
            }
            let data = module.node(node);
            let late = if data.tag() == Tag::Param {
                let block = find_func_block(module, cfg, data.operands[0]);
                Some(self.block_list_pool.intern(&[block]))
            } else if data.tag() == Tag::Func && module.is_continuation_type(data.ty.unwrap()) {
                let block = find_func_block(module, cfg, node);
                Some(self.block_list_pool.intern(&[block]))
            } else if data.invariant || data.is_nominal() {
                let block = cfg.block_of(node).unwrap_or_else(|| cfg.source());
                Some(self.block_list_pool.intern(&[block]))
            } else {
                self.compute_late_blocks(module, cfg, dom, loop_forest, node)
            };
            match late {
                Some(bl) => {
                    self.late_blocks.insert(node, bl);
                    self.late_stack.pop();
                }
                None => continue,
            }
        }

        self.late_blocks[&target]
    }

    /// Collect every known late block of `n`'s uses, or push the first
    /// unresolved one and signal a restart.
    fn collect_late_blocks(&mut self, uses_blocks: &mut Vec<Block>, n: NodeRef) -> bool {
        match self.late_blocks.get(&n).copied() {
            Some(bl) => {
                uses_blocks.extend_from_slice(self.block_list_pool.blocks(bl));
                true
            }
            None => {
                self.late_stack.push(n);
                false
            }
        }
    }

    fn compute_late_blocks(
        &mut self,
        module: &Module,
        cfg: &ControlFlowGraph,
        dom: &DominatorTree,
        loop_forest: &LoopForest,
        node: NodeRef,
    ) -> Option<BlockListRef> {
        let mut uses_blocks: Vec<Block> = Vec::new();
        let users: Vec<NodeRef> = module.uses_of(node).map(|(u, _)| u).collect();
        for user in users {
            if !self.collect_late_blocks(&mut uses_blocks, user) {
                return None;
            }
        }

        // Loads must be scheduled before any store writing the same memory
        // token, so they pull in that store's late blocks too (spec.md §4.7).
        if module.node(node).tag() == Tag::Load {
            let mem = module.node(node).operands[0];
            let stores: Vec<NodeRef> = module
                .uses_of(mem)
                .filter(|&(user, _)| module.node(user).tag == Some(Tag::Store))
                .map(|(user, _)| user)
                .collect();
            for store in stores {
                if !self.collect_late_blocks(&mut uses_blocks, store) {
                    return None;
                }
            }
        }
        debug_assert!(!uses_blocks.is_empty());

        let ty = module.node(node).ty.expect("in-schedule node has no type");
        if !is_noret(module, ty) {
            let early_block = self.schedule_early(module, cfg, dom, node);

            if uses_blocks.len() > 1 {
                self.liveness.reset();
                for &b in &uses_blocks {
                    self.liveness.mark_blocks(cfg, early_block, b);
                }
                self.liveness.finalize(cfg);
                prune_live_blocks(&self.liveness, dom, &mut uses_blocks);
            }

            if module.node(node).tag().is_speculatable() {
                for b in uses_blocks.iter_mut() {
                    *b = find_shallowest_loop_block(dom, loop_forest, early_block, *b);
                }
            }

            prune_dominated_blocks(dom, &mut uses_blocks);
        }

        Some(self.block_list_pool.intern(&uses_blocks))
    }

    /// Visit `root` and its in-schedule operand tree in post-order, placing
    /// each finished node into every block of its late schedule (spec.md
    /// §4.7 "Driver"). Explicit stack with restart semantics, per spec.md §9.
    fn visit_node(&mut self, module: &Module, cfg: &ControlFlowGraph, dom: &DominatorTree, loop_forest: &LoopForest, root: NodeRef) {
        if !self.pushed.insert(root) {
            return;
        }
        self.visit_stack.push((root, 0));

        while let Some(&mut (node, ref mut i)) = self.visit_stack.last_mut() {
            let operands = module.node(node).operands.clone();
            let mut restarted = false;
            while *i < operands.len() {
                let op = operands[*i];
                *i += 1;
                if is_in_schedule(module, op) && self.pushed.insert(op) {
                    self.visit_stack.push((op, 0));
                    restarted = true;
                    break;
                }
            }
            if restarted {
                continue;
            }

            self.visit_stack.pop();
            if !module.node(node).is_nominal() {
                let late = self.schedule_late(module, cfg, dom, loop_forest, node);
                for &b in self.block_list_pool.blocks(late).to_vec().iter() {
                    self.block_contents[b].push(node);
                }
            }
        }
    }
}

/// Group uses under a common dominator when that dominator is itself fully
/// live: if a fully live block dominates two or more of the candidate
/// blocks, replace those with the dominator (spec.md §4.7 "Late schedule"
/// step 2).
fn prune_live_blocks(liveness: &Liveness, dom: &DominatorTree, uses_blocks: &mut Vec<Block>) {
    for live_block in liveness.fully_live_iter() {
        if uses_blocks.len() <= 1 {
            return;
        }
        let dominated_count = uses_blocks.iter().filter(|&&u| dom.dominates(live_block, u)).count();
        if dominated_count > 1 {
            uses_blocks.retain(|&u| !dom.dominates(live_block, u));
            uses_blocks.push(live_block);
        }
    }
}

/// For a speculatable node, walk the dominator chain from `use_block`
/// towards `early_block`, hoisting to the shallowest block whose loop depth
/// doesn't exceed `use_block`'s own (spec.md §4.7 "Late schedule" step 3).
fn find_shallowest_loop_block(dom: &DominatorTree, loop_forest: &LoopForest, early_block: Block, mut use_block: Block) -> Block {
    debug_assert!(dom.depth(early_block) <= dom.depth(use_block));
    let min_depth = loop_forest.loop_depth(early_block);
    if loop_forest.loop_depth(use_block) == min_depth {
        return use_block;
    }
    let mut cursor = use_block;
    while cursor != early_block {
        let depth = loop_forest.loop_depth(cursor);
        if depth < loop_forest.loop_depth(use_block) {
            use_block = cursor;
        }
        if depth == min_depth {
            break;
        }
        cursor = dom.idom(cursor).expect("walked off the dominator tree before reaching early_block");
    }
    use_block
}

/// Remove blocks dominated by another block still in the set: they are
/// redundant placements (spec.md §4.7 "Late schedule" step 4).
fn prune_dominated_blocks(dom: &DominatorTree, blocks: &mut Vec<Block>) {
    if blocks.len() <= 1 {
        return;
    }
    let snapshot = blocks.clone();
    let mut kept = Vec::with_capacity(snapshot.len());
    for (i, &b) in snapshot.iter().enumerate() {
        let dominated_by_another = snapshot
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .all(|(_, &other)| dom.dominates(other, b));
        if !dominated_by_another {
            kept.push(b);
        }
    }
    *blocks = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::Linkage;

    fn diamond(m: &mut Module) -> NodeRef {
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
    fn every_in_schedule_node_gets_a_non_empty_block_set() {
        let mut m = Module::new("t");
        let func = diamond(&mut m);
        let cfg = ControlFlowGraph::compute(&m, func);
        let dom = DominatorTree::compute(&cfg, crate::flowgraph::Direction::Forward);
        let loop_forest = LoopForest::compute(&cfg);
        let schedule = Schedule::compute(&m, &cfg, &dom, &loop_forest);

        for &block in cfg.post_order() {
            for &node in schedule.block_contents(block) {
                let blocks = schedule.blocks_of(node).expect("scheduled node has a block set");
                assert!(!blocks.is_empty(), "spec.md invariant 7: schedule coverage");
                assert!(blocks.contains(&block));
            }
        }
    }

    #[test]
    fn branch_is_pinned_to_its_own_block_not_duplicated() {
        let mut m = Module::new("t");
        let func = diamond(&mut m);
        let cfg = ControlFlowGraph::compute(&m, func);
        let dom = DominatorTree::compute(&cfg, crate::flowgraph::Direction::Forward);
        let loop_forest = LoopForest::compute(&cfg);
        let schedule = Schedule::compute(&m, &cfg, &dom, &loop_forest);

        let entry = cfg.block_of(func).unwrap();
        let branch = m.node(func).operands[0];
        let blocks = schedule.blocks_of(branch).unwrap();
        assert_eq!(blocks, &[entry], "a noret control node must not move or duplicate");
    }

    #[test]
    fn a_value_used_in_both_diamond_arms_is_hoisted_to_the_shared_dominator() {
        // `func_param` is used directly as the argument forwarded by both
        // `t_cont` and `f_cont`; its shared dominator is `func`'s own entry
        // block, but `func_param` is pinned there anyway (param rule), so
        // exercise a derived speculatable value instead.
        let mut m = Module::new("t");
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
        let one = m.const_int(i32_ty, 1);
        let incremented = m.iadd(i32_ty, func_param, one);
        let zero = m.const_int(i32_ty, 0);
        let cond = m.icmp_eq(m.bool_type(), func_param, zero);
        let branch = m.branch(noret, cond, t_cont, f_cont);
        m.set_op(func, 0, branch);

        let t_body = m.call(ret_cont, incremented);
        m.set_op(t_cont, 0, t_body);
        let f_body = m.call(ret_cont, incremented);
        m.set_op(f_cont, 0, f_body);

        let cfg = ControlFlowGraph::compute(&m, func);
        let dom = DominatorTree::compute(&cfg, crate::flowgraph::Direction::Forward);
        let loop_forest = LoopForest::compute(&cfg);
        let schedule = Schedule::compute(&m, &cfg, &dom, &loop_forest);

        let entry = cfg.block_of(func).unwrap();
        let blocks = schedule.blocks_of(incremented).unwrap();
        assert_eq!(blocks, &[entry]);
    }
}
