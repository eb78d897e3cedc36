//! Loop-nesting forest over a control-flow graph (spec.md §4.5 F).
//!
//! Grounded on `original_source/src/analysis/loop_tree.c`: Havlak's
//! near-linear loop-structure algorithm, built from a depth-first spanning
//! tree of the CFG plus a union-find over loop headers. Nodes are processed
//! in descending depth-first preorder (deepest-discovered first, entry
//! last), so an inner loop's header is always resolved before the outer
//! loop containing it, which is what lets a single backward pass assign
//! every node its innermost enclosing header.
//!
//! Like `dom_tree.c`, the C original tracks `last_descendant` and
//! `is_ancestor` over a `size_t`-indexed node array; here the same
//! quantities are computed over this port's `Block` entity references.

use crate::flowgraph::ControlFlowGraph;
use crate::ir::entities::Block;
use fir_entity::SecondaryMap;

/// How a block that is the target of at least one back edge classifies.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LoopKind {
    /// Not the target of any back edge: not a loop header.
    NonHeader,
    /// A single back edge from the header to itself.
    SelfLoop,
    /// A natural loop: every back edge's source is dominated by this header
    /// within the depth-first spanning tree.
    Reducible,
    /// A loop with at least one back edge whose source is not provably
    /// nested under this header by the spanning tree alone (a multi-entry
    /// loop; spec.md §4.5 F.3 requires these be reported, not rejected).
    Irreducible,
}

/// The loop-nesting forest of one function's control-flow graph.
pub struct LoopForest {
    kind: SecondaryMap<Block, LoopKind>,
    /// For a loop header: its immediately enclosing (outer) header, if any.
    /// For any other block: the innermost loop header containing it, if
    /// any. `None` means "no enclosing loop" in both cases.
    header: SecondaryMap<Block, Option<Block>>,
}

impl LoopForest {
    /// Compute the loop forest of `cfg`.
    pub fn compute(cfg: &ControlFlowGraph) -> LoopForest {
        let root = cfg.source();
        let n = cfg.node_count();

        let mut dfs_number: SecondaryMap<Block, Option<u32>> = SecondaryMap::new();
        dfs_number.resize(n);
        let mut order: Vec<Block> = Vec::new();
        let mut parent: Vec<u32> = Vec::new();

        dfs_number[root] = Some(0);
        order.push(root);
        parent.push(0);
        let mut stack: Vec<(Block, usize)> = vec![(root, 0)];
        while let Some(&mut (node, ref mut i)) = stack.last_mut() {
            let succs = cfg.successors(node);
            if *i < succs.len() {
                let next = succs[*i];
                *i += 1;
                if dfs_number[next].is_none() {
                    let idx = order.len() as u32;
                    dfs_number[next] = Some(idx);
                    order.push(next);
                    parent.push(dfs_number[node].unwrap());
                    stack.push((next, 0));
                }
            } else {
                stack.pop();
            }
        }

        let size = order.len();
        let mut last: Vec<u32> = (0..size as u32).collect();
        for w in (1..size).rev() {
            let p = parent[w] as usize;
            if last[w] > last[p] {
                last[p] = last[w];
            }
        }
        let is_ancestor = |w: u32, v: u32| w <= v && v <= last[w as usize];

        let mut non_back_preds: Vec<Vec<u32>> = vec![Vec::new(); size];
        let mut back_preds: Vec<Vec<u32>> = vec![Vec::new(); size];
        for (w, &block) in order.iter().enumerate() {
            for &pred in cfg.predecessors(block) {
                let v = match dfs_number[pred] {
                    Some(v) => v,
                    None => continue,
                };
                if is_ancestor(w as u32, v) {
                    back_preds[w].push(v);
                } else {
                    non_back_preds[w].push(v);
                }
            }
        }

        let mut kind: Vec<LoopKind> = vec![LoopKind::NonHeader; size];
        let mut header: Vec<u32> = (0..size as u32).collect();
        let mut uf: Vec<u32> = (0..size as u32).collect();

        for w in (0..size).rev() {
            let wu = w as u32;
            let mut p: Vec<u32> = Vec::new();
            for &v in &back_preds[w] {
                if v != wu {
                    p.push(find(&mut uf, v));
                } else {
                    kind[w] = LoopKind::SelfLoop;
                }
            }
            let mut work_list = p.clone();
            if !p.is_empty() {
                kind[w] = LoopKind::Reducible;
            }
            while let Some(x) = work_list.pop() {
                let preds_of_x = non_back_preds[x as usize].clone();
                for y in preds_of_x {
                    let yy = find(&mut uf, y);
                    if !is_ancestor(wu, yy) {
                        kind[w] = LoopKind::Irreducible;
                        non_back_preds[w].push(yy);
                    } else if yy != wu && !p.contains(&yy) {
                        p.push(yy);
                        work_list.push(yy);
                    }
                }
            }
            for &x in &p {
                header[x as usize] = wu;
                uf[x as usize] = wu;
            }
        }

        let mut kind_map: SecondaryMap<Block, LoopKind> = SecondaryMap::with_default(LoopKind::NonHeader);
        kind_map.resize(n);
        let mut header_map: SecondaryMap<Block, Option<Block>> = SecondaryMap::new();
        header_map.resize(n);
        for (idx, &block) in order.iter().enumerate() {
            kind_map[block] = kind[idx];
            header_map[block] = if header[idx] == idx as u32 {
                None
            } else {
                Some(order[header[idx] as usize])
            };
        }

        log::debug!(
            "loop_tree: {} reachable blocks, {} loop headers",
            size,
            kind.iter().filter(|k| **k != LoopKind::NonHeader).count()
        );

        LoopForest {
            kind: kind_map,
            header: header_map,
        }
    }

    /// How `block` classifies as a (possible) loop header.
    pub fn kind(&self, block: Block) -> LoopKind {
        self.kind.get(block).copied().unwrap_or(LoopKind::NonHeader)
    }

    /// Is `block` the header of some loop?
    pub fn is_loop_header(&self, block: Block) -> bool {
        self.kind(block) != LoopKind::NonHeader
    }

    /// The innermost loop header directly containing `block` (for a header,
    /// its enclosing outer loop's header). `None` at top level.
    pub fn enclosing_header(&self, block: Block) -> Option<Block> {
        self.header.get(block).copied().flatten()
    }

    /// The number of loops `block` is nested within (0 if none).
    pub fn loop_depth(&self, block: Block) -> u32 {
        let mut depth = 0;
        let mut cur = block;
        loop {
            if self.is_loop_header(cur) {
                depth += 1;
            }
            match self.enclosing_header(cur) {
                Some(next) => cur = next,
                None => break,
            }
        }
        depth
    }
}

fn find(uf: &mut [u32], mut x: u32) -> u32 {
    let mut root = x;
    while uf[root as usize] != root {
        root = uf[root as usize];
    }
    while uf[x as usize] != root {
        let next = uf[x as usize];
        uf[x as usize] = root;
        x = next;
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::Linkage;
    use crate::module::Module;

    /// `entry -> header -> {body -> header (back edge), exit}`: a single
    /// reducible natural loop with one back edge.
    fn single_loop(m: &mut Module) -> crate::ir::entities::NodeRef {
        let i32_ty = m.int_type(32);
        let noret = m.noret_type();
        let cont_ty = m.func_type(i32_ty, noret);
        let func_ty = m.func_type(i32_ty, i32_ty);

        let func = m.create_function(func_ty, Linkage::Exported);
        let header = m.create_function(cont_ty, Linkage::Internal);
        let body = m.create_function(cont_ty, Linkage::Internal);
        let exit = m.create_function(cont_ty, Linkage::Internal);

        let func_param = m.param(func);
        let entry_body = m.call(header, func_param);
        m.set_op(func, 0, entry_body);

        let header_param = m.param(header);
        let zero = m.const_int(i32_ty, 0);
        let cond = m.icmp_eq(m.bool_type(), header_param, zero);
        let branch = m.branch(noret, cond, exit, body);
        m.set_op(header, 0, branch);

        let body_param = m.param(body);
        let back = m.call(header, body_param);
        m.set_op(body, 0, back);

        let exit_param = m.param(exit);
        m.set_op(exit, 0, exit_param);

        func
    }

    #[test]
    fn single_back_edge_loop_is_reducible() {
        let mut m = Module::new("t");
        let func = single_loop(&mut m);
        let cfg = ControlFlowGraph::compute(&m, func);
        let forest = LoopForest::compute(&cfg);

        let header_node = {
            let entry = cfg.block_of(func).unwrap();
            cfg.successors(entry)[0]
        };
        assert_eq!(forest.kind(header_node), LoopKind::Reducible);
        assert_eq!(forest.loop_depth(header_node), 1);

        let body_block = cfg
            .successors(header_node)
            .iter()
            .copied()
            .find(|&b| b != cfg.sink() && forest.enclosing_header(b) == Some(header_node))
            .expect("loop body block reachable from header");
        assert_eq!(forest.loop_depth(body_block), 1);
    }

    #[test]
    fn acyclic_diamond_has_no_loop_headers() {
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
        let zero = m.const_int(i32_ty, 0);
        let cond = m.icmp_eq(m.bool_type(), func_param, zero);
        let branch = m.branch(noret, cond, t_cont, f_cont);
        m.set_op(func, 0, branch);
        let t_body = m.call(ret_cont, func_param);
        m.set_op(t_cont, 0, t_body);
        let f_body = m.call(ret_cont, func_param);
        m.set_op(f_cont, 0, f_body);

        let cfg = ControlFlowGraph::compute(&m, func);
        let forest = LoopForest::compute(&cfg);
        for &b in cfg.depth_first_order() {
            assert_eq!(forest.kind(b), LoopKind::NonHeader);
            assert_eq!(forest.loop_depth(b), 0);
        }
    }
}
