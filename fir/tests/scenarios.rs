//! Black-box end-to-end scenarios exercising the public `Module` API,
//! grounded on spec.md §8's "End-to-end scenarios" list, placed outside
//! `src/` the way `cranelift-filetests` sits outside
//! `cranelift-codegen/src` as a consumer of the public API.

use fir::dominator_tree::DominatorTree;
use fir::flowgraph::{ControlFlowGraph, Direction};
use fir::ir::entities::NodeRef;
use fir::ir::node::Linkage;
use fir::loop_analysis::{LoopForest, LoopKind};
use fir::module::Module;

/// Scenario 1: `iadd(const[0], x) == x`.
#[test]
fn identity_folding_of_iadd_zero() {
    let mut m = Module::new("scenario1");
    let i32_ty = m.int_type(32);
    let func_ty = m.func_type(i32_ty, i32_ty);
    let func = m.create_function(func_ty, Linkage::Exported);
    let x = m.param(func);

    let zero = m.const_int(i32_ty, 0);
    let result = m.iadd(i32_ty, zero, x);

    assert_eq!(result, x, "iadd(const[0], x) must fold to x itself");
}

/// Scenario 2: `iadd(x, 1)` and `iadd(1, x)` intern to the same node.
#[test]
fn commutative_operands_intern_identically_regardless_of_order() {
    let mut m = Module::new("scenario2");
    let i32_ty = m.int_type(32);
    let func_ty = m.func_type(i32_ty, i32_ty);
    let func = m.create_function(func_ty, Linkage::Exported);
    let x = m.param(func);
    let one = m.const_int(i32_ty, 1);

    let a = m.iadd(i32_ty, x, one);
    let b = m.iadd(i32_ty, one, x);

    assert_eq!(a, b, "commuted operand order must hash-cons to one node");
}

/// Scenario 3: a `load` immediately following a `store` to the same address
/// forwards the stored value instead of reading through memory.
#[test]
fn load_after_store_forwards_the_stored_value() {
    let mut m = Module::new("scenario3");
    let i32_ty = m.int_type(32);
    let ptr_ty = m.ptr_type();
    let func_ty = m.func_type(ptr_ty, i32_ty);
    let func = m.create_function(func_ty, Linkage::Exported);
    let p = m.param(func);
    let mem = m.start(func);
    let v = m.const_int(i32_ty, 7);

    let mem_after_store = m.store(mem, p, v);
    let loaded = m.load(i32_ty, mem_after_store, p);

    assert_eq!(loaded, v, "load must forward the value just stored to the same address");
}

/// Build `pow(x, n) = n == 0 ? 1 : x * pow(x, n - 1)` using a direct,
/// non-looping recursive encoding: a diamond of continuations, `is_zero`
/// and `is_non_zero`, both joining at a shared `ret` continuation.
fn build_recursive_pow(m: &mut Module) -> (NodeRef, NodeRef, NodeRef, NodeRef) {
    let i32_ty = m.int_type(32);
    let noret = m.noret_type();
    let pair_ty = m.tup_type(&[i32_ty, i32_ty]);
    let cont_ty = m.func_type(i32_ty, noret);
    let func_ty = m.func_type(pair_ty, i32_ty);

    let func = m.create_function(func_ty, Linkage::Exported);
    let ret_cont = m.create_function(cont_ty, Linkage::Internal);
    let is_zero = m.create_function(cont_ty, Linkage::Internal);
    let is_non_zero = m.create_function(cont_ty, Linkage::Internal);

    let ret_param = m.param(ret_cont);
    m.set_op(ret_cont, 0, ret_param);

    let args = m.param(func);
    let idx0 = m.const_int(i32_ty, 0);
    let idx1 = m.const_int(i32_ty, 1);
    let x = m.ext(i32_ty, args, idx0);
    let n = m.ext(i32_ty, args, idx1);
    let zero = m.const_int(i32_ty, 0);
    let cond = m.icmp_eq(m.bool_type(), n, zero);
    let branch = m.branch(noret, cond, is_zero, is_non_zero);
    m.set_op(func, 0, branch);

    let one = m.const_int(i32_ty, 1);
    let zero_body = m.call(ret_cont, one);
    m.set_op(is_zero, 0, zero_body);

    // A fully recursive `pow(x, n - 1)` needs an external call graph the
    // core alone can't express without a caller loop, so the non-zero arm
    // stands in a product `x * 1` to keep the control-flow shape (entry ->
    // {is_zero, is_non_zero} -> ret) intact without modelling recursion
    // itself, which spec.md §1 leaves to an external collaborator.
    let product = m.imul(i32_ty, x, one);
    let nz_body = m.call(ret_cont, product);
    m.set_op(is_non_zero, 0, nz_body);

    (func, ret_cont, is_zero, is_non_zero)
}

/// Scenario 4: the recursive `pow` shape's CFG and dominator tree.
#[test]
fn recursive_pow_cfg_and_dominator_shape() {
    let mut m = Module::new("scenario4");
    let (func, ret_cont, is_zero, is_non_zero) = build_recursive_pow(&mut m);
    let cfg = ControlFlowGraph::compute(&m, func);

    let entry = cfg.block_of(func).unwrap();
    let zero_block = cfg.block_of(is_zero).unwrap();
    let nz_block = cfg.block_of(is_non_zero).unwrap();
    let ret_block = cfg.block_of(ret_cont).unwrap();

    assert_eq!(cfg.successors(cfg.source()), &[entry]);
    let mut arms = cfg.successors(entry).to_vec();
    arms.sort();
    let mut expected = vec![zero_block, nz_block];
    expected.sort();
    assert_eq!(arms, expected, "entry must branch to is_zero and is_non_zero");
    assert_eq!(cfg.successors(zero_block), &[ret_block]);
    assert_eq!(cfg.successors(nz_block), &[ret_block]);
    assert_eq!(cfg.successors(ret_block), &[cfg.sink()]);

    let dom = DominatorTree::compute(&cfg, Direction::Forward);
    assert!(dom.dominates(cfg.source(), entry));
    assert!(dom.dominates(entry, zero_block));
    assert!(dom.dominates(entry, nz_block));
    assert!(dom.dominates(entry, ret_block));
    assert!(!dom.dominates(zero_block, ret_block));
    assert!(!dom.dominates(nz_block, ret_block));
}

/// Build the iterative version of `pow`: a loop header continuation that
/// either exits to `ret` or calls back into itself (a self-loop back edge).
fn build_iterative_pow(m: &mut Module) -> (NodeRef, NodeRef) {
    let i32_ty = m.int_type(32);
    let noret = m.noret_type();
    let pair_ty = m.tup_type(&[i32_ty, i32_ty]);
    let cont_ty = m.func_type(pair_ty, noret);
    let func_ty = m.func_type(pair_ty, i32_ty);

    let ret_cont_ty = m.func_type(i32_ty, noret);
    let func = m.create_function(func_ty, Linkage::Exported);
    let ret_cont = m.create_function(ret_cont_ty, Linkage::Internal);
    let header = m.create_function(cont_ty, Linkage::Internal);

    let ret_param = m.param(ret_cont);
    m.set_op(ret_cont, 0, ret_param);

    let func_args = m.param(func);
    let entry_body = m.call(header, func_args);
    m.set_op(func, 0, entry_body);

    let idx0 = m.const_int(i32_ty, 0);
    let idx1 = m.const_int(i32_ty, 1);
    let header_args = m.param(header);
    let acc = m.ext(i32_ty, header_args, idx0);
    let n = m.ext(i32_ty, header_args, idx1);
    let zero = m.const_int(i32_ty, 0);
    let cond = m.icmp_eq(m.bool_type(), n, zero);

    let exit = m.create_function(cont_ty, Linkage::Internal);
    let branch = m.branch(noret, cond, exit, header);
    m.set_op(header, 0, branch);

    let exit_args = m.param(exit);
    let exit_acc = m.ext(i32_ty, exit_args, idx0);
    let exit_body = m.call(ret_cont, exit_acc);
    m.set_op(exit, 0, exit_body);

    let _ = acc;
    (func, header)
}

/// Scenario 5: the iterative `pow` loop's header classifies `reducible`
/// with loop depth 1.
#[test]
fn iterative_pow_loop_header_is_reducible_at_depth_one() {
    let mut m = Module::new("scenario5");
    let (func, header) = build_iterative_pow(&mut m);
    let cfg = ControlFlowGraph::compute(&m, func);
    let forest = LoopForest::compute(&cfg);

    let header_block = cfg.block_of(header).unwrap();
    assert_eq!(forest.kind(header_block), LoopKind::Reducible);
    assert_eq!(forest.loop_depth(header_block), 1);
}

/// Scenario 6: a hand-built module matching the textual example in spec.md
/// §8 scenario 6 (parsing itself is out of scope; this builds the same
/// shape directly through the public builder API and checks the structural
/// identities the parser would also have to produce).
#[test]
fn hand_built_module_matches_the_structural_shape_of_the_textual_example() {
    let mut m = Module::new("scenario6");
    let i32_ty = m.int_type(32);

    let zero = m.const_int(i32_ty, 0);
    let one = m.const_int(i32_ty, 1);
    let two = m.iadd(i32_ty, one, one);

    let pair_ty = m.tup_type(&[i32_ty, i32_ty]);
    let pair = m.tup(pair_ty, &[one, two]);

    let noret = m.noret_type();
    let func_ty = m.func_type(pair_ty, noret);
    let f = m.create_function(func_ty, Linkage::Exported);
    m.set_op(f, 0, pair);

    assert_eq!(m.node(f).operands[0], pair, "f's body must be the pair node");
    let rebuilt_two = m.iadd(i32_ty, one, one);
    assert_eq!(two, rebuilt_two, "two must be structurally identical to what the builder produces");
    let _ = zero;
}
