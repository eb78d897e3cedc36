//! Per-function scope: the set of nodes reachable from a function's
//! parameter by following `uses` edges, stopping at the function itself
//! (spec.md §4.2 D.1).
//!
//! Grounded on `original_source/src/analysis/scope.c`: a forward breadth-first
//! walk over `uses` edges seeded at `param(func)`, using `func` itself as
//! both a membership sentinel and a traversal stop. Unlike a naive "walk the
//! whole graph" pass, this never follows operand edges, only use edges; the
//! only node whose *operand* is re-pushed is `param` itself, whose sole
//! operand is `func` (pushing it back in lets the stop-at-`func` check fire
//! uniformly instead of special-casing `param`'s own membership).

use crate::ir::entities::NodeRef;
use crate::module::Module;
use fir_entity::EntitySet;

/// The set of nodes in scope of a function, plus O(1) membership tests.
///
/// Grounded on `original_source/src/analysis/scope.h`'s `struct scope { const
/// struct fir_node* func; struct node_set nodes; }`, generalized from a raw
/// hash set to `fir_entity::EntitySet` for the dense `NodeRef`-indexed O(1)
/// membership spec.md §4.2 requires.
pub struct Scope {
    func: NodeRef,
    nodes: EntitySet<NodeRef>,
}

impl Scope {
    /// Compute the scope of `func`, a nominal function node.
    ///
    /// Uses an explicit work stack rather than recursion (spec.md §9: IR
    /// graphs are wide and deep enough that a recursive walk would overflow
    /// the native call stack).
    pub fn compute(module: &Module, func: NodeRef) -> Scope {
        debug_assert_eq!(
            module.node(func).tag(),
            crate::ir::tag::Tag::Func,
            "scope: node is not a function"
        );

        let mut nodes: EntitySet<NodeRef> = EntitySet::new();
        let mut stack: Vec<NodeRef> = Vec::new();

        // `param(func)` is built lazily and interned, so a second call
        // returns the same node; scope computation only reads the module.
        let param = find_param(module, func);
        stack.push(param);

        while let Some(node) = stack.pop() {
            if node == func || !nodes.insert(node) {
                continue;
            }
            if module.node(node).tag() == crate::ir::tag::Tag::Param {
                stack.push(module.node(node).operands[0]);
            }
            for (user, _index) in module.uses_of(node) {
                stack.push(user);
            }
        }

        log::trace!("scope({}): {} nodes", func, nodes.len());
        Scope { func, nodes }
    }

    /// The function this scope was computed for.
    pub fn func(&self) -> NodeRef {
        self.func
    }

    /// Is `node` in scope?
    pub fn contains(&self, node: NodeRef) -> bool {
        self.nodes.contains(node)
    }
}

/// Find `func`'s already-interned `param` node without mutating the module.
/// `Module::param` is `&mut self` because it may build the node on first
/// use; analyses only ever run after a function's IR is fully built, so the
/// param node already exists and this just re-derives its intern key.
fn find_param(module: &Module, func: NodeRef) -> NodeRef {
    let func_ty = module.node(func).ty.expect("function has no type");
    let param_ty = module.node(func_ty).operands[0];
    for (user, _) in module.uses_of(func) {
        let data = module.node(user);
        if data.tag() == crate::ir::tag::Tag::Param && data.ty == Some(param_ty) {
            return user;
        }
    }
    panic!("scope: function has no param node; build it with Module::param first")
}
