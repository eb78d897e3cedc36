//! The module: owns every node, hash-conses structural nodes, tracks uses,
//! and owns the mutable nominal functions and globals (spec.md §4.1, §3
//! Module).

use crate::builder;
use crate::ir::entities::{NodeRef, UseRef};
use crate::ir::node::{FpFlags, Linkage, NodeData, Payload, Use};
use crate::ir::tag::{Tag, TypeTag};
use fir_entity::PrimaryMap;
use std::collections::HashMap;

/// The intern key structural nodes are deduplicated on: spec.md §4.1
/// "`(tag, type_id, data_slice_determined_by_tag, operand_ids)`".
#[derive(Clone, PartialEq, Eq, Hash)]
enum InternTag {
    Op(Tag),
    Ty(TypeTag),
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct InternKey {
    tag: InternTag,
    ty: Option<NodeRef>,
    data: Payload,
    operands: smallvec::SmallVec<[NodeRef; 4]>,
}

/// Small, eagerly-cached singleton types every module needs constantly.
struct Singletons {
    mem: NodeRef,
    noret: NodeRef,
    ptr: NodeRef,
    err_ty: NodeRef,
}

/// Owns all node memory for one compilation unit.
///
/// All analyses (`Scope`, `ControlFlowGraph`, `DominatorTree`, `LoopTree`,
/// `Schedule`) borrow a `Module` read-only and must be discarded before the
/// client mutates a nominal node again (spec.md §5's shared-resource
/// policy); the module itself does not track this for the client.
pub struct Module {
    name: String,
    arena: PrimaryMap<NodeRef, NodeData>,
    uses: PrimaryMap<UseRef, Use>,
    use_freelist: Vec<UseRef>,
    intern: HashMap<InternKey, NodeRef>,
    functions: Vec<NodeRef>,
    globals: Vec<NodeRef>,
    next_id: u64,
    singletons: Singletons,
}

impl Module {
    /// Create a new, empty module named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let mut m = Self {
            name: name.into(),
            arena: PrimaryMap::new(),
            uses: PrimaryMap::new(),
            use_freelist: Vec::new(),
            intern: HashMap::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            next_id: 0,
            singletons: Singletons {
                mem: NodeRef::new(0),
                noret: NodeRef::new(0),
                ptr: NodeRef::new(0),
                err_ty: NodeRef::new(0),
            },
        };
        let mem = m.intern_type(TypeTag::Mem, Payload::None, smallvec::smallvec![]);
        let noret = m.intern_type(TypeTag::NoRet, Payload::None, smallvec::smallvec![]);
        let ptr = m.intern_type(TypeTag::Ptr, Payload::None, smallvec::smallvec![]);
        let err_ty = m.intern_type(TypeTag::ErrTy, Payload::None, smallvec::smallvec![]);
        m.singletons = Singletons {
            mem,
            noret,
            ptr,
            err_ty,
        };
        log::debug!("created module `{}`", m.name);
        m
    }

    /// This module's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a node's data by reference.
    pub fn node(&self, n: NodeRef) -> &NodeData {
        &self.arena[n]
    }

    /// All nominal functions created in this module, in creation order.
    pub fn functions(&self) -> &[NodeRef] {
        &self.functions
    }

    /// All nominal globals created in this module, in creation order.
    pub fn globals(&self) -> &[NodeRef] {
        &self.globals
    }

    // ---- singleton types ----

    /// The `mem` token type.
    pub fn mem_type(&self) -> NodeRef {
        self.singletons.mem
    }

    /// The `noret` (continuation) marker type.
    pub fn noret_type(&self) -> NodeRef {
        self.singletons.noret
    }

    /// The opaque pointer type.
    pub fn ptr_type(&self) -> NodeRef {
        self.singletons.ptr
    }

    /// The opaque integer-division-error token type.
    pub fn err_type(&self) -> NodeRef {
        self.singletons.err_ty
    }

    /// An integer type of the given bit width.
    pub fn int_type(&mut self, width: u32) -> NodeRef {
        assert!(width >= 1, "integer type must have width >= 1");
        self.intern_type(TypeTag::Int, Payload::Width(width), smallvec::smallvec![])
    }

    /// `int_type(1)`, the boolean type.
    pub fn bool_type(&mut self) -> NodeRef {
        self.int_type(1)
    }

    /// A float type of width 16, 32, or 64.
    pub fn float_type(&mut self, width: u32) -> NodeRef {
        assert!(
            width == 16 || width == 32 || width == 64,
            "float type width must be 16, 32, or 64"
        );
        self.intern_type(TypeTag::Float, Payload::Width(width), smallvec::smallvec![])
    }

    /// A tuple type over the given element types.
    pub fn tup_type(&mut self, elems: &[NodeRef]) -> NodeRef {
        self.intern_type(
            TypeTag::Tup,
            Payload::None,
            smallvec::SmallVec::from_slice(elems),
        )
    }

    /// The empty (unit) tuple type.
    pub fn unit_type(&mut self) -> NodeRef {
        self.tup_type(&[])
    }

    /// A fixed-size array type of dimension `n` over `elem`.
    pub fn array_type(&mut self, n: u32, elem: NodeRef) -> NodeRef {
        self.intern_type(TypeTag::Array, Payload::ArrayDim(n), smallvec::smallvec![elem])
    }

    /// A dynamically-sized array type over `elem`.
    pub fn dynarray_type(&mut self, elem: NodeRef) -> NodeRef {
        self.intern_type(TypeTag::DynArray, Payload::None, smallvec::smallvec![elem])
    }

    /// A function (or, if `ret == noret_type()`, continuation) type.
    pub fn func_type(&mut self, param: NodeRef, ret: NodeRef) -> NodeRef {
        self.intern_type(TypeTag::Func, Payload::None, smallvec::smallvec![param, ret])
    }

    /// Is `ty` a continuation type, i.e. a function type returning `noret`?
    pub fn is_continuation_type(&self, ty: NodeRef) -> bool {
        let data = &self.arena[ty];
        data.type_tag == Some(TypeTag::Func) && data.operands[1] == self.singletons.noret
    }

    fn intern_type(&mut self, tag: TypeTag, data: Payload, operands: smallvec::SmallVec<[NodeRef; 4]>) -> NodeRef {
        let key = InternKey {
            tag: InternTag::Ty(tag),
            ty: None,
            data,
            operands: operands.clone(),
        };
        if let Some(&existing) = self.intern.get(&key) {
            return existing;
        }
        let id = self.fresh_id();
        let node = NodeData {
            id,
            tag: None,
            type_tag: Some(tag),
            ty: None,
            data,
            operands,
            uses_head: None,
            debug_info: None,
            invariant: false,
        };
        let r = self.arena.push(node);
        self.record_operand_uses(r);
        self.intern.insert(key, r);
        r
    }

    /// Is a would-be structural node over `operands` invariant, given its
    /// tag? Constants always are; other operations are invariant iff their
    /// tag admits it and every operand already is.
    fn compute_invariant(&self, tag: Tag, operands: &[NodeRef]) -> bool {
        if tag.is_const() {
            return true;
        }
        if !tag.can_be_invariant() {
            return false;
        }
        operands.iter().all(|&op| self.arena[op].invariant)
    }

    // ---- constants ----

    /// An integer constant of type `ty` (must be an integer type); the
    /// value is stored modulo `2^width` (spec.md invariant 3).
    pub fn const_int(&mut self, ty: NodeRef, value: u64) -> NodeRef {
        let width = match self.arena[ty].type_tag {
            Some(TypeTag::Int) => match self.arena[ty].data {
                Payload::Width(w) => w,
                _ => unreachable!(),
            },
            _ => panic!("const_int: type is not an integer type"),
        };
        let masked = mask_to_width(value, width);
        self.intern_op(Tag::Const, Some(ty), Payload::Int(masked), smallvec::smallvec![])
    }

    /// A float constant of type `ty` (must be a float type), given its raw
    /// bit pattern so that `+0.0`/`-0.0` and distinct NaN payloads remain
    /// distinct constants (spec.md invariant: "bit-exact float semantics").
    pub fn const_float_bits(&mut self, ty: NodeRef, bits: u64) -> NodeRef {
        match self.arena[ty].type_tag {
            Some(TypeTag::Float) => {}
            _ => panic!("const_float_bits: type is not a float type"),
        }
        self.intern_op(Tag::Const, Some(ty), Payload::FloatBits(bits), smallvec::smallvec![])
    }

    /// The `top` lattice constant of type `ty`.
    pub fn top(&mut self, ty: NodeRef) -> NodeRef {
        self.intern_op(Tag::Top, Some(ty), Payload::None, smallvec::smallvec![])
    }

    /// The `bot` lattice constant of type `ty`.
    pub fn bot(&mut self, ty: NodeRef) -> NodeRef {
        self.intern_op(Tag::Bot, Some(ty), Payload::None, smallvec::smallvec![])
    }

    // ---- structural operation builders (apply peephole, then intern) ----

    /// Build a structural operation node: runs the peephole rules for `tag`
    /// first (spec.md §4.1 C), then interns the (possibly rewritten) result.
    ///
    /// This is the single choke point every typed builder method in
    /// [`crate::builder`] funnels through.
    pub fn build(&mut self, tag: Tag, ty: NodeRef, operands: &[NodeRef]) -> NodeRef {
        self.build_with_data(tag, ty, Payload::None, operands)
    }

    /// Like [`Module::build`] but with a scalar `data` payload (float
    /// arithmetic's fp-flag set).
    pub fn build_with_data(&mut self, tag: Tag, ty: NodeRef, data: Payload, operands: &[NodeRef]) -> NodeRef {
        assert!(tag.is_structural(), "build_with_data() is only for structural nodes");
        for &op in operands {
            debug_assert!(self.arena.is_valid(op), "operand outside this module's arena");
        }
        if let Some(simplified) = builder::simplify(self, tag, ty, data, operands) {
            return simplified;
        }
        self.intern_op(tag, Some(ty), data, smallvec::SmallVec::from_slice(operands))
    }

    /// Intern a control node (`call`/`if`/`loop`) with no peephole rule.
    pub(crate) fn build_control(&mut self, tag: Tag, ty: NodeRef, operands: &[NodeRef]) -> NodeRef {
        self.intern_op(tag, Some(ty), Payload::None, smallvec::SmallVec::from_slice(operands))
    }

    fn intern_op(&mut self, tag: Tag, ty: Option<NodeRef>, data: Payload, operands: smallvec::SmallVec<[NodeRef; 4]>) -> NodeRef {
        let key = InternKey {
            tag: InternTag::Op(tag),
            ty,
            data,
            operands: operands.clone(),
        };
        if let Some(&existing) = self.intern.get(&key) {
            return existing;
        }
        if let Some(ty) = ty {
            debug_assert!(self.arena[ty].is_ty(), "node's `type` must be a type node");
        }
        let invariant = self.compute_invariant(tag, &operands);
        let id = self.fresh_id();
        let node = NodeData {
            id,
            tag: Some(tag),
            type_tag: None,
            ty,
            data,
            operands,
            uses_head: None,
            debug_info: None,
            invariant,
        };
        let r = self.arena.push(node);
        self.record_operand_uses(r);
        self.intern.insert(key, r);
        log::trace!("interned {} {}", tag, r);
        r
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record_operand_uses(&mut self, user: NodeRef) {
        let operands = self.arena[user].operands.clone();
        for (i, op) in operands.into_iter().enumerate() {
            self.push_use(op, user, i as u32);
        }
    }

    fn push_use(&mut self, used: NodeRef, user: NodeRef, index: u32) {
        let use_ref = if let Some(free) = self.use_freelist.pop() {
            self.uses[free] = Use {
                user,
                index,
                next: self.arena[used].uses_head,
            };
            free
        } else {
            self.uses.push(Use {
                user,
                index,
                next: self.arena[used].uses_head,
            })
        };
        self.arena[used].uses_head = Some(use_ref);
    }

    /// Retract the use edge `(user, index)` from `used`'s uses list.
    fn retract_use(&mut self, used: NodeRef, user: NodeRef, index: u32) {
        let mut cursor = self.arena[used].uses_head;
        let mut prev: Option<UseRef> = None;
        while let Some(ur) = cursor {
            let u = self.uses[ur];
            if u.user == user && u.index == index {
                match prev {
                    Some(p) => self.uses[p].next = u.next,
                    None => self.arena[used].uses_head = u.next,
                }
                self.use_freelist.push(ur);
                return;
            }
            prev = Some(ur);
            cursor = u.next;
        }
        panic!("retract_use: no such use edge");
    }

    /// Iterate the `(user, operand_index)` pairs using `n`.
    pub fn uses_of<'a>(&'a self, n: NodeRef) -> impl Iterator<Item = (NodeRef, u32)> + 'a {
        let mut cursor = self.arena[n].uses_head;
        std::iter::from_fn(move || {
            let ur = cursor?;
            let u = self.uses[ur];
            cursor = u.next;
            Some((u.user, u.index))
        })
    }

    // ---- nominal nodes ----

    /// Create a nominal function of the given function type and linkage.
    /// Not interned; appended to the module's function list.
    pub fn create_function(&mut self, ty: NodeRef, linkage: Linkage) -> NodeRef {
        debug_assert_eq!(self.arena[ty].type_tag, Some(TypeTag::Func));
        let id = self.fresh_id();
        let node = NodeData {
            id,
            tag: Some(Tag::Func),
            type_tag: None,
            ty: Some(ty),
            data: Payload::Linkage(linkage),
            operands: smallvec::smallvec![],
            uses_head: None,
            debug_info: None,
            invariant: false,
        };
        let r = self.arena.push(node);
        self.functions.push(r);
        r
    }

    /// Create a nominal global of pointer type and the given linkage.
    pub fn create_global(&mut self, linkage: Linkage) -> NodeRef {
        let ptr = self.ptr_type();
        let id = self.fresh_id();
        let node = NodeData {
            id,
            tag: Some(Tag::Global),
            type_tag: None,
            ty: Some(ptr),
            data: Payload::Linkage(linkage),
            operands: smallvec::smallvec![],
            uses_head: None,
            debug_info: None,
            invariant: false,
        };
        let r = self.arena.push(node);
        self.globals.push(r);
        r
    }

    /// This nominal node's linkage.
    pub fn linkage(&self, nominal: NodeRef) -> Linkage {
        match self.arena[nominal].data {
            Payload::Linkage(l) => l,
            _ => panic!("linkage(): node is not nominal"),
        }
    }

    /// `param(F)`: the parameter value of function `func`, pinned to `func`'s
    /// entry block by the scheduler. Builds it once and reuses it, since
    /// `param` is itself a structural-shaped node keyed by its owning
    /// function (it is not re-created on every call).
    pub fn param(&mut self, func: NodeRef) -> NodeRef {
        let param_ty = self.param_type(func);
        self.intern_op(Tag::Param, Some(param_ty), Payload::None, smallvec::smallvec![func])
    }

    fn param_type(&self, func: NodeRef) -> NodeRef {
        let func_ty = self.arena[func].ty.expect("function has no type");
        self.arena[func_ty].operands[0]
    }

    /// `start(F)`: the entry memory token of function `func`.
    pub fn start(&mut self, func: NodeRef) -> NodeRef {
        let mem = self.mem_type();
        self.intern_op(Tag::Start, Some(mem), Payload::None, smallvec::smallvec![func])
    }

    /// Set operand `i` of a nominal node, retracting any previous use edge
    /// first and recording the new one (spec.md §4.1: "set_op").
    pub fn set_op(&mut self, nominal: NodeRef, i: usize, value: NodeRef) {
        debug_assert!(self.arena[nominal].is_nominal(), "set_op is only for nominal nodes");
        debug_assert!(self.arena.is_valid(value), "operand outside this module's arena");
        let grew = i >= self.arena[nominal].operands.len();
        let old = {
            let ops = &mut self.arena[nominal].operands;
            if grew {
                ops.resize(i + 1, value);
            }
            let old = ops[i];
            ops[i] = value;
            old
        };
        // A freshly grown slot has no prior use edge to retract; an
        // existing slot's previous value does, unless it's unchanged.
        if !grew && old != value {
            self.retract_use(old, nominal, i as u32);
        }
        if grew || old != value {
            self.push_use(value, nominal, i as u32);
        }
    }

    /// Rebuild a structural node with a new type and operands, returning
    /// the (possibly identical) interned result. Rebuilding with unchanged
    /// fields returns the same pointer (spec.md §8 round-trip property).
    pub fn rebuild(&mut self, n: NodeRef, ty: NodeRef, operands: &[NodeRef]) -> NodeRef {
        let tag = self.arena[n].tag();
        debug_assert!(tag.is_structural());
        self.build(tag, ty, operands)
    }

    /// Clone a nominal node with a new type, inheriting linkage.
    pub fn clone_nominal(&mut self, n: NodeRef, ty: NodeRef) -> NodeRef {
        let linkage = self.linkage(n);
        match self.arena[n].tag() {
            Tag::Func => self.create_function(ty, linkage),
            Tag::Global => self.create_global(linkage),
            _ => panic!("clone_nominal: node is not nominal"),
        }
    }

    // ---- cleanup ----

    /// Remove structural and nominal nodes unreachable from any exported
    /// nominal, compacting `uses` lists accordingly (spec.md §4.1
    /// "Cleanup"). Visits bottom-up so no dangling back-edge is ever
    /// observed mid-pass (spec.md §9).
    pub fn cleanup(&mut self) {
        let mut reachable: std::collections::HashSet<NodeRef> = std::collections::HashSet::new();
        let mut stack: Vec<NodeRef> = Vec::new();
        for &f in &self.functions {
            if self.linkage(f) == Linkage::Exported {
                stack.push(f);
            }
        }
        for &g in &self.globals {
            if self.linkage(g) == Linkage::Exported {
                stack.push(g);
            }
        }
        while let Some(n) = stack.pop() {
            if !reachable.insert(n) {
                continue;
            }
            if let Some(ty) = self.arena[n].ty {
                if reachable.insert(ty) {
                    stack.push(ty);
                }
            }
            for &op in &self.arena[n].operands.clone() {
                if !reachable.contains(&op) {
                    stack.push(op);
                }
            }
        }
        // Type nodes are never collected (spec.md §3 Lifecycle).
        for r in self.arena.keys() {
            if self.arena[r].is_ty() {
                reachable.insert(r);
            }
        }

        self.functions.retain(|f| reachable.contains(f));
        self.globals.retain(|g| reachable.contains(g));

        // Drop use edges whose user is being collected, freeing their
        // use records back to the freelist (spec.md §9).
        let dead: Vec<NodeRef> = self
            .arena
            .keys()
            .filter(|r| !reachable.contains(r))
            .collect();
        for &d in &dead {
            let operands = self.arena[d].operands.clone();
            for (i, op) in operands.into_iter().enumerate() {
                if self.arena.is_valid(op) && reachable.contains(&op) {
                    self.retract_use(op, d, i as u32);
                }
            }
        }
        // Structural interning entries pointing at dead nodes are stale.
        self.intern.retain(|_, v| reachable.contains(v));

        log::debug!(
            "cleanup: {} of {} nodes reachable",
            reachable.len(),
            self.arena.len()
        );
        // Node storage itself (the PrimaryMap slots) is left in place: the
        // arena is append-only, renumbering would invalidate every NodeRef
        // a live analysis might still hold, including ones just computed
        // by this very call's reachability walk a moment ago. Un-rooted
        // slots are simply never visited again by a later `cleanup`.
    }

    /// Total number of node slots ever allocated (including any collected
    /// by a previous `cleanup`).
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }
}

fn mask_to_width(value: u64, width: u32) -> u64 {
    if width >= 64 {
        value
    } else {
        value & ((1u64 << width) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_types_are_hash_consed() {
        let mut m = Module::new("t");
        let a = m.int_type(32);
        let b = m.int_type(32);
        assert_eq!(a, b, "int_type(32) must intern to a single node");
        let c = m.int_type(64);
        assert_ne!(a, c);
    }

    #[test]
    fn structural_ops_with_identical_shape_intern_to_one_node() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let func_ty = m.func_type(i32_ty, i32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let x = m.param(f);
        let y = m.param(f);
        assert_eq!(x, y, "param(f) must be memoized, not re-created per call");

        let one = m.const_int(i32_ty, 1);
        let a = m.build(Tag::IAdd, i32_ty, &[x, one]);
        let b = m.build(Tag::IAdd, i32_ty, &[x, one]);
        assert_eq!(a, b, "two structurally identical builds must hash-cons");
    }

    #[test]
    fn const_int_masks_the_value_to_the_type_width() {
        let mut m = Module::new("t");
        let i8_ty = m.int_type(8);
        let over_wide = m.const_int(i8_ty, 0x1FF);
        let masked = m.const_int(i8_ty, 0xFF);
        assert_eq!(over_wide, masked, "const_int must mask modulo 2^width");
    }

    #[test]
    fn uses_of_tracks_every_user_of_an_operand() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let func_ty = m.func_type(i32_ty, i32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let x = m.param(f);
        let one = m.const_int(i32_ty, 1);
        let two = m.const_int(i32_ty, 2);
        let sum1 = m.build(Tag::IAdd, i32_ty, &[x, one]);
        let sum2 = m.build(Tag::IAdd, i32_ty, &[x, two]);

        let users: Vec<NodeRef> = m.uses_of(x).map(|(user, _)| user).collect();
        assert!(users.contains(&sum1));
        assert!(users.contains(&sum2));
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn set_op_retracts_the_old_use_edge_and_records_the_new_one() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let noret = m.noret_type();
        let func_ty = m.func_type(i32_ty, noret);
        let f = m.create_function(func_ty, Linkage::Exported);
        let a = m.const_int(i32_ty, 1);
        let b = m.const_int(i32_ty, 2);

        m.set_op(f, 0, a);
        assert!(m.uses_of(a).any(|(user, idx)| user == f && idx == 0));

        m.set_op(f, 0, b);
        assert!(
            !m.uses_of(a).any(|(user, idx)| user == f && idx == 0),
            "the old operand's use edge must be retracted"
        );
        assert!(m.uses_of(b).any(|(user, idx)| user == f && idx == 0));
    }

    #[test]
    fn cleanup_drops_nodes_unreachable_from_any_exported_nominal() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let noret = m.noret_type();
        let func_ty = m.func_type(i32_ty, noret);

        let kept = m.create_function(func_ty, Linkage::Exported);
        let kept_param = m.param(kept);
        m.set_op(kept, 0, kept_param);

        let dropped = m.create_function(func_ty, Linkage::Internal);
        let dropped_param = m.param(dropped);
        m.set_op(dropped, 0, dropped_param);

        let before = m.node_count();
        m.cleanup();

        assert!(m.functions().contains(&kept));
        assert!(!m.functions().contains(&dropped));
        assert_eq!(m.node_count(), before, "cleanup never renumbers or shrinks arena slots");
        // The kept function's own parameter must survive; the dropped
        // function's parameter must no longer be reachable.
        assert!(m.uses_of(kept_param).any(|(user, _)| user == kept));
    }

    #[test]
    fn cleanup_keeps_exported_globals_and_their_type() {
        let mut m = Module::new("t");
        let exported = m.create_global(Linkage::Exported);
        let internal = m.create_global(Linkage::Internal);
        m.cleanup();
        assert!(m.globals().contains(&exported));
        assert!(!m.globals().contains(&internal));
    }

    #[test]
    fn rebuild_with_unchanged_fields_returns_the_identical_node() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let func_ty = m.func_type(i32_ty, i32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let x = m.param(f);
        let one = m.const_int(i32_ty, 1);
        let sum = m.build(Tag::IAdd, i32_ty, &[x, one]);

        let rebuilt = m.rebuild(sum, i32_ty, &[x, one]);
        assert_eq!(sum, rebuilt, "rebuilding with identical fields is the identity");
    }
}
