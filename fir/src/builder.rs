//! Peephole / simplification rules (spec.md §4.1 C) and the typed builder
//! methods that apply them.
//!
//! Every public `Module::i*`/`f*`/... builder method below funnels through
//! [`Module::build`], which calls [`simplify`] before interning. Order
//! within `simplify` matches spec.md exactly: constant-fold, then swap
//! commutative operands so a constant lands on the left, then identity/
//! absorbing-element rewrites, then the deeper `ins`/`ext`/`load`/`store`
//! rewrites. Rules never introduce operand edges to nodes outside the
//! module, and are sound under any ordering in which they're retried.

use crate::ir::entities::NodeRef;
use crate::ir::node::Payload;
use crate::ir::tag::{Tag, TypeTag};
use crate::module::Module;

// ---------------------------------------------------------------------
// Typed builder methods
// ---------------------------------------------------------------------

impl Module {
    /// `x + y`.
    pub fn iadd(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::IAdd, ty, &[x, y])
    }
    /// `x - y`.
    pub fn isub(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::ISub, ty, &[x, y])
    }
    /// `x * y`.
    pub fn imul(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::IMul, ty, &[x, y])
    }
    /// Signed `x / y`.
    pub fn idivs(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::IDivS, ty, &[x, y])
    }
    /// Unsigned `x / y`.
    pub fn idivu(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::IDivU, ty, &[x, y])
    }
    /// Signed `x % y`.
    pub fn irems(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::IRemS, ty, &[x, y])
    }
    /// Unsigned `x % y`.
    pub fn iremu(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::IRemU, ty, &[x, y])
    }

    /// `x + y` (float).
    pub fn fadd(&mut self, ty: NodeRef, flags: crate::ir::FpFlags, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build_with_data(Tag::FAdd, ty, Payload::FpFlags(flags), &[x, y])
    }
    /// `x - y` (float).
    pub fn fsub(&mut self, ty: NodeRef, flags: crate::ir::FpFlags, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build_with_data(Tag::FSub, ty, Payload::FpFlags(flags), &[x, y])
    }
    /// `x * y` (float).
    pub fn fmul(&mut self, ty: NodeRef, flags: crate::ir::FpFlags, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build_with_data(Tag::FMul, ty, Payload::FpFlags(flags), &[x, y])
    }
    /// `x / y` (float).
    pub fn fdiv(&mut self, ty: NodeRef, flags: crate::ir::FpFlags, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build_with_data(Tag::FDiv, ty, Payload::FpFlags(flags), &[x, y])
    }
    /// `x % y` (float).
    pub fn frem(&mut self, ty: NodeRef, flags: crate::ir::FpFlags, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build_with_data(Tag::FRem, ty, Payload::FpFlags(flags), &[x, y])
    }

    /// Integer equality comparison; result type must be a 1-bit integer.
    pub fn icmp_eq(&mut self, bool_ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::ICmpEq, bool_ty, &[x, y])
    }
    /// Integer inequality comparison.
    pub fn icmp_ne(&mut self, bool_ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::ICmpNe, bool_ty, &[x, y])
    }
    /// Signed `x < y`.
    pub fn icmp_slt(&mut self, bool_ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::ICmpSlt, bool_ty, &[x, y])
    }
    /// Unsigned `x < y`.
    pub fn icmp_ult(&mut self, bool_ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::ICmpUlt, bool_ty, &[x, y])
    }
    /// Ordered float equality.
    pub fn fcmp_oeq(&mut self, bool_ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::FCmpOeq, bool_ty, &[x, y])
    }

    /// `x & y`.
    pub fn band(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::And, ty, &[x, y])
    }
    /// `x | y`.
    pub fn bor(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::Or, ty, &[x, y])
    }
    /// `x ^ y`.
    pub fn bxor(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::Xor, ty, &[x, y])
    }
    /// `x << y`.
    pub fn shl(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::Shl, ty, &[x, y])
    }
    /// Logical `x >> y`.
    pub fn shru(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::ShrU, ty, &[x, y])
    }
    /// Arithmetic `x >> y`.
    pub fn shrs(&mut self, ty: NodeRef, x: NodeRef, y: NodeRef) -> NodeRef {
        self.build(Tag::ShrS, ty, &[x, y])
    }

    /// Narrow an integer to `ty` (precondition: `ty` strictly narrower than `x`'s type).
    pub fn itrunc(&mut self, ty: NodeRef, x: NodeRef) -> NodeRef {
        self.build(Tag::ITrunc, ty, &[x])
    }
    /// Sign-extend an integer to `ty` (precondition: `ty` strictly wider than `x`'s type).
    pub fn sext(&mut self, ty: NodeRef, x: NodeRef) -> NodeRef {
        self.build(Tag::SExt, ty, &[x])
    }
    /// Zero-extend an integer to `ty` (precondition: `ty` strictly wider than `x`'s type).
    pub fn zext(&mut self, ty: NodeRef, x: NodeRef) -> NodeRef {
        self.build(Tag::ZExt, ty, &[x])
    }
    /// Bit-preserving reinterpretation between same-width types.
    pub fn bitcast(&mut self, ty: NodeRef, x: NodeRef) -> NodeRef {
        self.build(Tag::Bitcast, ty, &[x])
    }
    /// Truncate a float to a narrower float type.
    pub fn ftrunc(&mut self, ty: NodeRef, x: NodeRef) -> NodeRef {
        self.build(Tag::FTrunc, ty, &[x])
    }
    /// Convert an unsigned integer to a float.
    pub fn utof(&mut self, ty: NodeRef, x: NodeRef) -> NodeRef {
        self.build(Tag::UToF, ty, &[x])
    }
    /// Convert a signed integer to a float.
    pub fn stof(&mut self, ty: NodeRef, x: NodeRef) -> NodeRef {
        self.build(Tag::SToF, ty, &[x])
    }
    /// Convert a float to an unsigned integer.
    pub fn ftou(&mut self, ty: NodeRef, x: NodeRef) -> NodeRef {
        self.build(Tag::FToU, ty, &[x])
    }
    /// Convert a float to a signed integer.
    pub fn ftos(&mut self, ty: NodeRef, x: NodeRef) -> NodeRef {
        self.build(Tag::FToS, ty, &[x])
    }

    /// Build a tuple value.
    pub fn tup(&mut self, ty: NodeRef, elems: &[NodeRef]) -> NodeRef {
        self.build(Tag::Tup, ty, elems)
    }
    /// Build an array value.
    pub fn array(&mut self, ty: NodeRef, elems: &[NodeRef]) -> NodeRef {
        self.build(Tag::Array, ty, elems)
    }
    /// Insert `v` at index `i` of aggregate `a`, producing a new aggregate of the same type.
    pub fn ins(&mut self, ty: NodeRef, a: NodeRef, i: NodeRef, v: NodeRef) -> NodeRef {
        self.build(Tag::Ins, ty, &[a, i, v])
    }
    /// Extract the element at index `i` of aggregate `a`.
    pub fn ext(&mut self, ty: NodeRef, a: NodeRef, i: NodeRef) -> NodeRef {
        self.build(Tag::Ext, ty, &[a, i])
    }
    /// Take the address of element `i` of aggregate pointer `p`.
    pub fn addrof(&mut self, ptr_ty: NodeRef, p: NodeRef, i: NodeRef) -> NodeRef {
        self.build(Tag::AddrOf, ptr_ty, &[p, i])
    }

    /// `select(cond, t, f)`, sugar for `ext(array(f, t), cond)` (spec.md §4.1).
    pub fn select(&mut self, ty: NodeRef, cond: NodeRef, t: NodeRef, f: NodeRef) -> NodeRef {
        let arr_ty = self.array_type(2, ty);
        let arr = self.array(arr_ty, &[f, t]);
        self.ext(ty, arr, cond)
    }

    /// Allocate memory, producing a pointer.
    pub fn alloc(&mut self, ptr_ty: NodeRef, mem: NodeRef) -> NodeRef {
        self.build(Tag::Alloc, ptr_ty, &[mem])
    }
    /// Load a value of type `ty` through `ptr` given memory token `mem`.
    pub fn load(&mut self, ty: NodeRef, mem: NodeRef, ptr: NodeRef) -> NodeRef {
        self.build(Tag::Load, ty, &[mem, ptr])
    }
    /// Store `value` through `ptr` given memory token `mem`, producing the updated token.
    pub fn store(&mut self, mem: NodeRef, ptr: NodeRef, value: NodeRef) -> NodeRef {
        let mem_ty = self.mem_type();
        self.build(Tag::Store, mem_ty, &[mem, ptr, value])
    }

    /// Call `callee` with argument `arg`. If `callee`'s type is a
    /// continuation type this is a control transfer (a CFG jump edge when
    /// used as a block's body); otherwise it is an ordinary value-producing
    /// call.
    pub fn call(&mut self, callee: NodeRef, arg: NodeRef) -> NodeRef {
        let callee_ty = self.node(callee).ty.expect("callee has no type");
        let ret_ty = self.node(callee_ty).operands[1];
        self.intern_op_pub(Tag::Call, ret_ty, &[callee, arg])
    }

    /// A direct two-way branch used as a continuation's body: jump to
    /// `then_cont` if `cond` is nonzero, else to `else_cont`. Both operands
    /// must be continuation-typed nominal functions.
    pub fn branch(&mut self, noret: NodeRef, cond: NodeRef, then_cont: NodeRef, else_cont: NodeRef) -> NodeRef {
        debug_assert!(self.is_continuation_type(self.node(then_cont).ty.unwrap()));
        debug_assert!(self.is_continuation_type(self.node(else_cont).ty.unwrap()));
        self.intern_op_pub(Tag::If, noret, &[cond, then_cont, else_cont])
    }

    /// An unconditional jump back to a loop header continuation, used as a
    /// continuation's body to mark a loop's continue edge distinctly from
    /// an ordinary tail call (see DESIGN.md's resolution of spec.md's
    /// `ctrl_ty`/`frame_ty` open question).
    pub fn loop_jump(&mut self, noret: NodeRef, header: NodeRef) -> NodeRef {
        self.intern_op_pub(Tag::Loop, noret, &[header])
    }
}

// Module::build/intern_op are crate-private; these thin re-exports let
// builder.rs construct control nodes without peephole (none apply to them).
impl Module {
    fn intern_op_pub(&mut self, tag: Tag, ty: NodeRef, operands: &[NodeRef]) -> NodeRef {
        self.build_control(tag, ty, operands)
    }
}

// ---------------------------------------------------------------------
// Peephole simplification
// ---------------------------------------------------------------------

/// Try to simplify `tag(operands) : ty` before it is interned. Returns
/// `Some(existing_or_simplified_node)` if a rule fired, `None` if the node
/// should be interned as-is.
pub(crate) fn simplify(m: &mut Module, tag: Tag, ty: NodeRef, data: Payload, operands: &[NodeRef]) -> Option<NodeRef> {
    if tag.is_iarith_op() {
        return fold_iarith(m, tag, ty, operands);
    }
    if tag.is_farith_op() {
        let flags = match data {
            Payload::FpFlags(f) => f,
            _ => Default::default(),
        };
        return fold_farith(m, tag, ty, flags, operands);
    }
    if tag.is_bitwise_op() {
        return fold_bitwise(m, tag, ty, operands);
    }
    if tag.is_shift_op() {
        return fold_shift(m, tag, ty, operands);
    }
    if tag.is_cast_op() {
        return fold_cast(m, tag, ty, operands);
    }
    if tag == Tag::Ext || tag == Tag::Ins || tag == Tag::Tup {
        return fold_aggregate(m, tag, ty, operands);
    }
    if tag == Tag::Load || tag == Tag::Store {
        return fold_memory(m, tag, ty, operands);
    }
    None
}

fn const_int_value(m: &Module, n: NodeRef) -> Option<u64> {
    let data = m.node(n);
    if data.tag == Some(Tag::Const) {
        if let Payload::Int(v) = data.data {
            return Some(v);
        }
    }
    None
}

fn is_zero(m: &Module, n: NodeRef) -> bool {
    const_int_value(m, n) == Some(0)
}

fn is_one(m: &Module, n: NodeRef) -> bool {
    const_int_value(m, n) == Some(1)
}

fn width_of(m: &Module, ty: NodeRef) -> u32 {
    match m.node(ty).data {
        Payload::Width(w) => w,
        _ => panic!("width_of: not a sized type"),
    }
}

fn mask(v: u64, width: u32) -> u64 {
    if width >= 64 {
        v
    } else {
        v & ((1u64 << width) - 1)
    }
}

fn sign_extend(v: u64, width: u32) -> i64 {
    if width >= 64 {
        v as i64
    } else {
        let shift = 64 - width;
        ((v << shift) as i64) >> shift
    }
}

/// Integer arithmetic: fold constants, commute constant-to-left, then
/// identity/absorbing-element rewrites (spec.md §4.1).
fn fold_iarith(m: &mut Module, tag: Tag, ty: NodeRef, operands: &[NodeRef]) -> Option<NodeRef> {
    let x = operands[0];
    let y = operands[1];
    let width = width_of(m, ty);

    // x - x -> 0 (holds unconditionally, even for non-constant x).
    if tag == Tag::ISub && x == y {
        return Some(m.const_int(ty, 0));
    }

    if let (Some(a), Some(b)) = (const_int_value(m, x), const_int_value(m, y)) {
        let sa = sign_extend(a, width);
        let sb = sign_extend(b, width);
        let folded = match tag {
            Tag::IAdd => Some(mask(a.wrapping_add(b), width)),
            Tag::ISub => Some(mask(a.wrapping_sub(b), width)),
            Tag::IMul => Some(mask(a.wrapping_mul(b), width)),
            Tag::IDivS if b != 0 => Some(mask(sa.wrapping_div(sb) as u64, width)),
            Tag::IDivU if b != 0 => Some(mask(a.wrapping_div(b), width)),
            Tag::IRemS if b != 0 => Some(mask(sa.wrapping_rem(sb) as u64, width)),
            Tag::IRemU if b != 0 => Some(mask(a.wrapping_rem(b), width)),
            // Error-token-producing variants: the exhaustive semantics of
            // the error token are unspecified (spec.md Open Questions), so
            // only the commutative/identity rewrites below apply to them;
            // two-constant folding is intentionally not attempted here.
            _ => None,
        };
        if let Some(v) = folded {
            return Some(m.const_int(ty, v));
        }
    }

    // Commute so a constant, if any, is on the left (commutative ops only).
    let commutative = matches!(tag, Tag::IAdd | Tag::IMul);
    let (x, y) = if commutative && const_int_value(m, y).is_some() && const_int_value(m, x).is_none() {
        (y, x)
    } else {
        (x, y)
    };

    match tag {
        Tag::IAdd if is_zero(m, x) => return Some(y),
        Tag::ISub if is_zero(m, y) => return Some(x),
        Tag::IMul if is_zero(m, x) => return Some(x),
        Tag::IMul if is_one(m, x) => return Some(y),
        Tag::IDivS | Tag::IDivU if is_zero(m, x) => return Some(m.const_int(ty, 0)),
        Tag::IDivS | Tag::IDivU if is_one(m, y) => return Some(x),
        Tag::IRemS | Tag::IRemU if is_zero(m, x) => return Some(m.const_int(ty, 0)),
        Tag::IRemS | Tag::IRemU if is_one(m, y) => return Some(x),
        _ => {}
    }

    if (x, y) != (operands[0], operands[1]) {
        return Some(m.build(tag, ty, &[x, y]));
    }
    None
}

/// Float arithmetic: same identities as integer arithmetic, but `x-x->0`,
/// `0*x->0`, `0/x->0`, `0%x->0` only hold when `finite_only` is set (spec.md
/// §4.1: unsound in general IEEE 754 math because of NaN/Inf).
fn fold_farith(
    m: &mut Module,
    tag: Tag,
    ty: NodeRef,
    flags: crate::ir::FpFlags,
    operands: &[NodeRef],
) -> Option<NodeRef> {
    let x = operands[0];
    let y = operands[1];
    let width = width_of(m, ty);

    if let (Some(a), Some(b)) = (const_float_value(m, x), const_float_value(m, y)) {
        let folded: Option<f64> = match tag {
            Tag::FAdd => Some(a + b),
            Tag::FSub => Some(a - b),
            Tag::FMul => Some(a * b),
            Tag::FDiv => Some(if width == 32 {
                ((a as f32) / (b as f32)) as f64
            } else {
                a / b
            }),
            Tag::FRem => Some(if width == 32 {
                ((a as f32) % (b as f32)) as f64
            } else {
                a % b
            }),
            _ => None,
        };
        if let Some(v) = folded {
            return Some(const_float(m, ty, width, v));
        }
    }

    if flags.finite_only {
        if tag == Tag::FSub && x == y {
            return Some(const_float(m, ty, width, 0.0));
        }
        if matches!(tag, Tag::FMul | Tag::FDiv | Tag::FRem) && const_float_value(m, x) == Some(0.0) {
            return Some(const_float(m, ty, width, 0.0));
        }
    }
    None
}

fn const_float_value(m: &Module, n: NodeRef) -> Option<f64> {
    let data = m.node(n);
    if data.tag == Some(Tag::Const) {
        if let Payload::FloatBits(bits) = data.data {
            let ty = data.ty.unwrap();
            return Some(match width_of(m, ty) {
                32 => f32::from_bits(bits as u32) as f64,
                _ => f64::from_bits(bits),
            });
        }
    }
    None
}

fn const_float(m: &mut Module, ty: NodeRef, width: u32, v: f64) -> NodeRef {
    let bits = if width == 32 {
        (v as f32).to_bits() as u64
    } else {
        v.to_bits()
    };
    m.const_float_bits(ty, bits)
}

/// Bitwise and/or/xor identities (spec.md §4.1).
fn fold_bitwise(m: &mut Module, tag: Tag, ty: NodeRef, operands: &[NodeRef]) -> Option<NodeRef> {
    let x = operands[0];
    let y = operands[1];
    let width = width_of(m, ty);
    let all_ones = mask(u64::MAX, width);

    if x == y {
        match tag {
            Tag::And | Tag::Or => return Some(x),
            Tag::Xor => return Some(m.const_int(ty, 0)),
            _ => {}
        }
    }

    if let (Some(a), Some(b)) = (const_int_value(m, x), const_int_value(m, y)) {
        let folded = match tag {
            Tag::And => a & b,
            Tag::Or => a | b,
            Tag::Xor => a ^ b,
            _ => unreachable!(),
        };
        return Some(m.const_int(ty, folded));
    }

    let (x, y) = if const_int_value(m, y).is_some() && const_int_value(m, x).is_none() {
        (y, x)
    } else {
        (x, y)
    };

    match tag {
        Tag::And if is_zero(m, x) => return Some(x),
        Tag::And if const_int_value(m, x) == Some(all_ones) => return Some(y),
        Tag::Or if is_zero(m, x) => return Some(y),
        Tag::Or if const_int_value(m, x) == Some(all_ones) => return Some(x),
        Tag::Xor if is_zero(m, x) => return Some(y),
        _ => {}
    }

    if (x, y) != (operands[0], operands[1]) {
        return Some(m.build(tag, ty, &[x, y]));
    }
    None
}

/// Shift identities (spec.md §4.1).
fn fold_shift(m: &mut Module, tag: Tag, ty: NodeRef, operands: &[NodeRef]) -> Option<NodeRef> {
    let x = operands[0];
    let y = operands[1];
    let width = width_of(m, ty);

    if let (Some(a), Some(b)) = (const_int_value(m, x), const_int_value(m, y)) {
        let folded = match tag {
            Tag::Shl => mask(a.wrapping_shl(b as u32), width),
            Tag::ShrU => mask(a.wrapping_shr(b as u32), width),
            Tag::ShrS => mask((sign_extend(a, width) >> (b.min(63) as i64)) as u64, width),
            _ => unreachable!(),
        };
        return Some(m.const_int(ty, folded));
    }

    if is_zero(m, y) {
        return Some(x);
    }
    if is_zero(m, x) {
        return Some(x);
    }
    None
}

/// Cast folding and identity elision (spec.md §4.1).
fn fold_cast(m: &mut Module, tag: Tag, ty: NodeRef, operands: &[NodeRef]) -> Option<NodeRef> {
    let x = operands[0];
    let x_ty = m.node(x).ty.unwrap();
    if x_ty == ty {
        return Some(x);
    }

    match tag {
        Tag::ITrunc | Tag::SExt | Tag::ZExt => {
            if let Some(v) = const_int_value(m, x) {
                let from_w = width_of(m, x_ty);
                let to_w = width_of(m, ty);
                let widened = match tag {
                    Tag::SExt => sign_extend(v, from_w) as u64,
                    _ => v,
                };
                return Some(m.const_int(ty, mask(widened, to_w)));
            }
        }
        Tag::Bitcast => {
            if let Some(v) = const_int_value(m, x) {
                return Some(m.const_int(ty, v));
            }
        }
        Tag::FTrunc => {
            if let Some(v) = const_float_value(m, x) {
                let to_w = width_of(m, ty);
                return Some(const_float(m, ty, to_w, v));
            }
        }
        Tag::UToF => {
            if let Some(v) = const_int_value(m, x) {
                let to_w = width_of(m, ty);
                return Some(const_float(m, ty, to_w, v as f64));
            }
        }
        Tag::SToF => {
            if let Some(v) = const_int_value(m, x) {
                let from_w = width_of(m, x_ty);
                let to_w = width_of(m, ty);
                return Some(const_float(m, ty, to_w, sign_extend(v, from_w) as f64));
            }
        }
        Tag::FToU => {
            if let Some(v) = const_float_value(m, x) {
                let to_w = width_of(m, ty);
                return Some(m.const_int(ty, mask(v as u64, to_w)));
            }
        }
        Tag::FToS => {
            if let Some(v) = const_float_value(m, x) {
                let to_w = width_of(m, ty);
                return Some(m.const_int(ty, mask(v as i64 as u64, to_w)));
            }
        }
        _ => {}
    }
    None
}

/// Aggregate rewrites (spec.md §4.1): `ext`/`ins`/`tup` patterns.
fn fold_aggregate(m: &mut Module, tag: Tag, ty: NodeRef, operands: &[NodeRef]) -> Option<NodeRef> {
    match tag {
        Tag::Ext => {
            let a = operands[0];
            let idx = operands[1];
            let a_tag = m.node(a).tag;
            let a_operands: smallvec::SmallVec<[NodeRef; 4]> = m.node(a).operands.clone();
            let a_ty = m.node(a).ty;

            // ext(tup(x1..xn), const i) -> x_i
            if a_tag == Some(Tag::Tup) {
                if let Some(i) = const_int_value(m, idx) {
                    if (i as usize) < a_operands.len() {
                        return Some(a_operands[i as usize]);
                    }
                }
            }

            // ext(array(x, x, ..., x), _) -> x  (all elements equal)
            if a_tag == Some(Tag::Array) && !a_operands.is_empty() {
                let first = a_operands[0];
                if a_operands.iter().all(|&e| e == first) {
                    return Some(first);
                }
                // ext(array(x, y), !b) -> ext(array(y, x), b): canonicalize
                // away a boolean-complemented index, recognizing `!b` as
                // `xor(b, 1)` since this IR has no dedicated `not` tag.
                if a_operands.len() == 2 {
                    if let Some(complemented) = as_bool_complement(m, idx) {
                        let swapped = m.array(a_ty.unwrap(), &[a_operands[1], a_operands[0]]);
                        return Some(m.ext(ty, swapped, complemented));
                    }
                }
            }

            // ext(ins(a, i, v), i) -> v   (same constant index)
            if a_tag == Some(Tag::Ins) {
                let inner_idx = a_operands[1];
                if let (Some(i1), Some(i2)) = (const_int_value(m, idx), const_int_value(m, inner_idx)) {
                    if i1 == i2 {
                        return Some(a_operands[2]);
                    }
                }
            }
            None
        }
        Tag::Tup => {
            // tup(ext(x,0), ext(x,1), ..., ext(x,n-1)) -> x
            if operands.is_empty() {
                return None;
            }
            let mut common: Option<NodeRef> = None;
            for (i, &elem) in operands.iter().enumerate() {
                let d = m.node(elem);
                if d.tag != Some(Tag::Ext) {
                    return None;
                }
                let src = d.operands[0];
                let idx = d.operands[1];
                if const_int_value(m, idx) != Some(i as u64) {
                    return None;
                }
                match common {
                    None => common = Some(src),
                    Some(c) if c == src => {}
                    Some(_) => return None,
                }
            }
            common
        }
        _ => None,
    }
}

fn as_bool_complement(m: &Module, n: NodeRef) -> Option<NodeRef> {
    let d = m.node(n);
    if d.tag == Some(Tag::Xor) {
        if const_int_value(m, d.operands[1]) == Some(1) {
            return Some(d.operands[0]);
        }
        if const_int_value(m, d.operands[0]) == Some(1) {
            return Some(d.operands[1]);
        }
    }
    None
}

/// Memory rewrites (spec.md §4.1): load-after-store forwarding,
/// store-after-store-to-same-address folding.
fn fold_memory(m: &mut Module, tag: Tag, ty: NodeRef, operands: &[NodeRef]) -> Option<NodeRef> {
    match tag {
        Tag::Load => {
            let mem = operands[0];
            let ptr = operands[1];
            let mem_data = m.node(mem);
            if mem_data.tag == Some(Tag::Store) {
                let store_ptr = mem_data.operands[1];
                let store_val = mem_data.operands[2];
                if store_ptr == ptr && m.node(store_val).ty == Some(ty) {
                    return Some(store_val);
                }
            }
            None
        }
        Tag::Store => {
            let mem = operands[0];
            let ptr = operands[1];
            let mem_data = m.node(mem);
            if mem_data.tag == Some(Tag::Store) {
                let inner_mem = mem_data.operands[0];
                let inner_ptr = mem_data.operands[1];
                if inner_ptr == ptr {
                    return Some(m.build(Tag::Store, ty, &[inner_mem, ptr, operands[2]]));
                }
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::{FpFlags, Linkage};
    use crate::module::Module;

    #[test]
    fn bitwise_identities_fold() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let func_ty = m.func_type(i32_ty, i32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let x = m.param(f);
        let zero = m.const_int(i32_ty, 0);
        let all_ones = m.const_int(i32_ty, 0xFFFF_FFFF);

        assert_eq!(m.band(i32_ty, x, x), x, "x & x -> x");
        assert_eq!(m.bor(i32_ty, x, x), x, "x | x -> x");
        assert_eq!(m.bxor(i32_ty, x, x), zero, "x ^ x -> 0");
        assert_eq!(m.band(i32_ty, zero, x), zero, "0 & x -> 0");
        assert_eq!(m.bor(i32_ty, zero, x), x, "0 | x -> x");
        assert_eq!(m.band(i32_ty, all_ones, x), x, "all_ones & x -> x");
        assert_eq!(m.bor(i32_ty, all_ones, x), all_ones, "all_ones | x -> all_ones");
    }

    #[test]
    fn constant_bitwise_ops_fold_to_a_single_constant() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let a = m.const_int(i32_ty, 0b1100);
        let b = m.const_int(i32_ty, 0b1010);
        let anded = m.band(i32_ty, a, b);
        assert_eq!(anded, m.const_int(i32_ty, 0b1000));
    }

    #[test]
    fn shift_identities_fold() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let func_ty = m.func_type(i32_ty, i32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let x = m.param(f);
        let zero = m.const_int(i32_ty, 0);

        assert_eq!(m.shl(i32_ty, x, zero), x, "x << 0 -> x");
        assert_eq!(m.shru(i32_ty, zero, x), zero, "0 >> x -> 0");

        let two = m.const_int(i32_ty, 2);
        assert_eq!(m.shl(i32_ty, two, two), m.const_int(i32_ty, 8));
    }

    #[test]
    fn casts_fold_constants_and_elide_identity() {
        let mut m = Module::new("t");
        let i8_ty = m.int_type(8);
        let i32_ty = m.int_type(32);

        let neg_one_8 = m.const_int(i8_ty, 0xFF);
        let sign_extended = m.sext(i32_ty, neg_one_8);
        assert_eq!(sign_extended, m.const_int(i32_ty, 0xFFFF_FFFF));

        let zero_extended = m.zext(i32_ty, neg_one_8);
        assert_eq!(zero_extended, m.const_int(i32_ty, 0x0000_00FF));

        let func_ty = m.func_type(i32_ty, i32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let x = m.param(f);
        assert_eq!(m.bitcast(i32_ty, x), x, "same-type cast is the identity");
    }

    #[test]
    fn ext_of_tup_selects_the_constant_indexed_element() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let a = m.const_int(i32_ty, 10);
        let b = m.const_int(i32_ty, 20);
        let pair_ty = m.tup_type(&[i32_ty, i32_ty]);
        let pair = m.tup(pair_ty, &[a, b]);
        let idx1 = m.const_int(i32_ty, 1);
        assert_eq!(m.ext(i32_ty, pair, idx1), b);
    }

    #[test]
    fn ext_of_uniform_array_ignores_the_index() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let func_ty = m.func_type(i32_ty, i32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let idx = m.param(f);
        let v = m.const_int(i32_ty, 42);
        let arr_ty = m.array_type(3, i32_ty);
        let arr = m.array(arr_ty, &[v, v, v]);
        assert_eq!(m.ext(i32_ty, arr, idx), v);
    }

    #[test]
    fn ext_of_ins_at_the_same_constant_index_returns_the_inserted_value() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let a = m.const_int(i32_ty, 1);
        let b = m.const_int(i32_ty, 2);
        let pair_ty = m.tup_type(&[i32_ty, i32_ty]);
        let pair = m.tup(pair_ty, &[a, b]);
        let v = m.const_int(i32_ty, 99);
        let idx0 = m.const_int(i32_ty, 0);
        let inserted = m.ins(pair_ty, pair, idx0, v);
        assert_eq!(m.ext(i32_ty, inserted, idx0), v);
    }

    #[test]
    fn store_after_store_to_the_same_address_folds_away_the_earlier_store() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let ptr_ty = m.ptr_type();
        let func_ty = m.func_type(ptr_ty, i32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let p = m.param(f);
        let mem = m.start(f);
        let v1 = m.const_int(i32_ty, 1);
        let v2 = m.const_int(i32_ty, 2);

        let after_first = m.store(mem, p, v1);
        let after_second = m.store(after_first, p, v2);

        let direct = m.store(mem, p, v2);
        assert_eq!(after_second, direct, "store-after-store to the same address collapses");
    }

    #[test]
    fn select_desugars_to_ext_of_a_two_element_array() {
        let mut m = Module::new("t");
        let i32_ty = m.int_type(32);
        let func_ty = m.func_type(i32_ty, i32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let cond = m.param(f);
        let t = m.const_int(i32_ty, 1);
        let e = m.const_int(i32_ty, 0);
        let selected = m.select(i32_ty, cond, t, e);
        let arr_ty = m.array_type(2, i32_ty);
        let arr = m.array(arr_ty, &[e, t]);
        let expected = m.ext(i32_ty, arr, cond);
        assert_eq!(selected, expected);
    }

    #[test]
    fn finite_only_float_identities_require_the_flag() {
        let mut m = Module::new("t");
        let f32_ty = m.float_type(32);
        let func_ty = m.func_type(f32_ty, f32_ty);
        let f = m.create_function(func_ty, Linkage::Exported);
        let x = m.param(f);
        let zero_bits = m.const_float_bits(f32_ty, 0f32.to_bits() as u64);

        let finite = FpFlags { finite_only: true };
        let not_finite = FpFlags::default();

        assert_eq!(m.fsub(f32_ty, finite, x, x), zero_bits, "x - x -> 0 under finite_only");
        // Without finite_only, the IR can't assume `x - x == 0` (NaN), so no
        // rule fires and a fresh node is interned instead.
        let unfolded = m.fsub(f32_ty, not_finite, x, x);
        assert_ne!(unfolded, zero_bits);
    }

    #[test]
    fn positive_and_negative_float_zero_are_distinct_constants() {
        let mut m = Module::new("t");
        let f64_ty = m.float_type(64);
        let pos_zero = m.const_float_bits(f64_ty, 0f64.to_bits());
        let neg_zero = m.const_float_bits(f64_ty, (-0f64).to_bits());
        assert_ne!(pos_zero, neg_zero, "bit-exact float constants: +0 and -0 are distinct");
    }
}
