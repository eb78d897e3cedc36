//! The closed tag taxonomy for type nodes and value/control nodes.
//!
//! Rather than a class hierarchy, every node carries one of these small
//! `enum`s plus a `(type, data, operands)` triple; per-tag behavior is
//! dispatched by matching on the tag (predicates here, peephole rules in
//! [`crate::builder`], scheduling classification in [`crate::schedule`]).
//! This mirrors how `cranelift-codegen`'s `ir::Opcode` is a flat enum with
//! `is_branch`/`is_terminator`/... predicate methods, generalized to this
//! IR's much smaller, hand-written (not meta-generated) tag set.

use core::fmt;

/// The tag of a type node. Type nodes carry a back-reference to their owning
/// module instead of a `type` field (spec.md §3: "Type nodes instead carry a
/// back reference to their owning module").
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeTag {
    /// The memory-token type, threaded through `load`/`store`/`alloc`.
    Mem,
    /// The non-returning type used to mark continuations.
    NoRet,
    /// An opaque pointer type.
    Ptr,
    /// The opaque integer-division/remainder error-token type. Spec.md's
    /// open questions flag this as a token whose lowering is unspecified;
    /// it is threaded like `mem` rather than interpreted.
    ErrTy,
    /// An integer type of a given bit width, carried in `data`.
    Int,
    /// A float type of a given bit width (16, 32, or 64), carried in `data`.
    Float,
    /// A fixed-arity tuple type over its operand types.
    Tup,
    /// A fixed-size array type; the dimension is carried in `data`, the
    /// element type is the sole operand.
    Array,
    /// A dynamically-sized array type; the element type is the sole operand.
    DynArray,
    /// A function (or, when the return type is `NoRet`, continuation) type.
    /// Exactly two operands: parameter type, return type.
    Func,
}

impl TypeTag {
    /// Does this tag admit a `data` payload (bitwidth or array dimension)?
    pub fn has_data(self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::Float | TypeTag::Array)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            TypeTag::Mem => "mem",
            TypeTag::NoRet => "noret",
            TypeTag::Ptr => "ptr",
            TypeTag::ErrTy => "err_ty",
            TypeTag::Int => "int_ty",
            TypeTag::Float => "float_ty",
            TypeTag::Tup => "tup_ty",
            TypeTag::Array => "array_ty",
            TypeTag::DynArray => "dynarray_ty",
            TypeTag::Func => "func_ty",
        };
        f.write_str(s)
    }
}

/// The tag of a non-type node: constants, nominals, and every operation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Tag {
    // -- constants --
    /// The top (unreachable / "no value yet") lattice element.
    Top,
    /// The bottom (overdefined) lattice element.
    Bot,
    /// A constant of integer or float type.
    Const,

    // -- nominals --
    /// A function or continuation definition. Nominal.
    Func,
    /// A global variable definition. Nominal.
    Global,

    // -- integer arithmetic --
    /// Integer add.
    IAdd,
    /// Integer subtract.
    ISub,
    /// Integer multiply.
    IMul,
    /// Signed integer divide.
    IDivS,
    /// Unsigned integer divide.
    IDivU,
    /// Signed integer remainder.
    IRemS,
    /// Unsigned integer remainder.
    IRemU,
    /// Signed integer divide producing `(value, err_ty)`.
    IDivSErr,
    /// Unsigned integer divide producing `(value, err_ty)`.
    IDivUErr,
    /// Signed integer remainder producing `(value, err_ty)`.
    IRemSErr,
    /// Unsigned integer remainder producing `(value, err_ty)`.
    IRemUErr,

    // -- float arithmetic --
    /// Float add.
    FAdd,
    /// Float subtract.
    FSub,
    /// Float multiply.
    FMul,
    /// Float divide.
    FDiv,
    /// Float remainder.
    FRem,
    /// Float divide producing `(value, err_ty)`.
    FDivErr,
    /// Float remainder producing `(value, err_ty)`.
    FRemErr,

    // -- comparisons --
    /// Integer equality.
    ICmpEq,
    /// Integer inequality.
    ICmpNe,
    /// Signed integer less-than.
    ICmpSlt,
    /// Signed integer less-or-equal.
    ICmpSle,
    /// Unsigned integer less-than.
    ICmpUlt,
    /// Unsigned integer less-or-equal.
    ICmpUle,
    /// Ordered float equality.
    FCmpOeq,
    /// Ordered float less-than.
    FCmpOlt,
    /// Ordered float less-or-equal.
    FCmpOle,
    /// Unordered float inequality.
    FCmpUne,

    // -- bitwise / shifts --
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise xor.
    Xor,
    /// Logical shift left.
    Shl,
    /// Logical (unsigned) shift right.
    ShrU,
    /// Arithmetic (signed) shift right.
    ShrS,

    // -- casts --
    /// Integer truncation (narrowing only).
    ITrunc,
    /// Sign-extending integer widen (widening only).
    SExt,
    /// Zero-extending integer widen (widening only).
    ZExt,
    /// Float truncation to a narrower float type.
    FTrunc,
    /// Unsigned-integer-to-float conversion.
    UToF,
    /// Signed-integer-to-float conversion.
    SToF,
    /// Float-to-unsigned-integer conversion.
    FToU,
    /// Float-to-signed-integer conversion.
    FToS,
    /// Bit-preserving reinterpretation between same-width types.
    Bitcast,

    // -- aggregates --
    /// Build a tuple value from its operands.
    Tup,
    /// Build an array value from its operands.
    Array,
    /// Insert an element into an aggregate, producing a new aggregate.
    Ins,
    /// Extract an element from an aggregate.
    Ext,
    /// Take the address of an aggregate element.
    AddrOf,

    // -- memory --
    /// Stack/heap allocation, producing a pointer and updated memory token.
    Alloc,
    /// Load a value through a pointer given a memory token.
    Load,
    /// Store a value through a pointer given a memory token.
    Store,

    // -- control --
    /// The parameter value of an enclosing function.
    Param,
    /// The entry memory/control token of a function.
    Start,
    /// A call to a continuation or function.
    Call,
    /// A loop header continuation marker.
    Loop,
    /// A two-way conditional continuation selector.
    If,
}

impl Tag {
    /// Is this tag a constant (`top`, `bot`, or `const`)?
    pub fn is_const(self) -> bool {
        matches!(self, Tag::Top | Tag::Bot | Tag::Const)
    }

    /// Is this tag a nominal node (`func` or `global`)?
    pub fn is_nominal(self) -> bool {
        matches!(self, Tag::Func | Tag::Global)
    }

    /// Is this tag a structural (hash-consed) node, i.e. not nominal?
    pub fn is_structural(self) -> bool {
        !self.is_nominal()
    }

    /// Is this tag an integer arithmetic operation?
    pub fn is_iarith_op(self) -> bool {
        matches!(
            self,
            Tag::IAdd
                | Tag::ISub
                | Tag::IMul
                | Tag::IDivS
                | Tag::IDivU
                | Tag::IRemS
                | Tag::IRemU
                | Tag::IDivSErr
                | Tag::IDivUErr
                | Tag::IRemSErr
                | Tag::IRemUErr
        )
    }

    /// Is this tag a float arithmetic operation?
    pub fn is_farith_op(self) -> bool {
        matches!(
            self,
            Tag::FAdd
                | Tag::FSub
                | Tag::FMul
                | Tag::FDiv
                | Tag::FRem
                | Tag::FDivErr
                | Tag::FRemErr
        )
    }

    /// Is this tag a division or remainder (of any signedness/kind)?
    pub fn is_div_or_rem(self) -> bool {
        matches!(
            self,
            Tag::IDivS
                | Tag::IDivU
                | Tag::IRemS
                | Tag::IRemU
                | Tag::IDivSErr
                | Tag::IDivUErr
                | Tag::IRemSErr
                | Tag::IRemUErr
                | Tag::FDiv
                | Tag::FRem
                | Tag::FDivErr
                | Tag::FRemErr
        )
    }

    /// Does this division/remainder tag thread an error token alongside its value?
    pub fn produces_err_token(self) -> bool {
        matches!(
            self,
            Tag::IDivSErr | Tag::IDivUErr | Tag::IRemSErr | Tag::IRemUErr | Tag::FDivErr | Tag::FRemErr
        )
    }

    /// Is this tag a comparison?
    pub fn is_cmp_op(self) -> bool {
        matches!(
            self,
            Tag::ICmpEq
                | Tag::ICmpNe
                | Tag::ICmpSlt
                | Tag::ICmpSle
                | Tag::ICmpUlt
                | Tag::ICmpUle
                | Tag::FCmpOeq
                | Tag::FCmpOlt
                | Tag::FCmpOle
                | Tag::FCmpUne
        )
    }

    /// Is this tag a bitwise operation (and/or/xor, not shifts)?
    pub fn is_bitwise_op(self) -> bool {
        matches!(self, Tag::And | Tag::Or | Tag::Xor)
    }

    /// Is this tag a shift operation?
    pub fn is_shift_op(self) -> bool {
        matches!(self, Tag::Shl | Tag::ShrU | Tag::ShrS)
    }

    /// Is this tag a cast?
    pub fn is_cast_op(self) -> bool {
        matches!(
            self,
            Tag::ITrunc
                | Tag::SExt
                | Tag::ZExt
                | Tag::FTrunc
                | Tag::UToF
                | Tag::SToF
                | Tag::FToU
                | Tag::FToS
                | Tag::Bitcast
        )
    }

    /// Is this tag an aggregate operation?
    pub fn is_aggregate_op(self) -> bool {
        matches!(self, Tag::Tup | Tag::Array | Tag::Ins | Tag::Ext | Tag::AddrOf)
    }

    /// Is this tag a memory operation?
    pub fn is_memory_op(self) -> bool {
        matches!(self, Tag::Alloc | Tag::Load | Tag::Store)
    }

    /// Is this tag a control-flow operation?
    pub fn is_control_op(self) -> bool {
        matches!(self, Tag::Param | Tag::Start | Tag::Call | Tag::Loop | Tag::If)
    }

    /// Invariant nodes don't depend on runtime control flow: constants and
    /// pure operations over only-invariant operands. The module computes
    /// this per-node at construction time rather than re-deriving it from
    /// the tag alone (arithmetic on constants is invariant; the same tag
    /// applied to a `param` is not), but the tag alone tells us whether the
    /// *kind* of node can ever be invariant.
    pub fn can_be_invariant(self) -> bool {
        self.is_const()
            || self.is_iarith_op()
            || self.is_farith_op()
            || self.is_cmp_op()
            || self.is_bitwise_op()
            || self.is_shift_op()
            || self.is_cast_op()
            || self.is_aggregate_op()
    }

    /// Speculatable nodes have no observable side effect and may be hoisted
    /// by the scheduler out of loops. Memory and control nodes are never
    /// speculatable; nominal nodes are out-of-schedule entirely.
    pub fn is_speculatable(self) -> bool {
        self.is_iarith_op()
            || self.is_farith_op()
            || self.is_cmp_op()
            || self.is_bitwise_op()
            || self.is_shift_op()
            || self.is_cast_op()
            || self.is_aggregate_op()
            || self.is_const()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Tag::Top => "top",
            Tag::Bot => "bot",
            Tag::Const => "const",
            Tag::Func => "func",
            Tag::Global => "global",
            Tag::IAdd => "iadd",
            Tag::ISub => "isub",
            Tag::IMul => "imul",
            Tag::IDivS => "idivs",
            Tag::IDivU => "idivu",
            Tag::IRemS => "irems",
            Tag::IRemU => "iremu",
            Tag::IDivSErr => "idivs_err",
            Tag::IDivUErr => "idivu_err",
            Tag::IRemSErr => "irems_err",
            Tag::IRemUErr => "iremu_err",
            Tag::FAdd => "fadd",
            Tag::FSub => "fsub",
            Tag::FMul => "fmul",
            Tag::FDiv => "fdiv",
            Tag::FRem => "frem",
            Tag::FDivErr => "fdiv_err",
            Tag::FRemErr => "frem_err",
            Tag::ICmpEq => "icmpeq",
            Tag::ICmpNe => "icmpne",
            Tag::ICmpSlt => "icmpslt",
            Tag::ICmpSle => "icmpsle",
            Tag::ICmpUlt => "icmpult",
            Tag::ICmpUle => "icmpule",
            Tag::FCmpOeq => "fcmpoeq",
            Tag::FCmpOlt => "fcmpolt",
            Tag::FCmpOle => "fcmpole",
            Tag::FCmpUne => "fcmpune",
            Tag::And => "and",
            Tag::Or => "or",
            Tag::Xor => "xor",
            Tag::Shl => "shl",
            Tag::ShrU => "shru",
            Tag::ShrS => "shrs",
            Tag::ITrunc => "itrunc",
            Tag::SExt => "sext",
            Tag::ZExt => "zext",
            Tag::FTrunc => "ftrunc",
            Tag::UToF => "utof",
            Tag::SToF => "stof",
            Tag::FToU => "ftou",
            Tag::FToS => "ftos",
            Tag::Bitcast => "bitcast",
            Tag::Tup => "tup",
            Tag::Array => "array",
            Tag::Ins => "ins",
            Tag::Ext => "ext",
            Tag::AddrOf => "addrof",
            Tag::Alloc => "alloc",
            Tag::Load => "load",
            Tag::Store => "store",
            Tag::Param => "param",
            Tag::Start => "start",
            Tag::Call => "call",
            Tag::Loop => "loop",
            Tag::If => "if",
        };
        f.write_str(s)
    }
}
