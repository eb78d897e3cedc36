//! The `NodeData` record stored in a module's arena, and its scalar payload.

use crate::ir::entities::{NodeRef, UseRef};
use crate::ir::tag::{Tag, TypeTag};
use smallvec::SmallVec;

/// Linkage mode of a nominal node, carried in its `data` payload.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Linkage {
    /// Visible only within the defining module.
    Internal,
    /// Visible to other modules and kept alive by `cleanup`.
    Exported,
    /// Declared in this module, defined elsewhere.
    Imported,
}

/// The fp-flag set carried by float arithmetic `data`.
///
/// `finite_only` gates the `x-x->0`/`0*x->0`/`0/x->0`/`0%x->0` identities
/// (spec.md §4.1: these only hold for finite-only float arithmetic, since
/// they are unsound in the presence of NaN/Inf in general IEEE 754 math).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct FpFlags {
    /// Whether NaN/Inf are assumed absent, licensing more aggressive folds.
    pub finite_only: bool,
}

/// The tag-specific scalar payload of a node. Exactly one field is
/// meaningful per tag (spec.md §3: "mutually exclusive; which field is
/// meaningful is determined from the tag"); this is expressed as a sum type
/// rather than a C-style union so construction is checked at compile time.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Payload {
    /// No payload.
    None,
    /// Linkage mode of a nominal node.
    Linkage(Linkage),
    /// Float arithmetic flag set.
    FpFlags(FpFlags),
    /// A 64-bit integer constant (raw bits, masked by the node's bitwidth).
    Int(u64),
    /// A 64-bit float constant's raw bit pattern (`f64::to_bits`), or for a
    /// 32-bit float constant, the low 32 bits hold the `f32::to_bits` value.
    FloatBits(u64),
    /// The bit width of an integer or float type.
    Width(u32),
    /// The fixed dimension of an array type.
    ArrayDim(u32),
}

impl Default for Payload {
    fn default() -> Self {
        Payload::None
    }
}

/// A node: the universal IR entity (spec.md §3).
///
/// `NodeData` is stored by value in the module's `PrimaryMap<NodeRef, _>`
/// arena; all cross-references (`ty`, `operands`, `uses`) are `NodeRef`/
/// `UseRef` indices into that arena rather than pointers, per spec.md §9's
/// guidance on representing the graph without raw aliasing.
#[derive(Clone, Debug)]
pub struct NodeData {
    /// Monotonically increasing 64-bit identifier reflecting creation order
    /// within the owning module. Distinct from this node's `NodeRef` arena
    /// index, which can be reused/renumbered by `cleanup`.
    pub id: u64,
    /// This node's kind, for non-type nodes. `None` for type nodes, which
    /// instead carry `type_tag`.
    pub tag: Option<Tag>,
    /// This node's kind, for type nodes. `None` for non-type nodes.
    pub type_tag: Option<TypeTag>,
    /// Reference to this node's type, for non-type nodes (spec.md invariant
    /// 4: "every non-type node's `type` is a type node"). `None` for type
    /// nodes themselves, which are typeless.
    pub ty: Option<NodeRef>,
    /// The tag-specific scalar payload.
    pub data: Payload,
    /// Ordered operand references; fixed length after construction for
    /// structural nodes, mutable for nominal nodes via `Module::set_op`.
    pub operands: SmallVec<[NodeRef; 4]>,
    /// Head of this node's intrusive uses list (most-recently-added use
    /// first; spec.md §5 permits any order, clients must not depend on it).
    pub uses_head: Option<UseRef>,
    /// Whether this node's value does not depend on runtime control flow:
    /// a constant, or a `can_be_invariant` operation over only-invariant
    /// operands. Computed once at construction time by `Module::intern_op`
    /// (tag.rs's `can_be_invariant` only tells us whether the *kind* of node
    /// can ever qualify; this field records whether it actually does).
    /// Meaningless (always `false`) on type and nominal nodes.
    pub invariant: bool,
    /// Opaque debug-info reference. The debug-info pool itself is an
    /// external collaborator (spec.md §1); this field is the seam.
    pub debug_info: Option<()>,
}

impl NodeData {
    /// Is this a type node?
    pub fn is_ty(&self) -> bool {
        self.type_tag.is_some()
    }

    /// The operation tag, panicking if this is a type node.
    pub fn tag(&self) -> Tag {
        self.tag.expect("node is a type, has no operation tag")
    }

    /// The type tag, panicking if this is not a type node.
    pub fn type_tag(&self) -> TypeTag {
        self.type_tag.expect("node is not a type")
    }

    /// Is this node nominal (`func` or `global`)?
    pub fn is_nominal(&self) -> bool {
        self.tag.map_or(false, Tag::is_nominal)
    }

    /// Is this node structural (hash-consed, immutable once interned)?
    pub fn is_structural(&self) -> bool {
        !self.is_ty() && !self.is_nominal()
    }
}

/// A use edge: `(user, operand_index)`, linked intrusively through the used
/// node's `uses_head` so insertion/removal is O(1) (spec.md §9).
#[derive(Copy, Clone, Debug)]
pub struct Use {
    /// The node whose operand slot this use records.
    pub user: NodeRef,
    /// Which operand slot of `user` this use records.
    pub index: u32,
    /// Next use in the used node's intrusive list.
    pub next: Option<UseRef>,
}
