//! Entity references used across the node universe and its analyses.
//!
//! Nodes live in an arena owned by the [`crate::Module`]; other entities
//! (use records, CFG vertices, interned block lists) live in arenas owned by
//! whichever structure allocates them. Every reference is a small `u32`
//! index with its own type, so indexing the wrong arena with the wrong key
//! is a type error rather than a silent bug (spec.md §9: "represent the
//! arena as an owned collection of node records and pass node references as
//! indices ... into that arena").

use fir_entity::entity_impl;

/// A reference to a node owned by a [`crate::Module`]'s arena.
///
/// This is the arena-addressing index described in spec.md §9, distinct
/// from the monotonic creation-order `id` stamp each node also carries
/// (see [`crate::ir::node::NodeData::id`]).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(u32);
entity_impl!(NodeRef, "n");

/// A reference to a use record in a [`crate::Module`]'s use-record arena.
///
/// Use records are exclusively owned by the used node's `uses` list; the
/// module recycles retracted records through a freelist instead of actually
/// deallocating them (spec.md §3 Use).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UseRef(u32);
entity_impl!(UseRef, "u");

/// A reference to a vertex of a function's control-flow graph.
///
/// CFG vertices correspond 1:1 to continuation-typed `func` nodes with a
/// body (plus the synthetic source and sink), so a `Block` is really a
/// `NodeRef` in disguise; [`crate::flowgraph::ControlFlowGraph`] keeps the
/// mapping in both directions.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block(u32);
entity_impl!(Block, "b");

/// A reference to an interned, sorted, deduplicated set of [`Block`]s, as
/// produced by the scheduler's late-schedule phase and owned by a
/// [`crate::schedule::BlockListPool`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockListRef(u32);
entity_impl!(BlockListRef, "bl");
