//! The node universe (spec.md §3, component A): entity references, the tag
//! taxonomy, and the `NodeData` record.

pub mod entities;
pub mod node;
pub mod tag;

pub use crate::ir::entities::{Block, BlockListRef, NodeRef, UseRef};
pub use crate::ir::node::{FpFlags, Linkage, NodeData, Payload, Use};
pub use crate::ir::tag::{Tag, TypeTag};
