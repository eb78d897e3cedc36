//! Fir intermediate representation library.
//!
//! Fir is a sea-of-nodes-style IR: values, types, and control flow are all
//! modelled uniformly as nodes in a directed graph owned by a [`Module`].
//! Functions are first-class, and continuations (the targets of control
//! transfers) are ordinary functions whose return type is [`ir::types`]'s
//! `noret` token.
//!
//! The crate is organized the way a client uses it:
//!
//! 1. Build or mutate IR through [`Module`] (`ir`, `module`, `builder`).
//! 2. Derive per-function analyses (`scope`, `flowgraph`, `dominator_tree`,
//!    `loop_analysis`).
//! 3. Run the global code scheduler (`liveness`, `schedule`) to place every
//!    floating node into basic blocks.
//! 4. Hand the scheduled function to a backend through [`codegen`].
#![deny(missing_docs)]

pub mod builder;
pub mod codegen;
pub mod dominator_tree;
pub mod flowgraph;
pub mod ir;
pub mod liveness;
pub mod loop_analysis;
pub mod module;
pub mod result;
pub mod schedule;
pub mod scope;
pub mod settings;

pub use crate::module::Module;
pub use crate::result::{FirError, FirResult};

pub use fir_entity as entity;

/// Version number of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
