//! Layout module orchestrator.
//!
//! Downstream modules import layout types from here while the solver
//! details live in the private `core` module.

mod core;

pub use core::{Constraint, Direction, LayoutNode, LayoutTree, NodeId};
