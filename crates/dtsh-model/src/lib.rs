//! Devicetree model and query engine for dtsh.
//!
//! The tree is an arena of nodes addressed by [`NodeId`]; the root is its own
//! parent. On top of it this crate resolves shell-like paths, expands
//! wildcard expressions, and searches, sorts and walks branches.

pub mod criteria;
pub mod locate;
pub mod node;
pub mod path;
pub mod sort;
pub mod source;
pub mod tree;
pub mod walk;

pub use criteria::{CriteriaChain, Criterion, IntCriterion, IntCriterionKind, IntExpr, TextCriterion, TextCriterionKind};
pub use locate::PathExpansion;
pub use node::{Binding, Interrupt, Node, NodeAttributes, Register, Vendor};
pub use sort::{SortKey, arrange};
pub use tree::{Devicetree, DevicetreeBuilder, NodeId};
pub use walk::{VirtualTree, WalkOptions};
