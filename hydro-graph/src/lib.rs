//! A directed acyclic graph of pure, memoized computations.
//!
//! Nodes depend on fields of a state snapshot `S` or on other nodes. Every
//! node caches the dependency values it last computed from and its output;
//! evaluating it again recomputes only when some dependency's value differs
//! (by pointer identity for shared values, by equality for plain ones).
//! Unchanged inputs therefore hand back the very same `Rc` as before.
//!
//! Dependencies can only name nodes that already exist, so the graph is
//! acyclic by construction.

pub mod error;
pub mod graph;
mod node;

pub use error::{GraphError, Result};
pub use graph::{Family, Graph, NodeBuilder, NodeKey, Pass};
pub use node::Inputs;
