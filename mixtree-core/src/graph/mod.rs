//! Composition Graph
//!
//! This module implements the directed graph that records which units have
//! been composed into which: one node per tracked unit, one edge per
//! observed composition.
//!
//! # Overview
//!
//! - Nodes represent tracked units; a node exists from the first time its
//!   unit is referenced (watched, or named as an edge endpoint) until the
//!   registry is reset. Nodes are never deleted individually.
//! - Edges point from the composing unit to the composed unit: if B is
//!   mixed into A, there is an edge A -> B.
//! - A node with no parents is a root; the roots span the forest that the
//!   renderer prints.
//!
//! # Design Decisions
//!
//! 1. A single coarse mutex in the registry serializes all map access and
//!    edge recording. Composition events are rare and cheap, so there is
//!    nothing to gain from finer locking, and a coarse lock makes the
//!    paired parent/child insertion trivially atomic.
//!
//! 2. Nodes are shared handles, and snapshots are shallow. Readers that
//!    walk a snapshot concurrently with a writer may see freshly recorded
//!    edges mid-walk; adjacency has its own lock, so the walk stays sound.
//!
//! 3. Cycles are tolerated, not prevented. Traversals track the current
//!    path and truncate exactly where a path re-enters itself, so a unit
//!    reachable along several distinct paths still appears once per path.

mod node;
mod registry;

pub use node::{Node, Tree};
pub use registry::Registry;
