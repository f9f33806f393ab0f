//! Composition Registry
//!
//! The registry is the single source of truth for the composition graph:
//! a map from unit identity to its [`Node`], plus the mutex discipline
//! that keeps concurrent recording safe.
//!
//! # Locking
//!
//! One coarse mutex serializes every registry operation, including the
//! iteration behind [`Registry::roots`] and [`Registry::all`]. Composition
//! events are bookkeeping, not a hot path, so lock granularity is a
//! correctness concern only: two concurrent edge recordings that share an
//! endpoint are applied in some total order, never half-applied.
//!
//! # Consistency
//!
//! [`Registry::roots`] and [`Registry::all`] return snapshots of the node
//! map taken under the lock, but the nodes themselves are shared handles,
//! not deep copies. A caller walking a snapshot after the call returns may
//! observe edges recorded by a concurrent writer. That weak consistency is
//! deliberate; node adjacency is separately locked, so such a walk is
//! always sound.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::node::Node;
use crate::unit::{Unit, UnitId};

/// Thread-safe store of tracked units and the edges between them.
///
/// A registry is constructible for isolated use (tests, embedded trackers),
/// but normal usage goes through the lazily-initialized process-wide
/// instance returned by [`Registry::global`].
pub struct Registry {
    /// All nodes, keyed by unit identity, in first-reference order.
    nodes: Mutex<IndexMap<UnitId, Arc<Node>>>,
}

/// Get-or-create on an already-locked map.
///
/// Kept outside the impl so `record_edge` can ensure both endpoints under
/// a single acquisition of the non-reentrant mutex.
fn ensure_entry(nodes: &mut IndexMap<UnitId, Arc<Node>>, unit: &Unit) -> Arc<Node> {
    nodes
        .entry(unit.id())
        .or_insert_with(|| {
            trace!("tracking new unit {}", unit);
            Arc::new(Node::new(unit.clone()))
        })
        .clone()
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(IndexMap::new()),
        }
    }

    /// The process-wide registry instance.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Whether a node exists for this unit. Does not create one.
    pub fn is_tracked(&self, unit: &Unit) -> bool {
        self.nodes.lock().contains_key(&unit.id())
    }

    /// Get the canonical node for a unit, creating it if needed.
    pub fn ensure_node(&self, unit: &Unit) -> Arc<Node> {
        let mut nodes = self.nodes.lock();
        ensure_entry(&mut nodes, unit)
    }

    /// Start tracking a unit that has no edges yet.
    pub fn mark_tracked(&self, unit: &Unit) {
        let mut nodes = self.nodes.lock();
        ensure_entry(&mut nodes, unit);
    }

    /// Record a composition edge: `child` was composed into `parent`.
    ///
    /// Both endpoints are created on first reference, and the edge is added
    /// in both directions as one atomic step. Idempotent: repeating the
    /// same call leaves exactly one child entry and one parent entry.
    pub fn record_edge(&self, parent: &Unit, child: &Unit) {
        let mut nodes = self.nodes.lock();
        let pnode = ensure_entry(&mut nodes, parent);
        let cnode = ensure_entry(&mut nodes, child);
        pnode.add_child(&cnode);
        cnode.add_parent(&pnode);
        trace!("recorded edge {} -> {}", parent, child);
    }

    /// Snapshot of all parentless nodes, in first-reference order.
    pub fn roots(&self) -> Vec<Arc<Node>> {
        self.nodes
            .lock()
            .values()
            .filter(|n| n.is_root())
            .cloned()
            .collect()
    }

    /// Snapshot of every tracked node, in first-reference order.
    pub fn all(&self) -> Vec<Arc<Node>> {
        self.nodes.lock().values().cloned().collect()
    }

    /// The number of tracked units.
    pub fn node_count(&self) -> usize {
        self.nodes.lock().len()
    }

    /// Discard all tracked nodes.
    ///
    /// Only the registry's map is dropped; node objects are not touched.
    /// Handles obtained before the reset can still walk the old graph
    /// through their strong child references, though their parent links may
    /// go dead once the registry's references are gone. Old handles are
    /// only meaningful within the epoch that produced them.
    pub fn reset(&self) {
        let mut nodes = self.nodes.lock();
        let discarded = nodes.len();
        *nodes = IndexMap::new();
        debug!("registry reset, discarded {} nodes", discarded);
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn unit(name: &str) -> Unit {
        Unit::named(name)
    }

    #[test]
    fn ensure_node_is_get_or_create() {
        let registry = Registry::new();
        let a = unit("A");

        let first = registry.ensure_node(&a);
        let second = registry.ensure_node(&a);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.node_count(), 1);
    }

    #[test]
    fn mark_tracked_creates_without_edges() {
        let registry = Registry::new();
        let a = unit("A");

        assert!(!registry.is_tracked(&a));
        registry.mark_tracked(&a);
        assert!(registry.is_tracked(&a));

        let roots = registry.roots();
        assert_eq!(roots.len(), 1);
        assert!(roots[0].children().is_empty());
    }

    #[test]
    fn is_tracked_does_not_create() {
        let registry = Registry::new();
        let a = unit("A");

        assert!(!registry.is_tracked(&a));
        assert_eq!(registry.node_count(), 0);
    }

    #[test]
    fn record_edge_links_both_directions() {
        let registry = Registry::new();
        let a = unit("A");
        let b = unit("B");

        registry.record_edge(&a, &b);

        let anode = registry.ensure_node(&a);
        let bnode = registry.ensure_node(&b);

        assert_eq!(anode.children().len(), 1);
        assert!(Arc::ptr_eq(&anode.children()[0], &bnode));
        assert_eq!(bnode.parents().len(), 1);
        assert!(Arc::ptr_eq(&bnode.parents()[0], &anode));
    }

    #[test]
    fn record_edge_is_idempotent() {
        let registry = Registry::new();
        let a = unit("A");
        let b = unit("B");

        registry.record_edge(&a, &b);
        registry.record_edge(&a, &b);

        let anode = registry.ensure_node(&a);
        let bnode = registry.ensure_node(&b);
        assert_eq!(anode.children().len(), 1);
        assert_eq!(bnode.parents().len(), 1);
    }

    #[test]
    fn roots_are_nodes_without_parents() {
        let registry = Registry::new();
        let a = unit("A");
        let b = unit("B");
        let c = unit("C");

        registry.record_edge(&a, &b);
        registry.record_edge(&b, &c);

        let roots = registry.roots();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].unit(), &a);
        assert_eq!(registry.all().len(), 3);
    }

    #[test]
    fn cyclic_graph_has_no_roots() {
        let registry = Registry::new();
        let a = unit("A");
        let b = unit("B");

        registry.record_edge(&a, &b);
        registry.record_edge(&b, &a);

        assert!(registry.roots().is_empty());
        assert_eq!(registry.all().len(), 2);
    }

    #[test]
    fn snapshots_follow_first_reference_order() {
        let registry = Registry::new();
        let a = unit("A");
        let b = unit("B");
        let c = unit("C");

        registry.mark_tracked(&c);
        registry.record_edge(&a, &b);

        let names: Vec<_> = registry.all().iter().map(|n| n.display_name()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn reset_discards_everything() {
        let registry = Registry::new();
        let a = unit("A");
        let b = unit("B");

        registry.record_edge(&a, &b);
        registry.reset();

        assert!(registry.roots().is_empty());
        assert!(registry.all().is_empty());
        assert_eq!(registry.node_count(), 0);
        assert!(!registry.is_tracked(&a));
    }

    #[test]
    fn handles_from_before_reset_still_walk_downward() {
        let registry = Registry::new();
        let a = unit("A");
        let b = unit("B");
        let c = unit("C");

        registry.record_edge(&a, &b);
        registry.record_edge(&b, &c);
        let root = registry.ensure_node(&a);

        registry.reset();

        assert_eq!(root.render(0), "* A\n  * B\n    * C\n");
    }

    #[test]
    fn global_returns_one_instance() {
        let first: *const Registry = Registry::global();
        let second: *const Registry = Registry::global();
        assert_eq!(first, second);
    }

    #[test]
    fn concurrent_identical_edges_collapse_to_one() {
        let registry = Arc::new(Registry::new());
        let parent = unit("Parent");
        let child = unit("Child");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let parent = parent.clone();
                let child = child.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        registry.record_edge(&parent, &child);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let pnode = registry.ensure_node(&parent);
        let cnode = registry.ensure_node(&child);
        assert_eq!(pnode.children().len(), 1);
        assert_eq!(cnode.parents().len(), 1);
        assert_eq!(registry.node_count(), 2);
    }

    #[test]
    fn concurrent_distinct_edges_all_land() {
        let registry = Arc::new(Registry::new());
        let root = unit("Root");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let root = root.clone();
                thread::spawn(move || {
                    let leaf = Unit::named(format!("Leaf{}", i));
                    registry.record_edge(&root, &leaf);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let rnode = registry.ensure_node(&root);
        assert_eq!(rnode.children().len(), 8);
        assert_eq!(registry.node_count(), 9);
    }
}
