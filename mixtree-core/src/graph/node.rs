//! Graph Nodes
//!
//! This module defines the node type that lives in the composition graph,
//! plus the structured tree export produced from it.
//!
//! # Adjacency
//!
//! A node keeps both directions of every edge: `children` are the units
//! composed into this unit's subtree, `parents` are the units this one was
//! composed into. Children are held strongly (`Arc`), parents weakly
//! (`Weak`); holding both strongly would turn every single edge into a
//! reference cycle that could never be freed. Within one registry epoch
//! all parent targets stay alive through the registry's own strong
//! references.
//!
//! Adjacency lives behind its own `RwLock` so that a caller walking nodes
//! returned from a registry snapshot stays sound even while a writer is
//! concurrently recording edges. Such a walk may observe edges added after
//! the snapshot was taken; see the registry docs.
//!
//! # Cycle Handling
//!
//! Traversals carry a set of unit ids for the current root-to-node path,
//! restored at every branch point, so the same unit reached through two
//! sibling branches is expanded under both. Only a path that re-enters
//! itself is truncated with a cycle marker.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::Serialize;
use smallvec::SmallVec;

use crate::unit::{Unit, UnitId};

/// A node in the composition graph: one tracked unit and its edges.
pub struct Node {
    /// The unit this node tracks.
    unit: Unit,

    /// Both adjacency lists, guarded together.
    links: RwLock<Links>,
}

#[derive(Default)]
struct Links {
    /// Units this unit was composed into. Weak to break edge cycles.
    parents: SmallVec<[Weak<Node>; 4]>,

    /// Units composed into this unit. Strong: a held root keeps its whole
    /// subtree walkable, including across a registry reset.
    children: SmallVec<[Arc<Node>; 4]>,
}

impl Node {
    /// Create a node for a unit, with no edges yet.
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            links: RwLock::new(Links::default()),
        }
    }

    /// The unit this node tracks.
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// A human-friendly label for the tracked unit.
    pub fn display_name(&self) -> String {
        self.unit.display_name()
    }

    /// Add a child edge to `child`.
    ///
    /// Idempotent: a child already present (by unit identity) is not added
    /// again.
    pub fn add_child(&self, child: &Arc<Node>) {
        let mut links = self.links.write();
        if links
            .children
            .iter()
            .any(|c| c.unit.id() == child.unit.id())
        {
            return;
        }
        links.children.push(Arc::clone(child));
    }

    /// Add a parent edge to `parent`. Idempotent, like [`Node::add_child`].
    pub fn add_parent(&self, parent: &Arc<Node>) {
        let mut links = self.links.write();
        if links
            .parents
            .iter()
            .filter_map(|p| p.upgrade())
            .any(|p| p.unit.id() == parent.unit.id())
        {
            return;
        }
        links.parents.push(Arc::downgrade(parent));
    }

    /// Whether this node has no parents.
    pub fn is_root(&self) -> bool {
        self.links.read().parents.is_empty()
    }

    /// Snapshot of this node's children, in insertion order.
    pub fn children(&self) -> Vec<Arc<Node>> {
        self.links.read().children.iter().cloned().collect()
    }

    /// Snapshot of this node's parents, in insertion order.
    ///
    /// Parents whose nodes are no longer alive (possible only for handles
    /// held across a registry reset) are skipped.
    pub fn parents(&self) -> Vec<Arc<Node>> {
        self.links
            .read()
            .parents
            .iter()
            .filter_map(|p| p.upgrade())
            .collect()
    }

    /// Render this node's subtree as indented text.
    ///
    /// One line per node: `"{2*indent spaces}* {name}\n"`. A unit revisited
    /// along the current path renders as `"* {name} (…cycle…)\n"` and
    /// recursion stops there.
    pub fn render(&self, indent: usize) -> String {
        let mut out = String::new();
        let mut path = HashSet::new();
        self.render_into(indent, &mut path, &mut out);
        out
    }

    fn render_into(&self, indent: usize, path: &mut HashSet<UnitId>, out: &mut String) {
        let pad = "  ".repeat(indent);
        if path.contains(&self.unit.id()) {
            out.push_str(&format!("{}* {} (…cycle…)\n", pad, self.display_name()));
            return;
        }
        out.push_str(&format!("{}* {}\n", pad, self.display_name()));

        path.insert(self.unit.id());
        for child in self.children() {
            child.render_into(indent + 1, path, out);
        }
        path.remove(&self.unit.id());
    }

    /// Export this node's subtree as a [`Tree`] record.
    ///
    /// At a cycle-truncation point the record carries no `children` at all,
    /// distinguishing it from an ordinary leaf (which has an empty list).
    pub fn to_tree(&self) -> Tree {
        let mut path = HashSet::new();
        self.tree_with_path(&mut path)
    }

    fn tree_with_path(&self, path: &mut HashSet<UnitId>) -> Tree {
        if path.contains(&self.unit.id()) {
            return Tree {
                name: self.display_name(),
                children: None,
            };
        }

        path.insert(self.unit.id());
        let children = self
            .children()
            .iter()
            .map(|c| c.tree_with_path(path))
            .collect();
        path.remove(&self.unit.id());

        Tree {
            name: self.display_name(),
            children: Some(children),
        }
    }
}

// Not derived: a derived impl would chase child references and recurse
// forever on cyclic graphs.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let links = self.links.read();
        f.debug_struct("Node")
            .field("unit", &self.unit)
            .field("parents", &links.parents.len())
            .field("children", &links.children.len())
            .finish()
    }
}

/// Structured export of a rendered subtree.
///
/// `children` is `None` exactly where a traversal was truncated because the
/// unit already appeared on the current path; serialization omits the field
/// there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tree {
    /// Display name of the node.
    pub name: String,

    /// Exported children, or `None` at a cycle-truncation point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Tree>>,
}
