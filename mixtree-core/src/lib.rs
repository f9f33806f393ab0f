//! Mixtree Core
//!
//! This crate provides the core runtime for Mixtree, a tracker for mixin
//! composition. It implements:
//!
//! - Identity handles for composable behavior units
//! - A thread-safe registry of "unit A was composed into unit B" edges
//! - A cycle-tolerant forest renderer and structured tree export
//!
//! The mechanism that detects composition events is not part of this
//! crate: whatever layer owns that (an explicit registration call,
//! instrumentation, a framework hook) reports events through
//! [`notify_watched`] and [`notify_composition`], and reads the resulting
//! graph back through [`roots`], [`all_nodes`] and [`render`].
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `unit`: identity handles with by-identity equality and hashing
//! - `graph`: the node store, registry locking discipline, and renderer
//!
//! # Example
//!
//! ```rust
//! use mixtree_core::unit::Unit;
//!
//! let app = Unit::named("App");
//! let logging = Unit::named("Logging");
//!
//! // The composition layer reports events as they happen.
//! mixtree_core::notify_watched(&logging);
//! mixtree_core::notify_composition(&app, &logging);
//!
//! assert_eq!(mixtree_core::render(), "* App\n  * Logging\n");
//! ```

pub mod graph;
pub mod unit;

use std::sync::Arc;

use tracing::trace;

use crate::graph::{Node, Registry};
use crate::unit::Unit;

/// Crate version, as recorded in the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// All parentless nodes in the process-wide registry.
pub fn roots() -> Vec<Arc<Node>> {
    Registry::global().roots()
}

/// Every node in the process-wide registry.
pub fn all_nodes() -> Vec<Arc<Node>> {
    Registry::global().all()
}

/// Render the forest of all roots as indented text.
///
/// Each root is rendered with a fresh path set, so a unit reachable from
/// several roots appears under each of them. Returns an empty string when
/// there are no roots.
pub fn render() -> String {
    roots().iter().map(|r| r.render(0)).collect()
}

/// Discard all tracked nodes from the process-wide registry.
pub fn reset() {
    Registry::global().reset();
}

/// Report that a unit has opted into tracking.
pub fn notify_watched(unit: &Unit) {
    Registry::global().mark_tracked(unit);
}

/// Report that `child` was composed into `parent`.
///
/// The event is recorded only when `child` is currently watched; whether
/// `parent` is watched does not matter, and it is created on first
/// reference. Events for unwatched children are dropped without touching
/// the registry; the filtering lives at this boundary, never inside
/// [`Registry::record_edge`].
pub fn notify_composition(parent: &Unit, child: &Unit) {
    let registry = Registry::global();
    if registry.is_tracked(child) {
        registry.record_edge(parent, child);
    } else {
        trace!(
            "ignoring composition {} -> {}: child is not watched",
            parent,
            child
        );
    }
}
