//! Unit Identity
//!
//! A "unit" is a composable piece of behavior that can be mixed into other
//! units. The tracker never looks inside a unit; it only needs a stable,
//! comparable handle for it. This module defines that handle.
//!
//! # Identity, Not Structure
//!
//! Two units are the same unit only if they were minted as the same handle.
//! Equality and hashing go through the unit's id, never its name: creating
//! two units with the same name yields two distinct units. This mirrors how
//! a language runtime distinguishes two modules that happen to share a
//! name.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a tracked unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(u64);

impl UnitId {
    /// Generate a new unique unit ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A handle denoting one composable unit.
///
/// Handles are cheap to clone (the name is shared) and can be passed freely
/// between threads. All clones of a handle denote the same unit.
///
/// # Example
///
/// ```rust
/// use mixtree_core::unit::Unit;
///
/// let walkable = Unit::named("Walkable");
/// let also_walkable = walkable.clone();
/// assert_eq!(walkable, also_walkable);
///
/// // Same name, different unit.
/// assert_ne!(walkable, Unit::named("Walkable"));
/// ```
#[derive(Debug, Clone)]
pub struct Unit {
    id: UnitId,
    name: Option<Arc<str>>,
}

impl Unit {
    /// Mint a new unit with a human-readable name.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: UnitId::new(),
            name: Some(name.into()),
        }
    }

    /// Mint a new unit without a name.
    ///
    /// Anonymous units display as `<unit N>` where `N` is the raw id.
    pub fn anonymous() -> Self {
        Self {
            id: UnitId::new(),
            name: None,
        }
    }

    /// Get the unit's unique ID.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Get the unit's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// A stable human-readable label for this unit.
    ///
    /// Falls back to `<unit N>` for anonymous units.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => format!("<unit {}>", self.id),
        }
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Unit {}

impl std::hash::Hash for Unit {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "<unit {}>", self.id),
        }
    }
}
