//! Pointer fields between entities

use crate::types::Handle;
use std::fmt;

/// A pointer from one entity to another
///
/// While a file is being scanned, pointers hold the raw Directory Entry
/// sequence number of their target (`Pending`). The association pass turns
/// them into document handles (`Bound`). Entities created through the API
/// only ever hold bound links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link {
    /// Raw DE sequence number read from the file
    Pending(i32),
    /// Resolved target
    Bound(Handle),
}

impl Link {
    /// Target handle, if resolved
    pub fn handle(&self) -> Option<Handle> {
        match self {
            Link::Bound(handle) => Some(*handle),
            Link::Pending(_) => None,
        }
    }

    /// Whether the link points at `handle`
    pub fn targets(&self, handle: Handle) -> bool {
        matches!(self, Link::Bound(h) if *h == handle)
    }

    /// Link for a non-zero raw pointer, `None` for a null pointer
    pub fn from_raw(sequence: i32) -> Option<Link> {
        if sequence == 0 {
            None
        } else {
            Some(Link::Pending(sequence.abs()))
        }
    }
}

impl From<Handle> for Link {
    fn from(handle: Handle) -> Self {
        Link::Bound(handle)
    }
}

/// A Directory Entry field holding either a plain value or a negated pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueOrEntity<T> {
    Value(T),
    Entity(Link),
}

impl<T: Default> Default for ValueOrEntity<T> {
    fn default() -> Self {
        ValueOrEntity::Value(T::default())
    }
}

impl<T> ValueOrEntity<T> {
    /// The pointer, if this field holds one
    pub fn link(&self) -> Option<Link> {
        match self {
            ValueOrEntity::Entity(link) => Some(*link),
            ValueOrEntity::Value(_) => None,
        }
    }
}

/// The role a pointer plays in its parent entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerRole {
    Structure,
    LineFont,
    Level,
    View,
    Transform,
    LabelDisplay,
    Color,
    /// Back pointer to an associativity instance (first extras group)
    Associativity(usize),
    /// Pointer to a property entity (second extras group)
    Property(usize),
    /// Type-specific Parameter Data pointer
    Parameter { name: &'static str, index: usize },
}

impl PointerRole {
    /// Whether the role lives in the Directory Entry
    pub fn is_directory_field(&self) -> bool {
        !matches!(
            self,
            PointerRole::Associativity(_) | PointerRole::Property(_) | PointerRole::Parameter { .. }
        )
    }
}

impl fmt::Display for PointerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerRole::Structure => f.write_str("structure"),
            PointerRole::LineFont => f.write_str("line font"),
            PointerRole::Level => f.write_str("level"),
            PointerRole::View => f.write_str("view"),
            PointerRole::Transform => f.write_str("transform"),
            PointerRole::LabelDisplay => f.write_str("label display"),
            PointerRole::Color => f.write_str("color"),
            PointerRole::Associativity(i) => write!(f, "associativity[{}]", i),
            PointerRole::Property(i) => write!(f, "property[{}]", i),
            PointerRole::Parameter { name, index } => write!(f, "{}[{}]", name, index),
        }
    }
}
