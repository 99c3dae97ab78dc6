//! Directory Entry status number (field 9)
//!
//! The status number packs four two-digit codes: blank status, subordinate
//! entity switch, entity use flag, and hierarchy.

use crate::error::{IgesError, Result};
use std::fmt;

/// Blank status (digits 1-2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlankStatus {
    #[default]
    Visible,
    Blanked,
}

/// Subordinate entity switch (digits 3-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Subordinate {
    #[default]
    Independent,
    PhysicallyDependent,
    LogicallyDependent,
    PhysicallyAndLogicallyDependent,
}

/// Entity use flag (digits 5-6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityUse {
    #[default]
    Geometry,
    Annotation,
    Definition,
    Other,
    LogicalPositional,
    Parametric2D,
    ConstructionGeometry,
}

/// Hierarchy (digits 7-8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Hierarchy {
    #[default]
    GlobalTopDown,
    GlobalDefer,
    UseHierarchyProperty,
}

/// The four status codes of a Directory Entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusNumber {
    pub blank: BlankStatus,
    pub subordinate: Subordinate,
    pub entity_use: EntityUse,
    pub hierarchy: Hierarchy,
}

impl StatusNumber {
    /// Parse the 8-column field; blank digits read as zero
    pub fn parse(field: &str) -> Result<Self> {
        let digits: String = field.chars().map(|c| if c == ' ' { '0' } else { c }).collect();
        let digits = format!("{:0>8}", digits.trim());
        if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(IgesError::Parse(format!("malformed status number '{}'", field)));
        }
        let code = |i: usize| digits[i..i + 2].parse::<u8>().unwrap_or(u8::MAX);
        let bad = |what: &str, value: u8| {
            IgesError::Parse(format!("invalid {} code {} in status '{}'", what, value, field))
        };

        let blank = match code(0) {
            0 => BlankStatus::Visible,
            1 => BlankStatus::Blanked,
            v => return Err(bad("blank status", v)),
        };
        let subordinate = match code(2) {
            0 => Subordinate::Independent,
            1 => Subordinate::PhysicallyDependent,
            2 => Subordinate::LogicallyDependent,
            3 => Subordinate::PhysicallyAndLogicallyDependent,
            v => return Err(bad("subordinate switch", v)),
        };
        let entity_use = match code(4) {
            0 => EntityUse::Geometry,
            1 => EntityUse::Annotation,
            2 => EntityUse::Definition,
            3 => EntityUse::Other,
            4 => EntityUse::LogicalPositional,
            5 => EntityUse::Parametric2D,
            6 => EntityUse::ConstructionGeometry,
            v => return Err(bad("entity use", v)),
        };
        let hierarchy = match code(6) {
            0 => Hierarchy::GlobalTopDown,
            1 => Hierarchy::GlobalDefer,
            2 => Hierarchy::UseHierarchyProperty,
            v => return Err(bad("hierarchy", v)),
        };

        Ok(Self {
            blank,
            subordinate,
            entity_use,
            hierarchy,
        })
    }

    /// Whether the subordinate switch is anything but independent
    pub fn is_dependent(&self) -> bool {
        self.subordinate != Subordinate::Independent
    }
}

impl fmt::Display for StatusNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}{:02}{:02}{:02}",
            self.blank as u8, self.subordinate as u8, self.entity_use as u8, self.hierarchy as u8
        )
    }
}
