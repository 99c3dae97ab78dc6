//! Error types for igesrust library

use crate::entities::PointerRole;
use crate::types::Handle;
use std::io;
use thiserror::Error;

/// Main error type for igesrust operations
#[derive(Debug, Error)]
pub enum IgesError {
    /// IO error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A line is not a well-formed 80-column record
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Sections are missing, out of order, or badly numbered
    #[error("Section error: {0}")]
    Section(String),

    /// The form number is not accepted by the entity type
    #[error("Invalid form {form} for entity type {entity_type} (DE {sequence})")]
    InvalidForm {
        entity_type: i32,
        form: i32,
        sequence: i32,
    },

    /// The factory has no variant for this entity type
    #[error("Unsupported entity type: {0}")]
    UnsupportedEntityType(i32),

    /// A pointer references a sequence number absent from the entity table
    #[error("Dangling {role} pointer to DE {target} in entity DE {sequence}")]
    DanglingPointer {
        sequence: i32,
        role: PointerRole,
        target: i32,
    },

    /// A pointer role is not allowed for this entity, or targets the wrong type
    #[error("Illegal {role} association on entity DE {sequence}: {reason}")]
    IllegalAssociation {
        sequence: i32,
        role: PointerRole,
        reason: String,
    },

    /// Error decoding a Parameter Data or Global field
    #[error("Parse error: {0}")]
    Parse(String),

    /// A parent holds an edge the child has no record of
    #[error("Reference underflow: {child} has no reference from {parent}")]
    ReferenceUnderflow { parent: Handle, child: Handle },

    /// Handle does not name a live entity
    #[error("Entity not found: handle {0}")]
    EntityNotFound(Handle),

    /// Entity failed an earlier protocol step and can no longer be used
    #[error("Entity {0} is invalid")]
    InvalidEntity(Handle),

    /// Deletion refused because other entities still point here
    #[error("Entity {handle} is still referenced by {count} parent(s)")]
    EntityReferenced { handle: Handle, count: usize },

    /// The transform chain loops back on itself
    #[error("Transform chain starting at {0} contains a cycle")]
    TransformCycle(Handle),

    /// Error encoding a field or record
    #[error("Format error: {0}")]
    Format(String),

    /// File uses a variant of the format this library does not read
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

/// Result type alias for igesrust operations
pub type Result<T> = std::result::Result<T, IgesError>;

impl From<String> for IgesError {
    fn from(s: String) -> Self {
        IgesError::Custom(s)
    }
}

impl From<&str> for IgesError {
    fn from(s: &str) -> Self {
        IgesError::Custom(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IgesError::InvalidForm {
            entity_type: 110,
            form: 7,
            sequence: 13,
        };
        assert_eq!(
            err.to_string(),
            "Invalid form 7 for entity type 110 (DE 13)"
        );
    }

    #[test]
    fn test_dangling_pointer_names_role() {
        let err = IgesError::DanglingPointer {
            sequence: 3,
            role: PointerRole::Transform,
            target: 9999999,
        };
        let text = err.to_string();
        assert!(text.contains("transform"));
        assert!(text.contains("9999999"));
        assert!(text.contains("DE 3"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let iges_err: IgesError = io_err.into();
        assert!(matches!(iges_err, IgesError::Io(_)));
    }
}
