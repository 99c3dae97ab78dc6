//! # igesrust
//!
//! A pure Rust library for reading and writing IGES CAD interchange files.
//!
//! An IGES file is a sectioned, fixed-column text format: every entity has a
//! two-record Directory Entry and a free-format Parameter Data block, and
//! entities point at each other by Directory Entry sequence number. This
//! crate loads such a file into an [`IgesDocument`] whose pointers are typed
//! [`Handle`]s, keeps reference counts consistent across edits and
//! deletions, and writes the model back out.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use igesrust::{IgesDocument, IgesReader, IgesWriter};
//!
//! // Read an IGES file
//! let mut doc = IgesReader::from_file("part.igs")?.read()?;
//!
//! // Access entities
//! for (handle, entity) in doc.entities() {
//!     println!("{}: {}", handle, entity.as_entity().type_name());
//! }
//!
//! // Write it back
//! IgesWriter::new(&mut doc).write_to_file("copy.igs")?;
//! # Ok::<(), igesrust::IgesError>(())
//! ```
//!
//! ## Architecture
//!
//! - `EntityType` - closed set of entity variants, built by a `(type, form)` factory
//! - `Entity` - trait every variant implements (parameter codec, pointers, rescaling)
//! - `IgesDocument` - entity table, Global data and the graph operations
//! - `IgesReader` / `IgesWriter` - two-phase load and renumbering store

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod association;
pub mod document;
pub mod entities;
pub mod error;
pub mod global;
pub mod io;
pub mod notification;
pub mod types;

// Re-export commonly used types
pub use error::{IgesError, Result};
pub use types::{ColorNumber, Handle, Matrix3, Transform, Vector3};

// Re-export entity types
pub use entities::{
    ColorDefinition, CompositeCurve, Curve, Entity, EntityState, EntityType, Line, Link,
    NullEntity, Point, PointerRole, SubfigureDefinition, SubfigureInstance, TransformationMatrix,
};

// Re-export document
pub use document::IgesDocument;
pub use global::{GlobalData, Unit};
pub use notification::{Notification, NotificationCollection, NotificationType};

// Re-export I/O types
pub use io::iges::{IgesReader, IgesReaderConfiguration, IgesWriter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
