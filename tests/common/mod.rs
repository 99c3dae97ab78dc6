//! Shared test utilities for igesrust integration tests.
//!
//! Read/write helpers and raw-file builders that all test crates import via
//! `mod common;`.

#![allow(dead_code)]

pub mod builders;

use igesrust::entities::EntityType;
use igesrust::io::iges::{IgesReader, IgesReaderConfiguration, IgesWriter};
use igesrust::{Handle, IgesDocument, Result, Unit};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ===========================================================================
// Path resolution
// ===========================================================================

/// Resolve path into the `test_output/` directory, creating it if needed.
pub fn test_output_path(filename: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_output");
    let _ = std::fs::create_dir_all(&dir);
    dir.join(filename)
}

// ===========================================================================
// Read / write helpers
// ===========================================================================

/// Read IGES text, propagating any load error.
pub fn read_text(text: &str) -> Result<IgesDocument> {
    IgesReader::from_reader(text.as_bytes())?.read()
}

/// Read IGES text converting to `unit`.
pub fn read_text_in(text: &str, unit: Unit) -> Result<IgesDocument> {
    let config = IgesReaderConfiguration {
        target_units: Some(unit),
    };
    IgesReader::from_reader(text.as_bytes())?
        .with_configuration(config)
        .read()
}

/// Write a document to a string.
pub fn write_text(doc: &mut IgesDocument) -> String {
    let bytes = IgesWriter::new(doc)
        .write_to_vec()
        .unwrap_or_else(|e| panic!("Failed to write document: {e:?}"));
    String::from_utf8(bytes).expect("IGES output is ASCII")
}

/// Write a document and read the output back.
pub fn roundtrip(doc: &mut IgesDocument) -> IgesDocument {
    let text = write_text(doc);
    read_text(&text).unwrap_or_else(|e| panic!("Failed to read written document: {e:?}\n{text}"))
}

/// Lines of one section (identified by its column 73 letter).
pub fn section_lines(text: &str, letter: char) -> Vec<String> {
    text.lines()
        .filter(|line| line.chars().nth(72) == Some(letter))
        .map(str::to_string)
        .collect()
}

// ===========================================================================
// Entity helpers
// ===========================================================================

/// Count entities grouped by declared type number.
pub fn count_by_type(doc: &IgesDocument) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for (_, entity) in doc.entities() {
        *counts.entry(entity.declared_type()).or_insert(0) += 1;
    }
    counts
}

/// Handles of every entity with the given declared type, in table order.
pub fn handles_of_type(doc: &IgesDocument, entity_type: i32) -> Vec<Handle> {
    doc.entities()
        .filter(|(_, entity)| entity.declared_type() == entity_type)
        .map(|(handle, _)| handle)
        .collect()
}

/// The single Line of a document.
pub fn only_line(doc: &IgesDocument) -> &igesrust::Line {
    let lines: Vec<&igesrust::Line> = doc
        .entities()
        .filter_map(|(_, entity)| match entity {
            EntityType::Line(line) => Some(line),
            _ => None,
        })
        .collect();
    assert_eq!(lines.len(), 1, "expected exactly one Line");
    lines[0]
}
