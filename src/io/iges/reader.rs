//! IGES file reader
//!
//! Loading runs in two phases. The first scans the five sections, builds
//! every entity from its Directory Entry and parses its Parameter Data,
//! leaving pointers as raw sequence numbers. The second resolves those
//! numbers into handles. Any failure aborts the load and no partial
//! document is returned.

use super::directory::DirectoryEntry;
use super::record::{Record, Section, DATA_WIDTH, PARAMETER_DATA_WIDTH};
use crate::association::associate_all;
use crate::document::IgesDocument;
use crate::entities::EntityType;
use crate::error::{IgesError, Result};
use crate::global::{GlobalData, Unit};
use crate::notification::NotificationType;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Configuration for the IGES reader.
#[derive(Debug, Clone, Default)]
pub struct IgesReaderConfiguration {
    /// Convert the model to this unit while reading.
    ///
    /// Default: `None` (keep the file's unit).
    pub target_units: Option<Unit>,
}

/// Records of one file, split by section
#[derive(Debug, Default)]
struct SectionRecords {
    start: Vec<Record>,
    global: Vec<Record>,
    directory: Vec<Record>,
    parameter: Vec<Record>,
    terminate: Vec<Record>,
}

/// IGES file reader
pub struct IgesReader {
    text: String,
    config: IgesReaderConfiguration,
}

impl IgesReader {
    /// Create a new IGES reader from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        BufReader::new(reader).read_to_end(&mut bytes)?;
        Ok(Self {
            text: decode(bytes),
            config: IgesReaderConfiguration::default(),
        })
    }

    /// Create a new IGES reader from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    /// Set the reader configuration.
    pub fn with_configuration(mut self, config: IgesReaderConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Read the file and return an associated IgesDocument
    pub fn read(self) -> Result<IgesDocument> {
        let sections = self.split_sections()?;
        tracing::debug!(
            start = sections.start.len(),
            global = sections.global.len(),
            directory = sections.directory.len(),
            parameter = sections.parameter.len(),
            "sections scanned"
        );

        let mut document = IgesDocument::new();
        document.start_section = sections
            .start
            .iter()
            .map(|record| record.data.trim_end().to_string())
            .collect();

        let global_text: String = sections.global.iter().map(|r| r.data.as_str()).collect();
        let mut global = GlobalData::parse(&global_text)?;
        let target = self.config.target_units.filter(|unit| *unit != global.unit);
        if let Some(unit) = target {
            global.convert = true;
            global.conversion_factor = global.unit.conversion_factor(unit);
            tracing::debug!(from = %global.unit, to = %unit, "converting units on read");
        }

        read_entities(&mut document, &sections, &global)?;

        if let Some(unit) = target {
            let factor = global.conversion_factor;
            global.unit = unit;
            global.unit_name = unit.name().to_string();
            global.min_resolution *= factor;
            global.max_coordinate *= factor;
            global.max_line_width *= factor;
        }
        global.convert = false;
        global.conversion_factor = 1.0;
        document.global = global;

        associate_all(&mut document)?;
        check_terminate(&mut document, &sections)?;

        tracing::info!(
            entities = document.entity_count(),
            notifications = document.notifications.len(),
            "IGES file read"
        );
        Ok(document)
    }

    /// Parse every line and group the records by section
    ///
    /// Sections must appear in S, G, D, P, T order and each must number its
    /// records 1, 2, 3, ...
    fn split_sections(&self) -> Result<SectionRecords> {
        let mut sections = SectionRecords::default();
        let mut current: Option<Section> = None;

        for (index, line) in self.text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let line_number = index + 1;
            let record = Record::parse(line, line_number)?;

            if let Some(previous) = current {
                if record.section < previous {
                    return Err(IgesError::Section(format!(
                        "{} record at line {} follows the {} section",
                        record.section, line_number, previous
                    )));
                }
            }
            current = Some(record.section);

            let bucket = match record.section {
                Section::Start => &mut sections.start,
                Section::Global => &mut sections.global,
                Section::Directory => &mut sections.directory,
                Section::Parameter => &mut sections.parameter,
                Section::Terminate => &mut sections.terminate,
            };
            let expected = bucket.len() as i32 + 1;
            if record.sequence != expected {
                return Err(IgesError::MalformedRecord {
                    line: line_number,
                    reason: format!(
                        "{} sequence number {} where {} was expected",
                        record.section, record.sequence, expected
                    ),
                });
            }
            bucket.push(record);
        }

        if sections.global.is_empty() {
            return Err(IgesError::Section("missing Global section".to_string()));
        }
        if sections.terminate.len() != 1 {
            return Err(IgesError::Section(format!(
                "expected one Terminate record, found {}",
                sections.terminate.len()
            )));
        }
        if sections.directory.len() % 2 != 0 {
            return Err(IgesError::Section(
                "Directory Entry section has an odd number of records".to_string(),
            ));
        }
        Ok(sections)
    }
}

/// Decode file bytes, falling back to Windows-1252 for non-UTF-8 input
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            decoded.into_owned()
        }
    }
}

/// Phase one: build every entity and parse its Parameter Data
fn read_entities(document: &mut IgesDocument, sections: &SectionRecords, global: &GlobalData) -> Result<()> {
    let mut unsupported = 0usize;

    for pair in sections.directory.chunks_exact(2) {
        let de = DirectoryEntry::parse(&pair[0], &pair[1])?;
        let mut entity = EntityType::from_directory(&de)?;

        if !EntityType::is_supported(de.entity_type) {
            unsupported += 1;
            document.notifications.notify_entity(
                NotificationType::NotSupported,
                de.sequence,
                format!("entity type {} is kept as unparsed Parameter Data", de.entity_type),
            );
        }

        let data = parameter_text(&de, &sections.parameter)?;
        entity.read_parameters(&data, global)?;
        document.insert_loaded(entity);
    }

    tracing::debug!(
        entities = document.entity_count(),
        unsupported,
        "directory and parameter data read"
    );
    Ok(())
}

/// Concatenate the 64 data columns of an entity's Parameter Data lines
fn parameter_text(de: &DirectoryEntry, parameter: &[Record]) -> Result<String> {
    let first = de.parameter_data;
    let count = de.parameter_line_count;
    if first < 1 || count < 1 {
        return Err(IgesError::Parse(format!(
            "DE {}: parameter data pointer {} with {} lines",
            de.sequence, first, count
        )));
    }

    let start = (first - 1) as usize;
    let end = start + count as usize;
    let lines = parameter.get(start..end).ok_or_else(|| {
        IgesError::Parse(format!(
            "DE {}: parameter lines {}..{} lie outside the Parameter Data section",
            de.sequence,
            first,
            first + count - 1
        ))
    })?;

    let mut text = String::with_capacity(lines.len() * PARAMETER_DATA_WIDTH);
    for record in lines {
        let chars: Vec<char> = record.data.chars().collect();
        let back_pointer: String = chars[PARAMETER_DATA_WIDTH..DATA_WIDTH].iter().collect();
        if back_pointer.trim().parse::<i32>().ok() != Some(de.sequence) {
            return Err(IgesError::Parse(format!(
                "P {}: back pointer '{}' does not match DE {}",
                record.sequence,
                back_pointer.trim(),
                de.sequence
            )));
        }
        text.extend(&chars[..PARAMETER_DATA_WIDTH]);
    }
    Ok(text)
}

/// Compare the Terminate record counts with the sections actually read
fn check_terminate(document: &mut IgesDocument, sections: &SectionRecords) -> Result<()> {
    let Some(record) = sections.terminate.first() else {
        return Ok(());
    };
    let actual = [
        ('S', sections.start.len()),
        ('G', sections.global.len()),
        ('D', sections.directory.len()),
        ('P', sections.parameter.len()),
    ];

    for (index, (letter, count)) in actual.into_iter().enumerate() {
        let field = record.field(index);
        let declared = field
            .strip_prefix(letter)
            .and_then(|digits| digits.trim().parse::<usize>().ok());
        if declared != Some(count) {
            tracing::warn!(section = %letter, field = %field, count, "Terminate record disagrees with file");
            document.notifications.notify(
                NotificationType::Warning,
                format!(
                    "Terminate record declares '{}' but the file has {} {} records",
                    field.trim(),
                    count,
                    letter
                ),
            );
        }
    }
    Ok(())
}
