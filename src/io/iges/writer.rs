//! IGES file writer

use super::record::{Record, Section, DATA_WIDTH};
use crate::document::IgesDocument;
use crate::entities::{EntityState, EntityType, FormatContext};
use crate::error::{IgesError, Result};
use crate::global::timestamp_now;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// IGES file writer
///
/// Writing renumbers the Directory Entries 1, 3, 5, ... in table order and
/// serializes every pointer as its target's new sequence number. The whole
/// file is built in memory first, so a failing entity leaves the
/// destination untouched.
pub struct IgesWriter<'a> {
    document: &'a mut IgesDocument,
}

impl<'a> IgesWriter<'a> {
    /// Create a new writer for a document
    pub fn new(document: &'a mut IgesDocument) -> Self {
        Self { document }
    }

    /// Write to a file
    pub fn write_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let records = self.build()?;
        let file = File::create(path)?;
        emit(&records, BufWriter::new(file))
    }

    /// Write to any writer
    pub fn write_to_writer<W: Write>(&mut self, writer: W) -> Result<()> {
        let records = self.build()?;
        emit(&records, BufWriter::new(writer))
    }

    /// Write to a byte vector (useful for testing)
    pub fn write_to_vec(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to_writer(&mut buffer)?;
        Ok(buffer)
    }

    /// Get a reference to the document
    pub fn document(&self) -> &IgesDocument {
        self.document
    }

    /// Produce every record of the file in order
    fn build(&mut self) -> Result<Vec<Record>> {
        let doc = &mut *self.document;
        if let Some((handle, _)) = doc
            .entities()
            .find(|(_, entity)| entity.state() == EntityState::Invalid)
        {
            return Err(IgesError::InvalidEntity(handle));
        }

        doc.global.file_timestamp = timestamp_now();
        let moved = doc
            .entities
            .values()
            .enumerate()
            .any(|(index, entity)| entity.common().sequence != 2 * index as i32 + 1);
        let placeholders = doc
            .entities
            .values()
            .filter(|entity| matches!(entity, EntityType::Null(e) if e.is_placeholder()))
            .count();
        if moved && placeholders > 0 {
            tracing::warn!(
                placeholders,
                "entities were renumbered; pointers inside unsupported entities keep their old sequence numbers"
            );
        }
        let sequences = doc.renumber();
        let ctx = FormatContext {
            global: &doc.global,
            sequences: &sequences,
        };

        let mut directory = Vec::with_capacity(doc.entities.len() * 2);
        let mut parameter = Vec::new();
        let mut pd_sequence = 1;
        for entity in doc.entities.values_mut() {
            let first = pd_sequence;
            parameter.extend(entity.format(&ctx, &mut pd_sequence)?);

            let records = entity
                .common()
                .directory_entry(entity.type_number(), first, &ctx)
                .and_then(|de| de.to_records());
            match records {
                Ok(records) => directory.extend(records),
                Err(e) => {
                    entity.common_mut().set_state(EntityState::Invalid);
                    return Err(e);
                }
            }
        }
        tracing::debug!(
            directory = directory.len(),
            parameter = parameter.len(),
            "entities formatted"
        );

        let start = start_records(&doc.start_section);
        let global = doc.global.to_records()?;
        let terminate = Record::new(
            Section::Terminate,
            1,
            format!(
                "S{:07}G{:07}D{:07}P{:07}",
                start.len(),
                global.len(),
                directory.len(),
                parameter.len()
            ),
        );

        tracing::info!(
            entities = doc.entities.len(),
            lines = start.len() + global.len() + directory.len() + parameter.len() + 1,
            "IGES file written"
        );

        let mut records = start;
        records.extend(global);
        records.extend(directory);
        records.extend(parameter);
        records.push(terminate);
        Ok(records)
    }
}

/// Start section records; long lines wrap at 72 columns
fn start_records(lines: &[String]) -> Vec<Record> {
    let mut data: Vec<String> = Vec::new();
    for line in lines {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            data.push(String::new());
        }
        for chunk in chars.chunks(DATA_WIDTH) {
            data.push(chunk.iter().collect());
        }
    }
    if data.is_empty() {
        data.push(concat!("Written by igesrust ", env!("CARGO_PKG_VERSION")).to_string());
    }

    data.into_iter()
        .enumerate()
        .map(|(i, text)| Record::new(Section::Start, i as i32 + 1, text))
        .collect()
}

fn emit<W: Write>(records: &[Record], mut writer: W) -> Result<()> {
    for record in records {
        writer.write_all(record.to_line()?.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
