//! Null entity (type 0)

use super::{Entity, EntityCommon, FormatContext};
use crate::error::Result;
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};

/// An entity with no data
///
/// Also stands in for entity types this crate does not model. Their
/// Parameter Data fields are kept as raw tokens and written back under the
/// declared type number. Pointers inside those fields are not resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NullEntity {
    /// Common entity data
    pub common: EntityCommon,
    /// Type number found in the Directory Entry
    pub declared_type: i32,
    /// Unparsed Parameter Data fields of a placeholder
    pub raw_parameters: Vec<String>,
}

impl NullEntity {
    pub fn new() -> Self {
        NullEntity {
            common: EntityCommon::new(),
            declared_type: 0,
            raw_parameters: Vec::new(),
        }
    }

    /// Placeholder for an entity read as `declared_type`
    pub fn placeholder(declared_type: i32) -> Self {
        NullEntity {
            declared_type,
            ..Self::new()
        }
    }

    /// Whether this entity stands in for an unmodelled type
    pub fn is_placeholder(&self) -> bool {
        self.declared_type != 0
    }
}

impl Default for NullEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for NullEntity {
    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn type_number(&self) -> i32 {
        self.declared_type
    }

    fn type_name(&self) -> &'static str {
        if self.is_placeholder() {
            "Unsupported"
        } else {
            "Null"
        }
    }

    fn accepts_form(&self, _form: i32) -> bool {
        true
    }

    fn read_parameters(&mut self, reader: &mut ParameterReader) -> Result<()> {
        if !self.is_placeholder() {
            reader.skip_to_end();
            return Ok(());
        }
        self.raw_parameters.clear();
        while !reader.is_end_of_record() {
            let field = reader.read_raw_field("unsupported entity field")?;
            self.raw_parameters.push(field);
        }
        Ok(())
    }

    fn write_parameters(&self, packer: &mut RecordPacker, _ctx: &FormatContext<'_>) -> Result<()> {
        for field in &self.raw_parameters {
            packer.push_verbatim(field);
        }
        Ok(())
    }

    fn rescale(&mut self, _factor: f64) {}
}
