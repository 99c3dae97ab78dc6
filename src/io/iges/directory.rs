//! Directory Entry record pairs

use super::record::{Record, Section};
use crate::entities::StatusNumber;
use crate::error::{IgesError, Result};

/// Width of one Directory Entry field
pub const FIELD_WIDTH: usize = 8;

/// The raw fields of one Directory Entry
///
/// Pointer fields keep the sign they have in the file: structure, line font,
/// level and color are negative when they point at another entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectoryEntry {
    pub entity_type: i32,
    /// Sequence number of the first Parameter Data record
    pub parameter_data: i32,
    pub structure: i32,
    pub line_font: i32,
    pub level: i32,
    pub view: i32,
    pub transform: i32,
    pub label_display: i32,
    pub status: StatusNumber,
    pub line_weight: i32,
    pub color: i32,
    pub parameter_line_count: i32,
    pub form: i32,
    pub label: String,
    pub subscript: i32,
    /// Sequence number of the first of the two records
    pub sequence: i32,
}

impl DirectoryEntry {
    /// Decode a record pair
    pub fn parse(first: &Record, second: &Record) -> Result<Self> {
        let sequence = first.sequence;
        if sequence % 2 == 0 || second.sequence != sequence + 1 {
            return Err(IgesError::Parse(format!(
                "DE {}: Directory Entry records out of step (second record {})",
                sequence, second.sequence
            )));
        }

        let int = |record: &Record, index: usize, name: &str| -> Result<i32> {
            let field = record.field(index);
            let text = field.trim();
            if text.is_empty() {
                return Ok(0);
            }
            text.parse::<i32>().map_err(|_| {
                IgesError::Parse(format!("DE {}: malformed {} field '{}'", sequence, name, text))
            })
        };

        let entity_type = int(first, 0, "entity type")?;
        let repeated_type = int(second, 0, "entity type")?;
        if repeated_type != entity_type {
            return Err(IgesError::Parse(format!(
                "DE {}: entity type {} does not match {} on the second record",
                sequence, entity_type, repeated_type
            )));
        }

        let status = StatusNumber::parse(&first.field(8))
            .map_err(|e| IgesError::Parse(format!("DE {}: {}", sequence, e)))?;

        Ok(Self {
            entity_type,
            parameter_data: int(first, 1, "parameter data pointer")?,
            structure: int(first, 2, "structure")?,
            line_font: int(first, 3, "line font pattern")?,
            level: int(first, 4, "level")?,
            view: int(first, 5, "view")?,
            transform: int(first, 6, "transformation matrix")?,
            label_display: int(first, 7, "label display")?,
            status,
            line_weight: int(second, 1, "line weight")?,
            color: int(second, 2, "color")?,
            parameter_line_count: int(second, 3, "parameter line count")?,
            form: int(second, 4, "form")?,
            label: second.field(7).trim().to_string(),
            subscript: int(second, 8, "subscript")?,
            sequence,
        })
    }

    /// Encode as the two fixed-width records
    pub fn to_records(&self) -> Result<[Record; 2]> {
        if self.label.chars().count() > FIELD_WIDTH {
            return Err(IgesError::Format(format!(
                "DE {}: label '{}' is longer than {} characters",
                self.sequence, self.label, FIELD_WIDTH
            )));
        }

        let ints = |values: &[i32]| -> Result<String> {
            let mut out = String::with_capacity(values.len() * FIELD_WIDTH);
            for value in values {
                let text = value.to_string();
                if text.len() > FIELD_WIDTH {
                    return Err(IgesError::Format(format!(
                        "DE {}: value {} does not fit in a Directory Entry field",
                        self.sequence, value
                    )));
                }
                out.push_str(&format!("{:>8}", text));
            }
            Ok(out)
        };

        let first = format!(
            "{}{}",
            ints(&[
                self.entity_type,
                self.parameter_data,
                self.structure,
                self.line_font,
                self.level,
                self.view,
                self.transform,
                self.label_display,
            ])?,
            self.status
        );
        let second = format!(
            "{}{:16}{:>8}{}",
            ints(&[
                self.entity_type,
                self.line_weight,
                self.color,
                self.parameter_line_count,
                self.form,
            ])?,
            "",
            self.label,
            ints(&[self.subscript])?
        );

        Ok([
            Record::new(Section::Directory, self.sequence, first),
            Record::new(Section::Directory, self.sequence + 1, second),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Subordinate;

    fn sample() -> DirectoryEntry {
        DirectoryEntry {
            entity_type: 110,
            parameter_data: 3,
            structure: 0,
            line_font: 1,
            level: -7,
            view: 0,
            transform: 5,
            label_display: 0,
            status: StatusNumber {
                subordinate: Subordinate::PhysicallyDependent,
                ..Default::default()
            },
            line_weight: 0,
            color: -9,
            parameter_line_count: 1,
            form: 1,
            label: "LINE".to_string(),
            subscript: 2,
            sequence: 11,
        }
    }

    #[test]
    fn test_record_layout() {
        let [first, second] = sample().to_records().unwrap();
        assert_eq!(first.sequence, 11);
        assert_eq!(second.sequence, 12);
        assert_eq!(first.field(0), "     110");
        assert_eq!(first.field(4), "      -7");
        assert_eq!(first.field(8), "00010000");
        assert_eq!(second.field(2), "      -9");
        assert_eq!(second.field(7), "    LINE");
        assert_eq!(second.field(8), "       2");
    }

    #[test]
    fn test_parse_written_pair() {
        let entry = sample();
        let [first, second] = entry.to_records().unwrap();
        let parsed = DirectoryEntry::parse(&first, &second).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_parse_rejects_mismatched_type() {
        let [first, _] = sample().to_records().unwrap();
        let other = DirectoryEntry {
            entity_type: 116,
            ..sample()
        };
        let [_, second] = other.to_records().unwrap();
        let err = DirectoryEntry::parse(&first, &second).unwrap_err();
        assert!(err.to_string().contains("DE 11"));
    }

    #[test]
    fn test_parse_rejects_garbage_field() {
        let [mut first, second] = sample().to_records().unwrap();
        first.data.replace_range(40..48, "   abc  ");
        assert!(DirectoryEntry::parse(&first, &second).is_err());
    }

    #[test]
    fn test_long_label_rejected() {
        let entry = DirectoryEntry {
            label: "TOO-LONG-LABEL".to_string(),
            ..sample()
        };
        assert!(entry.to_records().is_err());
    }
}
