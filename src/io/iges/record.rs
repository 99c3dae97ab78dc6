//! Fixed-width 80-column IGES records

use crate::error::{IgesError, Result};
use std::fmt;

/// Total width of every record
pub const RECORD_WIDTH: usize = 80;

/// Data columns (1-72) of every record
pub const DATA_WIDTH: usize = 72;

/// Data columns (1-64) of a Parameter Data record; 65-72 hold the DE back pointer
pub const PARAMETER_DATA_WIDTH: usize = 64;

/// Largest sequence number that fits in columns 74-80
pub const MAX_SEQUENCE: i32 = 9_999_999;

/// The five sections of an ASCII IGES file, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Start,
    Global,
    Directory,
    Parameter,
    Terminate,
}

impl Section {
    /// Letter written in column 73
    pub fn letter(&self) -> char {
        match self {
            Section::Start => 'S',
            Section::Global => 'G',
            Section::Directory => 'D',
            Section::Parameter => 'P',
            Section::Terminate => 'T',
        }
    }

    /// Parse the column 73 letter
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'S' => Some(Section::Start),
            'G' => Some(Section::Global),
            'D' => Some(Section::Directory),
            'P' => Some(Section::Parameter),
            'T' => Some(Section::Terminate),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Start => "Start",
            Section::Global => "Global",
            Section::Directory => "Directory Entry",
            Section::Parameter => "Parameter Data",
            Section::Terminate => "Terminate",
        };
        f.write_str(name)
    }
}

/// One 80-column line
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Section the record belongs to
    pub section: Section,
    /// 1-based position within the section
    pub sequence: i32,
    /// Columns 1-72, space padded
    pub data: String,
}

impl Record {
    /// Create a record; `data` is padded to 72 columns when written
    pub fn new(section: Section, sequence: i32, data: impl Into<String>) -> Self {
        Self {
            section,
            sequence,
            data: data.into(),
        }
    }

    /// Parse a single line (without its line terminator)
    ///
    /// `line_number` is the 1-based position in the file, used for errors.
    pub fn parse(line: &str, line_number: usize) -> Result<Self> {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() != RECORD_WIDTH {
            return Err(IgesError::MalformedRecord {
                line: line_number,
                reason: format!("expected {} columns, found {}", RECORD_WIDTH, chars.len()),
            });
        }

        let letter = chars[DATA_WIDTH];
        let section = match Section::from_letter(letter) {
            Some(section) => section,
            None if letter == 'C' || letter == 'B' => {
                return Err(IgesError::UnsupportedFormat(format!(
                    "section letter '{}' (compressed or binary IGES) at line {}",
                    letter, line_number
                )));
            }
            None => {
                return Err(IgesError::MalformedRecord {
                    line: line_number,
                    reason: format!("unknown section letter '{}'", letter),
                });
            }
        };

        let sequence_text: String = chars[DATA_WIDTH + 1..].iter().collect();
        let sequence = sequence_text
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| IgesError::MalformedRecord {
                line: line_number,
                reason: format!("bad sequence number '{}'", sequence_text),
            })?;

        Ok(Self {
            section,
            sequence,
            data: chars[..DATA_WIDTH].iter().collect(),
        })
    }

    /// Get one of the nine 8-column Directory Entry fields (0-based)
    ///
    /// Columns count characters, so decoded non-ASCII text keeps its place.
    pub fn field(&self, index: usize) -> String {
        self.data.chars().skip(index * 8).take(8).collect()
    }

    /// Render the full 80-column line
    pub fn to_line(&self) -> Result<String> {
        if self.data.chars().count() > DATA_WIDTH {
            return Err(IgesError::Format(format!(
                "{} record {} carries more than {} data columns",
                self.section, self.sequence, DATA_WIDTH
            )));
        }
        if self.sequence < 1 || self.sequence > MAX_SEQUENCE {
            return Err(IgesError::Format(format!(
                "{} sequence number {} out of range",
                self.section, self.sequence
            )));
        }
        Ok(format!(
            "{:<width$}{}{:>7}",
            self.data,
            self.section.letter(),
            self.sequence,
            width = DATA_WIDTH
        ))
    }
}
