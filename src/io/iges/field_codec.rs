//! Free-format field codec for Global and Parameter Data sections
//!
//! Fields are separated by the parameter delimiter and the list is closed
//! by the record delimiter. Strings use Hollerith notation (`5HHELLO`).
//! Empty fields select the default value where the format defines one.

use super::record::{Record, Section, MAX_SEQUENCE};
use crate::error::{IgesError, Result};

/// Largest precision tried before falling back to exponent notation
const MAX_FIXED_DIGITS: usize = 17;

/// Magnitude from which reals are always written in exponent notation
const EXPONENT_THRESHOLD: f64 = 1e15;

/// Format a real as the shortest decimal that reads back within `min_resolution`
pub fn format_real(value: f64, min_resolution: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(IgesError::Format(format!("cannot encode non-finite real {}", value)));
    }
    if value == 0.0 {
        return Ok("0.".to_string());
    }

    let tolerance = if min_resolution.is_finite() && min_resolution > 0.0 {
        min_resolution
    } else {
        0.0
    };

    if value.abs() < EXPONENT_THRESHOLD {
        for digits in 0..=MAX_FIXED_DIGITS {
            let text = format!("{:.*}", digits, value);
            let parsed = text.parse::<f64>().unwrap_or(f64::NAN);
            // a non-zero value never collapses to zero
            if parsed != 0.0 && (parsed - value).abs() <= tolerance {
                return Ok(trim_fixed(text));
            }
        }
    }

    // shortest round-trip representation
    Ok(format!("{:e}", value).to_uppercase())
}

fn trim_fixed(text: String) -> String {
    if !text.contains('.') {
        return format!("{}.", text);
    }
    let trimmed = text.trim_end_matches('0');
    if trimmed == "-0." {
        "0.".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Format a string in Hollerith notation; empty strings become an empty field
pub fn format_string(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("{}H{}", value.chars().count(), value)
    }
}

/// Parse a real token, accepting `D` as an exponent marker
pub fn parse_real_token(token: &str) -> Option<f64> {
    let normalized: String = token
        .trim()
        .chars()
        .map(|c| if c == 'D' || c == 'd' { 'E' } else { c })
        .collect();
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_hollerith(token: &str) -> bool {
    let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && matches!(token[digits..].chars().next(), Some('H') | Some('h'))
}

/// Cursor over a delimiter-separated parameter stream
#[derive(Debug)]
pub struct ParameterReader {
    data: Vec<char>,
    cursor: usize,
    pdelim: char,
    rdelim: char,
    end_of_record: bool,
    sequence: i32,
    line_width: usize,
}

impl ParameterReader {
    /// Create a reader over the concatenated data columns of a section
    pub fn new(data: &str, pdelim: char, rdelim: char) -> Self {
        Self {
            data: data.chars().collect(),
            cursor: 0,
            pdelim,
            rdelim,
            end_of_record: false,
            sequence: 0,
            line_width: 0,
        }
    }

    /// Attach the owning entity's DE sequence and the record data width
    ///
    /// The sequence is reported in errors; the width lets trailing comments be
    /// split back into the lines they were written on.
    pub fn with_context(mut self, sequence: i32, line_width: usize) -> Self {
        self.sequence = sequence;
        self.line_width = line_width;
        self
    }

    /// Whether the record delimiter has been consumed
    pub fn is_end_of_record(&self) -> bool {
        self.end_of_record
    }

    /// Current position in characters
    pub fn position(&self) -> usize {
        self.cursor
    }

    fn error(&self, message: String) -> IgesError {
        if self.sequence > 0 {
            IgesError::Parse(format!("DE {}: {}", self.sequence, message))
        } else {
            IgesError::Parse(message)
        }
    }

    fn is_delimiter(&self, c: char) -> bool {
        c == self.pdelim || c == self.rdelim
    }

    fn consume_delimiter(&mut self, what: &str) -> Result<()> {
        while self.cursor < self.data.len() && self.data[self.cursor] == ' ' {
            self.cursor += 1;
        }
        match self.data.get(self.cursor) {
            Some(&c) if c == self.pdelim => {
                self.cursor += 1;
                Ok(())
            }
            Some(&c) if c == self.rdelim => {
                self.cursor += 1;
                self.end_of_record = true;
                Ok(())
            }
            Some(&c) => Err(self.error(format!(
                "unexpected '{}' after {} at column {}",
                c, what, self.cursor
            ))),
            None => Err(self.error(format!("missing delimiter after {}", what))),
        }
    }

    /// Take the next raw token; `None` for an empty field
    fn next_token(&mut self, what: &str) -> Result<Option<String>> {
        if self.end_of_record {
            return Err(self.error(format!("parameter list ended before {}", what)));
        }
        let start = self.cursor;
        let end = self.data[start..]
            .iter()
            .position(|&c| self.is_delimiter(c))
            .map(|offset| start + offset)
            .ok_or_else(|| self.error(format!("data exhausted while reading {}", what)))?;

        if self.data[end] == self.rdelim {
            self.end_of_record = true;
        }
        self.cursor = end + 1;

        let token: String = self.data[start..end].iter().collect();
        let token = token.trim();
        Ok(if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        })
    }

    /// Read a required real
    pub fn read_real(&mut self, what: &str) -> Result<f64> {
        match self.next_token(what)? {
            Some(token) => parse_real_token(&token)
                .ok_or_else(|| self.error(format!("malformed real '{}' for {}", token, what))),
            None => Err(self.error(format!("missing required real {}", what))),
        }
    }

    /// Read a real, using `default` for an empty field or an ended list
    pub fn read_real_or(&mut self, what: &str, default: f64) -> Result<f64> {
        if self.end_of_record {
            return Ok(default);
        }
        match self.next_token(what)? {
            Some(token) => parse_real_token(&token)
                .ok_or_else(|| self.error(format!("malformed real '{}' for {}", token, what))),
            None => Ok(default),
        }
    }

    /// Read a required integer
    pub fn read_int(&mut self, what: &str) -> Result<i32> {
        match self.next_token(what)? {
            Some(token) => token
                .parse::<i32>()
                .map_err(|_| self.error(format!("malformed integer '{}' for {}", token, what))),
            None => Err(self.error(format!("missing required integer {}", what))),
        }
    }

    /// Read an integer, using `default` for an empty field or an ended list
    pub fn read_int_or(&mut self, what: &str, default: i32) -> Result<i32> {
        if self.end_of_record {
            return Ok(default);
        }
        match self.next_token(what)? {
            Some(token) => token
                .parse::<i32>()
                .map_err(|_| self.error(format!("malformed integer '{}' for {}", token, what))),
            None => Ok(default),
        }
    }

    /// Read a pointer field (a DE sequence number; 0 means null)
    pub fn read_pointer(&mut self, what: &str) -> Result<i32> {
        let value = self.read_int_or(what, 0)?;
        if value < 0 || value > MAX_SEQUENCE {
            return Err(self.error(format!("pointer {} for {} is out of range", value, what)));
        }
        Ok(value)
    }

    /// Read a Hollerith string; `None` for an empty field
    pub fn read_string(&mut self, what: &str) -> Result<Option<String>> {
        if self.end_of_record {
            return Err(self.error(format!("parameter list ended before {}", what)));
        }
        while self.cursor < self.data.len() && self.data[self.cursor] == ' ' {
            self.cursor += 1;
        }
        match self.data.get(self.cursor) {
            Some(&c) if self.is_delimiter(c) => {
                self.consume_delimiter(what)?;
                return Ok(None);
            }
            None => return Err(self.error(format!("data exhausted while reading {}", what))),
            _ => {}
        }

        let start = self.cursor;
        while self.cursor < self.data.len() && self.data[self.cursor].is_ascii_digit() {
            self.cursor += 1;
        }
        let count_text: String = self.data[start..self.cursor].iter().collect();
        if self.data.get(self.cursor) != Some(&'H') && self.data.get(self.cursor) != Some(&'h') {
            return Err(self.error(format!(
                "malformed Hollerith string for {} (count '{}')",
                what, count_text
            )));
        }
        let count = count_text
            .parse::<usize>()
            .map_err(|_| self.error(format!("missing Hollerith count for {}", what)))?;
        self.cursor += 1;

        let end = match self.cursor.checked_add(count) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                return Err(self.error(format!(
                    "Hollerith string for {} runs past the end of data",
                    what
                )))
            }
        };
        let value: String = self.data[self.cursor..end].iter().collect();
        self.cursor = end;
        self.consume_delimiter(what)?;
        Ok(Some(value))
    }

    /// Read the next field as text, keeping Hollerith strings in notation
    pub fn read_raw_field(&mut self, what: &str) -> Result<String> {
        if self.end_of_record {
            return Err(self.error(format!("parameter list ended before {}", what)));
        }
        let mut probe = self.cursor;
        while probe < self.data.len() && self.data[probe] == ' ' {
            probe += 1;
        }
        let digits = probe;
        while probe < self.data.len() && self.data[probe].is_ascii_digit() {
            probe += 1;
        }
        let hollerith = probe > digits && matches!(self.data.get(probe), Some('H') | Some('h'));
        if hollerith {
            let value = self.read_string(what)?;
            return Ok(value.map(|v| format_string(&v)).unwrap_or_default());
        }
        Ok(self.next_token(what)?.unwrap_or_default())
    }

    /// Read a Hollerith string, empty string for an empty field or an ended list
    pub fn read_string_or_empty(&mut self, what: &str) -> Result<String> {
        if self.end_of_record {
            return Ok(String::new());
        }
        Ok(self.read_string(what)?.unwrap_or_default())
    }

    /// Discard everything left in the stream, comments included
    pub fn skip_to_end(&mut self) {
        self.cursor = self.data.len();
        self.end_of_record = true;
    }

    /// Collect trailing comment text after the record delimiter
    ///
    /// Each physical line contributes one comment with trailing blanks
    /// removed; blank lines are dropped. Text sharing a line with the record
    /// delimiter is trimmed on both sides.
    pub fn read_comments(&mut self) -> Vec<String> {
        let mut comments = Vec::new();
        let mut position = self.cursor;
        let total = self.data.len();
        let mut shared_line = self.line_width > 0 && position % self.line_width != 0;

        while position < total {
            let line_end = if self.line_width > 0 {
                ((position / self.line_width) + 1) * self.line_width
            } else {
                total
            }
            .min(total);
            let text: String = self.data[position..line_end].iter().collect();
            let text = if shared_line { text.trim() } else { text.trim_end() };
            shared_line = false;
            if !text.is_empty() {
                comments.push(text.to_string());
            }
            position = line_end;
        }

        self.cursor = total;
        comments
    }
}

#[derive(Debug, Clone)]
struct Field {
    text: String,
    splittable: bool,
}

/// Packs formatted fields into fixed-width sequence-numbered records
#[derive(Debug)]
pub struct RecordPacker {
    section: Section,
    width: usize,
    back_pointer: Option<i32>,
    pdelim: char,
    rdelim: char,
    min_resolution: f64,
    fields: Vec<Field>,
    comments: Vec<String>,
}

impl RecordPacker {
    /// Create a packer for `section` with `width` data columns
    pub fn new(section: Section, width: usize, pdelim: char, rdelim: char, min_resolution: f64) -> Self {
        Self {
            section,
            width,
            back_pointer: None,
            pdelim,
            rdelim,
            min_resolution,
            fields: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Write `sequence` into columns 66-72 of every record (Parameter Data)
    pub fn with_back_pointer(mut self, sequence: i32) -> Self {
        self.back_pointer = Some(sequence);
        self
    }

    /// Number of fields queued so far
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field has been queued
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Append a pre-formatted token
    pub fn push_raw(&mut self, token: impl Into<String>) {
        self.fields.push(Field {
            text: token.into(),
            splittable: false,
        });
    }

    /// Append an integer field
    pub fn push_int(&mut self, value: i32) {
        self.push_raw(value.to_string());
    }

    /// Append a pointer field (0 for null)
    pub fn push_pointer(&mut self, sequence: i32) {
        self.push_raw(sequence.to_string());
    }

    /// Append a real field formatted against the minimum resolution
    pub fn push_real(&mut self, value: f64) -> Result<()> {
        let token = format_real(value, self.min_resolution)?;
        self.push_raw(token);
        Ok(())
    }

    /// Append a Hollerith string field
    pub fn push_string(&mut self, value: &str) {
        self.fields.push(Field {
            text: format_string(value),
            splittable: true,
        });
    }

    /// Append a field read back with [`ParameterReader::read_raw_field`]
    pub fn push_verbatim(&mut self, token: &str) {
        self.fields.push(Field {
            text: token.to_string(),
            splittable: is_hollerith(token),
        });
    }

    /// Append a comment line written after the record delimiter
    ///
    /// Comments start on a line of their own. One wider than the record is
    /// wrapped and reads back as one comment per line.
    pub fn push_comment(&mut self, comment: &str) {
        self.comments.push(comment.to_string());
    }

    /// Lay out every field and comment as records starting at `*sequence`
    ///
    /// `*sequence` is advanced past the last record produced. On error no
    /// record is returned and the counter is left untouched.
    pub fn finish(self, sequence: &mut i32) -> Result<Vec<Record>> {
        if self.fields.is_empty() {
            return Err(IgesError::Format(format!("no fields to write in {} section", self.section)));
        }

        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        let last = self.fields.len() - 1;

        for (index, field) in self.fields.iter().enumerate() {
            let delimiter = if index == last { self.rdelim } else { self.pdelim };
            let piece = format!("{}{}", field.text, delimiter);
            let piece_len = piece.chars().count();
            let used = current.chars().count();

            if used + piece_len <= self.width {
                current.push_str(&piece);
            } else if !field.splittable || piece_len <= self.width {
                if piece_len > self.width {
                    return Err(IgesError::Format(format!(
                        "field '{}' is wider than {} columns",
                        field.text, self.width
                    )));
                }
                lines.push(std::mem::take(&mut current));
                current = piece;
            } else {
                let mut rest: Vec<char> = piece.chars().collect();
                let mut room = self.width - used;
                while !rest.is_empty() {
                    let take = room.min(rest.len());
                    current.extend(rest.drain(..take));
                    if !rest.is_empty() {
                        lines.push(std::mem::take(&mut current));
                        room = self.width;
                    }
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }

        for comment in &self.comments {
            let chars: Vec<char> = comment.chars().collect();
            for chunk in chars.chunks(self.width) {
                lines.push(chunk.iter().collect());
            }
        }

        let mut next = *sequence;
        let mut records = Vec::with_capacity(lines.len());
        for line in lines {
            if next > MAX_SEQUENCE {
                return Err(IgesError::Format(format!(
                    "{} section exceeds {} records",
                    self.section, MAX_SEQUENCE
                )));
            }
            let data = match self.back_pointer {
                Some(de) => format!("{:<width$} {:>7}", line, de, width = self.width),
                None => line,
            };
            records.push(Record::new(self.section, next, data));
            next += 1;
        }
        *sequence = next;
        Ok(records)
    }
}
