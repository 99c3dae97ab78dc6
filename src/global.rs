//! Global section parameters

use crate::error::{IgesError, Result};
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};
use crate::io::iges::record::{Record, Section, DATA_WIDTH};
use std::fmt;

/// Model space units (Global parameter 14)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Unit {
    Inch,
    #[default]
    Millimeter,
    Foot,
    Mile,
    Meter,
    Kilometer,
    Mil,
    Micron,
    Centimeter,
    Microinch,
}

impl Unit {
    /// Unit flag written to the Global section
    pub fn flag(&self) -> i32 {
        match self {
            Unit::Inch => 1,
            Unit::Millimeter => 2,
            Unit::Foot => 4,
            Unit::Mile => 5,
            Unit::Meter => 6,
            Unit::Kilometer => 7,
            Unit::Mil => 8,
            Unit::Micron => 9,
            Unit::Centimeter => 10,
            Unit::Microinch => 11,
        }
    }

    /// Unit for a flag; flag 3 names its unit in parameter 15 instead
    pub fn from_flag(flag: i32) -> Option<Self> {
        match flag {
            1 => Some(Unit::Inch),
            2 => Some(Unit::Millimeter),
            4 => Some(Unit::Foot),
            5 => Some(Unit::Mile),
            6 => Some(Unit::Meter),
            7 => Some(Unit::Kilometer),
            8 => Some(Unit::Mil),
            9 => Some(Unit::Micron),
            10 => Some(Unit::Centimeter),
            11 => Some(Unit::Microinch),
            _ => None,
        }
    }

    /// Conventional unit name (parameter 15)
    pub fn name(&self) -> &'static str {
        match self {
            Unit::Inch => "INCH",
            Unit::Millimeter => "MM",
            Unit::Foot => "FT",
            Unit::Mile => "MI",
            Unit::Meter => "M",
            Unit::Kilometer => "KM",
            Unit::Mil => "MIL",
            Unit::Micron => "UM",
            Unit::Centimeter => "CM",
            Unit::Microinch => "UIN",
        }
    }

    /// Parse a unit name, accepting the common aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "IN" | "INCH" => Some(Unit::Inch),
            "MM" => Some(Unit::Millimeter),
            "FT" => Some(Unit::Foot),
            "MI" => Some(Unit::Mile),
            "M" => Some(Unit::Meter),
            "KM" => Some(Unit::Kilometer),
            "MIL" => Some(Unit::Mil),
            "UM" => Some(Unit::Micron),
            "CM" => Some(Unit::Centimeter),
            "UIN" => Some(Unit::Microinch),
            _ => None,
        }
    }

    /// Length of one unit in millimetres
    pub fn millimeters(&self) -> f64 {
        match self {
            Unit::Inch => 25.4,
            Unit::Millimeter => 1.0,
            Unit::Foot => 304.8,
            Unit::Mile => 1_609_344.0,
            Unit::Meter => 1000.0,
            Unit::Kilometer => 1_000_000.0,
            Unit::Mil => 0.0254,
            Unit::Micron => 0.001,
            Unit::Centimeter => 10.0,
            Unit::Microinch => 0.0000254,
        }
    }

    /// Factor converting lengths in `self` into lengths in `target`
    pub fn conversion_factor(&self, target: Unit) -> f64 {
        self.millimeters() / target.millimeters()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Global section parameters
///
/// Passed by reference into every codec call of a load or store.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalData {
    pub parameter_delimiter: char,
    pub record_delimiter: char,
    pub sending_product_id: String,
    pub file_name: String,
    pub native_system_id: String,
    pub preprocessor_version: String,
    pub integer_bits: i32,
    pub single_precision_magnitude: i32,
    pub single_precision_significance: i32,
    pub double_precision_magnitude: i32,
    pub double_precision_significance: i32,
    pub receiving_product_id: String,
    pub model_space_scale: f64,
    pub unit: Unit,
    pub unit_name: String,
    pub line_weight_gradations: i32,
    pub max_line_width: f64,
    /// `YYYYMMDD.HHNNSS`
    pub file_timestamp: String,
    pub min_resolution: f64,
    pub max_coordinate: f64,
    pub author: String,
    pub organization: String,
    pub version: i32,
    pub drafting_standard: i32,
    pub model_timestamp: String,
    pub application_protocol: String,
    /// Scale linear fields by `conversion_factor` while reading
    pub convert: bool,
    pub conversion_factor: f64,
}

impl Default for GlobalData {
    fn default() -> Self {
        let now = timestamp_now();
        Self {
            parameter_delimiter: ',',
            record_delimiter: ';',
            sending_product_id: String::new(),
            file_name: String::new(),
            native_system_id: concat!("igesrust ", env!("CARGO_PKG_VERSION")).to_string(),
            preprocessor_version: env!("CARGO_PKG_VERSION").to_string(),
            integer_bits: 32,
            single_precision_magnitude: 38,
            single_precision_significance: 6,
            double_precision_magnitude: 308,
            double_precision_significance: 15,
            receiving_product_id: String::new(),
            model_space_scale: 1.0,
            unit: Unit::Millimeter,
            unit_name: Unit::Millimeter.name().to_string(),
            line_weight_gradations: 1,
            max_line_width: 0.0,
            file_timestamp: now.clone(),
            min_resolution: 1e-8,
            max_coordinate: 0.0,
            author: String::new(),
            organization: String::new(),
            version: 11,
            drafting_standard: 0,
            model_timestamp: now,
            application_protocol: String::new(),
            convert: false,
            conversion_factor: 1.0,
        }
    }
}

/// Current local time in Global section timestamp format
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y%m%d.%H%M%S").to_string()
}

impl GlobalData {
    /// Parse the concatenated data columns of the Global section
    pub fn parse(data: &str) -> Result<Self> {
        let chars: Vec<char> = data.chars().collect();
        let (pdelim, rdelim, consumed) = bootstrap_delimiters(&chars)?;
        let defaults = Self::default();

        let rest: String = chars[consumed..].iter().collect();
        let mut reader = ParameterReader::new(&rest, pdelim, rdelim);
        let section_error = |e: IgesError| IgesError::Section(format!("Global section: {}", e));

        let mut global = Self {
            parameter_delimiter: pdelim,
            record_delimiter: rdelim,
            ..defaults
        };
        if consumed >= chars.len() || chars[consumed - 1] == rdelim {
            return Ok(global);
        }

        let mut read = || -> Result<()> {
            global.sending_product_id = reader.read_string_or_empty("sending product id")?;
            global.file_name = reader.read_string_or_empty("file name")?;
            global.native_system_id = reader.read_string_or_empty("native system id")?;
            global.preprocessor_version = reader.read_string_or_empty("preprocessor version")?;
            global.integer_bits = reader.read_int_or("integer bits", global.integer_bits)?;
            global.single_precision_magnitude =
                reader.read_int_or("single precision magnitude", global.single_precision_magnitude)?;
            global.single_precision_significance = reader
                .read_int_or("single precision significance", global.single_precision_significance)?;
            global.double_precision_magnitude =
                reader.read_int_or("double precision magnitude", global.double_precision_magnitude)?;
            global.double_precision_significance = reader
                .read_int_or("double precision significance", global.double_precision_significance)?;
            global.receiving_product_id = reader.read_string_or_empty("receiving product id")?;
            global.model_space_scale = reader.read_real_or("model space scale", 1.0)?;

            let flag = reader.read_int_or("unit flag", 1)?;
            let name = reader.read_string_or_empty("unit name")?;
            global.unit = match Unit::from_flag(flag) {
                Some(unit) => unit,
                None if flag == 3 => Unit::from_name(&name).ok_or_else(|| {
                    IgesError::Parse(format!("unrecognized unit name '{}'", name))
                })?,
                None => return Err(IgesError::Parse(format!("invalid unit flag {}", flag))),
            };
            global.unit_name = if name.is_empty() {
                global.unit.name().to_string()
            } else {
                name
            };

            global.line_weight_gradations = reader.read_int_or("line weight gradations", 1)?;
            global.max_line_width = reader.read_real_or("maximum line width", 0.0)?;
            global.file_timestamp = reader.read_string_or_empty("file timestamp")?;
            global.min_resolution = reader.read_real_or("minimum resolution", global.min_resolution)?;
            global.max_coordinate = reader.read_real_or("maximum coordinate", 0.0)?;
            global.author = reader.read_string_or_empty("author")?;
            global.organization = reader.read_string_or_empty("organization")?;
            global.version = reader.read_int_or("version", 3)?;
            global.drafting_standard = reader.read_int_or("drafting standard", 0)?;
            global.model_timestamp = reader.read_string_or_empty("model timestamp")?;
            global.application_protocol = reader.read_string_or_empty("application protocol")?;
            Ok(())
        };
        read().map_err(section_error)?;

        if !global.min_resolution.is_finite() || global.min_resolution < 0.0 {
            return Err(IgesError::Section(format!(
                "Global section: invalid minimum resolution {}",
                global.min_resolution
            )));
        }
        Ok(global)
    }

    /// Encode as Global section records starting at sequence 1
    pub fn to_records(&self) -> Result<Vec<Record>> {
        if self.parameter_delimiter == self.record_delimiter {
            return Err(IgesError::Format(
                "parameter and record delimiters must differ".to_string(),
            ));
        }
        let mut packer = RecordPacker::new(
            Section::Global,
            DATA_WIDTH,
            self.parameter_delimiter,
            self.record_delimiter,
            self.min_resolution,
        );
        packer.push_string(&self.parameter_delimiter.to_string());
        packer.push_string(&self.record_delimiter.to_string());
        packer.push_string(&self.sending_product_id);
        packer.push_string(&self.file_name);
        packer.push_string(&self.native_system_id);
        packer.push_string(&self.preprocessor_version);
        packer.push_int(self.integer_bits);
        packer.push_int(self.single_precision_magnitude);
        packer.push_int(self.single_precision_significance);
        packer.push_int(self.double_precision_magnitude);
        packer.push_int(self.double_precision_significance);
        packer.push_string(&self.receiving_product_id);
        packer.push_real(self.model_space_scale)?;
        packer.push_int(self.unit.flag());
        packer.push_string(&self.unit_name);
        packer.push_int(self.line_weight_gradations);
        packer.push_real(self.max_line_width)?;
        packer.push_string(&self.file_timestamp);
        packer.push_real(self.min_resolution)?;
        packer.push_real(self.max_coordinate)?;
        packer.push_string(&self.author);
        packer.push_string(&self.organization);
        packer.push_int(self.version);
        packer.push_int(self.drafting_standard);
        packer.push_string(&self.model_timestamp);
        if !self.application_protocol.is_empty() {
            packer.push_string(&self.application_protocol);
        }

        let mut sequence = 1;
        packer.finish(&mut sequence)
    }
}

/// Work out the delimiters from parameters 1 and 2
///
/// Returns the delimiters and the number of characters consumed.
fn bootstrap_delimiters(chars: &[char]) -> Result<(char, char, usize)> {
    let hollerith = |at: usize| -> Option<char> {
        match (chars.get(at), chars.get(at + 1), chars.get(at + 2)) {
            (Some('1'), Some('H' | 'h'), Some(c)) => Some(*c),
            _ => None,
        }
    };
    let bad = |message: &str| IgesError::Section(format!("Global section: {}", message));

    let (pdelim, mut position) = match hollerith(0) {
        Some(c) => {
            if chars.get(3) != Some(&c) {
                return Err(bad("parameter delimiter is not followed by itself"));
            }
            (c, 4)
        }
        None if chars.first() == Some(&',') => (',', 1),
        None => return Err(bad("cannot determine the parameter delimiter")),
    };

    let rdelim = match hollerith(position) {
        Some(c) => {
            position += 3;
            c
        }
        None => ';',
    };
    match chars.get(position) {
        Some(&c) if c == pdelim || c == rdelim => position += 1,
        _ => return Err(bad("record delimiter field is malformed")),
    }

    if pdelim == rdelim {
        return Err(bad("parameter and record delimiters are the same character"));
    }
    Ok((pdelim, rdelim, position))
}
