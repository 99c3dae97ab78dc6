//! Color Definition entity (type 314)

use super::{Entity, EntityCommon, FormatContext};
use crate::error::{IgesError, Result};
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};
use crate::types::ColorNumber;

/// A custom color given as RGB percentages
#[derive(Debug, Clone, PartialEq)]
pub struct ColorDefinition {
    /// Common entity data
    pub common: EntityCommon,
    /// Red, green and blue in percent of full intensity
    pub rgb: [f64; 3],
    /// Optional color name
    pub name: String,
}

impl ColorDefinition {
    pub fn new() -> Self {
        ColorDefinition {
            common: EntityCommon::new(),
            rgb: [0.0; 3],
            name: String::new(),
        }
    }

    pub fn from_rgb(red: f64, green: f64, blue: f64) -> Self {
        ColorDefinition {
            rgb: [red, green, blue],
            ..Self::new()
        }
    }

    /// Definition matching one of the standard color numbers
    pub fn from_color_number(color: ColorNumber) -> Option<Self> {
        let (red, green, blue) = color.rgb_percent()?;
        Some(ColorDefinition {
            name: color.to_string(),
            ..Self::from_rgb(red, green, blue)
        })
    }
}

impl Default for ColorDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for ColorDefinition {
    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn type_number(&self) -> i32 {
        314
    }

    fn type_name(&self) -> &'static str {
        "Color Definition"
    }

    fn accepts_form(&self, form: i32) -> bool {
        form == 0
    }

    fn read_parameters(&mut self, reader: &mut ParameterReader) -> Result<()> {
        for (i, what) in ["CC1", "CC2", "CC3"].iter().enumerate() {
            let value = reader.read_real(what)?;
            if !(0.0..=100.0).contains(&value) {
                return Err(IgesError::Parse(format!(
                    "DE {}: {} value {} outside 0-100",
                    self.common.sequence, what, value
                )));
            }
            self.rgb[i] = value;
        }
        self.name = reader.read_string_or_empty("CNAME")?;
        Ok(())
    }

    fn write_parameters(&self, packer: &mut RecordPacker, _ctx: &FormatContext<'_>) -> Result<()> {
        for value in self.rgb {
            packer.push_real(value)?;
        }
        if !self.name.is_empty() {
            packer.push_string(&self.name);
        }
        Ok(())
    }

    fn rescale(&mut self, _factor: f64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_with_name() {
        let mut color = ColorDefinition::new();
        let mut reader = ParameterReader::new("100.,50.,0.,6HORANGE;", ',', ';');
        color.read_parameters(&mut reader).unwrap();
        assert_eq!(color.rgb, [100.0, 50.0, 0.0]);
        assert_eq!(color.name, "ORANGE");
    }

    #[test]
    fn test_out_of_range_component() {
        let mut color = ColorDefinition::new();
        let mut reader = ParameterReader::new("120.,0.,0.;", ',', ';');
        assert!(color.read_parameters(&mut reader).is_err());
    }

    #[test]
    fn test_from_color_number() {
        let red = ColorDefinition::from_color_number(ColorNumber::Red).unwrap();
        assert_eq!(red.rgb, [100.0, 0.0, 0.0]);
        assert!(ColorDefinition::from_color_number(ColorNumber::NoColor).is_none());
    }
}
