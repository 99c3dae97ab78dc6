//! Line entity (type 110)

use super::{Curve, Entity, EntityCommon, FormatContext, PointerRole};
use crate::error::Result;
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};
use crate::types::Vector3;

/// A line between two points
///
/// Form 0 is a bounded segment, form 1 a semi-bounded ray starting at
/// `start`, form 2 an unbounded line through both points.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Common entity data
    pub common: EntityCommon,
    /// Start point of the line
    pub start: Vector3,
    /// End point of the line
    pub end: Vector3,
}

impl Line {
    /// Create a new line from origin to origin
    pub fn new() -> Self {
        Line {
            common: EntityCommon::new(),
            start: Vector3::ZERO,
            end: Vector3::ZERO,
        }
    }

    /// Create a new line between two points
    pub fn from_points(start: Vector3, end: Vector3) -> Self {
        Line {
            start,
            end,
            ..Self::new()
        }
    }

    /// Create a new line from coordinates
    pub fn from_coords(x1: f64, y1: f64, z1: f64, x2: f64, y2: f64, z2: f64) -> Self {
        Line::from_points(Vector3::new(x1, y1, z1), Vector3::new(x2, y2, z2))
    }

    /// Get the length of the line
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

impl Default for Line {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Line {
    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn type_number(&self) -> i32 {
        110
    }

    fn type_name(&self) -> &'static str {
        "Line"
    }

    fn accepts_form(&self, form: i32) -> bool {
        matches!(form, 0..=2)
    }

    fn allows_role(&self, role: PointerRole) -> bool {
        role != PointerRole::Structure
    }

    fn read_parameters(&mut self, reader: &mut ParameterReader) -> Result<()> {
        self.start = Vector3::new(
            reader.read_real("X1")?,
            reader.read_real("Y1")?,
            reader.read_real("Z1")?,
        );
        self.end = Vector3::new(
            reader.read_real("X2")?,
            reader.read_real("Y2")?,
            reader.read_real("Z2")?,
        );
        Ok(())
    }

    fn write_parameters(&self, packer: &mut RecordPacker, _ctx: &FormatContext<'_>) -> Result<()> {
        for value in [self.start.x, self.start.y, self.start.z, self.end.x, self.end.y, self.end.z] {
            packer.push_real(value)?;
        }
        Ok(())
    }

    fn rescale(&mut self, factor: f64) {
        self.start = self.start * factor;
        self.end = self.end * factor;
    }

    fn as_curve(&self) -> Option<&dyn Curve> {
        Some(self)
    }
}

impl Curve for Line {
    fn start_point(&self) -> Option<Vector3> {
        Some(self.start)
    }

    fn end_point(&self) -> Option<Vector3> {
        Some(self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_parameters() {
        let mut line = Line::new();
        let mut reader = ParameterReader::new("1.,2.,3.,4.,5.,6.;", ',', ';');
        line.read_parameters(&mut reader).unwrap();
        assert_eq!(line.start, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(line.end, Vector3::new(4.0, 5.0, 6.0));
        assert!(reader.is_end_of_record());
    }

    #[test]
    fn test_missing_coordinate() {
        let mut line = Line::new();
        let mut reader = ParameterReader::new("1.,2.,3.,4.,5.;", ',', ';');
        assert!(line.read_parameters(&mut reader).is_err());
    }

    #[test]
    fn test_rescale_and_back() {
        let mut line = Line::from_coords(1.0, -2.0, 3.5, 0.25, 8.0, -1.0);
        let original = line.clone();
        line.rescale(3.0);
        assert_eq!(line.end.y, 24.0);
        line.rescale(1.0 / 3.0);
        assert!(line.start.approx_eq(&original.start, 1e-12));
        assert!(line.end.approx_eq(&original.end, 1e-12));
    }

    #[test]
    fn test_structure_forbidden() {
        let line = Line::new();
        assert!(!line.allows_role(PointerRole::Structure));
        assert!(line.allows_role(PointerRole::Transform));
        assert!(line.accepts_form(1));
        assert!(!line.accepts_form(3));
    }
}
