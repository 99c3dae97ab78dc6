//! Transformation Matrix entity (type 124)

use super::{Entity, EntityCommon, FormatContext};
use crate::error::Result;
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};
use crate::types::{Matrix3, Transform, Vector3};

/// A rotation followed by a translation
///
/// Forms 0 and 1 are right- and left-handed coordinate transforms; forms
/// 10, 11 and 12 are finite element coordinate systems (cartesian,
/// cylindrical, spherical).
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationMatrix {
    /// Common entity data
    pub common: EntityCommon,
    pub rotation: Matrix3,
    pub translation: Vector3,
}

impl TransformationMatrix {
    /// Create an identity transform
    pub fn new() -> Self {
        TransformationMatrix {
            common: EntityCommon::new(),
            rotation: Matrix3::identity(),
            translation: Vector3::ZERO,
        }
    }

    pub fn from_transform(transform: Transform) -> Self {
        TransformationMatrix {
            rotation: transform.rotation,
            translation: transform.translation,
            ..Self::new()
        }
    }

    /// The transform this entity describes, ignoring any chained transform
    pub fn to_transform(&self) -> Transform {
        Transform::new(self.rotation, self.translation)
    }
}

impl Default for TransformationMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for TransformationMatrix {
    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn type_number(&self) -> i32 {
        124
    }

    fn type_name(&self) -> &'static str {
        "Transformation Matrix"
    }

    fn accepts_form(&self, form: i32) -> bool {
        matches!(form, 0 | 1 | 10 | 11 | 12)
    }

    fn read_parameters(&mut self, reader: &mut ParameterReader) -> Result<()> {
        const NAMES: [[&str; 4]; 3] = [
            ["R11", "R12", "R13", "T1"],
            ["R21", "R22", "R23", "T2"],
            ["R31", "R32", "R33", "T3"],
        ];
        let mut translation = [0.0; 3];
        for (row, names) in NAMES.iter().enumerate() {
            for col in 0..3 {
                self.rotation.m[row][col] = reader.read_real(names[col])?;
            }
            translation[row] = reader.read_real(names[3])?;
        }
        self.translation = Vector3::new(translation[0], translation[1], translation[2]);
        Ok(())
    }

    fn write_parameters(&self, packer: &mut RecordPacker, _ctx: &FormatContext<'_>) -> Result<()> {
        let translation = [self.translation.x, self.translation.y, self.translation.z];
        for row in 0..3 {
            for col in 0..3 {
                packer.push_real(self.rotation.m[row][col])?;
            }
            packer.push_real(translation[row])?;
        }
        Ok(())
    }

    fn rescale(&mut self, factor: f64) {
        // the rotation block is dimensionless
        self.translation = self.translation * factor;
    }
}
