//! Point entity (type 116)

use super::{Entity, EntityCommon, FormatContext, Link, PointerRole};
use crate::error::{IgesError, Result};
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};
use crate::types::{Handle, Vector3};

pub(crate) const DISPLAY_SYMBOL: PointerRole = PointerRole::Parameter {
    name: "display symbol",
    index: 0,
};

/// A point, optionally drawn with a subfigure as its symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Common entity data
    pub common: EntityCommon,
    /// Location of the point
    pub location: Vector3,
    /// Subfigure Definition (type 308) used as display symbol
    pub display_symbol: Option<Link>,
}

impl Point {
    /// Create a new point at the origin
    pub fn new() -> Self {
        Point {
            common: EntityCommon::new(),
            location: Vector3::ZERO,
            display_symbol: None,
        }
    }

    /// Create a new point at a location
    pub fn at(location: Vector3) -> Self {
        Point {
            location,
            ..Self::new()
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Point {
    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn type_number(&self) -> i32 {
        116
    }

    fn type_name(&self) -> &'static str {
        "Point"
    }

    fn accepts_form(&self, form: i32) -> bool {
        form == 0
    }

    fn accepts_target(&self, role: PointerRole, target_type: i32) -> bool {
        role != DISPLAY_SYMBOL || target_type == 308
    }

    fn read_parameters(&mut self, reader: &mut ParameterReader) -> Result<()> {
        self.location = Vector3::new(
            reader.read_real("X")?,
            reader.read_real("Y")?,
            reader.read_real("Z")?,
        );
        self.display_symbol = Link::from_raw(reader.read_pointer("PTR")?);
        Ok(())
    }

    fn write_parameters(&self, packer: &mut RecordPacker, ctx: &FormatContext<'_>) -> Result<()> {
        packer.push_real(self.location.x)?;
        packer.push_real(self.location.y)?;
        packer.push_real(self.location.z)?;
        packer.push_pointer(ctx.optional_pointer(self.display_symbol)?);
        Ok(())
    }

    fn rescale(&mut self, factor: f64) {
        self.location = self.location * factor;
    }

    fn parameter_links(&self) -> Vec<(PointerRole, Link)> {
        self.display_symbol.map(|link| (DISPLAY_SYMBOL, link)).into_iter().collect()
    }

    fn visit_parameter_links_mut(&mut self, visit: &mut dyn FnMut(PointerRole, &mut Link)) {
        if let Some(link) = self.display_symbol.as_mut() {
            visit(DISPLAY_SYMBOL, link);
        }
    }

    fn unlink_parameters(&mut self, child: Handle) -> usize {
        if self.display_symbol.is_some_and(|link| link.targets(child)) {
            self.display_symbol = None;
            1
        } else {
            0
        }
    }

    fn set_parameter_link(&mut self, role: PointerRole, link: Option<Link>) -> Result<Option<Link>> {
        if role != DISPLAY_SYMBOL {
            return Err(IgesError::Custom(format!("Point has no {} pointer", role)));
        }
        Ok(std::mem::replace(&mut self.display_symbol, link))
    }
}
