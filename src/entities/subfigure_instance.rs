//! Singular Subfigure Instance entity (type 408)

use super::{Entity, EntityCommon, FormatContext, Link, PointerRole};
use crate::error::{IgesError, Result};
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};
use crate::types::{Handle, Vector3};

pub(crate) const SUBFIGURE: PointerRole = PointerRole::Parameter {
    name: "subfigure",
    index: 0,
};

/// A placed, scaled copy of a Subfigure Definition
#[derive(Debug, Clone, PartialEq)]
pub struct SubfigureInstance {
    /// Common entity data
    pub common: EntityCommon,
    /// Subfigure Definition (type 308) being instanced
    pub subfigure: Option<Link>,
    pub translation: Vector3,
    pub scale: f64,
}

impl SubfigureInstance {
    pub fn new() -> Self {
        SubfigureInstance {
            common: EntityCommon::new(),
            subfigure: None,
            translation: Vector3::ZERO,
            scale: 1.0,
        }
    }
}

impl Default for SubfigureInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for SubfigureInstance {
    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn type_number(&self) -> i32 {
        408
    }

    fn type_name(&self) -> &'static str {
        "Singular Subfigure Instance"
    }

    fn accepts_form(&self, form: i32) -> bool {
        form == 0
    }

    fn accepts_target(&self, role: PointerRole, target_type: i32) -> bool {
        role != SUBFIGURE || target_type == 308
    }

    fn read_parameters(&mut self, reader: &mut ParameterReader) -> Result<()> {
        self.subfigure = Link::from_raw(reader.read_pointer("DE")?);
        self.translation = Vector3::new(
            reader.read_real_or("X", 0.0)?,
            reader.read_real_or("Y", 0.0)?,
            reader.read_real_or("Z", 0.0)?,
        );
        self.scale = reader.read_real_or("S", 1.0)?;
        Ok(())
    }

    fn write_parameters(&self, packer: &mut RecordPacker, ctx: &FormatContext<'_>) -> Result<()> {
        packer.push_pointer(ctx.optional_pointer(self.subfigure)?);
        packer.push_real(self.translation.x)?;
        packer.push_real(self.translation.y)?;
        packer.push_real(self.translation.z)?;
        packer.push_real(self.scale)?;
        Ok(())
    }

    fn rescale(&mut self, factor: f64) {
        // the scale factor is a ratio
        self.translation = self.translation * factor;
    }

    fn parameter_links(&self) -> Vec<(PointerRole, Link)> {
        self.subfigure.map(|link| (SUBFIGURE, link)).into_iter().collect()
    }

    fn visit_parameter_links_mut(&mut self, visit: &mut dyn FnMut(PointerRole, &mut Link)) {
        if let Some(link) = self.subfigure.as_mut() {
            visit(SUBFIGURE, link);
        }
    }

    fn unlink_parameters(&mut self, child: Handle) -> usize {
        if self.subfigure.is_some_and(|link| link.targets(child)) {
            self.subfigure = None;
            1
        } else {
            0
        }
    }

    fn set_parameter_link(&mut self, role: PointerRole, link: Option<Link>) -> Result<Option<Link>> {
        if role != SUBFIGURE {
            return Err(IgesError::Custom(format!(
                "Singular Subfigure Instance has no {} pointer",
                role
            )));
        }
        Ok(std::mem::replace(&mut self.subfigure, link))
    }
}
