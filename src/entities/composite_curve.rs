//! Composite Curve entity (type 102)

use super::{
    read_link_list, replace_in_list, unlink_list, write_link_list, Curve, Entity, EntityCommon,
    FormatContext, Link, PointerRole, CURVE_TYPES,
};
use crate::error::{IgesError, Result};
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};
use crate::types::{Handle, Vector3};

const SEGMENT: &str = "segment";

/// Role used to append a segment
pub(crate) const SEGMENT_ROLE: PointerRole = PointerRole::Parameter {
    name: SEGMENT,
    index: 0,
};

/// An ordered chain of curves joined end to start
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeCurve {
    /// Common entity data
    pub common: EntityCommon,
    /// Constituent curves in traversal order
    pub segments: Vec<Link>,
}

impl CompositeCurve {
    pub fn new() -> Self {
        CompositeCurve {
            common: EntityCommon::new(),
            segments: Vec::new(),
        }
    }
}

fn is_segment(role: PointerRole) -> bool {
    matches!(role, PointerRole::Parameter { name, .. } if name == SEGMENT)
}

impl Entity for CompositeCurve {
    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn type_number(&self) -> i32 {
        102
    }

    fn type_name(&self) -> &'static str {
        "Composite Curve"
    }

    fn accepts_form(&self, form: i32) -> bool {
        form == 0
    }

    fn accepts_target(&self, role: PointerRole, target_type: i32) -> bool {
        !is_segment(role) || CURVE_TYPES.contains(&target_type)
    }

    fn read_parameters(&mut self, reader: &mut ParameterReader) -> Result<()> {
        self.segments = read_link_list(reader, SEGMENT)?;
        Ok(())
    }

    fn write_parameters(&self, packer: &mut RecordPacker, ctx: &FormatContext<'_>) -> Result<()> {
        write_link_list(packer, ctx, &self.segments)
    }

    fn rescale(&mut self, _factor: f64) {}

    fn parameter_links(&self) -> Vec<(PointerRole, Link)> {
        self.segments
            .iter()
            .enumerate()
            .map(|(index, link)| (PointerRole::Parameter { name: SEGMENT, index }, *link))
            .collect()
    }

    fn visit_parameter_links_mut(&mut self, visit: &mut dyn FnMut(PointerRole, &mut Link)) {
        for (index, link) in self.segments.iter_mut().enumerate() {
            visit(PointerRole::Parameter { name: SEGMENT, index }, link);
        }
    }

    fn unlink_parameters(&mut self, child: Handle) -> usize {
        unlink_list(&mut self.segments, child)
    }

    fn set_parameter_link(&mut self, role: PointerRole, link: Option<Link>) -> Result<Option<Link>> {
        match role {
            PointerRole::Parameter { name, index } if name == SEGMENT => {
                replace_in_list(&mut self.segments, index, link)
            }
            _ => Err(IgesError::Custom(format!("Composite Curve has no {} pointer", role))),
        }
    }

    fn append_parameter_link(&mut self, role: PointerRole, link: Link) -> Result<()> {
        if !is_segment(role) {
            return Err(IgesError::Custom(format!("Composite Curve has no {} list", role)));
        }
        self.segments.push(link);
        Ok(())
    }

    fn as_curve(&self) -> Option<&dyn Curve> {
        Some(self)
    }
}

impl Curve for CompositeCurve {
    fn start_point(&self) -> Option<Vector3> {
        None
    }

    fn end_point(&self) -> Option<Vector3> {
        None
    }

    fn segments(&self) -> &[Link] {
        &self.segments
    }
}
