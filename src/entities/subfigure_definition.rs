//! Subfigure Definition entity (type 308)

use super::{
    read_link_list, replace_in_list, unlink_list, write_link_list, Entity, EntityCommon,
    FormatContext, Link, PointerRole,
};
use crate::error::{IgesError, Result};
use crate::io::iges::field_codec::{ParameterReader, RecordPacker};
use crate::types::Handle;

const MEMBER: &str = "member";

pub(crate) const MEMBER_ROLE: PointerRole = PointerRole::Parameter {
    name: MEMBER,
    index: 0,
};

/// A named group of entities instanced by Singular Subfigure Instances
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubfigureDefinition {
    /// Common entity data
    pub common: EntityCommon,
    /// Nesting depth of subfigures inside this one
    pub depth: i32,
    pub name: String,
    pub members: Vec<Link>,
}

impl SubfigureDefinition {
    pub fn new() -> Self {
        SubfigureDefinition {
            common: EntityCommon::new(),
            depth: 0,
            name: String::new(),
            members: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        SubfigureDefinition {
            name: name.into(),
            ..Self::new()
        }
    }
}

fn is_member(role: PointerRole) -> bool {
    matches!(role, PointerRole::Parameter { name, .. } if name == MEMBER)
}

impl Entity for SubfigureDefinition {
    fn common(&self) -> &EntityCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut EntityCommon {
        &mut self.common
    }

    fn type_number(&self) -> i32 {
        308
    }

    fn type_name(&self) -> &'static str {
        "Subfigure Definition"
    }

    fn accepts_form(&self, form: i32) -> bool {
        form == 0
    }

    fn read_parameters(&mut self, reader: &mut ParameterReader) -> Result<()> {
        self.depth = reader.read_int("DEPTH")?;
        self.name = reader.read_string_or_empty("NAME")?;
        self.members = read_link_list(reader, MEMBER)?;
        Ok(())
    }

    fn write_parameters(&self, packer: &mut RecordPacker, ctx: &FormatContext<'_>) -> Result<()> {
        packer.push_int(self.depth);
        packer.push_string(&self.name);
        write_link_list(packer, ctx, &self.members)
    }

    fn rescale(&mut self, _factor: f64) {}

    fn parameter_links(&self) -> Vec<(PointerRole, Link)> {
        self.members
            .iter()
            .enumerate()
            .map(|(index, link)| (PointerRole::Parameter { name: MEMBER, index }, *link))
            .collect()
    }

    fn visit_parameter_links_mut(&mut self, visit: &mut dyn FnMut(PointerRole, &mut Link)) {
        for (index, link) in self.members.iter_mut().enumerate() {
            visit(PointerRole::Parameter { name: MEMBER, index }, link);
        }
    }

    fn unlink_parameters(&mut self, child: Handle) -> usize {
        unlink_list(&mut self.members, child)
    }

    fn set_parameter_link(&mut self, role: PointerRole, link: Option<Link>) -> Result<Option<Link>> {
        match role {
            PointerRole::Parameter { name, index } if name == MEMBER => {
                replace_in_list(&mut self.members, index, link)
            }
            _ => Err(IgesError::Custom(format!(
                "Subfigure Definition has no {} pointer",
                role
            ))),
        }
    }

    fn append_parameter_link(&mut self, role: PointerRole, link: Link) -> Result<()> {
        if !is_member(role) {
            return Err(IgesError::Custom(format!(
                "Subfigure Definition has no {} list",
                role
            )));
        }
        self.members.push(link);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_definition() {
        let mut definition = SubfigureDefinition::new();
        let mut reader = ParameterReader::new("1,5HBOLTS,2,7,9;", ',', ';');
        definition.read_parameters(&mut reader).unwrap();
        assert_eq!(definition.depth, 1);
        assert_eq!(definition.name, "BOLTS");
        assert_eq!(definition.members, vec![Link::Pending(7), Link::Pending(9)]);
    }

    #[test]
    fn test_member_editing() {
        let mut definition = SubfigureDefinition::named("A");
        let role = PointerRole::Parameter { name: MEMBER, index: 0 };
        definition.append_parameter_link(role, Link::Bound(Handle::new(4))).unwrap();
        let old = definition
            .set_parameter_link(role, Some(Link::Bound(Handle::new(5))))
            .unwrap();
        assert_eq!(old, Some(Link::Bound(Handle::new(4))));
        assert!(definition.append_parameter_link(PointerRole::View, Link::Pending(1)).is_err());
    }
}
