//! Pointer resolution and reference bookkeeping
//!
//! After every entity of a file has been parsed, each raw Directory Entry
//! sequence number it carries is resolved to the [`Handle`] of the entity
//! numbered that way, and the child records the parent in its reference
//! list. The same bookkeeping backs the pointer-editing methods on
//! [`IgesDocument`].

use crate::document::IgesDocument;
use crate::entities::composite_curve::SEGMENT_ROLE;
use crate::entities::point::DISPLAY_SYMBOL;
use crate::entities::subfigure_definition::MEMBER_ROLE;
use crate::entities::subfigure_instance::SUBFIGURE;
use crate::entities::{directory_role_accepts, EntityState, EntityType, Link, PointerRole};
use crate::error::{IgesError, Result};
use crate::notification::NotificationType;
use crate::types::Handle;
use ahash::AHashMap;

/// Lookup from Directory Entry sequence number to entity
#[derive(Debug, Default)]
pub struct SequenceTable {
    entries: AHashMap<i32, (Handle, i32)>,
}

impl SequenceTable {
    /// Index every entity of the document by its current sequence number
    pub fn build(doc: &IgesDocument) -> Self {
        let entries = doc
            .entities()
            .map(|(handle, entity)| (entity.common().sequence, (handle, entity.declared_type())))
            .collect();
        SequenceTable { entries }
    }

    /// Handle and declared type number of the entity at `sequence`
    pub fn lookup(&self, sequence: i32) -> Option<(Handle, i32)> {
        self.entries.get(&sequence).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn accepts(entity: &EntityType, role: PointerRole, target_type: i32) -> bool {
    if role.is_directory_field() {
        directory_role_accepts(role, target_type)
    } else {
        entity.as_entity().accepts_target(role, target_type)
    }
}

/// Resolve the pending pointers of every entity in the document
///
/// Any dangling pointer or illegal target aborts the whole pass.
pub(crate) fn associate_all(doc: &mut IgesDocument) -> Result<()> {
    let table = SequenceTable::build(doc);
    for handle in doc.handles() {
        associate(doc, &table, handle)?;
    }
    tracing::debug!(entities = table.len(), "pointers associated");
    Ok(())
}

/// Resolve the pending pointers of one entity
///
/// Pointers that are already bound are left alone, so running the pass
/// twice records no extra references.
pub(crate) fn associate(doc: &mut IgesDocument, table: &SequenceTable, handle: Handle) -> Result<()> {
    let entity = doc.live_entity(handle)?;
    let sequence = entity.common().sequence;

    let mut edges = Vec::new();
    for (role, link) in entity.links() {
        let Link::Pending(target) = link else {
            continue;
        };
        let (child, target_type) = table.lookup(target).ok_or(IgesError::DanglingPointer {
            sequence,
            role,
            target,
        })?;
        if !accepts(entity, role, target_type) {
            return Err(IgesError::IllegalAssociation {
                sequence,
                role,
                reason: format!("DE {} is an entity of type {}", target, target_type),
            });
        }
        edges.push((role, child));
    }

    let entity = doc.get_entity_mut(handle)?;
    entity.visit_links_mut(&mut |_, link| {
        if let Link::Pending(target) = *link {
            if let Some((child, _)) = table.lookup(target) {
                *link = Link::Bound(child);
            }
        }
    });
    for (_, child) in &edges {
        doc.entities
            .get_mut(child)
            .ok_or(IgesError::EntityNotFound(*child))?
            .common_mut()
            .add_reference(handle);
    }

    clear_forbidden_roles(doc, handle)?;

    let entity = doc.get_entity_mut(handle)?;
    entity.common_mut().set_state(EntityState::Associated);
    Ok(())
}

/// Drop pointers held in a role the entity type may not carry
fn clear_forbidden_roles(doc: &mut IgesDocument, handle: Handle) -> Result<()> {
    let entity = doc.get_entity(handle)?;
    let sequence = entity.common().sequence;
    let type_name = entity.as_entity().type_name();
    let forbidden: Vec<(PointerRole, Link)> = entity
        .links()
        .into_iter()
        .filter(|(role, _)| !entity.as_entity().allows_role(*role))
        .collect();

    for (role, link) in forbidden {
        doc.get_entity_mut(handle)?.common_mut().replace_link(role, None)?;
        if let Some(child) = link.handle() {
            release(doc, handle, child)?;
        }
        tracing::warn!(sequence, %role, "{} may not carry a {} pointer; cleared", type_name, role);
        doc.notifications.notify_entity(
            NotificationType::Corruption,
            sequence,
            format!("{} pointer cleared; {} entities may not carry one", role, type_name),
        );
    }
    Ok(())
}

/// Remove one parent edge from `child`'s reference list
fn release(doc: &mut IgesDocument, parent: Handle, child: Handle) -> Result<()> {
    let target = doc
        .entities
        .get_mut(&child)
        .ok_or(IgesError::EntityNotFound(child))?;
    if target.common_mut().del_reference(parent) {
        Ok(())
    } else {
        Err(IgesError::ReferenceUnderflow { parent, child })
    }
}

impl IgesDocument {
    /// Remove every pointer from `parent` to `child`
    ///
    /// Returns the number of pointers removed.
    pub fn unlink(&mut self, parent: Handle, child: Handle) -> Result<usize> {
        self.live_entity(parent)?;
        self.get_entity(child)?;
        self.unlink_edges(parent, child)
    }

    pub(crate) fn unlink_edges(&mut self, parent: Handle, child: Handle) -> Result<usize> {
        let removed = self
            .entities
            .get_mut(&parent)
            .ok_or(IgesError::EntityNotFound(parent))?
            .unlink(child);
        for _ in 0..removed {
            release(self, parent, child)?;
        }
        Ok(removed)
    }

    fn check_pointer(&self, parent: Handle, role: PointerRole, child: Handle) -> Result<()> {
        let entity = self.live_entity(parent)?;
        let sequence = entity.common().sequence;
        if !entity.as_entity().allows_role(role) {
            return Err(IgesError::IllegalAssociation {
                sequence,
                role,
                reason: format!(
                    "{} entities may not carry a {} pointer",
                    entity.as_entity().type_name(),
                    role
                ),
            });
        }

        let target_type = self.live_entity(child)?.declared_type();
        if !accepts(entity, role, target_type) {
            return Err(IgesError::IllegalAssociation {
                sequence,
                role,
                reason: format!("target is an entity of type {}", target_type),
            });
        }

        if role == PointerRole::Transform {
            self.check_transform_chain(parent, child)?;
        }
        Ok(())
    }

    /// Refuse a transform pointer that would lead back to `parent`
    fn check_transform_chain(&self, parent: Handle, child: Handle) -> Result<()> {
        let mut current = Some(child);
        let mut steps = 0;
        while let Some(handle) = current {
            if handle == parent {
                return Err(IgesError::TransformCycle(parent));
            }
            steps += 1;
            if steps > self.entity_count() {
                return Err(IgesError::TransformCycle(handle));
            }
            current = self
                .get_entity(handle)?
                .common()
                .transform
                .and_then(|link| link.handle());
        }
        Ok(())
    }

    /// Point `role` of `parent` at `child`, or clear it with `None`
    ///
    /// The previous target loses its reference and the new one gains one.
    /// Returns the previous target.
    pub fn set_pointer(
        &mut self,
        parent: Handle,
        role: PointerRole,
        child: Option<Handle>,
    ) -> Result<Option<Handle>> {
        match child {
            Some(child) => self.check_pointer(parent, role, child)?,
            None => {
                self.live_entity(parent)?;
            }
        }

        let link = child.map(Link::Bound);
        let entity = self.get_entity_mut(parent)?;
        let old = match role {
            PointerRole::Parameter { .. } => entity.as_entity_mut().set_parameter_link(role, link)?,
            _ => entity.common_mut().replace_link(role, link)?,
        };

        let old = old.and_then(|link| link.handle());
        if let Some(previous) = old {
            release(self, parent, previous)?;
        }
        if let Some(child) = child {
            self.entities
                .get_mut(&child)
                .ok_or(IgesError::EntityNotFound(child))?
                .common_mut()
                .add_reference(parent);
        }
        Ok(old)
    }

    /// Append `child` to a list-valued pointer role of `parent`
    ///
    /// Only the role's kind matters; its index is ignored.
    pub fn append_pointer(&mut self, parent: Handle, role: PointerRole, child: Handle) -> Result<()> {
        self.check_pointer(parent, role, child)?;

        let link = Link::Bound(child);
        let entity = self.get_entity_mut(parent)?;
        match role {
            PointerRole::Parameter { .. } => entity.as_entity_mut().append_parameter_link(role, link)?,
            PointerRole::Associativity(_) => entity.common_mut().associativities.push(link),
            PointerRole::Property(_) => entity.common_mut().properties.push(link),
            _ => {
                return Err(IgesError::Custom(format!(
                    "{} is a single pointer; use set_pointer",
                    role
                )))
            }
        }

        self.entities
            .get_mut(&child)
            .ok_or(IgesError::EntityNotFound(child))?
            .common_mut()
            .add_reference(parent);
        Ok(())
    }

    /// Set or clear the Transformation Matrix applied to an entity
    pub fn set_transform(&mut self, entity: Handle, matrix: Option<Handle>) -> Result<Option<Handle>> {
        self.set_pointer(entity, PointerRole::Transform, matrix)
    }

    /// Set or clear the Color Definition used by an entity
    pub fn set_color(&mut self, entity: Handle, color: Option<Handle>) -> Result<Option<Handle>> {
        self.set_pointer(entity, PointerRole::Color, color)
    }

    pub fn set_structure(&mut self, entity: Handle, structure: Option<Handle>) -> Result<Option<Handle>> {
        self.set_pointer(entity, PointerRole::Structure, structure)
    }

    /// Attach a property entity
    pub fn add_property(&mut self, entity: Handle, property: Handle) -> Result<()> {
        self.append_pointer(entity, PointerRole::Property(0), property)
    }

    /// Append a curve to a Composite Curve
    pub fn add_segment(&mut self, curve: Handle, segment: Handle) -> Result<()> {
        self.append_pointer(curve, SEGMENT_ROLE, segment)
    }

    /// Add an entity to a Subfigure Definition
    pub fn add_member(&mut self, definition: Handle, member: Handle) -> Result<()> {
        self.append_pointer(definition, MEMBER_ROLE, member)
    }

    /// Point a Singular Subfigure Instance at its definition
    pub fn set_subfigure(&mut self, instance: Handle, definition: Handle) -> Result<Option<Handle>> {
        self.set_pointer(instance, SUBFIGURE, Some(definition))
    }

    /// Set or clear the Subfigure Definition drawn at a Point
    pub fn set_display_symbol(&mut self, point: Handle, symbol: Option<Handle>) -> Result<Option<Handle>> {
        self.set_pointer(point, DISPLAY_SYMBOL, symbol)
    }
}
