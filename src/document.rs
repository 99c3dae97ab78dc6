//! IGES document structure

use crate::entities::{EntityState, EntityType, Link};
use crate::error::{IgesError, Result};
use crate::global::{GlobalData, Unit};
use crate::io::iges::{IgesReader, IgesWriter};
use crate::notification::NotificationCollection;
use crate::types::{Handle, Transform, Vector3};
use ahash::AHashMap;
use indexmap::IndexMap;
use std::io::{Read, Write};
use std::path::Path;

/// An IGES model: Global parameters plus an ordered table of entities
///
/// Entities are owned by the document and addressed by [`Handle`]s, which
/// are never reused. Every pointer between entities is a
/// [`Link`](crate::entities::Link) into this table.
#[derive(Debug, Clone)]
pub struct IgesDocument {
    /// Global section parameters
    pub global: GlobalData,

    /// Start section text, one entry per line
    pub start_section: Vec<String>,

    /// Notifications collected during the last read/write operation
    pub notifications: NotificationCollection,

    /// All entities, in Directory Entry order
    pub(crate) entities: IndexMap<Handle, EntityType>,

    /// Next handle to assign
    next_handle: u64,

    /// Next free Directory Entry sequence number (always odd)
    next_sequence: i32,
}

impl IgesDocument {
    /// Create a new empty document
    pub fn new() -> Self {
        IgesDocument {
            global: GlobalData::default(),
            start_section: Vec::new(),
            notifications: NotificationCollection::new(),
            entities: IndexMap::new(),
            next_handle: 1,
            next_sequence: 1,
        }
    }

    /// Read a document from a file
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        IgesReader::from_file(path)?.read()
    }

    /// Read a document from any reader
    pub fn read<R: Read>(source: R) -> Result<Self> {
        IgesReader::from_reader(source)?.read()
    }

    /// Write the document to a file
    pub fn write_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        IgesWriter::new(self).write_to_file(path)
    }

    /// Write the document to any writer
    pub fn write<W: Write>(&mut self, destination: W) -> Result<()> {
        IgesWriter::new(self).write_to_writer(destination)
    }

    fn allocate_handle(&mut self) -> Handle {
        let handle = Handle::new(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn allocate_sequence(&mut self) -> i32 {
        let sequence = self.next_sequence;
        self.next_sequence += 2;
        sequence
    }

    /// Create an empty entity of the given type and form
    ///
    /// The entity gets a fresh sequence number and no pointers.
    pub fn new_entity(&mut self, entity_type: i32, form: i32) -> Result<Handle> {
        let entity = EntityType::create(entity_type, form)?;
        self.add_entity(entity)
    }

    /// Add an entity built by the caller
    ///
    /// Every pointer it carries must already be bound to a live entity of
    /// this document; the matching references are recorded. Parents the
    /// entity claims from an earlier life (a clone, say) are dropped.
    pub fn add_entity(&mut self, mut entity: EntityType) -> Result<Handle> {
        let mut children = Vec::new();
        for (role, link) in entity.links() {
            match link {
                Link::Bound(child) => {
                    self.live_entity(child)?;
                    children.push(child);
                }
                Link::Pending(target) => {
                    return Err(IgesError::Custom(format!(
                        "new entity has an unresolved {} pointer to DE {}",
                        role, target
                    )))
                }
            }
        }

        let handle = self.allocate_handle();
        let sequence = self.allocate_sequence();
        let common = entity.common_mut();
        common.sequence = sequence;
        common.clear_references();
        common.set_state(EntityState::Associated);
        self.entities.insert(handle, entity);

        for child in children {
            if let Some(target) = self.entities.get_mut(&child) {
                target.common_mut().add_reference(handle);
            }
        }
        Ok(handle)
    }

    /// Store an entity read from a file, keeping its sequence number
    pub(crate) fn insert_loaded(&mut self, entity: EntityType) -> Handle {
        let handle = self.allocate_handle();
        let sequence = entity.common().sequence;
        if sequence >= self.next_sequence {
            self.next_sequence = sequence + 2 - (sequence + 1) % 2;
        }
        self.entities.insert(handle, entity);
        handle
    }

    /// Get an entity by handle
    pub fn get_entity(&self, handle: Handle) -> Result<&EntityType> {
        self.entities.get(&handle).ok_or(IgesError::EntityNotFound(handle))
    }

    /// Get a mutable entity by handle; invalid entities are refused
    pub fn get_entity_mut(&mut self, handle: Handle) -> Result<&mut EntityType> {
        let entity = self
            .entities
            .get_mut(&handle)
            .ok_or(IgesError::EntityNotFound(handle))?;
        if entity.state() == EntityState::Invalid {
            return Err(IgesError::InvalidEntity(handle));
        }
        Ok(entity)
    }

    /// Get an entity that may take part in graph operations
    pub(crate) fn live_entity(&self, handle: Handle) -> Result<&EntityType> {
        let entity = self.get_entity(handle)?;
        if entity.state() == EntityState::Invalid {
            return Err(IgesError::InvalidEntity(handle));
        }
        Ok(entity)
    }

    /// Get the number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate over all entities in table order
    pub fn entities(&self) -> impl Iterator<Item = (Handle, &EntityType)> {
        self.entities.iter().map(|(handle, entity)| (*handle, entity))
    }

    /// Handles of all entities in table order
    pub fn handles(&self) -> Vec<Handle> {
        self.entities.keys().copied().collect()
    }

    /// Find the entity currently numbered `sequence`
    pub fn find_by_sequence(&self, sequence: i32) -> Option<Handle> {
        self.entities
            .iter()
            .find(|(_, entity)| entity.common().sequence == sequence)
            .map(|(handle, _)| *handle)
    }

    /// Whether the entity is dependent and nothing refers to it
    pub fn is_orphaned(&self, handle: Handle) -> Result<bool> {
        Ok(self.get_entity(handle)?.common().is_orphaned())
    }

    /// Delete an entity
    ///
    /// A referenced entity is only deleted with `cascade`, which first
    /// removes every pointer to it. The entity's own pointers are always
    /// removed; with `cascade`, children left orphaned are deleted too.
    pub fn delete_entity(&mut self, handle: Handle, cascade: bool) -> Result<()> {
        let entity = self.get_entity(handle)?;
        let parents: Vec<Handle> = entity.common().references().collect();
        if !parents.is_empty() && !cascade {
            return Err(IgesError::EntityReferenced {
                handle,
                count: parents.len(),
            });
        }

        for parent in parents {
            if parent != handle {
                self.unlink_edges(parent, handle)?;
            }
        }
        let children = self.get_entity(handle)?.children();
        for child in &children {
            if *child != handle && self.entities.contains_key(child) {
                self.unlink_edges(handle, *child)?;
            }
        }
        self.entities.shift_remove(&handle);
        tracing::debug!(%handle, cascade, "entity deleted");

        if cascade {
            for child in children {
                let orphaned = self
                    .entities
                    .get(&child)
                    .is_some_and(|entity| entity.common().is_orphaned());
                if orphaned {
                    self.delete_entity(child, true)?;
                }
            }
        }
        Ok(())
    }

    /// Delete orphaned entities until none remain; returns how many were removed
    pub fn cull(&mut self) -> Result<usize> {
        let mut removed = 0;
        loop {
            let orphans: Vec<Handle> = self
                .entities
                .iter()
                .filter(|(_, entity)| entity.common().is_orphaned())
                .map(|(handle, _)| *handle)
                .collect();
            if orphans.is_empty() {
                break;
            }
            for handle in orphans {
                if self.entities.contains_key(&handle) {
                    self.delete_entity(handle, false)?;
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            tracing::info!(removed, "culled orphaned entities");
        }
        Ok(removed)
    }

    /// Multiply every linear quantity in the model by `factor`
    ///
    /// Each entity scales only the data it owns.
    pub fn rescale(&mut self, factor: f64) -> Result<()> {
        if !factor.is_finite() || factor == 0.0 {
            return Err(IgesError::Custom(format!("invalid scale factor {}", factor)));
        }
        for entity in self.entities.values_mut() {
            entity.as_entity_mut().rescale(factor);
        }
        Ok(())
    }

    /// Convert the model to another unit, rescaling every entity
    pub fn change_units(&mut self, unit: Unit) -> Result<()> {
        if unit == self.global.unit {
            return Ok(());
        }
        let factor = self.global.unit.conversion_factor(unit);
        self.rescale(factor)?;
        self.global.unit = unit;
        self.global.unit_name = unit.name().to_string();
        self.global.min_resolution *= factor;
        self.global.max_coordinate *= factor;
        self.global.max_line_width *= factor;
        tracing::debug!(%unit, factor, "units changed");
        Ok(())
    }

    /// Compose the transform chain starting at the entity's transform pointer
    ///
    /// The first matrix in the chain is applied first. An entity without a
    /// transform yields the identity.
    pub fn transform_matrix(&self, handle: Handle) -> Result<Transform> {
        let entity = self.live_entity(handle)?;
        let mut result = Transform::identity();
        let mut visited = vec![handle];
        let mut next = entity.common().transform;

        while let Some(link) = next {
            let target = link.handle().ok_or_else(|| {
                IgesError::Custom(format!("transform pointer of {} is not associated", handle))
            })?;
            if visited.contains(&target) {
                return Err(IgesError::TransformCycle(handle));
            }
            visited.push(target);

            match self.live_entity(target)? {
                EntityType::TransformationMatrix(matrix) => {
                    result = result.then(&matrix.to_transform());
                    next = matrix.common.transform;
                }
                other => {
                    return Err(IgesError::IllegalAssociation {
                        sequence: entity.common().sequence,
                        role: crate::entities::PointerRole::Transform,
                        reason: format!("target is a {}", other.as_entity().type_name()),
                    })
                }
            }
        }
        Ok(result)
    }

    /// Start point of a curve, in model space when `xform` is set
    pub fn curve_start_point(&self, handle: Handle, xform: bool) -> Result<Vector3> {
        self.curve_point(handle, xform, true, &mut Vec::new())
    }

    /// End point of a curve, in model space when `xform` is set
    pub fn curve_end_point(&self, handle: Handle, xform: bool) -> Result<Vector3> {
        self.curve_point(handle, xform, false, &mut Vec::new())
    }

    fn curve_point(
        &self,
        handle: Handle,
        xform: bool,
        at_start: bool,
        visiting: &mut Vec<Handle>,
    ) -> Result<Vector3> {
        if visiting.contains(&handle) {
            return Err(IgesError::Custom(format!("composite curve {} contains itself", handle)));
        }
        visiting.push(handle);

        let entity = self.live_entity(handle)?;
        let curve = entity.as_entity().as_curve().ok_or_else(|| {
            IgesError::Custom(format!("{} is not a curve", entity.as_entity().type_name()))
        })?;

        let segments = curve.segments();
        let local = if segments.is_empty() {
            let point = if at_start { curve.start_point() } else { curve.end_point() };
            point.ok_or_else(|| IgesError::Custom(format!("curve {} has no endpoints", handle)))?
        } else {
            let segment = if at_start { segments.first() } else { segments.last() };
            let child = segment
                .and_then(|link| link.handle())
                .ok_or_else(|| IgesError::Custom(format!("segment of {} is not associated", handle)))?;
            self.curve_point(child, xform, at_start, visiting)?
        };

        visiting.pop();
        if xform {
            Ok(self.transform_matrix(handle)?.apply(local))
        } else {
            Ok(local)
        }
    }

    /// Number of primitive curve segments making up a curve
    pub fn segment_count(&self, handle: Handle) -> Result<usize> {
        self.count_segments(handle, &mut Vec::new())
    }

    fn count_segments(&self, handle: Handle, visiting: &mut Vec<Handle>) -> Result<usize> {
        if visiting.contains(&handle) {
            return Err(IgesError::Custom(format!("composite curve {} contains itself", handle)));
        }
        let entity = self.live_entity(handle)?;
        let curve = entity.as_entity().as_curve().ok_or_else(|| {
            IgesError::Custom(format!("{} is not a curve", entity.as_entity().type_name()))
        })?;
        if curve.segments().is_empty() {
            return Ok(1);
        }

        visiting.push(handle);
        let mut count = 0;
        for link in curve.segments() {
            let child = link
                .handle()
                .ok_or_else(|| IgesError::Custom(format!("segment of {} is not associated", handle)))?;
            count += self.count_segments(child, visiting)?;
        }
        visiting.pop();
        Ok(count)
    }

    /// Number Directory Entries 1, 3, 5, ... in table order
    ///
    /// Returns the sequence number assigned to every handle.
    pub(crate) fn renumber(&mut self) -> AHashMap<Handle, i32> {
        let mut sequences = AHashMap::with_capacity(self.entities.len());
        let mut sequence = 1;
        for (handle, entity) in self.entities.iter_mut() {
            entity.common_mut().sequence = sequence;
            sequences.insert(*handle, sequence);
            sequence += 2;
        }
        self.next_sequence = sequence;
        sequences
    }
}

impl Default for IgesDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Line, Subordinate, TransformationMatrix};
    use crate::types::Matrix3;

    fn line(doc: &mut IgesDocument, x: f64) -> Handle {
        doc.add_entity(EntityType::Line(Line::from_coords(0.0, 0.0, 0.0, x, 0.0, 0.0)))
            .unwrap()
    }

    #[test]
    fn test_sequences_are_fresh() {
        let mut doc = IgesDocument::new();
        let a = line(&mut doc, 1.0);
        let b = doc.new_entity(116, 0).unwrap();
        assert_eq!(doc.get_entity(a).unwrap().common().sequence, 1);
        assert_eq!(doc.get_entity(b).unwrap().common().sequence, 3);
        assert_ne!(a, b);
    }

    #[test]
    fn test_stale_handle() {
        let mut doc = IgesDocument::new();
        let a = line(&mut doc, 1.0);
        doc.delete_entity(a, false).unwrap();
        assert!(matches!(doc.get_entity(a), Err(IgesError::EntityNotFound(_))));
        let b = line(&mut doc, 2.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_orphan_flag() {
        let mut doc = IgesDocument::new();
        let a = line(&mut doc, 1.0);
        doc.get_entity_mut(a).unwrap().common_mut().status.subordinate = Subordinate::Independent;
        let b = line(&mut doc, 2.0);
        assert!(!doc.is_orphaned(a).unwrap());
        assert!(doc.is_orphaned(b).unwrap());
    }

    #[test]
    fn test_cull_removes_orphans() {
        let mut doc = IgesDocument::new();
        let keep = line(&mut doc, 1.0);
        doc.get_entity_mut(keep).unwrap().common_mut().status.subordinate = Subordinate::Independent;
        line(&mut doc, 2.0);
        line(&mut doc, 3.0);
        assert_eq!(doc.cull().unwrap(), 2);
        assert_eq!(doc.handles(), vec![keep]);
    }

    #[test]
    fn test_transform_chain() {
        let mut doc = IgesDocument::new();
        let outer = doc
            .add_entity(EntityType::TransformationMatrix(TransformationMatrix::from_transform(
                Transform::from_translation(Vector3::new(0.0, 0.0, 5.0)),
            )))
            .unwrap();
        let inner = doc
            .add_entity(EntityType::TransformationMatrix(TransformationMatrix::from_transform(
                Transform::new(Matrix3::rotation_z(std::f64::consts::FRAC_PI_2), Vector3::ZERO),
            )))
            .unwrap();
        doc.set_transform(inner, Some(outer)).unwrap();
        let l = line(&mut doc, 1.0);
        doc.set_transform(l, Some(inner)).unwrap();

        let end = doc.curve_end_point(l, true).unwrap();
        assert!(end.approx_eq(&Vector3::new(0.0, 1.0, 5.0), 1e-12));
        let raw = doc.curve_end_point(l, false).unwrap();
        assert_eq!(raw, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_change_units() {
        let mut doc = IgesDocument::new();
        let l = line(&mut doc, 2.0);
        doc.change_units(Unit::Centimeter).unwrap();
        assert_eq!(doc.global.unit, Unit::Centimeter);
        let end = doc.curve_end_point(l, false).unwrap();
        assert!(end.approx_eq(&Vector3::new(0.2, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn test_rescale_rejects_zero() {
        let mut doc = IgesDocument::new();
        assert!(doc.rescale(0.0).is_err());
        assert!(doc.rescale(f64::NAN).is_err());
    }

    #[test]
    fn test_add_entity_with_pending_link_rejected() {
        let mut doc = IgesDocument::new();
        let mut l = Line::new();
        l.common.transform = Some(Link::Pending(3));
        assert!(doc.add_entity(EntityType::Line(l)).is_err());
        assert_eq!(doc.entity_count(), 0);
    }
}
