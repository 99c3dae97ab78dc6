//! Pointer resolution, reference counting and deletion across a document.

mod common;

use common::builders::{create_sample_document, IgesFileBuilder, RawEntity};
use common::*;
use igesrust::entities::*;
use igesrust::types::Vector3;
use igesrust::{IgesDocument, IgesError, NotificationType};

const LINE_PD: &str = "110,0.,0.,0.,1.,1.,1.;";
const POINT_PD: &str = "116,5.,5.,0.,0;";

// ---------------------------------------------------------------------------
// Resolution on load
// ---------------------------------------------------------------------------

#[test]
fn test_forbidden_structure_pointer_is_cleared() {
    let text = IgesFileBuilder::new()
        .entity(RawEntity::new(116, POINT_PD))
        .entity(RawEntity::new(110, LINE_PD).structure(1))
        .build();

    let doc = read_text(&text).unwrap();
    assert_eq!(doc.entity_count(), 2);

    let line = handles_of_type(&doc, 110)[0];
    let point = handles_of_type(&doc, 116)[0];
    assert_eq!(doc.get_entity(line).unwrap().common().structure, None);
    assert_eq!(doc.get_entity(point).unwrap().common().ref_count(), 0);

    let corruption = doc.notifications.of_type(NotificationType::Corruption);
    assert_eq!(corruption.len(), 1);
    assert_eq!(corruption[0].sequence, Some(3));
}

#[test]
fn test_dangling_pointer_aborts_load() {
    let text = IgesFileBuilder::new()
        .entity(RawEntity::new(110, LINE_PD).transform(9999999))
        .build();

    match read_text(&text) {
        Err(IgesError::DanglingPointer {
            sequence,
            role,
            target,
        }) => {
            assert_eq!(sequence, 1);
            assert_eq!(role, PointerRole::Transform);
            assert_eq!(target, 9999999);
        }
        other => panic!("expected a dangling pointer error, got {other:?}"),
    }
}

#[test]
fn test_dangling_parameter_pointer_aborts_load() {
    let text = IgesFileBuilder::new()
        .entity(RawEntity::new(110, LINE_PD))
        .entity(RawEntity::new(102, "102,2,1,7;"))
        .build();

    let err = read_text(&text).unwrap_err();
    assert!(
        matches!(err, IgesError::DanglingPointer { sequence: 3, target: 7, .. }),
        "got {err:?}"
    );
}

#[test]
fn test_transform_pointer_must_target_matrix() {
    let text = IgesFileBuilder::new()
        .entity(RawEntity::new(116, POINT_PD))
        .entity(RawEntity::new(110, LINE_PD).transform(1))
        .build();

    assert!(matches!(
        read_text(&text),
        Err(IgesError::IllegalAssociation { sequence: 3, role: PointerRole::Transform, .. })
    ));
}

#[test]
fn test_composite_accepts_unsupported_curve_types() {
    let text = IgesFileBuilder::new()
        .entity(RawEntity::new(126, "126,1,1,0,0,1,0,0.,0.,1.,1.,1.,1.,0.,0.,0.,1.,1.,0.,0.,0.,1.;"))
        .entity(RawEntity::new(110, LINE_PD))
        .entity(RawEntity::new(102, "102,2,1,3;").independent())
        .build();

    let doc = read_text(&text).unwrap();
    let spline = handles_of_type(&doc, 126)[0];
    assert_eq!(doc.get_entity(spline).unwrap().common().ref_count(), 1);
}

#[test]
fn test_pointer_to_later_entity_resolves() {
    let text = IgesFileBuilder::new()
        .entity(RawEntity::new(110, LINE_PD).transform(3))
        .entity(RawEntity::new(124, "124,1.,0.,0.,5.,0.,1.,0.,0.,0.,0.,1.,0.;"))
        .build();

    let doc = read_text(&text).unwrap();
    let line = handles_of_type(&doc, 110)[0];
    let end = doc.curve_end_point(line, true).unwrap();
    assert!(end.approx_eq(&Vector3::new(6.0, 1.0, 1.0), 1e-12));
}

// ---------------------------------------------------------------------------
// Reference counting
// ---------------------------------------------------------------------------

#[test]
fn test_orphan_depends_on_subordinate_switch() {
    let mut doc = IgesDocument::new();

    let mut independent = Point::at(Vector3::ZERO);
    independent.common.status.subordinate = Subordinate::Independent;
    let a = doc.add_entity(EntityType::Point(independent)).unwrap();
    let b = doc.add_entity(EntityType::Point(Point::at(Vector3::ZERO))).unwrap();

    assert!(!doc.is_orphaned(a).unwrap());
    assert!(doc.is_orphaned(b).unwrap());
}

#[test]
fn test_ref_count_tracks_distinct_parents() {
    let mut doc = IgesDocument::new();
    let line = doc.new_entity(110, 0).unwrap();
    let parents: Vec<_> = (0..3).map(|_| doc.new_entity(102, 0).unwrap()).collect();
    for parent in &parents {
        doc.add_segment(*parent, line).unwrap();
    }
    doc.add_segment(parents[0], line).unwrap();

    assert_eq!(doc.get_entity(line).unwrap().common().ref_count(), 3);
    assert_eq!(doc.get_entity(line).unwrap().common().edge_count(parents[0]), 2);

    doc.unlink(parents[1], line).unwrap();
    assert_eq!(doc.get_entity(line).unwrap().common().ref_count(), 2);
    doc.unlink(parents[0], line).unwrap();
    doc.unlink(parents[2], line).unwrap();
    assert_eq!(doc.get_entity(line).unwrap().common().ref_count(), 0);
    assert!(doc.is_orphaned(line).unwrap());
}

#[test]
fn test_added_clone_starts_without_parents() {
    let (mut doc, h) = create_sample_document();
    let copy = doc.get_entity(h.line_a).unwrap().clone();
    assert_eq!(copy.common().ref_count(), 1);

    let added = doc.add_entity(copy).unwrap();
    assert_eq!(doc.get_entity(added).unwrap().common().ref_count(), 0);
    assert!(doc.is_orphaned(added).unwrap());
    assert_eq!(doc.get_entity(h.matrix).unwrap().common().ref_count(), 2);
    assert_eq!(doc.get_entity(h.color).unwrap().common().ref_count(), 2);

    doc.delete_entity(added, false).unwrap();
    assert_eq!(doc.get_entity(h.matrix).unwrap().common().ref_count(), 1);
}

#[test]
fn test_del_reference_of_non_member_is_noop() {
    let mut doc = IgesDocument::new();
    let line = doc.new_entity(110, 0).unwrap();
    let other = doc.new_entity(110, 0).unwrap();
    let common = doc.get_entity_mut(line).unwrap().common_mut();
    assert!(!common.del_reference(other));
    assert_eq!(common.ref_count(), 0);
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[test]
fn test_delete_refused_until_parents_unlinked() {
    let mut doc = IgesDocument::new();
    let matrix = doc.new_entity(124, 0).unwrap();
    let first = doc.new_entity(110, 0).unwrap();
    let second = doc.new_entity(110, 0).unwrap();
    doc.set_transform(first, Some(matrix)).unwrap();
    doc.set_transform(second, Some(matrix)).unwrap();

    assert!(matches!(
        doc.delete_entity(matrix, false),
        Err(IgesError::EntityReferenced { count: 2, .. })
    ));

    assert_eq!(doc.unlink(first, matrix).unwrap(), 1);
    assert!(matches!(
        doc.delete_entity(matrix, false),
        Err(IgesError::EntityReferenced { count: 1, .. })
    ));

    assert_eq!(doc.unlink(second, matrix).unwrap(), 1);
    doc.delete_entity(matrix, false).unwrap();
    assert!(matches!(doc.get_entity(matrix), Err(IgesError::EntityNotFound(_))));
    assert_eq!(doc.get_entity(first).unwrap().common().transform, None);
}

#[test]
fn test_cascade_delete_clears_parent_pointers() {
    let (mut doc, h) = create_sample_document();
    doc.delete_entity(h.line_b, true).unwrap();

    match doc.get_entity(h.curve).unwrap() {
        EntityType::CompositeCurve(curve) => assert_eq!(curve.segments, vec![Link::Bound(h.line_a)]),
        other => panic!("expected a composite curve, got {other:?}"),
    }
    assert_eq!(doc.segment_count(h.curve).unwrap(), 1);
}

#[test]
fn test_cascade_delete_removes_orphaned_children() {
    let (mut doc, h) = create_sample_document();
    doc.delete_entity(h.instance, true).unwrap();

    // everything below the instance was dependent and is now unreferenced
    assert_eq!(doc.entity_count(), 0);
    for handle in [h.definition, h.curve, h.point, h.line_a, h.line_b, h.matrix, h.color] {
        assert!(doc.get_entity(handle).is_err());
    }
}

#[test]
fn test_deleting_child_keeps_shared_parentless_siblings() {
    let (mut doc, h) = create_sample_document();
    let independent = doc.new_entity(110, 0).unwrap();
    doc.get_entity_mut(independent).unwrap().common_mut().status.subordinate = Subordinate::Independent;
    doc.set_transform(independent, Some(h.matrix)).unwrap();

    doc.delete_entity(h.instance, true).unwrap();
    assert!(doc.get_entity(h.matrix).is_ok());
    assert_eq!(doc.get_entity(h.matrix).unwrap().common().ref_count(), 1);
    assert_eq!(doc.entity_count(), 2);
}

#[test]
fn test_cull_after_unlink() {
    let (mut doc, h) = create_sample_document();
    assert_eq!(doc.cull().unwrap(), 0);

    doc.unlink(h.definition, h.point).unwrap();
    assert_eq!(doc.cull().unwrap(), 1);
    assert!(doc.get_entity(h.point).is_err());
}

// ---------------------------------------------------------------------------
// Rescaling
// ---------------------------------------------------------------------------

#[test]
fn test_rescale_then_inverse_restores_geometry() {
    let (mut doc, h) = create_sample_document();
    let start = doc.curve_start_point(h.curve, true).unwrap();
    let end = doc.curve_end_point(h.curve, true).unwrap();

    let factor = 3.7;
    doc.rescale(factor).unwrap();
    let scaled = doc.curve_end_point(h.curve, false).unwrap();
    assert!(scaled.approx_eq(&(Vector3::new(10.0, 5.0, 0.0) * factor), 1e-12));

    doc.rescale(1.0 / factor).unwrap();
    assert!(doc.curve_start_point(h.curve, true).unwrap().approx_eq(&start, 1e-9));
    assert!(doc.curve_end_point(h.curve, true).unwrap().approx_eq(&end, 1e-9));
    match doc.get_entity(h.instance).unwrap() {
        EntityType::SubfigureInstance(i) => {
            assert!(i.translation.approx_eq(&Vector3::new(100.0, 0.0, 0.0), 1e-9));
            assert_eq!(i.scale, 2.0);
        }
        other => panic!("expected a subfigure instance, got {other:?}"),
    }
}

#[test]
fn test_curve_queries() {
    let (doc, h) = create_sample_document();
    assert_eq!(doc.segment_count(h.curve).unwrap(), 2);
    assert_eq!(doc.segment_count(h.line_a).unwrap(), 1);
    assert_eq!(doc.curve_end_point(h.curve, false).unwrap(), Vector3::new(10.0, 5.0, 0.0));
    assert!(doc.curve_start_point(h.point, false).is_err());
}
