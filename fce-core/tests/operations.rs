//! Part and triangle operation semantics.

mod common;

use common::{build_car, part_geometry};
use fce_core::{FceError, Mesh};
use glam::Vec3;

#[test]
fn test_merge_then_gc_reduces_part_count_by_one() {
    let mut mesh = build_car();
    let parts_before = mesh.num_parts();
    let trias_a = mesh.part_num_triangles(0).unwrap();
    let trias_b = mesh.part_num_triangles(1).unwrap();

    let a = mesh.part_id_by_rank(0).unwrap();
    let b = mesh.part_id_by_rank(1).unwrap();
    let merged = mesh.merge_parts(a, b).unwrap();
    mesh.garbage_collect_vertices();

    assert_eq!(mesh.num_parts(), parts_before - 1);
    let merged_rank = mesh.rank_of(merged).unwrap();
    assert_eq!(merged_rank, mesh.num_parts() - 1);
    assert_eq!(
        mesh.part_num_triangles(merged_rank).unwrap(),
        trias_a + trias_b
    );
    assert_eq!(mesh.part_pos(merged_rank).unwrap(), Vec3::ZERO);
    assert!(mesh.is_valid());
}

#[test]
fn test_merge_bakes_world_placement() {
    let mut mesh = Mesh::new();
    let (faces, uvs, positions, normals) = part_geometry(6, 4);
    mesh.add_geometry_as_new_part(&faces, &uvs, &positions, &normals)
        .unwrap();
    mesh.add_geometry_as_new_part(&faces, &uvs, &positions, &normals)
        .unwrap();
    mesh.set_part_pos(0, Vec3::new(1.0, 0.0, 0.0)).unwrap();
    mesh.set_part_pos(1, Vec3::new(0.0, 2.0, 0.0)).unwrap();

    let a = mesh.part_id_by_rank(0).unwrap();
    let b = mesh.part_id_by_rank(1).unwrap();
    mesh.merge_parts(a, b).unwrap();

    // merged part sits at the origin with positions baked
    let flat = mesh.positions().unwrap();
    assert_eq!(flat[0], positions[0] + 1.0);
    assert_eq!(flat[3 * 6 + 1], positions[1] + 2.0);
    assert_eq!(mesh.part_name(0).unwrap(), "0_1");
}

#[test]
fn test_merge_rejects_same_part() {
    let mut mesh = build_car();
    let a = mesh.part_id_by_rank(0).unwrap();
    assert!(matches!(
        mesh.merge_parts(a, a),
        Err(FceError::InvalidReference { .. })
    ));
    assert_eq!(mesh.num_parts(), 5);
}

#[test]
fn test_gc_is_idempotent() {
    let mut mesh = build_car();
    let a = mesh.part_id_by_rank(4).unwrap();
    mesh.delete_triangles_in_part(a, &[0, 1, 2, 3, 4, 5]).unwrap();
    let removed = mesh.garbage_collect_vertices();
    assert!(removed > 0);
    let verts_after = mesh.num_vertices();
    assert_eq!(mesh.garbage_collect_vertices(), 0);
    assert_eq!(mesh.num_vertices(), verts_after);
}

#[test]
fn test_resolved_ranges_partition_totals() {
    let mut mesh = build_car();
    // perturb the structure first
    let a = mesh.part_id_by_rank(0).unwrap();
    mesh.copy_part(a).unwrap();
    let b = mesh.part_id_by_rank(2).unwrap();
    mesh.move_part(b, 0).unwrap();

    let order = mesh.resolve_order().unwrap();
    let mut vnext = 0u32;
    let mut tnext = 0u32;
    for rank in 0..mesh.num_parts() {
        let (vfirst, vcount) = order.part_vertex_range(rank).unwrap();
        let (tfirst, tcount) = order.part_triangle_range(rank).unwrap();
        assert_eq!(vfirst, vnext);
        assert_eq!(tfirst, tnext);
        vnext += vcount;
        tnext += tcount;
    }
    assert_eq!(vnext as usize, mesh.num_vertices());
    assert_eq!(tnext as usize, mesh.num_triangles());
}

#[test]
fn test_copy_part_is_deep() {
    let mut mesh = build_car();
    let src = mesh.part_id_by_rank(1).unwrap();
    let verts_before = mesh.num_vertices();
    let copy = mesh.copy_part(src).unwrap();

    let copy_rank = mesh.rank_of(copy).unwrap();
    assert_eq!(copy_rank, mesh.num_parts() - 1);
    assert_eq!(mesh.part_name(copy_rank).unwrap(), ":OT");
    assert_eq!(mesh.num_vertices(), verts_before + 40);

    // editing the copy leaves the source untouched
    let flags = vec![0x7FFu32; mesh.part_num_triangles(copy_rank).unwrap()];
    mesh.set_triangle_flags(copy_rank, &flags).unwrap();
    assert!(mesh
        .triangle_flags(1)
        .unwrap()
        .iter()
        .any(|&f| f != 0x7FF));
    assert!(mesh.is_valid());
}

#[test]
fn test_move_part_adjacent_swaps() {
    let mut mesh = build_car();
    let id = mesh.part_id_by_rank(3).unwrap();
    mesh.move_part(id, 0).unwrap();
    assert_eq!(mesh.part_name(0).unwrap(), ":OC");
    // everyone else keeps relative order
    assert_eq!(mesh.part_name(1).unwrap(), ":HB");
    assert_eq!(mesh.part_name(2).unwrap(), ":OT");
    assert_eq!(mesh.part_name(3).unwrap(), ":OL");
    assert_eq!(mesh.part_name(4).unwrap(), ":OD");

    mesh.move_part(id, 4).unwrap();
    assert_eq!(mesh.part_name(4).unwrap(), ":OC");

    assert!(matches!(
        mesh.move_part(id, 5),
        Err(FceError::OutOfRange { .. })
    ));
}

#[test]
fn test_delete_triangles_by_part_local_index() {
    let mut mesh = build_car();
    let id = mesh.part_id_by_rank(0).unwrap();
    let before = mesh.part_num_triangles(0).unwrap();
    mesh.delete_triangles_in_part(id, &[0, 2, 4]).unwrap();
    assert_eq!(mesh.part_num_triangles(0).unwrap(), before - 3);
    // vertices stay until the explicit GC pass
    assert_eq!(mesh.num_vertices(), 159);
    assert!(mesh.is_valid());

    // out-of-range index fails without mutating
    let count = mesh.part_num_triangles(0).unwrap();
    assert!(matches!(
        mesh.delete_triangles_in_part(id, &[0, count]),
        Err(FceError::OutOfRange { .. })
    ));
    assert_eq!(mesh.part_num_triangles(0).unwrap(), count);
}

#[test]
fn test_delete_part_detaches_triangles() {
    let mut mesh = build_car();
    let id = mesh.part_id_by_rank(4).unwrap();
    let detached = mesh.delete_part(id).unwrap();
    assert_eq!(detached.len(), 6);
    assert_eq!(mesh.num_parts(), 4);

    // detached triangles still pin their vertices in the store
    let removed_while_detached = {
        let mut probe = mesh.clone();
        probe.garbage_collect_vertices()
    };
    for tid in detached {
        mesh.remove_triangle(tid).unwrap();
    }
    let removed_after = mesh.garbage_collect_vertices();
    // the deleted part's 6 triangles referenced 8 of its 9 vertices;
    // those only become collectable once the triangles are gone
    assert_eq!(removed_after, removed_while_detached + 8);
    assert!(mesh.is_valid());
}

#[test]
fn test_center_part_preserves_world_placement() {
    let mut mesh = build_car();
    let id = mesh.part_id_by_rank(2).unwrap();
    let pos_before = mesh.part_pos(2).unwrap();
    let flat_before = mesh.positions().unwrap();
    let order = mesh.resolve_order().unwrap();
    let (first, count) = order.part_vertex_range(2).unwrap();

    mesh.center_part(id).unwrap();

    let pos_after = mesh.part_pos(2).unwrap();
    let flat_after = mesh.positions().unwrap();
    assert_ne!(pos_before, pos_after);
    for k in first as usize..(first + count) as usize {
        for axis in 0..3 {
            let before = flat_before[3 * k + axis] + pos_before[axis];
            let after = flat_after[3 * k + axis] + pos_after[axis];
            assert_eq!(before, after);
        }
    }
}

#[test]
fn test_set_part_center_shifts_damage_model_too() {
    let mut mesh = build_car();
    let id = mesh.part_id_by_rank(0).unwrap();
    let damaged_before = mesh.damaged_positions().unwrap();
    mesh.set_part_center(id, Vec3::new(0.25, 0.0, 0.0)).unwrap();
    let damaged_after = mesh.damaged_positions().unwrap();
    assert_ne!(damaged_before[0], damaged_after[0]);
}

#[test]
fn test_add_geometry_validation() {
    let mut mesh = Mesh::new();
    let (faces, uvs, positions, normals) = part_geometry(6, 4);

    // face index out of range
    let mut bad_faces = faces.clone();
    bad_faces[0] = 6;
    assert!(matches!(
        mesh.add_geometry_as_new_part(&bad_faces, &uvs, &positions, &normals),
        Err(FceError::MalformedGeometry(_))
    ));

    // mismatched normal length
    assert!(matches!(
        mesh.add_geometry_as_new_part(&faces, &uvs, &positions, &normals[..normals.len() - 3]),
        Err(FceError::MalformedGeometry(_))
    ));

    // mismatched uv length
    assert!(matches!(
        mesh.add_geometry_as_new_part(&faces, &uvs[..uvs.len() - 1], &positions, &normals),
        Err(FceError::MalformedGeometry(_))
    ));

    assert_eq!(mesh.num_parts(), 0);
    let id = mesh
        .add_geometry_as_new_part(&faces, &uvs, &positions, &normals)
        .unwrap();
    assert_eq!(mesh.rank_of(id).unwrap(), 0);
    assert_eq!(mesh.part_name(0).unwrap(), "FromGeomData_0");
}

#[test]
fn test_bulk_setter_length_validation() {
    let mut mesh = build_car();
    assert!(matches!(
        mesh.set_positions(&[0.0; 10]),
        Err(FceError::OutOfRange { .. })
    ));
    assert!(matches!(
        mesh.set_triangle_flags(0, &[0; 3]),
        Err(FceError::OutOfRange { .. })
    ));
    assert!(matches!(
        mesh.set_dummy_positions(&[0.0; 5]),
        Err(FceError::OutOfRange { .. })
    ));

    let flat = mesh.positions().unwrap();
    mesh.set_positions(&flat).unwrap();
}

#[test]
fn test_add_empty_helper_part() {
    let mut mesh = build_car();
    let id = mesh.add_part(":PPLFwheel", Vec3::new(0.5, 0.0, 0.5));
    let rank = mesh.rank_of(id).unwrap();
    assert_eq!(rank, 5);
    assert_eq!(mesh.part_num_vertices(rank).unwrap(), 0);
    assert_eq!(mesh.part_num_triangles(rank).unwrap(), 0);
    assert!(mesh.is_valid());
}
