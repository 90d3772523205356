//! Shared test fixtures, built programmatically.
//!
//! Coordinates and texture coordinates are exact binary fractions so
//! byte-identity assertions are not disturbed by rounding.

use fce_core::{ColorSet, Mesh};
use glam::Vec3;

/// Part layout of the car fixture: 5 parts, 159 vertices, 236
/// triangles in total.
pub const CAR_PARTS: &[(&str, usize, usize)] = &[
    (":HB", 40, 60),
    (":OT", 40, 60),
    (":OL", 40, 60),
    (":OC", 30, 50),
    (":OD", 9, 6),
];

/// Deterministic vertex position on an exact grid.
fn grid_pos(i: usize) -> [f32; 3] {
    [
        (i % 8) as f32 * 0.25 - 1.0,
        ((i / 8) % 8) as f32 * 0.125,
        (i / 64) as f32 * 0.5 - 2.0,
    ]
}

/// Build one part's raw geometry arrays.
pub fn part_geometry(nverts: usize, ntrias: usize) -> (Vec<u32>, Vec<f32>, Vec<f32>, Vec<f32>) {
    let mut positions = Vec::with_capacity(3 * nverts);
    let mut normals = Vec::with_capacity(3 * nverts);
    for i in 0..nverts {
        positions.extend_from_slice(&grid_pos(i));
        normals.extend_from_slice(&[0.0, 1.0, 0.0]);
    }
    let mut faces = Vec::with_capacity(3 * ntrias);
    let mut uvs = Vec::with_capacity(6 * ntrias);
    for t in 0..ntrias {
        faces.push((t % nverts) as u32);
        faces.push(((t * 7 + 1) % nverts) as u32);
        faces.push(((t * 3 + 2) % nverts) as u32);
        for corner in 0..3 {
            uvs.push(((t + corner) % 4) as f32 * 0.25);
            uvs.push(((t + 2 * corner) % 8) as f32 * 0.125);
        }
    }
    (faces, uvs, positions, normals)
}

/// The 5-part/159-vertex/236-triangle car fixture with dummies,
/// colors, mixed flags, and a distinct damage model.
pub fn build_car() -> Mesh {
    let mut mesh = Mesh::new();
    for (rank, &(name, nverts, ntrias)) in CAR_PARTS.iter().enumerate() {
        let (faces, uvs, positions, normals) = part_geometry(nverts, ntrias);
        mesh.add_geometry_as_new_part(&faces, &uvs, &positions, &normals)
            .unwrap();
        mesh.set_part_name(rank, name).unwrap();
        mesh.set_part_pos(rank, Vec3::new(0.5, -0.25 * rank as f32, 1.0))
            .unwrap();
    }

    // non-default flags and texture pages on the body part
    let ntrias = mesh.part_num_triangles(0).unwrap();
    let flags: Vec<u32> = (0..ntrias).map(|t| if t % 5 == 0 { 0x00A } else { 0 }).collect();
    mesh.set_triangle_flags(0, &flags).unwrap();
    let pages: Vec<i32> = (0..ntrias).map(|t| (t % 2) as i32).collect();
    mesh.set_triangle_texpages(0, &pages).unwrap();

    // shift the damage model so the FCE4 damage tables differ
    let mut damaged = mesh.damaged_positions().unwrap();
    for v in damaged.iter_mut().skip(1).step_by(3) {
        *v -= 0.125;
    }
    mesh.set_damaged_positions(&damaged).unwrap();

    // a few fixed vertices
    let mut anim = mesh.animation_flags().unwrap();
    for flag in anim.iter_mut().step_by(10) {
        *flag = 0x4;
    }
    mesh.set_animation_flags(&anim).unwrap();

    mesh.set_dummy_names(&[":SMOKE".into(), ":HFLO".into()])
        .unwrap();
    mesh.set_dummy_positions(&[0.0, 0.5, -1.75, 0.25, 0.375, 1.5])
        .unwrap();

    let mut slot_a = ColorSet::default();
    slot_a.primary.hue = 120;
    slot_a.primary.saturation = 200;
    slot_a.primary.brightness = 128;
    slot_a.secondary.hue = 30;
    slot_a.interior.brightness = 90;
    slot_a.driver_hair.hue = 15;
    let mut slot_b = ColorSet::default();
    slot_b.primary.hue = 240;
    slot_b.secondary.transparency = 127;
    mesh.set_colors(&[slot_a, slot_b]).unwrap();

    assert!(mesh.is_valid());
    mesh
}
