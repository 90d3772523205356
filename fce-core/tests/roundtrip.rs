//! Codec round-trip and validation properties.

mod common;

use common::{build_car, part_geometry, CAR_PARTS};
use fce_core::{decode, encode, sniff_version, validate, FceError, FceVersion, Mesh};
use glam::Vec3;

const ALL_VERSIONS: [FceVersion; 3] = [FceVersion::Fce3, FceVersion::Fce4, FceVersion::Fce4M];

#[test]
fn test_encode_decode_encode_is_byte_identical() {
    for version in ALL_VERSIONS {
        let mut mesh = build_car();
        let first = encode(&mut mesh, version, false).unwrap();
        let mut decoded = decode(&first).unwrap();
        let second = encode(&mut decoded, version, false).unwrap();
        assert_eq!(first, second, "{version} re-encode diverged");
    }
}

#[test]
fn test_every_output_validates() {
    for version in ALL_VERSIONS {
        let mut mesh = build_car();
        let bytes = encode(&mut mesh, version, false).unwrap();
        assert!(validate(&bytes), "{version} output failed validation");
        assert_eq!(sniff_version(&bytes).unwrap(), version);
    }
}

#[test]
fn test_counts_survive_any_version() {
    let total_verts: usize = CAR_PARTS.iter().map(|p| p.1).sum();
    let total_trias: usize = CAR_PARTS.iter().map(|p| p.2).sum();
    assert_eq!((total_verts, total_trias), (159, 236));

    for version in ALL_VERSIONS {
        let mut mesh = build_car();
        let bytes = encode(&mut mesh, version, false).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.num_parts(), CAR_PARTS.len());
        assert_eq!(decoded.num_vertices(), total_verts);
        assert_eq!(decoded.num_triangles(), total_trias);
        assert!(decoded.is_valid());
        for (rank, &(name, nverts, ntrias)) in CAR_PARTS.iter().enumerate() {
            assert_eq!(decoded.part_name(rank).unwrap(), name);
            assert_eq!(decoded.part_num_vertices(rank).unwrap(), nverts);
            assert_eq!(decoded.part_num_triangles(rank).unwrap(), ntrias);
        }
    }
}

#[test]
fn test_cross_version_encode_is_deterministic() {
    // Take a mesh that went through 4M bytes, encode it to 4; decoding
    // that output and encoding to 4 again must be byte-identical.
    let mut mesh = build_car();
    let bytes_4m = encode(&mut mesh, FceVersion::Fce4M, false).unwrap();
    let mut from_4m = decode(&bytes_4m).unwrap();

    let bytes_4 = encode(&mut from_4m, FceVersion::Fce4, false).unwrap();
    let mut redecoded = decode(&bytes_4).unwrap();
    let bytes_4_again = encode(&mut redecoded, FceVersion::Fce4, false).unwrap();
    assert_eq!(bytes_4, bytes_4_again);
}

#[test]
fn test_truncated_buffer_is_malformed() {
    for version in ALL_VERSIONS {
        let mut mesh = build_car();
        let bytes = encode(&mut mesh, version, false).unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        match decode(truncated) {
            Err(FceError::Malformed(_)) | Err(FceError::UnknownMagic(_)) => {}
            other => panic!("{version} truncation produced {other:?}"),
        }
        assert!(!validate(truncated));
    }
}

#[test]
fn test_oversized_buffer_is_rejected() {
    for version in ALL_VERSIONS {
        let mut mesh = build_car();
        let mut bytes = encode(&mut mesh, version, false).unwrap();
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(
            matches!(decode(&bytes), Err(FceError::Malformed(_))),
            "{version} accepted trailing garbage"
        );
        assert!(!validate(&bytes));
    }
}

#[test]
fn test_cross_part_vertex_reference_is_rejected() {
    // Both header families place the triangle table at 24 * V into the
    // body; corner indices sit 4 bytes into each 56-byte record.
    for version in ALL_VERSIONS {
        let mut mesh = build_car();
        let mut bytes = encode(&mut mesh, version, false).unwrap();
        let nv = mesh.num_vertices();
        let off = version.header_size() + 24 * nv + 0x04;
        // point part 0's first triangle at part 1's first vertex
        bytes[off..off + 4].copy_from_slice(&40i32.to_le_bytes());

        let decoded = decode(&bytes);
        assert!(
            matches!(decoded, Err(FceError::Malformed(_))),
            "{version} accepted a cross-part vertex reference"
        );
        assert_eq!(validate(&bytes), decoded.is_ok(), "{version}");
    }
}

#[test]
fn test_fce4_half_size_gathers_body_parts_beyond_rank_twelve() {
    // Helper parts ahead of the body must not consume the sizing cap.
    let mut mesh = Mesh::new();
    for i in 0..12 {
        mesh.add_part(&format!(":PP{i}"), Vec3::ZERO);
    }
    let (faces, uvs, positions, normals) = part_geometry(6, 4);
    mesh.add_geometry_as_new_part(&faces, &uvs, &positions, &normals)
        .unwrap();
    mesh.set_part_name(12, ":HLFW").unwrap();

    let bytes = encode(&mut mesh, FceVersion::Fce4, false).unwrap();
    let half_x = f32::from_le_bytes(bytes[0x4C..0x50].try_into().unwrap());
    let half_y = f32::from_le_bytes(bytes[0x50..0x54].try_into().unwrap());
    // x spans -1.0..0.25 on the fixture grid; y extents are all zero
    assert_eq!(half_x, 0.625);
    assert_eq!(half_y, -0.02);
}

#[test]
fn test_dummies_and_colors_survive_fce4() {
    let mut mesh = build_car();
    let bytes = encode(&mut mesh, FceVersion::Fce4, false).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.dummy_names(), mesh.dummy_names());
    assert_eq!(decoded.dummy_positions(), mesh.dummy_positions());
    assert_eq!(decoded.colors(), mesh.colors());
}

#[test]
fn test_fce3_mirrors_color_categories() {
    // FCE3 stores primary/secondary only; interior and driver-hair
    // come back as mirrors of those.
    let mut mesh = build_car();
    let bytes = encode(&mut mesh, FceVersion::Fce3, false).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.colors().len(), mesh.colors().len());
    for (got, sent) in decoded.colors().iter().zip(mesh.colors()) {
        assert_eq!(got.primary, sent.primary);
        assert_eq!(got.secondary, sent.secondary);
        assert_eq!(got.interior, sent.secondary);
        assert_eq!(got.driver_hair, sent.primary);
    }
}

#[test]
fn test_fce4_preserves_damage_and_animation() {
    let mut mesh = build_car();
    let bytes = encode(&mut mesh, FceVersion::Fce4, false).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(
        decoded.damaged_positions().unwrap(),
        mesh.damaged_positions().unwrap()
    );
    assert_eq!(
        decoded.animation_flags().unwrap(),
        mesh.animation_flags().unwrap()
    );
}

#[test]
fn test_fce3_drops_damage_and_animation() {
    let mut mesh = build_car();
    let bytes = encode(&mut mesh, FceVersion::Fce3, false).unwrap();
    let decoded = decode(&bytes).unwrap();

    // damage mirrors the undamaged model, animation is cleared
    assert_eq!(
        decoded.damaged_positions().unwrap(),
        decoded.positions().unwrap()
    );
    assert!(decoded.animation_flags().unwrap().iter().all(|&f| f == 0));
}

#[test]
fn test_centering_is_reflected_in_output() {
    let mut plain = build_car();
    let mut centered = build_car();
    let bytes_plain = encode(&mut plain, FceVersion::Fce4, false).unwrap();
    let bytes_centered = encode(&mut centered, FceVersion::Fce4, true).unwrap();
    assert_ne!(bytes_plain, bytes_centered);

    // centering preserves world placement: world vertex positions match
    let a = decode(&bytes_plain).unwrap();
    let b = decode(&bytes_centered).unwrap();
    let world = |mesh: &fce_core::Mesh| -> Vec<f32> {
        let mut out = Vec::new();
        for rank in 0..mesh.num_parts() {
            let pos = mesh.part_pos(rank).unwrap();
            let order = mesh.resolve_order().unwrap();
            let (first, count) = order.part_vertex_range(rank).unwrap();
            let flat = mesh.positions().unwrap();
            for k in first as usize..(first + count) as usize {
                out.push(flat[3 * k] + pos.x);
                out.push(flat[3 * k + 1] + pos.y);
                out.push(flat[3 * k + 2] + pos.z);
            }
        }
        out
    };
    assert_eq!(world(&a), world(&b));
}

#[test]
fn test_encoding_same_mesh_twice_is_stable() {
    let mut mesh = build_car();
    let first = encode(&mut mesh, FceVersion::Fce4M, false).unwrap();
    let second = encode(&mut mesh, FceVersion::Fce4M, false).unwrap();
    assert_eq!(first, second);
}
