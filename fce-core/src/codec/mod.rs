//! FCE binary codec
//!
//! Version dispatch plus the pieces shared by both header families:
//! little-endian field access, fixed-slot name tables, the 56-byte
//! triangle record, half-size extents, and the encode-side part
//! centering pass.
//!
//! Layout contracts live in [`fce3`] and [`fce4`]; all offsets are
//! byte-exact and re-encoding an unmodified decoded mesh reproduces
//! codec output bit for bit.

pub mod fce3;
pub mod fce4;

use glam::Vec3;
use tracing::debug;

use crate::error::{FceError, Result};
use crate::mesh::Mesh;
use crate::version::{sniff_version, FceVersion};

/// Part name tokens that contribute to FCE4 bounding half-extents.
/// High-detail body, option, and wheel parts; anything else (damage
/// models, mid/low detail) is excluded from the extent gather.
const FCE4_HI_BODY_PARTS: &[&str] = &[
    ":HB", ":OT", ":OL", ":OS", ":OLB", ":ORB", ":OLM", ":ORM", ":OC", ":ODL", ":OH", ":OD",
    ":OND", ":HLFW", ":HRFW", ":HLMW", ":HRMW", ":HLRW", ":HRRW",
];

/// Cap on qualifying parts gathered into the FCE4-family half-size
/// extents; also bounds the encode-time centering pass.
const MAX_SIZED_PARTS: usize = 12;
/// FCE3 sizes only the leading body parts.
const MAX_SIZED_PARTS_FCE3: usize = 5;

/// Decode an FCE buffer into a mesh. The version is sniffed from the
/// header prefix; a structural error leaves no mesh behind.
pub fn decode(bytes: &[u8]) -> Result<Mesh> {
    match sniff_version(bytes)? {
        FceVersion::Fce3 => fce3::decode(bytes),
        version => fce4::decode(bytes, version),
    }
}

/// Encode a mesh for the chosen version.
///
/// `center_parts` re-centers the leading parts on their vertex
/// centroids before layout, mutating the mesh the same way the output
/// describes it. Encoding is deterministic for identical mesh state
/// and flags.
pub fn encode(mesh: &mut Mesh, version: FceVersion, center_parts: bool) -> Result<Vec<u8>> {
    if mesh.num_parts() > crate::mesh::part::MAX_PARTS {
        return Err(FceError::OutOfRange {
            what: "part count",
            value: mesh.num_parts(),
            limit: crate::mesh::part::MAX_PARTS + 1,
        });
    }
    if center_parts {
        let count = mesh.num_parts().min(MAX_SIZED_PARTS);
        for rank in 0..count {
            let id = mesh.part_id_by_rank(rank)?;
            mesh.center_part(id)?;
        }
    }
    let bytes = match version {
        FceVersion::Fce3 => fce3::encode(mesh)?,
        FceVersion::Fce4 | FceVersion::Fce4M => fce4::encode(mesh, version)?,
    };
    debug!(
        %version,
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        size = bytes.len(),
        "encoded mesh"
    );
    Ok(bytes)
}

/// Structural self-check: true iff `decode` would accept the buffer.
/// Runs the full validation path without materializing a mesh.
pub fn validate(bytes: &[u8]) -> bool {
    match sniff_version(bytes) {
        Ok(FceVersion::Fce3) => fce3::check(bytes).is_ok(),
        Ok(version) => fce4::check(bytes, version).is_ok(),
        Err(_) => false,
    }
}

// --- little-endian field access ------------------------------------------

pub(crate) fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

pub(crate) fn read_i32(buf: &[u8], off: usize) -> i32 {
    i32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

pub(crate) fn read_f32(buf: &[u8], off: usize) -> f32 {
    f32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

pub(crate) fn read_vec3(buf: &[u8], off: usize) -> Vec3 {
    Vec3::new(
        read_f32(buf, off),
        read_f32(buf, off + 4),
        read_f32(buf, off + 8),
    )
}

pub(crate) fn write_u32(buf: &mut [u8], off: usize, value: u32) {
    buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_i32(buf: &mut [u8], off: usize, value: i32) {
    buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_f32(buf: &mut [u8], off: usize, value: f32) {
    buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_vec3(buf: &mut [u8], off: usize, value: Vec3) {
    write_f32(buf, off, value.x);
    write_f32(buf, off + 4, value.y);
    write_f32(buf, off + 8, value.z);
}

// --- fixed-slot name tables ----------------------------------------------

/// Read a NUL-terminated name from a fixed slot, truncating at the
/// first unprintable byte as the reference tooling does.
pub(crate) fn read_name(slot: &[u8]) -> String {
    let end = slot
        .iter()
        .position(|&b| !(0x20..0x7F).contains(&b))
        .unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

/// Write a name into a fixed slot, NUL padded. Names longer than the
/// slot allows are a setter-level error; here the name is clamped.
pub(crate) fn write_name(slot: &mut [u8], name: &str) {
    let bytes = name.as_bytes();
    let n = bytes.len().min(slot.len() - 1);
    slot[..n].copy_from_slice(&bytes[..n]);
    slot[n..].fill(0);
}

// --- triangle record ------------------------------------------------------

/// One 56-byte wire triangle record, shared by every version.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TriangleRecord {
    pub tex_page: i32,
    /// Part-local vertex indices.
    pub vidx: [i32; 3],
    pub flag: u32,
    pub u: [f32; 3],
    pub v: [f32; 3],
}

impl TriangleRecord {
    pub const SIZE: usize = 56;
    /// Value of the three padding words between the indices and the
    /// flag; fixed in every known asset.
    const PADDING_WORD: i32 = 0xFF00;

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            tex_page: read_i32(buf, 0x00),
            vidx: [read_i32(buf, 0x04), read_i32(buf, 0x08), read_i32(buf, 0x0C)],
            flag: read_u32(buf, 0x1C),
            u: [read_f32(buf, 0x20), read_f32(buf, 0x24), read_f32(buf, 0x28)],
            v: [read_f32(buf, 0x2C), read_f32(buf, 0x30), read_f32(buf, 0x34)],
        })
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        write_i32(&mut bytes, 0x00, self.tex_page);
        write_i32(&mut bytes, 0x04, self.vidx[0]);
        write_i32(&mut bytes, 0x08, self.vidx[1]);
        write_i32(&mut bytes, 0x0C, self.vidx[2]);
        write_i32(&mut bytes, 0x10, Self::PADDING_WORD);
        write_i32(&mut bytes, 0x14, Self::PADDING_WORD);
        write_i32(&mut bytes, 0x18, Self::PADDING_WORD);
        write_u32(&mut bytes, 0x1C, self.flag);
        write_f32(&mut bytes, 0x20, self.u[0]);
        write_f32(&mut bytes, 0x24, self.u[1]);
        write_f32(&mut bytes, 0x28, self.u[2]);
        write_f32(&mut bytes, 0x2C, self.v[0]);
        write_f32(&mut bytes, 0x30, self.v[1]);
        write_f32(&mut bytes, 0x34, self.v[2]);
        bytes
    }
}

// --- half-size extents ----------------------------------------------------

/// Bounding half-extents written into the header, computed from the
/// world-space vertex positions of the version's sizing part set.
pub(crate) fn half_sizes(mesh: &Mesh, version: FceVersion) -> Result<[f32; 3]> {
    let limit = match version {
        FceVersion::Fce3 => MAX_SIZED_PARTS_FCE3,
        FceVersion::Fce4 | FceVersion::Fce4M => MAX_SIZED_PARTS,
    };
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    let mut gathered = false;
    let mut sized = 0usize;

    for rank in 0..mesh.num_parts() {
        if sized == limit {
            break;
        }
        let part = mesh.part_by_rank(rank)?;
        // only qualifying parts count toward the cap; FCE4 wheels sit
        // well past rank 12 in canonical part order
        if version == FceVersion::Fce4 && !FCE4_HI_BODY_PARTS.contains(&part.name.as_str()) {
            continue;
        }
        sized += 1;
        for &vid in &part.vertices {
            let world = mesh.store().vertex(vid)?.pos + part.pos;
            min = min.min(world);
            max = max.max(world);
            gathered = true;
        }
    }
    if !gathered {
        return Ok([0.0; 3]);
    }
    Ok([
        0.5 * (max.x - min.x).abs(),
        min.y.abs() - 0.02,
        0.5 * (max.z - min.z).abs(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_record_roundtrip() {
        let record = TriangleRecord {
            tex_page: 2,
            vidx: [0, 5, 9],
            flag: 0x00A,
            u: [0.0, 0.5, 1.0],
            v: [0.25, 0.75, 0.125],
        };
        let bytes = record.to_bytes();
        assert_eq!(read_i32(&bytes, 0x10), 0xFF00);
        let back = TriangleRecord::from_bytes(&bytes).unwrap();
        assert_eq!(back.tex_page, 2);
        assert_eq!(back.vidx, [0, 5, 9]);
        assert_eq!(back.flag, 0x00A);
        assert_eq!(back.u, record.u);
        assert_eq!(back.v, record.v);
    }

    #[test]
    fn test_triangle_record_insufficient_bytes() {
        assert!(TriangleRecord::from_bytes(&[0u8; 55]).is_none());
    }

    #[test]
    fn test_name_slot_roundtrip() {
        let mut slot = [0xAAu8; 64];
        write_name(&mut slot, ":HB");
        assert_eq!(read_name(&slot), ":HB");
        assert_eq!(&slot[3..], &[0u8; 61][..]);
    }

    #[test]
    fn test_name_truncates_at_unprintable() {
        let mut slot = [0u8; 16];
        slot[..5].copy_from_slice(b"ab\x01cd");
        assert_eq!(read_name(&slot), "ab");
    }
}
