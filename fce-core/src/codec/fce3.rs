//! FCE3 layout (no version word, no damage tables)
//!
//! # Layout
//! ```text
//! 0x0000: Unknown1 u32
//! 0x0004: NumTriangles u32
//! 0x0008: NumVertices u32
//! 0x000C: NumArts u32 (always 1 on encode)
//! 0x0010: VertTblOffset u32   (area offsets relative to header end;
//! 0x0014: NormTblOffset u32    area sizes 12V, 12V, 56T, 32V, 12V, 12V)
//! 0x0018: TriaTblOffset u32
//! 0x001C: Reserve1Offset u32
//! 0x0020: Reserve2Offset u32
//! 0x0024: Reserve3Offset u32
//! 0x0028: HalfSize f32 x3
//! 0x0034: NumDummies u32
//! 0x0038: DummyPos f32 x3 x16
//! 0x00F8: NumParts u32
//! 0x00FC: PartPos f32 x3 x64
//! 0x03FC: P1stVertices u32 x64
//! 0x04FC: PNumVertices u32 x64
//! 0x05FC: P1stTriangles u32 x64
//! 0x06FC: PNumTriangles u32 x64
//! 0x07FC: NumPriColors u32
//! 0x0800: PriColors (h,s,b,t each one u32) x16
//! 0x0900: NumSecColors u32
//! 0x0904: SecColors x16
//! 0x0A04: DummyNames 64 bytes x16
//! 0x0E04: PartNames 64 bytes x64
//! 0x1E04: Unknown2 256 bytes (zeroed)
//! ```
//! Total file size: `0x1F04 + 80 * V + 56 * T`.

use glam::Vec3;
use tracing::debug;

use crate::codec::{
    half_sizes, read_f32, read_name, read_u32, read_vec3, write_f32, write_name, write_u32,
    write_vec3, TriangleRecord,
};
use crate::error::{FceError, Result};
use crate::mesh::part::MAX_PARTS;
use crate::mesh::store::{Triangle, Vertex, VertexId};
use crate::mesh::{Color, ColorSet, Dummy, Mesh, MAX_COLORS, MAX_DUMMIES};
use crate::version::FceVersion;

/// FCE3 fixed header.
#[derive(Debug, Clone)]
pub(crate) struct Fce3Header {
    pub unknown1: u32,
    pub num_triangles: u32,
    pub num_vertices: u32,
    pub num_arts: u32,
    pub vert_tbl_offset: u32,
    pub norm_tbl_offset: u32,
    pub tria_tbl_offset: u32,
    pub reserve1_offset: u32,
    pub reserve2_offset: u32,
    pub reserve3_offset: u32,
    pub half_size: [f32; 3],
    pub num_dummies: u32,
    pub dummy_pos: [Vec3; 16],
    pub num_parts: u32,
    pub part_pos: [Vec3; 64],
    pub first_vertex: [u32; 64],
    pub num_part_vertices: [u32; 64],
    pub first_triangle: [u32; 64],
    pub num_part_triangles: [u32; 64],
    pub num_pri_colors: u32,
    pub pri_colors: [[u32; 4]; 16],
    pub num_sec_colors: u32,
    pub sec_colors: [[u32; 4]; 16],
    pub dummy_names: [[u8; 64]; 16],
    pub part_names: [[u8; 64]; 64],
}

impl Fce3Header {
    pub const SIZE: usize = 0x1F04;

    fn zeroed() -> Self {
        Self {
            unknown1: 0,
            num_triangles: 0,
            num_vertices: 0,
            num_arts: 0,
            vert_tbl_offset: 0,
            norm_tbl_offset: 0,
            tria_tbl_offset: 0,
            reserve1_offset: 0,
            reserve2_offset: 0,
            reserve3_offset: 0,
            half_size: [0.0; 3],
            num_dummies: 0,
            dummy_pos: [Vec3::ZERO; 16],
            num_parts: 0,
            part_pos: [Vec3::ZERO; 64],
            first_vertex: [0; 64],
            num_part_vertices: [0; 64],
            first_triangle: [0; 64],
            num_part_triangles: [0; 64],
            num_pri_colors: 0,
            pri_colors: [[0; 4]; 16],
            num_sec_colors: 0,
            sec_colors: [[0; 4]; 16],
            dummy_names: [[0; 64]; 16],
            part_names: [[0; 64]; 64],
        }
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }
        let mut hdr = Self::zeroed();
        hdr.unknown1 = read_u32(buf, 0x0000);
        hdr.num_triangles = read_u32(buf, 0x0004);
        hdr.num_vertices = read_u32(buf, 0x0008);
        hdr.num_arts = read_u32(buf, 0x000C);
        hdr.vert_tbl_offset = read_u32(buf, 0x0010);
        hdr.norm_tbl_offset = read_u32(buf, 0x0014);
        hdr.tria_tbl_offset = read_u32(buf, 0x0018);
        hdr.reserve1_offset = read_u32(buf, 0x001C);
        hdr.reserve2_offset = read_u32(buf, 0x0020);
        hdr.reserve3_offset = read_u32(buf, 0x0024);
        hdr.half_size = [
            read_f32(buf, 0x0028),
            read_f32(buf, 0x002C),
            read_f32(buf, 0x0030),
        ];
        hdr.num_dummies = read_u32(buf, 0x0034);
        for i in 0..16 {
            hdr.dummy_pos[i] = read_vec3(buf, 0x0038 + 12 * i);
        }
        hdr.num_parts = read_u32(buf, 0x00F8);
        for i in 0..64 {
            hdr.part_pos[i] = read_vec3(buf, 0x00FC + 12 * i);
            hdr.first_vertex[i] = read_u32(buf, 0x03FC + 4 * i);
            hdr.num_part_vertices[i] = read_u32(buf, 0x04FC + 4 * i);
            hdr.first_triangle[i] = read_u32(buf, 0x05FC + 4 * i);
            hdr.num_part_triangles[i] = read_u32(buf, 0x06FC + 4 * i);
        }
        hdr.num_pri_colors = read_u32(buf, 0x07FC);
        hdr.num_sec_colors = read_u32(buf, 0x0900);
        for i in 0..16 {
            for c in 0..4 {
                hdr.pri_colors[i][c] = read_u32(buf, 0x0800 + 16 * i + 4 * c);
                hdr.sec_colors[i][c] = read_u32(buf, 0x0904 + 16 * i + 4 * c);
            }
        }
        for i in 0..16 {
            hdr.dummy_names[i].copy_from_slice(&buf[0x0A04 + 64 * i..0x0A04 + 64 * (i + 1)]);
        }
        for i in 0..64 {
            hdr.part_names[i].copy_from_slice(&buf[0x0E04 + 64 * i..0x0E04 + 64 * (i + 1)]);
        }
        Some(hdr)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        write_u32(&mut buf, 0x0000, self.unknown1);
        write_u32(&mut buf, 0x0004, self.num_triangles);
        write_u32(&mut buf, 0x0008, self.num_vertices);
        write_u32(&mut buf, 0x000C, self.num_arts);
        write_u32(&mut buf, 0x0010, self.vert_tbl_offset);
        write_u32(&mut buf, 0x0014, self.norm_tbl_offset);
        write_u32(&mut buf, 0x0018, self.tria_tbl_offset);
        write_u32(&mut buf, 0x001C, self.reserve1_offset);
        write_u32(&mut buf, 0x0020, self.reserve2_offset);
        write_u32(&mut buf, 0x0024, self.reserve3_offset);
        write_f32(&mut buf, 0x0028, self.half_size[0]);
        write_f32(&mut buf, 0x002C, self.half_size[1]);
        write_f32(&mut buf, 0x0030, self.half_size[2]);
        write_u32(&mut buf, 0x0034, self.num_dummies);
        for i in 0..16 {
            write_vec3(&mut buf, 0x0038 + 12 * i, self.dummy_pos[i]);
        }
        write_u32(&mut buf, 0x00F8, self.num_parts);
        for i in 0..64 {
            write_vec3(&mut buf, 0x00FC + 12 * i, self.part_pos[i]);
            write_u32(&mut buf, 0x03FC + 4 * i, self.first_vertex[i]);
            write_u32(&mut buf, 0x04FC + 4 * i, self.num_part_vertices[i]);
            write_u32(&mut buf, 0x05FC + 4 * i, self.first_triangle[i]);
            write_u32(&mut buf, 0x06FC + 4 * i, self.num_part_triangles[i]);
        }
        write_u32(&mut buf, 0x07FC, self.num_pri_colors);
        write_u32(&mut buf, 0x0900, self.num_sec_colors);
        for i in 0..16 {
            for c in 0..4 {
                write_u32(&mut buf, 0x0800 + 16 * i + 4 * c, self.pri_colors[i][c]);
                write_u32(&mut buf, 0x0904 + 16 * i + 4 * c, self.sec_colors[i][c]);
            }
        }
        for i in 0..16 {
            buf[0x0A04 + 64 * i..0x0A04 + 64 * (i + 1)].copy_from_slice(&self.dummy_names[i]);
        }
        for i in 0..64 {
            buf[0x0E04 + 64 * i..0x0E04 + 64 * (i + 1)].copy_from_slice(&self.part_names[i]);
        }
        // 0x1E04..0x1F04 stays zero
        buf
    }
}

/// Structural validation: header bounds, table offsets, part ranges,
/// and every triangle's vertex references. Returns the parsed header
/// on success; decoding is this plus mesh construction.
pub(crate) fn check(bytes: &[u8]) -> Result<Fce3Header> {
    let hdr = Fce3Header::from_bytes(bytes)
        .ok_or_else(|| FceError::Malformed("buffer shorter than FCE3 header".into()))?;

    let nv = hdr.num_vertices as usize;
    let nt = hdr.num_triangles as usize;
    let expected = FceVersion::Fce3.file_size(nv, nt);
    if bytes.len() != expected {
        return Err(FceError::Malformed(format!(
            "buffer is {} bytes, expected {expected} for {nv} vertices and {nt} triangles",
            bytes.len()
        )));
    }
    if hdr.num_parts as usize > MAX_PARTS {
        return Err(FceError::Malformed(format!(
            "part count {} exceeds {MAX_PARTS}",
            hdr.num_parts
        )));
    }
    if hdr.num_dummies as usize > MAX_DUMMIES {
        return Err(FceError::Malformed(format!(
            "dummy count {} exceeds {MAX_DUMMIES}",
            hdr.num_dummies
        )));
    }
    if hdr.num_pri_colors as usize > MAX_COLORS || hdr.num_sec_colors as usize > MAX_COLORS {
        return Err(FceError::Malformed(format!(
            "color counts {}/{} exceed {MAX_COLORS}",
            hdr.num_pri_colors, hdr.num_sec_colors
        )));
    }

    let body_len = bytes.len() - Fce3Header::SIZE;
    for (name, off, size) in [
        ("vertex", hdr.vert_tbl_offset, 12 * nv),
        ("normal", hdr.norm_tbl_offset, 12 * nv),
        ("triangle", hdr.tria_tbl_offset, TriangleRecord::SIZE * nt),
    ] {
        if (off as usize).checked_add(size).is_none_or(|end| end > body_len) {
            return Err(FceError::Malformed(format!(
                "{name} table at offset 0x{off:X} overruns the buffer"
            )));
        }
    }

    // per-part slices must stay inside the flat tables
    for i in 0..hdr.num_parts as usize {
        let vfirst = hdr.first_vertex[i] as u64;
        let vcount = hdr.num_part_vertices[i] as u64;
        if vfirst + vcount > nv as u64 {
            return Err(FceError::Malformed(format!(
                "part {i} vertex range {vfirst}+{vcount} exceeds {nv}"
            )));
        }
        let tfirst = hdr.first_triangle[i] as u64;
        let tcount = hdr.num_part_triangles[i] as u64;
        if tfirst + tcount > nt as u64 {
            return Err(FceError::Malformed(format!(
                "part {i} triangle range {tfirst}+{tcount} exceeds {nt}"
            )));
        }
    }

    // triangle vertex references are part-local and must stay inside
    // the owning part's slice
    let body = &bytes[Fce3Header::SIZE..];
    for i in 0..hdr.num_parts as usize {
        let vcount = hdr.num_part_vertices[i] as i64;
        for t in 0..hdr.num_part_triangles[i] as usize {
            let off = hdr.tria_tbl_offset as usize
                + TriangleRecord::SIZE * (hdr.first_triangle[i] as usize + t);
            let record = TriangleRecord::from_bytes(&body[off..])
                .ok_or_else(|| FceError::Malformed("truncated triangle record".into()))?;
            for local in record.vidx {
                if local < 0 || local as i64 >= vcount {
                    return Err(FceError::Malformed(format!(
                        "part {i} triangle {t} references vertex {local} outside the part's vertex range"
                    )));
                }
            }
        }
    }
    Ok(hdr)
}

fn color_from_words(words: [u32; 4]) -> Color {
    Color {
        hue: (words[0] & 0xFF) as u8,
        saturation: (words[1] & 0xFF) as u8,
        brightness: (words[2] & 0xFF) as u8,
        transparency: (words[3] & 0xFF) as u8,
    }
}

fn color_to_words(color: Color) -> [u32; 4] {
    [
        color.hue as u32,
        color.saturation as u32,
        color.brightness as u32,
        color.transparency as u32,
    ]
}

/// Decode an FCE3 buffer.
pub(crate) fn decode(bytes: &[u8]) -> Result<Mesh> {
    let hdr = check(bytes)?;
    let body = &bytes[Fce3Header::SIZE..];
    let nv = hdr.num_vertices as usize;

    let mut mesh = Mesh::new();
    let mut flat: Vec<Option<VertexId>> = vec![None; nv];

    for rank in 0..hdr.num_parts as usize {
        let name = read_name(&hdr.part_names[rank]);
        let id = mesh.add_part(&name, hdr.part_pos[rank]);

        let vfirst = hdr.first_vertex[rank] as usize;
        for k in 0..hdr.num_part_vertices[rank] as usize {
            let pos = read_vec3(body, hdr.vert_tbl_offset as usize + 12 * (vfirst + k));
            let norm = read_vec3(body, hdr.norm_tbl_offset as usize + 12 * (vfirst + k));
            let vid = mesh.store_mut().add_vertex(Vertex {
                pos,
                norm,
                damaged_pos: pos,
                damaged_norm: norm,
                animation: 0,
            });
            flat[vfirst + k] = Some(vid);
            mesh.part_mut(id)?.vertices.push(vid);
        }

        let tfirst = hdr.first_triangle[rank] as usize;
        for t in 0..hdr.num_part_triangles[rank] as usize {
            let off = hdr.tria_tbl_offset as usize + TriangleRecord::SIZE * (tfirst + t);
            let record = TriangleRecord::from_bytes(&body[off..])
                .ok_or_else(|| FceError::Malformed("truncated triangle record".into()))?;
            let mut verts = [VertexId(0); 3];
            for (slot, local) in verts.iter_mut().zip(record.vidx) {
                *slot = flat[vfirst + local as usize].ok_or_else(|| {
                    FceError::Malformed(format!(
                        "triangle references unloaded vertex {}",
                        vfirst as i64 + local as i64
                    ))
                })?;
            }
            let tid = mesh.store_mut().add_triangle(Triangle {
                verts,
                u: record.u,
                v: record.v,
                flag: record.flag,
                tex_page: record.tex_page,
            })?;
            mesh.part_mut(id)?.triangles.push(tid);
        }
    }

    let mut dummies = Vec::with_capacity(hdr.num_dummies as usize);
    for i in 0..hdr.num_dummies as usize {
        dummies.push(Dummy {
            name: read_name(&hdr.dummy_names[i]),
            pos: hdr.dummy_pos[i],
        });
    }
    mesh.set_dummies_raw(dummies);

    // FCE3 stores primary and secondary only; interior mirrors
    // secondary and driver-hair mirrors primary.
    let mut colors = Vec::with_capacity(hdr.num_pri_colors as usize);
    for i in 0..hdr.num_pri_colors as usize {
        let primary = color_from_words(hdr.pri_colors[i]);
        let secondary = color_from_words(hdr.sec_colors[i]);
        colors.push(ColorSet {
            primary,
            interior: secondary,
            secondary,
            driver_hair: primary,
        });
    }
    mesh.set_colors_raw(colors, hdr.num_sec_colors as usize);

    debug!(
        parts = mesh.num_parts(),
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        "decoded FCE3"
    );
    Ok(mesh)
}

/// Encode a mesh as FCE3.
pub(crate) fn encode(mesh: &Mesh) -> Result<Vec<u8>> {
    let order = mesh.resolve_order()?;
    let nv = order.vertices.len();
    let nt = order.triangles.len();

    let mut hdr = Fce3Header::zeroed();
    hdr.num_triangles = nt as u32;
    hdr.num_vertices = nv as u32;
    hdr.num_arts = 1;
    hdr.vert_tbl_offset = 0;
    hdr.norm_tbl_offset = (12 * nv) as u32;
    hdr.tria_tbl_offset = (24 * nv) as u32;
    hdr.reserve1_offset = hdr.tria_tbl_offset + (TriangleRecord::SIZE * nt) as u32;
    hdr.reserve2_offset = hdr.reserve1_offset + (32 * nv) as u32;
    hdr.reserve3_offset = hdr.reserve2_offset + (12 * nv) as u32;
    hdr.half_size = half_sizes(mesh, FceVersion::Fce3)?;

    hdr.num_dummies = mesh.dummies().len() as u32;
    for (i, dummy) in mesh.dummies().iter().enumerate() {
        hdr.dummy_pos[i] = dummy.pos;
        write_name(&mut hdr.dummy_names[i], &dummy.name);
    }

    hdr.num_parts = mesh.num_parts() as u32;
    for rank in 0..mesh.num_parts() {
        let part = mesh.part_by_rank(rank)?;
        hdr.part_pos[rank] = part.pos;
        write_name(&mut hdr.part_names[rank], &part.name);
        let (vfirst, vcount) = order.part_vertex_ranges[rank];
        let (tfirst, tcount) = order.part_triangle_ranges[rank];
        hdr.first_vertex[rank] = vfirst;
        hdr.num_part_vertices[rank] = vcount;
        hdr.first_triangle[rank] = tfirst;
        hdr.num_part_triangles[rank] = tcount;
    }

    hdr.num_pri_colors = mesh.colors().len() as u32;
    hdr.num_sec_colors = mesh.sec_color_count() as u32;
    for (i, set) in mesh.colors().iter().enumerate() {
        hdr.pri_colors[i] = color_to_words(set.primary);
        hdr.sec_colors[i] = color_to_words(set.secondary);
    }

    let mut out = vec![0u8; FceVersion::Fce3.file_size(nv, nt)];
    out[..Fce3Header::SIZE].copy_from_slice(&hdr.to_bytes());
    let body = &mut out[Fce3Header::SIZE..];

    for (k, &vid) in order.vertices.iter().enumerate() {
        let vert = mesh.store().vertex(vid)?;
        write_vec3(body, hdr.vert_tbl_offset as usize + 12 * k, vert.pos);
        write_vec3(body, hdr.norm_tbl_offset as usize + 12 * k, vert.norm);
    }

    let mut written = 0usize;
    for rank in 0..mesh.num_parts() {
        let part = mesh.part_by_rank(rank)?;
        let (vfirst, _) = order.part_vertex_ranges[rank];
        for &tid in &part.triangles {
            let tria = mesh.store().triangle(tid)?;
            let mut vidx = [0i32; 3];
            for (slot, vid) in vidx.iter_mut().zip(tria.verts) {
                let global = *order
                    .vertex_index
                    .get(&vid)
                    .ok_or(FceError::InvalidReference {
                        kind: "vertex",
                        id: vid.0,
                    })?;
                *slot = global as i32 - vfirst as i32;
            }
            let record = TriangleRecord {
                tex_page: tria.tex_page,
                vidx,
                flag: tria.flag,
                u: tria.u,
                v: tria.v,
            };
            let off = hdr.tria_tbl_offset as usize + TriangleRecord::SIZE * written;
            body[off..off + TriangleRecord::SIZE].copy_from_slice(&record.to_bytes());
            written += 1;
        }
    }
    Ok(out)
}
