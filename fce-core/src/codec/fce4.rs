//! FCE4 and FCE4M layout (damage tables, animation flags, four color
//! categories)
//!
//! # Layout
//! ```text
//! 0x0000: Version u32 (0x00101014 FCE4, 0x00101015 FCE4M)
//! 0x0004: Unknown1 u32
//! 0x0008: NumTriangles u32
//! 0x000C: NumVertices u32
//! 0x0010: NumArts u32
//! 0x0014: area offsets u32 x14, relative to header end, in order:
//!         Vert(12V) Norm(12V) Tria(56T) Reserve1(32V) Reserve2(12V)
//!         Reserve3(12V) UndamgdVert(12V) UndamgdNorm(12V)
//!         DamgdVert(12V) DamgdNorm(12V) Reserve4(4V) Animation(4V)
//!         Reserve5(4V) Reserve6(12T, plus V for FCE4M)
//! 0x004C: HalfSize f32 x3
//! 0x0058: NumDummies u32
//! 0x005C: DummyPos f32 x3 x16
//! 0x011C: NumParts u32
//! 0x0120: PartPos f32 x3 x64
//! 0x0420: P1stVertices u32 x64
//! 0x0520: PNumVertices u32 x64
//! 0x0620: P1stTriangles u32 x64
//! 0x0720: PNumTriangles u32 x64
//! 0x0820: NumColors u32
//! 0x0824: PriColors (h,s,b,t single bytes) x16
//! 0x0864: IntColors x16
//! 0x08A4: SecColors x16
//! 0x08E4: DriColors x16
//! 0x0924: Unknown3 u32
//! 0x0928: Unknown2 256 bytes
//! 0x0A28: DummyNames 64 bytes x16
//! 0x0E28: PartNames 64 bytes x64
//! 0x1E28: Unknown4 528 bytes
//! ```
//! The undamaged tables are byte copies of the vert/norm tables; V
//! texture coordinates are stored flipped (`1 - v`) relative to FCE3.
//! Total file size: `0x2038 + 140 * V + 68 * T` (+`V` for FCE4M).

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

/// FCE4-family fixed header.
#[derive(Debug, Clone)]
pub(crate) struct Fce4Header {
    pub version: u32,
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
    pub undamgd_vert_tbl_offset: u32,
    pub undamgd_norm_tbl_offset: u32,
    pub damgd_vert_tbl_offset: u32,
    pub damgd_norm_tbl_offset: u32,
    pub reserve4_offset: u32,
    pub animation_tbl_offset: u32,
    pub reserve5_offset: u32,
    pub reserve6_offset: u32,
    pub half_size: [f32; 3],
    pub num_dummies: u32,
    pub dummy_pos: [Vec3; 16],
    pub num_parts: u32,
    pub part_pos: [Vec3; 64],
    pub first_vertex: [u32; 64],
    pub num_part_vertices: [u32; 64],
    pub first_triangle: [u32; 64],
    pub num_part_triangles: [u32; 64],
    pub num_colors: u32,
    pub pri_colors: [[u8; 4]; 16],
    pub int_colors: [[u8; 4]; 16],
    pub sec_colors: [[u8; 4]; 16],
    pub dri_colors: [[u8; 4]; 16],
    pub unknown3: u32,
    pub dummy_names: [[u8; 64]; 16],
    pub part_names: [[u8; 64]; 64],
}

impl Fce4Header {
    pub const SIZE: usize = 0x2038;

    fn zeroed() -> Self {
        Self {
            version: 0,
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
            undamgd_vert_tbl_offset: 0,
            undamgd_norm_tbl_offset: 0,
            damgd_vert_tbl_offset: 0,
            damgd_norm_tbl_offset: 0,
            reserve4_offset: 0,
            animation_tbl_offset: 0,
            reserve5_offset: 0,
            reserve6_offset: 0,
            half_size: [0.0; 3],
            num_dummies: 0,
            dummy_pos: [Vec3::ZERO; 16],
            num_parts: 0,
            part_pos: [Vec3::ZERO; 64],
            first_vertex: [0; 64],
            num_part_vertices: [0; 64],
            first_triangle: [0; 64],
            num_part_triangles: [0; 64],
            num_colors: 0,
            pri_colors: [[0; 4]; 16],
            int_colors: [[0; 4]; 16],
            sec_colors: [[0; 4]; 16],
            dri_colors: [[0; 4]; 16],
            unknown3: 0,
            dummy_names: [[0; 64]; 16],
            part_names: [[0; 64]; 64],
        }
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }
        let mut hdr = Self::zeroed();
        hdr.version = read_u32(buf, 0x0000);
        hdr.unknown1 = read_u32(buf, 0x0004);
        hdr.num_triangles = read_u32(buf, 0x0008);
        hdr.num_vertices = read_u32(buf, 0x000C);
        hdr.num_arts = read_u32(buf, 0x0010);
        hdr.vert_tbl_offset = read_u32(buf, 0x0014);
        hdr.norm_tbl_offset = read_u32(buf, 0x0018);
        hdr.tria_tbl_offset = read_u32(buf, 0x001C);
        hdr.reserve1_offset = read_u32(buf, 0x0020);
        hdr.reserve2_offset = read_u32(buf, 0x0024);
        hdr.reserve3_offset = read_u32(buf, 0x0028);
        hdr.undamgd_vert_tbl_offset = read_u32(buf, 0x002C);
        hdr.undamgd_norm_tbl_offset = read_u32(buf, 0x0030);
        hdr.damgd_vert_tbl_offset = read_u32(buf, 0x0034);
        hdr.damgd_norm_tbl_offset = read_u32(buf, 0x0038);
        hdr.reserve4_offset = read_u32(buf, 0x003C);
        hdr.animation_tbl_offset = read_u32(buf, 0x0040);
        hdr.reserve5_offset = read_u32(buf, 0x0044);
        hdr.reserve6_offset = read_u32(buf, 0x0048);
        hdr.half_size = [
            read_f32(buf, 0x004C),
            read_f32(buf, 0x0050),
            read_f32(buf, 0x0054),
        ];
        hdr.num_dummies = read_u32(buf, 0x0058);
        for i in 0..16 {
            hdr.dummy_pos[i] = read_vec3(buf, 0x005C + 12 * i);
        }
        hdr.num_parts = read_u32(buf, 0x011C);
        for i in 0..64 {
            hdr.part_pos[i] = read_vec3(buf, 0x0120 + 12 * i);
            hdr.first_vertex[i] = read_u32(buf, 0x0420 + 4 * i);
            hdr.num_part_vertices[i] = read_u32(buf, 0x0520 + 4 * i);
            hdr.first_triangle[i] = read_u32(buf, 0x0620 + 4 * i);
            hdr.num_part_triangles[i] = read_u32(buf, 0x0720 + 4 * i);
        }
        hdr.num_colors = read_u32(buf, 0x0820);
        for i in 0..16 {
            hdr.pri_colors[i].copy_from_slice(&buf[0x0824 + 4 * i..0x0824 + 4 * (i + 1)]);
            hdr.int_colors[i].copy_from_slice(&buf[0x0864 + 4 * i..0x0864 + 4 * (i + 1)]);
            hdr.sec_colors[i].copy_from_slice(&buf[0x08A4 + 4 * i..0x08A4 + 4 * (i + 1)]);
            hdr.dri_colors[i].copy_from_slice(&buf[0x08E4 + 4 * i..0x08E4 + 4 * (i + 1)]);
        }
        hdr.unknown3 = read_u32(buf, 0x0924);
        for i in 0..16 {
            hdr.dummy_names[i].copy_from_slice(&buf[0x0A28 + 64 * i..0x0A28 + 64 * (i + 1)]);
        }
        for i in 0..64 {
            hdr.part_names[i].copy_from_slice(&buf[0x0E28 + 64 * i..0x0E28 + 64 * (i + 1)]);
        }
        Some(hdr)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        write_u32(&mut buf, 0x0000, self.version);
        write_u32(&mut buf, 0x0004, self.unknown1);
        write_u32(&mut buf, 0x0008, self.num_triangles);
        write_u32(&mut buf, 0x000C, self.num_vertices);
        write_u32(&mut buf, 0x0010, self.num_arts);
        write_u32(&mut buf, 0x0014, self.vert_tbl_offset);
        write_u32(&mut buf, 0x0018, self.norm_tbl_offset);
        write_u32(&mut buf, 0x001C, self.tria_tbl_offset);
        write_u32(&mut buf, 0x0020, self.reserve1_offset);
        write_u32(&mut buf, 0x0024, self.reserve2_offset);
        write_u32(&mut buf, 0x0028, self.reserve3_offset);
        write_u32(&mut buf, 0x002C, self.undamgd_vert_tbl_offset);
        write_u32(&mut buf, 0x0030, self.undamgd_norm_tbl_offset);
        write_u32(&mut buf, 0x0034, self.damgd_vert_tbl_offset);
        write_u32(&mut buf, 0x0038, self.damgd_norm_tbl_offset);
        write_u32(&mut buf, 0x003C, self.reserve4_offset);
        write_u32(&mut buf, 0x0040, self.animation_tbl_offset);
        write_u32(&mut buf, 0x0044, self.reserve5_offset);
        write_u32(&mut buf, 0x0048, self.reserve6_offset);
        write_f32(&mut buf, 0x004C, self.half_size[0]);
        write_f32(&mut buf, 0x0050, self.half_size[1]);
        write_f32(&mut buf, 0x0054, self.half_size[2]);
        write_u32(&mut buf, 0x0058, self.num_dummies);
        for i in 0..16 {
            write_vec3(&mut buf, 0x005C + 12 * i, self.dummy_pos[i]);
        }
        write_u32(&mut buf, 0x011C, self.num_parts);
        for i in 0..64 {
            write_vec3(&mut buf, 0x0120 + 12 * i, self.part_pos[i]);
            write_u32(&mut buf, 0x0420 + 4 * i, self.first_vertex[i]);
            write_u32(&mut buf, 0x0520 + 4 * i, self.num_part_vertices[i]);
            write_u32(&mut buf, 0x0620 + 4 * i, self.first_triangle[i]);
            write_u32(&mut buf, 0x0720 + 4 * i, self.num_part_triangles[i]);
        }
        write_u32(&mut buf, 0x0820, self.num_colors);
        for i in 0..16 {
            buf[0x0824 + 4 * i..0x0824 + 4 * (i + 1)].copy_from_slice(&self.pri_colors[i]);
            buf[0x0864 + 4 * i..0x0864 + 4 * (i + 1)].copy_from_slice(&self.int_colors[i]);
            buf[0x08A4 + 4 * i..0x08A4 + 4 * (i + 1)].copy_from_slice(&self.sec_colors[i]);
            buf[0x08E4 + 4 * i..0x08E4 + 4 * (i + 1)].copy_from_slice(&self.dri_colors[i]);
        }
        write_u32(&mut buf, 0x0924, self.unknown3);
        // Unknown2 at 0x0928 stays zero
        for i in 0..16 {
            buf[0x0A28 + 64 * i..0x0A28 + 64 * (i + 1)].copy_from_slice(&self.dummy_names[i]);
        }
        for i in 0..64 {
            buf[0x0E28 + 64 * i..0x0E28 + 64 * (i + 1)].copy_from_slice(&self.part_names[i]);
        }
        // Unknown4 at 0x1E28 stays zero
        buf
    }
}

/// Structural validation for FCE4/FCE4M, mirroring [`super::fce3::check`].
pub(crate) fn check(bytes: &[u8], version: FceVersion) -> Result<Fce4Header> {
    let hdr = Fce4Header::from_bytes(bytes)
        .ok_or_else(|| FceError::Malformed("buffer shorter than FCE4 header".into()))?;
    if Some(hdr.version) != version.version_word() {
        return Err(FceError::Malformed(format!(
            "version word 0x{:08X} does not match {version}",
            hdr.version
        )));
    }

    let nv = hdr.num_vertices as usize;
    let nt = hdr.num_triangles as usize;
    let expected = version.file_size(nv, nt);
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
    if hdr.num_colors as usize > MAX_COLORS {
        return Err(FceError::Malformed(format!(
            "color count {} exceeds {MAX_COLORS}",
            hdr.num_colors
        )));
    }

    let body_len = bytes.len() - Fce4Header::SIZE;
    for (name, off, size) in [
        ("vertex", hdr.vert_tbl_offset, 12 * nv),
        ("normal", hdr.norm_tbl_offset, 12 * nv),
        ("triangle", hdr.tria_tbl_offset, TriangleRecord::SIZE * nt),
        ("damaged vertex", hdr.damgd_vert_tbl_offset, 12 * nv),
        ("damaged normal", hdr.damgd_norm_tbl_offset, 12 * nv),
        ("animation", hdr.animation_tbl_offset, 4 * nv),
    ] {
        if (off as usize).checked_add(size).is_none_or(|end| end > body_len) {
            return Err(FceError::Malformed(format!(
                "{name} table at offset 0x{off:X} overruns the buffer"
            )));
        }
    }

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

    let body = &bytes[Fce4Header::SIZE..];
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

fn color_from_slot(slot: [u8; 4]) -> Color {
    Color {
        hue: slot[0],
        saturation: slot[1],
        brightness: slot[2],
        transparency: slot[3],
    }
}

fn color_to_slot(color: Color) -> [u8; 4] {
    [
        color.hue,
        color.saturation,
        color.brightness,
        color.transparency,
    ]
}

/// Decode an FCE4 or FCE4M buffer.
pub(crate) fn decode(bytes: &[u8], version: FceVersion) -> Result<Mesh> {
    let hdr = check(bytes, version)?;
    let body = &bytes[Fce4Header::SIZE..];
    let nv = hdr.num_vertices as usize;

    let mut mesh = Mesh::new();
    let mut flat: Vec<Option<VertexId>> = vec![None; nv];

    for rank in 0..hdr.num_parts as usize {
        let name = read_name(&hdr.part_names[rank]);
        let id = mesh.add_part(&name, hdr.part_pos[rank]);

        let vfirst = hdr.first_vertex[rank] as usize;
        for k in 0..hdr.num_part_vertices[rank] as usize {
            let n = vfirst + k;
            let vid = mesh.store_mut().add_vertex(Vertex {
                pos: read_vec3(body, hdr.vert_tbl_offset as usize + 12 * n),
                norm: read_vec3(body, hdr.norm_tbl_offset as usize + 12 * n),
                damaged_pos: read_vec3(body, hdr.damgd_vert_tbl_offset as usize + 12 * n),
                damaged_norm: read_vec3(body, hdr.damgd_norm_tbl_offset as usize + 12 * n),
                animation: read_u32(body, hdr.animation_tbl_offset as usize + 4 * n),
            });
            flat[n] = Some(vid);
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
            // V is stored flipped relative to FCE3
            let tid = mesh.store_mut().add_triangle(Triangle {
                verts,
                u: record.u,
                v: record.v.map(|v| 1.0 - v),
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

    let mut colors = Vec::with_capacity(hdr.num_colors as usize);
    for i in 0..hdr.num_colors as usize {
        colors.push(ColorSet {
            primary: color_from_slot(hdr.pri_colors[i]),
            interior: color_from_slot(hdr.int_colors[i]),
            secondary: color_from_slot(hdr.sec_colors[i]),
            driver_hair: color_from_slot(hdr.dri_colors[i]),
        });
    }
    let sec_count = hdr.num_colors as usize;
    mesh.set_colors_raw(colors, sec_count);

    debug!(
        %version,
        parts = mesh.num_parts(),
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        "decoded FCE4-family mesh"
    );
    Ok(mesh)
}

/// Encode a mesh as FCE4 or FCE4M.
pub(crate) fn encode(mesh: &Mesh, version: FceVersion) -> Result<Vec<u8>> {
    let order = mesh.resolve_order()?;
    let nv = order.vertices.len();
    let nt = order.triangles.len();

    let mut hdr = Fce4Header::zeroed();
    hdr.version = version
        .version_word()
        .ok_or_else(|| FceError::Malformed("FCE3 has no version word".into()))?;
    hdr.num_triangles = nt as u32;
    hdr.num_vertices = nv as u32;
    hdr.num_arts = 1;

    let v12 = (12 * nv) as u32;
    let v4 = (4 * nv) as u32;
    hdr.vert_tbl_offset = 0;
    hdr.norm_tbl_offset = v12;
    hdr.tria_tbl_offset = 2 * v12;
    hdr.reserve1_offset = hdr.tria_tbl_offset + (TriangleRecord::SIZE * nt) as u32;
    hdr.reserve2_offset = hdr.reserve1_offset + (32 * nv) as u32;
    hdr.reserve3_offset = hdr.reserve2_offset + v12;
    hdr.undamgd_vert_tbl_offset = hdr.reserve3_offset + v12;
    hdr.undamgd_norm_tbl_offset = hdr.undamgd_vert_tbl_offset + v12;
    hdr.damgd_vert_tbl_offset = hdr.undamgd_norm_tbl_offset + v12;
    hdr.damgd_norm_tbl_offset = hdr.damgd_vert_tbl_offset + v12;
    hdr.reserve4_offset = hdr.damgd_norm_tbl_offset + v12;
    hdr.animation_tbl_offset = hdr.reserve4_offset + v4;
    hdr.reserve5_offset = hdr.animation_tbl_offset + v4;
    hdr.reserve6_offset = hdr.reserve5_offset + v4;
    hdr.half_size = half_sizes(mesh, version)?;

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

    hdr.num_colors = mesh.colors().len() as u32;
    for (i, set) in mesh.colors().iter().enumerate() {
        hdr.pri_colors[i] = color_to_slot(set.primary);
        hdr.int_colors[i] = color_to_slot(set.interior);
        hdr.sec_colors[i] = color_to_slot(set.secondary);
        hdr.dri_colors[i] = color_to_slot(set.driver_hair);
    }

    let mut out = vec![0u8; version.file_size(nv, nt)];
    out[..Fce4Header::SIZE].copy_from_slice(&hdr.to_bytes());
    let body = &mut out[Fce4Header::SIZE..];

    for (k, &vid) in order.vertices.iter().enumerate() {
        let vert = mesh.store().vertex(vid)?;
        write_vec3(body, hdr.vert_tbl_offset as usize + 12 * k, vert.pos);
        write_vec3(body, hdr.norm_tbl_offset as usize + 12 * k, vert.norm);
        write_vec3(
            body,
            hdr.damgd_vert_tbl_offset as usize + 12 * k,
            vert.damaged_pos,
        );
        write_vec3(
            body,
            hdr.damgd_norm_tbl_offset as usize + 12 * k,
            vert.damaged_norm,
        );
        write_u32(
            body,
            hdr.animation_tbl_offset as usize + 4 * k,
            vert.animation,
        );
    }
    // undamaged tables are byte copies of the vert/norm tables
    body.copy_within(
        hdr.vert_tbl_offset as usize..hdr.vert_tbl_offset as usize + 12 * nv,
        hdr.undamgd_vert_tbl_offset as usize,
    );
    body.copy_within(
        hdr.norm_tbl_offset as usize..hdr.norm_tbl_offset as usize + 12 * nv,
        hdr.undamgd_norm_tbl_offset as usize,
    );

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
                v: tria.v.map(|v| 1.0 - v),
            };
            let off = hdr.tria_tbl_offset as usize + TriangleRecord::SIZE * written;
            body[off..off + TriangleRecord::SIZE].copy_from_slice(&record.to_bytes());
            written += 1;
        }
    }
    Ok(out)
}
