//! Editable in-memory mesh
//!
//! # Purpose
//!
//! [`Mesh`] owns the geometry store, the ordered part registry, and the
//! non-geometric tables (dummies, paint colors). All mutation happens
//! through the operations in [`ops`] or the bulk setters here; the wire
//! codec only ever sees a mesh through the resolved canonical order.
//!
//! # Example
//!
//! ```
//! use fce_core::Mesh;
//! use glam::Vec3;
//!
//! let mut mesh = Mesh::new();
//! let part = mesh.add_part(":HB", Vec3::ZERO);
//! assert_eq!(mesh.num_parts(), 1);
//! assert_eq!(mesh.part_name(0).unwrap(), ":HB");
//! # let _ = part;
//! ```

pub mod order;
pub mod ops;
pub mod part;
pub mod store;

use glam::Vec3;

use crate::error::{FceError, Result};
use order::MeshOrder;
use part::{Part, PartId, MAX_PARTS, MAX_PART_NAME_LEN};
use store::{GeometryStore, Triangle, TriangleId, Vertex, VertexId};

/// Maximum dummies a mesh may carry on the wire.
pub const MAX_DUMMIES: usize = 16;
/// Maximum dummy name length in bytes, excluding the NUL terminator.
pub const MAX_DUMMY_NAME_LEN: usize = 63;
/// Maximum paint color slots.
pub const MAX_COLORS: usize = 16;

/// Named attachment point, independent of geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dummy {
    pub name: String,
    pub pos: Vec3,
}

/// One HSBT color record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub hue: u8,
    pub saturation: u8,
    pub brightness: u8,
    pub transparency: u8,
}

/// One car color slot: all four sub-category records.
///
/// FCE3 stores only primary and secondary; interior and driver-hair
/// mirror them on decode and are dropped on encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorSet {
    pub primary: Color,
    pub interior: Color,
    pub secondary: Color,
    pub driver_hair: Color,
}

/// Editable vehicle mesh: parts, triangles, vertices, dummies, colors.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    store: GeometryStore,
    parts: Vec<Option<Part>>,
    /// Part ids in rank order. Rank 0 renders first and lands first in
    /// the flat wire tables.
    rank: Vec<PartId>,
    dummies: Vec<Dummy>,
    colors: Vec<ColorSet>,
    /// FCE3 carries a secondary color count distinct from the primary
    /// count; FCE4-family decode sets this equal to `colors.len()`.
    sec_color_count: usize,
}

impl Mesh {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn store(&self) -> &GeometryStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut GeometryStore {
        &mut self.store
    }

    /// Number of parts.
    pub fn num_parts(&self) -> usize {
        self.rank.len()
    }

    /// Number of live triangles owned by parts.
    pub fn num_triangles(&self) -> usize {
        self.rank_parts().map(|p| p.triangles.len()).sum()
    }

    /// Number of live vertices owned by parts.
    pub fn num_vertices(&self) -> usize {
        self.rank_parts().map(|p| p.vertices.len()).sum()
    }

    fn rank_parts(&self) -> impl Iterator<Item = &Part> {
        self.rank
            .iter()
            .filter_map(|id| self.parts.get(id.0 as usize).and_then(Option::as_ref))
    }

    pub(crate) fn part(&self, id: PartId) -> Result<&Part> {
        self.parts
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(FceError::InvalidReference {
                kind: "part",
                id: id.0,
            })
    }

    pub(crate) fn part_mut(&mut self, id: PartId) -> Result<&mut Part> {
        self.parts
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(FceError::InvalidReference {
                kind: "part",
                id: id.0,
            })
    }

    /// Part id at the given rank.
    pub fn part_id_by_rank(&self, rank: usize) -> Result<PartId> {
        self.rank.get(rank).copied().ok_or(FceError::OutOfRange {
            what: "part rank",
            value: rank,
            limit: self.rank.len(),
        })
    }

    /// Current rank of a part.
    pub fn rank_of(&self, id: PartId) -> Result<usize> {
        self.part(id)?;
        self.rank
            .iter()
            .position(|&p| p == id)
            .ok_or(FceError::InvalidReference {
                kind: "part",
                id: id.0,
            })
    }

    pub(crate) fn part_by_rank(&self, rank: usize) -> Result<&Part> {
        let id = self.part_id_by_rank(rank)?;
        self.part(id)
    }

    fn part_by_rank_mut(&mut self, rank: usize) -> Result<&mut Part> {
        let id = self.part_id_by_rank(rank)?;
        self.part_mut(id)
    }

    pub(crate) fn insert_part(&mut self, part: Part) -> PartId {
        let id = PartId(self.parts.len() as u32);
        self.parts.push(Some(part));
        self.rank.push(id);
        id
    }

    pub(crate) fn take_part(&mut self, id: PartId) -> Result<Part> {
        let rank = self.rank_of(id)?;
        self.rank.remove(rank);
        let slot = self
            .parts
            .get_mut(id.0 as usize)
            .ok_or(FceError::InvalidReference {
                kind: "part",
                id: id.0,
            })?;
        slot.take().ok_or(FceError::InvalidReference {
            kind: "part",
            id: id.0,
        })
    }

    pub(crate) fn rank_mut(&mut self) -> &mut Vec<PartId> {
        &mut self.rank
    }

    /// Compute the canonical wire order for the current state.
    pub fn resolve_order(&self) -> Result<MeshOrder> {
        MeshOrder::resolve(self)
    }

    /// Structural validity check: every owned id is live, every
    /// triangle's vertex references resolve, and no triangle is owned
    /// by two parts.
    pub fn is_valid(&self) -> bool {
        let mut seen_triangles = hashbrown::HashSet::new();
        for part in self.rank_parts() {
            for &vid in &part.vertices {
                if !self.store.is_vertex_live(vid) {
                    return false;
                }
            }
            for &tid in &part.triangles {
                if !seen_triangles.insert(tid) {
                    return false;
                }
                let Ok(tria) = self.store.triangle(tid) else {
                    return false;
                };
                if tria.verts.iter().any(|&v| !self.store.is_vertex_live(v)) {
                    return false;
                }
            }
        }
        true
    }

    // --- part accessors (rank addressed) ---------------------------------

    /// Part name at the given rank.
    pub fn part_name(&self, rank: usize) -> Result<&str> {
        Ok(&self.part_by_rank(rank)?.name)
    }

    /// Rename a part. Names longer than 63 bytes do not fit the wire
    /// name slot.
    pub fn set_part_name(&mut self, rank: usize, name: &str) -> Result<()> {
        if name.len() > MAX_PART_NAME_LEN {
            return Err(FceError::OutOfRange {
                what: "part name length",
                value: name.len(),
                limit: MAX_PART_NAME_LEN + 1,
            });
        }
        self.part_by_rank_mut(rank)?.name = name.to_owned();
        Ok(())
    }

    /// Part center offset at the given rank.
    pub fn part_pos(&self, rank: usize) -> Result<Vec3> {
        Ok(self.part_by_rank(rank)?.pos)
    }

    /// Assign a part's center offset without moving its vertices. For
    /// the placement-preserving variant see [`Mesh::set_part_center`].
    pub fn set_part_pos(&mut self, rank: usize, pos: Vec3) -> Result<()> {
        self.part_by_rank_mut(rank)?.pos = pos;
        Ok(())
    }

    /// Vertex count of one part.
    pub fn part_num_vertices(&self, rank: usize) -> Result<usize> {
        Ok(self.part_by_rank(rank)?.vertices.len())
    }

    /// Triangle count of one part.
    pub fn part_num_triangles(&self, rank: usize) -> Result<usize> {
        Ok(self.part_by_rank(rank)?.triangles.len())
    }

    // --- per-part triangle attribute arrays -------------------------------

    /// Flag bitmask of every triangle in a part, in part order.
    pub fn triangle_flags(&self, rank: usize) -> Result<Vec<u32>> {
        let part = self.part_by_rank(rank)?;
        part.triangles
            .iter()
            .map(|&tid| self.store.triangle(tid).map(|t| t.flag))
            .collect()
    }

    /// Replace the flag bitmask of every triangle in a part.
    pub fn set_triangle_flags(&mut self, rank: usize, flags: &[u32]) -> Result<()> {
        let part = self.part_by_rank(rank)?;
        if flags.len() != part.triangles.len() {
            return Err(FceError::OutOfRange {
                what: "flag array length",
                value: flags.len(),
                limit: part.triangles.len() + 1,
            });
        }
        let tids = part.triangles.clone();
        for (&tid, &flag) in tids.iter().zip(flags) {
            self.store.triangle_mut(tid)?.flag = flag;
        }
        Ok(())
    }

    /// Texture page of every triangle in a part, in part order.
    pub fn triangle_texpages(&self, rank: usize) -> Result<Vec<i32>> {
        let part = self.part_by_rank(rank)?;
        part.triangles
            .iter()
            .map(|&tid| self.store.triangle(tid).map(|t| t.tex_page))
            .collect()
    }

    /// Replace the texture page of every triangle in a part.
    pub fn set_triangle_texpages(&mut self, rank: usize, pages: &[i32]) -> Result<()> {
        let part = self.part_by_rank(rank)?;
        if pages.len() != part.triangles.len() {
            return Err(FceError::OutOfRange {
                what: "texpage array length",
                value: pages.len(),
                limit: part.triangles.len() + 1,
            });
        }
        let tids = part.triangles.clone();
        for (&tid, &page) in tids.iter().zip(pages) {
            self.store.triangle_mut(tid)?.tex_page = page;
        }
        Ok(())
    }

    /// Resolved global vertex indices of every triangle in a part, as a
    /// flat `3 * count` array.
    pub fn triangle_indices(&self, rank: usize) -> Result<Vec<u32>> {
        let order = self.resolve_order()?;
        let part = self.part_by_rank(rank)?;
        let mut out = Vec::with_capacity(part.triangles.len() * 3);
        for &tid in &part.triangles {
            let tria = self.store.triangle(tid)?;
            for vid in tria.verts {
                let idx = order
                    .vertex_index
                    .get(&vid)
                    .ok_or(FceError::InvalidReference {
                        kind: "vertex",
                        id: vid.0,
                    })?;
                out.push(*idx);
            }
        }
        Ok(out)
    }

    // --- mesh-wide vertex arrays, resolved order --------------------------

    fn gather_vec3<F>(&self, get: F) -> Result<Vec<f32>>
    where
        F: Fn(&Vertex) -> Vec3,
    {
        let order = self.resolve_order()?;
        let mut out = Vec::with_capacity(order.vertices.len() * 3);
        for &vid in &order.vertices {
            let v = get(self.store.vertex(vid)?);
            out.extend_from_slice(&[v.x, v.y, v.z]);
        }
        Ok(out)
    }

    fn scatter_vec3<F>(&mut self, values: &[f32], set: F) -> Result<()>
    where
        F: Fn(&mut Vertex, Vec3),
    {
        let order = self.resolve_order()?;
        if values.len() != order.vertices.len() * 3 {
            return Err(FceError::OutOfRange {
                what: "vertex array length",
                value: values.len(),
                limit: order.vertices.len() * 3 + 1,
            });
        }
        for (i, &vid) in order.vertices.iter().enumerate() {
            let v = Vec3::new(values[3 * i], values[3 * i + 1], values[3 * i + 2]);
            set(self.store.vertex_mut(vid)?, v);
        }
        Ok(())
    }

    /// Local vertex positions, flat `3 * num_vertices`, resolved order.
    pub fn positions(&self) -> Result<Vec<f32>> {
        self.gather_vec3(|v| v.pos)
    }

    /// Replace all local vertex positions.
    pub fn set_positions(&mut self, values: &[f32]) -> Result<()> {
        self.scatter_vec3(values, |v, p| v.pos = p)
    }

    /// Vertex normals, flat, resolved order.
    pub fn normals(&self) -> Result<Vec<f32>> {
        self.gather_vec3(|v| v.norm)
    }

    /// Replace all vertex normals.
    pub fn set_normals(&mut self, values: &[f32]) -> Result<()> {
        self.scatter_vec3(values, |v, n| v.norm = n)
    }

    /// Damaged-model vertex positions, flat, resolved order.
    pub fn damaged_positions(&self) -> Result<Vec<f32>> {
        self.gather_vec3(|v| v.damaged_pos)
    }

    /// Replace all damaged-model vertex positions.
    pub fn set_damaged_positions(&mut self, values: &[f32]) -> Result<()> {
        self.scatter_vec3(values, |v, p| v.damaged_pos = p)
    }

    /// Damaged-model vertex normals, flat, resolved order.
    pub fn damaged_normals(&self) -> Result<Vec<f32>> {
        self.gather_vec3(|v| v.damaged_norm)
    }

    /// Replace all damaged-model vertex normals.
    pub fn set_damaged_normals(&mut self, values: &[f32]) -> Result<()> {
        self.scatter_vec3(values, |v, n| v.damaged_norm = n)
    }

    /// Per-vertex animation bitmasks, resolved order.
    pub fn animation_flags(&self) -> Result<Vec<u32>> {
        let order = self.resolve_order()?;
        order
            .vertices
            .iter()
            .map(|&vid| self.store.vertex(vid).map(|v| v.animation))
            .collect()
    }

    /// Replace all per-vertex animation bitmasks.
    pub fn set_animation_flags(&mut self, values: &[u32]) -> Result<()> {
        let order = self.resolve_order()?;
        if values.len() != order.vertices.len() {
            return Err(FceError::OutOfRange {
                what: "animation array length",
                value: values.len(),
                limit: order.vertices.len() + 1,
            });
        }
        for (&vid, &flag) in order.vertices.iter().zip(values) {
            self.store.vertex_mut(vid)?.animation = flag;
        }
        Ok(())
    }

    // --- dummies ----------------------------------------------------------

    /// Dummies, wire order.
    pub fn dummies(&self) -> &[Dummy] {
        &self.dummies
    }

    /// Dummy names, wire order.
    pub fn dummy_names(&self) -> Vec<String> {
        self.dummies.iter().map(|d| d.name.clone()).collect()
    }

    /// Replace the dummy list with the given names. The count may grow
    /// or shrink; positions are kept where a slot survives.
    pub fn set_dummy_names(&mut self, names: &[String]) -> Result<()> {
        if names.len() > MAX_DUMMIES {
            return Err(FceError::OutOfRange {
                what: "dummy count",
                value: names.len(),
                limit: MAX_DUMMIES + 1,
            });
        }
        for name in names {
            if name.len() > MAX_DUMMY_NAME_LEN {
                return Err(FceError::OutOfRange {
                    what: "dummy name length",
                    value: name.len(),
                    limit: MAX_DUMMY_NAME_LEN + 1,
                });
            }
        }
        self.dummies.resize_with(names.len(), Dummy::default);
        for (dummy, name) in self.dummies.iter_mut().zip(names) {
            dummy.name = name.clone();
        }
        Ok(())
    }

    /// Dummy positions, flat `3 * count`, wire order.
    pub fn dummy_positions(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.dummies.len() * 3);
        for d in &self.dummies {
            out.extend_from_slice(&[d.pos.x, d.pos.y, d.pos.z]);
        }
        out
    }

    /// Replace all dummy positions; length must match the current
    /// dummy count.
    pub fn set_dummy_positions(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.dummies.len() * 3 {
            return Err(FceError::OutOfRange {
                what: "dummy position array length",
                value: values.len(),
                limit: self.dummies.len() * 3 + 1,
            });
        }
        for (i, d) in self.dummies.iter_mut().enumerate() {
            d.pos = Vec3::new(values[3 * i], values[3 * i + 1], values[3 * i + 2]);
        }
        Ok(())
    }

    pub(crate) fn set_dummies_raw(&mut self, dummies: Vec<Dummy>) {
        self.dummies = dummies;
    }

    // --- colors -----------------------------------------------------------

    /// Paint color slots.
    pub fn colors(&self) -> &[ColorSet] {
        &self.colors
    }

    /// Replace the paint color table. Also resets the FCE3 secondary
    /// color count to the new slot count.
    pub fn set_colors(&mut self, colors: &[ColorSet]) -> Result<()> {
        if colors.len() > MAX_COLORS {
            return Err(FceError::OutOfRange {
                what: "color count",
                value: colors.len(),
                limit: MAX_COLORS + 1,
            });
        }
        self.colors = colors.to_vec();
        self.sec_color_count = colors.len();
        Ok(())
    }

    /// FCE3 secondary color count.
    pub fn sec_color_count(&self) -> usize {
        self.sec_color_count
    }

    /// Override the FCE3 secondary color count.
    pub fn set_sec_color_count(&mut self, count: usize) -> Result<()> {
        if count > MAX_COLORS {
            return Err(FceError::OutOfRange {
                what: "secondary color count",
                value: count,
                limit: MAX_COLORS + 1,
            });
        }
        self.sec_color_count = count;
        Ok(())
    }

    pub(crate) fn set_colors_raw(&mut self, colors: Vec<ColorSet>, sec_count: usize) {
        self.colors = colors;
        self.sec_color_count = sec_count;
    }

    // --- low-level geometry access ---------------------------------------

    /// Read a vertex by id.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.store.vertex(id)
    }

    /// Read a triangle by id.
    pub fn triangle(&self, id: TriangleId) -> Result<&Triangle> {
        self.store.triangle(id)
    }

    pub(crate) fn max_parts_check(&self) -> Result<()> {
        if self.rank.len() >= MAX_PARTS {
            return Err(FceError::OutOfRange {
                what: "part count",
                value: self.rank.len() + 1,
                limit: MAX_PARTS + 1,
            });
        }
        Ok(())
    }
}
