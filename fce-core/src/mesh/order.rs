//! Global order resolver
//!
//! The wire format stores one flat vertex table and one flat triangle
//! table, sliced per part by (first, count) pairs. Internally nothing
//! is contiguous: edits leave dead slots and reorder parts freely. The
//! resolver computes, on demand, the canonical contiguous numbering of
//! all live geometry grouped by part rank, plus the id→index map the
//! encoder needs to emit part-local vertex indices.
//!
//! The result is a snapshot. Any structural edit invalidates it; it is
//! recomputed from scratch rather than incrementally maintained.

use hashbrown::HashMap;

use crate::error::Result;
use crate::mesh::store::{TriangleId, VertexId};
use crate::mesh::Mesh;

/// Resolved canonical ordering of a mesh's live geometry.
#[derive(Debug, Clone)]
pub struct MeshOrder {
    /// All owned vertices, grouped by part rank, in per-part order.
    pub vertices: Vec<VertexId>,
    /// All owned triangles, grouped by part rank, in per-part order.
    pub triangles: Vec<TriangleId>,
    /// Internal vertex id → position in `vertices`.
    pub vertex_index: HashMap<VertexId, u32>,
    /// Per-rank (first, count) into `vertices`.
    pub part_vertex_ranges: Vec<(u32, u32)>,
    /// Per-rank (first, count) into `triangles`.
    pub part_triangle_ranges: Vec<(u32, u32)>,
}

impl MeshOrder {
    /// Compute the canonical order for the mesh's current state.
    ///
    /// Fails with `InvalidReference` if any part holds a dead vertex or
    /// triangle id, which cannot happen through the public operations.
    pub fn resolve(mesh: &Mesh) -> Result<Self> {
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        let mut vertex_index = HashMap::new();
        let mut part_vertex_ranges = Vec::with_capacity(mesh.num_parts());
        let mut part_triangle_ranges = Vec::with_capacity(mesh.num_parts());

        for rank in 0..mesh.num_parts() {
            let part = mesh.part_by_rank(rank)?;

            let vfirst = vertices.len() as u32;
            for &vid in &part.vertices {
                mesh.store().vertex(vid)?;
                vertex_index.insert(vid, vertices.len() as u32);
                vertices.push(vid);
            }
            part_vertex_ranges.push((vfirst, vertices.len() as u32 - vfirst));

            let tfirst = triangles.len() as u32;
            for &tid in &part.triangles {
                mesh.store().triangle(tid)?;
                triangles.push(tid);
            }
            part_triangle_ranges.push((tfirst, triangles.len() as u32 - tfirst));
        }

        Ok(Self {
            vertices,
            triangles,
            vertex_index,
            part_vertex_ranges,
            part_triangle_ranges,
        })
    }

    /// (first, count) of the part's slice of the flat vertex table.
    pub fn part_vertex_range(&self, rank: usize) -> Option<(u32, u32)> {
        self.part_vertex_ranges.get(rank).copied()
    }

    /// (first, count) of the part's slice of the flat triangle table.
    pub fn part_triangle_range(&self, rank: usize) -> Option<(u32, u32)> {
        self.part_triangle_ranges.get(rank).copied()
    }
}
