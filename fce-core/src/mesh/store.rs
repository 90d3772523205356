//! Geometry store
//!
//! Arena-backed storage for vertices and triangles. Slots are addressed
//! by opaque ids that stay valid across unrelated edits; removal marks a
//! slot dead without renumbering anything. Dead vertex slots are only
//! reclaimed by the explicit garbage-collection pass on [`crate::Mesh`].

use glam::Vec3;

use crate::error::{FceError, Result};

/// Stable handle to a vertex slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexId(pub(crate) u32);

/// Stable handle to a triangle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriangleId(pub(crate) u32);

/// Vertex attributes.
///
/// Positions are part-local; world placement is the part center plus
/// the local position. Damage attributes mirror the undamaged ones for
/// formats that carry no damage model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Vec3,
    pub norm: Vec3,
    pub damaged_pos: Vec3,
    pub damaged_norm: Vec3,
    /// Movable/fixed classification bitmask (0 = movable).
    pub animation: u32,
}

impl Vertex {
    /// Vertex at a position with a default up normal and mirrored
    /// damage attributes.
    pub fn at(pos: Vec3, norm: Vec3) -> Self {
        Self {
            pos,
            norm,
            damaged_pos: pos,
            damaged_norm: norm,
            animation: 0,
        }
    }
}

/// Triangle attributes. Vertex references are internal ids, never
/// wire-order indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub verts: [VertexId; 3],
    /// Per-corner texture coordinates.
    pub u: [f32; 3],
    pub v: [f32; 3],
    /// Rendering/material bitmask, preserved losslessly.
    pub flag: u32,
    /// Texture atlas selector.
    pub tex_page: i32,
}

/// Slot arenas for vertices and triangles.
#[derive(Debug, Clone, Default)]
pub struct GeometryStore {
    verts: Vec<Option<Vertex>>,
    trias: Vec<Option<Triangle>>,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live vertices.
    pub fn num_vertices(&self) -> usize {
        self.verts.iter().filter(|s| s.is_some()).count()
    }

    /// Number of live triangles.
    pub fn num_triangles(&self) -> usize {
        self.trias.iter().filter(|s| s.is_some()).count()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.verts.len() as u32);
        self.verts.push(Some(vertex));
        id
    }

    /// Add a triangle. Fails with `InvalidReference` if any vertex id
    /// is not live.
    pub fn add_triangle(&mut self, triangle: Triangle) -> Result<TriangleId> {
        for vid in triangle.verts {
            self.vertex(vid)?;
        }
        let id = TriangleId(self.trias.len() as u32);
        self.trias.push(Some(triangle));
        Ok(id)
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.verts
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(FceError::InvalidReference {
                kind: "vertex",
                id: id.0,
            })
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex> {
        self.verts
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(FceError::InvalidReference {
                kind: "vertex",
                id: id.0,
            })
    }

    pub fn triangle(&self, id: TriangleId) -> Result<&Triangle> {
        self.trias
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(FceError::InvalidReference {
                kind: "triangle",
                id: id.0,
            })
    }

    pub fn triangle_mut(&mut self, id: TriangleId) -> Result<&mut Triangle> {
        self.trias
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(FceError::InvalidReference {
                kind: "triangle",
                id: id.0,
            })
    }

    pub fn is_vertex_live(&self, id: VertexId) -> bool {
        matches!(self.verts.get(id.0 as usize), Some(Some(_)))
    }

    pub fn is_triangle_live(&self, id: TriangleId) -> bool {
        matches!(self.trias.get(id.0 as usize), Some(Some(_)))
    }

    /// Mark a vertex dead. Other ids are unaffected.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<()> {
        let slot = self
            .verts
            .get_mut(id.0 as usize)
            .ok_or(FceError::InvalidReference {
                kind: "vertex",
                id: id.0,
            })?;
        if slot.take().is_none() {
            return Err(FceError::InvalidReference {
                kind: "vertex",
                id: id.0,
            });
        }
        Ok(())
    }

    /// Mark a triangle dead. Other ids are unaffected.
    pub fn remove_triangle(&mut self, id: TriangleId) -> Result<()> {
        let slot = self
            .trias
            .get_mut(id.0 as usize)
            .ok_or(FceError::InvalidReference {
                kind: "triangle",
                id: id.0,
            })?;
        if slot.take().is_none() {
            return Err(FceError::InvalidReference {
                kind: "triangle",
                id: id.0,
            });
        }
        Ok(())
    }

    /// Kill every live vertex whose id is not in `keep`. Returns the
    /// number of vertices removed.
    pub fn retain_vertices(&mut self, keep: &hashbrown::HashSet<VertexId>) -> usize {
        let mut removed = 0;
        for (i, slot) in self.verts.iter_mut().enumerate() {
            if slot.is_some() && !keep.contains(&VertexId(i as u32)) {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    /// Iterate live triangles.
    pub fn live_triangles(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> {
        self.trias
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|t| (TriangleId(i as u32), t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vert(x: f32) -> Vertex {
        Vertex::at(Vec3::new(x, 0.0, 0.0), Vec3::Y)
    }

    #[test]
    fn test_ids_stable_across_removal() {
        let mut store = GeometryStore::new();
        let a = store.add_vertex(vert(1.0));
        let b = store.add_vertex(vert(2.0));
        let c = store.add_vertex(vert(3.0));
        store.remove_vertex(b).unwrap();

        assert_eq!(store.num_vertices(), 2);
        assert_eq!(store.vertex(a).unwrap().pos.x, 1.0);
        assert_eq!(store.vertex(c).unwrap().pos.x, 3.0);
        assert!(store.vertex(b).is_err());
        // removing twice is an error, not a silent no-op
        assert!(store.remove_vertex(b).is_err());
    }

    #[test]
    fn test_add_triangle_checks_references() {
        let mut store = GeometryStore::new();
        let a = store.add_vertex(vert(0.0));
        let b = store.add_vertex(vert(1.0));
        let c = store.add_vertex(vert(2.0));
        let tria = Triangle {
            verts: [a, b, c],
            u: [0.0; 3],
            v: [0.0; 3],
            flag: 0,
            tex_page: 0,
        };
        assert!(store.add_triangle(tria).is_ok());

        store.remove_vertex(c).unwrap();
        assert_eq!(
            store.add_triangle(tria),
            Err(FceError::InvalidReference {
                kind: "vertex",
                id: c.0
            })
        );
        // failed insert must not have grown the arena
        assert_eq!(store.num_triangles(), 1);
    }
}
