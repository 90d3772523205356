//! Mesh operations
//!
//! Part-level and triangle-level editing plus vertex garbage
//! collection. Every operation validates its preconditions before
//! touching the store; a returned error means nothing was mutated.

use glam::Vec3;
use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::error::{FceError, Result};
use crate::mesh::part::{Part, PartId, MAX_PART_NAME_LEN};
use crate::mesh::store::{Triangle, TriangleId, Vertex, VertexId};
use crate::mesh::Mesh;

impl Mesh {
    /// Add an empty helper part at the given center, appended at the
    /// end of part order.
    pub fn add_part(&mut self, name: &str, pos: Vec3) -> PartId {
        self.insert_part(Part::new(name, pos))
    }

    /// Deep-copy a part: fresh vertices and triangles sharing attribute
    /// values with the source, appended at the end of part order.
    pub fn copy_part(&mut self, id: PartId) -> Result<PartId> {
        self.max_parts_check()?;
        let src = self.part(id)?.clone();

        let mut vert_map: HashMap<VertexId, VertexId> = HashMap::new();
        let mut vertices = Vec::with_capacity(src.vertices.len());
        let mut new_verts: Vec<Vertex> = Vec::with_capacity(src.vertices.len());
        for &vid in &src.vertices {
            new_verts.push(*self.store().vertex(vid)?);
        }
        let mut new_trias: Vec<Triangle> = Vec::with_capacity(src.triangles.len());
        for &tid in &src.triangles {
            new_trias.push(*self.store().triangle(tid)?);
        }
        // source fully validated; mutation starts here
        for (&vid, vert) in src.vertices.iter().zip(new_verts) {
            let new_id = self.store_mut().add_vertex(vert);
            vert_map.insert(vid, new_id);
            vertices.push(new_id);
        }
        let mut triangles = Vec::with_capacity(src.triangles.len());
        for mut tria in new_trias {
            for v in &mut tria.verts {
                *v = *vert_map.get(v).ok_or(FceError::InvalidReference {
                    kind: "vertex",
                    id: v.0,
                })?;
            }
            triangles.push(self.store_mut().add_triangle(tria)?);
        }

        let new_id = self.insert_part(Part {
            name: src.name,
            pos: src.pos,
            vertices,
            triangles,
        });
        debug!(part = new_id.0, "copied part");
        Ok(new_id)
    }

    /// Merge two parts into one, appended at the end of part order.
    ///
    /// Geometry is baked to world space (both centers folded into the
    /// vertex positions) and the merged part's center is the origin.
    /// Triangle order is `a`'s triangles followed by `b`'s, which
    /// downstream tooling relies on to keep semi-transparent geometry
    /// trailing opaque geometry within a part. Both source entries are
    /// deleted.
    pub fn merge_parts(&mut self, a: PartId, b: PartId) -> Result<PartId> {
        if a == b {
            return Err(FceError::InvalidReference { kind: "part", id: b.0 });
        }
        let rank_a = self.rank_of(a)?;
        let rank_b = self.rank_of(b)?;
        let name = format!("{rank_a}_{rank_b}");

        for id in [a, b] {
            let pos = self.part(id)?.pos;
            let vids = self.part(id)?.vertices.clone();
            for vid in vids {
                let vert = self.store_mut().vertex_mut(vid)?;
                vert.pos += pos;
                vert.damaged_pos += pos;
            }
        }

        let part_a = self.take_part(a)?;
        let part_b = self.take_part(b)?;
        let mut vertices = part_a.vertices;
        vertices.extend(part_b.vertices);
        let mut triangles = part_a.triangles;
        triangles.extend(part_b.triangles);

        let new_id = self.insert_part(Part {
            name,
            pos: Vec3::ZERO,
            vertices,
            triangles,
        });
        debug!(part = new_id.0, "merged parts");
        Ok(new_id)
    }

    /// Remove a part entry, detaching its triangles without deleting
    /// them. The detached triangle ids are returned so callers can
    /// remove them (and then garbage-collect vertices) explicitly.
    pub fn delete_part(&mut self, id: PartId) -> Result<Vec<TriangleId>> {
        let part = self.take_part(id)?;
        Ok(part.triangles)
    }

    /// Mark an unowned triangle dead. Triangles still owned by a part
    /// must be removed through [`Mesh::delete_triangles_in_part`].
    pub fn remove_triangle(&mut self, id: TriangleId) -> Result<()> {
        for rank in 0..self.num_parts() {
            if self.part_by_rank(rank)?.triangles.contains(&id) {
                return Err(FceError::InvalidReference {
                    kind: "triangle",
                    id: id.0,
                });
            }
        }
        self.store_mut().remove_triangle(id)
    }

    /// Move a part to a target rank by repeated adjacent swaps, leaving
    /// the relative order of all other parts unchanged.
    pub fn move_part(&mut self, id: PartId, target_rank: usize) -> Result<()> {
        let num_parts = self.num_parts();
        if target_rank >= num_parts {
            return Err(FceError::OutOfRange {
                what: "part rank",
                value: target_rank,
                limit: num_parts,
            });
        }
        let mut current = self.rank_of(id)?;
        let rank = self.rank_mut();
        while current > target_rank {
            rank.swap(current, current - 1);
            current -= 1;
        }
        while current < target_rank {
            rank.swap(current, current + 1);
            current += 1;
        }
        Ok(())
    }

    /// Per-axis local centroid of a part's vertex positions:
    /// `min + 0.5 * |max - min|`.
    pub fn part_local_centroid(&self, id: PartId) -> Result<Vec3> {
        let part = self.part(id)?;
        if part.vertices.is_empty() {
            return Ok(Vec3::ZERO);
        }
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for &vid in &part.vertices {
            let pos = self.store().vertex(vid)?.pos;
            min = min.min(pos);
            max = max.max(pos);
        }
        Ok(min + 0.5 * (max - min).abs())
    }

    /// Assign a new center to a part, shifting its vertex positions
    /// (undamaged and damaged) so world placement is preserved.
    pub fn set_part_center(&mut self, id: PartId, new_pos: Vec3) -> Result<()> {
        let old_pos = self.part(id)?.pos;
        let delta = old_pos - new_pos;
        let vids = self.part(id)?.vertices.clone();
        for vid in vids {
            let vert = self.store_mut().vertex_mut(vid)?;
            vert.pos += delta;
            vert.damaged_pos += delta;
        }
        self.part_mut(id)?.pos = new_pos;
        Ok(())
    }

    /// Re-center a part on its local vertex centroid, preserving world
    /// placement.
    pub fn center_part(&mut self, id: PartId) -> Result<()> {
        let centroid = self.part_local_centroid(id)?;
        let new_pos = self.part(id)?.pos + centroid;
        self.set_part_center(id, new_pos)
    }

    /// Delete triangles from a part by part-local ordinal position.
    ///
    /// The indices address the part's current triangle order, not raw
    /// ids. Vertices are not garbage collected here; call
    /// [`Mesh::garbage_collect_vertices`] once a batch of deletions is
    /// complete.
    pub fn delete_triangles_in_part(&mut self, id: PartId, indices: &[usize]) -> Result<()> {
        let count = self.part(id)?.triangles.len();
        for &idx in indices {
            if idx >= count {
                return Err(FceError::OutOfRange {
                    what: "triangle index",
                    value: idx,
                    limit: count,
                });
            }
        }
        let mut dead = vec![false; count];
        for &idx in indices {
            dead[idx] = true;
        }
        let doomed: Vec<TriangleId> = self
            .part(id)?
            .triangles
            .iter()
            .enumerate()
            .filter_map(|(i, &tid)| dead[i].then_some(tid))
            .collect();
        for &tid in &doomed {
            self.store_mut().remove_triangle(tid)?;
        }
        let mut i = 0;
        self.part_mut(id)?.triangles.retain(|_| {
            let keep = !dead[i];
            i += 1;
            keep
        });
        debug!(part = id.0, removed = doomed.len(), "deleted triangles");
        Ok(())
    }

    /// Remove every vertex not referenced by any live triangle, from
    /// the store and from all part vertex lists. Returns the number of
    /// vertices removed.
    ///
    /// Side effect: any resolved-order index obtained before this call
    /// is invalid afterwards and must be reacquired.
    pub fn garbage_collect_vertices(&mut self) -> usize {
        let referenced: HashSet<VertexId> = self
            .store()
            .live_triangles()
            .flat_map(|(_, t)| t.verts)
            .collect();
        for rank in 0..self.num_parts() {
            let Ok(id) = self.part_id_by_rank(rank) else {
                continue;
            };
            if let Ok(part) = self.part_mut(id) {
                part.vertices.retain(|v| referenced.contains(v));
            }
        }
        let removed = self.store_mut().retain_vertices(&referenced);
        if removed > 0 {
            debug!(removed, "garbage collected vertices");
        }
        removed
    }

    /// Bulk-construct a new part from raw geometry arrays, appended at
    /// the end of part order.
    ///
    /// `faces` holds 3 vertex indices per triangle into the supplied
    /// vertex arrays; `uvs` holds interleaved (u, v) pairs per face
    /// corner, 6 floats per triangle; `positions`/`normals` hold 3
    /// floats per vertex. New triangles carry flag 0 and texture page
    /// 0; damaged attributes mirror the undamaged ones.
    pub fn add_geometry_as_new_part(
        &mut self,
        faces: &[u32],
        uvs: &[f32],
        positions: &[f32],
        normals: &[f32],
    ) -> Result<PartId> {
        self.max_parts_check()?;
        if positions.len() % 3 != 0 {
            return Err(FceError::MalformedGeometry(format!(
                "position array length {} is not a multiple of 3",
                positions.len()
            )));
        }
        if normals.len() != positions.len() {
            return Err(FceError::MalformedGeometry(format!(
                "normal array length {} does not match position array length {}",
                normals.len(),
                positions.len()
            )));
        }
        if faces.len() % 3 != 0 {
            return Err(FceError::MalformedGeometry(format!(
                "face array length {} is not a multiple of 3",
                faces.len()
            )));
        }
        if uvs.len() != 2 * faces.len() {
            return Err(FceError::MalformedGeometry(format!(
                "uv array length {} does not match face array length {}",
                uvs.len(),
                faces.len()
            )));
        }
        let num_verts = positions.len() / 3;
        if let Some(&bad) = faces.iter().find(|&&i| i as usize >= num_verts) {
            return Err(FceError::MalformedGeometry(format!(
                "face index {bad} out of range for {num_verts} vertices"
            )));
        }

        let mut vertices = Vec::with_capacity(num_verts);
        for i in 0..num_verts {
            let pos = Vec3::new(positions[3 * i], positions[3 * i + 1], positions[3 * i + 2]);
            let norm = Vec3::new(normals[3 * i], normals[3 * i + 1], normals[3 * i + 2]);
            vertices.push(self.store_mut().add_vertex(Vertex::at(pos, norm)));
        }
        let mut triangles = Vec::with_capacity(faces.len() / 3);
        for (t, face) in faces.chunks_exact(3).enumerate() {
            let uv = &uvs[6 * t..6 * t + 6];
            let tria = Triangle {
                verts: [
                    vertices[face[0] as usize],
                    vertices[face[1] as usize],
                    vertices[face[2] as usize],
                ],
                u: [uv[0], uv[2], uv[4]],
                v: [uv[1], uv[3], uv[5]],
                flag: 0,
                tex_page: 0,
            };
            triangles.push(self.store_mut().add_triangle(tria)?);
        }

        let mut name = format!("FromGeomData_{}", self.num_parts());
        name.truncate(MAX_PART_NAME_LEN);
        let id = self.insert_part(Part {
            name,
            pos: Vec3::ZERO,
            vertices,
            triangles,
        });
        debug!(
            part = id.0,
            verts = num_verts,
            trias = faces.len() / 3,
            "added part from raw geometry"
        );
        Ok(id)
    }
}
