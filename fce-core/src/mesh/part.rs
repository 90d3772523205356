//! Part registry types
//!
//! A part owns an ordered list of triangle ids and, separately, the
//! ordered list of vertex ids those triangles draw from. The vertex
//! list order is significant: it is the order the vertices occupy in
//! the part's slice of the flat wire tables, so decode→encode round
//! trips preserve it exactly.

use glam::Vec3;

use crate::mesh::store::{TriangleId, VertexId};

/// Maximum parts a mesh may carry on the wire.
pub const MAX_PARTS: usize = 64;
/// Maximum part name length in bytes, excluding the NUL terminator.
pub const MAX_PART_NAME_LEN: usize = 63;

/// Stable handle to a part slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(pub(crate) u32);

/// A named polygon group with its own center offset.
#[derive(Debug, Clone, Default)]
pub struct Part {
    pub name: String,
    /// World-space offset added to every local vertex position.
    pub pos: Vec3,
    /// Owned vertices, in wire order.
    pub vertices: Vec<VertexId>,
    /// Owned triangles, in wire order.
    pub triangles: Vec<TriangleId>,
}

impl Part {
    pub fn new(name: impl Into<String>, pos: Vec3) -> Self {
        Self {
            name: name.into(),
            pos,
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }
}
