//! Diagnostic text dump
//!
//! Human-readable structural summary of a mesh: counts, per-part
//! table, dummy table, color table. Used by the CLI `info` command and
//! by golden-output tests; the format is stable for a fixed input but
//! carries no other behavioral contract.

use std::fmt::Write;

use crate::error::Result;
use crate::mesh::Mesh;

impl Mesh {
    /// Render the structural summary.
    pub fn info(&self) -> Result<String> {
        let order = self.resolve_order()?;
        let mut out = String::new();

        let _ = writeln!(out, "NumParts       = {}", self.num_parts());
        let _ = writeln!(out, "NumTriangles   = {}", self.num_triangles());
        let _ = writeln!(out, "NumVertices    = {}", self.num_vertices());
        let _ = writeln!(out, "NumDummies     = {}", self.dummies().len());
        let _ = writeln!(
            out,
            "NumColors      = {} (secondary {})",
            self.colors().len(),
            self.sec_color_count()
        );

        let _ = writeln!(out, "Parts:");
        let _ = writeln!(
            out,
            "idx  1stVert  NumVerts  1stTria  NumTrias  (x, y, z)  Name"
        );
        for rank in 0..self.num_parts() {
            let part = self.part_by_rank(rank)?;
            let (vfirst, vcount) = order.part_vertex_ranges[rank];
            let (tfirst, tcount) = order.part_triangle_ranges[rank];
            let _ = writeln!(
                out,
                "{rank:3}  {vfirst:7}  {vcount:8}  {tfirst:7}  {tcount:8}  ({}, {}, {})  {}",
                part.pos.x, part.pos.y, part.pos.z, part.name
            );
        }

        if !self.dummies().is_empty() {
            let _ = writeln!(out, "Dummies:");
            let _ = writeln!(out, "idx  (x, y, z)  Name");
            for (i, dummy) in self.dummies().iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{i:3}  ({}, {}, {})  {}",
                    dummy.pos.x, dummy.pos.y, dummy.pos.z, dummy.name
                );
            }
        }

        if !self.colors().is_empty() {
            let _ = writeln!(out, "Colors (hue, saturation, brightness, transparency):");
            let _ = writeln!(out, "idx  Primary  Interior  Secondary  DriverHair");
            for (i, set) in self.colors().iter().enumerate() {
                let c = |x: crate::mesh::Color| {
                    format!(
                        "({}, {}, {}, {})",
                        x.hue, x.saturation, x.brightness, x.transparency
                    )
                };
                let _ = writeln!(
                    out,
                    "{i:3}  {}  {}  {}  {}",
                    c(set.primary),
                    c(set.interior),
                    c(set.secondary),
                    c(set.driver_hair)
                );
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::mesh::Mesh;
    use glam::Vec3;

    #[test]
    fn test_info_lists_parts() {
        let mut mesh = Mesh::new();
        mesh.add_part(":HB", Vec3::new(0.0, 0.5, 0.0));
        mesh.add_part(":OT", Vec3::ZERO);
        let info = mesh.info().unwrap();
        assert!(info.contains("NumParts       = 2"));
        assert!(info.contains(":HB"));
        assert!(info.contains(":OT"));
    }
}
