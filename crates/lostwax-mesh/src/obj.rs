//! Wavefront OBJ serialization
//!
//! All vertices first as `v x y z` lines, then one `f` line per
//! polygon with 1-based indices. Triangles and quads keep their arity;
//! winding is reversed from the extractor's native order so normals
//! face outward.

use crate::Mesh;
use crate::error::Result;
use std::io::Write;

pub fn write_obj<W: Write>(out: &mut W, mesh: &Mesh) -> Result<()> {
    for p in &mesh.points {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for tri in &mesh.triangles {
        writeln!(out, "f {} {} {}", tri[0] + 1, tri[2] + 1, tri[1] + 1)?;
    }
    for quad in &mesh.quads {
        writeln!(
            out,
            "f {} {} {} {}",
            quad[0] + 1,
            quad[3] + 1,
            quad[2] + 1,
            quad[1] + 1
        )?;
    }
    Ok(())
}
