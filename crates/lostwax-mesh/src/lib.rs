//! Lostwax Mesh - from distance fields to mesh files
//!
//! Three stages, each usable on its own: [`voxelize`] samples a
//! shape's distance field over a regular lattice, [`extract`] pulls the
//! zero level set out of the grid as a polygon mesh, and [`write_stl`] /
//! [`write_obj`] serialize the mesh. The extractor's native winding is
//! inward; both serializers reverse it so normals face outward.
//!
//! ## Example
//!
//! ```rust,ignore
//! let grid = voxelize(&shape.bbox, &evaluator, None)?;
//! let mesh = extract(&grid, 0.0)?;
//! write_stl(&mut file, &mesh)?;
//! ```

mod error;
mod extract;
mod grid;
mod obj;
mod stl;
mod voxelize;

pub use error::{Error, Result};
pub use extract::{extract, init};
pub use grid::{BACKGROUND, GridClass, VoxelGrid};
pub use obj::write_obj;
pub use stl::write_stl;
pub use voxelize::{default_voxel_size, sample_bounds, voxelize};

use glam::Vec3;

/// A polygon mesh of triangles and quads over a shared point list.
/// Immutable after extraction.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub points: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub quads: Vec<[u32; 4]>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() && self.quads.is_empty()
    }

    /// Total polygon count; a quad counts once, not as two triangles.
    pub fn face_count(&self) -> usize {
        self.triangles.len() + self.quads.len()
    }
}
