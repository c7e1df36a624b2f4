//! Voxel grid holding sampled signed distances
//!
//! The grid stores one `f32` distance per lattice point over a finite
//! band of integer coordinates. Reads outside the band return a fixed
//! background value, so callers can treat the grid as an unbounded
//! field that is "far outside" everywhere it was never sampled.

use glam::Vec3;

/// Distance reported for any coordinate outside the sampled band.
/// Large enough to never be mistaken for a near-surface sample.
pub const BACKGROUND: f32 = 2.0;

/// What the stored values mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridClass {
    /// Signed distances: negative inside, positive outside.
    LevelSet,
}

/// A dense band of signed distance samples on an integer lattice,
/// with a linear world scale. Populated once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    class: GridClass,
    voxel_size: f64,
    min: [i32; 3],
    dim: [usize; 3],
    values: Vec<f32>,
}

impl VoxelGrid {
    pub(crate) fn new(voxel_size: f64, min: [i32; 3], dim: [usize; 3], values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), dim[0] * dim[1] * dim[2]);
        Self {
            class: GridClass::LevelSet,
            voxel_size,
            min,
            dim,
            values,
        }
    }

    pub fn class(&self) -> GridClass {
        self.class
    }

    /// Edge length of one voxel in world units.
    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// Lowest sampled lattice coordinate per axis.
    pub fn min(&self) -> [i32; 3] {
        self.min
    }

    /// Number of sampled lattice points per axis.
    pub fn dim(&self) -> [usize; 3] {
        self.dim
    }

    pub fn voxel_count(&self) -> usize {
        self.values.len()
    }

    /// Sampled distance at a lattice coordinate, or the background
    /// value anywhere outside the sampled band.
    pub fn value(&self, x: i32, y: i32, z: i32) -> f32 {
        let ix = x - self.min[0];
        let iy = y - self.min[1];
        let iz = z - self.min[2];
        if ix < 0
            || iy < 0
            || iz < 0
            || ix as usize >= self.dim[0]
            || iy as usize >= self.dim[1]
            || iz as usize >= self.dim[2]
        {
            return BACKGROUND;
        }
        let idx = (iz as usize * self.dim[1] + iy as usize) * self.dim[0] + ix as usize;
        self.values[idx]
    }

    /// World-space position of a lattice coordinate.
    pub fn world(&self, x: i32, y: i32, z: i32) -> Vec3 {
        let vs = self.voxel_size as f32;
        Vec3::new(x as f32 * vs, y as f32 * vs, z as f32 * vs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_outside_the_band_return_background() {
        let grid = VoxelGrid::new(1.0, [0, 0, 0], [2, 2, 2], vec![-1.0; 8]);
        assert_eq!(grid.value(0, 0, 0), -1.0);
        assert_eq!(grid.value(1, 1, 1), -1.0);
        assert_eq!(grid.value(2, 0, 0), BACKGROUND);
        assert_eq!(grid.value(-1, 0, 0), BACKGROUND);
        assert_eq!(grid.value(0, 0, 5), BACKGROUND);
    }

    #[test]
    fn value_indexing_is_x_fastest() {
        let mut values = vec![0.0; 8];
        // lattice point (1, 0, 1) in a 2x2x2 grid: (iz*ny + iy)*nx + ix = 5
        values[5] = 7.0;
        let grid = VoxelGrid::new(0.5, [0, 0, 0], [2, 2, 2], values);
        assert_eq!(grid.value(1, 0, 1), 7.0);
    }

    #[test]
    fn world_scales_by_voxel_size() {
        let grid = VoxelGrid::new(0.5, [-1, -1, -1], [3, 3, 3], vec![0.0; 27]);
        assert_eq!(grid.world(2, -1, 0), Vec3::new(1.0, -0.5, 0.0));
    }
}
