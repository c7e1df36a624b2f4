//! Distance field sampling over a voxel lattice
//!
//! Turns a bounded shape into a [`VoxelGrid`] by evaluating its
//! distance function at every lattice point of a regular grid covering
//! the bounding box plus a safety band. Each sample is independent, so
//! population is sharded across threads with rayon.

use crate::error::{Error, Result};
use crate::grid::VoxelGrid;
use lostwax_field::{BoundingBox, Evaluator};
use rayon::prelude::*;
use std::time::Instant;

/// Default voxel edge length for a bounding volume: targets roughly
/// 100k samples across the box, floored at 0.1 so tiny shapes do not
/// over-refine.
pub fn default_voxel_size(volume: f64) -> f64 {
    (volume / 100_000.0).cbrt().max(0.1)
}

/// Inclusive integer sampling bounds per axis. The 2-voxel margin past
/// the bounding box guarantees the extractor sees a sign-change band on
/// both sides of the surface even at the box boundary.
pub fn sample_bounds(bbox: &BoundingBox, voxel_size: f64) -> ([i32; 3], [i32; 3]) {
    let lo = |w: f64| (w / voxel_size).floor() as i32 - 2;
    let hi = |w: f64| (w / voxel_size).ceil() as i32 + 2;
    (
        [lo(bbox.min.x), lo(bbox.min.y), lo(bbox.min.z)],
        [hi(bbox.max.x), hi(bbox.max.y), hi(bbox.max.z)],
    )
}

/// Sample a shape's distance field at time 0 over its bounding box.
///
/// `resolution`, if given, overrides the voxel size and must be
/// positive. Unbounded shapes are rejected before any sampling.
pub fn voxelize<E: Evaluator + ?Sized>(
    bbox: &BoundingBox,
    eval: &E,
    resolution: Option<f64>,
) -> Result<VoxelGrid> {
    let size = bbox.size();
    let volume = size.x * size.y * size.z;
    // a flat infinite box makes the product NaN, treat it the same
    if !volume.is_finite() {
        return Err(Error::InfiniteShape);
    }

    let voxel_size = match resolution {
        Some(res) if res.is_finite() && res > 0.0 => res,
        Some(res) => {
            return Err(Error::InvalidParameter {
                param: "res",
                value: res,
                reason: "must be a number greater than 0",
            });
        }
        None => default_voxel_size(volume),
    };

    let (min, max) = sample_bounds(bbox, voxel_size);
    // an inverted box (from degenerate parameters) samples nothing
    let extent = |lo: i32, hi: i32| (hi - lo + 1).max(0) as usize;
    let nx = extent(min[0], max[0]);
    let ny = extent(min[1], max[1]);
    let nz = extent(min[2], max[2]);
    let total = nx
        .checked_mul(ny)
        .and_then(|t| t.checked_mul(nz))
        .ok_or(Error::InvalidParameter {
            param: "res",
            value: voxel_size,
            reason: "produces too many voxels",
        })?;
    tracing::info!(
        "resolution={}: {}x{}x{} voxels",
        voxel_size,
        nx,
        ny,
        nz
    );

    let start = Instant::now();
    let values: Vec<f32> = (0..total)
        .into_par_iter()
        .map(|idx| {
            let x = min[0] + (idx % nx) as i32;
            let y = min[1] + ((idx / nx) % ny) as i32;
            let z = min[2] + (idx / (nx * ny)) as i32;
            eval.dist(
                f64::from(x) * voxel_size,
                f64::from(y) * voxel_size,
                f64::from(z) * voxel_size,
                0.0,
            ) as f32
        })
        .collect();
    let elapsed = start.elapsed().as_secs_f64();
    tracing::info!(
        "rendered {} voxels in {:.3}s ({:.0} voxels/s)",
        total,
        elapsed,
        total as f64 / elapsed.max(1e-9)
    );

    Ok(VoxelGrid::new(voxel_size, min, [nx, ny, nz], values))
}
