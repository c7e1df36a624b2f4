//! Surface nets isosurface extraction
//!
//! Places one vertex in every grid cell whose corners straddle the zero
//! level set, at the mean of the cell's edge crossings, then connects
//! one quad across every sign-changing lattice edge. Native winding is
//! inward; the serializers reverse it on output. Adaptivity above zero
//! merges vertices whose gradient normals agree, trading fidelity for
//! polygon count.

use crate::Mesh;
use crate::error::{Error, Result};
use crate::grid::VoxelGrid;
use glam::Vec3;
use std::sync::OnceLock;

/// Corner offsets of one cell and the 12 edges connecting them.
/// Corner k sits at bit offsets (k&1, k>>1&1, k>>2&1).
struct CellTables {
    corners: [[i32; 3]; 8],
    edges: [(usize, usize); 12],
}

impl CellTables {
    fn build() -> Self {
        let mut corners = [[0i32; 3]; 8];
        for (k, c) in corners.iter_mut().enumerate() {
            *c = [
                (k & 1) as i32,
                ((k >> 1) & 1) as i32,
                ((k >> 2) & 1) as i32,
            ];
        }
        let mut edges = [(0usize, 0usize); 12];
        let mut n = 0;
        for a in 0..8usize {
            for bit in [1usize, 2, 4] {
                if a & bit == 0 {
                    edges[n] = (a, a | bit);
                    n += 1;
                }
            }
        }
        debug_assert_eq!(n, 12);
        Self { corners, edges }
    }
}

static TABLES: OnceLock<CellTables> = OnceLock::new();

/// One-time initialization of the meshing backend. Idempotent; also
/// runs implicitly on first extraction.
pub fn init() {
    let _ = TABLES.get_or_init(CellTables::build);
}

fn tables() -> &'static CellTables {
    TABLES.get_or_init(CellTables::build)
}

fn inside(v: f32) -> bool {
    v < 0.0
}

/// Extract the zero level set of a sampled distance grid.
///
/// `adaptivity` in `[0, 1]` controls simplification: 0 follows voxel
/// resolution exactly, 1 merges most aggressively. Values outside the
/// range (including NaN) are rejected.
pub fn extract(grid: &VoxelGrid, adaptivity: f64) -> Result<Mesh> {
    if !(0.0..=1.0).contains(&adaptivity) {
        return Err(Error::InvalidParameter {
            param: "adaptive",
            value: adaptivity,
            reason: "must be in range 0...1",
        });
    }
    let t = tables();

    let min = grid.min();
    let dim = grid.dim();
    // cells span lattice points [c, c+1], one less than samples per axis
    let cx = dim[0].saturating_sub(1);
    let cy = dim[1].saturating_sub(1);
    let cz = dim[2].saturating_sub(1);
    let vs = grid.voxel_size() as f32;

    let mut cell_vertex = vec![u32::MAX; cx * cy * cz];
    let mut points: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();

    for iz in 0..cz {
        for iy in 0..cy {
            for ix in 0..cx {
                let base = [
                    min[0] + ix as i32,
                    min[1] + iy as i32,
                    min[2] + iz as i32,
                ];
                let mut vals = [0.0f32; 8];
                let mut mask = 0usize;
                for (k, off) in t.corners.iter().enumerate() {
                    let v = grid.value(base[0] + off[0], base[1] + off[1], base[2] + off[2]);
                    vals[k] = v;
                    if inside(v) {
                        mask |= 1 << k;
                    }
                }
                if mask == 0 || mask == 0xff {
                    continue;
                }

                // vertex at the mean of the cell's edge crossings
                let mut sum = Vec3::ZERO;
                let mut count = 0u32;
                for &(a, b) in &t.edges {
                    let va = vals[a];
                    let vb = vals[b];
                    if inside(va) == inside(vb) {
                        continue;
                    }
                    let s = va / (va - vb);
                    let pa = corner_vec(t.corners[a]);
                    let pb = corner_vec(t.corners[b]);
                    sum += pa + (pb - pa) * s;
                    count += 1;
                }
                // a sign-mixed cell always has at least one crossing
                let local = sum / count as f32;
                let world =
                    (Vec3::new(base[0] as f32, base[1] as f32, base[2] as f32) + local) * vs;

                // forward-difference gradient across the cell, for adaptivity
                let mut grad = Vec3::ZERO;
                for (k, &v) in vals.iter().enumerate() {
                    if k & 1 == 0 {
                        grad.x += vals[k | 1] - v;
                    }
                    if k & 2 == 0 {
                        grad.y += vals[k | 2] - v;
                    }
                    if k & 4 == 0 {
                        grad.z += vals[k | 4] - v;
                    }
                }

                cell_vertex[(iz * cy + iy) * cx + ix] = points.len() as u32;
                points.push(world);
                normals.push(grad.normalize_or_zero());
            }
        }
    }

    // one quad per sign-changing lattice edge, spanning the four cells
    // around that edge; cyclic axis order keeps (u, v, axis) right-handed
    let mut quads: Vec<[u32; 4]> = Vec::new();
    for axis in 0..3usize {
        let (au, av) = match axis {
            0 => (1, 2),
            1 => (2, 0),
            _ => (0, 1),
        };
        let mut p = [0usize; 3];
        for pa in 0..dim[axis].saturating_sub(1) {
            for pu in 1..dim[au].saturating_sub(1) {
                for pv in 1..dim[av].saturating_sub(1) {
                    p[axis] = pa;
                    p[au] = pu;
                    p[av] = pv;
                    let wx = min[0] + p[0] as i32;
                    let wy = min[1] + p[1] as i32;
                    let wz = min[2] + p[2] as i32;
                    let va = grid.value(wx, wy, wz);
                    let mut q = [wx, wy, wz];
                    q[axis] += 1;
                    let vb = grid.value(q[0], q[1], q[2]);
                    if inside(va) == inside(vb) {
                        continue;
                    }

                    let cell_at = |cu: usize, cv: usize| {
                        let mut c = [0usize; 3];
                        c[axis] = pa;
                        c[au] = cu;
                        c[av] = cv;
                        cell_vertex[(c[2] * cy + c[1]) * cx + c[0]]
                    };
                    // every incident cell shares both edge endpoints, so
                    // each is sign-mixed and already has a vertex
                    let i00 = cell_at(pu - 1, pv - 1);
                    let i10 = cell_at(pu, pv - 1);
                    let i11 = cell_at(pu, pv);
                    let i01 = cell_at(pu - 1, pv);
                    if inside(va) {
                        quads.push([i00, i01, i11, i10]);
                    } else {
                        quads.push([i00, i10, i11, i01]);
                    }
                }
            }
        }
    }

    let mesh = Mesh {
        points,
        triangles: Vec::new(),
        quads,
    };
    if adaptivity > 0.0 && !mesh.quads.is_empty() {
        return Ok(simplify(&mesh, &normals, adaptivity));
    }
    Ok(mesh)
}

fn corner_vec(c: [i32; 3]) -> Vec3 {
    Vec3::new(c[0] as f32, c[1] as f32, c[2] as f32)
}

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut i: u32) -> u32 {
        while self.parent[i as usize] != i {
            let p = self.parent[i as usize];
            self.parent[i as usize] = self.parent[p as usize];
            i = self.parent[i as usize];
        }
        i
    }
}

/// Merge vertices along quad edges while their cluster normals agree,
/// then rebuild faces over the cluster centroids. Quads that lose a
/// corner become triangles; faces left with fewer than three distinct
/// corners are dropped.
fn simplify(mesh: &Mesh, normals: &[Vec3], adaptivity: f64) -> Mesh {
    let threshold = (1.0 - adaptivity) as f32;
    let n = mesh.points.len();
    let mut uf = UnionFind::new(n);
    // running unnormalized normal sum per cluster root
    let mut cluster_normal: Vec<Vec3> = normals.to_vec();

    for quad in &mesh.quads {
        for e in 0..4 {
            let ri = uf.find(quad[e]);
            let rj = uf.find(quad[(e + 1) % 4]);
            if ri == rj {
                continue;
            }
            let ni = cluster_normal[ri as usize].normalize_or_zero();
            let nj = cluster_normal[rj as usize].normalize_or_zero();
            if ni.dot(nj) >= threshold {
                let nj_sum = cluster_normal[rj as usize];
                cluster_normal[ri as usize] += nj_sum;
                uf.parent[rj as usize] = ri;
            }
        }
    }

    // number clusters in first-touch order and average member positions
    let mut new_index = vec![u32::MAX; n];
    let mut position_sum: Vec<Vec3> = Vec::new();
    let mut member_count: Vec<u32> = Vec::new();
    for i in 0..n as u32 {
        let r = uf.find(i) as usize;
        if new_index[r] == u32::MAX {
            new_index[r] = position_sum.len() as u32;
            position_sum.push(Vec3::ZERO);
            member_count.push(0);
        }
        let ni = new_index[r] as usize;
        position_sum[ni] += mesh.points[i as usize];
        member_count[ni] += 1;
    }
    let points: Vec<Vec3> = position_sum
        .iter()
        .zip(&member_count)
        .map(|(sum, count)| *sum / *count as f32)
        .collect();

    let mut triangles = Vec::new();
    let mut quads = Vec::new();
    for tri in &mesh.triangles {
        let m = tri.map(|i| new_index[uf.find(i) as usize]);
        if m[0] != m[1] && m[1] != m[2] && m[0] != m[2] {
            triangles.push(m);
        }
    }
    for quad in &mesh.quads {
        let m = quad.map(|i| new_index[uf.find(i) as usize]);
        let mut distinct: Vec<u32> = Vec::with_capacity(4);
        for &v in &m {
            if !distinct.contains(&v) {
                distinct.push(v);
            }
        }
        match distinct.len() {
            4 => quads.push(m),
            3 => triangles.push([distinct[0], distinct[1], distinct[2]]),
            _ => {}
        }
    }

    Mesh {
        points,
        triangles,
        quads,
    }
}
