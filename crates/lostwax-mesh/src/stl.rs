//! ASCII STL serialization
//!
//! Fixed grammar: a `solid curv` envelope around 7-line facet blocks
//! with an all-zero normal. Quads are split into two triangles on a
//! fixed diagonal. Vertex order is reversed from the extractor's
//! native winding so normals face outward.

use crate::Mesh;
use crate::error::Result;
use glam::Vec3;
use std::io::Write;

pub fn write_stl<W: Write>(out: &mut W, mesh: &Mesh) -> Result<()> {
    writeln!(out, "solid curv")?;
    for tri in &mesh.triangles {
        let [t0, t1, t2] = tri.map(|i| mesh.points[i as usize]);
        put_triangle(out, t0, t2, t1)?;
    }
    for quad in &mesh.quads {
        let [q0, q1, q2, q3] = quad.map(|i| mesh.points[i as usize]);
        put_triangle(out, q0, q2, q1)?;
        put_triangle(out, q0, q3, q2)?;
    }
    writeln!(out, "endsolid curv")?;
    Ok(())
}

fn put_triangle<W: Write>(out: &mut W, v0: Vec3, v1: Vec3, v2: Vec3) -> Result<()> {
    writeln!(out, "facet normal 0 0 0")?;
    writeln!(out, " outer loop")?;
    for v in [v0, v1, v2] {
        writeln!(out, "  vertex {} {} {}", v.x, v.y, v.z)?;
    }
    writeln!(out, " endloop")?;
    writeln!(out, "endfacet")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::grid::{BACKGROUND, VoxelGrid};
    use glam::Vec3;

    fn unit_quad_mesh() -> Mesh {
        Mesh {
            points: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![],
            quads: vec![[0, 1, 2, 3]],
        }
    }

    #[test]
    fn empty_mesh_still_writes_the_envelope() {
        let mesh = Mesh::default();
        let mut out = Vec::new();
        write_stl(&mut out, &mesh).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "solid curv\nendsolid curv\n"
        );
    }

    #[test]
    fn quad_splits_into_two_reversed_triangles() {
        let mut out = Vec::new();
        write_stl(&mut out, &unit_quad_mesh()).unwrap();
        let expected = concat!(
            "solid curv\n",
            "facet normal 0 0 0\n",
            " outer loop\n",
            "  vertex 0 0 0\n",
            "  vertex 1 1 0\n",
            "  vertex 1 0 0\n",
            " endloop\n",
            "endfacet\n",
            "facet normal 0 0 0\n",
            " outer loop\n",
            "  vertex 0 0 0\n",
            "  vertex 0 1 0\n",
            "  vertex 1 1 0\n",
            " endloop\n",
            "endfacet\n",
            "endsolid curv\n",
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn emitted_facets_face_away_from_an_interior_sample() {
        // one inside sample at the origin meshes to a small closed cube
        let mut values = vec![BACKGROUND; 125];
        values[(2 * 5 + 2) * 5 + 2] = -1.0;
        let grid = VoxelGrid::new(1.0, [-2, -2, -2], [5, 5, 5], values);
        let mesh = extract(&grid, 0.0).unwrap();

        let mut out = Vec::new();
        write_stl(&mut out, &mesh).unwrap();
        let text = String::from_utf8(out).unwrap();
        let vertices: Vec<Vec3> = text
            .lines()
            .filter_map(|l| l.trim_start().strip_prefix("vertex "))
            .map(|l| {
                let mut c = l.split(' ').map(|n| n.parse::<f32>().unwrap());
                Vec3::new(c.next().unwrap(), c.next().unwrap(), c.next().unwrap())
            })
            .collect();
        // 6 quads, two facets each
        assert_eq!(vertices.len(), 36);
        for facet in vertices.chunks_exact(3) {
            let normal = (facet[1] - facet[0]).cross(facet[2] - facet[0]);
            let centroid = (facet[0] + facet[1] + facet[2]) / 3.0;
            assert!(
                normal.dot(centroid) > 0.0,
                "facet at {centroid} faces inward"
            );
        }
    }

    #[test]
    fn triangle_swaps_second_and_third_vertex() {
        let mesh = Mesh {
            points: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2]],
            quads: vec![],
        };
        let mut out = Vec::new();
        write_stl(&mut out, &mesh).unwrap();
        let text = String::from_utf8(out).unwrap();
        let vertices: Vec<&str> = text
            .lines()
            .filter(|l| l.trim_start().starts_with("vertex"))
            .collect();
        assert_eq!(
            vertices,
            ["  vertex 0 0 0", "  vertex 0 1 0", "  vertex 1 0 0"]
        );
    }
}
