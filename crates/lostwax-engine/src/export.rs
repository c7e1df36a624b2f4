//! One-way export pipeline from shape to mesh file
//!
//! Stages run in order: exportability checks, evaluator construction
//! (native code by default), voxel sampling, isosurface extraction,
//! serialization. Statistics go to the diagnostic stream and come back
//! to the caller.

use crate::error::{Error, Result};
use crate::params::ExportParams;
use lostwax_codegen::CompiledShape;
use lostwax_field::{Evaluator, Interpreter, Shape};
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    /// The conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::Obj => "obj",
        }
    }

    /// Pick a format from a file path's extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "stl" => Some(MeshFormat::Stl),
            "obj" => Some(MeshFormat::Obj),
            _ => None,
        }
    }
}

/// How the distance field is evaluated during sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalBackend {
    /// Generate C, compile it and load the native evaluator.
    #[default]
    Compiled,
    /// Walk the expression graph directly. Slower, needs no toolchain.
    Interpreted,
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportStats {
    pub triangles: usize,
    pub quads: usize,
    pub points: usize,
    pub voxels: usize,
    pub voxel_size: f64,
}

impl ExportStats {
    /// The statistics as a wire record, fields in reporting order.
    pub fn to_wire(&self, format: MeshFormat, path: &str) -> lostwax_wire::Value {
        use lostwax_wire::Value;
        Value::Record(vec![
            ("format".to_string(), Value::str(format.extension())),
            ("path".to_string(), Value::str(path)),
            ("triangles".to_string(), Value::Num(self.triangles as f64)),
            ("quads".to_string(), Value::Num(self.quads as f64)),
            ("points".to_string(), Value::Num(self.points as f64)),
            ("voxels".to_string(), Value::Num(self.voxels as f64)),
            ("resolution".to_string(), Value::Num(self.voxel_size)),
        ])
    }
}

impl fmt::Display for ExportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.triangles == 0 && self.quads == 0 {
            return write!(f, "no polygons");
        }
        if self.triangles > 0 {
            write!(f, "{} triangles", self.triangles)?;
            if self.quads > 0 {
                write!(f, ", ")?;
            }
        }
        if self.quads > 0 {
            write!(f, "{} quads", self.quads)?;
        }
        Ok(())
    }
}

/// Export a shape as a polygon mesh.
///
/// Rejects 2D-only shapes, unbounded shapes and shapes with unbound
/// reactive inputs before any evaluator is built. An extraction that
/// yields no polygons is reported as a warning and still writes a valid
/// (empty) file.
pub fn export_shape<W: Write>(
    shape: &Shape,
    params: &ExportParams,
    backend: EvalBackend,
    format: MeshFormat,
    out: &mut W,
) -> Result<ExportStats> {
    if !shape.is_3d {
        return Err(Error::NotAShape("mesh export: not a 3D shape".to_string()));
    }
    if !shape.bbox.volume().is_finite() {
        return Err(Error::InfiniteShape);
    }
    let free = shape.free_inputs();
    if !free.is_empty() {
        let names: Vec<String> = free.into_iter().collect();
        return Err(Error::UnresolvedInput(names.join(", ")));
    }

    let eval: Box<dyn Evaluator> = match backend {
        EvalBackend::Compiled => Box::new(CompiledShape::compile(shape)?),
        EvalBackend::Interpreted => Box::new(Interpreter::new(shape)?),
    };

    lostwax_mesh::init();
    let grid = lostwax_mesh::voxelize(&shape.bbox, eval.as_ref(), params.res)?;
    let mesh = lostwax_mesh::extract(&grid, params.adaptivity)?;

    match format {
        MeshFormat::Stl => lostwax_mesh::write_stl(out, &mesh)?,
        MeshFormat::Obj => lostwax_mesh::write_obj(out, &mesh)?,
    }

    let stats = ExportStats {
        triangles: mesh.triangles.len(),
        quads: mesh.quads.len(),
        points: mesh.points.len(),
        voxels: grid.voxel_count(),
        voxel_size: grid.voxel_size(),
    };
    if mesh.is_empty() {
        tracing::warn!(
            "no mesh was created (no volumes were found). \
             Maybe you should try a smaller resolution."
        );
    } else if params.adaptivity < 1.0 {
        tracing::info!("{stats}. Use '-O adaptive' to reduce triangle count.");
    } else {
        tracing::info!("{stats}.");
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> ExportStats {
        ExportStats {
            triangles: 12,
            quads: 4,
            points: 14,
            voxels: 729,
            voxel_size: 0.25,
        }
    }

    #[test]
    fn format_from_path_uses_the_extension() {
        assert_eq!(
            MeshFormat::from_path(Path::new("out/model.STL")),
            Some(MeshFormat::Stl)
        );
        assert_eq!(
            MeshFormat::from_path(Path::new("model.obj")),
            Some(MeshFormat::Obj)
        );
        assert_eq!(MeshFormat::from_path(Path::new("model.gltf")), None);
        assert_eq!(MeshFormat::from_path(Path::new("model")), None);
    }

    #[test]
    fn stats_display_matches_reporting_style() {
        assert_eq!(stats().to_string(), "12 triangles, 4 quads");
        let only_quads = ExportStats {
            triangles: 0,
            ..stats()
        };
        assert_eq!(only_quads.to_string(), "4 quads");
        let only_triangles = ExportStats {
            quads: 0,
            ..stats()
        };
        assert_eq!(only_triangles.to_string(), "12 triangles");
        let empty = ExportStats {
            triangles: 0,
            quads: 0,
            ..stats()
        };
        assert_eq!(empty.to_string(), "no polygons");
    }

    #[test]
    fn stats_encode_as_a_wire_record() {
        let record = stats().to_wire(MeshFormat::Stl, "demo.stl");
        assert_eq!(
            lostwax_wire::write_value(&record),
            "{\"format\":\"stl\",\"path\":\"demo.stl\",\"triangles\":12,\
             \"quads\":4,\"points\":14,\"voxels\":729,\"resolution\":0.25}"
        );
    }
}
