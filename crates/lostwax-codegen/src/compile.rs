//! Native compilation and loading of generated evaluators
//!
//! The generated C source is written to a scratch file, compiled to a
//! shared library with the system C compiler (override with the
//! `LOSTWAX_CC` environment variable), then loaded and bound to the
//! fixed `dist_`/`colour_` symbols. The library file lives as long as
//! the [`CompiledShape`] and is removed on drop.

// FFI symbol binding and calls through loaded function pointers
#![allow(unsafe_code)]

use crate::error::{Error, Result};
use crate::source::generate;
use glam::DVec3;
use libloading::Library;
use lostwax_field::{Evaluator, Shape};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

type DistFn = unsafe extern "C" fn(f64, f64, f64, f64) -> f64;
type ColourFn = unsafe extern "C" fn(f64, f64, f64, f64, *mut f64);

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

fn scratch_paths() -> (PathBuf, PathBuf) {
    let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    let stem = format!("lostwax-{}-{}", std::process::id(), n);
    let dir = env::temp_dir();
    (
        dir.join(format!("{stem}.c")),
        dir.join(format!("{stem}{}", env::consts::DLL_SUFFIX)),
    )
}

fn compiler() -> String {
    env::var("LOSTWAX_CC").unwrap_or_else(|_| "cc".to_string())
}

/// A shape's fields compiled to native code. Exclusively owns the
/// loaded library; the bound functions are total and pure, so calls
/// need no synchronization.
pub struct CompiledShape {
    dist: DistFn,
    colour: ColourFn,
    path: PathBuf,
    _lib: Library,
}

impl CompiledShape {
    /// Generate, compile and load the evaluator for a fully resolved
    /// shape.
    pub fn compile(shape: &Shape) -> Result<Self> {
        let source = generate(shape)?;
        Self::compile_source(&source)
    }

    /// Compile and load an already generated translation unit.
    pub fn compile_source(source: &str) -> Result<Self> {
        let (c_path, lib_path) = scratch_paths();
        std::fs::write(&c_path, source)?;

        let cc = compiler();
        tracing::debug!("compiling evaluator with {}", cc);
        let output = Command::new(&cc)
            .arg("-shared")
            .arg("-fPIC")
            .arg("-O2")
            .arg("-o")
            .arg(&lib_path)
            .arg(&c_path)
            .arg("-lm")
            .output();
        let _ = std::fs::remove_file(&c_path);

        let output = output.map_err(|e| Error::Toolchain {
            message: format!("failed to run `{cc}`: {e}"),
            source_text: source.to_string(),
        })?;
        if !output.status.success() {
            let _ = std::fs::remove_file(&lib_path);
            return Err(Error::Toolchain {
                message: String::from_utf8_lossy(&output.stderr).into_owned(),
                source_text: source.to_string(),
            });
        }

        // SAFETY: the library was just produced from our own generated
        // source and exports exactly the two expected symbols
        match unsafe { load(&lib_path) } {
            Ok((lib, dist, colour)) => Ok(Self {
                dist,
                colour,
                path: lib_path,
                _lib: lib,
            }),
            Err(e) => {
                let _ = std::fs::remove_file(&lib_path);
                Err(e)
            }
        }
    }

    /// Where the loaded shared library lives until drop.
    pub fn library_path(&self) -> &Path {
        &self.path
    }
}

unsafe fn load(path: &Path) -> Result<(Library, DistFn, ColourFn)> {
    unsafe {
        let lib = Library::new(path)?;
        let dist = *lib.get::<DistFn>(b"dist_")?;
        let colour = *lib.get::<ColourFn>(b"colour_")?;
        Ok((lib, dist, colour))
    }
}

impl Evaluator for CompiledShape {
    fn dist(&self, x: f64, y: f64, z: f64, t: f64) -> f64 {
        // SAFETY: the pointer stays valid while `_lib` is loaded
        unsafe { (self.dist)(x, y, z, t) }
    }

    fn colour(&self, x: f64, y: f64, z: f64, t: f64) -> DVec3 {
        let mut out = [0.0f64; 3];
        // SAFETY: the pointer stays valid while `_lib` is loaded, and
        // the generated function writes exactly three doubles
        unsafe { (self.colour)(x, y, z, t, out.as_mut_ptr()) };
        DVec3::from_array(out)
    }
}

impl Drop for CompiledShape {
    fn drop(&mut self) {
        // the mapping stays usable until `_lib` unloads after this
        let _ = std::fs::remove_file(&self.path);
    }
}
