//! Integration tests running the export pipeline end to end

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use lostwax_engine::{
    Error, EvalBackend, ExportParams, ExportStats, MeshFormat, export_shape,
};
use lostwax_field::{Environment, Shape};
use lostwax_scene::recognize;
use serde_json::json;

fn have_cc() -> bool {
    std::process::Command::new("cc")
        .arg("--version")
        .output()
        .is_ok()
}

fn shape_of(scene: &serde_json::Value) -> Shape {
    recognize(scene, &Environment::new()).expect("scene should recognize")
}

fn export_stl(shape: &Shape, params: &ExportParams) -> (String, ExportStats) {
    let mut out = Vec::new();
    let stats = export_shape(
        shape,
        params,
        EvalBackend::Interpreted,
        MeshFormat::Stl,
        &mut out,
    )
    .expect("export should succeed");
    (String::from_utf8(out).expect("stl is ascii"), stats)
}

#[test]
fn sphere_exports_stl_end_to_end() {
    let shape = shape_of(&json!({"sphere": {"radius": 1}}));
    let params = ExportParams {
        res: Some(0.25),
        adaptivity: 0.0,
    };
    let (stl, stats) = export_stl(&shape, &params);

    // bounds are floor(-4)-2 ..= ceil(4)+2 per axis, 13 samples each
    assert_eq!(stats.voxels, 13 * 13 * 13);
    assert_eq!(stats.triangles, 0);
    assert!(stats.quads > 0);
    assert!(stats.points > 0);

    assert!(stl.starts_with("solid curv\n"));
    assert!(stl.ends_with("endsolid curv\n"));
    // each quad splits into exactly two facets
    let facets = stl.matches("facet normal 0 0 0").count();
    assert_eq!(facets, stats.quads * 2);
}

#[test]
fn obj_counts_match_the_statistics() {
    let shape = shape_of(&json!({"sphere": {"radius": 1}}));
    let params = ExportParams {
        res: Some(0.25),
        adaptivity: 0.0,
    };
    let mut out = Vec::new();
    let stats = export_shape(
        &shape,
        &params,
        EvalBackend::Interpreted,
        MeshFormat::Obj,
        &mut out,
    )
    .expect("export should succeed");
    let obj = String::from_utf8(out).expect("obj is ascii");

    let vertex_lines = obj.lines().filter(|l| l.starts_with("v ")).count();
    let face_lines = obj.lines().filter(|l| l.starts_with("f ")).count();
    assert_eq!(vertex_lines, stats.points);
    assert_eq!(face_lines, stats.triangles + stats.quads);
    // quads stay 4-cycles in OBJ
    assert!(obj.lines().any(|l| l.starts_with("f ") && l.split(' ').count() == 5));
}

#[test]
fn empty_extraction_warns_but_succeeds() {
    // a small sphere centred between lattice points: no sample is inside
    let shape = shape_of(&json!({"translate": {
        "offset": [0.25, 0.25, 0.25],
        "shape": {"sphere": {"radius": 0.2}},
    }}));
    let params = ExportParams {
        res: Some(0.5),
        adaptivity: 0.0,
    };
    let (stl, stats) = export_stl(&shape, &params);
    assert_eq!(stats.triangles, 0);
    assert_eq!(stats.quads, 0);
    assert_eq!(stl, "solid curv\nendsolid curv\n");
}

#[test]
fn two_dimensional_shapes_are_rejected() {
    let shape = shape_of(&json!({"circle": {"radius": 1}}));
    let mut out = Vec::new();
    let err = export_shape(
        &shape,
        &ExportParams::default(),
        EvalBackend::Interpreted,
        MeshFormat::Stl,
        &mut out,
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotAShape(_)));
    assert_eq!(err.to_string(), "mesh export: not a 3D shape");
    assert!(out.is_empty());
}

#[test]
fn infinite_shapes_are_rejected_before_sampling() {
    for scene in [
        json!({"half_space": {}}),
        json!({"union": [{"sphere": {"radius": 1}}, {"half_space": {}}]}),
    ] {
        let shape = shape_of(&scene);
        let mut out = Vec::new();
        let err = export_shape(
            &shape,
            &ExportParams::default(),
            EvalBackend::Interpreted,
            MeshFormat::Stl,
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InfiniteShape));
        assert_eq!(err.to_string(), "mesh export: shape is infinite");
        assert!(out.is_empty());
    }
}

#[test]
fn unbound_inputs_fail_before_any_backend_runs() {
    // the rotation angle does not affect the bounds, so recognition
    // succeeds and the export entry check has to catch the free input
    let scene = json!({"rotate_y": {
        "angle": {"input": "spin"},
        "shape": {"sphere": {"radius": 1}},
    }});
    let shape = recognize(&scene, &Environment::new()).expect("bounds are angle-free");
    let mut out = Vec::new();
    let err = export_shape(
        &shape,
        &ExportParams::default(),
        EvalBackend::Interpreted,
        MeshFormat::Stl,
        &mut out,
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnresolvedInput(name) if name == "spin"));
}

#[test]
fn time_varying_shapes_export_the_time_zero_frame() {
    let scene = json!({"sphere": {"radius":
        {"add": [1, {"mul": [0.25, {"sin": {"input": "time"}}]}]}
    }});
    let shape = recognize(&scene, &Environment::with_time()).expect("time binds to t");
    let params = ExportParams {
        res: Some(0.25),
        adaptivity: 0.0,
    };
    let (_, stats) = export_stl(&shape, &params);
    assert!(stats.quads > 0);
}

#[test]
fn adaptivity_reduces_polygon_count() {
    let shape = shape_of(&json!({"sphere": {"radius": 1}}));
    let fine = ExportParams {
        res: Some(0.125),
        adaptivity: 0.0,
    };
    let merged = ExportParams {
        res: Some(0.125),
        adaptivity: 1.0,
    };
    let (_, full) = export_stl(&shape, &fine);
    let (_, simplified) = export_stl(&shape, &merged);
    let full_faces = full.triangles + full.quads;
    let simplified_faces = simplified.triangles + simplified.quads;
    assert!(simplified_faces < full_faces);
}

#[test]
fn compiled_backend_writes_the_same_file() {
    if !have_cc() {
        eprintln!("No C compiler found, skipping test");
        return;
    }
    // the sphere field uses only IEEE-exact operations, so compiled and
    // interpreted samples agree bit for bit
    let shape = shape_of(&json!({"sphere": {"radius": 1}}));
    let params = ExportParams {
        res: Some(0.25),
        adaptivity: 0.0,
    };
    let mut interpreted = Vec::new();
    export_shape(
        &shape,
        &params,
        EvalBackend::Interpreted,
        MeshFormat::Stl,
        &mut interpreted,
    )
    .expect("interpreted export should succeed");
    let mut compiled = Vec::new();
    export_shape(
        &shape,
        &params,
        EvalBackend::Compiled,
        MeshFormat::Stl,
        &mut compiled,
    )
    .expect("compiled export should succeed");
    assert_eq!(interpreted, compiled);
}
