//! Lostwax CLI - Mesh export for implicit shape descriptions

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use lostwax_engine::{EvalBackend, ExportParams, MeshFormat, export_shape};
use lostwax_field::{Environment, Shape};

#[derive(Parser)]
#[command(name = "lostwax")]
#[command(about = "Compile implicit shape descriptions into mesh files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a shape description to a mesh file
    Export {
        /// Input shape description (JSON)
        input: PathBuf,

        /// Output file (format chosen by extension: .stl or .obj)
        #[arg(short, long)]
        output: PathBuf,

        /// Export option, repeatable (res=N, adaptive[=N])
        #[arg(short = 'O', long = "option", value_name = "KEY[=VALUE]")]
        options: Vec<String>,

        /// Bind a reactive input, repeatable
        #[arg(short = 'D', long = "define", value_name = "NAME=VALUE")]
        defines: Vec<String>,

        /// Distance evaluator used for sampling
        #[arg(long, value_enum, default_value = "compiled")]
        backend: Backend,

        /// Print an export statistics record to stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the generated C source for a shape description
    Source {
        /// Input shape description (JSON)
        input: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bind a reactive input, repeatable
        #[arg(short = 'D', long = "define", value_name = "NAME=VALUE")]
        defines: Vec<String>,
    },

    /// Export a built-in demo shape
    Demo {
        /// Output file
        #[arg(short, long, default_value = "demo.stl")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    /// Compile the distance field to native code
    Compiled,
    /// Walk the expression graph directly
    Interpreted,
}

impl From<Backend> for EvalBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Compiled => EvalBackend::Compiled,
            Backend::Interpreted => EvalBackend::Interpreted,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            options,
            defines,
            backend,
            json,
        } => {
            run_export(&input, &output, &options, &defines, backend.into(), json)?;
        }
        Commands::Source {
            input,
            output,
            defines,
        } => {
            run_source(&input, output.as_deref(), &defines)?;
        }
        Commands::Demo { output } => {
            run_demo(&output)?;
        }
    }

    Ok(())
}

fn run_export(
    input: &Path,
    output: &Path,
    options: &[String],
    defines: &[String],
    backend: EvalBackend,
    json: bool,
) -> Result<()> {
    let shape = load_shape(input, defines)?;
    let params = ExportParams::from_options(options)?;
    let format = output_format(output)?;

    let file =
        fs::File::create(output).with_context(|| format!("cannot create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    let stats = export_shape(&shape, &params, backend, format, &mut writer)?;
    writer.flush()?;

    if json {
        let record = stats.to_wire(format, &output.display().to_string());
        print!("{}", lostwax_wire::write_message(&record));
    }

    Ok(())
}

fn run_source(input: &Path, output: Option<&Path>, defines: &[String]) -> Result<()> {
    let shape = load_shape(input, defines)?;
    let source = lostwax_codegen::generate(&shape)?;
    match output {
        Some(path) => {
            fs::write(path, source).with_context(|| format!("cannot write {}", path.display()))?;
        }
        None => print!("{source}"),
    }
    Ok(())
}

fn run_demo(output: &Path) -> Result<()> {
    println!("Exporting demo shape to {}...", output.display());

    let shape = lostwax_scene::recognize(&demo_scene(), &Environment::new())?;
    let format = output_format(output)?;

    let file =
        fs::File::create(output).with_context(|| format!("cannot create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    let stats = export_shape(
        &shape,
        &ExportParams::default(),
        EvalBackend::default(),
        format,
        &mut writer,
    )?;
    writer.flush()?;

    println!("Exported {stats} to {}", output.display());
    Ok(())
}

fn load_shape(input: &Path, defines: &[String]) -> Result<Shape> {
    let text =
        fs::read_to_string(input).with_context(|| format!("cannot read {}", input.display()))?;
    let scene: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid JSON document", input.display()))?;
    let env = environment(defines)?;
    Ok(lostwax_scene::recognize(&scene, &env)?)
}

/// Builds the input environment from `-D name=value` flags.
///
/// `time` is always bound to the time coordinate, so time-varying
/// descriptions stay reactive instead of becoming free inputs.
fn environment(defines: &[String]) -> Result<Environment> {
    let mut env = Environment::with_time();
    for define in defines {
        let Some((name, value)) = define.split_once('=') else {
            bail!("invalid definition `{define}` (expected NAME=VALUE)");
        };
        let value: f64 = value
            .parse()
            .with_context(|| format!("invalid value for input `{name}` in `{define}`"))?;
        env.bind_num(name, value);
    }
    Ok(env)
}

fn output_format(output: &Path) -> Result<MeshFormat> {
    MeshFormat::from_path(output).with_context(|| {
        format!(
            "cannot tell the mesh format of `{}` (use a .stl or .obj extension)",
            output.display()
        )
    })
}

/// A barrel: a cylinder blended with two rim tori, as a scene description.
fn demo_scene() -> serde_json::Value {
    let rim = |y: f64| {
        serde_json::json!({"translate": {
            "offset": [0.0, y, 0.0],
            "shape": {"torus": {"major": 0.5, "minor": 0.08}},
        }})
    };
    serde_json::json!({"smooth_union": {
        "k": 0.05,
        "shapes": [
            {"smooth_union": {
                "k": 0.05,
                "shapes": [
                    {"cylinder": {"radius": 0.5, "height": 1.2}},
                    rim(0.5),
                ],
            }},
            rim(-0.5),
        ],
    }})
}
