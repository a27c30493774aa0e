use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use wasm_builder::manifest::Manifest;
use wasm_builder::render::{self, OutputFormat};

/// Build, run and inspect WebAssembly modules that export globals
#[derive(Parser)]
#[clap(name = "wasm-builder", version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode the module described by a manifest
    Build {
        /// Path to the JSON manifest
        #[clap(value_parser, value_name = "MANIFEST")]
        manifest: PathBuf,
        /// Output file (stdout if omitted)
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
        #[clap(long, value_enum, default_value = "raw")]
        format: OutputFormat,
    },
    /// Instantiate the module described by a manifest and print its exports
    Run {
        #[clap(value_parser, value_name = "MANIFEST")]
        manifest: PathBuf,
        /// Print each export's WebAssembly type and exact value
        #[clap(long)]
        typed: bool,
    },
    /// Compile a binary module and list its globals and exports
    Inspect {
        #[clap(value_parser, value_name = "FILE")]
        module: PathBuf,
    },
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let json = fs::read_to_string(path).with_context(|| format!("reading manifest {}", path.display()))?;
    Manifest::from_json(&json).with_context(|| format!("parsing manifest {}", path.display()))
}

fn build(manifest: &Path, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let builder = read_manifest(manifest)?.to_builder()?;
    let bytes = builder.to_bytes()?;
    info!("encoded {} bytes", bytes.len());

    let encoded = render::encode_output(&bytes, format);

    match output {
        Some(path) => fs::write(path, &encoded).with_context(|| format!("writing {}", path.display()))?,
        None => io::stdout().write_all(&encoded)?,
    }
    Ok(())
}

fn run(manifest: &Path, typed: bool) -> Result<()> {
    let manifest = read_manifest(manifest)?;
    let instance = manifest
        .to_builder()?
        .instantiate_with(&manifest.import_object()?)
        .context("instantiating module")?;

    println!("{}", serde_json::to_string_pretty(&render::exports_json(&instance, typed))?);
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let report = render::inspect_report(&name, &bytes).with_context(|| format!("compiling {}", path.display()))?;
    print!("{report}");
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            manifest,
            output,
            format,
        } => build(&manifest, output.as_deref(), format),
        Commands::Run { manifest, typed } => run(&manifest, typed),
        Commands::Inspect { module } => inspect(&module),
    }
}
