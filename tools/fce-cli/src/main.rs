//! fce-cli - FCE mesh inspector and converter
//!
//! Thin consumer of `fce-core`: sniffs versions, validates and dumps
//! file structure, and converts between FCE3/FCE4/FCE4M.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use fce_core::{decode, encode, sniff_version, validate, FceVersion};

#[derive(Parser)]
#[command(name = "fce-cli")]
#[command(about = "FCE mesh inspector and converter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a structural summary of an FCE file
    Info {
        /// Input .fce file
        input: PathBuf,
    },

    /// Check a file's structural integrity
    Validate {
        /// Input .fce file
        input: PathBuf,
    },

    /// Print the detected format version
    Version {
        /// Input .fce file
        input: PathBuf,
    },

    /// Convert a file to another FCE version
    Convert {
        /// Input .fce file
        input: PathBuf,

        /// Output .fce file
        output: PathBuf,

        /// Target version: 3, 4, or 4M
        #[arg(short, long)]
        target: String,

        /// Re-center the leading parts on their vertex centroids
        #[arg(long)]
        center_parts: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info { input } => cmd_info(&input),
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Version { input } => cmd_version(&input),
        Commands::Convert {
            input,
            output,
            target,
            center_parts,
        } => cmd_convert(&input, &output, &target, center_parts),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read input: {path:?}"))
}

fn cmd_info(input: &Path) -> Result<()> {
    let bytes = read_input(input)?;
    let version = sniff_version(&bytes)?;
    let mesh = decode(&bytes)?;
    println!("Format         = {version}");
    println!("FileSize       = {}", bytes.len());
    print!("{}", mesh.info()?);
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<()> {
    let bytes = read_input(input)?;
    if validate(&bytes) {
        println!("{}: valid", input.display());
        Ok(())
    } else {
        bail!("{}: invalid FCE data", input.display());
    }
}

fn cmd_version(input: &Path) -> Result<()> {
    let bytes = read_input(input)?;
    println!("{}", sniff_version(&bytes)?);
    Ok(())
}

fn cmd_convert(input: &Path, output: &Path, target: &str, center_parts: bool) -> Result<()> {
    let target: FceVersion = target
        .parse()
        .with_context(|| format!("Invalid target version: {target:?}"))?;
    let bytes = read_input(input)?;
    let source = sniff_version(&bytes)?;

    let mut mesh = decode(&bytes)?;
    let out = encode(&mut mesh, target, center_parts)?;
    std::fs::write(output, &out).with_context(|| format!("Failed to write output: {output:?}"))?;

    tracing::info!(
        "Converted {source} -> {target}: {} parts, {} vertices, {} triangles, {} bytes",
        mesh.num_parts(),
        mesh.num_vertices(),
        mesh.num_triangles(),
        out.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fce_core::Mesh;

    #[test]
    fn test_cli_parses_convert() {
        let cli = Cli::try_parse_from([
            "fce-cli",
            "convert",
            "in.fce",
            "out.fce",
            "--target",
            "4M",
            "--center-parts",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert {
                target,
                center_parts,
                ..
            } => {
                assert_eq!(target, "4M");
                assert!(center_parts);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_convert_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("car.fce");
        let dst = dir.path().join("car4.fce");

        let mut mesh = Mesh::new();
        let faces = [0u32, 1, 2];
        let uvs = [0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0];
        let positions = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = [0.0f32, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        mesh.add_geometry_as_new_part(&faces, &uvs, &positions, &normals)
            .unwrap();
        mesh.set_part_name(0, ":HB").unwrap();
        let bytes = encode(&mut mesh, FceVersion::Fce3, false).unwrap();
        std::fs::write(&src, &bytes).unwrap();

        cmd_convert(&src, &dst, "4", false).unwrap();
        let out = std::fs::read(&dst).unwrap();
        assert_eq!(sniff_version(&out).unwrap(), FceVersion::Fce4);
        assert!(validate(&out));
    }
}
