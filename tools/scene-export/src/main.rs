//! scene-export - procedural scene build tool
//!
//! Builds the assets described by a recipe manifest into `.ncscene` files,
//! and inspects existing scene files.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use scene_export::{BatchConfig, BatchPolicy, ExportOptions, decode_scene, manifest, run_batch};

#[derive(Parser)]
#[command(name = "scene-export")]
#[command(about = "Procedural scene export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every asset in a manifest
    Build {
        /// Path to the scene manifest
        #[arg(default_value = "scenes.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Quantize and bit-pack vertex data (overrides manifest)
        #[arg(short, long)]
        compress: bool,

        /// Compression level, 0 (finest) to 8 (smallest); implies --compress
        #[arg(short, long)]
        level: Option<u8>,

        /// Batch failure policy (overrides manifest)
        #[arg(long, value_enum)]
        policy: Option<BatchPolicy>,
    },

    /// Validate manifest without building
    Check {
        /// Path to the scene manifest
        #[arg(default_value = "scenes.toml")]
        manifest: PathBuf,
    },

    /// Print the contents of an exported scene
    Inspect {
        /// Input .ncscene file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            manifest,
            output,
            compress,
            level,
            policy,
        } => {
            let config = manifest::load_manifest(&manifest)?;

            // Relative output dirs are resolved against the manifest location
            let out_dir = output.unwrap_or_else(|| {
                manifest
                    .parent()
                    .map(|p| p.join(&config.output.dir))
                    .unwrap_or_else(|| config.output.dir.clone())
            });
            let options = match (compress, level) {
                (_, Some(level)) => ExportOptions::compressed(level),
                (true, None) => ExportOptions::compressed(config.output.compression_level),
                (false, None) => config.output.export_options(),
            };
            options.validate()?;

            let batch = BatchConfig {
                out_dir,
                options,
                policy: policy.unwrap_or(config.output.policy),
            };
            let report = run_batch(&config.asset, &batch);
            for failure in &report.failures {
                tracing::error!("{failure}");
            }
            if !report.is_success() {
                bail!(
                    "{} of {} assets failed",
                    report.failures.len(),
                    config.asset.len()
                );
            }
            tracing::info!("Build complete! {} scenes written", report.exported.len());
        }

        Commands::Check { manifest } => {
            let config = manifest::load_manifest(&manifest)?;
            println!("Manifest OK: {} assets", config.asset.len());
            for asset in &config.asset {
                println!(
                    "  {}: {} materials, {} nodes",
                    asset.name,
                    asset.material.len(),
                    asset.node.len()
                );
            }
        }

        Commands::Inspect { file } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let scene = decode_scene(&bytes).with_context(|| format!("Failed to decode {:?}", file))?;

            let header = &scene.header;
            println!("{}: {} bytes", file.display(), bytes.len());
            if header.is_compressed() {
                println!("  compressed (level {})", header.compression_level);
            } else {
                println!("  uncompressed");
            }
            println!(
                "  {} nodes, {} vertices, {} triangles",
                scene.nodes.len(),
                scene.vertex_count(),
                scene.triangle_count()
            );
            for (i, node) in scene.nodes.iter().enumerate() {
                let h = &node.header;
                let [r, g, b] = h.material.base_color;
                println!(
                    "  [{i}] {} verts, {} tris, bits {}/{}/{}, color ({r:.3}, {g:.3}, {b:.3}), metallic {:.2}, roughness {:.2}",
                    h.vertex_count,
                    h.triangle_count(),
                    h.position_bits,
                    h.normal_bits,
                    h.index_bits,
                    h.material.metallic,
                    h.material.roughness,
                );
            }
        }
    }

    Ok(())
}
