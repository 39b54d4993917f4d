//! Procedural asset generator for the portfolio scenes
//!
//! Builds every built-in recipe into an `.ncscene` file:
//! - Skill badges (React, TypeScript, Node.js, ... Networking)
//! - The hero sculpture (always compressed at level 6)
//!
//! ## Naming Convention
//!
//! Each recipe `{name}` is written to `{output}/{name}.ncscene`; skill badges
//! go to the `skills/` subdirectory when building everything.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use scene_export::{BatchConfig, BatchPolicy, BatchReport, ExportOptions, run_batch};

mod hero;
mod recipe;
mod skills;

use recipe::Recipe;

#[derive(Parser)]
#[command(name = "gen-assets")]
#[command(about = "Generate procedural 3D scenes for the skill badges and hero sculpture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BuildArgs {
    /// Quantize and bit-pack vertex data
    #[arg(short, long)]
    compress: bool,

    /// Compression level, 0 (finest) to 8 (smallest); implies --compress
    #[arg(short, long)]
    level: Option<u8>,

    /// Stop scheduling new assets after the first failure
    #[arg(long)]
    fail_fast: bool,
}

impl BuildArgs {
    fn config(&self, out_dir: PathBuf) -> Result<BatchConfig> {
        let options = match (self.compress, self.level) {
            (_, Some(level)) => ExportOptions::compressed(level),
            (true, None) => ExportOptions::compressed(6),
            (false, None) => ExportOptions::uncompressed(),
        };
        options.validate()?;
        Ok(BatchConfig {
            out_dir,
            options,
            policy: if self.fail_fast {
                BatchPolicy::FailFast
            } else {
                BatchPolicy::Continue
            },
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate skill badge scenes
    Skills {
        /// Output directory for generated scenes
        #[arg(short, long, default_value = "public/models/skills")]
        output: PathBuf,

        /// Only build these skills
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        #[command(flatten)]
        build: BuildArgs,
    },
    /// Generate the hero sculpture scene
    Hero {
        /// Output directory for generated scenes
        #[arg(short, long, default_value = "public/models")]
        output: PathBuf,

        #[command(flatten)]
        build: BuildArgs,
    },
    /// Generate all scenes
    All {
        /// Base output directory
        #[arg(short, long, default_value = "public/models")]
        output: PathBuf,

        #[command(flatten)]
        build: BuildArgs,
    },
    /// List built-in recipes
    List,
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
        Commands::Skills { output, only, build } => {
            println!("=== Skill Badge Generation ===");
            let selected = select_skills(&only)?;
            let report = run_batch(&selected, &build.config(output)?);
            finish(&[report])
        }
        Commands::Hero { output, build } => {
            println!("=== Hero Sculpture Generation ===");
            let report = run_batch(&[hero::HERO], &build.config(output)?);
            finish(&[report])
        }
        Commands::All { output, build } => {
            println!("=== Generating ALL Scenes ===\n");

            println!("--- SKILLS ---");
            let skills = run_batch(skills::SKILLS, &build.config(output.join("skills"))?);

            println!("\n--- HERO ---");
            let hero = run_batch(&[hero::HERO], &build.config(output)?);

            finish(&[skills, hero])
        }
        Commands::List => {
            for recipe in skills::SKILLS.iter().chain([&hero::HERO]) {
                println!("  {:<16} {}", recipe.name, recipe.title);
            }
            Ok(())
        }
    }
}

/// Recipes named in `only`, or every skill when it is empty
fn select_skills(only: &[String]) -> Result<Vec<&'static Recipe>> {
    if only.is_empty() {
        return Ok(skills::SKILLS.iter().collect());
    }
    only.iter()
        .map(|name| match skills::SKILLS.iter().find(|r| r.name == name.as_str()) {
            Some(recipe) => Ok(recipe),
            None => bail!("Unknown skill '{name}' (see `gen-assets list`)"),
        })
        .collect()
}

/// Print per-scene results and fail if any asset failed
fn finish(reports: &[BatchReport]) -> Result<()> {
    let mut failed = 0;
    for report in reports {
        for scene in &report.exported {
            println!(
                "    -> {} ({} nodes, {} verts, {} tris, {} bytes)",
                scene.path.display(),
                scene.nodes,
                scene.vertices,
                scene.triangles,
                scene.bytes
            );
        }
        for failure in &report.failures {
            eprintln!("  FAILED: {failure}");
        }
        failed += report.failures.len();
    }
    if failed > 0 {
        bail!("{failed} assets failed");
    }
    println!("\n=== All scenes generated successfully ===");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_export::{AssetRecipe, decode_scene, encode_scene};

    #[test]
    fn test_every_recipe_builds() {
        for recipe in skills::SKILLS.iter().chain([&hero::HERO]) {
            let scene = recipe.build().unwrap_or_else(|e| panic!("{}: {e}", recipe.name));
            assert!(!scene.nodes.is_empty(), "{}", recipe.name);
            for node in &scene.nodes {
                assert!(node.mesh.validate().is_ok(), "{}", recipe.name);
                assert!(scene.material(node).is_some(), "{}", recipe.name);
            }
        }
    }

    #[test]
    fn test_skill_names_are_unique() {
        let mut names: Vec<_> = skills::SKILLS.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), skills::SKILLS.len());
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_hero_is_centred_and_compressed() {
        let scene = hero::HERO.build().unwrap();
        assert_eq!(scene.nodes.len(), 1);
        let (min, max) = scene.nodes[0].mesh.bounds().unwrap();
        assert!(((min + max) * 0.5).length() < 1e-4);
        // 64 x 16 quads, subdivided twice
        assert_eq!(scene.nodes[0].mesh.face_count(), 64 * 16 * 16);

        let options = hero::HERO.export_options(ExportOptions::uncompressed());
        assert_eq!(options, ExportOptions::compressed(6));
        let bytes = encode_scene(&scene, &options).unwrap().bytes;
        assert!(decode_scene(&bytes).unwrap().header.is_compressed());
    }

    #[test]
    fn test_react_materials_glow() {
        let scene = skills::SKILLS[0].build().unwrap();
        let core = scene.materials.get("ReactCore").unwrap();
        assert!(core.is_emissive());
        assert_eq!(core.emission_strength, 0.5);
        // Nucleus, then ring and electron per orbit
        assert_eq!(scene.nodes.len(), 7);
    }

    #[test]
    fn test_skills_batch_writes_every_scene() {
        let dir = tempfile::tempdir().unwrap();
        let args = BuildArgs {
            compress: false,
            level: Some(8),
            fail_fast: true,
        };
        let report = run_batch(skills::SKILLS, &args.config(dir.path().to_path_buf()).unwrap());
        assert!(report.is_success());
        assert_eq!(report.exported.len(), skills::SKILLS.len());
        for (scene, recipe) in report.exported.iter().zip(skills::SKILLS) {
            assert_eq!(scene.path, scene_export::output_path(dir.path(), recipe.name));
            assert_eq!(std::fs::metadata(&scene.path).unwrap().len() as usize, scene.bytes);
        }
    }

    #[test]
    fn test_select_skills() {
        let picked = select_skills(&["rust".into(), "c".into()]).unwrap();
        assert_eq!(picked.iter().map(|r| r.name).collect::<Vec<_>>(), ["rust", "c"]);
        assert!(select_skills(&["cobol".into()]).is_err());
        assert_eq!(select_skills(&[]).unwrap().len(), 10);
    }
}
