//! Parallel batch export
//!
//! Each asset is built and exported on its own rayon worker with its own
//! `AssetContext`, so material tables and scene builders are never shared.
//! Results come back in input order.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use proc_gen::Scene;
use rayon::prelude::*;
use scene_common::SCENE_EXTENSION;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::BuildError;
use crate::export::{ExportOptions, ExportReport, export_scene};

/// What to do with the rest of a batch once an asset fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BatchPolicy {
    /// Report the failure and keep building the other assets
    #[default]
    Continue,
    /// Skip every asset that has not started yet
    FailFast,
}

/// Something that can be built into one exported scene
pub trait AssetRecipe: Sync {
    /// Asset name; also the output file stem
    fn name(&self) -> &str;

    /// Build the scene from a fresh asset context
    fn build(&self) -> proc_gen::Result<Scene>;

    /// Encoder settings for this asset, given the batch defaults
    fn export_options(&self, defaults: ExportOptions) -> ExportOptions {
        defaults
    }
}

impl<R: AssetRecipe + ?Sized> AssetRecipe for &R {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn build(&self) -> proc_gen::Result<Scene> {
        (**self).build()
    }

    fn export_options(&self, defaults: ExportOptions) -> ExportOptions {
        (**self).export_options(defaults)
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub out_dir: PathBuf,
    pub options: ExportOptions,
    pub policy: BatchPolicy,
}

/// Outcome of a batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub exported: Vec<ExportReport>,
    /// Failed assets, followed by the ones skipped under `FailFast`
    pub failures: Vec<BuildError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.failures.iter().filter(|f| f.is_skipped()).count()
    }
}

/// Output path of an asset inside `out_dir`
pub fn output_path(out_dir: &Path, asset: &str) -> PathBuf {
    out_dir.join(format!("{asset}.{SCENE_EXTENSION}"))
}

fn build_one<R: AssetRecipe>(recipe: &R, config: &BatchConfig) -> Result<ExportReport, BuildError> {
    let asset = recipe.name();
    let scene = recipe.build().map_err(|error| BuildError::Generate {
        asset: asset.to_string(),
        error,
    })?;
    let options = recipe.export_options(config.options);
    export_scene(&scene, &output_path(&config.out_dir, asset), &options).map_err(|error| {
        BuildError::Export {
            asset: asset.to_string(),
            error,
        }
    })
}

/// Build and export every recipe
pub fn run_batch<R: AssetRecipe>(recipes: &[R], config: &BatchConfig) -> BatchReport {
    let abort = AtomicBool::new(false);

    let results: Vec<Result<ExportReport, BuildError>> = recipes
        .par_iter()
        .map(|recipe| {
            if abort.load(Ordering::Acquire) {
                return Err(BuildError::Skipped {
                    asset: recipe.name().to_string(),
                });
            }
            let result = build_one(recipe, config);
            if let Err(err) = &result {
                warn!("{err}");
                if config.policy == BatchPolicy::FailFast {
                    abort.store(true, Ordering::Release);
                }
            }
            result
        })
        .collect();

    let mut report = BatchReport::default();
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(exported) => report.exported.push(exported),
            Err(err) if err.is_skipped() => skipped.push(err),
            Err(err) => report.failures.push(err),
        }
    }
    report.failures.extend(skipped);

    info!(
        exported = report.exported.len(),
        failed = report.failures.len() - report.skipped(),
        skipped = report.skipped(),
        "batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use proc_gen::mesh::{MeshApply, Subdivide, cuboid};
    use proc_gen::{AssetContext, MaterialParams};
    use tempfile::tempdir;

    struct Recipe {
        name: &'static str,
        levels: u32,
    }

    impl AssetRecipe for Recipe {
        fn name(&self) -> &str {
            self.name
        }

        fn build(&self) -> proc_gen::Result<Scene> {
            let mut ctx = AssetContext::new(self.name);
            ctx.define_material("M", &MaterialParams::new(0x808080, 0.5, 0.5))?;
            let mesh = cuboid(Vec3::ONE)?.apply(Subdivide { levels: self.levels })?;
            ctx.add_node(mesh, "M", Mat4::IDENTITY)?;
            Ok(ctx.finish())
        }
    }

    fn config(out_dir: &Path, policy: BatchPolicy) -> BatchConfig {
        BatchConfig {
            out_dir: out_dir.to_path_buf(),
            options: ExportOptions::default(),
            policy,
        }
    }

    #[test]
    fn test_continue_builds_the_rest() {
        let dir = tempdir().unwrap();
        let recipes = [
            Recipe { name: "a", levels: 1 },
            Recipe { name: "broken", levels: 99 },
            Recipe { name: "c", levels: 0 },
        ];
        let report = run_batch(&recipes, &config(dir.path(), BatchPolicy::Continue));

        assert!(!report.is_success());
        assert_eq!(report.exported.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].asset(), "broken");
        assert!(report.failures[0].to_string().contains("subdivide: invalid levels"));
        assert!(output_path(dir.path(), "a").exists());
        assert!(output_path(dir.path(), "c").exists());
        assert!(!output_path(dir.path(), "broken").exists());
    }

    #[test]
    fn test_reports_in_input_order() {
        let dir = tempdir().unwrap();
        let recipes: Vec<Recipe> = ["x", "y", "z"]
            .into_iter()
            .map(|name| Recipe { name, levels: 1 })
            .collect();
        let report = run_batch(&recipes, &config(dir.path(), BatchPolicy::FailFast));

        assert!(report.is_success());
        let names: Vec<_> = report
            .exported
            .iter()
            .map(|r| r.path.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["x", "y", "z"]);
    }

    #[test]
    fn test_fail_fast_skips_remaining_assets() {
        let dir = tempdir().unwrap();
        let recipes = [
            Recipe { name: "first", levels: 1 },
            Recipe { name: "broken", levels: 99 },
            Recipe { name: "c", levels: 1 },
            Recipe { name: "d", levels: 0 },
            Recipe { name: "e", levels: 1 },
        ];
        // One worker visits the recipes in order
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let report = pool.install(|| run_batch(&recipes, &config(dir.path(), BatchPolicy::FailFast)));

        assert!(!report.is_success());
        assert_eq!(report.exported.len(), 1);
        assert!(output_path(dir.path(), "first").exists());

        assert_eq!(report.skipped(), 3);
        let failures: Vec<_> = report.failures.iter().map(|f| (f.asset(), f.is_skipped())).collect();
        assert_eq!(
            failures,
            [("broken", false), ("c", true), ("d", true), ("e", true)]
        );
        for name in ["broken", "c", "d", "e"] {
            assert!(!output_path(dir.path(), name).exists(), "{name}");
        }
    }

    #[test]
    fn test_fail_fast_single_failure_is_not_skipped() {
        let dir = tempdir().unwrap();
        let recipes = [Recipe { name: "broken", levels: 99 }];
        let report = run_batch(&recipes, &config(dir.path(), BatchPolicy::FailFast));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.skipped(), 0);
    }

    #[test]
    fn test_policy_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: BatchPolicy,
        }
        let w: Wrapper = toml::from_str(r#"policy = "fail-fast""#).unwrap();
        assert_eq!(w.policy, BatchPolicy::FailFast);
    }
}
