//! `cachet build`: run the pipeline once.

use crate::cli::BuildArgs;
use crate::commands::{cancel_on_ctrl_c, require_dir};
use crate::config::{CachetConfig, ConfigOverrides};
use crate::error::Result;
use crate::ui;
use cachet::{AssetManager, BuildReport, Context};
use std::sync::Arc;

/// Execute the build command.
///
/// Production builds fingerprint the output directory and write the
/// manifest; `--dev` builds skip both.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        input_dir: args.input.clone(),
        output_dir: args.output.clone(),
        minify: args.minify.then_some(true),
        clean_output: args.clean.then_some(true),
        ..ConfigOverrides::default()
    };
    let config = CachetConfig::load(args.config.as_deref(), &overrides)?;

    run(&config, args.dev).await.map(|_| ())
}

/// Build with a loaded configuration.
pub async fn run(config: &CachetConfig, dev: bool) -> Result<BuildReport> {
    require_dir(&config.input_dir)?;

    let mut pipeline = config.build_pipeline(dev);
    let manager = (!dev).then(|| {
        Arc::new(AssetManager::disk(
            &config.output_dir,
            config.manager_options(false),
        ))
    });
    if let Some(manager) = &manager {
        pipeline = pipeline.with_manager(Arc::clone(manager));
    }

    let (ctx, handle) = Context::with_cancel();
    let interrupt = cancel_on_ctrl_c(handle);

    let spinner = ui::Spinner::new(&format!(
        "Building {} -> {}",
        config.input_dir.display(),
        config.output_dir.display()
    ));
    let result = pipeline.build(&ctx).await;
    interrupt.abort();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            spinner.fail("Build failed");
            return Err(e.into());
        }
    };
    spinner.finish(&format!(
        "Ran {} in {}",
        report.processors_run.join(", "),
        ui::format_duration(report.duration)
    ));

    match manager.as_ref().and_then(|m| m.manifest()) {
        Some(manifest) => {
            let entries: Vec<(String, String, u64)> = manifest
                .iter()
                .map(|(logical, fingerprinted)| {
                    let size = std::fs::metadata(config.output_dir.join(logical))
                        .map(|m| m.len())
                        .unwrap_or(0);
                    (logical.to_string(), fingerprinted.to_string(), size)
                })
                .collect();
            ui::print_asset_summary(&entries, report.duration);
            ui::success(&format!(
                "Manifest written to {}",
                config.manifest_path().display()
            ));
        }
        None => ui::info("Development build: manifest skipped"),
    }

    Ok(report)
}
