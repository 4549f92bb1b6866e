//! `cachet manifest`: fingerprint a tree without running processors.

use crate::cli::ManifestArgs;
use crate::commands::require_dir;
use crate::config::{CachetConfig, ConfigOverrides};
use crate::error::{CliError, Result};
use crate::ui;
use cachet::assets::logical_path_in;
use cachet::AssetManager;

/// Execute the manifest command.
pub async fn execute(args: ManifestArgs) -> Result<()> {
    let config = CachetConfig::load(args.config.as_deref(), &ConfigOverrides::default())?;

    let dir = args.dir.unwrap_or_else(|| config.input_dir.clone());
    require_dir(&dir)?;
    let output = args.output.unwrap_or_else(|| config.manifest_path());

    let manager = AssetManager::disk(&dir, config.manager_options(false));
    let target = output.clone();
    let entries = tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut manifest = manager.generate_manifest()?;
        if let Some(own_entry) = logical_path_in(&manager.fs().location(), &target) {
            manifest.remove(&own_entry);
        }
        manifest.save(&target)?;
        Ok(manifest.len())
    })
    .await
    .map_err(|e| CliError::Custom(format!("Manifest task failed: {e}")))??;

    ui::success(&format!("Wrote {} entries to {}", entries, output.display()));
    Ok(())
}
