//! `cachet url`: print the public URL of one asset.

use crate::cli::UrlArgs;
use crate::config::{CachetConfig, ConfigOverrides};
use crate::error::Result;
use cachet::AssetManager;

/// Execute the url command.
///
/// The URL goes to stdout so it can be captured by scripts.
pub async fn execute(args: UrlArgs) -> Result<()> {
    let config = CachetConfig::load(args.config.as_deref(), &ConfigOverrides::default())?;
    println!("{}", resolve(&config, &args.path, args.dev)?);
    Ok(())
}

/// Resolve a URL against the configured output directory and manifest.
pub fn resolve(config: &CachetConfig, path: &str, dev: bool) -> Result<String> {
    let manager = AssetManager::disk(&config.output_dir, config.manager_options(dev));
    if !dev && !manager.load_manifest(config.manifest_path())? {
        tracing::debug!(
            manifest = %config.manifest_path().display(),
            "no manifest, hashing on demand"
        );
    }
    Ok(manager.url(path))
}
