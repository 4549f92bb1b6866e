//! `cachet dev`: build, serve, watch, rebuild and live-reload.
//!
//! Lifecycle:
//! - Initial development build
//! - HTTP server for assets, SSE events and the reload script
//! - Watch loop that rebuilds on change and broadcasts `reload`
//! - Ctrl+C cancels the shared context and shuts everything down

use crate::cli::DevArgs;
use crate::commands::require_dir;
use crate::config::{CachetConfig, ConfigOverrides};
use crate::error::{CliError, Result};
use crate::ui;
use cachet::dev::{EVENTS_PATH, RELOAD_SCRIPT_PATH};
use cachet::{AssetManager, Context, DevServer, FileWatcher};
use std::sync::Arc;

/// Execute the dev command.
pub async fn execute(args: DevArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        port: args.port,
        host: args.host.clone(),
        ..ConfigOverrides::default()
    };
    let config = CachetConfig::load(args.config.as_deref(), &overrides)?;
    require_dir(&config.input_dir)?;
    let addr = config.socket_addr()?;

    let manager = Arc::new(AssetManager::disk(
        &config.output_dir,
        config.manager_options(true),
    ));
    let pipeline = Arc::new(config.build_pipeline(true).with_manager(Arc::clone(&manager)));

    ui::info("Performing initial build...");
    match pipeline.build(&Context::background()).await {
        Ok(report) => ui::success(&format!(
            "Initial build completed in {}",
            ui::format_duration(report.duration)
        )),
        Err(e) => {
            ui::error("Initial build failed");
            return Err(e.into());
        }
    }

    let watcher = FileWatcher::new(config.watcher_config())?;
    for path in config.watch_paths() {
        watcher.add_path(&path)?;
        ui::info(&format!("Watching {}", path.display()));
    }
    for pattern in &config.watch.patterns {
        watcher.add_pattern(pattern)?;
        ui::info(&format!("Watching {}", pattern));
    }

    let server = DevServer::new(pipeline, watcher);
    let app = manager.router().merge(server.router());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::Server(format!("Failed to bind {addr}: {e}")))?;

    let (ctx, handle) = Context::with_cancel();

    let http = {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { ctx.cancelled().await })
                .await
        })
    };
    let watch = {
        let server = Arc::clone(&server);
        let ctx = ctx.clone();
        tokio::spawn(async move { server.start(&ctx).await })
    };

    ui::success(&format!(
        "Serving {} at http://{}{}",
        config.output_dir.display(),
        addr,
        manager.static_prefix()
    ));
    ui::info(&format!(
        "Live reload: <script src=\"{}\"></script> (events at {})",
        RELOAD_SCRIPT_PATH, EVENTS_PATH
    ));

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| CliError::Server(format!("Failed to listen for Ctrl+C: {e}")))?;
    ui::info("Shutting down...");
    handle.cancel();

    watch
        .await
        .map_err(|e| CliError::Server(format!("Watch task failed: {e}")))??;
    http.await
        .map_err(|e| CliError::Server(format!("HTTP task failed: {e}")))?
        .map_err(|e| CliError::Server(e.to_string()))?;

    ui::success("Stopped");
    Ok(())
}
