//! Processor trait and the built-in processors.
//!
//! A processor is one opaque build step (a CSS compiler, a JS bundler, a plain
//! copy). The pipeline only knows its name, the file types it claims and how
//! to run it.

use crate::assets::resolve_path;
use crate::context::Context;
use crate::error::BoxError;
use crate::pipeline::config::ProcessorConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use walkdir::WalkDir;

/// A pluggable build step.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Run the step. Long-running processors should observe `ctx`.
    async fn process(&self, ctx: &Context, config: &ProcessorConfig) -> Result<(), BoxError>;

    /// Extensions this processor handles, without the dot (`"css"`).
    fn file_types(&self) -> &[String];
}

/// Copies matching files from the input tree to the output tree.
///
/// An empty file type list copies everything. The output directory is skipped
/// when it lives inside the input directory.
#[derive(Debug, Clone)]
pub struct CopyProcessor {
    name: String,
    file_types: Vec<String>,
}

impl CopyProcessor {
    pub fn new<I, S>(file_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::named("copy", file_types)
    }

    pub fn named<I, S>(name: impl Into<String>, file_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            file_types: file_types
                .into_iter()
                .map(|t| normalize_file_type(&t.into()))
                .collect(),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        if self.file_types.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.file_types.iter().any(|t| *t == ext)
            })
    }

    fn copy_tree(&self, ctx: &Context, config: &ProcessorConfig) -> Result<usize, BoxError> {
        let input = &config.input_dir;
        let output = &config.output_dir;
        let mut copied = 0;

        // Output nested in the input, relative to the input root.
        let nested_output = resolve_path(output)
            .strip_prefix(resolve_path(input))
            .map(Path::to_path_buf)
            .ok();
        if nested_output
            .as_ref()
            .is_some_and(|rel| rel.as_os_str().is_empty())
        {
            return Err(format!(
                "output directory {} is the input directory",
                output.display()
            )
            .into());
        }

        let walker = WalkDir::new(input).into_iter().filter_entry(|entry| {
            let Some(nested) = &nested_output else {
                return true;
            };
            !entry
                .path()
                .strip_prefix(input)
                .is_ok_and(|rel| rel.starts_with(nested))
        });

        for entry in walker {
            if ctx.is_cancelled() {
                return Err("copy cancelled".into());
            }

            let entry = entry?;
            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }

            let relative = entry.path().strip_prefix(input)?;
            let target = output.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }

        Ok(copied)
    }
}

#[async_trait]
impl Processor for CopyProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, ctx: &Context, config: &ProcessorConfig) -> Result<(), BoxError> {
        let this = self.clone();
        let ctx = ctx.clone();
        let config = config.clone();

        let copied = tokio::task::spawn_blocking(move || this.copy_tree(&ctx, &config)).await??;
        tracing::debug!(processor = %self.name, files = copied, "copied assets");
        Ok(())
    }

    fn file_types(&self) -> &[String] {
        &self.file_types
    }
}

/// Runs an external command as a build step.
///
/// `{input}` and `{output}` in arguments are replaced with the configured
/// directories. The child also gets `CACHET_INPUT_DIR`, `CACHET_OUTPUT_DIR`,
/// `CACHET_DEV`, `CACHET_MINIFY` and `CACHET_SOURCE_MAPS` in its
/// environment. The child is killed if the context is cancelled.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    name: String,
    program: String,
    args: Vec<String>,
    file_types: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandProcessor {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            file_types: Vec::new(),
            cwd: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn file_types<I, S>(mut self, file_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_types = file_types
            .into_iter()
            .map(|t| normalize_file_type(&t.into()))
            .collect();
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn expand(&self, arg: &str, config: &ProcessorConfig) -> String {
        arg.replace("{input}", &config.input_dir.to_string_lossy())
            .replace("{output}", &config.output_dir.to_string_lossy())
    }
}

#[async_trait]
impl Processor for CommandProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, ctx: &Context, config: &ProcessorConfig) -> Result<(), BoxError> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(self.args.iter().map(|arg| self.expand(arg, config)))
            .env("CACHET_INPUT_DIR", &config.input_dir)
            .env("CACHET_OUTPUT_DIR", &config.output_dir)
            .env("CACHET_DEV", bool_env(config.dev))
            .env("CACHET_MINIFY", bool_env(config.minify))
            .env("CACHET_SOURCE_MAPS", bool_env(config.source_maps))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        tracing::debug!(processor = %self.name, program = %self.program, "running command");

        let output = tokio::select! {
            _ = ctx.cancelled() => return Err(format!("'{}' cancelled", self.program).into()),
            output = command.output() => output
                .map_err(|e| format!("failed to spawn '{}': {}", self.program, e))?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(if detail.is_empty() {
                format!("'{}' exited with {}", self.program, output.status)
            } else {
                format!("'{}' exited with {}: {}", self.program, output.status, detail)
            }
            .into());
        }

        Ok(())
    }

    fn file_types(&self) -> &[String] {
        &self.file_types
    }
}

fn normalize_file_type(file_type: &str) -> String {
    file_type.trim_start_matches('.').to_ascii_lowercase()
}

fn bool_env(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
