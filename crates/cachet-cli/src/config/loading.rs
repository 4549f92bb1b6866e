use crate::config::CachetConfig;
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cachet.config.json";

/// Prefix for environment overrides, e.g. `CACHET_OUTPUT_DIR`.
const ENV_PREFIX: &str = "CACHET_";

/// Keys accepted from the environment. Nested keys use `__`
/// (`CACHET_WATCH__EXCLUDE`).
const ENV_KEYS: &[&str] = &[
    "inputDir",
    "outputDir",
    "staticPrefix",
    "manifestPath",
    "minify",
    "sourceMaps",
    "cleanOutput",
    "port",
    "host",
    "debounceMs",
];

/// Values given explicitly on the command line. `None` leaves lower layers
/// untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_output: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl CachetConfig {
    /// Load configuration from every source and validate it.
    ///
    /// An explicit `config_path` must exist; the default
    /// `cachet.config.json` is optional.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] for a missing explicit config file
    /// - [`ConfigError::Invalid`] if a source fails to parse or deserialize
    /// - anything [`validate`](Self::validate) rejects
    pub fn load(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let config_file = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()).into());
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        let config = Self::figment(config_file.as_deref(), overrides)
            .extract::<Self>()
            .map_err(|e| ConfigError::Invalid {
                message: e.to_string(),
            })?;

        if let Some(path) = &config_file {
            tracing::debug!(path = %path.display(), "loaded config file");
        }

        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Json::file(path));
        }

        figment
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .lowercase(false)
                    .filter_map(|key| env_key_to_field(key.as_str()).map(Into::into)),
            )
            .merge(Serialized::defaults(overrides))
    }
}

/// `OUTPUT_DIR` -> `outputDir`, `WATCH__EXCLUDE` -> `watch.exclude`.
///
/// Returns `None` for keys that don't name a config field.
fn env_key_to_field(key: &str) -> Option<String> {
    let field = key
        .split("__")
        .map(snake_to_camel)
        .collect::<Vec<_>>()
        .join(".");

    let known = ENV_KEYS.contains(&field.as_str())
        || matches!(field.as_str(), "watch.paths" | "watch.patterns" | "watch.exclude");
    known.then_some(field)
}

fn snake_to_camel(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for (i, word) in segment
        .split('_')
        .filter(|word| !word.is_empty())
        .enumerate()
    {
        let word = word.to_ascii_lowercase();
        if i == 0 {
            out.push_str(&word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.extend(chars);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_mapping() {
        assert_eq!(env_key_to_field("OUTPUT_DIR").as_deref(), Some("outputDir"));
        assert_eq!(env_key_to_field("PORT").as_deref(), Some("port"));
        assert_eq!(env_key_to_field("DEBOUNCE_MS").as_deref(), Some("debounceMs"));
        assert_eq!(
            env_key_to_field("WATCH__EXCLUDE").as_deref(),
            Some("watch.exclude")
        );
        // Variables exported to processors are not config keys.
        assert_eq!(env_key_to_field("DEV"), None);
        assert_eq!(env_key_to_field("INPUT"), None);
    }

    #[test]
    fn test_overrides_only_serialize_set_fields() {
        let overrides = ConfigOverrides {
            port: Some(8080),
            ..ConfigOverrides::default()
        };
        let json = serde_json::to_value(&overrides).unwrap();
        assert_eq!(json, serde_json::json!({ "port": 8080 }));
    }
}
