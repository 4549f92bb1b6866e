use crate::config::{CachetConfig, ProcessorKind};
use crate::error::{ConfigError, Result};
use cachet::assets::is_within;
use std::collections::HashSet;

impl CachetConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.static_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "staticPrefix".to_string(),
                value: format!("'{}'", self.static_prefix),
                hint: "Use a non-empty URL prefix such as /static/".to_string(),
            }
            .into());
        }

        if self.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "debounceMs".to_string(),
                value: "0".to_string(),
                hint: "Use a positive number of milliseconds (100 is a good default)".to_string(),
            }
            .into());
        }

        if self.clean_output && is_within(&self.input_dir, &self.output_dir) {
            return Err(ConfigError::InvalidValue {
                field: "cleanOutput".to_string(),
                value: "true".to_string(),
                hint: format!(
                    "outputDir {} contains inputDir {}, so cleaning it would delete the sources. Use a separate outputDir",
                    self.output_dir.display(),
                    self.input_dir.display()
                ),
            }
            .into());
        }

        let mut names = HashSet::new();
        for processor in &self.processors {
            if processor.name.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "processors[].name".to_string(),
                    hint: "Every processor needs a name for logs and errors".to_string(),
                }
                .into());
            }

            if !names.insert(processor.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "processors".to_string(),
                    value: processor.name.clone(),
                    hint: "Processor names must be unique".to_string(),
                }
                .into());
            }

            let has_command = processor
                .command
                .as_deref()
                .is_some_and(|command| !command.trim().is_empty());
            if processor.kind == ProcessorKind::Command && !has_command {
                return Err(ConfigError::MissingField {
                    field: format!("processors.{}.command", processor.name),
                    hint: "Processors of kind 'command' need a program to run".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}
