use cachet::DEFAULT_STATIC_PREFIX;
use std::path::PathBuf;

pub fn default_input_dir() -> PathBuf {
    PathBuf::from("assets")
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from(cachet::pipeline::DEFAULT_OUTPUT_DIR)
}

pub fn default_static_prefix() -> String {
    DEFAULT_STATIC_PREFIX.to_string()
}

pub fn default_port() -> u16 {
    3000
}

pub fn default_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_debounce_ms() -> u64 {
    cachet::dev::DEFAULT_DEBOUNCE.as_millis() as u64
}
