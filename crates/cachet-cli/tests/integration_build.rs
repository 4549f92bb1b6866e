//! Integration tests for the build, manifest and url commands.
//!
//! These run the command functions directly against scratch directories.

use cachet_cli::cli::ManifestArgs;
use cachet_cli::commands::{build, manifest, url};
use cachet_cli::config::{CachetConfig, ProcessorKind, ProcessorSpec};
use cachet_cli::CliError;
use regex::Regex;
use std::fs;
use tempfile::TempDir;

fn project() -> (TempDir, CachetConfig) {
    let temp = TempDir::new().unwrap();
    let assets = temp.path().join("assets");
    fs::create_dir_all(assets.join("js")).unwrap();
    fs::write(assets.join("app.css"), "body{color:red}").unwrap();
    fs::write(assets.join("js/app.js"), "console.log(1)").unwrap();
    fs::write(assets.join("notes.md"), "# not shipped").unwrap();

    let config = CachetConfig {
        input_dir: assets,
        output_dir: temp.path().join("dist"),
        ..CachetConfig::default()
    };
    (temp, config)
}

#[tokio::test]
async fn test_production_build_writes_manifest() {
    let (temp, mut config) = project();
    config.processors = vec![ProcessorSpec {
        name: "static".to_string(),
        kind: ProcessorKind::Copy,
        command: None,
        args: Vec::new(),
        file_types: vec!["css".to_string(), "js".to_string()],
    }];

    let report = build::run(&config, false).await.unwrap();
    assert_eq!(report.processors_run, vec!["static"]);
    assert_eq!(report.manifest_entries, Some(2));

    let dist = temp.path().join("dist");
    assert!(dist.join("app.css").is_file());
    assert!(dist.join("js/app.js").is_file());
    assert!(!dist.join("notes.md").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dist.join("manifest.json")).unwrap()).unwrap();
    let css = manifest["app.css"].as_str().unwrap();
    assert!(Regex::new(r"^app\.[0-9a-f]{8}\.css$").unwrap().is_match(css));
}

#[tokio::test]
async fn test_dev_build_skips_manifest() {
    let (temp, config) = project();

    let report = build::run(&config, true).await.unwrap();
    assert_eq!(report.manifest_entries, None);
    assert!(temp.path().join("dist/notes.md").is_file());
    assert!(!temp.path().join("dist/manifest.json").exists());
}

#[tokio::test]
async fn test_missing_input_dir() {
    let (temp, mut config) = project();
    config.input_dir = temp.path().join("missing");

    let err = build::run(&config, false).await.unwrap_err();
    assert!(matches!(err, CliError::FileNotFound(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_processor_is_named() {
    let (_temp, mut config) = project();
    config.processors = vec![ProcessorSpec {
        name: "broken".to_string(),
        kind: ProcessorKind::Command,
        command: Some("false".to_string()),
        args: Vec::new(),
        file_types: Vec::new(),
    }];

    let err = build::run(&config, false).await.unwrap_err();
    assert!(matches!(
        err,
        CliError::Asset(cachet::AssetError::Processor { ref name, .. }) if name == "broken"
    ));
}

#[tokio::test]
async fn test_url_after_build() {
    let (_temp, config) = project();
    build::run(&config, false).await.unwrap();

    let prod = url::resolve(&config, "js/app.js", false).unwrap();
    assert!(
        Regex::new(r"^/static/js/app\.[0-9a-f]{8}\.js$").unwrap().is_match(&prod),
        "unexpected url {prod}"
    );
    assert_eq!(url::resolve(&config, "js/app.js", true).unwrap(), "/static/js/app.js");
}

#[tokio::test]
async fn test_manifest_command_fingerprints_input() {
    let (temp, _config) = project();
    let output = temp.path().join("out/manifest.json");
    let config_path = temp.path().join("cachet.config.json");
    fs::write(
        &config_path,
        format!(
            r#"{{ "inputDir": {:?} }}"#,
            temp.path().join("assets").display().to_string()
        ),
    )
    .unwrap();

    manifest::execute(ManifestArgs {
        config: Some(config_path),
        dir: None,
        output: Some(output.clone()),
    })
    .await
    .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
    assert_eq!(written.as_object().unwrap().len(), 3);
    assert!(written.get("notes.md").is_some());
}

#[tokio::test]
async fn test_manifest_command_skips_its_own_file() {
    let (temp, _config) = project();
    let assets = temp.path().join("assets");
    let config_path = temp.path().join("cachet.config.json");
    fs::write(&config_path, "{}").unwrap();
    for _ in 0..2 {
        manifest::execute(ManifestArgs {
            config: Some(config_path.clone()),
            dir: Some(assets.clone()),
            output: Some(assets.join("manifest.json")),
        })
        .await
        .unwrap();
    }

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(assets.join("manifest.json")).unwrap()).unwrap();
    assert!(written.get("manifest.json").is_none());
    assert_eq!(written.as_object().unwrap().len(), 3);
}
