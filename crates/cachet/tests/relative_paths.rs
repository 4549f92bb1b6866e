//! Builds configured with relative paths.
//!
//! Kept in its own test binary because it changes the working directory.

use cachet::{AssetError, Context, CopyProcessor, Pipeline, PipelineConfig};
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_relative_input_and_output_spellings() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("assets/dist")).unwrap();
    fs::write(temp.path().join("assets/app.css"), "body{}").unwrap();
    fs::write(temp.path().join("assets/dist/old.css"), "old").unwrap();
    std::env::set_current_dir(temp.path()).unwrap();

    // Output nested in the input is never copied into itself.
    let mut pipeline = Pipeline::new(
        PipelineConfig::new("./assets")
            .output_dir("assets/dist")
            .dev(true),
    );
    pipeline.add(CopyProcessor::new(["css"]));
    for _ in 0..2 {
        pipeline.build(&Context::background()).await.unwrap();
    }
    assert!(temp.path().join("assets/dist/app.css").is_file());
    assert!(!temp.path().join("assets/dist/dist").exists());

    // Cleaning an output that holds the input is refused.
    let mut pipeline = Pipeline::new(
        PipelineConfig::new("assets/../assets")
            .output_dir("./assets")
            .clean_output(true)
            .dev(true),
    );
    pipeline.add(CopyProcessor::new(["css"]));
    let err = pipeline.build(&Context::background()).await.unwrap_err();
    assert!(matches!(err, AssetError::UnsafeClean { .. }));
    assert!(temp.path().join("assets/app.css").is_file());
}
