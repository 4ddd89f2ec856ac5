// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use obfuscator_stage::{ArtifactRegistry, PublishedArtifact, Result, StageConfig, TransformRequest};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Prefix the fake engine writes in front of the input bytes
pub const TRANSFORMED_PREFIX: &str = "obfuscated:";

/// Create a build directory holding `app.jar` with known contents.
///
/// Returns (TempDir, directory) - keep the TempDir alive to prevent cleanup.
pub fn setup_build_dir() -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let directory = temp_dir.path().join("target");
    fs::create_dir_all(&directory).unwrap();
    fs::write(directory.join("app.jar"), "original bytes").unwrap();
    (temp_dir, directory)
}

/// Stage config for `app.jar` in `directory` with project coordinates set
pub fn stage_config(directory: &Path) -> StageConfig {
    let mut config = StageConfig::new(directory, "app.jar");
    config.project.group_id = "com.example".to_string();
    config.project.artifact_id = "app".to_string();
    config
}

/// Engine that writes the prefixed input to the output path
pub fn transforming_engine(request: &TransformRequest) -> io::Result<bool> {
    let content = fs::read_to_string(&request.input_path)?;
    fs::write(
        &request.output_path,
        format!("{}{}", TRANSFORMED_PREFIX, content),
    )?;
    Ok(true)
}

/// Engine that declines every input without writing anything
pub fn rejecting_engine(_: &TransformRequest) -> io::Result<bool> {
    Ok(false)
}

/// Sorted file names directly inside `dir`
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Registry that keeps everything it is handed, shareable with the test
#[derive(Clone, Default)]
pub struct RecordingRegistry {
    pub artifacts: Arc<Mutex<Vec<PublishedArtifact>>>,
}

impl RecordingRegistry {
    pub fn recorded(&self) -> Vec<PublishedArtifact> {
        self.artifacts.lock().unwrap().clone()
    }
}

impl ArtifactRegistry for RecordingRegistry {
    fn register_artifact(&self, artifact: &PublishedArtifact) -> Result<()> {
        self.artifacts.lock().unwrap().push(artifact.clone());
        Ok(())
    }
}
