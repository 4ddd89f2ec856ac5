// src/config.rs

//! Stage configuration
//!
//! A run is driven by one immutable [`StageConfig`], normally read from a TOML
//! stage file and then adjusted by command-line overrides before the
//! controller is constructed.
//!
//! # Example stage.toml
//!
//! ```toml
//! directory = "target"
//! input-file-name = "app.jar"
//! config-file = "obfuscator.json"
//! classpath = ["lib/a.jar", "lib/b.jar"]
//! attach = true
//! attach-artifact-classifier = "shaded"
//!
//! [project]
//! group-id = "com.example"
//! artifact-id = "app"
//!
//! [engine]
//! program = "java"
//! args = ["-jar", "tools/obfuscator.jar"]
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default directory holding the input and generated archives
pub const DEFAULT_DIRECTORY: &str = "target";

/// Default attached artifact type
pub const DEFAULT_ATTACH_TYPE: &str = "jar";

/// Full configuration for one stage run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StageConfig {
    /// Input archive name, relative to `directory`.
    /// Defaults to `<final-name>.jar`.
    #[serde(default)]
    pub input_file_name: Option<String>,

    /// Output archive name. Ignored when `attach` is set.
    #[serde(default)]
    pub output_file_name: Option<String>,

    /// Directory containing the input and generated archives
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Engine configuration file, passed through as the config payload
    #[serde(default)]
    pub config_file: Option<PathBuf>,

    /// Engine script file, read as UTF-8
    #[serde(default)]
    pub script_file: Option<PathBuf>,

    /// Compile classpath handed to the engine, in order
    #[serde(default)]
    pub classpath: Vec<String>,

    /// Dependency exclusions, passed through untouched
    #[serde(default)]
    pub exclusions: Vec<String>,

    /// Attach the produced archive to the project under a classifier
    #[serde(default)]
    pub attach: bool,

    #[serde(default = "default_attach_type")]
    pub attach_artifact_type: String,

    /// Ignored unless `attach` is set
    #[serde(default)]
    pub attach_artifact_classifier: String,

    /// Include the classifier in the derived output file name
    #[serde(default = "default_true")]
    pub append_classifier: bool,

    /// Abort the enclosing build on any error
    #[serde(default = "default_true")]
    pub fail_on_error: bool,

    #[serde(default)]
    pub skip: bool,

    #[serde(default)]
    pub project: ProjectCoordinates,

    #[serde(default)]
    pub engine: EngineConfig,
}

/// Identity of the project whose archive is being processed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectCoordinates {
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub artifact_id: String,
    /// Build final name; falls back to `artifact-id`
    #[serde(default)]
    pub final_name: Option<String>,
}

impl ProjectCoordinates {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            final_name: None,
        }
    }

    /// Final name of the build output, without extension
    pub fn final_name(&self) -> &str {
        self.final_name.as_deref().unwrap_or(&self.artifact_id)
    }
}

/// How to launch the external transform engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Engine executable
    #[serde(default)]
    pub program: Option<PathBuf>,

    /// Arguments placed before the generated ones
    #[serde(default)]
    pub args: Vec<String>,

    /// Kill the engine after this many seconds (no limit when unset)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl EngineConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DIRECTORY)
}

fn default_attach_type() -> String {
    DEFAULT_ATTACH_TYPE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            input_file_name: None,
            output_file_name: None,
            directory: default_directory(),
            config_file: None,
            script_file: None,
            classpath: Vec::new(),
            exclusions: Vec::new(),
            attach: false,
            attach_artifact_type: default_attach_type(),
            attach_artifact_classifier: String::new(),
            append_classifier: true,
            fail_on_error: true,
            skip: false,
            project: ProjectCoordinates::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl StageConfig {
    /// Config for `input` inside `directory`, everything else defaulted
    pub fn new(directory: impl Into<PathBuf>, input: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            input_file_name: Some(input.into()),
            ..Default::default()
        }
    }

    /// Load a stage file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse stage file contents
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Effective input file name; empty when neither it nor a final name is set
    pub fn input_file_name(&self) -> String {
        match &self.input_file_name {
            Some(name) => name.clone(),
            None if self.project.final_name().is_empty() => String::new(),
            None => format!("{}.jar", self.project.final_name()),
        }
    }

    /// Location of the input archive. Pure computation, touches nothing.
    pub fn input_path(&self) -> PathBuf {
        self.directory.join(self.input_file_name())
    }

    /// True when the classifier takes part in naming and publishing
    pub fn use_artifact_classifier(&self) -> bool {
        self.append_classifier && !self.attach_artifact_classifier.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StageConfig::from_toml_str("").unwrap();
        assert_eq!(config.directory, PathBuf::from("target"));
        assert_eq!(config.attach_artifact_type, "jar");
        assert!(config.append_classifier);
        assert!(config.fail_on_error);
        assert!(!config.attach);
        assert!(!config.skip);
        assert!(config.classpath.is_empty());
    }

    #[test]
    fn test_parse_full_stage_file() {
        let toml = r#"
            directory = "build/libs"
            input-file-name = "app.jar"
            output-file-name = "app-out.jar"
            classpath = ["a.jar", "b.jar"]
            exclusions = ["org.slf4j:*"]
            attach = true
            attach-artifact-classifier = "shaded"
            fail-on-error = false

            [project]
            group-id = "com.example"
            artifact-id = "app"

            [engine]
            program = "java"
            args = ["-jar", "obf.jar"]
            timeout-secs = 60
        "#;

        let config = StageConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.input_path(), PathBuf::from("build/libs/app.jar"));
        assert_eq!(config.output_file_name.as_deref(), Some("app-out.jar"));
        assert_eq!(config.classpath, vec!["a.jar", "b.jar"]);
        assert_eq!(config.exclusions, vec!["org.slf4j:*"]);
        assert!(config.attach);
        assert!(!config.fail_on_error);
        assert_eq!(config.project.group_id, "com.example");
        assert_eq!(config.engine.args, vec!["-jar", "obf.jar"]);
        assert_eq!(config.engine.timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_input_name_defaults_to_final_name() {
        let mut config = StageConfig::default();
        config.project = ProjectCoordinates::new("com.example", "app");
        assert_eq!(config.input_file_name(), "app.jar");

        config.project.final_name = Some("app-1.2.0".to_string());
        assert_eq!(config.input_file_name(), "app-1.2.0.jar");
    }

    #[test]
    fn test_blank_classifier_is_not_used() {
        let mut config = StageConfig::new("target", "app.jar");
        config.attach_artifact_classifier = "   ".to_string();
        assert!(!config.use_artifact_classifier());

        config.attach_artifact_classifier = "shaded".to_string();
        assert!(config.use_artifact_classifier());

        config.append_classifier = false;
        assert!(!config.use_artifact_classifier());
    }

    #[test]
    fn test_unknown_type_is_parse_error() {
        let result = StageConfig::from_toml_str("attach = \"yes\"");
        assert!(matches!(result, Err(crate::Error::ConfigParse(_))));
    }
}
