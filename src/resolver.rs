// src/resolver.rs

//! Path resolution for a stage run
//!
//! Turns a [`StageConfig`] into an [`ArtifactSpec`]: the concrete input
//! location, where the engine should write, and which promotion mode the
//! run uses. When the output must end up at the input path the engine writes
//! to a temporary sibling and the swap protocol promotes it afterwards.

use crate::config::StageConfig;
use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of the temporary engine output in same-artifact mode
pub const TEMP_SUFFIX: &str = "_obfuscated_temp";

/// Suffix the original archive is renamed to in same-artifact mode
pub const BASE_SUFFIX: &str = "_obfuscated_base";

/// Which promotion protocol a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactMode {
    /// Output goes to its own file, input is left alone
    Distinct,
    /// Output replaces the input; the original is kept under [`BASE_SUFFIX`]
    Same,
}

impl fmt::Display for ArtifactMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distinct => write!(f, "distinct-artifact"),
            Self::Same => write!(f, "same-artifact"),
        }
    }
}

/// Resolved locations and naming for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub input_path: PathBuf,
    /// Final output location; `None` in same-artifact mode
    pub output_path: Option<PathBuf>,
    /// Where the engine writes: `output_path`, or the temp sibling
    pub raw_output_path: PathBuf,
    pub directory: PathBuf,
    pub attach: bool,
    pub attach_type: String,
    pub attach_classifier: String,
    pub append_classifier: bool,
    pub mode: ArtifactMode,
}

impl ArtifactSpec {
    pub fn is_same_artifact(&self) -> bool {
        self.mode == ArtifactMode::Same
    }

    /// Trimmed classifier, when it takes part in naming
    pub fn explicit_classifier(&self) -> Option<&str> {
        let classifier = self.attach_classifier.trim();
        if self.append_classifier && !classifier.is_empty() {
            Some(classifier)
        } else {
            None
        }
    }

    /// Where the original archive is parked in same-artifact mode
    pub fn base_path(&self) -> PathBuf {
        sibling_with_suffix(&self.input_path, BASE_SUFFIX, self.input_path.is_dir())
    }

    /// Create the working directory if it is missing
    pub fn ensure_directory(&self) -> Result<()> {
        if self.directory.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.directory).map_err(|e| {
            Error::configuration(format!("can't create {}: {}", self.directory.display(), e))
        })?;
        debug!("Created working directory {}", self.directory.display());
        Ok(())
    }
}

/// Computes an [`ArtifactSpec`] from configuration
pub struct PathResolver;

impl PathResolver {
    /// Resolve paths and make sure the working directory exists.
    ///
    /// Creating the directory is the only side effect.
    pub fn resolve(config: &StageConfig) -> Result<ArtifactSpec> {
        let spec = Self::plan(config)?;
        spec.ensure_directory()?;
        Ok(spec)
    }

    /// Resolve paths without touching the filesystem
    pub fn plan(config: &StageConfig) -> Result<ArtifactSpec> {
        let input_name = config.input_file_name();
        if input_name.trim().is_empty() {
            return Err(Error::configuration("input file name is empty"));
        }

        let output_name = if config.attach {
            if let Some(explicit) = &config.output_file_name {
                debug!(
                    "Ignoring output file name {} because attach derives it",
                    explicit
                );
            }
            Some(attached_file_name(
                &input_name,
                classifier_for_naming(config),
                &config.attach_artifact_type,
            ))
        } else {
            config.output_file_name.clone()
        };

        debug_assert!(!config.attach || output_name.is_some());

        let input_path = config.directory.join(&input_name);
        let (mode, output_path, raw_output_path) = match output_name {
            Some(name) if name != input_name => {
                let path = config.directory.join(name);
                (ArtifactMode::Distinct, Some(path.clone()), path)
            }
            _ => {
                let temp = sibling_with_suffix(&input_path, TEMP_SUFFIX, input_path.is_dir());
                (ArtifactMode::Same, None, temp)
            }
        };

        let spec = ArtifactSpec {
            input_path,
            output_path,
            raw_output_path,
            directory: config.directory.clone(),
            attach: config.attach,
            attach_type: config.attach_artifact_type.clone(),
            attach_classifier: config.attach_artifact_classifier.clone(),
            append_classifier: config.append_classifier,
            mode,
        };
        debug!(
            "Resolved {} mode: input={} output={}",
            spec.mode,
            spec.input_path.display(),
            spec.raw_output_path.display()
        );
        Ok(spec)
    }
}

fn classifier_for_naming(config: &StageConfig) -> Option<&str> {
    if config.use_artifact_classifier() {
        Some(config.attach_artifact_classifier.trim())
    } else {
        None
    }
}

/// `<base(input)>[-<classifier>].<type>`
pub fn attached_file_name(input_name: &str, classifier: Option<&str>, attach_type: &str) -> String {
    let mut name = base_name(Path::new(input_name));
    if let Some(classifier) = classifier {
        name.push('-');
        name.push_str(classifier);
    }
    name.push('.');
    name.push_str(attach_type);
    name
}

/// File name without directory and final extension
pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Final extension of the file name, if any
pub fn extension(path: &Path) -> Option<String> {
    path.extension().map(|s| s.to_string_lossy().into_owned())
}

/// Sibling of `path` named `<base><suffix>.<ext>`.
///
/// Directories and extension-less names get `<base><suffix>`.
pub fn sibling_with_suffix(path: &Path, suffix: &str, is_dir: bool) -> PathBuf {
    let mut name = base_name(path);
    name.push_str(suffix);
    if !is_dir && let Some(ext) = extension(path) {
        name.push('.');
        name.push_str(&ext);
    }
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn attach_config(classifier: &str) -> StageConfig {
        let mut config = StageConfig::new("target", "app.jar");
        config.attach = true;
        config.attach_artifact_classifier = classifier.to_string();
        config
    }

    #[test]
    fn test_attach_appends_classifier() {
        let spec = PathResolver::plan(&attach_config("foo")).unwrap();
        assert_eq!(spec.mode, ArtifactMode::Distinct);
        assert_eq!(spec.output_path, Some(PathBuf::from("target/app-foo.jar")));
        assert_eq!(spec.raw_output_path, PathBuf::from("target/app-foo.jar"));
    }

    #[test]
    fn test_attach_without_classifier_has_no_separator() {
        let mut config = attach_config("");
        config.attach_artifact_type = "war".to_string();
        let spec = PathResolver::plan(&config).unwrap();
        assert_eq!(spec.output_path, Some(PathBuf::from("target/app.war")));
    }

    #[test]
    fn test_attach_without_append_classifier() {
        let mut config = attach_config("shaded");
        config.append_classifier = false;
        config.attach_artifact_type = "zip".to_string();
        let spec = PathResolver::plan(&config).unwrap();
        assert_eq!(spec.output_path, Some(PathBuf::from("target/app.zip")));
    }

    #[test]
    fn test_attach_overrides_explicit_output() {
        let mut config = attach_config("shaded");
        config.output_file_name = Some("other.jar".to_string());
        let spec = PathResolver::plan(&config).unwrap();
        assert_eq!(spec.output_path, Some(PathBuf::from("target/app-shaded.jar")));
    }

    #[test]
    fn test_attach_name_equal_to_input_is_same_mode() {
        let spec = PathResolver::plan(&attach_config("")).unwrap();
        assert_eq!(spec.mode, ArtifactMode::Same);
        assert_eq!(spec.output_path, None);
    }

    #[test]
    fn test_no_output_is_same_mode() {
        let config = StageConfig::new("target", "app.jar");
        let spec = PathResolver::plan(&config).unwrap();
        assert!(spec.is_same_artifact());
        assert_eq!(
            spec.raw_output_path,
            PathBuf::from("target/app_obfuscated_temp.jar")
        );
        assert_eq!(spec.base_path(), PathBuf::from("target/app_obfuscated_base.jar"));
    }

    #[test]
    fn test_output_equal_to_input_is_same_mode() {
        let mut config = StageConfig::new("target", "app.jar");
        config.output_file_name = Some("app.jar".to_string());
        assert!(PathResolver::plan(&config).unwrap().is_same_artifact());

        config.output_file_name = Some("app-obf.jar".to_string());
        let spec = PathResolver::plan(&config).unwrap();
        assert_eq!(spec.mode, ArtifactMode::Distinct);
        assert_eq!(spec.raw_output_path, PathBuf::from("target/app-obf.jar"));
    }

    #[test]
    fn test_sibling_with_suffix() {
        assert_eq!(
            sibling_with_suffix(Path::new("out/app.jar"), BASE_SUFFIX, false),
            PathBuf::from("out/app_obfuscated_base.jar")
        );
        assert_eq!(
            sibling_with_suffix(Path::new("out/classes.d"), BASE_SUFFIX, true),
            PathBuf::from("out/classes_obfuscated_base")
        );
        assert_eq!(
            sibling_with_suffix(Path::new("out/app"), TEMP_SUFFIX, false),
            PathBuf::from("out/app_obfuscated_temp")
        );
    }

    #[test]
    fn test_resolve_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested/target");
        let config = StageConfig::new(&dir, "app.jar");

        PathResolver::resolve(&config).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_resolve_fails_when_directory_cannot_be_created() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "file in the way").unwrap();

        let config = StageConfig::new(blocker.join("target"), "app.jar");
        let result = PathResolver::resolve(&config);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_empty_input_name_rejected() {
        let config = StageConfig::default();
        assert!(matches!(
            PathResolver::plan(&config),
            Err(Error::Configuration(_))
        ));
    }
}
