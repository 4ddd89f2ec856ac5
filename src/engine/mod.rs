// src/engine/mod.rs

//! Transform engine boundary
//!
//! The engine that actually obfuscates an archive is an external black box.
//! The stage only needs one capability from it: transform `input` into
//! `output`, returning whether it succeeded. [`TransformEngine`] is that
//! capability; [`TransformInvoker`] owns the call contract and turns the
//! engine's answer into the crate's error taxonomy.

mod command;

pub use command::CommandEngine;

use crate::config::StageConfig;
use crate::error::{Error, Result};
use crate::resolver::ArtifactSpec;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything the engine receives for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Raw engine configuration, when a config file was given
    pub config: Option<Vec<u8>>,
    /// Compile classpath, in order
    pub classpath: Vec<String>,
    /// Script body; empty when no script file was given
    pub script: String,
    /// Passed through to the engine without interpretation
    pub exclusions: Vec<String>,
}

impl TransformRequest {
    /// Build the request for a resolved run, reading config and script files
    pub fn from_config(config: &StageConfig, spec: &ArtifactSpec) -> Result<Self> {
        let payload = match &config.config_file {
            Some(path) => Some(fs::read(path).map_err(|e| {
                Error::configuration(format!(
                    "can't read config file {}: {}",
                    path.display(),
                    e
                ))
            })?),
            None => None,
        };

        let script = match &config.script_file {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::configuration(format!(
                    "can't read script file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => String::new(),
        };

        Ok(Self {
            input_path: absolute(&spec.input_path),
            output_path: absolute(&spec.raw_output_path),
            config: payload,
            classpath: config.classpath.clone(),
            script,
            exclusions: config.exclusions.clone(),
        })
    }
}

fn absolute(path: &std::path::Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The external transformation capability.
///
/// `Ok(false)` means the engine ran but declined or failed internally;
/// `Err` means it could not run to completion (I/O, interruption).
pub trait TransformEngine: Send + Sync {
    fn transform(&self, request: &TransformRequest) -> io::Result<bool>;

    /// Check the engine is usable before any file is touched
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl<F> TransformEngine for F
where
    F: Fn(&TransformRequest) -> io::Result<bool> + Send + Sync,
{
    fn transform(&self, request: &TransformRequest) -> io::Result<bool> {
        self(request)
    }
}

/// Calls the engine once and translates its answer
pub struct TransformInvoker<'a> {
    engine: &'a dyn TransformEngine,
}

impl<'a> TransformInvoker<'a> {
    pub fn new(engine: &'a dyn TransformEngine) -> Self {
        Self { engine }
    }

    /// Run the engine. No retries.
    pub fn invoke(&self, request: &TransformRequest) -> Result<()> {
        info!(
            "Obfuscating {} -> {}",
            request.input_path.display(),
            request.output_path.display()
        );
        debug!(
            "Engine request: {} classpath entries, config={}, script={} bytes",
            request.classpath.len(),
            request.config.is_some(),
            request.script.len()
        );

        match self.engine.transform(request) {
            Ok(true) => {
                info!("Engine finished {}", request.output_path.display());
                Ok(())
            }
            Ok(false) => Err(Error::TransformRejected),
            Err(e) => Err(Error::Engine(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn request() -> TransformRequest {
        TransformRequest {
            input_path: PathBuf::from("/build/app.jar"),
            output_path: PathBuf::from("/build/app_obfuscated_temp.jar"),
            ..Default::default()
        }
    }

    #[test]
    fn test_invoke_success() {
        let engine = |_: &TransformRequest| -> io::Result<bool> { Ok(true) };
        TransformInvoker::new(&engine).invoke(&request()).unwrap();
    }

    #[test]
    fn test_invoke_false_is_rejected() {
        let engine = |_: &TransformRequest| -> io::Result<bool> { Ok(false) };
        let err = TransformInvoker::new(&engine).invoke(&request()).unwrap_err();
        assert!(matches!(err, Error::TransformRejected));
    }

    #[test]
    fn test_invoke_error_keeps_message() {
        let engine = |_: &TransformRequest| -> io::Result<bool> {
            Err(io::Error::new(io::ErrorKind::Interrupted, "engine interrupted"))
        };
        let err = TransformInvoker::new(&engine).invoke(&request()).unwrap_err();
        match err {
            Error::Engine(message) => assert!(message.contains("engine interrupted")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invoke_calls_engine_once() {
        let calls = Mutex::new(0);
        let engine = |_: &TransformRequest| -> io::Result<bool> {
            *calls.lock().unwrap() += 1;
            Ok(false)
        };
        let _ = TransformInvoker::new(&engine).invoke(&request());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_request_reads_config_and_script() {
        let temp = TempDir::new().unwrap();
        let config_file = temp.path().join("obf.json");
        let script_file = temp.path().join("obf.js");
        fs::write(&config_file, b"{\"level\": 3}").unwrap();
        fs::write(&script_file, "function isRemappingEnabledForClass(node) { return true; }")
            .unwrap();

        let mut config = StageConfig::new(temp.path(), "app.jar");
        config.config_file = Some(config_file);
        config.script_file = Some(script_file);
        config.classpath = vec!["lib/a.jar".to_string(), "lib/b.jar".to_string()];
        config.exclusions = vec!["com.example:skip".to_string()];
        let spec = crate::resolver::PathResolver::plan(&config).unwrap();

        let request = TransformRequest::from_config(&config, &spec).unwrap();
        assert_eq!(request.config.as_deref(), Some(&b"{\"level\": 3}"[..]));
        assert!(request.script.starts_with("function"));
        assert_eq!(request.classpath, vec!["lib/a.jar", "lib/b.jar"]);
        assert_eq!(request.exclusions, vec!["com.example:skip"]);
        assert!(request.input_path.is_absolute());
        assert!(request.output_path.ends_with("app_obfuscated_temp.jar"));
    }

    #[test]
    fn test_request_without_script_is_empty() {
        let config = StageConfig::new("target", "app.jar");
        let spec = crate::resolver::PathResolver::plan(&config).unwrap();
        let request = TransformRequest::from_config(&config, &spec).unwrap();
        assert!(request.config.is_none());
        assert_eq!(request.script, "");
    }

    #[test]
    fn test_request_missing_script_is_configuration_error() {
        let mut config = StageConfig::new("target", "app.jar");
        config.script_file = Some(PathBuf::from("/nonexistent/obf.js"));
        let spec = crate::resolver::PathResolver::plan(&config).unwrap();
        let result = TransformRequest::from_config(&config, &spec);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
