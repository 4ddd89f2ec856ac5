// src/error.rs

//! Error types for the obfuscation stage

use crate::stage::StageState;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the stage
#[derive(Error, Debug)]
pub enum Error {
    /// Working directory could not be prepared, or a stage input is unusable
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The transform engine failed with an I/O or interruption error
    #[error("transform engine error: {0}")]
    Engine(String),

    /// The engine ran to completion but reported failure
    #[error("transform rejected: engine could not obfuscate the input archive")]
    TransformRejected,

    /// Rename or delete failure while promoting the artifact
    #[error("swap error: {0}")]
    Swap(String),

    /// A previous run renamed the original aside and never promoted a replacement
    #[error(
        "dangling base artifact {base} with nothing at {input}; run `recover` to restore it"
    )]
    DanglingBase { base: PathBuf, input: PathBuf },

    /// A fatal error annotated with the controller state it occurred in
    #[error("error during obfuscation ({stage}): {source}")]
    Stage {
        stage: StageState,
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stage file could not be parsed
    #[error("failed to parse stage file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Manifest entry could not be serialized
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl Error {
    /// Create a swap error with a message
    pub fn swap(msg: impl Into<String>) -> Self {
        Self::Swap(msg.into())
    }

    /// Create a configuration error with a message
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The innermost error, looking through stage annotations
    pub fn root(&self) -> &Error {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if the engine declined the input without erroring
    pub fn is_transform_rejected(&self) -> bool {
        matches!(self.root(), Self::TransformRejected)
    }
}
