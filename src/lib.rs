// src/lib.rs

//! Obfuscator Stage
//!
//! Build-pipeline stage that runs an external obfuscation engine over a
//! packaged archive and hands the result back to the build.
//!
//! # Architecture
//!
//! - Resolver: configuration in, concrete paths and promotion mode out
//! - Engine: one call to an opaque transform capability
//! - Swap: promote the engine output, parking the original when the output
//!   replaces the input
//! - Publish: attach the resulting archive to the build's registry
//! - Recovery: detect and roll back a swap interrupted halfway

pub mod config;
pub mod engine;
mod error;
pub mod publish;
pub mod recovery;
pub mod resolver;
pub mod stage;
pub mod swap;

pub use config::{EngineConfig, ProjectCoordinates, StageConfig};
pub use engine::{CommandEngine, TransformEngine, TransformInvoker, TransformRequest};
pub use error::{Error, Result};
pub use publish::{
    ArtifactPublisher, ArtifactRegistry, LogRegistry, ManifestEntry, ManifestRegistry,
    PublishedArtifact,
};
pub use recovery::{RecoveryOutcome, SwapState};
pub use resolver::{ArtifactMode, ArtifactSpec, PathResolver};
pub use stage::{StageController, StageOutcome, StageState};
pub use swap::{SwapProtocol, SwapResult};
