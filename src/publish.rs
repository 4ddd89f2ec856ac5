// src/publish.rs

//! Registering the stage output with the enclosing build
//!
//! The publisher decides which file gets attached and under which
//! classifier; storing it is the registry's business. In same-artifact mode
//! the primary (unclassified) slot belongs to the transformed archive now
//! sitting at the input path, so the parked original is the one attached.

use crate::config::ProjectCoordinates;
use crate::error::{Error, Result};
use crate::resolver::{ArtifactMode, ArtifactSpec};
use crate::swap::SwapResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Classifier for the parked original in same-artifact mode
pub const BASE_CLASSIFIER: &str = "obfuscated_base";

/// Classifier for the output in distinct-artifact mode
pub const OUTPUT_CLASSIFIER: &str = "obfuscated";

/// One artifact handed to the build's registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub file_path: PathBuf,
}

impl PublishedArtifact {
    /// `group:artifact:classifier:type`
    pub fn coordinates(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.classifier, self.artifact_type
        )
    }
}

/// The build system's artifact registry
pub trait ArtifactRegistry: Send + Sync {
    fn register_artifact(&self, artifact: &PublishedArtifact) -> Result<()>;
}

impl<R: ArtifactRegistry + ?Sized> ArtifactRegistry for Box<R> {
    fn register_artifact(&self, artifact: &PublishedArtifact) -> Result<()> {
        (**self).register_artifact(artifact)
    }
}

/// Registry that only logs what would be attached
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRegistry;

impl ArtifactRegistry for LogRegistry {
    fn register_artifact(&self, artifact: &PublishedArtifact) -> Result<()> {
        info!(
            "Registered {} -> {}",
            artifact.coordinates(),
            artifact.file_path.display()
        );
        Ok(())
    }
}

/// Line written to the manifest for each attached artifact
#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(flatten)]
    pub artifact: PublishedArtifact,
    pub registered_at: DateTime<Utc>,
}

/// Registry that appends one JSON object per artifact to a manifest file
#[derive(Debug, Clone)]
pub struct ManifestRegistry {
    path: PathBuf,
}

impl ManifestRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every entry in a manifest
    pub fn read_entries(path: &Path) -> Result<Vec<ManifestEntry>> {
        let content = std::fs::read_to_string(path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str::<ManifestEntry>(line).map_err(Error::from))
            .collect()
    }
}

impl ArtifactRegistry for ManifestRegistry {
    fn register_artifact(&self, artifact: &PublishedArtifact) -> Result<()> {
        let entry = ManifestEntry {
            artifact: artifact.clone(),
            registered_at: Utc::now(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Derives the publication tuple and hands it to a registry
pub struct ArtifactPublisher<'a> {
    project: &'a ProjectCoordinates,
    registry: &'a dyn ArtifactRegistry,
}

impl<'a> ArtifactPublisher<'a> {
    pub fn new(project: &'a ProjectCoordinates, registry: &'a dyn ArtifactRegistry) -> Self {
        Self { project, registry }
    }

    /// Publish the run's result; `None` when attaching is disabled.
    ///
    /// Registry failures are logged and never fail the run.
    pub fn publish(&self, spec: &ArtifactSpec, swap: &SwapResult) -> Option<PublishedArtifact> {
        let artifact = derive_artifact(self.project, spec, swap)?;

        info!("Attaching artifact {}", artifact.coordinates());
        if let Err(e) = self.registry.register_artifact(&artifact) {
            warn!("Failed to register {}: {}", artifact.coordinates(), e);
        }
        Some(artifact)
    }
}

/// The artifact to attach for a run, without registering it
pub fn derive_artifact(
    project: &ProjectCoordinates,
    spec: &ArtifactSpec,
    swap: &SwapResult,
) -> Option<PublishedArtifact> {
    if !spec.attach {
        info!(
            "Attaching artifacts is disabled. If the output equals the input, \
             the final artifact is the obfuscated file at {}",
            spec.input_path.display()
        );
        return None;
    }

    let classifier = match spec.explicit_classifier() {
        Some(classifier) => classifier.to_string(),
        None => match spec.mode {
            ArtifactMode::Same => BASE_CLASSIFIER.to_string(),
            ArtifactMode::Distinct => OUTPUT_CLASSIFIER.to_string(),
        },
    };

    let file_path = match spec.mode {
        ArtifactMode::Distinct => swap.final_path.clone(),
        ArtifactMode::Same => swap.original_path.clone(),
    };

    Some(PublishedArtifact {
        group_id: project.group_id.clone(),
        artifact_id: project.artifact_id.clone(),
        classifier,
        artifact_type: spec.attach_type.clone(),
        file_path,
    })
}
