// src/recovery.rs

//! Detection and repair of interrupted swaps
//!
//! The same-artifact swap renames the original aside before promoting the
//! engine output. A crash or rename failure between the two steps leaves a
//! "dangling base": the original under its `_obfuscated_base` name and
//! nothing at the input path. The controller refuses to run on top of that
//! state; [`restore`] rolls it back by moving the original home.

use crate::error::{Error, Result};
use crate::resolver::{ArtifactSpec, BASE_SUFFIX, sibling_with_suffix};
use crate::swap::remove_recursive;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What the filesystem says about the last swap at a spec's location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapState {
    /// No swap artifacts present
    Clean,
    /// A previous swap completed: input and parked original both exist
    Completed { base: PathBuf },
    /// Original parked, nothing promoted into its place
    DanglingBase {
        base: PathBuf,
        input: PathBuf,
        /// Engine output left behind by the interrupted run
        temp: Option<PathBuf>,
    },
    /// Engine output left behind next to an intact input
    StaleTemp { temp: PathBuf },
}

/// Outcome of a repair step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Parked original moved back to the input path
    Restored { base: PathBuf, input: PathBuf },
    /// Leftover engine output deleted
    RemovedTemp { temp: PathBuf },
    /// Nothing needed doing
    Clean,
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Parked-original location, whichever naming form is present
fn find_base(input: &Path) -> Option<PathBuf> {
    let as_file = sibling_with_suffix(input, BASE_SUFFIX, false);
    let as_dir = sibling_with_suffix(input, BASE_SUFFIX, true);
    [as_file, as_dir].into_iter().find(|p| exists(p))
}

/// Inspect the swap slots of `spec` without changing anything
pub fn probe(spec: &ArtifactSpec) -> SwapState {
    if !spec.is_same_artifact() {
        return SwapState::Clean;
    }

    let input = &spec.input_path;
    let temp = Some(spec.raw_output_path.clone()).filter(|p| exists(p));

    match (exists(input), find_base(input)) {
        (false, Some(base)) => SwapState::DanglingBase {
            base,
            input: input.clone(),
            temp,
        },
        (true, base) => match (temp, base) {
            (Some(temp), _) => SwapState::StaleTemp { temp },
            (None, Some(base)) => SwapState::Completed { base },
            (None, None) => SwapState::Clean,
        },
        (false, None) => SwapState::Clean,
    }
}

/// Error for states the controller must not run on top of
pub fn check(spec: &ArtifactSpec) -> Result<()> {
    match probe(spec) {
        SwapState::DanglingBase { base, input, .. } => {
            warn!(
                "Found {} with nothing at {}; a previous swap was interrupted",
                base.display(),
                input.display()
            );
            Err(Error::DanglingBase { base, input })
        }
        _ => Ok(()),
    }
}

/// Roll an interrupted swap back to its pre-run state
pub fn restore(spec: &ArtifactSpec) -> Result<Vec<RecoveryOutcome>> {
    let mut outcomes = Vec::new();

    match probe(spec) {
        SwapState::DanglingBase { base, input, temp } => {
            fs::rename(&base, &input).map_err(|e| {
                Error::swap(format!(
                    "restore failed: {} -> {}: {}",
                    base.display(),
                    input.display(),
                    e
                ))
            })?;
            info!("Restored {} to {}", base.display(), input.display());
            outcomes.push(RecoveryOutcome::Restored { base, input });

            if let Some(temp) = temp {
                remove_recursive(&temp)?;
                info!("Removed leftover output {}", temp.display());
                outcomes.push(RecoveryOutcome::RemovedTemp { temp });
            }
        }
        SwapState::StaleTemp { temp } => {
            remove_recursive(&temp)?;
            info!("Removed leftover output {}", temp.display());
            outcomes.push(RecoveryOutcome::RemovedTemp { temp });
        }
        SwapState::Completed { .. } | SwapState::Clean => {
            outcomes.push(RecoveryOutcome::Clean);
        }
    }

    Ok(outcomes)
}
