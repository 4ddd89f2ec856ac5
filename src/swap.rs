// src/swap.rs

//! Artifact promotion after a successful transform
//!
//! In distinct-artifact mode the engine output already sits where it belongs
//! and nothing moves. In same-artifact mode the engine wrote to a temporary
//! sibling, and promotion is a two-step rename:
//!
//! ```text
//! app.jar                  -> app_obfuscated_base.jar   (original parked)
//! app_obfuscated_temp.jar  -> app.jar                   (result promoted)
//! ```
//!
//! The pair of renames is not atomic. If the second one fails the original
//! stays parked under the base name and the failure is reported; the
//! [`recovery`](crate::recovery) module detects and repairs that state.

use crate::error::{Error, Result};
use crate::resolver::{ArtifactMode, BASE_SUFFIX, sibling_with_suffix};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Original and final artifact locations after promotion.
///
/// Both paths exist when this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapResult {
    /// The untransformed archive (the input, or its parked copy)
    pub original_path: PathBuf,
    /// The archive the rest of the build treats as this stage's output
    pub final_path: PathBuf,
}

/// Rename/delete state machine for promoting engine output
pub struct SwapProtocol;

impl SwapProtocol {
    /// Clear whatever occupies the slot the engine is about to write to
    pub fn prepare_output_slot(path: &Path) -> Result<()> {
        if path.symlink_metadata().is_err() {
            return Ok(());
        }
        debug!("Removing stale output {}", path.display());
        remove_recursive(path)
    }

    /// Promote `raw_output` according to `mode`
    pub fn resolve(input: &Path, raw_output: &Path, mode: ArtifactMode) -> Result<SwapResult> {
        match mode {
            ArtifactMode::Distinct => {
                if !raw_output.exists() {
                    return Err(Error::swap(format!(
                        "missing output: {}",
                        raw_output.display()
                    )));
                }
                Ok(SwapResult {
                    original_path: input.to_path_buf(),
                    final_path: raw_output.to_path_buf(),
                })
            }
            ArtifactMode::Same => Self::swap_in_place(input, raw_output),
        }
    }

    fn swap_in_place(input: &Path, temp_output: &Path) -> Result<SwapResult> {
        if !input.exists() || !temp_output.exists() {
            return Err(Error::swap(format!(
                "missing input or output: {} / {}",
                input.display(),
                temp_output.display()
            )));
        }

        let base = sibling_with_suffix(input, BASE_SUFFIX, input.is_dir());
        fs::rename(input, &base).map_err(|e| {
            Error::swap(format!(
                "rename original failed: {} -> {}: {}",
                input.display(),
                base.display(),
                e
            ))
        })?;
        info!("Renamed input to {}", base.display());

        if let Err(e) = fs::rename(temp_output, input) {
            error!(
                "Original archive left at {} with no replacement at {}",
                base.display(),
                input.display()
            );
            return Err(Error::swap(format!(
                "rename output failed: {} -> {}: {}",
                temp_output.display(),
                input.display(),
                e
            )));
        }
        info!("Renamed output to {}", input.display());

        Ok(SwapResult {
            original_path: base,
            final_path: input.to_path_buf(),
        })
    }
}

/// Delete a file or directory tree, children before parents.
///
/// Every entry is removed individually; the first failure aborts the walk
/// and is reported with the offending path.
pub fn remove_recursive(path: &Path) -> Result<()> {
    remove_tree(path, |entry, is_dir| {
        if is_dir {
            fs::remove_dir(entry)
        } else {
            fs::remove_file(entry)
        }
    })
}

fn remove_tree<F>(path: &Path, mut remove: F) -> Result<()>
where
    F: FnMut(&Path, bool) -> io::Result<()>,
{
    for entry in WalkDir::new(path).contents_first(true) {
        let entry = entry.map_err(|e| {
            let failed = e.path().unwrap_or(path).to_path_buf();
            Error::swap(format!("delete failed: {}: {}", failed.display(), e))
        })?;

        remove(entry.path(), entry.file_type().is_dir()).map_err(|e| {
            Error::swap(format!("delete failed: {}: {}", entry.path().display(), e))
        })?;
    }
    Ok(())
}
