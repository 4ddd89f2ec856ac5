// src/stage.rs

//! Stage controller
//!
//! Sequences one run and applies the failure policy.
//!
//! # Run Lifecycle
//!
//! ```text
//! IDLE -> RESOLVING -> TRANSFORMING -> SWAPPING -> PUBLISHING -> DONE
//!             |             |              |
//!             +-------------+--------------+----> FAILED
//! ```
//!
//! `skip` goes straight from IDLE to DONE. With `fail_on_error` set, FAILED
//! is returned as an error; otherwise it is logged and the run reports a
//! soft failure, leaving the filesystem exactly as it was at that point.

use crate::config::StageConfig;
use crate::engine::{TransformEngine, TransformInvoker, TransformRequest};
use crate::error::{Error, Result};
use crate::publish::{ArtifactPublisher, ArtifactRegistry, PublishedArtifact};
use crate::recovery;
use crate::resolver::{ArtifactSpec, PathResolver};
use crate::swap::{SwapProtocol, SwapResult};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Controller phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Idle,
    Resolving,
    Transforming,
    Swapping,
    Publishing,
    Done,
    Failed,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Transforming => "transforming",
            Self::Swapping => "swapping",
            Self::Publishing => "publishing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a run ended, when it did not return an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// `skip` was set
    Skipped,
    /// Input missing and failures are not fatal
    NothingToDo { input: PathBuf },
    Completed {
        spec: ArtifactSpec,
        swap: SwapResult,
        published: Option<PublishedArtifact>,
    },
    /// A fatal error downgraded by `fail_on_error = false`
    Failed { stage: StageState, message: String },
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

type StepResult<T> = std::result::Result<T, (StageState, Error)>;

fn at(stage: StageState) -> impl FnOnce(Error) -> (StageState, Error) {
    move |e| (stage, e)
}

fn enter(stage: StageState) -> StageState {
    debug!("Stage state: {}", stage);
    stage
}

/// Runs the obfuscation stage for one immutable configuration
pub struct StageController {
    config: StageConfig,
    engine: Box<dyn TransformEngine>,
    registry: Box<dyn ArtifactRegistry>,
}

impl StageController {
    pub fn new(
        config: StageConfig,
        engine: impl TransformEngine + 'static,
        registry: impl ArtifactRegistry + 'static,
    ) -> Self {
        Self {
            config,
            engine: Box::new(engine),
            registry: Box::new(registry),
        }
    }

    /// Execute the stage.
    ///
    /// Returns `Err` only for fatal failures under `fail_on_error`.
    pub fn run(&self) -> Result<StageOutcome> {
        enter(StageState::Idle);
        if self.config.skip {
            info!("Skipping obfuscation");
            enter(StageState::Done);
            return Ok(StageOutcome::Skipped);
        }

        match self.execute() {
            Ok(outcome) => {
                enter(StageState::Done);
                Ok(outcome)
            }
            Err((stage, err)) => self.fail(stage, err),
        }
    }

    fn execute(&self) -> StepResult<StageOutcome> {
        let stage = enter(StageState::Resolving);
        let spec = PathResolver::plan(&self.config).map_err(at(stage))?;
        recovery::check(&spec).map_err(at(stage))?;
        self.engine.validate().map_err(at(stage))?;

        if !spec.input_path.exists() {
            if !self.config.fail_on_error {
                info!(
                    "Bypassing obfuscation because {} does not exist",
                    spec.input_path.display()
                );
                return Ok(StageOutcome::NothingToDo {
                    input: spec.input_path,
                });
            }
            warn!("Input {} does not exist", spec.input_path.display());
        }
        spec.ensure_directory().map_err(at(stage))?;

        let stage = enter(StageState::Transforming);
        SwapProtocol::prepare_output_slot(&spec.raw_output_path).map_err(at(stage))?;
        let request = TransformRequest::from_config(&self.config, &spec).map_err(at(stage))?;
        TransformInvoker::new(self.engine.as_ref())
            .invoke(&request)
            .map_err(at(stage))?;

        let stage = enter(StageState::Swapping);
        let swap = SwapProtocol::resolve(&spec.input_path, &spec.raw_output_path, spec.mode)
            .map_err(at(stage))?;

        enter(StageState::Publishing);
        let published = ArtifactPublisher::new(&self.config.project, self.registry.as_ref())
            .publish(&spec, &swap);

        info!(
            "Obfuscation complete ({}): {}",
            spec.mode,
            swap.final_path.display()
        );
        Ok(StageOutcome::Completed {
            spec,
            swap,
            published,
        })
    }

    fn fail(&self, stage: StageState, err: Error) -> Result<StageOutcome> {
        enter(StageState::Failed);
        let err = Error::Stage {
            stage,
            source: Box::new(err),
        };

        if self.config.fail_on_error {
            return Err(err);
        }

        error!("{}", err);
        Ok(StageOutcome::Failed {
            stage,
            message: err.to_string(),
        })
    }
}
