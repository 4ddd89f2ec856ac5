// src/cli.rs
//! CLI definitions for obfuscator-stage
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "obfuscator-stage")]
#[command(version)]
#[command(about = "Obfuscate a packaged archive as a build pipeline stage", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the obfuscation stage
    Run {
        #[command(flatten)]
        stage: StageArgs,

        /// Append attached artifacts to this JSON-lines manifest
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Show resolved paths and promotion mode without changing anything
    Plan {
        #[command(flatten)]
        stage: StageArgs,
    },

    /// Restore an original archive left behind by an interrupted swap
    Recover {
        #[command(flatten)]
        stage: StageArgs,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Stage file plus per-key overrides
#[derive(Args, Debug, Default)]
pub struct StageArgs {
    /// Stage file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing the input and generated archives
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Input archive name, relative to the directory
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output archive name (ignored with --attach)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Engine configuration file
    #[arg(long)]
    pub engine_config: Option<PathBuf>,

    /// Engine script file
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Classpath entry (repeatable)
    #[arg(long = "classpath", value_name = "PATH")]
    pub classpath: Vec<String>,

    /// Dependency exclusion (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclusions: Vec<String>,

    /// Attach the result to the project
    #[arg(long)]
    pub attach: bool,

    /// Classifier for the attached artifact
    #[arg(long)]
    pub classifier: Option<String>,

    /// Type of the attached artifact
    #[arg(long = "type", value_name = "TYPE")]
    pub artifact_type: Option<String>,

    /// Leave the classifier out of the derived output name
    #[arg(long)]
    pub no_append_classifier: bool,

    /// Log failures instead of exiting non-zero
    #[arg(long)]
    pub no_fail_on_error: bool,

    /// Do nothing
    #[arg(long)]
    pub skip: bool,

    /// Engine executable
    #[arg(long)]
    pub engine: Option<PathBuf>,

    /// Kill the engine after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}
