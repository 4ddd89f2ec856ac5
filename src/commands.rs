// src/commands.rs
//! Command handlers for the obfuscator-stage CLI

use crate::cli::{Cli, StageArgs};
use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;
use obfuscator_stage::{
    ArtifactRegistry, CommandEngine, LogRegistry, ManifestRegistry, PathResolver,
    RecoveryOutcome, StageConfig, StageController, StageOutcome, recovery,
};
use std::path::PathBuf;
use tracing::info;

/// Load the stage file (if any) and apply command-line overrides
pub fn load_config(args: &StageArgs) -> Result<StageConfig> {
    let mut config = match &args.config {
        Some(path) => StageConfig::load(path)
            .with_context(|| format!("Failed to load stage file {}", path.display()))?,
        None => StageConfig::default(),
    };

    if let Some(directory) = &args.directory {
        config.directory = directory.clone();
    }
    if let Some(input) = &args.input {
        config.input_file_name = Some(input.clone());
    }
    if let Some(output) = &args.output {
        config.output_file_name = Some(output.clone());
    }
    if let Some(path) = &args.engine_config {
        config.config_file = Some(path.clone());
    }
    if let Some(path) = &args.script {
        config.script_file = Some(path.clone());
    }
    config.classpath.extend(args.classpath.iter().cloned());
    config.exclusions.extend(args.exclusions.iter().cloned());
    if let Some(classifier) = &args.classifier {
        config.attach_artifact_classifier = classifier.clone();
    }
    if let Some(artifact_type) = &args.artifact_type {
        config.attach_artifact_type = artifact_type.clone();
    }
    if let Some(program) = &args.engine {
        config.engine.program = Some(program.clone());
    }
    if let Some(timeout) = args.timeout {
        config.engine.timeout_secs = Some(timeout);
    }

    config.attach |= args.attach;
    config.skip |= args.skip;
    if args.no_append_classifier {
        config.append_classifier = false;
    }
    if args.no_fail_on_error {
        config.fail_on_error = false;
    }

    Ok(config)
}

/// Execute the stage
pub fn cmd_run(args: &StageArgs, manifest: Option<PathBuf>) -> Result<()> {
    let config = load_config(args)?;

    // A missing program is reported by the controller, after `skip`
    let engine = CommandEngine::from_config(&config.engine);

    let registry: Box<dyn ArtifactRegistry> = match manifest {
        Some(path) => {
            let registry = ManifestRegistry::new(path);
            info!("Recording attached artifacts in {}", registry.path().display());
            Box::new(registry)
        }
        None => Box::new(LogRegistry),
    };

    let controller = StageController::new(config, engine, registry);
    match controller.run()? {
        StageOutcome::Skipped => println!("Skipped"),
        StageOutcome::NothingToDo { input } => {
            println!("Nothing to do: {} does not exist", input.display());
        }
        StageOutcome::Completed {
            swap, published, ..
        } => {
            println!("Obfuscated archive: {}", swap.final_path.display());
            if swap.original_path != swap.final_path {
                println!("Original archive:   {}", swap.original_path.display());
            }
            if let Some(artifact) = published {
                println!(
                    "Attached:           {} ({})",
                    artifact.coordinates(),
                    artifact.file_path.display()
                );
            }
        }
        StageOutcome::Failed { stage, message } => {
            println!("Failed during {} (ignored): {}", stage, message);
        }
    }

    Ok(())
}

/// Print the resolved plan
pub fn cmd_plan(args: &StageArgs) -> Result<()> {
    let config = load_config(args)?;
    let spec = PathResolver::plan(&config)?;

    println!("Mode:      {}", spec.mode);
    println!("Directory: {}", spec.directory.display());
    println!("Input:     {}", spec.input_path.display());
    println!("Engine output: {}", spec.raw_output_path.display());
    match &spec.output_path {
        Some(output) => println!("Output:    {}", output.display()),
        None => println!("Original parked at: {}", spec.base_path().display()),
    }
    if spec.attach {
        println!(
            "Attach:    type={} classifier={}",
            spec.attach_type,
            spec.explicit_classifier().unwrap_or("(default)")
        );
    }
    println!("State:     {:?}", recovery::probe(&spec));

    Ok(())
}

/// Roll back an interrupted swap
pub fn cmd_recover(args: &StageArgs) -> Result<()> {
    let config = load_config(args)?;
    let spec = PathResolver::plan(&config)?;

    for outcome in recovery::restore(&spec)? {
        match outcome {
            RecoveryOutcome::Restored { base, input } => {
                println!("Restored {} -> {}", base.display(), input.display());
            }
            RecoveryOutcome::RemovedTemp { temp } => {
                println!("Removed leftover {}", temp.display());
            }
            RecoveryOutcome::Clean => println!("Nothing to recover"),
        }
    }

    Ok(())
}

/// Write completions for `shell` to stdout
pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "obfuscator-stage", &mut std::io::stdout());
    Ok(())
}
