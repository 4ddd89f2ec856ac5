// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Arguments shared by run, plan and recover
fn stage_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("config").short('c').long("config").value_name("FILE").help("Stage file (TOML)"))
        .arg(
            Arg::new("directory")
                .short('d')
                .long("directory")
                .value_name("DIR")
                .help("Directory containing the input and generated archives"),
        )
        .arg(Arg::new("input").short('i').long("input").help("Input archive name"))
        .arg(Arg::new("output").short('o').long("output").help("Output archive name"))
        .arg(Arg::new("engine_config").long("engine-config").help("Engine configuration file"))
        .arg(Arg::new("script").long("script").help("Engine script file"))
        .arg(Arg::new("classpath").long("classpath").action(ArgAction::Append).help("Classpath entry"))
        .arg(Arg::new("exclude").long("exclude").action(ArgAction::Append).help("Dependency exclusion"))
        .arg(Arg::new("attach").long("attach").action(ArgAction::SetTrue).help("Attach the result to the project"))
        .arg(Arg::new("classifier").long("classifier").help("Classifier for the attached artifact"))
        .arg(Arg::new("type").long("type").help("Type of the attached artifact"))
        .arg(
            Arg::new("no_append_classifier")
                .long("no-append-classifier")
                .action(ArgAction::SetTrue)
                .help("Leave the classifier out of the derived output name"),
        )
        .arg(
            Arg::new("no_fail_on_error")
                .long("no-fail-on-error")
                .action(ArgAction::SetTrue)
                .help("Log failures instead of exiting non-zero"),
        )
        .arg(Arg::new("skip").long("skip").action(ArgAction::SetTrue).help("Do nothing"))
        .arg(Arg::new("engine").long("engine").help("Engine executable"))
        .arg(Arg::new("timeout").long("timeout").help("Kill the engine after this many seconds"))
}

fn build_cli() -> Command {
    Command::new("obfuscator-stage")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Obfuscate a packaged archive as a build pipeline stage")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            stage_args(Command::new("run").about("Run the obfuscation stage")).arg(
                Arg::new("manifest")
                    .long("manifest")
                    .value_name("FILE")
                    .help("Append attached artifacts to this JSON-lines manifest"),
            ),
        )
        .subcommand(stage_args(
            Command::new("plan").about("Show resolved paths and promotion mode without changing anything"),
        ))
        .subcommand(stage_args(
            Command::new("recover").about("Restore an original archive left behind by an interrupted swap"),
        ))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("obfuscator-stage.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
