// src/engine/command.rs

//! External process engine
//!
//! Runs the obfuscator as a child process. The request is turned into
//! arguments; the config payload and script body are written to a private
//! temp directory that lives for the duration of the call.
//!
//! Exit status 0 means the engine succeeded, any other status means it
//! declined the input. Failing to spawn, failing to collect output, and
//! hitting the optional timeout are I/O errors. An engine built from a
//! config without a program fails validation before it is ever called.

use super::{TransformEngine, TransformRequest};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Engine backed by an external executable
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: Option<PathBuf>,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandEngine {
    /// Create an engine that runs `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Build from the `[engine]` section.
    ///
    /// A missing program is reported by [`TransformEngine::validate`].
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
        }
    }

    /// Arguments placed before the generated ones
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Kill the engine if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full argument list for a request
    fn build_args(
        &self,
        request: &TransformRequest,
        payload_dir: &TempDir,
    ) -> io::Result<Vec<OsString>> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();

        args.push("--input".into());
        args.push(request.input_path.clone().into_os_string());
        args.push("--output".into());
        args.push(request.output_path.clone().into_os_string());

        if let Some(config) = &request.config {
            let path = payload_dir.path().join("config");
            fs::write(&path, config)?;
            args.push("--config".into());
            args.push(path.into_os_string());
        }

        if !request.script.is_empty() {
            let path = payload_dir.path().join("script.js");
            fs::write(&path, &request.script)?;
            args.push("--script".into());
            args.push(path.into_os_string());
        }

        if !request.classpath.is_empty() {
            let joined = std::env::join_paths(&request.classpath).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("invalid classpath: {}", e))
            })?;
            args.push("--classpath".into());
            args.push(joined);
        }

        for exclusion in &request.exclusions {
            args.push("--exclude".into());
            args.push(exclusion.into());
        }

        Ok(args)
    }
}

/// Read a child pipe to the end on its own thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn collect(reader: JoinHandle<Vec<u8>>) -> Vec<u8> {
    reader.join().unwrap_or_default()
}

impl TransformEngine for CommandEngine {
    fn validate(&self) -> Result<()> {
        if self.program.is_none() {
            return Err(Error::configuration(
                "no engine program configured; set [engine] program or pass --engine",
            ));
        }
        Ok(())
    }

    fn transform(&self, request: &TransformRequest) -> io::Result<bool> {
        let program = self.program.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no engine program configured")
        })?;
        let payload_dir = TempDir::new()?;
        let args = self.build_args(request, &payload_dir)?;

        debug!("Spawning engine: {} {:?}", program.display(), args);

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("failed to spawn engine {}: {}", program.display(), e),
                )
            })?;

        // Pipes are drained concurrently so a chatty engine never blocks on write
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    collect(stdout);
                    collect(stderr);
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("engine timed out after {} seconds", timeout.as_secs()),
                    ));
                }
            },
            None => child.wait()?,
        };

        for line in String::from_utf8_lossy(&collect(stdout)).lines() {
            info!("[engine] {}", line);
        }
        for line in String::from_utf8_lossy(&collect(stderr)).lines() {
            warn!("[engine] {}", line);
        }

        if status.success() {
            Ok(true)
        } else {
            warn!("Engine exited with code {}", status.code().unwrap_or(-1));
            Ok(false)
        }
    }
}
