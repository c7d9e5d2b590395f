//! Transports that carry CLI commands to a device.
//!
//! The collector only ever asks a session to run a show command and to
//! disconnect; connection setup and authentication belong to whatever sits
//! behind the session.

use crate::error::{MacdbError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// A command channel to one device.
pub trait DeviceSession {
    /// Run `command` on the device and return its raw text output.
    fn send_command(&mut self, command: &str) -> Result<String>;

    /// Close the channel. Further commands are an error.
    fn disconnect(&mut self) -> Result<()>;
}

/// Runs a local program once per device command.
///
/// The CLI command is appended as the final argument, so a template such
/// as `["ssh", "-T", "admin@10.0.0.2"]` runs
/// `ssh -T admin@10.0.0.2 "show mac address-table"`.
#[derive(Debug, Clone)]
pub struct CommandSession {
    program: Vec<String>,
    closed: bool,
}

impl CommandSession {
    pub fn new(program: Vec<String>) -> Result<Self> {
        if program.is_empty() {
            return Err(MacdbError::Config(
                "transport command must not be empty".to_string(),
            ));
        }
        Ok(Self {
            program,
            closed: false,
        })
    }
}

impl DeviceSession for CommandSession {
    fn send_command(&mut self, command: &str) -> Result<String> {
        if self.closed {
            return Err(MacdbError::Session("session already closed".to_string()));
        }

        debug!(program = %self.program[0], command, "Running device command");
        let output = Command::new(&self.program[0])
            .args(&self.program[1..])
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                MacdbError::Session(format!("failed to spawn {}: {}", self.program[0], e))
            })?;

        if !output.status.success() {
            return Err(MacdbError::Session(format!(
                "`{}` exited with {}: {}",
                command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// File name a captured command output is stored under.
///
/// `show ip arp vrf OUTSIDE` becomes `show_ip_arp_vrf_OUTSIDE.txt`.
pub fn capture_file_name(command: &str) -> String {
    let stem: Vec<&str> = command.split_whitespace().collect();
    format!("{}.txt", stem.join("_"))
}

/// Serves command output captured earlier into a directory.
#[derive(Debug, Clone)]
pub struct CapturedSession {
    dir: PathBuf,
    closed: bool,
}

impl CapturedSession {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            closed: false,
        }
    }
}

impl DeviceSession for CapturedSession {
    fn send_command(&mut self, command: &str) -> Result<String> {
        if self.closed {
            return Err(MacdbError::Session("session already closed".to_string()));
        }

        let path = self.dir.join(capture_file_name(command));
        debug!(path = %path.display(), command, "Reading captured output");
        fs::read_to_string(&path).map_err(|e| {
            MacdbError::Session(format!("no capture for `{}` at {}: {}", command, path.display(), e))
        })
    }

    fn disconnect(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// In-memory session answering from a command → output map.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    outputs: HashMap<String, String>,
    sent: Vec<String>,
    closed: bool,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, command: &str, output: &str) -> Self {
        self.outputs.insert(command.to_string(), output.to_string());
        self
    }

    /// Commands received so far, in order.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl DeviceSession for MemorySession {
    fn send_command(&mut self, command: &str) -> Result<String> {
        if self.closed {
            return Err(MacdbError::Session("session already closed".to_string()));
        }
        self.sent.push(command.to_string());
        self.outputs
            .get(command)
            .cloned()
            .ok_or_else(|| MacdbError::Session(format!("unsupported command `{}`", command)))
    }

    fn disconnect(&mut self) -> Result<()> {
        info!(commands = self.sent.len(), "Closing in-memory session");
        self.closed = true;
        Ok(())
    }
}
