// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External alternatives tool.
//!
//! Everything altsync knows about the registry comes through this layer: the
//! `update-alternatives` binary for reports and mutations, and the registry
//! directory for group listing and state files. The registry itself is
//! never written to directly.

use crate::path::{DEFAULT_COMMAND, DEFAULT_REGISTRY_DIR};

use std::{
    ffi::{OsStr, OsString},
    fs::{read_dir, read_to_string},
    path::PathBuf,
    process::Command,
};
use tracing::{debug, instrument};

/// Layer of indirection for registry access.
pub trait AlternativesTool {
    /// Print display report of a group.
    fn display(&self, group: &str) -> Result<String>;

    /// Invoke the tool with a full argument list, e.g., a mutation verb.
    fn invoke(&self, args: &[OsString]) -> Result<String>;

    /// List names of all registered groups.
    fn list_groups(&self) -> Result<Vec<String>>;

    /// Read raw state file of a group.
    fn read_state_file(&self, group: &str) -> Result<String>;
}

/// Registry access through the system's `update-alternatives` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTool {
    command: PathBuf,
    registry_dir: PathBuf,
}

impl SystemTool {
    /// Construct new system tool from binary and registry directory.
    pub fn new(command: impl Into<PathBuf>, registry_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            registry_dir: registry_dir.into(),
        }
    }
}

impl Default for SystemTool {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND, DEFAULT_REGISTRY_DIR)
    }
}

impl AlternativesTool for SystemTool {
    fn display(&self, group: &str) -> Result<String> {
        syscall_non_interactive(&self.command, ["--display", group])
    }

    #[instrument(skip(self, args), level = "debug")]
    fn invoke(&self, args: &[OsString]) -> Result<String> {
        debug!("run {:?} {:?}", self.command.display(), args);
        syscall_non_interactive(&self.command, args)
    }

    fn list_groups(&self) -> Result<Vec<String>> {
        let entries = read_dir(&self.registry_dir).map_err(|err| ToolError::ListRegistry {
            source: err,
            registry_dir: self.registry_dir.clone(),
        })?;

        let mut groups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| ToolError::ListRegistry {
                source: err,
                registry_dir: self.registry_dir.clone(),
            })?;
            let name = entry.file_name().to_string_lossy().trim().to_string();

            // INVARIANT: Hidden files are lock or backup files, not groups.
            if !name.is_empty() && !name.starts_with('.') {
                groups.push(name);
            }
        }
        groups.sort();

        Ok(groups)
    }

    fn read_state_file(&self, group: &str) -> Result<String> {
        let state_path = self.registry_dir.join(group);
        read_to_string(&state_path).map_err(|err| ToolError::ReadStateFile {
            source: err,
            state_path,
        })
    }
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let args = args
        .into_iter()
        .map(|arg| arg.as_ref().to_os_string())
        .collect::<Vec<_>>();
    let output = Command::new(cmd.as_ref())
        .args(&args)
        .output()
        .map_err(|err| ToolError::Spawn {
            source: err,
            command: cmd.as_ref().to_os_string(),
        })?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

    if !output.status.success() {
        let message = stderr.trim_end().to_string();
        return Err(ToolError::Execution {
            command: render_command(cmd.as_ref(), &args),
            status: output.status.code(),
            message,
        });
    }

    Ok(stdout)
}

fn render_command(cmd: &OsStr, args: &[OsString]) -> String {
    let mut rendered = cmd.to_string_lossy().into_owned();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg.to_string_lossy().as_ref());
    }

    rendered
}

/// External tool error types.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Binary could not be started at all.
    #[error("failed to run {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: OsString,
    },

    /// Binary ran but reported failure.
    #[error("command `{command}` failed with status {status:?}: {message}")]
    Execution {
        command: String,
        status: Option<i32>,
        message: String,
    },

    /// Registry directory cannot be listed.
    #[error("failed to list registry directory {:?}", registry_dir.display())]
    ListRegistry {
        #[source]
        source: std::io::Error,
        registry_dir: PathBuf,
    },

    /// Group state file cannot be read.
    #[error("failed to read state file {:?}", state_path.display())]
    ReadStateFile {
        #[source]
        source: std::io::Error,
        state_path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ToolError> = std::result::Result<T, E>;
