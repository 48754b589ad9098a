// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Status report parsing.
//!
//! The external tool describes an alternative group in two places: the
//! human-readable report printed by `update-alternatives --display <group>`,
//! and the group's state file inside the registry directory. Neither has a
//! machine-readable format, so both are parsed here through a small
//! line-oriented grammar. No I/O happens in this module.
//!
//! # Display Report Layout
//!
//! ```text
//! editor - status is manual.
//!  link currently points to /usr/bin/vim
//! /usr/bin/vim - priority 10
//!  slave editor.1.gz: /usr/share/man/man1/vim.1.gz
//! /usr/bin/nano - priority 5
//!  slave editor.1.gz: /usr/share/man/man1/nano.1.gz
//! Current `best' version is /usr/bin/vim.
//! ```
//!
//! The first line carries the mode. The informational lines before the first
//! candidate carry the currently active target. Each candidate line opens a
//! block of indented slave lines for that candidate.
//!
//! # State File Layout
//!
//! ```text
//! manual
//! /usr/bin/editor
//! editor.1.gz
//! /usr/share/man/man1/editor.1.gz
//!
//! /usr/bin/vim
//! ...
//! ```
//!
//! Mode, master link, then slave name and slave link pairs up to the first
//! empty line.

use crate::model::{Mode, Priority};

use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

static CURRENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"link currently points to (?P<path>\S.*?)\s*$").expect("valid regex")
});

static CANDIDATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>/.*?) - priority (?P<priority>\S+)\s*$").expect("valid regex")
});

static SLAVE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+slave (?P<name>[^:\s]+): (?P<target>\S.*?)\s*$").expect("valid regex")
});

/// Parsed display report of an alternative group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    mode: Mode,
    current: PathBuf,
    candidates: Vec<Candidate>,
}

/// Candidate path listed in a display report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Target path of the candidate.
    pub path: PathBuf,

    /// Registered priority.
    pub priority: Priority,

    /// Slave name and slave target pairs, in report order.
    pub slaves: Vec<(String, PathBuf)>,
}

impl StatusReport {
    /// Parse display report of target group.
    ///
    /// # Errors
    ///
    /// - Return [`ParseError::Empty`] if report has no lines at all.
    /// - Return [`ParseError::Mode`] if first line mentions neither mode.
    /// - Return [`ParseError::CurrentLink`] if no "link currently points to"
    ///   line precedes the candidate listing.
    /// - Return [`ParseError::Priority`] if a candidate priority is not an
    ///   integer.
    pub fn parse(group: &str, report: &str) -> Result<Self> {
        let mut lines = report.lines();
        let first = lines.next().ok_or_else(|| ParseError::Empty {
            group: group.into(),
        })?;
        let mode = parse_mode(group, first)?;

        let mut current = None;
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut in_slave_block = false;

        for line in lines {
            if let Some(caps) = CANDIDATE_LINE.captures(line) {
                let priority = caps["priority"]
                    .parse::<Priority>()
                    .map_err(|_| ParseError::Priority {
                        group: group.into(),
                        value: caps["priority"].into(),
                    })?;
                candidates.push(Candidate {
                    path: PathBuf::from(&caps["path"]),
                    priority,
                    slaves: Vec::new(),
                });
                in_slave_block = true;
                continue;
            }

            if in_slave_block {
                if let (Some(caps), Some(candidate)) =
                    (SLAVE_LINE.captures(line), candidates.last_mut())
                {
                    candidate
                        .slaves
                        .push((caps["name"].into(), PathBuf::from(&caps["target"])));
                    continue;
                }

                // INVARIANT: Slave block ends at first line that is not a slave.
                in_slave_block = false;
            }

            if candidates.is_empty() && current.is_none() {
                current = CURRENT_LINE
                    .captures(line)
                    .map(|caps| PathBuf::from(&caps["path"]));
            }
        }

        let current = current.ok_or_else(|| ParseError::CurrentLink {
            group: group.into(),
        })?;

        Ok(Self {
            mode,
            current,
            candidates,
        })
    }

    /// Selection mode of the group.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Target the master link currently points to.
    pub fn current(&self) -> &Path {
        self.current.as_path()
    }

    /// All candidates in report order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Find candidate by target path.
    pub fn candidate(&self, path: impl AsRef<Path>) -> Option<&Candidate> {
        self.candidates
            .iter()
            .find(|candidate| candidate.path == path.as_ref())
    }

    /// Slave name and slave target pairs of a candidate.
    ///
    /// Empty if the path is not listed as a candidate, because a candidate
    /// without slaves is just as valid as one that is missing.
    pub fn slave_targets(&self, path: impl AsRef<Path>) -> &[(String, PathBuf)] {
        self.candidate(path)
            .map(|candidate| candidate.slaves.as_slice())
            .unwrap_or_default()
    }

    /// Target of one named slave for a candidate, if configured.
    pub fn slave_target(&self, path: impl AsRef<Path>, name: &str) -> Option<&Path> {
        self.slave_targets(path)
            .iter()
            .find(|(slave, _)| slave == name)
            .map(|(_, target)| target.as_path())
    }
}

/// Check if raw display report lists target path.
///
/// Looks for a line that begins with the path, and ends there or continues
/// with whitespace. A path is listed whether it is active or not. Does not
/// require the rest of the report to be well-formed.
pub fn lists_path(report: &str, path: impl AsRef<Path>) -> bool {
    let path = path.as_ref().to_string_lossy();
    report.lines().any(|line| {
        line.strip_prefix(path.as_ref())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

/// Check if raw display report lists any candidate at all.
pub fn has_candidates(report: &str) -> bool {
    report.lines().any(|line| CANDIDATE_LINE.is_match(line))
}

/// Parsed state file of an alternative group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    /// Mode recorded in the state file.
    pub mode: Mode,

    /// Location of the master link.
    pub link: PathBuf,

    /// Slave name and slave link pairs, in file order.
    pub slaves: Vec<(String, PathBuf)>,
}

impl StateFile {
    /// Parse state file of target group.
    ///
    /// # Errors
    ///
    /// - Return [`ParseError::StateFile`] if mode or master link lines are
    ///   missing, or a slave name is not followed by its link.
    pub fn parse(group: &str, content: &str) -> Result<Self> {
        let malformed = |reason: &str| ParseError::StateFile {
            group: group.into(),
            reason: reason.into(),
        };

        let mut lines = content.lines().map(str::trim);
        let mode = lines
            .next()
            .ok_or_else(|| malformed("missing mode line"))?
            .parse::<Mode>()
            .map_err(|err| malformed(&err.to_string()))?;
        let link = lines
            .next()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| malformed("missing master link line"))?;

        let mut slaves = Vec::new();
        while let Some(name) = lines.next() {
            if name.is_empty() {
                break;
            }

            let slave_link = lines
                .next()
                .filter(|line| !line.is_empty())
                .ok_or_else(|| malformed(&format!("slave {name:?} has no link")))?;
            slaves.push((name.to_string(), PathBuf::from(slave_link)));
        }

        Ok(Self { mode, link, slaves })
    }
}

fn parse_mode(group: &str, first: &str) -> Result<Mode> {
    // INVARIANT: Skip group name so a group called "automake" is not auto.
    let status = first.strip_prefix(group).unwrap_or(first);
    if status.contains("auto") {
        Ok(Mode::Auto)
    } else if status.contains("manual") {
        Ok(Mode::Manual)
    } else {
        Err(ParseError::Mode {
            group: group.into(),
        })
    }
}

/// Status report parsing errors.
///
/// All of these mean the external tool printed something this parser does
/// not understand, e.g., an unsupported tool version or a corrupted registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Display report is empty.
    #[error("empty status report for alternative {group:?}")]
    Empty { group: String },

    /// First line mentions neither auto nor manual mode.
    #[error("could not determine if alternative {group:?} is in auto or manual mode")]
    Mode { group: String },

    /// No "link currently points to" line.
    #[error("could not determine current path of alternative {group:?}")]
    CurrentLink { group: String },

    /// Candidate priority is not integer-like.
    #[error("alternative {group:?} lists non-integer priority {value:?}")]
    Priority { group: String, value: String },

    /// State file is malformed.
    #[error("malformed state file for alternative {group:?}: {reason}")]
    StateFile { group: String, reason: String },
}

/// Friendly result alias :3
pub type Result<T, E = ParseError> = std::result::Result<T, E>;
