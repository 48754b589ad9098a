// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Registry scanning.
//!
//! The __registry__ is the on-disk store of all alternative groups, owned by
//! the external tool. Altsync never caches what it sees there. Instead each
//! reconciliation pass takes a fresh [`Snapshot`] once, and compares every
//! desired entry against it.
//!
//! # Snapshot Layout
//!
//! A snapshot holds two views of the registry:
//!
//! - Entries keyed by [`EntryKey`], one per candidate path listed under a
//!   group, with the link, priority, and slave links registered for it.
//! - Groups keyed by name, with the currently active target and mode.
//!
//! A group whose report lists no candidates at all still shows up in the
//! group listing of some registries. Such a group is skipped with a warning
//! instead of failing the whole scan.

use crate::{
    identity::{default_link, EntryKey},
    model::{Mode, Priority, SlaveLink},
    status::{has_candidates, ParseError, StateFile, StatusReport},
    tool::{AlternativesTool, ToolError},
};

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

/// Observed state of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualEntry {
    /// Location of the master link of the entry's group.
    pub link: PathBuf,

    /// Registered priority.
    pub priority: Priority,

    /// Slave links configured for this entry.
    pub slaves: Vec<SlaveLink>,
}

/// Observed state of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupState {
    /// Target the master link currently points to.
    pub current: PathBuf,

    /// Selection mode.
    pub mode: Mode,

    /// Location of the master link.
    pub link: PathBuf,
}

/// Point-in-time view of the whole registry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<EntryKey, ActualEntry>,
    groups: BTreeMap<String, GroupState>,
}

impl Snapshot {
    /// Scan registry through external tool.
    ///
    /// Invokes the display verb once per listed group, and reads each group's
    /// state file for the master link and slave link locations.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::List`] if groups cannot be listed.
    /// - Return [`RegistryError::Display`] if a group cannot be displayed.
    /// - Return [`RegistryError::Parse`] if a group report with candidates
    ///   cannot be parsed.
    #[instrument(skip(tool), level = "debug")]
    pub fn scan(tool: &impl AlternativesTool) -> Result<Self> {
        let mut snapshot = Self::default();
        for group in tool.list_groups().map_err(RegistryError::List)? {
            snapshot.scan_group(tool, &group)?;
        }
        debug!(
            "scanned {} group(s) with {} entries",
            snapshot.groups.len(),
            snapshot.entries.len()
        );

        Ok(snapshot)
    }

    fn scan_group(&mut self, tool: &impl AlternativesTool, group: &str) -> Result<()> {
        let report = tool
            .display(group)
            .map_err(|source| RegistryError::Display {
                group: group.into(),
                source,
            })?;

        let status = match StatusReport::parse(group, &report) {
            Ok(status) => status,
            Err(err) if !has_candidates(&report) => {
                warn!("alternative {group:?} lists no entries: {err}");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let state = match tool.read_state_file(group) {
            Ok(content) => StateFile::parse(group, &content)?,
            Err(err) => {
                warn!("cannot read state of alternative {group:?}, assuming default link: {err}");
                StateFile {
                    mode: status.mode(),
                    link: default_link(group),
                    slaves: Vec::new(),
                }
            }
        };

        for candidate in status.candidates() {
            let slaves = state
                .slaves
                .iter()
                .filter_map(|(name, link)| {
                    let Some(target) = status.slave_target(&candidate.path, name) else {
                        debug!(
                            "slave {name:?} has no target for {}",
                            candidate.path.display()
                        );
                        return None;
                    };
                    Some(SlaveLink::new(name.as_str(), link, target))
                })
                .collect();

            self.entries.insert(
                EntryKey::new(group, &candidate.path),
                ActualEntry {
                    link: state.link.clone(),
                    priority: candidate.priority,
                    slaves,
                },
            );
        }

        self.groups.insert(
            group.into(),
            GroupState {
                current: status.current().to_path_buf(),
                mode: status.mode(),
                link: state.link,
            },
        );

        Ok(())
    }

    /// Observed state of an entry.
    pub fn entry(&self, key: &EntryKey) -> Option<&ActualEntry> {
        self.entries.get(key)
    }

    /// All observed entries ordered by group, then path.
    pub fn entries(&self) -> impl Iterator<Item = (&EntryKey, &ActualEntry)> {
        self.entries.iter()
    }

    /// Observed state of a group.
    pub fn group(&self, name: &str) -> Option<&GroupState> {
        self.groups.get(name)
    }

    /// All observed groups ordered by name.
    pub fn groups(&self) -> impl Iterator<Item = (&String, &GroupState)> {
        self.groups.iter()
    }

    /// Paths registered under a group.
    pub fn paths(&self, group: &str) -> Vec<&Path> {
        self.entries
            .keys()
            .filter(|key| key.group() == group)
            .map(EntryKey::path)
            .collect()
    }
}

/// Registry scanning error types.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Registry groups cannot be listed.
    #[error("failed to list alternative groups")]
    List(#[source] ToolError),

    /// Display verb failed for a listed group.
    #[error("failed to display alternative {group:?}")]
    Display {
        group: String,
        #[source]
        source: ToolError,
    },

    /// Report or state file cannot be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Friendly result alias :3
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
