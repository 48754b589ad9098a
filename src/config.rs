// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the manifest file that describes the desired state
//! of the registry, to simplify the process of serialization and
//! deserialization. File I/O is left to the caller to figure out.

use crate::{
    identity::{EntryKey, IdentityError},
    model::{Mode, Priority, SlaveLink},
    mutator::Registration,
    path::{DEFAULT_COMMAND, DEFAULT_REGISTRY_DIR},
    reconcile::{DesiredEntry, DesiredGroup, Ensure},
    tool::SystemTool,
};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Manifest layout.
///
/// A manifest is composed of three basic parts: settings, entries, and
/// groups. The settings section defines how to reach the external tool and
/// its registry. Each entry declares one group and target path pairing
/// that should, or should not, be registered. Each group declares which
/// path a group should point to, and which mode it should be in.
///
/// # General Layout
///
/// ```toml
/// [settings]
/// command = "/usr/sbin/update-alternatives"
/// registry_dir = "/var/lib/alternatives"
///
/// [[alternative]]
/// title = "editor:/usr/bin/vim"
/// priority = 50
/// slave = [{ name = "editor.1.gz", link = "/usr/share/man/man1/editor.1.gz", path = "/usr/share/man/man1/vim.1.gz" }]
///
/// [[alternatives]]
/// name = "editor"
/// mode = "auto"
/// ```
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Manifest {
    /// Settings to reach the registry.
    #[serde(default)]
    pub settings: Settings,

    /// Entry declarations.
    #[serde(default, rename = "alternative", skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryDecl>,

    /// Group declarations.
    #[serde(default, rename = "alternatives", skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupDecl>,
}

impl Manifest {
    /// Resolve every entry declaration into a desired entry.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError`] if an entry identity cannot be resolved.
    pub fn desired_entries(&self) -> Result<Vec<DesiredEntry>> {
        self.entries.iter().map(EntryDecl::to_desired).collect()
    }

    /// Resolve every group declaration into a desired group.
    pub fn desired_groups(&self) -> Vec<DesiredGroup> {
        self.groups.iter().map(GroupDecl::to_desired).collect()
    }
}

impl FromStr for Manifest {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut manifest: Manifest = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        manifest.settings.command = expand(&manifest.settings.command)?;
        manifest.settings.registry_dir = expand(&manifest.settings.registry_dir)?;
        for entry in &mut manifest.entries {
            entry.path = entry.path.as_deref().map(expand).transpose()?;
            entry.link = entry.link.as_deref().map(expand).transpose()?;
            for slave in &mut entry.slaves {
                slave.link = expand(&slave.link)?;
                slave.path = expand(&slave.path)?;
            }
        }
        for group in &mut manifest.groups {
            group.path = group.path.as_deref().map(expand).transpose()?;
        }

        // INVARIANT: Every entry must resolve to a key with an absolute path.
        for entry in &manifest.entries {
            let key = entry.key()?;
            if !key.path().is_absolute() {
                return Err(ConfigError::RelativePath(key.path().to_path_buf()));
            }
        }

        Ok(manifest)
    }
}

impl Display for Manifest {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Registry access settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Path to `update-alternatives` binary.
    pub command: PathBuf,

    /// Registry directory with one state file per group.
    pub registry_dir: PathBuf,
}

impl Settings {
    /// Construct system tool from settings.
    pub fn tool(&self) -> SystemTool {
        SystemTool::new(&self.command, &self.registry_dir)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.into(),
            registry_dir: DEFAULT_REGISTRY_DIR.into(),
        }
    }
}

/// Entry declaration.
///
/// Identity is given either as a combined `title = "<group>:<path>"`, or as
/// separate `name` and `path` fields. Separate fields fill in whatever the
/// title leaves out, but may not contradict it.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct EntryDecl {
    /// Combined `<group>:<path>` identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Group name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Target path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Master link, `/usr/bin/<name>` if missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<PathBuf>,

    /// Priority of the entry.
    #[serde(default)]
    pub priority: Priority,

    /// Whether entry should be registered.
    #[serde(default)]
    pub ensure: Ensure,

    /// Slave links of the entry.
    #[serde(default, rename = "slave", skip_serializing_if = "Vec::is_empty")]
    pub slaves: Vec<SlaveLink>,
}

impl EntryDecl {
    /// Resolve composite key of declaration.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Identity`] if title cannot be resolved.
    /// - Return [`ConfigError::ConflictingIdentity`] if title disagrees with
    ///   name or path.
    /// - Return [`ConfigError::MissingIdentity`] if name or path is missing.
    pub fn key(&self) -> Result<EntryKey> {
        let titled = self
            .title
            .as_deref()
            .map(str::parse::<EntryKey>)
            .transpose()?;

        match (titled, &self.name, &self.path) {
            (Some(key), name, path) => {
                let conflict = name.as_deref().is_some_and(|name| name != key.group())
                    || path.as_deref().is_some_and(|path| path != key.path());
                if conflict {
                    return Err(ConfigError::ConflictingIdentity(key.to_string()));
                }
                Ok(key)
            }
            (None, Some(name), Some(path)) => Ok(EntryKey::new(name.as_str(), path.as_path())),
            (None, _, _) => Err(ConfigError::MissingIdentity),
        }
    }

    /// Resolve declaration into desired entry.
    ///
    /// # Errors
    ///
    /// - Return any error of [`EntryDecl::key`].
    pub fn to_desired(&self) -> Result<DesiredEntry> {
        let key = self.key()?;
        let link = self.link.clone().unwrap_or_else(|| key.default_link());

        Ok(DesiredEntry {
            registration: Registration {
                key,
                link,
                priority: self.priority,
                slaves: self.slaves.clone(),
            },
            ensure: self.ensure,
        })
    }
}

/// Group declaration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct GroupDecl {
    /// Group name.
    pub name: String,

    /// Registered path the group should point to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Mode the group should be in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

impl GroupDecl {
    /// Resolve declaration into desired group.
    pub fn to_desired(&self) -> DesiredGroup {
        DesiredGroup {
            name: self.name.clone(),
            path: self.path.clone(),
            mode: self.mode,
        }
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())?.into_owned(),
    ))
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Entry title cannot be resolved.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Entry has neither a title nor both name and path.
    #[error("alternative needs a title, or both a name and a path")]
    MissingIdentity,

    /// Entry title disagrees with its name or path fields.
    #[error("alternative {0:?} has a name or path that contradicts its title")]
    ConflictingIdentity(String),

    /// Entry target path is not absolute.
    #[error("alternative path {:?} must be a fully qualified path", .0.display())]
    RelativePath(PathBuf),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
