// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Value types shared between observation and reconciliation.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Selection mode of an alternative group.
///
/// Mode belongs to the group, not to any single entry. Selecting a specific
/// path, or re-registering an entry, moves the group into manual mode as a
/// side effect of the external tool. Only an explicit switch moves it back to
/// auto mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Active entry is the one with the highest priority.
    #[default]
    Auto,

    /// Active entry was pinned by an operator.
    Manual,
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            other => Err(UnknownMode(other.into())),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Auto => fmt.write_str("auto"),
            Self::Manual => fmt.write_str("manual"),
        }
    }
}

/// Mode string is neither "auto" nor "manual".
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown alternative mode {0:?}")]
pub struct UnknownMode(pub String);

/// Priority of an alternative entry.
///
/// The external tool treats priority as an integer, but it travels as text in
/// both its output and in manifests. Accepts either form when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(try_from = "PriorityRepr", into = "i64")]
pub struct Priority(i64);

impl Priority {
    /// Construct new priority.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw integer value.
    pub fn value(self) -> i64 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(10)
    }
}

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| InvalidPriority(value.into()))
    }
}

impl Display for Priority {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}", self.0)
    }
}

impl From<Priority> for i64 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityRepr {
    Integer(i64),
    Text(String),
}

impl TryFrom<PriorityRepr> for Priority {
    type Error = InvalidPriority;

    fn try_from(repr: PriorityRepr) -> Result<Self, Self::Error> {
        match repr {
            PriorityRepr::Integer(value) => Ok(Self(value)),
            PriorityRepr::Text(text) => text.parse(),
        }
    }
}

/// Priority is not integer-like.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("priority {0:?} is not an integer")]
pub struct InvalidPriority(pub String);

/// Auxiliary symlink that follows the master selection of its group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct SlaveLink {
    /// Name of the slave, e.g., "editor.1.gz".
    pub name: String,

    /// Location of the slave symlink.
    pub link: PathBuf,

    /// Target the slave symlink points to for this entry.
    pub path: PathBuf,
}

impl SlaveLink {
    /// Construct new slave link.
    pub fn new(name: impl Into<String>, link: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            path: path.into(),
        }
    }
}

/// Compare two slave sets.
///
/// Order of declaration does not matter, but cardinality does. Each slave is
/// compared on all three of its fields.
pub fn slaves_in_sync(desired: &[SlaveLink], actual: &[SlaveLink]) -> bool {
    if desired.len() != actual.len() {
        return false;
    }

    let mut desired = desired.iter().collect::<Vec<_>>();
    let mut actual = actual.iter().collect::<Vec<_>>();
    desired.sort();
    actual.sort();

    desired == actual
}
