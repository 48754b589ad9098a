// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Composite identity of alternative entries.
//!
//! An __entry__ is one concrete implementation registered under an
//! alternative group. Neither the group name nor the target path is unique
//! on its own: a group holds several candidate paths, and nothing stops the
//! same path from being registered under more than one group. Thus, every
//! entry is keyed by the pair of both.
//!
//! Some boundaries only carry a single string for an entry, e.g., the title
//! printed by `altsync list`. That string is the __combined token__
//! `<group>:<path>`, and it must be resolved back into an [`EntryKey`] before
//! any lookup is performed.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Composite key of an alternative entry.
///
/// Ordered by group name first, then by target path, so maps keyed by
/// [`EntryKey`] keep all entries of a group together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    group: String,
    path: PathBuf,
}

impl EntryKey {
    /// Construct new entry key from group name and target path.
    pub fn new(group: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            group: group.into(),
            path: path.into(),
        }
    }

    /// Name of the alternative group.
    pub fn group(&self) -> &str {
        self.group.as_str()
    }

    /// Target path of the entry.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Default master link of the entry's group, i.e., `/usr/bin/<group>`.
    pub fn default_link(&self) -> PathBuf {
        default_link(&self.group)
    }
}

/// Default master link for a group name.
pub fn default_link(group: &str) -> PathBuf {
    Path::new("/usr/bin").join(group)
}

impl FromStr for EntryKey {
    type Err = IdentityError;

    /// Resolve combined token `<group>:<path>`.
    ///
    /// Splits on the first colon only. Group names never contain a colon, so
    /// anything after the first colon belongs to the path.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (group, path) = token
            .split_once(':')
            .ok_or_else(|| IdentityError::MissingSeparator(token.into()))?;

        if group.is_empty() {
            return Err(IdentityError::EmptyGroup(token.into()));
        }

        if path.is_empty() {
            return Err(IdentityError::EmptyPath(token.into()));
        }

        Ok(Self::new(group, path))
    }
}

impl Display for EntryKey {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}:{}", self.group, self.path.display())
    }
}

/// Combined token resolution errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Token does not contain the `:` separator.
    #[error("entry title {0:?} is not of the form <group>:<path>")]
    MissingSeparator(String),

    /// Token has nothing before the separator.
    #[error("entry title {0:?} has an empty group name")]
    EmptyGroup(String),

    /// Token has nothing after the separator.
    #[error("entry title {0:?} has an empty target path")]
    EmptyPath(String),
}
