// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Registry mutations.
//!
//! Every reconciliation decision becomes exactly one invocation of the
//! external tool. The effect of a mutation is not verified here; it only
//! becomes observable on the next registry scan.

use crate::{
    identity::EntryKey,
    model::{Priority, SlaveLink},
    tool::AlternativesTool,
};

use std::{
    ffi::OsString,
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};
use tracing::{info, instrument};

/// Full registration of an entry.
///
/// Priority and slave links are not addressable on their own. The external
/// tool only accepts them as part of a complete registration, so they travel
/// together as one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Group and target path.
    pub key: EntryKey,

    /// Location of the master link.
    pub link: PathBuf,

    /// Priority of the entry.
    pub priority: Priority,

    /// Slave links, in declared order.
    pub slaves: Vec<SlaveLink>,
}

impl Registration {
    /// Construct new registration with default link, priority, and no slaves.
    pub fn new(key: EntryKey) -> Self {
        Self {
            link: key.default_link(),
            key,
            priority: Priority::default(),
            slaves: Vec::new(),
        }
    }
}

/// Single change to apply to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Register entry, or re-register it with new priority or slaves.
    Install(Registration),

    /// Remove entry from its group.
    Remove(EntryKey),

    /// Point group at an already registered path.
    Set { group: String, path: PathBuf },

    /// Let group pick its entry by priority again.
    Auto { group: String },
}

impl Mutation {
    /// Name of the verb passed to the external tool.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Remove(_) => "remove",
            Self::Set { .. } => "set",
            Self::Auto { .. } => "auto",
        }
    }

    /// Group the mutation acts on.
    pub fn group(&self) -> &str {
        match self {
            Self::Install(registration) => registration.key.group(),
            Self::Remove(key) => key.group(),
            Self::Set { group, .. } | Self::Auto { group } => group.as_str(),
        }
    }

    /// Build argument list for the external tool.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![format!("--{}", self.verb()).into()];
        match self {
            Self::Install(registration) => {
                args.push(registration.link.clone().into());
                args.push(registration.key.group().into());
                args.push(registration.key.path().into());
                args.push(registration.priority.to_string().into());
                for slave in &registration.slaves {
                    args.push("--slave".into());
                    args.push(slave.link.clone().into());
                    args.push(slave.name.as_str().into());
                    args.push(slave.path.clone().into());
                }
            }
            Self::Remove(key) => {
                args.push(key.group().into());
                args.push(key.path().into());
            }
            Self::Set { group, path } => {
                args.push(group.into());
                args.push(path.clone().into());
            }
            Self::Auto { group } => {
                args.push(group.into());
            }
        }

        args
    }
}

impl Display for Mutation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Install(registration) => write!(
                fmt,
                "install {} with priority {} and {} slave(s)",
                registration.key,
                registration.priority,
                registration.slaves.len()
            ),
            Self::Remove(key) => write!(fmt, "remove {key}"),
            Self::Set { group, path } => write!(fmt, "set {group} to {}", path.display()),
            Self::Auto { group } => write!(fmt, "switch {group} to auto mode"),
        }
    }
}

/// Commit mutations through the external tool.
#[derive(Debug)]
pub struct Mutator<'tool, T>
where
    T: AlternativesTool,
{
    tool: &'tool T,
    dry_run: bool,
}

impl<'tool, T> Mutator<'tool, T>
where
    T: AlternativesTool,
{
    /// Construct new mutator.
    ///
    /// In dry run mode, mutations are logged but never committed.
    pub fn new(tool: &'tool T, dry_run: bool) -> Self {
        Self { tool, dry_run }
    }

    /// Commit one mutation.
    ///
    /// # Errors
    ///
    /// - Return [`MutatorError`] naming the verb and group if the external
    ///   tool reports failure. No retry is attempted.
    #[instrument(skip(self, mutation), fields(group = mutation.group()), level = "debug")]
    pub fn commit(&self, mutation: &Mutation) -> Result<()> {
        if self.dry_run {
            info!("would {mutation}");
            return Ok(());
        }

        info!("{mutation}");
        self.tool
            .invoke(&mutation.args())
            .map_err(|source| MutatorError {
                verb: mutation.verb(),
                group: mutation.group().into(),
                source,
            })?;

        Ok(())
    }
}

/// Mutation failed in the external tool.
#[derive(Debug, thiserror::Error)]
#[error("failed to {verb} alternative {group:?}")]
pub struct MutatorError {
    pub verb: &'static str,
    pub group: String,
    #[source]
    pub source: crate::tool::ToolError,
}

/// Friendly result alias :3
pub type Result<T, E = MutatorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn install_args_repeat_slave_triples_in_order() {
        let mutation = Mutation::Install(Registration {
            key: EntryKey::new("editor", "/usr/bin/vim"),
            link: "/usr/bin/editor".into(),
            priority: Priority::new(50),
            slaves: vec![
                SlaveLink::new("editor.1.gz", "/usr/share/man/man1/editor.1.gz", "/usr/share/man/man1/vim.1.gz"),
                SlaveLink::new("view", "/usr/bin/view", "/usr/bin/vim-view"),
            ],
        });

        let expect = vec![
            "--install",
            "/usr/bin/editor",
            "editor",
            "/usr/bin/vim",
            "50",
            "--slave",
            "/usr/share/man/man1/editor.1.gz",
            "editor.1.gz",
            "/usr/share/man/man1/vim.1.gz",
            "--slave",
            "/usr/bin/view",
            "view",
            "/usr/bin/vim-view",
        ];
        assert_eq!(strings(mutation.args()), expect);
    }

    #[test]
    fn install_defaults_to_group_link_and_priority_ten() {
        let mutation = Mutation::Install(Registration::new(EntryKey::new("pager", "/usr/bin/less")));
        let expect = vec!["--install", "/usr/bin/pager", "pager", "/usr/bin/less", "10"];
        assert_eq!(strings(mutation.args()), expect);
    }

    #[test]
    fn narrow_verb_args() {
        let remove = Mutation::Remove(EntryKey::new("editor", "/usr/bin/nano"));
        assert_eq!(strings(remove.args()), vec!["--remove", "editor", "/usr/bin/nano"]);

        let set = Mutation::Set {
            group: "editor".into(),
            path: "/usr/bin/vim".into(),
        };
        assert_eq!(strings(set.args()), vec!["--set", "editor", "/usr/bin/vim"]);

        let auto = Mutation::Auto {
            group: "editor".into(),
        };
        assert_eq!(strings(auto.args()), vec!["--auto", "editor"]);
        assert_eq!(auto.group(), "editor");
    }
}
