// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Reconciliation of desired and actual registry state.
//!
//! Altsync describes what the registry should look like through two kinds of
//! declarations:
//!
//! - __Entries__ state that a group and target path pairing should be
//!   registered with some link, priority, and slave links, or should not be
//!   registered at all.
//! - __Groups__ state which registered path a group should point to, and
//!   whether the group should be in auto mode.
//!
//! # Entry Transitions
//!
//! An entry that should exist but does not gets a full install. An entry
//! that exists but differs in priority or slave links gets the exact same
//! full install, because the external tool has no narrower verb for those.
//! An entry that should not exist gets removed. Link differences are
//! reported, but never acted upon.
//!
//! # Group Transitions
//!
//! A group pointing somewhere else than desired gets the narrow set verb. A
//! group in manual mode that should be in auto mode gets the auto verb. The
//! reverse cannot be requested: manual mode is only ever reached as a side
//! effect of other mutations. Asking for manual mode on an auto group without
//! also asking for a new path is rejected.

use crate::{
    identity::EntryKey,
    model::{slaves_in_sync, Mode},
    mutator::{Mutation, Mutator, MutatorError, Registration},
    registry::{RegistryError, Snapshot},
    status::lists_path,
    tool::AlternativesTool,
};

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, path::PathBuf};
use tracing::{debug, info, instrument, warn};

/// Whether an entry should be registered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// Entry should be registered.
    #[default]
    Present,

    /// Entry should not be registered.
    Absent,
}

/// Desired state of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredEntry {
    /// Full registration to reproduce.
    pub registration: Registration,

    /// Whether the registration should exist.
    pub ensure: Ensure,
}

impl DesiredEntry {
    /// Construct new desired entry that should be present.
    pub fn present(registration: Registration) -> Self {
        Self {
            registration,
            ensure: Ensure::Present,
        }
    }

    /// Construct new desired entry that should be absent.
    pub fn absent(key: EntryKey) -> Self {
        Self {
            registration: Registration::new(key),
            ensure: Ensure::Absent,
        }
    }

    /// Composite key of the entry.
    pub fn key(&self) -> &EntryKey {
        &self.registration.key
    }
}

/// Desired state of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredGroup {
    /// Name of the group.
    pub name: String,

    /// Registered path the group should point to.
    pub path: Option<PathBuf>,

    /// Mode the group should be in.
    pub mode: Option<Mode>,
}

/// Mutations committed by a reconciliation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Committed mutations in order. Only planned when in dry run mode.
    pub mutations: Vec<Mutation>,
}

impl ApplyReport {
    /// Check if nothing needed to change.
    pub fn is_noop(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Drive registry towards desired state.
#[derive(Debug)]
pub struct Reconciler<'tool, T>
where
    T: AlternativesTool,
{
    tool: &'tool T,
    mutator: Mutator<'tool, T>,
    dry_run: bool,
}

impl<'tool, T> Reconciler<'tool, T>
where
    T: AlternativesTool,
{
    /// Construct new reconciler.
    pub fn new(tool: &'tool T, dry_run: bool) -> Self {
        Self {
            tool,
            mutator: Mutator::new(tool, dry_run),
            dry_run,
        }
    }

    /// Check if entry is registered right now.
    ///
    /// Asks the external tool directly instead of consulting a snapshot. A
    /// group that cannot be displayed means the entry does not exist. Any
    /// listing of the path counts, active or not.
    pub fn exists(&self, key: &EntryKey) -> bool {
        match self.tool.display(key.group()) {
            Ok(report) => lists_path(&report, key.path()),
            Err(err) => {
                debug!("treat {key} as absent: {err}");
                false
            }
        }
    }

    /// Decide mutations for one entry.
    ///
    /// Yields at most one mutation.
    #[instrument(skip(self, desired, snapshot), fields(entry = %desired.key()), level = "debug")]
    pub fn plan_entry(&self, desired: &DesiredEntry, snapshot: &Snapshot) -> Vec<Mutation> {
        let key = desired.key();
        let exists = self.exists(key);

        if desired.ensure == Ensure::Absent {
            if exists {
                return vec![Mutation::Remove(key.clone())];
            }
            return Vec::new();
        }

        if !exists {
            return vec![Mutation::Install(desired.registration.clone())];
        }

        let Some(actual) = snapshot.entry(key) else {
            debug!("{key} listed but missing from snapshot, registering again");
            return vec![Mutation::Install(desired.registration.clone())];
        };

        if actual.link != desired.registration.link {
            warn!(
                "{key} uses link {}, not {}, links of existing entries are left alone",
                actual.link.display(),
                desired.registration.link.display()
            );
        }

        let priority_match = actual.priority == desired.registration.priority;
        let slaves_match = slaves_in_sync(&desired.registration.slaves, &actual.slaves);
        if priority_match && slaves_match {
            return Vec::new();
        }

        debug!("{key} out of sync: priority match {priority_match}, slaves match {slaves_match}");
        vec![Mutation::Install(desired.registration.clone())]
    }

    /// Decide mutations for one group.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::UnknownGroup`] if group is not registered.
    /// - Return [`ReconcileError::ForceManual`] if manual mode is requested
    ///   for a group in auto mode without selecting a new path.
    #[instrument(skip(self, desired, snapshot), fields(group = %desired.name), level = "debug")]
    pub fn plan_group(&self, desired: &DesiredGroup, snapshot: &Snapshot) -> Result<Vec<Mutation>> {
        let actual = snapshot
            .group(&desired.name)
            .ok_or_else(|| ReconcileError::UnknownGroup {
                group: desired.name.clone(),
            })?;

        let mut mutations = Vec::new();
        if let Some(path) = &desired.path {
            if *path != actual.current {
                mutations.push(Mutation::Set {
                    group: desired.name.clone(),
                    path: path.clone(),
                });
            }
        }

        match (desired.mode, actual.mode) {
            (Some(Mode::Auto), Mode::Manual) => {
                if !mutations.is_empty() {
                    warn!(
                        "{} is set to a path and switched to auto mode, auto mode wins",
                        desired.name
                    );
                }
                mutations.push(Mutation::Auto {
                    group: desired.name.clone(),
                });
            }
            (Some(Mode::Manual), Mode::Auto) if mutations.is_empty() => {
                return Err(ReconcileError::ForceManual {
                    group: desired.name.clone(),
                });
            }
            _ => {}
        }

        Ok(mutations)
    }

    /// Reconcile all entries, then all groups.
    ///
    /// Scans the registry once for the entries. If any entry mutation was
    /// committed, scans again before the groups so that they see the entries
    /// they may point to. Stops at the first fatal failure.
    ///
    /// # Errors
    ///
    /// - Return [`ReconcileError::Scan`] if registry cannot be scanned.
    /// - Return [`ReconcileError::Commit`] if a mutation fails.
    /// - Return any error of [`Reconciler::plan_group`].
    pub fn apply(&self, entries: &[DesiredEntry], groups: &[DesiredGroup]) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        let mut snapshot = Snapshot::scan(self.tool)?;

        let mut pending_groups = BTreeSet::new();
        for entry in entries {
            for mutation in self.plan_entry(entry, &snapshot) {
                self.mutator.commit(&mutation)?;
                pending_groups.insert(mutation.group().to_string());
                report.mutations.push(mutation);
            }
        }

        if !self.dry_run && !report.is_noop() {
            snapshot = Snapshot::scan(self.tool)?;
        }

        for group in groups {
            if self.dry_run
                && snapshot.group(&group.name).is_none()
                && pending_groups.contains(&group.name)
            {
                info!("{} is not registered yet, skipping", group.name);
                continue;
            }

            for mutation in self.plan_group(group, &snapshot)? {
                self.mutator.commit(&mutation)?;
                report.mutations.push(mutation);
            }
        }

        if report.is_noop() {
            info!("registry already in desired state");
        }

        Ok(report)
    }
}

/// Reconciliation error types.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Registry cannot be observed.
    #[error(transparent)]
    Scan(#[from] RegistryError),

    /// Mutation failed.
    #[error(transparent)]
    Commit(#[from] MutatorError),

    /// Group declaration refers to a group that is not registered.
    #[error("alternative {group:?} is not registered, cannot select its path or mode")]
    UnknownGroup { group: String },

    /// Manual mode requested without a path to pin.
    #[error("alternative {group:?} cannot be forced into manual mode, select a path instead")]
    ForceManual { group: String },
}

/// Friendly result alias :3
pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
