// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Declarative management of Linux alternatives.
//!
//! An __alternative group__ is a generic symlink, e.g., `/usr/bin/editor`,
//! that points to one of several registered implementations, e.g.,
//! `/usr/bin/vim`. Each implementation is registered with a priority and
//! optional slave links that switch together with the master link.
//!
//! Altsync observes the registry through the external `update-alternatives`
//! tool, compares it against a manifest of desired state, and issues the
//! smallest set of tool invocations that reproduces that state. Running it
//! again on a registry that already matches does nothing.

pub mod config;
pub mod identity;
pub mod model;
pub mod mutator;
pub mod path;
pub mod reconcile;
pub mod registry;
pub mod status;
pub mod tool;

pub use config::Manifest;
pub use identity::EntryKey;
pub use model::{Mode, Priority, SlaveLink};
pub use mutator::{Mutation, Registration};
pub use reconcile::{ApplyReport, DesiredEntry, DesiredGroup, Ensure, Reconciler};
pub use registry::Snapshot;
pub use tool::{AlternativesTool, SystemTool};
