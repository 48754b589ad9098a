// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations of the external alternatives tool, its
//! registry, and the manifest that describes the desired state.

use std::path::PathBuf;

/// Default `update-alternatives` binary.
pub const DEFAULT_COMMAND: &str = "/usr/sbin/update-alternatives";

/// Default registry directory holding one state file per group.
///
/// Debian based systems keep theirs at `/var/lib/dpkg/alternatives`.
pub const DEFAULT_REGISTRY_DIR: &str = "/var/lib/alternatives";

/// Determine default absolute path to manifest file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/altsync/manifest.toml`.
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoConfigDir`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_manifest_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("altsync").join("manifest.toml"))
        .ok_or(NoConfigDir)
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoConfigDir;

/// Friendly result alias :3
pub type Result<T, E = NoConfigDir> = std::result::Result<T, E>;
