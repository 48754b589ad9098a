// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use altsync::{path::default_manifest_path, EntryKey, Manifest, Reconciler, Snapshot};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "altsync [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to manifest file.
    #[arg(short, long, global = true, value_name = "path")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let manifest_path = match self.manifest {
            Some(path) => path,
            None => default_manifest_path()?,
        };

        match self.command {
            Command::Apply(opts) => run_apply(manifest_path, opts),
            Command::List => run_list(manifest_path),
            Command::Show(opts) => run_show(manifest_path, opts),
            Command::Group(opts) => run_group(manifest_path, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Reconcile registry with manifest.
    #[command(override_usage = "altsync apply [options]")]
    Apply(ApplyOptions),

    /// List every registered entry as <group>:<path>.
    #[command(override_usage = "altsync list [options]")]
    List,

    /// Show registered state of one entry.
    #[command(override_usage = "altsync show [options] <group>:<path>")]
    Show(ShowOptions),

    /// Show registered state of one group.
    #[command(override_usage = "altsync group [options] <group>")]
    Group(GroupOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ApplyOptions {
    /// Only log what would change.
    #[arg(short, long)]
    pub noop: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ShowOptions {
    /// Entry title of the form <group>:<path>.
    #[arg(required = true, value_name = "title")]
    pub title: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct GroupOptions {
    /// Name of alternative group.
    #[arg(required = true, value_name = "group")]
    pub group: String,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = Cli::parse().run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = read_to_string(path)
        .with_context(|| format!("failed to read manifest {:?}", path.display()))?;
    let manifest = content
        .parse::<Manifest>()
        .with_context(|| format!("failed to parse manifest {:?}", path.display()))?;

    Ok(manifest)
}

/// Manifest for read-only commands, whose settings fall back to defaults.
fn load_manifest_or_default(path: &Path) -> Result<Manifest> {
    if path.exists() {
        return load_manifest(path);
    }

    debug!("no manifest at {:?}, using default settings", path.display());
    Ok(Manifest::default())
}

fn run_apply(manifest_path: PathBuf, opts: ApplyOptions) -> Result<()> {
    let manifest = load_manifest(&manifest_path)?;
    let entries = manifest.desired_entries()?;
    let groups = manifest.desired_groups();
    let tool = manifest.settings.tool();

    let report = Reconciler::new(&tool, opts.noop).apply(&entries, &groups)?;
    for mutation in &report.mutations {
        println!("{mutation}");
    }

    Ok(())
}

fn run_list(manifest_path: PathBuf) -> Result<()> {
    let manifest = load_manifest_or_default(&manifest_path)?;
    let snapshot = Snapshot::scan(&manifest.settings.tool())?;
    for (key, entry) in snapshot.entries() {
        println!("{key} priority {}", entry.priority);
    }

    Ok(())
}

fn run_show(manifest_path: PathBuf, opts: ShowOptions) -> Result<()> {
    let key: EntryKey = opts.title.parse()?;
    let manifest = load_manifest_or_default(&manifest_path)?;
    let snapshot = Snapshot::scan(&manifest.settings.tool())?;
    let entry = snapshot
        .entry(&key)
        .ok_or_else(|| anyhow!("alternative {key} is not registered"))?;

    println!("{key}");
    println!("  link: {}", entry.link.display());
    println!("  priority: {}", entry.priority);
    for slave in &entry.slaves {
        println!(
            "  slave {}: {} -> {}",
            slave.name,
            slave.link.display(),
            slave.path.display()
        );
    }

    Ok(())
}

fn run_group(manifest_path: PathBuf, opts: GroupOptions) -> Result<()> {
    let manifest = load_manifest_or_default(&manifest_path)?;
    let snapshot = Snapshot::scan(&manifest.settings.tool())?;
    let group = snapshot
        .group(&opts.group)
        .ok_or_else(|| anyhow!("alternative {:?} is not registered", opts.group))?;

    println!("{}", opts.group);
    println!("  link: {}", group.link.display());
    println!("  mode: {}", group.mode);
    println!("  current: {}", group.current.display());
    for path in snapshot.paths(&opts.group) {
        println!("  candidate: {}", path.display());
    }

    Ok(())
}
