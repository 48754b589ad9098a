// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::RegistryFixture;

use altsync::{
    model::{slaves_in_sync, Mode},
    reconcile::ReconcileError,
    DesiredEntry, DesiredGroup, EntryKey, Manifest, Mutation, Priority, Reconciler, Registration,
    SlaveLink, Snapshot,
};

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn vim_registration(priority: i64) -> Registration {
    Registration {
        key: EntryKey::new("editor", "/usr/bin/vim"),
        link: "/usr/bin/editor".into(),
        priority: Priority::new(priority),
        slaves: vec![
            SlaveLink::new(
                "editor.1.gz",
                "/usr/share/man/man1/editor.1.gz",
                "/usr/share/man/man1/vim.1.gz",
            ),
            SlaveLink::new("editor-view", "/usr/bin/editor-view", "/usr/bin/view"),
        ],
    }
}

#[test]
fn installed_entry_reads_back_through_scan() -> Result<()> {
    let registry = RegistryFixture::new();
    let reconciler = Reconciler::new(&registry, false);

    let desired = DesiredEntry::present(vim_registration(40));
    reconciler.apply(&[desired], &[])?;

    let snapshot = Snapshot::scan(&registry)?;
    let actual = snapshot
        .entry(&EntryKey::new("editor", "/usr/bin/vim"))
        .expect("entry registered");

    assert_eq!(actual.priority, Priority::new(40));
    assert_eq!(actual.link, PathBuf::from("/usr/bin/editor"));
    assert!(slaves_in_sync(&vim_registration(40).slaves, &actual.slaves));

    Ok(())
}

#[test]
fn second_apply_changes_nothing() -> Result<()> {
    let registry = RegistryFixture::new().seed("editor", "/usr/bin/nano", 5, &[]);
    let reconciler = Reconciler::new(&registry, false);

    let entries = vec![
        DesiredEntry::present(vim_registration(40)),
        DesiredEntry::absent(EntryKey::new("editor", "/usr/bin/nano")),
    ];
    let groups = vec![DesiredGroup {
        name: "editor".into(),
        path: None,
        mode: Some(Mode::Auto),
    }];

    let first = reconciler.apply(&entries, &groups)?;
    assert_eq!(first.mutations.len(), 2);
    let calls = registry.calls();

    let second = reconciler.apply(&entries, &groups)?;
    assert!(second.is_noop());
    assert_eq!(registry.calls(), calls);

    Ok(())
}

#[test]
fn priority_change_reinstalls_with_every_slave() -> Result<()> {
    let registry = RegistryFixture::new().seed(
        "editor",
        "/usr/bin/vim",
        40,
        &[
            ("editor.1.gz", "/usr/share/man/man1/editor.1.gz", "/usr/share/man/man1/vim.1.gz"),
            ("editor-view", "/usr/bin/editor-view", "/usr/bin/view"),
        ],
    );
    let reconciler = Reconciler::new(&registry, false);

    let report = reconciler.apply(&[DesiredEntry::present(vim_registration(90))], &[])?;
    assert_eq!(report.mutations, vec![Mutation::Install(vim_registration(90))]);

    let expect = vec![vec![
        "--install",
        "/usr/bin/editor",
        "editor",
        "/usr/bin/vim",
        "90",
        "--slave",
        "/usr/share/man/man1/editor.1.gz",
        "editor.1.gz",
        "/usr/share/man/man1/vim.1.gz",
        "--slave",
        "/usr/bin/editor-view",
        "editor-view",
        "/usr/bin/view",
    ]];
    assert_eq!(registry.calls(), expect);

    Ok(())
}

#[test]
fn slave_order_does_not_matter() -> Result<()> {
    let registry = RegistryFixture::new().seed(
        "editor",
        "/usr/bin/vim",
        40,
        &[
            ("editor-view", "/usr/bin/editor-view", "/usr/bin/view"),
            ("editor.1.gz", "/usr/share/man/man1/editor.1.gz", "/usr/share/man/man1/vim.1.gz"),
        ],
    );
    let reconciler = Reconciler::new(&registry, false);

    let report = reconciler.apply(&[DesiredEntry::present(vim_registration(40))], &[])?;
    assert!(report.is_noop());

    Ok(())
}

#[test]
fn manual_group_back_to_auto_issues_one_call() -> Result<()> {
    let registry = RegistryFixture::new()
        .seed("editor", "/usr/bin/vim", 40, &[])
        .seed("editor", "/usr/bin/nano", 5, &[])
        .pin("editor", "/usr/bin/nano");
    assert_eq!(registry.mode("editor"), Some(Mode::Manual));

    let reconciler = Reconciler::new(&registry, false);
    let desired = DesiredGroup {
        name: "editor".into(),
        path: None,
        mode: Some(Mode::Auto),
    };
    reconciler.apply(&[], &[desired])?;

    assert_eq!(registry.calls(), vec![vec!["--auto", "editor"]]);
    assert_eq!(registry.mode("editor"), Some(Mode::Auto));
    assert_eq!(registry.current("editor"), Some(PathBuf::from("/usr/bin/vim")));

    Ok(())
}

#[test]
fn group_relocation_uses_set_only() -> Result<()> {
    let registry = RegistryFixture::new()
        .seed("editor", "/usr/bin/vim", 40, &[])
        .seed("editor", "/usr/bin/nano", 5, &[]);
    let reconciler = Reconciler::new(&registry, false);

    let desired = DesiredGroup {
        name: "editor".into(),
        path: Some("/usr/bin/nano".into()),
        mode: None,
    };
    reconciler.apply(&[], &[desired])?;

    assert_eq!(registry.calls(), vec![vec!["--set", "editor", "/usr/bin/nano"]]);
    assert_eq!(registry.mode("editor"), Some(Mode::Manual));

    Ok(())
}

#[test]
fn new_group_is_selectable_in_same_run() -> Result<()> {
    let registry = RegistryFixture::new();
    let reconciler = Reconciler::new(&registry, false);

    let entries = vec![
        DesiredEntry::present(Registration::new(EntryKey::new("pager", "/usr/bin/less"))),
        DesiredEntry::present(Registration {
            priority: Priority::new(1),
            ..Registration::new(EntryKey::new("pager", "/bin/more"))
        }),
    ];
    let groups = vec![DesiredGroup {
        name: "pager".into(),
        path: Some("/bin/more".into()),
        mode: None,
    }];
    let report = reconciler.apply(&entries, &groups)?;

    assert_eq!(report.mutations.len(), 3);
    assert_eq!(registry.current("pager"), Some(PathBuf::from("/bin/more")));

    Ok(())
}

#[test]
fn presence_check_ignores_other_paths_of_group() {
    let registry = RegistryFixture::new().seed("editor", "/usr/bin/nano", 5, &[]);
    let reconciler = Reconciler::new(&registry, false);

    assert!(!reconciler.exists(&EntryKey::new("editor", "/usr/bin/vim")));
    assert!(reconciler.exists(&EntryKey::new("editor", "/usr/bin/nano")));
    assert!(!reconciler.exists(&EntryKey::new("pager", "/usr/bin/less")));
}

#[test]
fn removing_last_entry_drops_group() -> Result<()> {
    let registry = RegistryFixture::new().seed("editor", "/usr/bin/nano", 5, &[]);
    let reconciler = Reconciler::new(&registry, false);

    reconciler.apply(
        &[DesiredEntry::absent(EntryKey::new("editor", "/usr/bin/nano"))],
        &[],
    )?;

    let snapshot = Snapshot::scan(&registry)?;
    assert_eq!(snapshot.group("editor"), None);
    assert_eq!(snapshot.entries().count(), 0);

    Ok(())
}

#[test]
fn failed_mutation_names_group_and_verb() {
    let registry = RegistryFixture::new().seed("editor", "/usr/bin/nano", 5, &[]);
    let reconciler = Reconciler::new(&registry, false);

    let desired = DesiredGroup {
        name: "editor".into(),
        path: Some("/usr/bin/emacs".into()),
        mode: None,
    };
    let result = reconciler.apply(&[], &[desired]);

    match result {
        Err(ReconcileError::Commit(err)) => {
            assert_eq!(err.verb, "set");
            assert_eq!(err.group, "editor");
        }
        other => panic!("expected commit failure, got {other:?}"),
    }
}

#[test]
fn listed_titles_resolve_back_to_entries() -> Result<()> {
    let registry = RegistryFixture::new()
        .seed("editor", "/usr/bin/vim", 40, &[])
        .seed("pager", "/usr/bin/less", 77, &[]);
    let snapshot = Snapshot::scan(&registry)?;

    let titles = snapshot
        .entries()
        .map(|(key, _)| key.to_string())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["editor:/usr/bin/vim", "pager:/usr/bin/less"]);

    for title in titles {
        let key: EntryKey = title.parse()?;
        assert!(snapshot.entry(&key).is_some());
    }

    Ok(())
}

#[test]
fn manifest_drives_reconciliation() -> Result<()> {
    let manifest: Manifest = indoc! {r#"
        [[alternative]]
        title = "editor:/usr/bin/vim"
        link = "/usr/bin/editor"
        priority = 40
        slave = [
            { name = "editor.1.gz", link = "/usr/share/man/man1/editor.1.gz", path = "/usr/share/man/man1/vim.1.gz" },
            { name = "editor-view", link = "/usr/bin/editor-view", path = "/usr/bin/view" },
        ]

        [[alternatives]]
        name = "editor"
        mode = "auto"
    "#}
    .parse()?;

    let registry = RegistryFixture::new();
    let reconciler = Reconciler::new(&registry, false);
    let report = reconciler.apply(&manifest.desired_entries()?, &manifest.desired_groups())?;

    assert_eq!(report.mutations, vec![Mutation::Install(vim_registration(40))]);

    let report = reconciler.apply(&manifest.desired_entries()?, &manifest.desired_groups())?;
    assert!(report.is_noop());

    Ok(())
}
