// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the `chime` binary against a temporary database.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Workspace {
    dir: tempfile::TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("chime.toml");
        let db = dir.path().join("data").join("chime.db");
        std::fs::write(
            &config,
            format!(
                "[storage]\ndatabase_path = {db:?}\n\n\
                 [speech]\napi_key = \"test-key\"\nbase_url = \"http://127.0.0.1:9/v1/text-to-speech\"\n",
                db = db.to_string_lossy()
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn chime(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_chime"))
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env("RUST_LOG", "off")
            .output()
            .unwrap()
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn user_add_list_and_empty_listing() {
    let ws = Workspace::new();

    let added = ws.chime(&["user", "add", "Ada", "--timezone", "America/New_York"]);
    assert!(added.status.success(), "{added:?}");
    assert_eq!(stdout(&added), "Created user 1 (Ada, America/New_York)\n");
    assert!(ws.path().join("data").join("chime.db").exists());

    let users = ws.chime(&["user", "list"]);
    assert!(users.status.success(), "{users:?}");
    assert_eq!(stdout(&users), "1\tAda\tAmerica/New_York\n");

    let listing = ws.chime(&["list", "--user", "1"]);
    assert!(listing.status.success(), "{listing:?}");
    let text = stdout(&listing);
    assert!(text.starts_with("Timers\n  (none)\n"), "got: {text}");
    assert!(text.ends_with("Looping reminders\n  (none)\n"), "got: {text}");

    let deleted = ws.chime(&["loops", "delete", "--user", "1", "1"]);
    assert!(deleted.status.success(), "{deleted:?}");
    assert_eq!(stdout(&deleted), "No looping reminder 1\n");
}

#[test]
fn unknown_timezone_fails() {
    let ws = Workspace::new();
    let output = ws.chime(&["user", "add", "Bob", "--timezone", "Mars/Olympus_Mons"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown timezone"), "got: {stderr}");
}

#[test]
fn listing_an_unknown_user_fails() {
    let ws = Workspace::new();
    let output = ws.chime(&["list", "--user", "42"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("user 42 not found"), "got: {stderr}");
}

#[test]
fn invalid_config_is_rejected() {
    let ws = Workspace::new();
    std::fs::write(&ws.config, "[storage]\ndatabse_path = \"x.db\"\n").unwrap();
    let output = ws.chime(&["user", "list"]);
    assert_eq!(output.status.code(), Some(1));
}
