// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn loads_only_well_formed_md_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("beta.md"), "---\nlisten: [\"t.*\"]\n---\nbody\n").unwrap();
    std::fs::write(dir.path().join("alpha.md"), "---\n---\nbody\n").unwrap();
    std::fs::write(dir.path().join("broken.md"), "no header here\n").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "---\n---\nnot an agent\n").unwrap();

    let defs = load_dir(dir.path());
    let ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "beta"]);
}

#[test]
fn missing_directory_is_an_empty_set() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("agents");
    assert!(load_dir(&missing).is_empty());
}
