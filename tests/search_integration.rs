//! End-to-end tests driving the search pipeline against a stub engine.
//!
//! A shell script stands in for spatch: it validates the staged query
//! program it receives and prints a canned match stream, so the whole
//! pipeline runs without coccinelle installed.

#![cfg(unix)]

use coccigrep::{Engine, EngineError, NoEmphasis, Operation, Query, RenderOptions, Search};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Write an executable `fake-spatch` into `dir`.
///
/// The stub sees the real invocation: `$1` is `-sp_file`, `$2` the staged
/// program, `$3` the first target file.
fn stub_engine(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-spatch");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
    path
}

fn c_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("decode.c");
    fs::write(
        &path,
        "int main(void) {\n    flags = 1;\n    other = 2;\n    flags = 3;\n}\n",
    )
    .unwrap();
    path
}

#[test]
fn search_runs_the_engine_and_dedups_its_stream() {
    let dir = TempDir::new().unwrap();
    let source = c_fixture(dir.path());

    // two spans on line 2 (one kept) plus one on line 4
    let stub = stub_engine(
        dir.path(),
        r#"test "$1" = "-sp_file" || exit 1
grep -q 'p@p1->flags |= E' "$2" || exit 1
echo "$3:2:4:2:9"
echo "$3:2:12:2:17"
echo "$3:4:4:4:9""#,
    );

    let query = Query::new(Operation::Set, "Packet", "flags").unwrap();
    let search = Search::new(query, Engine::new(&stub));
    let matches = search.run(&[source.clone()]).unwrap();

    assert_eq!(matches.len(), 2);
    assert_eq!(matches.as_slice()[0].line, 2);
    assert_eq!(matches.as_slice()[0].column, 4);
    assert_eq!(matches.as_slice()[1].line, 4);
}

#[test]
fn rendered_output_carries_the_operation_label_and_token() {
    let dir = TempDir::new().unwrap();
    let source = c_fixture(dir.path());
    let stub = stub_engine(dir.path(), r#"echo "$3:2:4:2:9""#);

    let query = Query::new(Operation::Set, "Packet", "flags").unwrap();
    let search = Search::new(query, Engine::new(&stub));
    let matches = search.run(&[source.clone()]).unwrap();

    let out = search
        .display(&matches, &RenderOptions::default(), &NoEmphasis)
        .unwrap();

    assert_eq!(
        out,
        format!("{}:2 (set *flags):     flags = 1;\n", source.display())
    );
}

#[test]
fn engine_noise_on_stdout_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let source = c_fixture(dir.path());
    let stub = stub_engine(
        dir.path(),
        r#"echo "init_defs_builtins: /usr/lib/coccinelle/standard.h"
echo ""
echo "$3:4:4:4:9"
echo "HANDLING: $3""#,
    );

    let query = Query::new(Operation::Used, "Packet", "flags").unwrap();
    let search = Search::new(query, Engine::new(&stub));
    let matches = search.run(&[source]).unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches.as_slice()[0].line, 4);
}

#[test]
fn failing_engine_surfaces_without_matches() {
    let dir = TempDir::new().unwrap();
    let source = c_fixture(dir.path());
    let stub = stub_engine(dir.path(), "exit 2");

    let query = Query::new(Operation::Test, "Packet", "flags").unwrap();
    let search = Search::new(query, Engine::new(&stub));

    let result = search.run(&[source]);
    assert!(matches!(result, Err(EngineError::Failed { .. })));
}

#[test]
fn cli_help_names_the_operations() {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "--", "--help"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Semantic grep for C source code"));
    assert!(stdout.contains("used, deref, set or test"));
}

#[test]
fn cli_renders_matches_from_the_stub_engine() {
    let dir = TempDir::new().unwrap();
    let source = c_fixture(dir.path());
    let stub = stub_engine(dir.path(), r#"echo "$3:2:4:2:9""#);

    let output = Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(["--type", "Packet", "--attribute", "flags", "--operation", "set"])
        .arg("--engine")
        .arg(&stub)
        .arg(&source)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(set *flags)"));
    assert!(stdout.contains("flags = 1;"));
}

#[test]
fn cli_emits_json_when_asked() {
    let dir = TempDir::new().unwrap();
    let source = c_fixture(dir.path());
    let stub = stub_engine(dir.path(), r#"echo "$3:2:4:2:9""#);

    let output = Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(["--type", "Packet", "--attribute", "flags", "--operation", "set", "--json"])
        .arg("--engine")
        .arg(&stub)
        .arg(&source)
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be a JSON document");
    assert_eq!(parsed[0]["line"], 2);
    assert_eq!(parsed[0]["column_end"], 9);
}
