//! Smoke test for the `pdfsnap` binary itself.

#![cfg(unix)]

use std::path::{Path, PathBuf};

fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt as _;
    let mut perms = std::fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("set perms");
}

fn pdfsnap_exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_pdfsnap")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push("pdfsnap");
            p
        })
}

#[test]
fn cli_renders_an_input_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let args_log = dir.path().join("args.log");
    let renderer = dir.path().join("fake-wkhtmltopdf");
    let script = format!(
        r#"#!/bin/sh
set -eu
printf '%s\n' "$@" > "{args_log}"
for last; do :; done
printf 'PDF' > "$last"
"#,
        args_log = args_log.display()
    );
    std::fs::write(&renderer, script).unwrap();
    make_executable(&renderer);

    let input = dir.path().join("page.html");
    std::fs::write(&input, "<h1>Hi</h1>").unwrap();
    let out = dir.path().join("out.pdf");

    let output = std::process::Command::new(pdfsnap_exe())
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .args(["--set", "grayscale", "--set", "margin-top=12mm"])
        .arg("--binary")
        .arg(&renderer)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(out.to_str().unwrap()));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "PDF");

    let args = std::fs::read_to_string(&args_log).unwrap();
    assert!(args.lines().any(|a| a == "--grayscale"));
    assert!(args.lines().any(|a| a == "--margin-top"));
    assert!(args.lines().any(|a| a == "12mm"));
}

#[test]
fn cli_rejects_unknown_options() {
    let output = std::process::Command::new(pdfsnap_exe())
        .args(["page.html", "-o", "out.pdf", "--set", "definitely-bogus=1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("definitely-bogus"),
        "stderr: {stderr}"
    );
}
