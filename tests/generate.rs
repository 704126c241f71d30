//! End-to-end generation tests against fake renderer scripts.

#![cfg(unix)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pdfsnap::{ContentItem, GenerationState, PdfError, PdfSession, WaitOutcome};

fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt as _;
    let mut perms = std::fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("set perms");
}

/// A fake renderer that records its argv and writes "PDF" to the last
/// argument (the output path).
fn write_recording_renderer(dir: &Path, args_log: &Path) -> PathBuf {
    let script_path = dir.join("fake-wkhtmltopdf");
    let script = format!(
        r#"#!/bin/sh
set -eu
printf '%s\n' "$@" > "{args_log}"
for last; do :; done
printf 'PDF' > "$last"
"#,
        args_log = args_log.display()
    );
    std::fs::write(&script_path, script).expect("write script");
    make_executable(&script_path);
    script_path
}

fn write_failing_renderer(dir: &Path) -> PathBuf {
    let script_path = dir.join("fake-wkhtmltopdf-fail");
    std::fs::write(
        &script_path,
        "#!/bin/sh\necho 'ContentNotFoundError' >&2\nexit 1\n",
    )
    .expect("write script");
    make_executable(&script_path);
    script_path
}

fn write_slow_renderer(dir: &Path) -> PathBuf {
    let script_path = dir.join("fake-wkhtmltopdf-slow");
    let script = r#"#!/bin/sh
set -eu
sleep 1
for last; do :; done
printf 'PDF' > "$last"
"#;
    std::fs::write(&script_path, script).expect("write script");
    make_executable(&script_path);
    script_path
}

fn materialized_files(session: &PdfSession) -> Vec<PathBuf> {
    session
        .contents()
        .iter()
        .filter_map(|item| match item {
            ContentItem::File(path) => Some(path.clone()),
            ContentItem::Url(_) => None,
        })
        .collect()
}

#[test]
fn sync_generation_returns_output_and_cleans_intermediates() {
    let dir = tempfile::TempDir::new().unwrap();
    let args_log = dir.path().join("args.log");
    let renderer = write_recording_renderer(dir.path(), &args_log);
    let out_path = dir.path().join("result.pdf");

    let mut session = PdfSession::new();
    session.set_binary(&renderer);
    session.set_option("margin-top", "15mm").unwrap();
    session.add_html("<h1>Hello</h1>").unwrap();

    let outcome = session.generate(Some(&out_path)).unwrap();
    assert_eq!(outcome, WaitOutcome::Succeeded(out_path.clone()));
    assert_eq!(session.state(), GenerationState::Succeeded);
    assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "PDF");

    let args = std::fs::read_to_string(&args_log).unwrap();
    let argv: Vec<&str> = args.lines().collect();
    let margin_pos = argv.iter().position(|a| *a == "--margin-top").unwrap();
    assert_eq!(argv[margin_pos + 1], "15mm");
    assert_eq!(*argv.last().unwrap(), out_path.to_str().unwrap());

    let intermediates = materialized_files(&session);
    assert_eq!(intermediates.len(), 1);
    let html = &intermediates[0];
    assert!(html.exists());
    // Content precedes the output path in the argument vector.
    let html_pos = argv.iter().position(|a| *a == html.to_str().unwrap()).unwrap();
    assert!(html_pos < argv.len() - 1);

    drop(session);
    assert!(!html.exists(), "intermediate html not cleaned up");
    assert!(out_path.exists(), "output must survive the session");
}

#[test]
fn toc_token_is_emitted_between_main_options_and_content() {
    let dir = tempfile::TempDir::new().unwrap();
    let args_log = dir.path().join("args.log");
    let renderer = write_recording_renderer(dir.path(), &args_log);
    let out_path = dir.path().join("result.pdf");

    let mut session = PdfSession::new();
    session.set_binary(&renderer);
    session.set_toc_option("toc-header-text", "Contents").unwrap();
    session.add_url("http://example.com/doc");

    session.generate(Some(&out_path)).unwrap();

    let args = std::fs::read_to_string(&args_log).unwrap();
    let argv: Vec<&str> = args.lines().collect();
    let toc_pos = argv.iter().position(|a| *a == "toc").unwrap();
    let last_main_flag = argv
        .iter()
        .rposition(|a| *a == "--margin-right")
        .unwrap();
    let content_pos = argv
        .iter()
        .position(|a| *a == "http://example.com/doc")
        .unwrap();
    assert!(last_main_flag < toc_pos);
    assert!(toc_pos < content_pos);
    assert_eq!(argv[toc_pos + 1], "--toc-header-text");
    assert_eq!(argv[toc_pos + 2], "Contents");
}

#[test]
fn failed_generation_reports_stderr_and_reclaims_output() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = write_failing_renderer(dir.path());
    let out_path = dir.path().join("partial.pdf");
    // Simulate a partial file left behind by the crashed renderer.
    std::fs::write(&out_path, "%PDF-garbage").unwrap();

    let mut session = PdfSession::new();
    session.set_binary(&renderer);
    session.add_html("<p>x</p>").unwrap();

    let outcome = session.generate(Some(&out_path)).unwrap();
    assert_eq!(outcome, WaitOutcome::Failed);
    assert_eq!(session.state(), GenerationState::Failed);
    let stderr = session.error_output().unwrap();
    assert!(
        stderr.contains("ContentNotFoundError"),
        "stderr not captured: {stderr:?}"
    );

    drop(session);
    assert!(!out_path.exists(), "failed output must be cleaned up");
}

#[test]
fn second_generation_while_running_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = write_slow_renderer(dir.path());
    let out_path = dir.path().join("slow.pdf");

    let mut session = PdfSession::new();
    session.set_binary(&renderer);
    session.add_html("<p>x</p>").unwrap();

    session.generate_async(Some(&out_path)).unwrap();
    assert!(session.is_running());
    assert_eq!(session.state(), GenerationState::Running);

    let err = session.generate_async(Some(&out_path)).unwrap_err();
    assert!(matches!(err, PdfError::ConcurrentGeneration));

    let outcome = session.wait().unwrap();
    assert_eq!(outcome, WaitOutcome::Succeeded(out_path.clone()));
    assert!(!session.is_running());
    // A finished session accepts a new generation.
    session.generate_async(Some(&out_path)).unwrap();
    session.wait().unwrap();
}

#[test]
fn wait_is_idempotent_after_exit_observed_by_polling() {
    let dir = tempfile::TempDir::new().unwrap();
    let args_log = dir.path().join("args.log");
    let renderer = write_recording_renderer(dir.path(), &args_log);
    let out_path = dir.path().join("poll.pdf");

    let mut session = PdfSession::new();
    session.set_binary(&renderer);
    session.add_html("<p>x</p>").unwrap();
    session.generate_async(Some(&out_path)).unwrap();

    while session.is_running() {
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    // The exit was reaped by is_running; wait() must still return the outcome.
    let outcome = session.wait().unwrap();
    assert_eq!(outcome, WaitOutcome::Succeeded(out_path));
}

#[test]
fn env_map_is_passed_through_to_the_child() {
    let dir = tempfile::TempDir::new().unwrap();
    let env_log = dir.path().join("env.log");
    let script_path = dir.path().join("fake-wkhtmltopdf-env");
    let script = format!(
        r#"#!/bin/sh
set -eu
printf '%s' "${{PDFSNAP_TEST_MARKER:-missing}}" > "{env_log}"
for last; do :; done
printf 'PDF' > "$last"
"#,
        env_log = env_log.display()
    );
    std::fs::write(&script_path, script).unwrap();
    make_executable(&script_path);

    let mut session = PdfSession::new();
    session.set_binary(&script_path);
    session.set_env(HashMap::from([(
        "PDFSNAP_TEST_MARKER".to_string(),
        "present".to_string(),
    )]));
    session.add_html("<p>x</p>").unwrap();
    session
        .generate(Some(&dir.path().join("env.pdf")))
        .unwrap();

    assert_eq!(std::fs::read_to_string(&env_log).unwrap(), "present");
}

#[test]
fn auto_generated_output_survives_success() {
    let dir = tempfile::TempDir::new().unwrap();
    let args_log = dir.path().join("args.log");
    let renderer = write_recording_renderer(dir.path(), &args_log);

    let mut session = PdfSession::new();
    session.set_binary(&renderer);
    session.add_html("<p>x</p>").unwrap();

    let outcome = session.generate(None).unwrap();
    let out_path = outcome.output().unwrap().to_path_buf();
    assert!(out_path.exists());

    drop(session);
    assert!(out_path.exists(), "successful output must not be deleted");
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn default_toc_xsl_captures_stdout_and_is_cached() {
    let dir = tempfile::TempDir::new().unwrap();
    let run_log = dir.path().join("runs.log");
    let script_path = dir.path().join("fake-wkhtmltopdf-xsl");
    let script = format!(
        r#"#!/bin/sh
set -eu
echo run >> "{run_log}"
printf '%s\n' '<xsl:stylesheet version="2.0"/>'
for last; do :; done
printf 'PDF' > "$last"
"#,
        run_log = run_log.display()
    );
    std::fs::write(&script_path, script).unwrap();
    make_executable(&script_path);

    // This path goes through the process-wide binary cache, not a session
    // override.
    pdfsnap::reset_binary_cache();
    pdfsnap::reset_toc_xsl_cache();
    pdfsnap::set_binary(&script_path);

    let xsl = pdfsnap::default_toc_xsl().unwrap();
    assert!(
        xsl.contains(r#"<xsl:stylesheet version="2.0"/>"#),
        "stdout not captured: {xsl:?}"
    );

    // A second call is served from the cache, even with the binary cache
    // cleared: the renderer must not run again.
    pdfsnap::reset_binary_cache();
    let again = pdfsnap::default_toc_xsl().unwrap();
    assert_eq!(again, xsl);
    let runs = std::fs::read_to_string(&run_log).unwrap();
    assert_eq!(runs.lines().count(), 1, "renderer ran more than once");

    pdfsnap::reset_binary_cache();
    pdfsnap::reset_toc_xsl_cache();
}

#[test]
fn auto_generated_output_is_reclaimed_on_failure() {
    let dir = tempfile::TempDir::new().unwrap();
    let renderer = write_failing_renderer(dir.path());

    let mut session = PdfSession::new();
    session.set_binary(&renderer);
    session.add_html("<p>x</p>").unwrap();

    let outcome = session.generate(None).unwrap();
    assert_eq!(outcome, WaitOutcome::Failed);
    let out_path = session.output_path().unwrap().to_path_buf();

    drop(session);
    assert!(!out_path.exists(), "failed auto output must be deleted");
}
