//! The generation session: option setters, content list, and supervision of
//! the external renderer process.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::thread::JoinHandle;

use crate::binary;
use crate::command;
use crate::error::{PdfError, PdfResult};
use crate::ledger::{TempFileKind, TempFileLedger};
use crate::materialize;
use crate::options::{OptionSet, OptionValue};
use crate::schema::OptionScope;

/// One input document, in submission order. The renderer concatenates
/// documents in this order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentItem {
    /// A local HTML file (including files materialized from inline HTML).
    File(PathBuf),
    /// A URL fetched by the renderer itself.
    Url(String),
}

impl ContentItem {
    fn as_arg(&self) -> OsString {
        match self {
            ContentItem::File(path) => path.as_os_str().to_os_string(),
            ContentItem::Url(url) => url.clone().into(),
        }
    }
}

/// Lifecycle of the session's external process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationState {
    /// No process started yet.
    Idle,
    /// The renderer is (believed to be) running.
    Running,
    /// The renderer exited successfully.
    Succeeded,
    /// The renderer exited unsuccessfully.
    Failed,
}

/// Result of waiting for a generation to finish.
///
/// A failed render is a value, not an error: callers inspect
/// [`PdfSession::error_output`] and decide whether to retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The renderer wrote the PDF; here is where.
    Succeeded(PathBuf),
    /// The renderer exited with a non-zero status. Whatever it wrote to the
    /// output path is scheduled for cleanup.
    Failed,
}

impl WaitOutcome {
    /// The output path on success.
    pub fn output(&self) -> Option<&Path> {
        match self {
            WaitOutcome::Succeeded(path) => Some(path),
            WaitOutcome::Failed => None,
        }
    }

    /// Whether the generation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Succeeded(_))
    }
}

#[derive(Debug)]
struct RunningProcess {
    child: Child,
    stdout_drain: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr_drain: JoinHandle<std::io::Result<Vec<u8>>>,
}

/// A single PDF generation session.
///
/// Collect options and content, then call [`generate`](Self::generate) for a
/// blocking render or [`generate_async`](Self::generate_async) plus
/// [`wait`](Self::wait)/[`is_running`](Self::is_running) for a non-blocking
/// one. All option and content setters must be called before a process is
/// started. Temp files created along the way are deleted when the session is
/// dropped; on success the output file is spared.
#[derive(Debug)]
pub struct PdfSession {
    options: OptionSet,
    toc_options: Option<OptionSet>,
    contents: Vec<ContentItem>,
    ledger: TempFileLedger,
    binary_override: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
    output_path: Option<PathBuf>,
    state: GenerationState,
    process: Option<RunningProcess>,
    outcome: Option<WaitOutcome>,
    captured_stdout: Option<String>,
    captured_stderr: Option<String>,
}

impl Default for PdfSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Margin baseline every new session starts from. This is the wrapper's own
/// default, not the renderer's: it also feeds the header/footer template
/// height, so it must be present even when the caller sets no margins.
const DEFAULT_MARGIN: &str = "10mm";

impl PdfSession {
    /// A fresh session with the default 10mm margins pre-seeded.
    pub fn new() -> Self {
        let mut options = OptionSet::new();
        for margin in ["margin-top", "margin-bottom", "margin-left", "margin-right"] {
            options.set_unchecked(margin, DEFAULT_MARGIN);
        }
        Self {
            options,
            toc_options: None,
            contents: Vec::new(),
            ledger: TempFileLedger::new(),
            binary_override: None,
            env: None,
            output_path: None,
            state: GenerationState::Idle,
            process: None,
            outcome: None,
            captured_stdout: None,
            captured_stderr: None,
        }
    }

    /// Set one main-scope option. Unknown names fail immediately; the value
    /// is never deferred to execution time.
    pub fn set_option(
        &mut self,
        name: &str,
        value: impl Into<OptionValue>,
    ) -> PdfResult<&mut Self> {
        self.options.set(name, value, OptionScope::Main)?;
        Ok(self)
    }

    /// Set several main-scope options.
    pub fn set_options<'a, I, V>(&mut self, options: I) -> PdfResult<&mut Self>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<OptionValue>,
    {
        for (name, value) in options {
            self.set_option(name, value)?;
        }
        Ok(self)
    }

    /// Set one toc-scope option. Setting any toc option switches the session
    /// into table-of-contents mode.
    pub fn set_toc_option(
        &mut self,
        name: &str,
        value: impl Into<OptionValue>,
    ) -> PdfResult<&mut Self> {
        // Validate before enabling toc mode, so a rejected name has no
        // side effect.
        crate::schema::validate(name, OptionScope::Toc)?;
        self.toc_options
            .get_or_insert_with(OptionSet::new)
            .set(name, value, OptionScope::Toc)?;
        Ok(self)
    }

    /// Set several toc-scope options.
    pub fn set_toc_options<'a, I, V>(&mut self, options: I) -> PdfResult<&mut Self>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<OptionValue>,
    {
        for (name, value) in options {
            self.set_toc_option(name, value)?;
        }
        Ok(self)
    }

    /// Explicitly toggle table-of-contents mode. Enabling keeps any toc
    /// options already set; disabling discards them.
    pub fn enable_toc(&mut self, enabled: bool) {
        if enabled {
            if self.toc_options.is_none() {
                self.toc_options = Some(OptionSet::new());
            }
        } else {
            self.toc_options = None;
        }
    }

    /// Whether a `toc` sub-command will be emitted.
    pub fn is_toc_enabled(&self) -> bool {
        self.toc_options.is_some()
    }

    /// Write one inline HTML document to a temp file and append it to the
    /// content list. The file is registered for cleanup.
    pub fn add_html(&mut self, html: &str) -> PdfResult<&mut Self> {
        let path = materialize::write_html_content(html, &materialize::temp_dir(), &mut self.ledger)?;
        self.contents.push(ContentItem::File(path));
        Ok(self)
    }

    /// [`add_html`](Self::add_html) for several documents, in order.
    pub fn add_html_many<I, S>(&mut self, html: I) -> PdfResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for doc in html {
            self.add_html(doc.as_ref())?;
        }
        Ok(self)
    }

    /// Append a URL to the content list, unchanged. No temp file is created.
    pub fn add_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.contents.push(ContentItem::Url(url.into()));
        self
    }

    /// [`add_url`](Self::add_url) for several URLs, in order.
    pub fn add_urls<I, S>(&mut self, urls: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for url in urls {
            self.add_url(url);
        }
        self
    }

    /// Append an existing HTML file to the content list.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.contents.push(ContentItem::File(path.into()));
        self
    }

    /// Use a specific renderer binary for this session instead of the
    /// process-wide resolved one.
    pub fn set_binary(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.binary_override = Some(path.into());
        self
    }

    /// Extra environment variables passed to the child process unmodified.
    pub fn set_env(&mut self, env: HashMap<String, String>) -> &mut Self {
        self.env = Some(env);
        self
    }

    /// The content list, in submission order.
    pub fn contents(&self) -> &[ContentItem] {
        &self.contents
    }

    /// The current process state.
    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// The output path of the current/last generation, if one was started.
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Captured stderr of the renderer. Available once the process has
    /// exited and been observed by [`wait`](Self::wait) or
    /// [`is_running`](Self::is_running).
    pub fn error_output(&self) -> Option<&str> {
        self.captured_stderr.as_deref()
    }

    /// Captured stdout of the renderer (e.g. for `dump-default-toc-xsl`).
    pub fn process_output(&self) -> Option<&str> {
        self.captured_stdout.as_deref()
    }

    /// Run a generation and block until it finishes.
    ///
    /// Without an explicit `output`, a temp path is auto-generated and
    /// survives only on success. Returns the typed outcome; see
    /// [`WaitOutcome`].
    #[tracing::instrument(skip(self, output))]
    pub fn generate(&mut self, output: Option<&Path>) -> PdfResult<WaitOutcome> {
        self.start(output)?;
        self.wait()
    }

    /// Start a generation and return immediately. Poll with
    /// [`is_running`](Self::is_running) or block with [`wait`](Self::wait).
    #[tracing::instrument(skip(self, output))]
    pub fn generate_async(&mut self, output: Option<&Path>) -> PdfResult<()> {
        self.start(output)
    }

    fn start(&mut self, output: Option<&Path>) -> PdfResult<()> {
        if self.is_running() {
            return Err(PdfError::ConcurrentGeneration);
        }

        let temp_dir = materialize::temp_dir();
        let output_path = match output {
            Some(path) => path.to_path_buf(),
            None => {
                // Auto-generated outputs are provisional: registered for
                // cleanup now, spared only when the render succeeds.
                let file = tempfile::Builder::new()
                    .prefix("pdfsnap_pdf_")
                    .suffix(".pdf")
                    .tempfile_in(&temp_dir)
                    .map_err(|e| PdfError::io("creating output temp file", e))?;
                let (_, path) = file
                    .keep()
                    .map_err(|e| PdfError::io("persisting output temp file", e.error))?;
                self.ledger.register(&path, TempFileKind::Output);
                path
            }
        };
        self.output_path = Some(output_path.clone());

        let binary = match &self.binary_override {
            Some(path) => path.clone(),
            None => binary::resolve_binary()?,
        };

        let content_args: Vec<OsString> = self.contents.iter().map(ContentItem::as_arg).collect();
        let args = command::build(
            &binary,
            &self.options,
            self.toc_options.as_ref(),
            &content_args,
            &output_path,
            &temp_dir,
            &mut self.ledger,
        )?;
        tracing::debug!(
            binary = %binary.display(),
            args = ?&args[1..],
            "spawning renderer"
        );

        let mut cmd = Command::new(&args[0]);
        cmd.args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(env) = &self.env {
            cmd.envs(env);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| PdfError::io(format!("spawning renderer '{}'", binary.display()), e))?;

        // Drain both pipes on threads so a chatty renderer can never fill a
        // pipe buffer and stall.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| PdfError::io("opening renderer stdout", std::io::Error::other("no pipe")))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| PdfError::io("opening renderer stderr", std::io::Error::other("no pipe")))?;
        let stdout_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stdout.read_to_end(&mut bytes)?;
            Ok(bytes)
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        self.process = Some(RunningProcess {
            child,
            stdout_drain,
            stderr_drain,
        });
        self.state = GenerationState::Running;
        self.outcome = None;
        self.captured_stdout = None;
        self.captured_stderr = None;
        Ok(())
    }

    /// Block until the renderer exits.
    ///
    /// On success the output file is unregistered from cleanup and its path
    /// returned; on failure the (possibly partial) output is scheduled for
    /// cleanup and [`WaitOutcome::Failed`] is returned. Idempotent once the
    /// exit has been observed.
    #[tracing::instrument(skip(self))]
    pub fn wait(&mut self) -> PdfResult<WaitOutcome> {
        match self.process.take() {
            Some(mut process) => {
                let status = process
                    .child
                    .wait()
                    .map_err(|e| PdfError::io("waiting for renderer", e))?;
                self.finish(process, status)
            }
            None => self
                .outcome
                .clone()
                .ok_or_else(|| anyhow::anyhow!("wait() called before a generation was started").into()),
        }
    }

    /// Non-blocking liveness poll. Observing an exit here performs the same
    /// state transition as [`wait`](Self::wait) would.
    pub fn is_running(&mut self) -> bool {
        let Some(mut process) = self.process.take() else {
            return false;
        };
        match process.child.try_wait() {
            Ok(None) => {
                self.process = Some(process);
                true
            }
            Ok(Some(status)) => {
                // Record the outcome so a later wait() can return it.
                let _ = self.finish(process, status);
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to poll renderer; treating as still running");
                self.process = Some(process);
                true
            }
        }
    }

    fn finish(
        &mut self,
        process: RunningProcess,
        status: std::process::ExitStatus,
    ) -> PdfResult<WaitOutcome> {
        self.captured_stdout = Some(join_drain(process.stdout_drain));
        self.captured_stderr = Some(join_drain(process.stderr_drain));

        let output_path = self.output_path.clone().ok_or_else(|| {
            anyhow::anyhow!("generation finished without an output path on record")
        })?;

        let outcome = if status.success() {
            self.state = GenerationState::Succeeded;
            self.ledger.unregister(&output_path);
            WaitOutcome::Succeeded(output_path)
        } else {
            tracing::debug!(
                status = %status,
                stderr_len = self.captured_stderr.as_ref().map_or(0, String::len),
                "renderer exited unsuccessfully"
            );
            self.state = GenerationState::Failed;
            // The renderer may have left a partial file behind.
            if !self.ledger.is_registered(&output_path) {
                self.ledger.register(&output_path, TempFileKind::Output);
            }
            WaitOutcome::Failed
        };
        self.outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Delete all registered temp files now instead of at drop time.
    pub fn cleanup(&mut self) {
        self.ledger.release();
    }
}

fn join_drain(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> String {
    match handle.join() {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "renderer pipe drain failed");
            String::new()
        }
        Err(_) => {
            tracing::debug!("renderer pipe drain thread panicked");
            String::new()
        }
    }
}

static TOC_XSL: Mutex<Option<String>> = Mutex::new(None);

/// The renderer's built-in toc XSL style sheet, captured once per process by
/// running the binary with `dump-default-toc-xsl`.
pub fn default_toc_xsl() -> PdfResult<String> {
    {
        let cached = TOC_XSL
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(xsl) = cached.as_ref() {
            return Ok(xsl.clone());
        }
    }

    let mut session = PdfSession::new();
    session.set_option("dump-default-toc-xsl", true)?;
    session.add_html(
        "<html><head></head><body><h1>Head</h1><h2>Head 2</h2><h3>Head 3</h3>\
         <h4>Head 4</h4><h5>Head 5</h5><h6>Head 6</h6></body></html>",
    )?;
    session.generate(None)?;
    let xsl = session.process_output().unwrap_or_default().to_string();

    *TOC_XSL
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(xsl.clone());
    Ok(xsl)
}

/// Forget the captured toc XSL so the next call re-runs the binary.
/// Intended for tests.
pub fn reset_toc_xsl_cache() {
    *TOC_XSL
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
}
