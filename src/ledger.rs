//! Session-scoped registry of temporary files with guaranteed best-effort
//! cleanup.

use std::path::{Path, PathBuf};

/// What a registered temp file was created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TempFileKind {
    /// Materialized `header-html` value.
    Header,
    /// Materialized `footer-html` value.
    Footer,
    /// Materialized `xsl-style-sheet` value.
    Xsl,
    /// Inline HTML content written out for the renderer.
    HtmlContent,
    /// The (auto-generated or failed) output file.
    Output,
}

/// Tracks every temporary file created during a generation session and
/// deletes them when the ledger is released or dropped.
///
/// Deletion is advisory: a file that cannot be removed is logged at debug
/// level and otherwise ignored. The final output file is spared by
/// [`TempFileLedger::unregister`]ing it on success.
#[derive(Debug, Default)]
pub struct TempFileLedger {
    files: Vec<(PathBuf, TempFileKind)>,
}

impl TempFileLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` for deletion at release time.
    pub fn register(&mut self, path: impl Into<PathBuf>, kind: TempFileKind) {
        self.files.push((path.into(), kind));
    }

    /// Remove `path` from the ledger so it survives cleanup.
    pub fn unregister(&mut self, path: &Path) {
        self.files.retain(|(registered, _)| registered != path);
    }

    /// Whether `path` is currently scheduled for cleanup.
    pub fn is_registered(&self, path: &Path) -> bool {
        self.files.iter().any(|(registered, _)| registered == path)
    }

    /// Number of files currently registered.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Delete every registered file now. Failures are swallowed.
    pub fn release(&mut self) {
        for (path, kind) in self.files.drain(..) {
            if let Err(err) = std::fs::remove_file(&path) {
                tracing::debug!(
                    path = %path.display(),
                    ?kind,
                    error = %err,
                    "failed to remove temp file; ignoring"
                );
            }
        }
    }
}

impl Drop for TempFileLedger {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_deletes_registered_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.html");
        let b = dir.path().join("b.xsl");
        std::fs::write(&a, "x").unwrap();
        std::fs::write(&b, "y").unwrap();

        let mut ledger = TempFileLedger::new();
        ledger.register(&a, TempFileKind::HtmlContent);
        ledger.register(&b, TempFileKind::Xsl);
        ledger.release();

        assert!(!a.exists());
        assert!(!b.exists());
        assert!(ledger.is_empty());
    }

    #[test]
    fn unregistered_files_survive_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let spared = dir.path().join("out.pdf");
        let doomed = dir.path().join("tmp.html");
        std::fs::write(&spared, "pdf").unwrap();
        std::fs::write(&doomed, "html").unwrap();

        {
            let mut ledger = TempFileLedger::new();
            ledger.register(&spared, TempFileKind::Output);
            ledger.register(&doomed, TempFileKind::HtmlContent);
            ledger.unregister(&spared);
        }

        assert!(spared.exists());
        assert!(!doomed.exists());
    }

    #[test]
    fn release_tolerates_missing_files() {
        let mut ledger = TempFileLedger::new();
        ledger.register("/nonexistent/never-created.html", TempFileKind::Header);
        ledger.release();
        assert!(ledger.is_empty());
    }
}
