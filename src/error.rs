use std::path::PathBuf;

use crate::schema::OptionScope;

/// Convenience alias used across the crate.
pub type PdfResult<T> = Result<T, PdfError>;

/// Errors raised by option validation, binary discovery, and process
/// supervision.
///
/// A failed render is deliberately *not* represented here: the child process
/// exiting unsuccessfully is reported as [`crate::WaitOutcome::Failed`] so
/// callers can inspect the captured stderr and decide whether to retry.
#[derive(thiserror::Error, Debug)]
pub enum PdfError {
    /// The option name is not present in the schema for the given scope.
    #[error("unknown {scope} option: {name}")]
    UnknownOption {
        /// The rejected option name.
        name: String,
        /// The scope the name was validated against.
        scope: OptionScope,
    },

    /// A generation was requested while one is already running on this
    /// session.
    #[error("a PDF generation is already in progress on this session")]
    ConcurrentGeneration,

    /// No renderer binary could be located at the expected path.
    #[error("could not find wkhtmltopdf binary: {}", .0.display())]
    BinaryNotFound(PathBuf),

    /// A located binary or wrapper script exists but is not executable.
    #[error("renderer binary is not executable at: {}", .0.display())]
    BinaryNotExecutable(PathBuf),

    /// A tool the resolved binary depends on is missing from the system.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// Filesystem or process I/O failed while preparing or supervising a
    /// generation.
    #[error("{context}: {source}")]
    Io {
        /// What the crate was doing when the I/O failed.
        context: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Anything else, with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PdfError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_option_names_scope_and_option() {
        let err = PdfError::UnknownOption {
            name: "no-such-flag".to_string(),
            scope: OptionScope::Toc,
        };
        let msg = err.to_string();
        assert!(msg.contains("toc"), "missing scope in: {msg}");
        assert!(msg.contains("no-such-flag"), "missing name in: {msg}");
    }

    #[test]
    fn io_preserves_source() {
        let err = PdfError::io("writing header", std::io::Error::other("disk gone"));
        assert!(err.to_string().contains("writing header"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
