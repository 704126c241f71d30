//! pdfsnap turns HTML into PDF by orchestrating the external `wkhtmltopdf`
//! binary.
//!
//! The crate does no rendering itself. It validates options against the
//! renderer's schema, materializes inline HTML/XSL payloads into temp files,
//! assembles the argument vector (including the nested `toc` sub-command),
//! locates the platform binary, and supervises the child process with
//! guaranteed temp-file cleanup.
//!
//! ```no_run
//! use pdfsnap::PdfSession;
//!
//! # fn main() -> pdfsnap::PdfResult<()> {
//! let mut session = PdfSession::new();
//! session
//!     .set_option("margin-top", "15mm")?
//!     .set_option("grayscale", true)?;
//! session.add_html("<h1>Invoice</h1>")?;
//! let outcome = session.generate(None)?;
//! match outcome.output() {
//!     Some(path) => println!("wrote {}", path.display()),
//!     None => eprintln!("render failed: {:?}", session.error_output()),
//! }
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod command;
mod error;
mod ledger;
mod materialize;
mod options;
mod schema;
mod session;

/// Binary discovery and the process-wide binary-path cache.
pub mod binary;

pub use crate::binary::{reset_binary_cache, resolve_binary, set_binary, BinaryLocator};
pub use crate::error::{PdfError, PdfResult};
pub use crate::ledger::{TempFileKind, TempFileLedger};
pub use crate::materialize::{reset_temp_dir, set_temp_dir, temp_dir, HEADER_FOOTER_TEMPLATE};
pub use crate::options::{OptionSet, OptionValue};
pub use crate::schema::{lookup, validate, OptionScope, OptionSpec, MAIN_OPTIONS, TOC_OPTIONS};
pub use crate::session::{
    default_toc_xsl, reset_toc_xsl_cache, ContentItem, GenerationState, PdfSession, WaitOutcome,
};
