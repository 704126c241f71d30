//! Bridges inline payloads (HTML strings, XSL text, raw header/footer
//! markup) to the file paths the renderer binary actually accepts.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{PdfError, PdfResult};
use crate::ledger::{TempFileKind, TempFileLedger};
use crate::options::OptionSet;

static TEMP_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Direct all subsequently materialized files into `dir` instead of the OS
/// temp location. Process-wide, like the binary-path override.
pub fn set_temp_dir(dir: impl Into<PathBuf>) {
    *TEMP_DIR
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(dir.into());
}

/// Revert [`set_temp_dir`] to the OS default. Intended for tests.
pub fn reset_temp_dir() {
    *TEMP_DIR
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
}

/// The directory temp files are created in.
pub fn temp_dir() -> PathBuf {
    TEMP_DIR
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
        .unwrap_or_else(std::env::temp_dir)
}

/// Skeleton the renderer receives when a `header-html`/`footer-html` value is
/// plain markup rather than a full document. Headers and footers are fiddly
/// to get right with wkhtmltopdf; pinning the html/body box to the margin
/// height avoids the usual clipping surprises.
pub const HEADER_FOOTER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf8"/>
    <title></title>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
    html { margin:0; padding:0 0 4px 0; width:100%; height:{{height}}; overflow: hidden; }
    body.pdf { margin:0; padding:0; width: 100%; height: 100%; }
    </style>
</head>
<body class="pdf">
{{content}}
</body>
</html>
"#;

/// Write `contents` to a fresh temp file in `temp_dir` and hand the path to
/// the ledger. The file outlives the `tempfile` handle; deletion is the
/// ledger's job.
fn write_temp(
    contents: &str,
    prefix: &str,
    suffix: &str,
    temp_dir: &Path,
    ledger: &mut TempFileLedger,
    kind: TempFileKind,
) -> PdfResult<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(temp_dir)
        .map_err(|e| PdfError::io(format!("creating temp file in '{}'", temp_dir.display()), e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| PdfError::io("writing temp file", e))?;
    let (_, path) = file
        .keep()
        .map_err(|e| PdfError::io("persisting temp file", e.error))?;
    ledger.register(&path, kind);
    Ok(path)
}

/// Materialize one inline HTML document as a `.html` temp file.
pub(crate) fn write_html_content(
    html: &str,
    temp_dir: &Path,
    ledger: &mut TempFileLedger,
) -> PdfResult<PathBuf> {
    write_temp(
        html,
        "pdfsnap_",
        ".html",
        temp_dir,
        ledger,
        TempFileKind::HtmlContent,
    )
}

/// Whether `value` already looks like a complete HTML document.
fn looks_like_full_document(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    lowered.contains("<body")
}

/// Wrap plain header/footer markup in [`HEADER_FOOTER_TEMPLATE`], injecting
/// the matching margin as the box height.
fn wrap_header_footer(value: &str, height: &str) -> String {
    HEADER_FOOTER_TEMPLATE
        .replace("{{content}}", value)
        .replace("{{height}}", height)
}

/// Convert a validated option value into the token the renderer receives.
///
/// Most options pass through untouched. `header-html`/`footer-html` values
/// that are not existing files are wrapped (unless already a full document)
/// and written to a `.html` temp file; `xsl-style-sheet` text gets a `.xsl`
/// temp file. Every file created here is registered for cleanup before the
/// path is returned, so a later failure cannot leak it.
pub(crate) fn process_option_value(
    name: &str,
    value: &str,
    main_options: &OptionSet,
    temp_dir: &Path,
    ledger: &mut TempFileLedger,
) -> PdfResult<String> {
    match name {
        "header-html" | "footer-html" => {
            if Path::new(value).exists() {
                return Ok(value.to_string());
            }
            let html = if looks_like_full_document(value) {
                value.to_string()
            } else {
                let margin_name = if name == "header-html" {
                    "margin-top"
                } else {
                    "margin-bottom"
                };
                let height = match main_options.get(margin_name) {
                    Some(crate::options::OptionValue::Single(v)) => v.as_str(),
                    _ => "10mm",
                };
                wrap_header_footer(value, height)
            };
            let kind = if name == "header-html" {
                TempFileKind::Header
            } else {
                TempFileKind::Footer
            };
            let path = write_temp(&html, "pdfsnap_hf_", ".html", temp_dir, ledger, kind)?;
            Ok(path.to_string_lossy().into_owned())
        }
        "xsl-style-sheet" => {
            if Path::new(value).exists() {
                return Ok(value.to_string());
            }
            let path = write_temp(
                value,
                "pdfsnap_xsl_",
                ".xsl",
                temp_dir,
                ledger,
                TempFileKind::Xsl,
            )?;
            Ok(path.to_string_lossy().into_owned())
        }
        _ => Ok(value.to_string()),
    }
}
