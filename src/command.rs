//! Assembles the renderer's argument vector from a validated option set.

use std::ffi::OsString;
use std::path::Path;

use crate::error::PdfResult;
use crate::ledger::TempFileLedger;
use crate::materialize;
use crate::options::{Occurrence, OptionSet};

/// Append one option set to `args` as `--name [value]` tokens.
///
/// Disabled flags are skipped. Enabled flags emit the bare `--name`. Values
/// run through materialization first, so inline header/footer/XSL payloads
/// become file paths here; a value that processes to the empty string emits
/// the flag alone.
fn push_options(
    args: &mut Vec<OsString>,
    options: &OptionSet,
    main_options: &OptionSet,
    temp_dir: &Path,
    ledger: &mut TempFileLedger,
) -> PdfResult<()> {
    for (name, value) in options.iter() {
        for occurrence in value.occurrences() {
            args.push(format!("--{name}").into());
            if let Occurrence::Valued(raw) = occurrence {
                let processed =
                    materialize::process_option_value(name, raw, main_options, temp_dir, ledger)?;
                if !processed.is_empty() {
                    args.push(processed.into());
                }
            }
        }
    }
    Ok(())
}

/// Build the full argument vector:
/// `<binary> [--option [value]]... [toc [--tocOption [value]]...] <content>... <output>`.
pub(crate) fn build(
    binary: &Path,
    main: &OptionSet,
    toc: Option<&OptionSet>,
    contents: &[OsString],
    output: &Path,
    temp_dir: &Path,
    ledger: &mut TempFileLedger,
) -> PdfResult<Vec<OsString>> {
    let mut args: Vec<OsString> = vec![binary.as_os_str().to_os_string()];

    push_options(&mut args, main, main, temp_dir, ledger)?;

    if let Some(toc_options) = toc {
        args.push("toc".into());
        push_options(&mut args, toc_options, main, temp_dir, ledger)?;
    }

    args.extend(contents.iter().cloned());
    args.push(output.as_os_str().to_os_string());

    Ok(args)
}
