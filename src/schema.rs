//! Static catalog of the renderer's recognized command-line options.
//!
//! Two independent schemas exist: the main (whole-document) options and the
//! table-of-contents options. A name valid in one scope is not automatically
//! valid in the other. Validation is a pure lookup; option values are never
//! inspected here.

use std::fmt;

use crate::error::{PdfError, PdfResult};

/// Which schema an option is validated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionScope {
    /// Options applying to the whole-document render.
    Main,
    /// Options scoped to the `toc` sub-command.
    Toc,
}

impl fmt::Display for OptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionScope::Main => f.write_str("main"),
            OptionScope::Toc => f.write_str("toc"),
        }
    }
}

/// Shape of a single recognized option.
#[derive(Clone, Copy, Debug)]
pub struct OptionSpec {
    /// Number of value tokens the option takes on the command line.
    pub args: u8,
    /// Renderer-side default, where the upstream documentation states one.
    /// Documentary: the renderer applies these itself, so they are carried
    /// for introspection and never injected into the argument vector. (The
    /// 10mm margins a fresh session seeds are this crate's own baseline,
    /// independent of this field.)
    pub default: Option<&'static str>,
    /// Whether the option may meaningfully be passed more than once.
    pub repeatable: bool,
}

const fn flag() -> OptionSpec {
    OptionSpec {
        args: 0,
        default: None,
        repeatable: false,
    }
}

const fn arg() -> OptionSpec {
    OptionSpec {
        args: 1,
        default: None,
        repeatable: false,
    }
}

const fn arg_default(default: &'static str) -> OptionSpec {
    OptionSpec {
        args: 1,
        default: Some(default),
        repeatable: false,
    }
}

const fn arg_repeatable() -> OptionSpec {
    OptionSpec {
        args: 1,
        default: None,
        repeatable: true,
    }
}

const fn pair() -> OptionSpec {
    OptionSpec {
        args: 2,
        default: None,
        repeatable: false,
    }
}

const fn pair_repeatable() -> OptionSpec {
    OptionSpec {
        args: 2,
        default: None,
        repeatable: true,
    }
}

/// Whole-document options, as accepted by `wkhtmltopdf`.
pub const MAIN_OPTIONS: &[(&str, OptionSpec)] = &[
    // Global options
    ("collate", flag()),
    ("no-collate", flag()),
    ("cookie-jar", arg()),
    ("copies", arg_default("1")),
    ("dpi", arg_default("96")),
    ("extended-help", flag()),
    ("grayscale", flag()),
    ("help", flag()),
    ("htmldoc", flag()),
    ("image-dpi", arg_default("600")),
    ("image-quality", arg_default("94")),
    ("license", flag()),
    ("lowquality", flag()),
    ("manpage", flag()),
    ("margin-bottom", arg()),
    ("margin-left", arg_default("10mm")),
    ("margin-right", arg_default("10mm")),
    ("margin-top", arg()),
    ("orientation", arg_default("Portrait")),
    ("page-height", arg()),
    ("page-size", arg_default("A4")),
    ("page-width", arg()),
    ("no-pdf-compression", flag()),
    ("quiet", flag()),
    ("read-args-from-stdin", flag()),
    ("readme", flag()),
    ("title", arg()),
    ("use-xserver", flag()),
    ("version", flag()),
    // Outline options
    ("dump-default-toc-xsl", flag()),
    ("dump-outline", arg()),
    ("outline", flag()),
    ("no-outline", flag()),
    ("outline-depth", arg_default("4")),
    // Page options
    ("allow", arg_repeatable()),
    ("background", flag()),
    ("no-background", flag()),
    ("bypass-proxy-for", arg_repeatable()),
    ("cache-dir", arg()),
    ("checkbox-checked-svg", arg()),
    ("checkbox-svg", arg()),
    ("cookie", pair()),
    ("custom-header", pair_repeatable()),
    ("custom-header-propagation", flag()),
    ("no-custom-header-propagation", flag()),
    ("debug-javascript", flag()),
    ("no-debug-javascript", flag()),
    ("default-header", flag()),
    ("encoding", arg()),
    ("disable-external-links", flag()),
    ("enable-external-links", flag()),
    ("disable-forms", flag()),
    ("enable-forms", flag()),
    ("images", flag()),
    ("no-images", flag()),
    ("disable-internal-links", flag()),
    ("enable-internal-links", flag()),
    ("disable-javascript", flag()),
    ("enable-javascript", flag()),
    ("javascript-delay", arg_default("200")),
    ("keep-relative-links", flag()),
    ("load-error-handling", arg_default("abort")),
    ("load-media-error-handling", arg_default("ignore")),
    ("disable-local-file-access", flag()),
    ("enable-local-file-access", flag()),
    ("minimum-font-size", arg()),
    ("exclude-from-outline", flag()),
    ("include-in-outline", flag()),
    ("page-offset", arg_default("0")),
    ("password", arg()),
    ("disable-plugins", flag()),
    ("enable-plugins", flag()),
    ("post", pair_repeatable()),
    ("post-file", pair_repeatable()),
    ("print-media-type", flag()),
    ("no-print-media-type", flag()),
    ("proxy", arg()),
    ("radiobutton-checked-svg", arg()),
    ("radiobutton-svg", arg()),
    ("resolve-relative-links", flag()),
    ("run-script", arg_repeatable()),
    ("disable-smart-shrinking", flag()),
    ("enable-smart-shrinking", flag()),
    ("stop-slow-scripts", flag()),
    ("no-stop-slow-scripts", flag()),
    ("disable-toc-back-links", flag()),
    ("enable-toc-back-links", flag()),
    ("user-style-sheet", arg()),
    ("username", arg()),
    ("viewport-size", arg()),
    ("window-status", arg()),
    ("zoom", arg_default("1")),
    // Header and footer options
    ("footer-center", arg()),
    ("footer-font-name", arg_default("Arial")),
    ("footer-font-size", arg_default("12")),
    ("footer-html", arg()),
    ("footer-left", arg()),
    ("footer-line", flag()),
    ("no-footer-line", flag()),
    ("footer-right", arg()),
    ("footer-spacing", arg_default("0")),
    ("header-center", arg()),
    ("header-font-name", arg_default("Arial")),
    ("header-font-size", arg_default("12")),
    ("header-html", arg()),
    ("header-left", arg()),
    ("header-line", flag()),
    ("no-header-line", flag()),
    ("header-right", arg()),
    ("header-spacing", arg_default("0")),
    ("replace", pair_repeatable()),
];

/// Options accepted by the `toc` sub-command.
pub const TOC_OPTIONS: &[(&str, OptionSpec)] = &[
    ("disable-dotted-lines", flag()),
    ("toc-header-text", arg_default("Table of Contents")),
    ("toc-level-indentation", arg_default("1em")),
    ("disable-toc-links", flag()),
    ("toc-text-size-shrink", arg_default("0.8")),
    ("xsl-style-sheet", arg()),
];

/// Look up the spec for `name` in the given scope.
pub fn lookup(name: &str, scope: OptionScope) -> Option<&'static OptionSpec> {
    let table = match scope {
        OptionScope::Main => MAIN_OPTIONS,
        OptionScope::Toc => TOC_OPTIONS,
    };
    table
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, spec)| spec)
}

/// Validate that `name` exists in the schema for `scope`.
///
/// Pure lookup; never inspects the value the caller intends to set.
pub fn validate(name: &str, scope: OptionScope) -> PdfResult<()> {
    if lookup(name, scope).is_some() {
        Ok(())
    } else {
        Err(PdfError::UnknownOption {
            name: name.to_string(),
            scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_main_option_validates_in_main_scope() {
        for (name, _) in MAIN_OPTIONS {
            validate(name, OptionScope::Main).unwrap();
        }
    }

    #[test]
    fn scopes_are_independent() {
        // Valid only under `toc`.
        assert!(validate("toc-header-text", OptionScope::Toc).is_ok());
        assert!(matches!(
            validate("toc-header-text", OptionScope::Main),
            Err(PdfError::UnknownOption { .. })
        ));
        // Valid only in the main scope.
        assert!(validate("margin-top", OptionScope::Main).is_ok());
        assert!(matches!(
            validate("margin-top", OptionScope::Toc),
            Err(PdfError::UnknownOption { .. })
        ));
    }

    #[test]
    fn unknown_name_is_rejected_in_both_scopes() {
        for scope in [OptionScope::Main, OptionScope::Toc] {
            let err = validate("definitely-not-an-option", scope).unwrap_err();
            match err {
                PdfError::UnknownOption { name, scope: s } => {
                    assert_eq!(name, "definitely-not-an-option");
                    assert_eq!(s, scope);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn specs_carry_arity_and_defaults() {
        let copies = lookup("copies", OptionScope::Main).unwrap();
        assert_eq!(copies.args, 1);
        assert_eq!(copies.default, Some("1"));

        let cookie = lookup("cookie", OptionScope::Main).unwrap();
        assert_eq!(cookie.args, 2);

        let grayscale = lookup("grayscale", OptionScope::Main).unwrap();
        assert_eq!(grayscale.args, 0);

        let allow = lookup("allow", OptionScope::Main).unwrap();
        assert!(allow.repeatable);
    }
}
