use std::path::PathBuf;

use anyhow::{bail, Context as _};
use clap::Parser;
use pdfsnap::{OptionValue, PdfSession};

#[derive(Parser, Debug)]
#[command(name = "pdfsnap", version, about = "Render HTML files or URLs to PDF via wkhtmltopdf")]
struct Cli {
    /// Input documents: local HTML files or URLs, rendered in this order.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output PDF path.
    #[arg(long, short = 'o')]
    out: PathBuf,

    /// Set a renderer option: `--set grayscale` or `--set margin-top=15mm`.
    /// Repeatable.
    #[arg(long = "set", value_name = "NAME[=VALUE]")]
    set: Vec<String>,

    /// Set a table-of-contents option (implies a toc). Repeatable.
    #[arg(long = "toc-set", value_name = "NAME[=VALUE]")]
    toc_set: Vec<String>,

    /// Generate a table of contents even without any toc options.
    #[arg(long)]
    toc: bool,

    /// Renderer binary to use instead of auto-discovery.
    #[arg(long)]
    binary: Option<PathBuf>,

    /// Directory for intermediate temp files.
    #[arg(long)]
    temp_dir: Option<PathBuf>,
}

fn split_option(raw: &str) -> (&str, OptionValue) {
    match raw.split_once('=') {
        Some((name, value)) => (name, OptionValue::Single(value.to_string())),
        None => (raw, OptionValue::Enable),
    }
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(dir) = &cli.temp_dir {
        pdfsnap::set_temp_dir(dir);
    }

    let mut session = PdfSession::new();
    if let Some(binary) = &cli.binary {
        session.set_binary(binary);
    }
    if cli.toc {
        session.enable_toc(true);
    }
    for raw in &cli.set {
        let (name, value) = split_option(raw);
        session
            .set_option(name, value)
            .with_context(|| format!("invalid --set '{raw}'"))?;
    }
    for raw in &cli.toc_set {
        let (name, value) = split_option(raw);
        session
            .set_toc_option(name, value)
            .with_context(|| format!("invalid --toc-set '{raw}'"))?;
    }

    for input in &cli.inputs {
        if is_url(input) {
            session.add_url(input.clone());
        } else {
            let path = PathBuf::from(input);
            if !path.exists() {
                bail!("input file '{input}' does not exist");
            }
            session.add_file(path);
        }
    }

    let outcome = session.generate(Some(&cli.out))?;
    match outcome.output() {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => {
            let stderr = session.error_output().unwrap_or_default().trim().to_string();
            bail!("renderer exited unsuccessfully:\n{stderr}");
        }
    }
}
