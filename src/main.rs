//! xmldiff command-line interface.
//!
//! Compares a control XML file with a test XML file and prints the typed
//! differences with their locations. Exits with 0 when no difference is kept,
//! 1 when differences are found and 2 on errors.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use xmldiff_rs::config::{parse_namespace_binding, SelectorKind, Settings, XmlDiffConfig};
use xmldiff_rs::{compute_diff, format_diff, parse_file, CheckFor, OutputFormat, OutputOptions};

/// xmldiff - Explainable XML comparison
///
/// Compares two XML documents node by node and reports every difference with
/// its kind, severity and XPath location.
#[derive(Parser)]
#[command(name = "xmldiff-rs")]
#[command(version)]
#[command(about = "Explainable XML comparison", long_about = None)]
#[command(author = "xmldiff Contributors")]
struct Cli {
    /// Control (expected) document
    #[arg(value_name = "CONTROL")]
    control: PathBuf,

    /// Test (actual) document
    #[arg(value_name = "TEST")]
    test: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "terminal")]
    format: OutputFormatArg,

    /// Report only real differences (similar) or also tolerable ones (identical)
    #[arg(long, value_enum)]
    check: Option<CheckArg>,

    /// How child elements are paired
    #[arg(short, long, value_enum)]
    selector: Option<SelectorArg>,

    /// Attribute used by the name-and-attributes selector (repeatable)
    #[arg(long = "match-attribute", value_name = "NAME")]
    match_attributes: Vec<String>,

    /// Ignore differences at or below a location pattern (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Trim text and drop whitespace-only text nodes
    #[arg(long)]
    ignore_whitespace: bool,

    /// Also collapse whitespace runs inside text
    #[arg(long)]
    normalize_whitespace: bool,

    /// Drop comments before comparing
    #[arg(long)]
    ignore_comments: bool,

    /// Compare XML version, encoding and standalone
    #[arg(long)]
    compare_xml_declaration: bool,

    /// Prefix used to render a namespace in locations, as PREFIX=URI (repeatable)
    #[arg(short, long = "namespace", value_name = "PREFIX=URI")]
    namespaces: Vec<String>,

    /// Stop at the first reported difference
    #[arg(long)]
    fail_fast: bool,

    /// Maximum length for displayed values
    #[arg(long, default_value = "80")]
    max_value_length: usize,

    /// Print the full comparison message for each difference
    #[arg(long)]
    describe: bool,

    /// Load settings from a TOML file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (only show differences, suppress summary)
    #[arg(short, long)]
    quiet: bool,
}

/// Output format argument for clap
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormatArg {
    /// Colored terminal output
    Terminal,
    /// JSON representation
    Json,
    /// Plain text (no colors)
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Terminal => OutputFormat::Terminal,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CheckArg {
    Similar,
    Identical,
}

impl From<CheckArg> for CheckFor {
    fn from(arg: CheckArg) -> Self {
        match arg {
            CheckArg::Similar => CheckFor::Similar,
            CheckArg::Identical => CheckFor::Identical,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SelectorArg {
    Name,
    NameAndText,
    NameAndTextRec,
    NameAndAttributes,
    NameAndAllAttributes,
}

impl From<SelectorArg> for SelectorKind {
    fn from(arg: SelectorArg) -> Self {
        match arg {
            SelectorArg::Name => SelectorKind::Name,
            SelectorArg::NameAndText => SelectorKind::NameAndText,
            SelectorArg::NameAndTextRec => SelectorKind::NameAndTextRec,
            SelectorArg::NameAndAttributes => SelectorKind::NameAndAttributes,
            SelectorArg::NameAndAllAttributes => SelectorKind::NameAndAllAttributes,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            process::exit(2);
        }
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        "xmldiff_rs=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let settings = resolve_settings(&cli)?;
    debug!(?settings, "resolved settings");

    let control = parse_file(&cli.control, &settings.parse)
        .with_context(|| format!("Failed to parse control file: {}", cli.control.display()))?;
    let test = parse_file(&cli.test, &settings.parse)
        .with_context(|| format!("Failed to parse test file: {}", cli.test.display()))?;

    let diff = compute_diff(&control, &test, &settings.diff_config());

    let output_options = OutputOptions {
        max_value_length: cli.max_value_length,
        show_descriptions: cli.describe,
    };
    let output_format: OutputFormat = cli.format.into();
    let output = format_diff(&diff, &output_format, &output_options)
        .context("Failed to format diff output")?;

    if !cli.quiet || output_format == OutputFormat::Json {
        println!("{}", output);
    } else {
        for line in output.lines() {
            if !line.starts_with("Summary:") && !line.trim().is_empty() {
                println!("{}", line);
            }
        }
    }

    if diff.has_differences() {
        Ok(1)
    } else {
        Ok(0)
    }
}

/// Merges the config file (if any) with command-line flags; flags win.
fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => XmlDiffConfig::load(path)?.into_settings()?,
        None => Settings::default(),
    };

    if let Some(check) = cli.check {
        settings.check = check.into();
    }
    if let Some(selector) = cli.selector {
        settings.selector = selector.into();
    }
    if !cli.match_attributes.is_empty() {
        settings.match_attributes = cli.match_attributes.clone();
    }
    settings.ignore.extend(cli.ignore.iter().cloned());
    settings.parse.ignore_whitespace |= cli.ignore_whitespace;
    settings.parse.normalize_whitespace |= cli.normalize_whitespace;
    settings.parse.ignore_comments |= cli.ignore_comments;
    settings.compare_xml_declaration |= cli.compare_xml_declaration;
    settings.fail_fast |= cli.fail_fast;

    for binding in &cli.namespaces {
        let (prefix, uri) = parse_namespace_binding(binding)?;
        settings.namespaces.insert(prefix, uri);
    }
    Ok(settings)
}
