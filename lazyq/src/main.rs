//! # lazyq
//!
//! A CLI for browsing and running the lazyqlib sample queries.
//!
//! ## Overview
//!
//! lazyq is built on top of lazyqlib. It lists the sample catalog and drains
//! selected samples against the built-in Northwind-style dataset or a JSON
//! dataset of the same shape.
//!
//! ## Usage
//!
//! ```bash
//! # List samples by category
//! lazyq list
//! lazyq list --category "Grouping Operators"
//!
//! # Run samples
//! lazyq run linq1 linq13
//! lazyq run --all --limit 3
//!
//! # Output as JSON
//! lazyq run linq9 --output json
//!
//! # Use another dataset
//! lazyq run linq3 --data ./northwind.json
//!
//! # Show engine events (stage buffering, sample drains)
//! lazyq -v run linq11
//! ```

mod render;

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lazyqlib::{samples, DataSource, OutputFormat, RunOptions, Sample};
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Build the clap Command structure
fn build_command() -> Command {
    let output = Arg::new("output")
        .short('o')
        .long("output")
        .value_parser(["table", "json"])
        .default_value("table")
        .help("Output format");

    Command::new("lazyq")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Arthur Debert")
        .about("Lazy, composable queries over in-memory collections")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Log engine events to stderr (-v debug, -vv trace)"),
        )
        .subcommand(
            Command::new("list")
                .about("List the sample queries by category")
                .arg(
                    Arg::new("category")
                        .short('c')
                        .long("category")
                        .help("Only list samples in this category"),
                )
                .arg(output.clone()),
        )
        .subcommand(
            Command::new("run")
                .about("Run sample queries and print their rows")
                .arg(
                    Arg::new("ids")
                        .action(ArgAction::Append)
                        .help("Sample ids to run (e.g. linq1 linq13)"),
                )
                .arg(
                    Arg::new("all")
                        .short('a')
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("ids")
                        .help("Run every sample in the catalog"),
                )
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Stop each sample after this many rows"),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help("JSON dataset to query instead of the built-in one"),
                )
                .arg(output),
        )
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbosity: u8) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install log subscriber")
}

/// Extract the output format from matches
fn output_format(matches: &ArgMatches) -> anyhow::Result<OutputFormat> {
    let raw = matches
        .get_one::<String>("output")
        .map(|s| s.as_str())
        .unwrap_or("table");
    raw.parse::<OutputFormat>().map_err(anyhow::Error::msg)
}

/// Build run options from matches
fn run_options(matches: &ArgMatches) -> anyhow::Result<RunOptions> {
    let mut options = RunOptions::new().format(output_format(matches)?);
    if let Some(limit) = matches.get_one::<usize>("limit") {
        options = options.limit(*limit);
    }
    Ok(options)
}

/// Resolve the samples named on the command line
fn select_samples(matches: &ArgMatches) -> anyhow::Result<Vec<&'static Sample>> {
    if matches.get_flag("all") {
        return Ok(samples::catalog().iter().collect());
    }
    let ids: Vec<&String> = matches
        .get_many::<String>("ids")
        .map(|v| v.collect())
        .unwrap_or_default();
    if ids.is_empty() {
        bail!("no samples selected; pass sample ids or --all");
    }
    ids.into_iter()
        .map(|id| samples::find(id).map_err(anyhow::Error::from))
        .collect()
}

/// Handler for list command
fn list_handler(matches: &ArgMatches) -> anyhow::Result<String> {
    let format = output_format(matches)?;
    let mut groups = samples::by_category()?;

    if let Some(category) = matches.get_one::<String>("category") {
        groups.retain(|group| group.key().eq_ignore_ascii_case(category));
        if groups.is_empty() {
            bail!("no samples in category '{category}'");
        }
    }

    Ok(render::render_listing(&groups, format)?)
}

/// Handler for run command
fn run_handler(matches: &ArgMatches) -> anyhow::Result<String> {
    let options = run_options(matches)?;
    let selected = select_samples(matches)?;

    let source = match matches.get_one::<String>("data") {
        Some(path) => DataSource::from_path(path)
            .with_context(|| format!("failed to load dataset from {path}"))?,
        None => DataSource::builtin()?,
    };
    debug!(
        customers = source.customers.len(),
        products = source.products.len(),
        suppliers = source.suppliers.len(),
        "dataset loaded"
    );

    let mut reports = Vec::with_capacity(selected.len());
    for sample in selected {
        let report = samples::run(sample, &source, &options)
            .with_context(|| format!("sample {} failed", sample.id))?;
        reports.push(report);
    }

    Ok(render::render_reports(&reports, options.format)?)
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();

    if let Err(e) = init_tracing(matches.get_count("verbose")) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    let result = match matches.subcommand() {
        Some(("list", sub)) => list_handler(sub),
        Some(("run", sub)) => run_handler(sub),
        _ => Err(anyhow::anyhow!("unknown command")),
    };

    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
