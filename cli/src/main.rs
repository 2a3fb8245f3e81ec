mod manifest;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use optbind_complete::{CommandCatalog, InvocationNames, OutputFormat, suggest};
use optbind_core::validate_options;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::manifest::{Bindings, Bound, Manifest, build_catalog};

/// Output format for parse results.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

/// Output format for help.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliHelpFormat {
    Default,
    Json,
}

impl From<CliHelpFormat> for OutputFormat {
    fn from(fmt: CliHelpFormat) -> Self {
        match fmt {
            CliHelpFormat::Default => Self::Default,
            CliHelpFormat::Json => Self::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "optbind")]
#[command(about = "Parse, complete and document command lines described by a manifest")]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// YAML manifest describing the tool's commands and options.
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print completion suggestions for the words after `--`.
    Complete(CompleteArgs),
    /// Parse a command line after `--` and print the bound values.
    Parse(ParseArgs),
    /// Print the command overview or the help of one command.
    Help(HelpArgs),
    /// Check the manifest's option tables.
    Validate,
}

#[derive(Debug, Args)]
struct CompleteArgs {
    /// Print the completion map as JSON instead of suggestions.
    #[arg(long)]
    map: bool,
    /// Words typed so far.
    #[arg(last = true)]
    words: Vec<String>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Command name followed by its arguments.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct HelpArgs {
    /// Command to describe; the overview is printed when omitted.
    command: Option<String>,
    /// Help output format.
    #[arg(long, default_value = "default")]
    format: CliHelpFormat,
}

#[derive(Debug, Serialize)]
struct ParseOutput {
    command: String,
    options: std::collections::BTreeMap<String, Bound>,
    extras: Vec<String>,
}

fn main() {
    setup_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Complete(args) => run_complete(cli.manifest, args),
        Command::Parse(args) => run_parse(cli.manifest, args),
        Command::Help(args) => run_help(cli.manifest, args),
        Command::Validate => run_validate(cli.manifest),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_manifest(path: Option<PathBuf>) -> Result<Manifest, String> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading manifest");
            Manifest::load(&path).map_err(|e| e.to_string())
        }
        None => Ok(Manifest::default()),
    }
}

fn load_catalog(
    path: Option<PathBuf>,
) -> Result<(Manifest, Bindings, CommandCatalog<'static>), String> {
    let manifest = load_manifest(path)?;
    let bindings = Bindings::default();
    let catalog = build_catalog(&manifest, &bindings).map_err(|e| e.to_string())?;
    Ok((manifest, bindings, catalog))
}

fn run_complete(manifest: Option<PathBuf>, args: CompleteArgs) -> Result<(), String> {
    let (manifest, _, catalog) = load_catalog(manifest)?;
    let map = catalog.completion_map();

    if args.map {
        let raw = serde_json::to_string_pretty(&map)
            .map_err(|err| format!("Failed to serialize completion map: {err}"))?;
        println!("{raw}");
        return Ok(());
    }

    let names = InvocationNames::new(&manifest.executable);
    for suggestion in suggest(&args.words, &map, &names) {
        println!("{suggestion}");
    }
    Ok(())
}

fn run_parse(manifest: Option<PathBuf>, args: ParseArgs) -> Result<(), String> {
    let (manifest, bindings, mut catalog) = load_catalog(manifest)?;
    let command = catalog.resolve_mut(&args.args).map_err(|e| e.to_string())?;
    let rest = args.args.get(1..).unwrap_or_default();
    let extras = command.parse(rest).map_err(|e| e.to_string())?;

    if command.print_help() {
        let mut stdout = io::stdout().lock();
        return write_command_help(command, &manifest.executable, command.help_output_format(), &mut stdout);
    }

    let output = ParseOutput {
        command: command.name().to_string(),
        options: bindings.borrow().clone(),
        extras,
    };
    let raw = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&output).map_err(|e| e.to_string())?,
    };
    println!("{}", raw.trim_end());
    Ok(())
}

fn run_help(manifest: Option<PathBuf>, args: HelpArgs) -> Result<(), String> {
    let (manifest, _, catalog) = load_catalog(manifest)?;
    let format = OutputFormat::from(args.format);
    let mut stdout = io::stdout().lock();

    let Some(name) = args.command else {
        return match format {
            OutputFormat::Json => {
                let list: Vec<_> = catalog.list().collect();
                write_json(&list, &mut stdout)
            }
            OutputFormat::Default => catalog
                .write_overview(&manifest.executable, &mut stdout)
                .map_err(|e| e.to_string()),
        };
    };

    let command = catalog
        .find(&name)
        .ok_or_else(|| optbind_complete::CatalogError::UnknownCommand(name.clone()).to_string())?;
    write_command_help(command, &manifest.executable, format, &mut stdout)
}

fn run_validate(manifest: Option<PathBuf>) -> Result<(), String> {
    let (_, _, catalog) = load_catalog(manifest)?;

    let mut problems = 0;
    for command in catalog.iter() {
        for err in validate_options(command.options()) {
            eprintln!("  {}: {err}", command.name());
            problems += 1;
        }
    }
    if problems > 0 {
        return Err(format!("{problems} problem(s) found"));
    }

    println!("Validated {} command(s).", catalog.iter().count());
    Ok(())
}

fn write_command_help<W: Write>(
    command: &optbind_complete::Command<'_>,
    executable: &str,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), String> {
    match format {
        OutputFormat::Json => write_json(&command.describe(), out),
        OutputFormat::Default => command.write_help(executable, out).map_err(|e| e.to_string()),
    }
}

fn write_json<T: Serialize, W: Write>(value: &T, out: &mut W) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to serialize help: {err}"))?;
    writeln!(out, "{raw}").map_err(|e| e.to_string())
}
