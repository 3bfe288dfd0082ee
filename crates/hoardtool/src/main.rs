use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use hoardtool_core::config::{DEFAULT_CONFIG_FILENAME, ToolConfig, load_config};
use hoardtool_core::export::write_export;
use hoardtool_core::extract::{SourceFormat, supported_formats};
use hoardtool_core::logging::init_logging;
use hoardtool_core::pipeline::{ImportOutcome, ImportRequest, is_affirmative, run_import};
use hoardtool_core::preview::render_preview_with_limit;
use hoardtool_core::probe::{HttpProbe, ReachabilityProbe, SkipProbe, SystemClock};

#[derive(Debug, Parser)]
#[command(
    name = "hoardtool",
    version,
    about = "Convert CSV, JSON, HTML, text and Markdown link lists into a bookmark import file"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count, help = "Raise log verbosity (repeatable)")]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Convert one file without prompting for its inputs")]
    Convert(ConvertArgs),
    #[command(about = "List the supported input formats")]
    Formats,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    path: PathBuf,
    #[arg(short, long, default_value = "", help = "Target list name")]
    list: String,
    #[arg(long, value_name = "FORMAT", help = "Override extension-based detection")]
    format: Option<String>,
    #[arg(short, long, value_name = "PATH", help = "Write the export to PATH")]
    output: Option<PathBuf>,
    #[arg(short, long, help = "Export without asking for confirmation")]
    yes: bool,
    #[arg(long, help = "Skip the network reachability check")]
    no_probe: bool,
    #[arg(long, value_name = "MS", help = "Reachability timeout in milliseconds")]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    config: ToolConfig,
    probe_enabled: bool,
    timeout: Duration,
}

impl RuntimeOptions {
    fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
        let config = load_config(&config_path)?;
        Ok(Self {
            probe_enabled: config.probe_enabled(),
            timeout: config.probe_timeout(),
            config,
        })
    }

    fn with_convert_overrides(mut self, args: &ConvertArgs) -> Self {
        if args.no_probe {
            self.probe_enabled = false;
        }
        if let Some(timeout_ms) = args.timeout_ms {
            self.timeout = Duration::from_millis(timeout_ms);
        }
        self
    }

    fn probe(&self) -> Result<Box<dyn ReachabilityProbe>> {
        if !self.probe_enabled {
            tracing::info!("reachability probe disabled");
            return Ok(Box::new(SkipProbe));
        }
        Ok(Box::new(HttpProbe::new(
            self.timeout,
            self.config.user_agent(),
        )?))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = prepare_runtime(&cli, None)?;

    match cli.command {
        Some(Commands::Convert(args)) => {
            let runtime = runtime.with_convert_overrides(&args);
            let stdin = io::stdin();
            run_convert(&runtime, &args, &mut stdin.lock(), &mut io::stdout())
        }
        Some(Commands::Formats) => run_formats(),
        None => {
            let stdin = io::stdin();
            run_interactive(&runtime, &mut stdin.lock(), &mut io::stdout())
        }
    }
}

/// Environment file first, so `HOARDTOOL_LOG` from `.env` reaches the
/// subscriber, then logging, then config.
fn prepare_runtime(cli: &Cli, env_file: Option<&Path>) -> Result<RuntimeOptions> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    init_logging(cli.verbose);
    RuntimeOptions::load(cli)
}

fn run_formats() -> Result<()> {
    println!("supported formats");
    for (extension, format) in supported_formats() {
        println!("  .{extension}: {}", format.as_str());
    }
    Ok(())
}

fn run_convert(
    runtime: &RuntimeOptions,
    args: &ConvertArgs,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    let format = args
        .format
        .as_deref()
        .map(SourceFormat::parse)
        .transpose()?;
    let request = ImportRequest {
        source: args.path.clone(),
        list_name: args.list.trim().to_string(),
        format,
    };
    let outcome = import_and_preview(runtime, &request, output)?;

    let Some(destination) = args.output.as_deref() else {
        return Ok(());
    };
    let confirmed = args.yes || {
        let answer = prompt(input, output, "\nExport the records? (yes/no): ")?;
        is_affirmative(&answer)
    };
    finish_export(&outcome, confirmed.then_some(destination), output)
}

fn run_interactive(
    runtime: &RuntimeOptions,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<()> {
    let source = prompt(input, output, "Path to the input file: ")?;
    if source.is_empty() {
        bail!("no input file given");
    }
    let list_name = prompt(input, output, "Name of the target list: ")?;
    let request = ImportRequest {
        source: PathBuf::from(source),
        list_name,
        format: None,
    };
    let outcome = import_and_preview(runtime, &request, output)?;

    let answer = prompt(input, output, "\nExport the records? (yes/no): ")?;
    if !is_affirmative(&answer) {
        return finish_export(&outcome, None, output);
    }
    let destination = prompt(input, output, "Output file (e.g. output.json): ")?;
    if destination.is_empty() {
        bail!("no output file given");
    }
    finish_export(&outcome, Some(Path::new(&destination)), output)
}

fn import_and_preview(
    runtime: &RuntimeOptions,
    request: &ImportRequest,
    output: &mut impl Write,
) -> Result<ImportOutcome> {
    let probe = runtime.probe()?;
    let outcome = run_import(request, probe.as_ref(), &SystemClock)
        .with_context(|| format!("failed to import {}", request.source.display()))?;

    writeln!(output)?;
    write!(
        output,
        "{}",
        render_preview_with_limit(&outcome.records, runtime.config.preview_limit())
    )?;
    writeln!(
        output,
        "format: {} | extracted: {} | kept: {} | skipped: {}",
        outcome.format.as_str(),
        outcome.extracted,
        outcome.records.len(),
        outcome.skipped.len()
    )?;
    for skipped in &outcome.skipped {
        tracing::info!(
            row = skipped.index,
            url = %skipped.url,
            reason = skipped.reason.as_str(),
            "record skipped"
        );
    }
    Ok(outcome)
}

fn finish_export(
    outcome: &ImportOutcome,
    destination: Option<&Path>,
    output: &mut impl Write,
) -> Result<()> {
    let Some(destination) = destination else {
        writeln!(output, "Export cancelled.")?;
        return Ok(());
    };
    write_export(destination, &outcome.records)?;
    writeln!(
        output,
        "\nSaved {} records to {}",
        outcome.records.len(),
        normalize_path(destination)
    )?;
    Ok(())
}

fn prompt(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
