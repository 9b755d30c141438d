use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use symbolscope::parser::LineIndex;
use symbolscope::{
    extract_symbol_context, CancellationToken, Config, LogWriter, PipelineError, PipelineOptions,
    Project, ReportFormat, Reporter, SymbolContextPayload,
};

/// symbolscope - Extract the semantic context of a Kotlin declaration
#[derive(Parser, Debug)]
#[command(name = "symbolscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Kotlin file holding the declaration
    file: PathBuf,

    /// Caret position, in characters from the start of the file
    #[arg(long, conflicts_with_all = ["line", "column"], required_unless_present = "line")]
    offset: Option<usize>,

    /// Caret line (1-based)
    #[arg(long, requires = "column")]
    line: Option<usize>,

    /// Caret column (1-based, in characters)
    #[arg(long, requires = "line")]
    column: Option<usize>,

    /// Project root (default: the current directory)
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop collecting after this many usages
    #[arg(long)]
    max_usages: Option<usize>,

    /// Only report declarations written in the project
    #[arg(long)]
    project_only: bool,

    /// Keep reads of parameters and local variables
    #[arg(long)]
    include_local_reads: bool,

    /// Output format (text, json)
    #[arg(short, long)]
    format: Option<String>,

    /// Append-only report log
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Do not append to the report log
    #[arg(long)]
    no_log: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only log the report
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("symbolscope v{}", env!("CARGO_PKG_VERSION"));

    let root = cli
        .root
        .canonicalize()
        .into_diagnostic()
        .wrap_err_with(|| format!("Project root not found: {}", cli.root.display()))?;
    let config = load_config(&cli, &root)?;

    run(&cli, &root, config)
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli, root: &Path) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::from_default_locations(root)?
    };

    // Override with CLI arguments
    if let Some(max_usages) = cli.max_usages {
        config.collector.max_usages = max_usages;
    }
    if cli.project_only {
        config.aggregation.project_only = true;
    }
    if cli.include_local_reads {
        config.collector.include_local_reads = true;
    }
    if let Some(format) = &cli.format {
        config.report.format = format.clone();
    }
    if let Some(log_file) = &cli.log_file {
        config.report.log_file = log_file.clone();
    }

    Ok(config)
}

fn run(cli: &Cli, root: &Path, config: Config) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let file = cli
        .file
        .canonicalize()
        .into_diagnostic()
        .wrap_err_with(|| format!("File not found: {}", cli.file.display()))?;
    let offset = caret_offset(cli, &file)?;
    debug!("Caret at character {} of {}", offset, file.display());

    let format: ReportFormat = config.report.format.parse()?;
    let log = if cli.no_log {
        None
    } else {
        let path = if config.report.log_file.is_absolute() {
            config.report.log_file.clone()
        } else {
            root.join(&config.report.log_file)
        };
        Some(LogWriter::new(&path))
    };
    let options = PipelineOptions::from_config(&config);
    let timeout = Duration::from_millis(config.index.wait_timeout_ms);
    let echo = config.report.echo && !cli.quiet;

    let project = Arc::new(Project::new(root, config));
    let indexing = project.begin_indexing();

    let spinner = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    };
    spinner.set_message("Indexing project...");
    let ready = project.wait_ready(timeout);
    spinner.finish_and_clear();

    if ready {
        // indexing is done; the thread has nothing left to do
        let _ = indexing.join();
    } else {
        info!("Index not ready after {}ms", timeout.as_millis());
    }

    let cancel = CancellationToken::new();
    let payload = match extract_symbol_context(&project, &file, offset, &options, &cancel) {
        Ok(payload) => payload,
        Err(e) => return report_precondition(e, cli.quiet),
    };

    let reporter = Reporter::new(format, log);
    let rendered = reporter.emit(&payload)?;
    if echo {
        print!("{}", rendered);
    }
    if !cli.quiet {
        summarize(&payload);
    }

    Ok(())
}

/// Character offset of the caret, from `--offset` or `--line`/`--column`
fn caret_offset(cli: &Cli, file: &Path) -> Result<usize> {
    if let Some(offset) = cli.offset {
        return Ok(offset);
    }
    let (line, column) = match (cli.line, cli.column) {
        (Some(line), Some(column)) => (line, column),
        _ => miette::bail!("Either --offset or --line with --column is required"),
    };

    let text = std::fs::read_to_string(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let byte = LineIndex::new(&text)
        .offset_of(&text, line, column)
        .ok_or_else(|| miette::miette!("{}:{} is outside {}", line, column, file.display()))?;
    Ok(text[..byte].chars().count())
}

/// Preconditions are not errors: note them and exit cleanly
fn report_precondition(error: PipelineError, quiet: bool) -> Result<()> {
    match error {
        PipelineError::Cancelled => {
            info!("Extraction cancelled");
        }
        other => {
            if !quiet {
                println!("{}", other.to_string().yellow());
            }
        }
    }
    Ok(())
}

fn summarize(payload: &SymbolContextPayload) {
    if let Some(warning) = &payload.warning {
        eprintln!("{}", warning.yellow());
        return;
    }
    let name = payload
        .target
        .as_ref()
        .and_then(|t| t.slice.simple_name.clone())
        .unwrap_or_else(|| "<anonymous>".to_string());
    eprintln!(
        "{}",
        format!("{} references {} symbols", name, payload.referenced_symbols.len()).dimmed()
    );
}
