use std::path::PathBuf;
use std::process::ExitCode;

use agent_readiness::{
    CiProvider, DEFAULT_REPORT_PATH, ReadinessOptions, SignalsSource, build_report, load_report,
    render_markdown, resolve_root, validate_report, write_report,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "agent-readiness",
    version,
    about = "Score a repository against agent-readiness maturity levels",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    report: ReportArgs,

    /// Log evaluation progress to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate the repository and print a report (default)
    Report(ReportArgs),
    /// Check a saved JSON report against the report schema
    Validate {
        /// Report file, relative to the repo root
        #[arg(long = "input", visible_alias = "in", default_value = DEFAULT_REPORT_PATH)]
        input: PathBuf,

        /// Repository root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Markdown)]
    format: Format,

    /// Also write the JSON report to this path, relative to the repo root
    #[arg(long)]
    out: Option<PathBuf>,

    /// Repository root (defaults to the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Scan source files for tracing and metrics instrumentation
    #[arg(long)]
    telemetry_scan: bool,

    /// Run each app's integration tests
    #[arg(long)]
    run_integration: bool,

    /// Enable CI-provider criteria
    #[arg(long, value_enum)]
    ci_provider: Option<CiProvider>,

    /// Enable deploy and signals criteria
    #[arg(long, value_enum)]
    signals: Option<SignalsSource>,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum Format {
    Json,
    #[default]
    Markdown,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("agent-readiness failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    init_tracing(cli.verbose)?;
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;

    match cli.command {
        Some(Command::Validate { input, root }) => {
            let root = resolve_root(&cwd, root.as_deref());
            let path = root.join(input);
            let report = load_report(&path)?;
            let result = validate_report(&report);
            if result.valid {
                println!("Report is valid.");
                return Ok(ExitCode::SUCCESS);
            }
            eprintln!("Report failed validation:");
            for error in &result.errors {
                eprintln!("- {error}");
            }
            Ok(ExitCode::FAILURE)
        }
        Some(Command::Report(args)) => report(&cwd, args),
        None => report(&cwd, cli.report),
    }
}

fn report(cwd: &std::path::Path, args: ReportArgs) -> Result<ExitCode> {
    let root = resolve_root(cwd, args.root.as_deref());
    let options = ReadinessOptions {
        telemetry_scan: args.telemetry_scan,
        run_integration: args.run_integration,
        ci_provider: args.ci_provider,
        signals: args.signals,
    };
    let report = build_report(&root, env!("CARGO_PKG_VERSION"), options);

    if let Some(out) = &args.out {
        let path = root.join(out);
        write_report(&report, &path)?;
        tracing::info!(path = %path.display(), "wrote report");
    }

    match args.format {
        Format::Json => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&report)
            } else {
                serde_json::to_string(&report)
            };
            println!("{}", json.context("failed to serialize report")?);
        }
        Format::Markdown => println!("{}", render_markdown(&report)),
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("agent_readiness={level}").parse()?),
        )
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))
}
