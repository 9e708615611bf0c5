//! CLI command definitions and handlers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use specsync_core::audit::Finding;
use specsync_core::pipeline::{ProgressReporter, SyncResult};
use specsync_markdown::LinkMapping;
use specsync_shared::{AppConfig, CONFIG_FILE_NAME, init_config, load_config_from};

/// specsync: aggregate specification documents into a docs site content tree.
#[derive(Parser)]
#[command(name = "specsync", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    pub(crate) config: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub(crate) log_format: LogFormat,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum LogFormat {
    /// Human-readable text output
    Text,
    /// Structured JSON output
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch all configured sources and rebuild the output tree
    Sync,

    /// Scan the output tree for link and formatting problems
    Audit {
        /// Report findings without modifying any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a starter configuration file
    Init,
    /// Print the resolved configuration
    Show,
}

/// Initialize the tracing subscriber based on CLI flags.
///
/// `RUST_LOG` takes precedence over `--verbose` when set.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // One directive per crate: a bare `specsync` prefix would not match the
    // `specsync_*` library targets.
    let filter = format!(
        "specsync={level},specsync_shared={level},specsync_fetcher={level},specsync_markdown={level},specsync_core={level}"
    );

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

/// Dispatch the parsed CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sync => cmd_sync(&cli.config).await,
        Command::Audit { dry_run } => cmd_audit(&cli.config, dry_run).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&cli.config),
            ConfigAction::Show => cmd_config_show(&cli.config),
        },
    }
}

async fn cmd_sync(config_path: &Path) -> Result<()> {
    let config = load_config_from(config_path)?;

    info!(
        config = %config_path.display(),
        sources = config.sources.len(),
        "starting sync"
    );

    let progress = CliProgress::new();
    let result = specsync_core::pipeline::sync(&config, &progress).await?;

    println!();
    println!("Sync complete!");
    println!("  Documents written: {}", result.docs_written);
    println!("  Schemas written:   {}", result.schemas_written);
    if !result.skipped.is_empty() {
        println!("  Sources skipped:   {}", result.skipped.len());
        for (name, error) in &result.skipped {
            println!("    {name}: {error}");
        }
    }
    println!("  Output directory:  {}", config.site.output_dir.display());
    println!("  Time elapsed:      {:.1}s", result.elapsed.as_secs_f64());

    Ok(())
}

async fn cmd_audit(config_path: &Path, dry_run: bool) -> Result<()> {
    let config = load_config_from(config_path)?;
    let mapping = LinkMapping::build(&config.sources, &config.links)?;
    let root = &config.site.output_dir;

    if dry_run {
        let findings = specsync_core::audit::audit_tree(root, &mapping)?;
        print_findings(&findings);
        println!(
            "{} finding(s) in {} (dry run, nothing changed)",
            findings.len(),
            root.display()
        );
        return Ok(());
    }

    let summary = specsync_core::audit::fix_tree(root, &mapping)?;
    print_findings(&summary.findings);
    println!(
        "{} finding(s) fixed in {} of {} file(s)",
        summary.findings.len(),
        summary.files_changed,
        summary.files_scanned
    );

    Ok(())
}

fn cmd_config_init(config_path: &Path) -> Result<()> {
    let path = init_config(config_path)?;
    println!("Config initialized at: {}", path.display());
    println!("Add [[sources]] entries, then run: specsync sync");
    Ok(())
}

fn cmd_config_show(config_path: &Path) -> Result<()> {
    let config: AppConfig = load_config_from(config_path)?;
    let rendered = toml::to_string_pretty(&config)?;
    println!("# {}", config_path.display());
    println!("{rendered}");
    Ok(())
}

/// Print audit findings grouped by file.
fn print_findings(findings: &[Finding]) {
    let mut current: Option<&Path> = None;
    for finding in findings {
        if current != Some(finding.file.as_path()) {
            println!();
            println!("{}", finding.file.display());
            current = Some(finding.file.as_path());
        }
        println!(
            "  line {:>4}  {:<18} {}",
            finding.line,
            finding.kind.label(),
            finding.detail
        );
    }
    println!();
}

/// Spinner-based progress reporting for interactive runs.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn entry_fetched(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetched [{current}/{total}] {name}"));
    }

    fn entry_written(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Wrote [{current}/{total}] {name}"));
    }

    fn done(&self, _result: &SyncResult) {
        self.spinner.finish_and_clear();
    }
}
