//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use jup2jek_core::converter::{DEFAULT_CONVERTER, NbConvert};
use jup2jek_core::pipeline::{ConversionReport, Orchestrator, ProgressReporter};
use jup2jek_shared::{
    Notebook, load_site_config, render_options, resolve_options_path, write_default_options,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// jup2jek: convert Jupyter notebooks to markdown for Jekyll sites.
///
/// Without a subcommand, converts every notebook under the posts directory.
/// WARNING: the configured assets directory is deleted and rebuilt on every
/// run. Do not keep anything else in it.
#[derive(Parser)]
#[command(name = "jup2jek", version)]
pub(crate) struct Cli {
    /// Options file path (defaults to <root>/jup2jek.ini; relative paths that
    /// do not exist are tried against the site root).
    #[arg(short, long, global = true)]
    pub options: Option<PathBuf>,

    /// Website root directory (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Converter command, invoked as `<converter> <notebook> --to markdown`.
    #[arg(long, env = "JUP2JEK_CONVERTER", default_value = DEFAULT_CONVERTER)]
    pub converter: String,

    /// Abort the run if a single notebook takes longer than this many seconds.
    #[arg(long, env = "JUP2JEK_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List the notebooks a conversion run would process.
    List,

    /// Options file management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write jup2jek.ini with default options into the site root (overwrites).
    Init,
    /// Show the resolved options and paths.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "jup2jek=info",
        1 => "jup2jek=debug",
        _ => "jup2jek=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = site_root(cli.root.as_deref())?;
    let options = cli.options.as_deref();

    match &cli.command {
        None => {
            let timeout = cli.timeout_secs.map(Duration::from_secs);
            cmd_convert(&root, options, &cli.converter, timeout).await
        }
        Some(Command::List) => cmd_list(&root, options),
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init(&root),
            ConfigAction::Show => cmd_config_show(&root, options),
        },
    }
}

/// Absolute site root from `--root` or the working directory.
fn site_root(root: Option<&Path>) -> Result<PathBuf> {
    let root = match root {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().wrap_err("cannot determine working directory")?,
    };
    std::path::absolute(&root).wrap_err_with(|| format!("cannot resolve {}", root.display()))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_convert(
    root: &Path,
    options: Option<&Path>,
    converter: &str,
    timeout: Option<Duration>,
) -> Result<()> {
    let config = load_site_config(root, options)?;

    // Fail before the assets directory is wiped if nbconvert is missing.
    let converter = NbConvert::from_command_line(converter)?.with_timeout(timeout);
    converter.check_available().await?;

    let orchestrator = Orchestrator::new(root, config, converter);
    info!(
        root = %orchestrator.root().display(),
        posts = %orchestrator.posts_path().display(),
        assets = %orchestrator.assets_path().display(),
        "converting notebooks"
    );

    let reporter = CliProgress::new();
    let result = orchestrator.convert_all(&reporter).await;
    reporter.finish();
    let report = result?;

    println!();
    println!("  Notebooks converted:     {}", report.notebooks.len());
    println!("  Asset folders relocated: {}", report.relocated_count());
    println!("  Assets directory:        {}", orchestrator.assets_path().display());
    println!("  Time:                    {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_list(root: &Path, options: Option<&Path>) -> Result<()> {
    let config = load_site_config(root, options)?;
    let posts = config.posts_path(root);

    for notebook in jup2jek_discovery::find_notebooks(&posts)? {
        let path = notebook.path();
        println!("{}", path.strip_prefix(root).unwrap_or(path).display());
    }

    Ok(())
}

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = write_default_options(root)?;
    println!("Options written to: {}", path.display());
    println!("Note: the assets directory is cleared on every conversion run.");
    Ok(())
}

fn cmd_config_show(root: &Path, options: Option<&Path>) -> Result<()> {
    let path = resolve_options_path(root, options);
    let config = load_site_config(root, options)?;

    println!("# {}", path.display());
    println!("{}", render_options(&config)?);
    println!("# posts path:  {}", config.posts_path(root).display());
    println!("# assets path: {}", config.assets_path(root).display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn notebook_started(&self, notebook: &Notebook, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Converting [{current}/{total}] {}", notebook.stem()));
    }

    fn done(&self, _report: &ConversionReport) {
        self.spinner.finish_and_clear();
    }
}
