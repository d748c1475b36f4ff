//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use wikisift_core::cache::TtlCache;
use wikisift_core::index::{IndexBuilder, LineIndex, ProgressReporter};
use wikisift_core::search::{SearchOptions, search};
use wikisift_fetcher::document_url;
use wikisift_shared::{
    AppConfig, IndexConfig, IndexMode, init_config, init_config_at, load_config, load_config_from,
};

use crate::render::{self, RenderOptions};

/// Input that ends an interactive session.
const QUIT_COMMAND: &str = ":q";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// wikisift: search the wiki's link collection.
#[derive(Parser)]
#[command(
    name = "wikisift",
    version,
    about = "Search the wiki's link collection from the terminal.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.wikisift/wikisift.toml.
    #[arg(long, global = true, env = "WIKISIFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
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
    /// Download the wiki and run one query against it.
    Search {
        /// Query words.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print results as a raw markdown block.
        #[arg(long)]
        raw: bool,

        /// Leave base64 payloads encoded.
        #[arg(long)]
        no_decode: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Read queries from stdin; the index is kept and refreshed when it expires.
    Interactive {
        /// Print results as a raw markdown block.
        #[arg(long)]
        raw: bool,
    },

    /// Build the index and report what went into it.
    Index {
        /// Print every indexed line.
        #[arg(long)]
        dump: bool,
    },

    /// List the configured documents.
    Sources,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; results to stdout.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "wikisift=warn",
        1 => "wikisift=info",
        2 => "wikisift=debug",
        _ => "wikisift=trace",
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
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Search {
            query,
            raw,
            no_decode,
            json,
        } => {
            let config = resolve_config(config_path)?;
            cmd_search(&config, &query.join(" "), raw, no_decode, json).await
        }
        Command::Interactive { raw } => cmd_interactive(&resolve_config(config_path)?, raw).await,
        Command::Index { dump } => cmd_index(&resolve_config(config_path)?, dump).await,
        Command::Sources => cmd_sources(&resolve_config(config_path)?),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_search(
    config: &AppConfig,
    query: &str,
    raw: bool,
    no_decode: bool,
    json: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        print!("{}", render::warning("The search query is empty."));
        return Ok(());
    }

    let mut index_config = IndexConfig::from(config);
    if no_decode {
        index_config.decode_base64 = false;
    }

    let mut render_opts = RenderOptions::from(config);
    render_opts.raw_markdown |= raw;
    let options = SearchOptions::from(config);

    info!(query, mode = %index_config.mode, "searching");

    let builder = IndexBuilder::new(index_config)?;
    let index = {
        let reporter = CliProgress::new();
        builder.build(&reporter).await?
    };

    let report = search(&index.lines, query, &options)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_report(&report, &render_opts));
    }

    Ok(())
}

async fn cmd_interactive(config: &AppConfig, raw: bool) -> Result<()> {
    let builder = IndexBuilder::new(IndexConfig::from(config))?;
    let builder = &builder;
    let options = SearchOptions::from(config);
    let mut render_opts = RenderOptions::from(config);
    render_opts.raw_markdown |= raw;

    let mut cache: TtlCache<LineIndex> = TtlCache::new(config.search.cache_ttl_secs);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut input = String::new();

    info!(ttl_secs = config.search.cache_ttl_secs, "interactive session started");
    println!("Type a query and press Enter. {QUIT_COMMAND} or Ctrl-D quits.");

    loop {
        print!("search> ");
        stdout.flush()?;

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let query = input.trim_end_matches(['\n', '\r']);
        if query.trim() == QUIT_COMMAND {
            break;
        }
        if query.trim().is_empty() {
            print!("{}", render::warning("The search query is empty."));
            continue;
        }

        let index = cache
            .get_or_rebuild(Utc::now(), || async move {
                let reporter = CliProgress::new();
                builder.build(&reporter).await
            })
            .await?;

        let report = search(&index.lines, query, &options)?;
        print!("{}", render::render_report(&report, &render_opts));
    }

    Ok(())
}

async fn cmd_index(config: &AppConfig, dump: bool) -> Result<()> {
    let builder = IndexBuilder::new(IndexConfig::from(config))?;
    let index = {
        let reporter = CliProgress::new();
        builder.build(&reporter).await?
    };

    if dump {
        for line in &index.lines {
            println!("{line}");
        }
        return Ok(());
    }

    let titles = index
        .lines
        .iter()
        .filter(|line| wikisift_core::search::is_section_title(line))
        .count();

    println!();
    println!("  Index built");
    println!("  Mode:    {}", index.mode);
    println!("  Lines:   {}", index.len());
    println!("  Titles:  {titles}");
    if !index.failed_sources.is_empty() {
        println!("  Failed:  {}", index.failed_sources.join(", "));
    }
    println!();

    Ok(())
}

fn cmd_sources(config: &AppConfig) -> Result<()> {
    if config.search.index_mode == IndexMode::SinglePage {
        println!("index_mode = single-page: {}", config.urls.single_page_url);
        return Ok(());
    }

    for source in &config.documents {
        let url = document_url(source, &config.urls.raw_docs_prefix)
            .map_err(|e| eyre!("document '{}': {e}", source.file))?;
        println!("{:<20} {} {:<26} {url}", source.section, source.icon, source.file);
    }
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) => init_config_at(p)?,
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_fetched(&self, file: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Downloading [{current}/{total}] {file}"));
    }

    fn done(&self, _index: &LineIndex) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
