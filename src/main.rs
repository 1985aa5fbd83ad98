//! # Relation Linker CLI (`rlink`)
//!
//! Links destination records of a Notion workspace to their source records
//! by a shared code field.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rlink scan` | Retrieve, classify and index; print counts and duplicates |
//! | `rlink link` | Full run: write one relation per resolvable destination |
//! | `rlink link --dry-run` | Resolve keys and show what would be linked |
//! | `rlink config` | Print the effective configuration |
//!
//! ## Examples
//!
//! ```bash
//! export NOTION_TOKEN=secret_...
//! rlink scan --config ./config/rlink.toml
//! rlink link --code-field CODIGO --relation-field BASE_OAE_ANTIGA
//! rlink link --format json --progress json > report.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relation_linker::config::{self, Config};
use relation_linker::connector_notion::NotionStore;
use relation_linker::progress::ProgressMode;
use relation_linker::reconcile::{run_reconciliation, RunMode, RunOptions};
use relation_linker::report;

const DEFAULT_CONFIG_PATH: &str = "./config/rlink.toml";

/// Relation Linker — reconcile records by key and write relation links.
#[derive(Parser)]
#[command(name = "rlink", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/rlink.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve, classify and index records without writing anything.
    Scan {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Link every destination record to the source record with the same key.
    ///
    /// Per-record failures are reported and do not stop the run. The run
    /// aborts before any update if retrieval was partial or if there are no
    /// sources, destinations or usable keys.
    Link {
        /// Resolve keys and report what would be linked, without updating.
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the effective configuration.
    Config,
}

#[derive(Args)]
struct RunArgs {
    /// Field holding the business key (overrides `fields.code`).
    #[arg(long)]
    code_field: Option<String>,

    /// Relation field that marks destinations (overrides `fields.relation`).
    #[arg(long)]
    relation_field: Option<String>,

    /// Continue with the records retrieved so far if a page fetch fails.
    #[arg(long)]
    allow_partial: bool,

    /// Integration token. Falls back to the variable named by `store.token_env`.
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Report format on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Progress on stderr: `auto`, `human`, `json` or `off`.
    #[arg(long, default_value = "auto", value_parser = parse_progress)]
    progress: ProgressMode,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_progress(s: &str) -> Result<ProgressMode, String> {
    ProgressMode::parse(s).ok_or_else(|| format!("invalid progress mode '{}'", s))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relation_linker=info,rlink=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => config::load_config(p),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                config::load_config(default)
            } else {
                Ok(Config::minimal())
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut cfg = load(cli.config.as_deref())?;

    let (mode, run) = match cli.command {
        Commands::Config => {
            let token_state = if std::env::var(&cfg.store.token_env).is_ok() {
                "set"
            } else {
                "missing"
            };
            print!("{}", toml::to_string_pretty(&cfg)?);
            println!("\n# token (${}): {}", cfg.store.token_env, token_state);
            return Ok(());
        }
        Commands::Scan { run } => (RunMode::Scan, run),
        Commands::Link { dry_run, run } => {
            let mode = if dry_run { RunMode::DryRun } else { RunMode::Link };
            (mode, run)
        }
    };

    if let Some(code) = run.code_field {
        cfg.fields.code = code;
    }
    if let Some(relation) = run.relation_field {
        cfg.fields.relation = relation;
    }
    cfg.run.allow_partial |= run.allow_partial;
    cfg.validate()?;

    let token = match run.token {
        Some(t) => t,
        None => std::env::var(&cfg.store.token_env)
            .with_context(|| format!("{} environment variable not set", cfg.store.token_env))?,
    };
    let store = NotionStore::new(&cfg.store, token)?;
    info!(base_url = %cfg.store.base_url, "using Notion store");

    let options = RunOptions {
        code_field: cfg.fields.code.clone(),
        relation_field: cfg.fields.relation.clone(),
        allow_partial: cfg.run.allow_partial,
        mode,
    };
    let progress = run.progress.reporter();

    match run_reconciliation(&store, &options, progress.as_ref()).await {
        Ok(rep) => {
            match run.format {
                OutputFormat::Text => {
                    print!("{}", report::render_text(&rep, cfg.run.unresolved_preview))
                }
                OutputFormat::Json => println!("{}", report::render_json(&rep)?),
            }
            Ok(())
        }
        Err(err) => {
            match run.format {
                OutputFormat::Text => print!("{}", report::render_abort_text(&err)),
                OutputFormat::Json => println!("{}", report::render_abort_json(&err)?),
            }
            Err(err.into())
        }
    }
}
