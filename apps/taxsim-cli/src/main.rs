//! # taxsim
//!
//! Command-line shell for the tax simulation engine.
//!
//! ## Commands
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  taxsim [--config <path>] <command>                                     │
//! │                                                                         │
//! │  simulate <scenario> [--format text|json]   run one scenario file       │
//! │  bracket --anexo III --rbt12 250000          resolve one bracket        │
//! │  tables [--anexo V]                          print bracket tables       │
//! │  factor-r --anexo III --rbt12 .. --fs12 ..   Factor R advisory          │
//! │  config show | config init                   effective / default config │
//! │                                                                         │
//! │  stdout: results only        stderr: tracing output                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod output;
mod scenario;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use taxsim_core::brackets::{resolve, Anexo};
use taxsim_core::factor_r::advise;
use taxsim_core::validation::parse_amount;

use crate::config::SimulatorConfig;
use crate::error::CliError;
use crate::output::OutputFormat;
use crate::scenario::Scenario;

#[derive(Debug, Parser)]
#[command(name = "taxsim", version, about = "Tax regime simulator for quotes and invoices")]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a scenario file (TOML or JSON) and print the result.
    Simulate {
        scenario: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Resolve the Simples Nacional bracket for an RBT12.
    Bracket {
        #[arg(long)]
        anexo: Anexo,

        /// Trailing twelve-month revenue ("250000", "250.000,00").
        #[arg(long)]
        rbt12: String,
    },

    /// Print the bracket tables in effect.
    Tables {
        #[arg(long)]
        anexo: Option<Anexo>,
    },

    /// Factor R advisory for an Anexo.
    FactorR {
        #[arg(long)]
        anexo: Option<Anexo>,

        #[arg(long)]
        rbt12: String,

        /// Trailing twelve-month payroll.
        #[arg(long)]
        fs12: String,
    },

    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Write a default config file.
    Init,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SimulatorConfig::load(Some(path.clone()))
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulatorConfig::load_or_default(None),
    };

    init_tracing(&config.logging.filter);
    debug!(tables_overridden = config.tables.len(), "Configuration loaded");

    match cli.command {
        Command::Simulate { scenario, format } => {
            let scenario = Scenario::load(&scenario)?;
            let mut session = scenario.build_session(&config)?;
            let result = session.run()?;

            let rendered = match format {
                OutputFormat::Text => output::render_result(result),
                OutputFormat::Json => {
                    serde_json::to_string_pretty(result).map_err(CliError::from)?
                }
            };
            println!("{}", rendered);
        }

        Command::Bracket { anexo, rbt12 } => {
            let rbt12 = parse_amount(&rbt12).context("--rbt12")?;
            let catalog = config.bracket_catalog();
            let table = catalog.table(anexo);
            let res = resolve(table, rbt12)
                .with_context(|| format!("{} has no brackets configured", anexo))?;
            print!("{}", output::render_resolution(table, &res));
        }

        Command::Tables { anexo } => {
            let catalog = config.bracket_catalog();
            for table in catalog.tables().filter(|t| anexo.map_or(true, |a| a == t.anexo)) {
                println!("{}", output::render_table(table));
            }
        }

        Command::FactorR { anexo, rbt12, fs12 } => {
            let rbt12 = parse_amount(&rbt12).context("--rbt12")?;
            let fs12 = parse_amount(&fs12).context("--fs12")?;
            print!("{}", output::render_factor_r(&advise(Some(rbt12), Some(fs12), anexo)));
        }

        Command::Config { action } => match action {
            ConfigAction::Show => print!("{}", toml::to_string_pretty(&config)?),
            ConfigAction::Init => {
                let path = cli.config.or_else(SimulatorConfig::default_config_path);
                SimulatorConfig::default().save(path.clone())?;
                info!(?path, "Default config written");
            }
        },
    }

    Ok(())
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
