use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use qgis_theme::ProjectVersion;
use tracing_subscriber::EnvFilter;

use themectl::cmd_dump;
use themectl::cmd_list;
use themectl::cmd_show;
use themectl::common::{parse_version_arg, LoadOptions, DEFAULT_LOAD_TIMEOUT_MS};

#[derive(Parser, Debug)]
#[command(name = "themectl", version, about = "QGIS project theme inspector")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    /// Force the QGIS version used to interpret themes (e.g. 3.28.4)
    #[arg(long, value_parser = parse_version_arg)]
    qgis_version: Option<ProjectVersion>,
    /// Give up loading the project after this many milliseconds
    #[arg(long, default_value_t = DEFAULT_LOAD_TIMEOUT_MS)]
    timeout_ms: u64,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the themes of a project
    List { project: PathBuf },
    /// Show the layers and groups of one theme
    Show {
        project: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// Print every theme as JSON keyed by name
    Dump { project: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        verbose,
        json,
        qgis_version,
        timeout_ms,
        cmd,
    } = Cli::parse();

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = LoadOptions {
        version: qgis_version,
        timeout: Duration::from_millis(timeout_ms),
    };

    match cmd {
        Cmd::List { project } => cmd_list::run(&project, &options, json).await?,
        Cmd::Show { project, name } => cmd_show::run(&project, &name, &options, json).await?,
        Cmd::Dump { project } => cmd_dump::run(&project, &options).await?,
    };

    Ok(())
}
