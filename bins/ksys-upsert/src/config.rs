use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use ksys_config_hcl::HclParser;
use ksys_engine::IngestConfig;

use crate::error::CliError;
use crate::output::Emit;

#[derive(Parser)]
#[command(name = "ksys-upsert", about = "Sensor readings → idempotent TimescaleDB upserts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build statements for a single JSON batch
    Build(BuildArgs),
    /// Build statements for every NDJSON batch on stdin (SIGHUP reloads tags)
    Stream(StreamArgs),
}

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    /// Path to config file (.toml or .hcl)
    #[arg(long, default_value = "ksys.toml", env = "KSYS_CONFIG")]
    pub config: PathBuf,

    /// Output form
    #[arg(long, value_enum, default_value_t = Emit::Json)]
    pub emit: Emit,
}

#[derive(Args, Clone, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Batch file; `-` reads stdin
    #[arg(long, default_value = "-")]
    pub input: String,
}

#[derive(Args, Clone, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Load the config file. A missing file means defaults (empty tag table);
/// a file that exists but does not parse is an error.
pub fn load_settings(path: &Path) -> Result<IngestConfig, CliError> {
    if !path.exists() {
        tracing::warn!(config = %path.display(), "config file not found, using defaults");
        return Ok(IngestConfig::default());
    }
    let config = IngestConfig::load_with(path, &[&HclParser])?;
    tracing::info!(
        config = %path.display(),
        tags = config.tags.len(),
        table = %config.target.table,
        "loaded config"
    );
    Ok(config)
}
