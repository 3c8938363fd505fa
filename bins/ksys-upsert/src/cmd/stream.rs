use std::path::Path;

use ksys_api::{RecordKeys, TargetTable};
use ksys_config_hcl::HclParser;
use ksys_engine::{IngestConfig, TagTableHandle, UpsertBuilder};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal::unix::{SignalKind, signal};

use crate::config::{StreamArgs, load_settings};
use crate::error::CliError;
use crate::output::{self, Emit};

/// One NDJSON line in = one batch; one rendered result out.
///
/// With `--emit sql` each processed batch is preceded by a `-- line N`
/// comment, so an empty batch still shows up in the output.
///
/// Only the tag table is hot-reloadable. Target and record-key changes
/// need a restart.
pub async fn run(args: StreamArgs) -> Result<(), CliError> {
    let config = load_settings(&args.common.config)?;
    let IngestConfig { target, record, tags } = config;

    let handle = TagTableHandle::new(tags);
    let builder = UpsertBuilder::new(record);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut sighup = signal(SignalKind::hangup())?;
    let mut batches: u64 = 0;
    let mut line_no: u64 = 0;

    tracing::info!("stream started, one JSON batch per line");

    loop {
        tokio::select! {
            _ = sighup.recv() => {
                tracing::info!(
                    config = %args.common.config.display(),
                    "SIGHUP received, reloading tag table"
                );
                match reload(&args.common.config, &handle, &target, builder.keys()) {
                    Ok(r) => tracing::info!(
                        generation = r.generation,
                        restart_needed = r.restart_needed,
                        "tag table reloaded"
                    ),
                    Err(e) => {
                        tracing::error!(error = %e, "tag table reload failed (keeping old table)");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down...");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                batches += 1;

                let batch: Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(line = line_no, error = %e, "skipping unparseable line");
                        continue;
                    }
                };
                let table = handle.snapshot();
                let result = match builder.build(&batch, &table) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(line = line_no, error = %e, "skipping batch");
                        continue;
                    }
                };

                let mut text = output::render(&result, &target, args.common.emit)?;
                if args.common.emit == Emit::Sql {
                    text = if text.is_empty() {
                        format!("-- line {line_no}")
                    } else {
                        format!("-- line {line_no}\n{text}")
                    };
                }
                stdout.write_all(text.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
    }

    stdout.flush().await?;
    tracing::info!(batches, "stream finished");
    Ok(())
}

/// Result of a successful reload.
#[derive(Debug, PartialEq, Eq)]
struct Reloaded {
    generation: u64,
    /// Target or record keys differ from the running ones and were ignored.
    restart_needed: bool,
}

/// Re-read the config file and install its tag table. On error the
/// running table stays in place.
fn reload(
    path: &Path,
    handle: &TagTableHandle,
    target: &TargetTable,
    keys: &RecordKeys,
) -> Result<Reloaded, CliError> {
    // unlike startup, a missing file here is an error
    let fresh = IngestConfig::load_with(path, &[&HclParser])?;
    Ok(apply_reload(fresh, handle, target, keys))
}

fn apply_reload(
    fresh: IngestConfig,
    handle: &TagTableHandle,
    target: &TargetTable,
    keys: &RecordKeys,
) -> Reloaded {
    let restart_needed = fresh.target != *target || fresh.record != *keys;
    if restart_needed {
        tracing::warn!("target/record changes require a restart, applying tags only");
    }
    let generation = handle.install(fresh.tags);
    Reloaded { generation, restart_needed }
}
