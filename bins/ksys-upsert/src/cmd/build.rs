use std::io::{Read, Write};
use std::sync::Arc;

use ksys_engine::UpsertBuilder;
use serde_json::Value;

use crate::config::{BuildArgs, load_settings};
use crate::error::CliError;
use crate::output;

pub fn run(args: BuildArgs) -> Result<(), CliError> {
    let config = load_settings(&args.common.config)?;

    let raw = read_input(&args.input)?;
    let batch: Value = serde_json::from_str(&raw).map_err(|e| CliError::Input {
        context: "parse",
        detail: format!("'{}': {e}", args.input),
    })?;

    let table = Arc::new(config.tags);
    let builder = UpsertBuilder::new(config.record);
    let result = builder.build(&batch, &table)?;

    let text = output::render(&result, &config.target, args.common.emit)?;
    if !text.is_empty() {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn read_input(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(input).map_err(|e| CliError::Input {
        context: "read",
        detail: format!("'{input}': {e}"),
    })
}
