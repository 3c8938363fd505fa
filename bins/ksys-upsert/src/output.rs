use clap::ValueEnum;
use ksys_api::TargetTable;
use ksys_engine::BuildResult;

use crate::error::CliError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// Full build result: statements, count, mapping_used, diagnostics
    Json,
    /// One literal SQL statement per line
    Sql,
    /// Statement shape plus bound parameter rows
    Params,
}

/// Render a build result. Empty string means nothing to print.
pub fn render(result: &BuildResult, target: &TargetTable, emit: Emit) -> Result<String, CliError> {
    let text = match emit {
        Emit::Json => serde_json::to_string(result)?,
        Emit::Sql => result
            .statements
            .iter()
            .map(|s| format!("{};", s.to_literal_sql(target)))
            .collect::<Vec<_>>()
            .join("\n"),
        Emit::Params => serde_json::to_string(&target.bind(&result.statements))?,
    };
    Ok(text)
}
