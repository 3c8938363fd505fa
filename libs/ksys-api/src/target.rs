use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::statement::{ParameterizedBatch, UpsertStatement};

// ════════════════════════════════════════════════════════════════
//  Identifier validation
// ════════════════════════════════════════════════════════════════

/// Validate a SQL identifier (table name, column name).
/// Allowed: `^[a-zA-Z_][a-zA-Z0-9_.]*$`.
pub fn validate_identifier(name: &str, context: &str) -> Result<(), IngestError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(IngestError::config(format!("{context}: identifier is empty")));
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(IngestError::config(format!(
            "{context}: invalid identifier '{name}': must start with a letter or underscore"
        )));
    }
    for ch in chars {
        if !ch.is_ascii_alphanumeric() && ch != '_' && ch != '.' {
            return Err(IngestError::config(format!(
                "{context}: invalid character '{ch}' in identifier '{name}'"
            )));
        }
    }
    Ok(())
}

/// Escape a string value for use inside a single-quoted SQL literal.
pub fn escape_sql_string(s: &str) -> String {
    s.replace('\'', "''")
}

// ════════════════════════════════════════════════════════════════
//  TargetTable
// ════════════════════════════════════════════════════════════════

/// Destination hypertable and its column names.
///
/// The conflict key is always `(time_column, tag_column)`; a conflicting
/// insert overwrites `value_column` and stamps `updated_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetTable {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    #[serde(default = "default_tag_column")]
    pub tag_column: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    #[serde(default = "default_updated_column")]
    pub updated_column: String,
}

fn default_table() -> String {
    "sensor_data".into()
}
fn default_time_column() -> String {
    "timestamp".into()
}
fn default_tag_column() -> String {
    "tag_name".into()
}
fn default_value_column() -> String {
    "value".into()
}
fn default_updated_column() -> String {
    "updated_at".into()
}

impl Default for TargetTable {
    fn default() -> Self {
        Self {
            table: default_table(),
            time_column: default_time_column(),
            tag_column: default_tag_column(),
            value_column: default_value_column(),
            updated_column: default_updated_column(),
        }
    }
}

impl TargetTable {
    /// Check every identifier. Call once at config time; rendering assumes
    /// the names are valid.
    pub fn validate(&self) -> Result<(), IngestError> {
        validate_identifier(&self.table, "table")?;
        validate_identifier(&self.time_column, "time_column")?;
        validate_identifier(&self.tag_column, "tag_column")?;
        validate_identifier(&self.value_column, "value_column")?;
        validate_identifier(&self.updated_column, "updated_column")?;
        Ok(())
    }

    /// Statement shape with `$1..$3` placeholders bound to
    /// `(timestamp, tag_name, value)`.
    pub fn upsert_sql(&self) -> String {
        self.render("$1", "$2", "$3")
    }

    /// Shared statement shape plus one parameter row per statement.
    pub fn bind(&self, statements: &[UpsertStatement]) -> ParameterizedBatch {
        ParameterizedBatch {
            sql: self.upsert_sql(),
            rows: statements.iter().map(UpsertStatement::params).collect(),
        }
    }

    pub(crate) fn render(&self, ts: &str, tag: &str, value: &str) -> String {
        let Self { table, time_column, tag_column, value_column, updated_column } = self;
        format!(
            "INSERT INTO {table} ({time_column}, {tag_column}, {value_column}) \
             VALUES ({ts}, {tag}, {value}) \
             ON CONFLICT ({time_column}, {tag_column}) \
             DO UPDATE SET {value_column} = EXCLUDED.{value_column}, \
             {updated_column} = CURRENT_TIMESTAMP"
        )
    }
}
