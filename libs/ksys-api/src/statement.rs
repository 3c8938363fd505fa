use serde::Serialize;
use serde_json::Number;

use crate::target::{TargetTable, escape_sql_string};

/// One bound parameter value.
///
/// Serializes untagged, so a parameter row reads as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Text(String),
    Number(Number),
    Null,
}

/// Idempotent write of one reading.
///
/// Natural key is `(timestamp, tag_name)`: applying the statement twice
/// leaves one row, with only the modification marker refreshed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertStatement {
    pub timestamp: String,
    pub tag_name: String,
    /// `None` writes SQL `NULL`.
    pub value: Option<Number>,
}

impl UpsertStatement {
    /// Bound values in placeholder order (`$1` time, `$2` tag, `$3` value).
    pub fn params(&self) -> [SqlParam; 3] {
        [
            SqlParam::Text(self.timestamp.clone()),
            SqlParam::Text(self.tag_name.clone()),
            self.value.clone().map_or(SqlParam::Null, SqlParam::Number),
        ]
    }

    /// Value as it appears in literal SQL: the number text or `NULL`.
    pub fn value_literal(&self) -> String {
        self.value.as_ref().map_or_else(|| "NULL".to_owned(), Number::to_string)
    }

    /// Self-contained statement text for consumers that cannot bind
    /// parameters. String values are quoted with `'` doubled.
    pub fn to_literal_sql(&self, target: &TargetTable) -> String {
        target.render(
            &format!("'{}'", escape_sql_string(&self.timestamp)),
            &format!("'{}'", escape_sql_string(&self.tag_name)),
            &self.value_literal(),
        )
    }
}

/// Statement shape rendered once, plus one parameter row per statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterizedBatch {
    pub sql: String,
    pub rows: Vec<[SqlParam; 3]>,
}
