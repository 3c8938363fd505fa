use std::sync::Arc;

use ksys_api::{Diagnostic, IngestError, RecordKeys, UpsertStatement};
use serde::Serialize;
use serde_json::Value;

use crate::tag_table::TagTable;

/// Output of one `build` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildResult {
    /// One statement per valid record, in input order.
    pub statements: Vec<UpsertStatement>,
    pub count: usize,
    /// The exact table the statements were resolved against.
    pub mapping_used: Arc<TagTable>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildResult {
    fn empty(table: &Arc<TagTable>) -> Self {
        Self {
            statements: Vec::new(),
            count: 0,
            mapping_used: Arc::clone(table),
            diagnostics: Vec::new(),
        }
    }
}

/// Turns raw measurement batches into upsert statements.
///
/// Stateless apart from the record key layout; safe to share across
/// threads and call concurrently.
#[derive(Debug, Clone, Default)]
pub struct UpsertBuilder {
    keys: RecordKeys,
}

impl UpsertBuilder {
    pub fn new(keys: RecordKeys) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &RecordKeys {
        &self.keys
    }

    /// Build statements for a JSON batch.
    ///
    /// The batch must be an array; anything else is a contract violation.
    /// Bad records inside the array are never an error, they land in
    /// `diagnostics`.
    pub fn build(&self, batch: &Value, table: &Arc<TagTable>) -> Result<BuildResult, IngestError> {
        let records = batch.as_array().ok_or_else(|| {
            IngestError::contract(format!(
                "batch must be a JSON array, got {}",
                json_type_name(batch)
            ))
        })?;
        Ok(self.build_from(records, table))
    }

    /// Single pass over any record stream.
    pub fn build_from<'a, I>(&self, records: I, table: &Arc<TagTable>) -> BuildResult
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut result = records.into_iter().enumerate().fold(
            BuildResult::empty(table),
            |mut acc, (index, raw)| {
                match self.keys.extract(raw) {
                    Ok(rec) => {
                        let stmt = UpsertStatement {
                            tag_name: table.lookup(&rec.field_id).into_owned(),
                            timestamp: rec.timestamp,
                            value: rec.value,
                        };
                        tracing::debug!(
                            tag = %stmt.tag_name,
                            value = %stmt.value_literal(),
                            timestamp = %stmt.timestamp,
                            "built upsert"
                        );
                        acc.statements.push(stmt);
                    }
                    Err(reason) => {
                        tracing::warn!(
                            index,
                            reason = %reason,
                            record = %raw,
                            "skipping invalid record"
                        );
                        acc.diagnostics.push(Diagnostic {
                            index,
                            reason,
                            record: raw.clone(),
                        });
                    }
                }
                acc
            },
        );
        result.count = result.statements.len();

        if result.count > 0 {
            tracing::info!(
                count = result.count,
                rejected = result.diagnostics.len(),
                "generated upsert statements"
            );
        } else {
            tracing::warn!(rejected = result.diagnostics.len(), "no statements generated");
        }
        result
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ksys_api::{ErrorKind, RejectReason};
    use serde_json::json;

    fn plant_table() -> Arc<TagTable> {
        Arc::new(TagTable::from_pairs([
            ("1", "D100"),
            ("2", "D101"),
            ("3", "D102"),
            ("4", "D200"),
            ("5", "D201"),
            ("6", "D202"),
            ("7", "D300"),
            ("8", "D301"),
            ("9", "D302"),
        ]))
    }

    fn short_keys() -> UpsertBuilder {
        UpsertBuilder::new(RecordKeys {
            value: "value".into(),
            field: "field".into(),
            time: "time".into(),
        })
    }

    fn tags(result: &BuildResult) -> Vec<&str> {
        result.statements.iter().map(|s| s.tag_name.as_str()).collect()
    }

    #[test]
    fn empty_batch() {
        let result = UpsertBuilder::default().build(&json!([]), &plant_table()).unwrap();
        assert_eq!(result.count, 0);
        assert!(result.statements.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn preserves_input_order() {
        let batch = json!([
            {"_field": "1", "_time": "t1", "_value": 1},
            {"_field": "2", "_time": "t1", "_value": 2},
            {"_field": "1", "_time": "t2", "_value": 3},
        ]);
        let result = UpsertBuilder::default().build(&batch, &plant_table()).unwrap();
        assert_eq!(tags(&result), ["D100", "D101", "D100"]);
        assert_eq!(result.count, 3);
    }

    #[test]
    fn mixed_validity() {
        let batch = json!([{"field": "1", "time": "t1", "value": 10}, {"value": 5}]);
        let result = short_keys().build(&batch, &plant_table()).unwrap();

        assert_eq!(result.count, 1);
        assert_eq!(tags(&result), ["D100"]);
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.index, 1);
        assert_eq!(diag.record, json!({"value": 5}));
        assert_eq!(
            diag.reason,
            RejectReason::MissingFields { fields: vec!["field".into(), "time".into()] }
        );
    }

    #[test]
    fn unknown_identifier_is_not_an_error() {
        let batch = json!([{"_field": "999", "_time": "t", "_value": 1}]);
        let result = UpsertBuilder::default().build(&batch, &plant_table()).unwrap();
        assert_eq!(tags(&result), ["Unknown_999"]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn same_conflict_key_is_not_deduplicated() {
        let batch = json!([
            {"_field": "4", "_time": "t", "_value": 1.5},
            {"_field": "4", "_time": "t", "_value": 2.5},
        ]);
        let result = UpsertBuilder::default().build(&batch, &plant_table()).unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(result.statements[0].value_literal(), "1.5");
        assert_eq!(result.statements[1].value_literal(), "2.5");
    }

    #[test]
    fn values_and_timestamps_are_verbatim() {
        let batch = json!([
            {"_field": "1", "_time": "2025-08-01T09:00:00.123+09:00", "_value": -0.001}
        ]);
        let result = UpsertBuilder::default().build(&batch, &plant_table()).unwrap();
        let stmt = &result.statements[0];
        assert_eq!(stmt.timestamp, "2025-08-01T09:00:00.123+09:00");
        assert_eq!(stmt.value_literal(), "-0.001");
    }

    #[test]
    fn high_precision_values_are_not_rounded() {
        let batch: Value = serde_json::from_str(
            r#"[
                {"_field": "1", "_time": "t1", "_value": 0.12345678901234567890},
                {"_field": "2", "_time": "t1", "_value": 123456789012345678901234},
                {"_field": "3", "_time": "t1", "_value": 1.50}
            ]"#,
        )
        .unwrap();
        let result = UpsertBuilder::default().build(&batch, &plant_table()).unwrap();
        let target = ksys_api::TargetTable::default();
        let values: Vec<String> = result.statements.iter().map(|s| s.value_literal()).collect();
        assert_eq!(values, ["0.12345678901234567890", "123456789012345678901234", "1.50"]);
        assert!(
            result.statements[1]
                .to_literal_sql(&target)
                .contains("VALUES ('t1', 'D101', 123456789012345678901234)")
        );
        assert_eq!(
            serde_json::to_string(&result.statements[0].params()).unwrap(),
            r#"["t1","D100",0.12345678901234567890]"#
        );
    }

    #[test]
    fn loosely_typed_values_still_produce_statements() {
        let batch = json!([
            {"_field": "1", "_time": "t1", "_value": "12.5"},
            {"_field": "1", "_time": "t2", "_value": null},
            {"_field": "1", "_time": "t3", "_value": "n/a"},
        ]);
        let result = UpsertBuilder::default().build(&batch, &plant_table()).unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(result.statements[0].value_literal(), "12.5");
        assert_eq!(result.statements[1].value, None);
        assert_eq!(result.statements[1].value_literal(), "NULL");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].index, 2);
        assert_eq!(result.diagnostics[0].reason, RejectReason::InvalidValue);
    }

    #[test]
    fn entirely_invalid_batch_is_not_an_error() {
        let batch = json!([null, 3, "x", {"_value": 1}]);
        let result = UpsertBuilder::default().build(&batch, &plant_table()).unwrap();
        assert_eq!(result.count, 0);
        assert!(result.statements.is_empty());
        let indexes: Vec<usize> = result.diagnostics.iter().map(|d| d.index).collect();
        assert_eq!(indexes, [0, 1, 2, 3]);
    }

    #[test]
    fn non_array_batch_is_contract_violation() {
        let err = UpsertBuilder::default()
            .build(&json!({"_field": "1"}), &plant_table())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Contract);
        assert_eq!(err.message, "batch must be a JSON array, got object");
    }

    #[test]
    fn mapping_used_is_the_given_snapshot() {
        let table = plant_table();
        let result = UpsertBuilder::default().build(&json!([]), &table).unwrap();
        assert!(Arc::ptr_eq(&result.mapping_used, &table));
    }

    #[test]
    fn repeated_builds_are_identical() {
        let batch = json!([
            {"_field": "1", "_time": "t1", "_value": 10},
            {"oops": true},
            {"_field": "42", "_time": "t2", "_value": 0},
        ]);
        let table = plant_table();
        let builder = UpsertBuilder::default();
        let a = serde_json::to_vec(&builder.build(&batch, &table).unwrap()).unwrap();
        let b = serde_json::to_vec(&builder.build(&batch, &table).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn serialized_shape() {
        let table = Arc::new(TagTable::from_pairs([("1", "D100")]));
        let batch = json!([{"_field": "1", "_time": "t1", "_value": 10}, 7]);
        let result = UpsertBuilder::default().build(&batch, &table).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "statements": [{"timestamp": "t1", "tag_name": "D100", "value": 10}],
                "count": 1,
                "mapping_used": {"1": "D100"},
                "diagnostics": [{"index": 1, "reason": {"kind": "not_an_object"}, "record": 7}],
            })
        );
    }
}
