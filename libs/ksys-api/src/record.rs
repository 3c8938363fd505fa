use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// One observed sensor value, as delivered by the measurement source.
///
/// `timestamp` and `value` are carried verbatim: no parsing into an
/// instant, no unit conversion, no rounding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    /// Opaque data identifier (`"1"`..`"9"` on the reference plant).
    pub field_id: String,
    /// ISO-8601 instant as sent upstream.
    pub timestamp: String,
    /// `None` is a reading sent as JSON `null`; it is written as SQL `NULL`.
    pub value: Option<Number>,
}

/// JSON keys that carry the measurement triple inside a raw record.
///
/// Defaults match the upstream time-series export (`_value`, `_field`, `_time`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordKeys {
    #[serde(default = "default_value_key")]
    pub value: String,
    #[serde(default = "default_field_key")]
    pub field: String,
    #[serde(default = "default_time_key")]
    pub time: String,
}

fn default_value_key() -> String {
    "_value".into()
}
fn default_field_key() -> String {
    "_field".into()
}
fn default_time_key() -> String {
    "_time".into()
}

impl Default for RecordKeys {
    fn default() -> Self {
        Self {
            value: default_value_key(),
            field: default_field_key(),
            time: default_time_key(),
        }
    }
}

impl RecordKeys {
    /// Pull a `MeasurementRecord` out of a raw JSON record.
    ///
    /// Presence is checked by key existence, so `0`, `""` and `false` count
    /// as present. The value may be a number, a numeric string or `null`;
    /// other present-but-mistyped entries get their own reason.
    pub fn extract(&self, raw: &Value) -> Result<MeasurementRecord, RejectReason> {
        let obj = raw.as_object().ok_or(RejectReason::NotAnObject)?;

        let value = obj.get(&self.value);
        let field = obj.get(&self.field);
        let time = obj.get(&self.time);

        let (value, field, time) = match (value, field, time) {
            (Some(v), Some(f), Some(t)) => (v, f, t),
            _ => {
                let fields = [(&self.value, value), (&self.field, field), (&self.time, time)]
                    .into_iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(k, _)| k.clone())
                    .collect();
                return Err(RejectReason::MissingFields { fields });
            }
        };

        let value = match value {
            Value::Number(n) => Some(n.clone()),
            Value::String(s) => {
                Some(serde_json::from_str::<Number>(s).map_err(|_| RejectReason::InvalidValue)?)
            }
            Value::Null => None,
            _ => return Err(RejectReason::InvalidValue),
        };
        let field_id = match field {
            Value::String(s) => s.clone(),
            Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
            _ => return Err(RejectReason::InvalidFieldId),
        };
        let timestamp = match time {
            Value::String(s) => s.clone(),
            _ => return Err(RejectReason::InvalidTimestamp),
        };

        Ok(MeasurementRecord { field_id, timestamp, value })
    }
}

/// Why a raw record was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Null, scalar or array where an object was expected.
    NotAnObject,
    /// Keys absent from the object, in value/field/time order.
    MissingFields { fields: Vec<String> },
    /// Value present but neither a number, a numeric string nor `null`.
    InvalidValue,
    /// Field id present but neither a string nor an integer.
    InvalidFieldId,
    /// Timestamp present but not a string.
    InvalidTimestamp,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NotAnObject => f.write_str("record is not an object"),
            RejectReason::MissingFields { fields } => {
                write!(f, "missing fields: {}", fields.join(", "))
            }
            RejectReason::InvalidValue => f.write_str("value is not a number"),
            RejectReason::InvalidFieldId => f.write_str("field id is not a string or integer"),
            RejectReason::InvalidTimestamp => f.write_str("timestamp is not a string"),
        }
    }
}

/// Non-fatal record of a rejected input, kept for the caller to log,
/// alert on or re-queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Zero-based position in the batch.
    pub index: usize,
    pub reason: RejectReason,
    /// The offending record, verbatim.
    pub record: Value,
}
