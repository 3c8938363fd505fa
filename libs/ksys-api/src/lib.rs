//! Data contract of the ingest pipeline: what comes in from the
//! measurement source, what goes out to the time-series store.

pub mod error;
pub mod record;
pub mod statement;
pub mod target;

pub use error::{ErrorKind, IngestError};
pub use record::{Diagnostic, MeasurementRecord, RecordKeys, RejectReason};
pub use statement::{ParameterizedBatch, SqlParam, UpsertStatement};
pub use target::TargetTable;
