pub mod builder;
pub mod config;
pub mod error;
pub mod tag_table;

pub use builder::{BuildResult, UpsertBuilder};
pub use config::{ConfigParser, IngestConfig, TomlParser};
pub use error::EngineError;
pub use tag_table::{FALLBACK_PREFIX, TagTable, TagTableHandle};
