use std::path::Path;

use ksys_api::{RecordKeys, TargetTable};
use serde::Deserialize;

use crate::error::EngineError;
use crate::tag_table::TagTable;

/// Root configuration.
///
/// ```toml
/// [target]
/// table = "sensor_data"
///
/// [record]
/// field = "_field"
///
/// [tags]
/// 1 = "D100"
/// 2 = "D101"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestConfig {
    /// Destination table and column names.
    #[serde(default)]
    pub target: TargetTable,

    /// Keys of the measurement triple in incoming records.
    #[serde(default)]
    pub record: RecordKeys,

    /// Identifier → tag name. Absent table = every id falls back.
    #[serde(default)]
    pub tags: TagTable,
}

/// Config file format. Selected by file extension.
pub trait ConfigParser: Send + Sync {
    fn extensions(&self) -> &[&str];
    fn parse(&self, content: &str) -> Result<IngestConfig, EngineError>;
}

/// Built-in TOML parser.
pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<IngestConfig, EngineError> {
        toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }
}

impl IngestConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::load_with(path, &[])
    }

    /// Load configuration, picking the parser by file extension.
    ///
    /// TOML is always available; `extra` adds formats (e.g. HCL).
    /// Files without a known extension are read as TOML.
    pub fn load_with(
        path: impl AsRef<Path>,
        extra: &[&dyn ConfigParser],
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let parser: &dyn ConfigParser = extra
            .iter()
            .copied()
            .find(|p| p.extensions().contains(&ext))
            .unwrap_or(&TomlParser);

        let config = parser
            .parse(&content)
            .map_err(|e| e.with_context(path.display()))?;
        config.validate().map_err(|e| e.with_context(path.display()))?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        let config = TomlParser.parse(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Identifiers must be safe to splice into SQL; tag names non-empty.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.target.validate()?;
        self.tags.validate()?;
        Ok(())
    }
}
