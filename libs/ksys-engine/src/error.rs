use ksys_api::IngestError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Ingest(#[from] IngestError),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Ingest` variant, context is added to the inner `IngestError`.
    /// For `Config`, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Ingest(e) => EngineError::Ingest(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
        }
    }
}
