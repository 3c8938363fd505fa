use ksys_api::IngestError;
use ksys_engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Ingest(#[from] IngestError),

    #[error("input ({context}): {detail}")]
    Input { context: &'static str, detail: String },

    #[error("output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
