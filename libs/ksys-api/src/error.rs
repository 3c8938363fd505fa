use std::fmt;

/// Error kind for ingest errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller handed over something that is not a batch at all.
    Contract,
    /// Invalid configuration (identifiers, tag table). Fail at startup.
    Config,
    /// Unparseable input payload.
    Format,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Contract => f.write_str("contract"),
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Format => f.write_str("format"),
        }
    }
}

/// Ingest error, returned by everything that can fail outside the
/// per-record diagnostic path.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestError {
    pub kind: ErrorKind,
    pub message: String,
}

impl IngestError {
    pub fn contract(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Contract, message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for IngestError {}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        Self::format(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_prepended_and_kind_kept() {
        let err = IngestError::config("identifier is empty").with_context("target.table");
        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(err.to_string(), "config: target.table: identifier is empty");
    }

    #[test]
    fn json_errors_are_format_errors() {
        let err: IngestError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::Format);
    }
}
