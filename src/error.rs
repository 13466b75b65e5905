use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("source failure: {0}")]
    Source(String),

    #[error("sink failure: {0}")]
    Sink(String),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config Error: {0}")]
    ConfigError(#[from] serde_yaml::Error),
}

impl Error {
    #[inline]
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Error::MalformedRow {
            line,
            reason: reason.into(),
        }
    }
}
