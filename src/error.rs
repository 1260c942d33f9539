use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record at byte {offset}: {message}")]
    MalformedRecord { offset: u64, message: String },

    #[error("Invalid temperature field: '{field}'")]
    InvalidTemperature { field: String },

    #[error("Record exceeds chunk buffer of {buffer_size} bytes; increase the chunk size")]
    OversizedRecord { buffer_size: usize },

    #[error("Input ends with an unterminated record of {length} bytes")]
    UnterminatedRecord { length: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker failure: {0}")]
    WorkerFailure(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ProcessingError {
    pub(crate) fn malformed(offset: u64, message: impl Into<String>) -> Self {
        ProcessingError::MalformedRecord {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_temperature(field: &[u8]) -> Self {
        ProcessingError::InvalidTemperature {
            field: String::from_utf8_lossy(field).into_owned(),
        }
    }
}
