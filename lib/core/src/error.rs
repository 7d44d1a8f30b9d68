use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input for field '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("Category encoder used before it was fitted")]
    InvalidEncoder,

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Model not loaded")]
    ServiceUnavailable,

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Errors caused by the caller's payload rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
