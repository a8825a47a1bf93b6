use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvSolarError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for EvSolarError {
    fn from(e: serde_json::Error) -> Self {
        EvSolarError::SerializationError(e.to_string())
    }
}
