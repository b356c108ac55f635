use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("Unknown record kind: {0}")]
    UnknownKind(String),

    #[error("Identifier must not be empty")]
    EmptyId,
}
