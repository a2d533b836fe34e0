use thiserror::Error;

#[derive(Debug, Error)]
pub enum GsdError {
    #[error("STATE.md not found")]
    StateNotFound,

    #[error("unknown schema: {0} (expected one of: plan, summary)")]
    UnknownSchema(String),

    #[error("Cannot parse: {0}")]
    CannotParse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GsdError>;
