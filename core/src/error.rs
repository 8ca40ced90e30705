use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Game is over: {reason}")]
    GameOver { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
