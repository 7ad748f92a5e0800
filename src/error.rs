use thiserror::Error;

/// Reasons a routine cannot be handed to the player.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("routine id not provided")]
    MissingId,

    #[error("routine '{0}' not found")]
    NotFound(String),

    #[error("routine '{0}' is not built in and no user is signed in")]
    Unauthenticated(String),

    #[error("routine '{id}' is malformed: {reason}")]
    Invalid { id: String, reason: String },

    #[error("failed to fetch routine '{id}'")]
    Store {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl LoadError {
    pub fn invalid(id: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::Invalid {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the async player driver.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("cannot play routine: {0}")]
    Load(#[from] LoadError),

    #[error("no routine session is active")]
    NoSession,

    #[error("a routine session is already active")]
    AlreadyActive,
}
