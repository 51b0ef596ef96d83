use thiserror::Error;

/// Errors surfaced by encounter operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("malformed encounter document: {0}")]
    MalformedImport(String),
    #[error("combatant id {0} is already on the roster")]
    DuplicateId(String),
    #[error("no combatant with id {0}")]
    UnknownCombatant(String),
    #[error("no marker with id {0}")]
    UnknownMarker(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
