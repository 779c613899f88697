use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no tracks are loaded")]
    NotLoaded,

    #[error("playlist contains no tracks")]
    EmptyPlaylist,

    #[error("guess is empty")]
    EmptyGuess,

    #[error("round is already over")]
    RoundNotInProgress,

    #[error("invalid clip schedule: {0}")]
    InvalidSchedule(String),
}
