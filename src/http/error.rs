use rouille::Response;
use serde::Serialize;

use crate::{game::error::GameError, spotify::error::SpotifyError};

/// Error answered by the JSON API, carrying a short machine readable code
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::NotLoaded => ApiError::Conflict("not_loaded".into()),
            GameError::EmptyPlaylist => ApiError::BadRequest("empty_playlist".into()),
            GameError::EmptyGuess => ApiError::BadRequest("empty_guess".into()),
            GameError::RoundNotInProgress => ApiError::Conflict("round_not_in_progress".into()),
            GameError::InvalidSchedule(_) => ApiError::Internal("internal_error".into()),
        }
    }
}

impl From<SpotifyError> for ApiError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Unauthenticated => ApiError::Unauthorized("not_logged_in".into()),
            SpotifyError::InvalidPlaylistUrl(_) => {
                ApiError::BadRequest("invalid_playlist_url".into())
            }
            SpotifyError::InvalidState => ApiError::BadRequest("invalid_state".into()),
            SpotifyError::AuthorizationRejected(_) => {
                ApiError::Unauthorized("authorization_rejected".into())
            }
            SpotifyError::FetchFailed(_) => ApiError::Internal("failed_fetch".into()),
            SpotifyError::Config(_) => ApiError::Internal("internal_error".into()),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ApiError::BadRequest(code)
            | ApiError::Unauthorized(code)
            | ApiError::Conflict(code)
            | ApiError::Internal(code) => code,
        }
    }

    pub fn into_response(self) -> Response {
        Response::json(&ErrorBody { error: self.code() }).with_status_code(self.status_code())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status_code(), self.code())
    }
}
