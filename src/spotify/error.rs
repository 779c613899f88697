use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("not logged in to Spotify")]
    Unauthenticated,

    #[error("invalid playlist url: {0}")]
    InvalidPlaylistUrl(String),

    #[error("login state does not match")]
    InvalidState,

    #[error("Spotify rejected the authorization: {0}")]
    AuthorizationRejected(String),

    #[error("fetching from Spotify failed: {0}")]
    FetchFailed(String),

    #[error("invalid Spotify configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SpotifyError {
    fn from(err: reqwest::Error) -> Self {
        SpotifyError::FetchFailed(err.to_string())
    }
}
