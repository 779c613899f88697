//! Spotify collaborators: authorization, tokens, playlists and profiles

use serde::{Deserialize, Serialize};

use crate::domain::track::Track;

pub mod auth;
pub mod client;
pub mod error;
pub mod playlist;

use auth::TokenResponse;
use error::SpotifyError;

/// Bearer token source, refreshing transparently where it can
pub trait TokenProvider {
    fn access_token(&mut self) -> Result<String, SpotifyError>;
}

/// Token endpoint of the authorization code flow
pub trait Authorizer {
    fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, SpotifyError>;

    fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, SpotifyError>;
}

pub trait TrackSource {
    fn fetch_playlist_tracks(
        &self,
        tokens: &mut dyn TokenProvider,
        playlist_url: &str,
    ) -> Result<Vec<Track>, SpotifyError>;
}

pub trait ProfileSource {
    fn current_user(&self, tokens: &mut dyn TokenProvider) -> Result<Profile, SpotifyError>;
}

/// Everything the HTTP server needs from Spotify
pub trait SpotifyApi: Authorizer + TrackSource + ProfileSource + Send + Sync {}

impl<T> SpotifyApi for T where T: Authorizer + TrackSource + ProfileSource + Send + Sync {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Profile {
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}
