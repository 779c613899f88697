use reqwest::{StatusCode, blocking::Response};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::SpotifyConfig,
    domain::track::Track,
    spotify::{
        Authorizer, Profile, ProfileSource, TokenProvider, TrackSource,
        auth::TokenResponse,
        error::SpotifyError,
        playlist::{ITEM_FIELDS, PAGE_LIMIT, PlaylistItemsPage, parse_playlist_id},
    },
};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_URL: &str = "https://api.spotify.com/v1";

/// Blocking client for the Spotify accounts service and Web API
pub struct SpotifyClient {
    http: reqwest::blocking::Client,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Result<Self, SpotifyError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("trackdle/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            client_id: config.client_id.clone(),
        })
    }

    fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, SpotifyError> {
        let response = self.http.post(TOKEN_URL).form(params).send()?;

        if response.status().is_success() {
            return Ok(response.json()?);
        }

        let status = response.status();
        match response.json::<TokenErrorBody>() {
            Ok(body) => {
                log::error!(
                    "token request rejected ({status}): {} {}",
                    body.error,
                    body.error_description.unwrap_or_default()
                );
                Err(SpotifyError::AuthorizationRejected(body.error))
            }
            Err(_) => Err(SpotifyError::FetchFailed(format!(
                "token endpoint answered {status}"
            ))),
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        tokens: &mut dyn TokenProvider,
    ) -> Result<T, SpotifyError> {
        let token = tokens.access_token()?;
        let response = self.http.get(url).bearer_auth(token).query(query).send()?;
        Self::check_status(url, response)?
            .json()
            .map_err(SpotifyError::from)
    }

    fn check_status(url: &str, response: Response) -> Result<Response, SpotifyError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(SpotifyError::Unauthenticated),
            status => {
                log::warn!("GET {url} -> {status}");
                Err(SpotifyError::FetchFailed(format!("{url} answered {status}")))
            }
        }
    }
}

impl Authorizer for SpotifyClient {
    fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, SpotifyError> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
            ("code_verifier", code_verifier),
        ])
    }

    fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, SpotifyError> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ])
    }
}

impl TrackSource for SpotifyClient {
    fn fetch_playlist_tracks(
        &self,
        tokens: &mut dyn TokenProvider,
        playlist_url: &str,
    ) -> Result<Vec<Track>, SpotifyError> {
        let id = parse_playlist_id(playlist_url)?;

        let first_page = format!("{API_URL}/playlists/{id}/tracks");
        let mut page: PlaylistItemsPage = self.get_json(
            &first_page,
            &[
                ("fields", ITEM_FIELDS.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ],
            tokens,
        )?;

        let mut tracks = Vec::new();
        loop {
            let next = page.next.take();
            tracks.extend(page.into_tracks());
            match next {
                // next page urls already carry the query
                Some(url) => page = self.get_json(&url, &[], tokens)?,
                None => break,
            }
        }

        log::info!("fetched {} tracks from playlist {id}", tracks.len());
        Ok(tracks)
    }
}

impl ProfileSource for SpotifyClient {
    fn current_user(&self, tokens: &mut dyn TokenProvider) -> Result<Profile, SpotifyError> {
        self.get_json(&format!("{API_URL}/me"), &[], tokens)
    }
}
