//! Spotify authorization code flow with PKCE, and session token refresh

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{
    config::SpotifyConfig,
    spotify::{Authorizer, TokenProvider, error::SpotifyError},
};

pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";

pub const SCOPES: &str =
    "user-read-email playlist-read-private streaming user-modify-playback-state user-read-playback-state";

/// tokens are refreshed when they expire within this window
const REFRESH_MARGIN_SECS: i64 = 60;

/// Verifier and state kept in the session between `/login` and the callback
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub code_verifier: String,
    pub state: String,
    pub redirect_uri: String,
}

impl PendingLogin {
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 64];
        rng.fill_bytes(&mut verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill_bytes(&mut state_bytes);

        Self {
            code_verifier: URL_SAFE_NO_PAD.encode(verifier_bytes),
            state: to_hex(&state_bytes),
            redirect_uri: redirect_uri.into(),
        }
    }

    pub fn code_challenge(&self) -> String {
        code_challenge(&self.code_verifier)
    }

    /// Spotify authorize page for this login attempt
    pub fn authorize_url(&self, config: &SpotifyConfig) -> Result<String, SpotifyError> {
        let url = reqwest::Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", self.code_challenge().as_str()),
                ("state", self.state.as_str()),
                ("scope", SCOPES),
            ],
        )
        .map_err(|e| SpotifyError::Config(e.to_string()))?;
        Ok(url.to_string())
    }
}

/// S256 challenge: base64url(sha256(verifier)) without padding
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Body of a successful `/api/token` response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            expires_at: now + Duration::seconds(response.expires_in),
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
        }
    }

    /// Applies a refresh response.
    ///
    /// Spotify does not always rotate the refresh token, the old one stays
    /// valid in that case.
    pub fn apply_refresh(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.access_token = response.access_token;
        self.expires_in = response.expires_in;
        self.expires_at = now + Duration::seconds(response.expires_in);
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
    }

    pub fn expires_soon(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now < Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Access token of one browser session, refreshed on demand
pub struct SessionTokenProvider<'a, A: Authorizer + ?Sized> {
    tokens: &'a mut Option<TokenSet>,
    authorizer: &'a A,
}

impl<'a, A: Authorizer + ?Sized> SessionTokenProvider<'a, A> {
    pub fn new(tokens: &'a mut Option<TokenSet>, authorizer: &'a A) -> Self {
        Self { tokens, authorizer }
    }
}

impl<A: Authorizer + ?Sized> TokenProvider for SessionTokenProvider<'_, A> {
    fn access_token(&mut self) -> Result<String, SpotifyError> {
        let tokens = self.tokens.as_mut().ok_or(SpotifyError::Unauthenticated)?;

        let now = Utc::now();
        if tokens.expires_soon(now) {
            let refresh_token = tokens
                .refresh_token
                .clone()
                .ok_or(SpotifyError::Unauthenticated)?;
            log::debug!("refreshing Spotify access token");
            let response = self.authorizer.refresh(&refresh_token)?;
            tokens.apply_refresh(response, Utc::now());
        }

        Ok(tokens.access_token.clone())
    }
}
