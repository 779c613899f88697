use log::info;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::{Config, HttpConfig, SpotifyConfig},
    domain::track::Track,
    game::{
        Game,
        round::{GuessRecord, GuessRound, Outcome},
        schedule::ClipSchedule,
    },
    http::{error::ApiError, session::SessionStore},
    spotify::{
        SpotifyApi, TokenProvider,
        auth::{PendingLogin, SessionTokenProvider, TokenSet},
        error::SpotifyError,
        playlist::parse_playlist_id,
    },
};

pub const SESSION_COOKIE: &str = "trackdle_sid";
const SESSION_TIMEOUT_S: u64 = 3600;

pub struct HttpServer {
    sessions: SessionStore,
    spotify: Arc<dyn SpotifyApi>,
    spotify_config: SpotifyConfig,
    redirect_uri: String,
    schedule: ClipSchedule,
    suggestion_limit: usize,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(cfg: &Config, spotify: Arc<dyn SpotifyApi>) -> anyhow::Result<Self> {
        Ok(Self {
            sessions: SessionStore::new(chrono::Duration::seconds(SESSION_TIMEOUT_S as i64)),
            spotify,
            spotify_config: cfg.spotify.clone(),
            redirect_uri: cfg.redirect_uri(),
            schedule: cfg.game.clip_schedule()?,
            suggestion_limit: cfg.game.suggestion_limit,
            config: cfg.http.clone(),
        })
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::session::session(request, SESSION_COOKIE, SESSION_TIMEOUT_S, |session| {
            let sid = session.id();

            rouille::router!(request,
                (GET) (/) => {
                    Response::html(include_str!("../../html/index.html"))
                },
                (GET) (/login) => {
                    self.handle_login(sid)
                },
                (GET) (/callback) => {
                    self.handle_callback(sid, request)
                },
                (GET) (/auth/callback) => {
                    self.handle_callback(sid, request)
                },
                (GET) (/logout) => {
                    self.handle_logout(sid)
                },
                (GET) (/token) => {
                    Self::respond(self.get_token(sid))
                },
                (GET) (/api/me) => {
                    Self::respond(self.get_profile(sid))
                },
                (POST) (/api/playlist) => {
                    Self::respond(self.load_playlist(sid, request))
                },
                (GET) (/api/round) => {
                    Self::respond(self.get_round(sid))
                },
                (POST) (/api/round) => {
                    Self::respond(self.new_round(sid))
                },
                (GET) (/api/clip) => {
                    Self::respond(self.get_clip(sid))
                },
                (POST) (/api/guess) => {
                    Self::respond(self.submit_guess(sid, request))
                },
                (POST) (/api/giveup) => {
                    Self::respond(self.give_up(sid))
                },
                (GET) (/api/suggest) => {
                    Self::respond(self.suggest(sid, request))
                },
                _ => Response::empty_404()
            )
        });

        info!("Response: {} {} {}", request.method(), request.url(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn respond(result: Result<Response, ApiError>) -> Response {
        match result {
            Ok(response) => response,
            Err(e) => {
                log::debug!("API error: {e}");
                e.into_response()
            }
        }
    }

    fn handle_login(&self, sid: &str) -> Response {
        let login = PendingLogin::new(self.redirect_uri.clone());
        let url = match login.authorize_url(&self.spotify_config) {
            Ok(url) => url,
            Err(e) => {
                log::error!("could not build authorize url: {e}");
                return Response::text("Invalid Spotify configuration").with_status_code(500);
            }
        };

        match self.sessions.with_session(sid, |session| session.pending_login = Some(login)) {
            Ok(()) => Response::redirect_302(url),
            Err(e) => e.into_response(),
        }
    }

    fn handle_callback(&self, sid: &str, request: &Request) -> Response {
        let code = request.get_param("code");
        let state = request.get_param("state");

        // the pending login is consumed only when the state matches
        let login = self.sessions.with_existing(sid, |session| {
            let state_matches = session
                .pending_login
                .as_ref()
                .is_some_and(|login| state.as_deref() == Some(login.state.as_str()));
            if state_matches {
                session.pending_login.take()
            } else {
                None
            }
        });
        let (code, login) = match (code, login.map(Option::flatten)) {
            (Some(code), Ok(Some(login))) => (code, login),
            (_, Err(e)) => return e.into_response(),
            _ => {
                log::warn!("OAuth callback with missing code or mismatching state");
                return Response::text("Invalid state").with_status_code(400);
            }
        };

        match self
            .spotify
            .exchange_code(&code, &login.code_verifier, &login.redirect_uri)
        {
            Ok(response) => {
                let tokens = TokenSet::from_response(response, chrono::Utc::now());
                match self.sessions.with_session(sid, |session| session.tokens = Some(tokens)) {
                    Ok(()) => Response::redirect_302("/"),
                    Err(e) => e.into_response(),
                }
            }
            Err(SpotifyError::AuthorizationRejected(error)) if error == "invalid_client" => {
                Response::text(format!(
                    "Invalid client or redirect URI. Make sure the Redirect URI configured in your \
                     Spotify app matches the redirect URI used during login: {}",
                    login.redirect_uri
                ))
                .with_status_code(400)
            }
            Err(e) => {
                log::error!("token exchange failed: {e}");
                Response::text("Token exchange failed").with_status_code(500)
            }
        }
    }

    fn handle_logout(&self, sid: &str) -> Response {
        match self.sessions.remove(sid) {
            Ok(()) => Response::redirect_302("/"),
            Err(e) => e.into_response(),
        }
    }

    /// Runs `f` with the session's token provider, outside of the session lock.
    ///
    /// Refreshed tokens are written back unless the session logged out meanwhile.
    fn with_tokens<T>(
        &self,
        sid: &str,
        f: impl FnOnce(&mut dyn TokenProvider) -> Result<T, SpotifyError>,
    ) -> Result<T, ApiError> {
        let mut tokens = self
            .sessions
            .with_existing(sid, |session| session.tokens.clone())?
            .flatten();
        if tokens.is_none() {
            return Err(SpotifyError::Unauthenticated.into());
        }

        let result = {
            let mut provider = SessionTokenProvider::new(&mut tokens, self.spotify.as_ref());
            f(&mut provider)
        };

        self.sessions.with_existing(sid, |session| {
            if session.tokens.is_some() {
                session.tokens = tokens;
            }
        })?;

        result.map_err(ApiError::from)
    }

    fn is_logged_in(&self, sid: &str) -> Result<bool, ApiError> {
        Ok(self
            .sessions
            .with_existing(sid, |session| session.tokens.is_some())?
            .unwrap_or(false))
    }

    /// 401 only without tokens; any failure to refresh them is a 500
    fn get_token(&self, sid: &str) -> Result<Response, ApiError> {
        if !self.is_logged_in(sid)? {
            return Err(SpotifyError::Unauthenticated.into());
        }
        let access_token = self
            .with_tokens(sid, |tokens| tokens.access_token())
            .map_err(|e| {
                log::error!("token error: {e}");
                ApiError::Internal("token_error".into())
            })?;
        let expires_in = self
            .sessions
            .with_existing(sid, |session| {
                session.tokens.as_ref().map(|tokens| tokens.expires_in)
            })?
            .flatten();

        Ok(Response::json(&TokenResponseBody {
            access_token,
            expires_in,
        }))
    }

    fn get_profile(&self, sid: &str) -> Result<Response, ApiError> {
        let profile = self.with_tokens(sid, |tokens| self.spotify.current_user(tokens))?;
        info!("session belongs to {}", profile.shown_name());
        Ok(Response::json(&profile))
    }

    fn load_playlist(&self, sid: &str, request: &Request) -> Result<Response, ApiError> {
        if !self.is_logged_in(sid)? {
            return Err(SpotifyError::Unauthenticated.into());
        }
        let body: PlaylistRequest = rouille::input::json_input(request)
            .map_err(|_| ApiError::BadRequest("invalid_body".into()))?;
        let playlist_url = body
            .playlist_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::BadRequest("missing_playlistUrl".into()))?;

        let tracks = self.with_tokens(sid, |tokens| {
            parse_playlist_id(&playlist_url)?;
            self.spotify.fetch_playlist_tracks(tokens, &playlist_url)
        });
        let tracks = tracks.inspect_err(|e| log::error!("playlist fetch error: {e}"))?;

        let game = Game::new(tracks, self.schedule.clone())?;
        let body = PlaylistResponse {
            tracks: game.repository().tracks(),
            round: RoundView::from_round(game.round()),
        };
        let response = Response::json(&body);

        self.sessions.with_session(sid, |session| session.game = Some(game))?;
        Ok(response)
    }

    /// Runs `f` against the session's game
    fn with_game<T>(
        &self,
        sid: &str,
        f: impl FnOnce(&mut Game) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        self.sessions
            .with_existing(sid, |session| session.game.as_mut().map(f))?
            .flatten()
            .unwrap_or_else(|| Err(ApiError::Conflict("not_loaded".into())))
    }

    fn get_round(&self, sid: &str) -> Result<Response, ApiError> {
        self.with_game(sid, |game| {
            Ok(Response::json(&RoundView::from_round(game.round())))
        })
    }

    fn new_round(&self, sid: &str) -> Result<Response, ApiError> {
        self.with_game(sid, |game| {
            let round = game.new_round()?;
            Ok(Response::json(&RoundView::from_round(round)))
        })
    }

    fn get_clip(&self, sid: &str) -> Result<Response, ApiError> {
        self.with_game(sid, |game| {
            let round = game.round();
            Ok(Response::json(&ClipView {
                clip_seconds: round.current_clip_length(),
                preview_url: round.answer().preview_url.as_deref(),
                uri: &round.answer().uri,
            }))
        })
    }

    fn submit_guess(&self, sid: &str, request: &Request) -> Result<Response, ApiError> {
        let body: GuessRequest = rouille::input::json_input(request)
            .map_err(|_| ApiError::BadRequest("invalid_body".into()))?;

        self.with_game(sid, |game| {
            let record = game.guess(&body.guess)?;
            Ok(Response::json(&GuessResponse {
                record: &record,
                round: RoundView::from_round(game.round()),
            }))
        })
    }

    fn give_up(&self, sid: &str) -> Result<Response, ApiError> {
        self.with_game(sid, |game| {
            game.give_up()?;
            Ok(Response::json(&RoundView::from_round(game.round())))
        })
    }

    fn suggest(&self, sid: &str, request: &Request) -> Result<Response, ApiError> {
        let query = request.get_param("q").unwrap_or_default();
        self.with_game(sid, |game| {
            Ok(Response::json(&SuggestResponse {
                suggestions: game.suggest(&query, self.suggestion_limit),
            }))
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistRequest {
    playlist_url: Option<String>,
}

#[derive(Deserialize)]
struct GuessRequest {
    #[serde(default)]
    guess: String,
}

#[derive(Serialize)]
struct TokenResponseBody {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Serialize)]
struct PlaylistResponse<'a> {
    tracks: &'a [Track],
    round: RoundView<'a>,
}

#[derive(Serialize)]
struct ClipView<'a> {
    clip_seconds: u32,
    preview_url: Option<&'a str>,
    uri: &'a str,
}

#[derive(Serialize)]
struct GuessResponse<'a> {
    record: &'a GuessRecord,
    round: RoundView<'a>,
}

#[derive(Serialize)]
struct SuggestResponse {
    suggestions: Vec<String>,
}

/// What the page shows about a round; the answer only once it is over
#[derive(Serialize)]
struct RoundView<'a> {
    outcome: Outcome,
    attempt: usize,
    max_attempts: usize,
    remaining_attempts: usize,
    clip_seconds: u32,
    history: &'a [GuessRecord],
    answer: Option<&'a Track>,
}

impl<'a> RoundView<'a> {
    fn from_round(round: &'a GuessRound) -> Self {
        Self {
            outcome: round.outcome(),
            attempt: round.attempt_index(),
            max_attempts: round.max_attempts(),
            remaining_attempts: round.remaining_attempts(),
            clip_seconds: round.current_clip_length(),
            history: round.history(),
            answer: round.revealed_answer(),
        }
    }
}

#[cfg(test)]
pub fn parse_json_response(response: rouille::Response) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GameConfig,
        spotify::{
            Authorizer, Profile, ProfileSource, TrackSource, auth::TokenResponse,
        },
    };
    use std::io::Read;

    const TEST_SID: &str = "test-session";

    struct FakeSpotify {
        tracks: Vec<Track>,
    }

    impl Authorizer for FakeSpotify {
        fn exchange_code(
            &self,
            code: &str,
            _code_verifier: &str,
            _redirect_uri: &str,
        ) -> Result<TokenResponse, SpotifyError> {
            match code {
                "good-code" => Ok(TokenResponse {
                    access_token: "fake-access".into(),
                    refresh_token: Some("fake-refresh".into()),
                    expires_in: 3600,
                }),
                "bad-client" => Err(SpotifyError::AuthorizationRejected("invalid_client".into())),
                _ => Err(SpotifyError::AuthorizationRejected("invalid_grant".into())),
            }
        }

        fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, SpotifyError> {
            if refresh_token == "revoked-refresh" {
                return Err(SpotifyError::AuthorizationRejected("invalid_grant".into()));
            }
            Ok(TokenResponse {
                access_token: "refreshed-access".into(),
                refresh_token: None,
                expires_in: 3600,
            })
        }
    }

    impl TrackSource for FakeSpotify {
        fn fetch_playlist_tracks(
            &self,
            tokens: &mut dyn TokenProvider,
            playlist_url: &str,
        ) -> Result<Vec<Track>, SpotifyError> {
            tokens.access_token()?;
            if playlist_url.contains("broken") {
                return Err(SpotifyError::FetchFailed("500".into()));
            }
            Ok(self.tracks.clone())
        }
    }

    impl ProfileSource for FakeSpotify {
        fn current_user(&self, tokens: &mut dyn TokenProvider) -> Result<Profile, SpotifyError> {
            tokens.access_token()?;
            Ok(Profile {
                id: "user-1".into(),
                display_name: Some("Test User".into()),
                email: None,
            })
        }
    }

    fn test_config() -> Config {
        Config {
            version: 1,
            http: HttpConfig {
                bind_addr: "127.0.0.1".into(),
                port: 3000,
            },
            spotify: SpotifyConfig {
                client_id: "client-123".into(),
                redirect_uri: None,
            },
            game: GameConfig::default(),
        }
    }

    fn create_server(tracks: Vec<Track>) -> HttpServer {
        HttpServer::new(&test_config(), Arc::new(FakeSpotify { tracks })).unwrap()
    }

    fn one_track_server() -> HttpServer {
        create_server(vec![
            Track::new("t1", "Only Track (Remastered)", "spotify:track:t1")
                .with_artists(["The Band"])
                .with_preview_url("https://p.scdn.co/mp3-preview/t1"),
        ])
    }

    fn log_in(server: &HttpServer) {
        log_in_with(server, Some("fake-refresh"), 3600);
    }

    fn log_in_with(server: &HttpServer, refresh_token: Option<&str>, expires_in: i64) {
        server
            .sessions
            .with_session(TEST_SID, |session| {
                session.tokens = Some(TokenSet::from_response(
                    TokenResponse {
                        access_token: "fake-access".into(),
                        refresh_token: refresh_token.map(str::to_owned),
                        expires_in,
                    },
                    chrono::Utc::now(),
                ))
            })
            .unwrap();
    }

    fn cookie() -> (String, String) {
        ("Cookie".to_owned(), format!("{SESSION_COOKIE}={TEST_SID}"))
    }

    fn get(server: &HttpServer, url: &str) -> Response {
        server.handle_request(&Request::fake_http("GET", url, vec![cookie()], vec![]))
    }

    fn post_json(server: &HttpServer, url: &str, body: serde_json::Value) -> Response {
        let request = Request::fake_http(
            "POST",
            url,
            vec![
                cookie(),
                ("Content-Type".to_owned(), "application/json".to_owned()),
            ],
            body.to_string().into_bytes(),
        );
        server.handle_request(&request)
    }

    fn post_empty(server: &HttpServer, url: &str) -> Response {
        server.handle_request(&Request::fake_http("POST", url, vec![cookie()], vec![]))
    }

    fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
        response
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_ref())
    }

    fn load_playlist(server: &HttpServer) -> serde_json::Value {
        let response = post_json(
            server,
            "/api/playlist",
            serde_json::json!({"playlistUrl": "https://open.spotify.com/playlist/abc123"}),
        );
        assert_eq!(response.status_code, 200);
        parse_json_response(response).unwrap()
    }

    // --------------------------------------------------
    // ✅ AUTH
    // --------------------------------------------------

    #[test]
    fn test_index_page() {
        let server = one_track_server();

        let response = get(&server, "/");

        assert_eq!(response.status_code, 200);
    }

    #[test]
    fn test_login_callback_flow() -> anyhow::Result<()> {
        let server = one_track_server();

        let response = get(&server, "/login");
        assert_eq!(response.status_code, 302);

        let location = reqwest::Url::parse(header(&response, "Location").unwrap())?;
        assert_eq!(location.host_str(), Some("accounts.spotify.com"));
        let state = location
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap();

        let response = get(&server, &format!("/callback?code=good-code&state={state}"));
        assert_eq!(response.status_code, 302);
        assert_eq!(header(&response, "Location"), Some("/"));

        let response = get(&server, "/token");
        assert_eq!(response.status_code, 200);
        let body = parse_json_response(response)?;
        assert_eq!(body["access_token"], "fake-access");
        assert_eq!(body["expires_in"], 3600);

        Ok(())
    }

    #[test]
    fn test_callback_rejects_wrong_state() -> anyhow::Result<()> {
        let server = one_track_server();
        get(&server, "/login");

        let response = get(&server, "/auth/callback?code=good-code&state=forged");
        assert_eq!(response.status_code, 400);

        let mut body = String::new();
        response.data.into_reader_and_size().0.read_to_string(&mut body)?;
        assert!(body.contains("Invalid state"));

        assert_eq!(get(&server, "/token").status_code, 401);

        Ok(())
    }

    #[test]
    fn test_callback_without_login() {
        let server = one_track_server();

        let response = get(&server, "/callback?code=good-code&state=anything");

        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn test_callback_invalid_client() -> anyhow::Result<()> {
        let server = one_track_server();
        let location = header(&get(&server, "/login"), "Location").unwrap().to_string();
        let state = reqwest::Url::parse(&location)?
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap();

        let response = get(&server, &format!("/callback?code=bad-client&state={state}"));
        assert_eq!(response.status_code, 400);

        let mut body = String::new();
        response.data.into_reader_and_size().0.read_to_string(&mut body)?;
        assert!(body.contains("http://127.0.0.1:3000/callback"));

        Ok(())
    }

    #[test]
    fn test_logged_out_requests() -> anyhow::Result<()> {
        let server = one_track_server();

        let response = get(&server, "/token");
        assert_eq!(response.status_code, 401);
        assert_eq!(parse_json_response(response)?["error"], "not_logged_in");

        assert_eq!(get(&server, "/api/me").status_code, 401);

        let response = post_json(
            &server,
            "/api/playlist",
            serde_json::json!({"playlistUrl": "https://open.spotify.com/playlist/abc123"}),
        );
        assert_eq!(response.status_code, 401);

        let response = post_json(&server, "/api/playlist", serde_json::json!({}));
        assert_eq!(response.status_code, 401);
        assert_eq!(parse_json_response(response)?["error"], "not_logged_in");

        Ok(())
    }

    #[test]
    fn test_token_refresh_failure() -> anyhow::Result<()> {
        let server = one_track_server();

        log_in_with(&server, Some("revoked-refresh"), 0);
        let response = get(&server, "/token");
        assert_eq!(response.status_code, 500);
        assert_eq!(parse_json_response(response)?["error"], "token_error");

        log_in_with(&server, None, 0);
        let response = get(&server, "/token");
        assert_eq!(response.status_code, 500);
        assert_eq!(parse_json_response(response)?["error"], "token_error");

        log_in_with(&server, Some("fake-refresh"), 0);
        let body = parse_json_response(get(&server, "/token"))?;
        assert_eq!(body["access_token"], "refreshed-access");

        Ok(())
    }

    #[test]
    fn test_requests_without_cookie_create_no_session() {
        let server = one_track_server();

        for url in ["/api/round", "/token", "/api/me", "/api/clip", "/api/suggest?q=a"] {
            for _ in 0..10 {
                server.handle_request(&Request::fake_http("GET", url, vec![], vec![]));
            }
        }

        assert_eq!(server.sessions.len(), 0);
    }

    #[test]
    fn test_logout_drops_session() {
        let server = one_track_server();
        log_in(&server);
        assert_eq!(get(&server, "/token").status_code, 200);

        let response = get(&server, "/logout");
        assert_eq!(response.status_code, 302);

        assert_eq!(get(&server, "/token").status_code, 401);
    }

    #[test]
    fn test_profile() -> anyhow::Result<()> {
        let server = one_track_server();
        log_in(&server);

        let response = get(&server, "/api/me");
        assert_eq!(response.status_code, 200);
        assert_eq!(parse_json_response(response)?["display_name"], "Test User");

        Ok(())
    }

    // --------------------------------------------------
    // ❌ PLAYLIST
    // --------------------------------------------------

    #[test]
    fn test_playlist_bad_requests() -> anyhow::Result<()> {
        let server = one_track_server();
        log_in(&server);

        let response = post_json(&server, "/api/playlist", serde_json::json!({}));
        assert_eq!(response.status_code, 400);
        assert_eq!(parse_json_response(response)?["error"], "missing_playlistUrl");

        let response = post_json(
            &server,
            "/api/playlist",
            serde_json::json!({"playlistUrl": "https://open.spotify.com/album/xyz"}),
        );
        assert_eq!(response.status_code, 400);
        assert_eq!(parse_json_response(response)?["error"], "invalid_playlist_url");

        let response = post_json(
            &server,
            "/api/playlist",
            serde_json::json!({"playlistUrl": "https://open.spotify.com/playlist/broken"}),
        );
        assert_eq!(response.status_code, 500);
        assert_eq!(parse_json_response(response)?["error"], "failed_fetch");

        Ok(())
    }

    #[test]
    fn test_empty_playlist() -> anyhow::Result<()> {
        let server = create_server(vec![]);
        log_in(&server);

        let response = post_json(
            &server,
            "/api/playlist",
            serde_json::json!({"playlistUrl": "https://open.spotify.com/playlist/abc123"}),
        );

        assert_eq!(response.status_code, 400);
        assert_eq!(parse_json_response(response)?["error"], "empty_playlist");

        Ok(())
    }

    #[test]
    fn test_round_before_playlist() {
        let server = one_track_server();

        let response = get(&server, "/api/round");

        assert_eq!(response.status_code, 409);
    }

    // --------------------------------------------------
    // ✅ GAME
    // --------------------------------------------------

    #[test]
    fn test_load_playlist_starts_round() {
        let server = one_track_server();
        log_in(&server);

        let body = load_playlist(&server);

        assert_eq!(body["tracks"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["round"]["outcome"], "in_progress");
        assert_eq!(body["round"]["remaining_attempts"], 6);
        assert_eq!(body["round"]["clip_seconds"], 1);
        assert!(body["round"]["answer"].is_null());
    }

    #[test]
    fn test_guess_flow() -> anyhow::Result<()> {
        let server = one_track_server();
        log_in(&server);
        load_playlist(&server);

        let response = post_json(&server, "/api/guess", serde_json::json!({"guess": "Wrong"}));
        assert_eq!(response.status_code, 200);
        let body = parse_json_response(response)?;
        assert_eq!(body["record"]["is_correct"], false);
        assert_eq!(body["round"]["attempt"], 1);
        assert_eq!(body["round"]["clip_seconds"], 3);

        let clip = parse_json_response(get(&server, "/api/clip"))?;
        assert_eq!(clip["clip_seconds"], 3);
        assert_eq!(clip["uri"], "spotify:track:t1");

        let response = post_json(&server, "/api/guess", serde_json::json!({"guess": "  "}));
        assert_eq!(response.status_code, 400);
        assert_eq!(parse_json_response(response)?["error"], "empty_guess");

        let response = post_json(&server, "/api/guess", serde_json::json!({"guess": "only track"}));
        let body = parse_json_response(response)?;
        assert_eq!(body["record"]["is_correct"], true);
        assert_eq!(body["record"]["matched_track"]["id"], "t1");
        assert_eq!(body["round"]["outcome"], "won");
        assert_eq!(body["round"]["answer"]["title"], "Only Track (Remastered)");

        let response = post_json(&server, "/api/guess", serde_json::json!({"guess": "again"}));
        assert_eq!(response.status_code, 409);
        assert_eq!(parse_json_response(response)?["error"], "round_not_in_progress");

        Ok(())
    }

    #[test]
    fn test_give_up_and_new_round() -> anyhow::Result<()> {
        let server = one_track_server();
        log_in(&server);
        load_playlist(&server);

        let response = post_empty(&server, "/api/giveup");
        assert_eq!(response.status_code, 200);
        let body = parse_json_response(response)?;
        assert_eq!(body["outcome"], "gave_up");
        assert_eq!(body["remaining_attempts"], 0);
        assert_eq!(body["history"].as_array().map(Vec::len), Some(0));
        assert_eq!(body["answer"]["id"], "t1");

        assert_eq!(post_empty(&server, "/api/giveup").status_code, 409);

        let response = post_empty(&server, "/api/round");
        let body = parse_json_response(response)?;
        assert_eq!(body["outcome"], "in_progress");
        assert_eq!(body["attempt"], 0);

        Ok(())
    }

    #[test]
    fn test_suggest() -> anyhow::Result<()> {
        let server = one_track_server();
        log_in(&server);
        load_playlist(&server);

        let body = parse_json_response(get(&server, "/api/suggest?q=only"))?;
        assert_eq!(body["suggestions"][0], "Only Track (Remastered)");

        let body = parse_json_response(get(&server, "/api/suggest?q=zzz"))?;
        assert_eq!(body["suggestions"].as_array().map(Vec::len), Some(0));

        Ok(())
    }

    #[test]
    fn test_unknown_route() {
        let server = one_track_server();

        assert_eq!(get(&server, "/nope").status_code, 404);
    }
}
