use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

use crate::game::schedule::ClipSchedule;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub http: HttpConfig,
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub game: GameConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse config TOML")?;
        config.game.clip_schedule()?;
        Ok(config)
    }

    /// redirect uri registered with Spotify, defaulting to the local callback route
    pub fn redirect_uri(&self) -> String {
        self.spotify
            .redirect_uri
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}/callback", self.http.port))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    #[serde(default = "default_clip_schedule")]
    pub clip_schedule: Vec<u32>,
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
}

impl GameConfig {
    pub fn clip_schedule(&self) -> anyhow::Result<ClipSchedule> {
        ClipSchedule::new(self.clip_schedule.clone()).with_context(|| "Invalid [game] clip_schedule")
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            clip_schedule: default_clip_schedule(),
            suggestion_limit: default_suggestion_limit(),
        }
    }
}

fn default_clip_schedule() -> Vec<u32> {
    ClipSchedule::DEFAULT_SECONDS.to_vec()
}

fn default_suggestion_limit() -> usize {
    8
}
