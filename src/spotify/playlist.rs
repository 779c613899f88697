use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::{domain::track::Track, spotify::error::SpotifyError};

/// fields requested for every playlist item, everything else is dropped by Spotify
pub const ITEM_FIELDS: &str =
    "items(track(id,name,artists(name),preview_url,uri,album(release_date))),next";

pub const PAGE_LIMIT: u32 = 100;

fn playlist_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"playlist[/:]([a-zA-Z0-9]+)").expect("invalid playlist id regex")
    })
}

/// Extracts the playlist id from a web url (`.../playlist/<id>?si=...`)
/// or a `spotify:playlist:<id>` uri
pub fn parse_playlist_id(url: &str) -> Result<String, SpotifyError> {
    playlist_id_regex()
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| SpotifyError::InvalidPlaylistUrl(url.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItemsPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub next: Option<String>,
}

impl PlaylistItemsPage {
    pub fn into_tracks(self) -> impl Iterator<Item = Track> {
        self.items
            .into_iter()
            .filter_map(|item| item.track)
            .filter_map(PlaylistTrack::into_track)
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistTrack {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    pub preview_url: Option<String>,
    #[serde(default)]
    pub uri: String,
    pub album: Option<AlbumRef>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumRef {
    pub release_date: Option<String>,
}

impl PlaylistTrack {
    /// local files and removed tracks have no id and are skipped
    fn into_track(self) -> Option<Track> {
        let id = self.id?;
        let release_year = self
            .album
            .and_then(|album| album.release_date)
            .and_then(|date| date.get(..4).map(str::to_string));

        Some(Track {
            id,
            title: self.name,
            artists: self.artists.into_iter().map(|artist| artist.name).collect(),
            preview_url: self.preview_url,
            uri: self.uri,
            release_year,
            genre: None,
        })
    }
}
