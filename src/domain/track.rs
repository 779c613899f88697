use serde::{Deserialize, Serialize};

/// Represent a music track loaded from a playlist
///
/// Tracks are immutable once loaded: rounds and repositories hand out
/// clones or references, never mutable access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    pub uri: String,
    #[serde(default)]
    pub release_year: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artists: Vec::new(),
            preview_url: None,
            uri: uri.into(),
            release_year: None,
            genre: None,
        }
    }

    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artists = artists.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_preview_url(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(url.into());
        self
    }

    pub fn with_release_year(mut self, year: impl Into<String>) -> Self {
        self.release_year = Some(year.into());
        self
    }

    /// artists joined the way they are shown next to a title
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}
