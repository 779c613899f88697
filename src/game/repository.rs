use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::{
    domain::{normalize::normalize, track::Track},
    game::error::GameError,
};

/// Tracks of the currently loaded playlist, in load order
#[derive(Debug, Default)]
pub struct TrackRepository {
    tracks: Vec<Track>,
}

impl TrackRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the loaded tracks.
    ///
    /// An empty playlist is rejected and leaves the current tracks in place.
    pub fn load(&mut self, tracks: Vec<Track>) -> Result<(), GameError> {
        if tracks.is_empty() {
            return Err(GameError::EmptyPlaylist);
        }
        log::debug!("loaded {} tracks", tracks.len());
        self.tracks = tracks;
        Ok(())
    }

    pub fn pick_random_track(&self) -> Result<&Track, GameError> {
        self.pick_random_track_with(&mut rand::thread_rng())
    }

    pub fn pick_random_track_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Track, GameError> {
        self.tracks.choose(rng).ok_or(GameError::NotLoaded)
    }

    /// first track, in load order, whose normalized title equals the normalized query
    pub fn find_by_normalized_title(&self, query: &str) -> Option<&Track> {
        let query = normalize(query);
        if query.is_empty() {
            return None;
        }
        self.tracks
            .iter()
            .find(|track| normalize(&track.title) == query)
    }

    /// Titles containing `query` as typed, case-insensitively.
    ///
    /// Titles that normalize to the same text are reported once, the first
    /// one in load order wins. An empty query matches every title.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        let needle = query.to_lowercase();
        let mut seen = HashSet::new();
        self.tracks
            .iter()
            .filter(|track| track.title.to_lowercase().contains(&needle))
            .filter(|track| seen.insert(normalize(&track.title)))
            .take(limit)
            .map(|track| track.title.clone())
            .collect()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
