//! Guessing game: loaded tracks plus the round being played

pub mod error;
pub mod player;
pub mod repository;
pub mod round;
pub mod schedule;

use crate::domain::track::Track;

use error::GameError;
use repository::TrackRepository;
use round::{GuessRecord, GuessRound};
use schedule::ClipSchedule;

/// A loaded playlist and its current round.
///
/// Starting a new round drops the previous one together with its history.
#[derive(Debug)]
pub struct Game {
    repository: TrackRepository,
    schedule: ClipSchedule,
    round: GuessRound,
}

impl Game {
    pub fn new(tracks: Vec<Track>, schedule: ClipSchedule) -> Result<Self, GameError> {
        let mut repository = TrackRepository::new();
        repository.load(tracks)?;
        let answer = repository.pick_random_track()?.clone();
        let round = GuessRound::start(answer, schedule.clone());
        Ok(Self {
            repository,
            schedule,
            round,
        })
    }

    pub fn new_round(&mut self) -> Result<&GuessRound, GameError> {
        let answer = self.repository.pick_random_track()?.clone();
        self.round = GuessRound::start(answer, self.schedule.clone());
        Ok(&self.round)
    }

    pub fn guess(&mut self, raw_text: &str) -> Result<GuessRecord, GameError> {
        self.round.submit_guess(raw_text, &self.repository)
    }

    pub fn give_up(&mut self) -> Result<(), GameError> {
        self.round.give_up()
    }

    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        self.repository.suggest(query, limit)
    }

    pub fn round(&self) -> &GuessRound {
        &self.round
    }

    pub fn repository(&self) -> &TrackRepository {
        &self.repository
    }
}
