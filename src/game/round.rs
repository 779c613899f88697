use serde::Serialize;

use crate::{
    domain::{normalize::normalize, track::Track},
    game::{error::GameError, repository::TrackRepository, schedule::ClipSchedule},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
    GaveUp,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::InProgress
    }
}

/// One submitted guess, as it is shown in the comparison table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuessRecord {
    pub raw_text: String,
    pub normalized_text: String,
    pub is_correct: bool,
    /// loaded track the guess names, if any, for artist/year/genre comparison
    pub matched_track: Option<Track>,
}

/// State of guessing a single answer track.
///
/// Every submitted guess consumes one attempt, and with it one entry of the
/// clip schedule. Once the outcome leaves `InProgress` the round is frozen.
#[derive(Debug)]
pub struct GuessRound {
    answer: Track,
    schedule: ClipSchedule,
    attempt_index: usize,
    history: Vec<GuessRecord>,
    outcome: Outcome,
}

impl GuessRound {
    pub fn start(answer: Track, schedule: ClipSchedule) -> Self {
        log::debug!("round started, {} attempts", schedule.max_attempts());
        Self {
            answer,
            schedule,
            attempt_index: 0,
            history: Vec::new(),
            outcome: Outcome::InProgress,
        }
    }

    pub fn current_clip_length(&self) -> u32 {
        self.schedule.clip_for_attempt(self.attempt_index)
    }

    pub fn submit_guess(
        &mut self,
        raw_text: &str,
        repository: &TrackRepository,
    ) -> Result<GuessRecord, GameError> {
        if self.outcome.is_terminal() {
            return Err(GameError::RoundNotInProgress);
        }
        if raw_text.trim().is_empty() {
            return Err(GameError::EmptyGuess);
        }

        // the attempt is spent whether or not the guess turns out right
        self.attempt_index = (self.attempt_index + 1).min(self.max_attempts());

        let normalized_text = normalize(raw_text);
        let is_correct = normalized_text == normalize(&self.answer.title);
        let matched_track = repository.find_by_normalized_title(raw_text).cloned();

        let record = GuessRecord {
            raw_text: raw_text.to_string(),
            normalized_text,
            is_correct,
            matched_track,
        };
        self.history.push(record.clone());

        if is_correct {
            self.outcome = Outcome::Won;
        } else if self.attempt_index >= self.max_attempts() {
            self.outcome = Outcome::Lost;
        }
        log::debug!(
            "guess {}/{} correct={} outcome={:?}",
            self.attempt_index,
            self.max_attempts(),
            is_correct,
            self.outcome
        );

        Ok(record)
    }

    pub fn give_up(&mut self) -> Result<(), GameError> {
        if self.outcome.is_terminal() {
            return Err(GameError::RoundNotInProgress);
        }
        self.outcome = Outcome::GaveUp;
        self.attempt_index = self.max_attempts();
        Ok(())
    }

    pub fn remaining_attempts(&self) -> usize {
        self.max_attempts().saturating_sub(self.attempt_index)
    }

    pub fn max_attempts(&self) -> usize {
        self.schedule.max_attempts()
    }

    pub fn attempt_index(&self) -> usize {
        self.attempt_index
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_terminal()
    }

    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    pub fn answer(&self) -> &Track {
        &self.answer
    }

    /// the answer, once there is nothing left to guess
    pub fn revealed_answer(&self) -> Option<&Track> {
        self.is_finished().then_some(&self.answer)
    }
}
