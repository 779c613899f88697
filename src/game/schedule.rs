use serde::Serialize;

use crate::game::error::GameError;

/// Clip lengths, in seconds, offered on successive attempts.
///
/// Non-empty, positive and strictly increasing. Its length is the number of
/// attempts a round allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipSchedule(Vec<u32>);

impl ClipSchedule {
    pub const DEFAULT_SECONDS: [u32; 6] = [1, 3, 6, 10, 15, 30];

    pub fn new(seconds: Vec<u32>) -> Result<Self, GameError> {
        if seconds.is_empty() {
            return Err(GameError::InvalidSchedule("schedule is empty".into()));
        }
        if seconds.contains(&0) {
            return Err(GameError::InvalidSchedule(
                "clip lengths must be positive".into(),
            ));
        }
        if seconds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(GameError::InvalidSchedule(format!(
                "clip lengths must be strictly increasing, got {seconds:?}"
            )));
        }
        Ok(Self(seconds))
    }

    pub fn max_attempts(&self) -> usize {
        self.0.len()
    }

    /// clip length for a zero-based attempt index, clamped to the last entry
    pub fn clip_for_attempt(&self, attempt_index: usize) -> u32 {
        let last = self.0.len() - 1;
        self.0[attempt_index.min(last)]
    }

    pub fn seconds(&self) -> &[u32] {
        &self.0
    }
}

impl Default for ClipSchedule {
    fn default() -> Self {
        Self(Self::DEFAULT_SECONDS.to_vec())
    }
}
