use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Duration, Utc};

use crate::{
    game::Game,
    http::error::ApiError,
    spotify::auth::{PendingLogin, TokenSet},
};

/// Everything one browser session owns
pub struct Session {
    pub pending_login: Option<PendingLogin>,
    pub tokens: Option<TokenSet>,
    pub game: Option<Game>,
    last_seen: DateTime<Utc>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            pending_login: None,
            tokens: None,
            game: None,
            last_seen: now,
        }
    }
}

/// Sessions by id; every request goes through the same lock.
///
/// Sessions idle for longer than the timeout are dropped on the next access.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Runs `f` on the session, creating it when it does not exist yet
    pub fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, ApiError> {
        self.with_session_at(id, Utc::now(), f)
    }

    /// Runs `f` on the session if it exists; unknown ids create nothing
    pub fn with_existing<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<Option<T>, ApiError> {
        self.with_existing_at(id, Utc::now(), f)
    }

    pub fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.lock(Utc::now())?.remove(id);
        Ok(())
    }

    fn with_session_at<T>(
        &self,
        id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, ApiError> {
        let mut sessions = self.lock(now)?;
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(now));
        session.last_seen = now;
        Ok(f(session))
    }

    fn with_existing_at<T>(
        &self,
        id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<Option<T>, ApiError> {
        let mut sessions = self.lock(now)?;
        Ok(sessions.get_mut(id).map(|session| {
            session.last_seen = now;
            f(session)
        }))
    }

    /// Locks the map after dropping expired sessions
    fn lock(
        &self,
        now: DateTime<Utc>,
    ) -> Result<MutexGuard<'_, HashMap<String, Session>>, ApiError> {
        let mut sessions = self.sessions.lock().map_err(|e| {
            log::error!("session store lock poisoned: {e}");
            ApiError::Internal("internal_error".into())
        })?;

        let before = sessions.len();
        sessions.retain(|_, session| now - session.last_seen <= self.timeout);
        if sessions.len() < before {
            log::debug!("expired {} idle sessions", before - sessions.len());
        }
        Ok(sessions)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }
}
