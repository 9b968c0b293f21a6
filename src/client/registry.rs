//! Client registry
//!
//! The shared table of accepted sessions. Every operation takes the single
//! table lock for its whole read-modify-write span and never holds it across
//! an `.await` or a network write. Usernames are keyed case-insensitively.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::client::session::{Outbound, Session, SessionId};
use crate::error::RegistryError;

/// Registry for tracking active sessions
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
}

fn username_key(username: &str) -> String {
    username.to_lowercase()
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // Poisoning only means another handler panicked mid-operation; every
        // operation leaves the map consistent, so keep serving.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `session` unless its username is already taken.
    pub fn register(&self, session: Session) -> Result<(), RegistryError> {
        self.register_then(session, |_| {})
    }

    /// Like [`register`](Self::register), but runs `admitted` after the
    /// uniqueness check and before the session becomes visible. The table is
    /// locked meanwhile, so no broadcast can reach the session first.
    pub fn register_then<F>(&self, session: Session, admitted: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&Session),
    {
        let key = username_key(session.username());
        let mut sessions = self.table();

        if sessions.contains_key(&key) {
            return Err(RegistryError::DuplicateUsername(
                session.username().to_string(),
            ));
        }

        admitted(&session);
        debug!("Registered {} as {}", session.id(), session.username());
        sessions.insert(key, session);
        Ok(())
    }

    /// Removes the session for `username`. Returns whether anything was removed.
    pub fn unregister(&self, username: &str) -> bool {
        self.table().remove(&username_key(username)).is_some()
    }

    /// Removes the session with `id`, leaving a newer session under the same
    /// name untouched.
    pub fn unregister_session(&self, id: SessionId) -> bool {
        let mut sessions = self.table();
        let key = sessions
            .iter()
            .find(|(_, session)| session.id() == id)
            .map(|(key, _)| key.clone());

        match key {
            Some(key) => sessions.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.table().contains_key(&username_key(username))
    }

    /// Snapshot of active usernames, sorted.
    pub fn list_usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .table()
            .values()
            .map(|session| session.username().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Queues `line` for every session registered at call time.
    ///
    /// Sessions whose outbound handle is closed are skipped and removed once
    /// the fan-out is finished. Returns the number of sessions that accepted
    /// the line.
    pub fn broadcast(&self, line: &str) -> usize {
        let recipients: Vec<(SessionId, String, Outbound)> = self
            .table()
            .values()
            .map(|s| (s.id(), s.username().to_string(), s.outbound().clone()))
            .collect();

        let mut delivered = 0;
        let mut stale = Vec::new();

        for (id, username, outbound) in recipients {
            match outbound.send(line) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Dropping {} ({}): {}", username, id, e);
                    stale.push(id);
                }
            }
        }

        for id in stale {
            self.unregister_session(id);
        }

        delivered
    }
}
