use crate::workflow::AnalysisSession;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Result of a conditional session update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate {
    Updated,
    Missing,
    /// Someone else saved the session after it was read.
    Stale,
}

#[derive(Debug)]
struct SessionEntry {
    session: AnalysisSession,
    last_accessed: Instant,
}

/// In-memory compliance workflow sessions keyed by session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<Uuid, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    pub fn get(&self, session_id: &Uuid) -> Option<AnalysisSession> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.session.clone())
    }

    /// Like `get`, but counts as activity for `gc`.
    pub fn touch(&mut self, session_id: &Uuid) -> Option<AnalysisSession> {
        self.sessions.get_mut(session_id).map(|entry| {
            entry.last_accessed = Instant::now();
            entry.session.clone()
        })
    }

    /// Inserts or replaces the session stored under its own id.
    pub fn insert(&mut self, session: AnalysisSession) -> Uuid {
        let session_id = session.id;
        self.sessions.insert(
            session_id,
            SessionEntry {
                session,
                last_accessed: Instant::now(),
            },
        );
        session_id
    }

    /// Replaces an existing session. Returns false if it expired or never existed.
    pub fn update(&mut self, session: AnalysisSession) -> bool {
        match self.sessions.get_mut(&session.id) {
            Some(entry) => {
                entry.session = session;
                entry.last_accessed = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Replaces the session only if the stored copy still has the revision the
    /// given one was read at, then bumps the revision.
    pub fn update_if_unchanged(&mut self, mut session: AnalysisSession) -> SessionUpdate {
        match self.sessions.get_mut(&session.id) {
            None => SessionUpdate::Missing,
            Some(entry) if entry.session.revision != session.revision => SessionUpdate::Stale,
            Some(entry) => {
                session.revision += 1;
                entry.session = session;
                entry.last_accessed = Instant::now();
                SessionUpdate::Updated
            }
        }
    }

    pub fn remove(&mut self, session_id: &Uuid) -> Option<AnalysisSession> {
        self.sessions.remove(session_id).map(|entry| entry.session)
    }

    pub fn gc(&mut self, ttl: Duration) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.duration_since(entry.last_accessed) < ttl);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::WorkflowStep;

    #[test]
    fn should_create_empty_session_store() {
        let store = SessionStore::new();
        assert!(store.is_empty());
    }

    #[test]
    fn should_return_none_for_unknown_session() {
        let store = SessionStore::new();
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn should_insert_and_get_session() {
        let mut store = SessionStore::new();
        let session = AnalysisSession::new();

        let session_id = store.insert(session.clone());

        assert_eq!(session_id, session.id);
        assert_eq!(store.get(&session_id), Some(session));
    }

    #[test]
    fn should_update_existing_session() {
        let mut store = SessionStore::new();
        let mut session = AnalysisSession::new();
        store.insert(session.clone());

        session.advance();
        assert!(store.update(session.clone()));

        let stored = store.get(&session.id).unwrap();
        assert_eq!(stored.step, WorkflowStep::Analysis);
    }

    #[test]
    fn should_not_update_missing_session() {
        let mut store = SessionStore::new();
        assert!(!store.update(AnalysisSession::new()));
        assert!(store.is_empty());
    }

    #[test]
    fn should_keep_separate_sessions() {
        let mut store = SessionStore::new();
        let first = store.insert(AnalysisSession::new());
        let second = store.insert(AnalysisSession::new());

        assert_ne!(first, second);
        assert_eq!(store.len(), 2);

        store.remove(&first);
        assert!(store.get(&first).is_none());
        assert!(store.get(&second).is_some());
    }

    #[test]
    fn should_reject_update_of_session_saved_since_read() {
        let mut store = SessionStore::new();
        let session = AnalysisSession::new();
        store.insert(session.clone());

        let mut skipped = session.clone();
        skipped.advance();
        skipped.advance();
        assert_eq!(store.update_if_unchanged(skipped), SessionUpdate::Updated);

        let mut stale = session.clone();
        stale.advance();
        assert_eq!(store.update_if_unchanged(stale), SessionUpdate::Stale);

        let stored = store.get(&session.id).unwrap();
        assert_eq!(stored.step, WorkflowStep::AreaVerification);
        assert_eq!(stored.revision, session.revision + 1);

        let mut next = stored.clone();
        next.advance();
        assert_eq!(store.update_if_unchanged(next), SessionUpdate::Updated);

        assert_eq!(
            store.update_if_unchanged(AnalysisSession::new()),
            SessionUpdate::Missing
        );
    }

    #[test]
    fn should_keep_touched_sessions_alive() {
        let mut store = SessionStore::new();
        let session_id = store.insert(AnalysisSession::new());
        std::thread::sleep(Duration::from_millis(20));

        assert!(store.touch(&session_id).is_some());
        assert!(store.touch(&Uuid::new_v4()).is_none());

        assert_eq!(store.gc(Duration::from_millis(15)), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn should_cleanup_expired_sessions() {
        let mut store = SessionStore::new();
        store.insert(AnalysisSession::new());

        let removed = store.gc(Duration::from_millis(0));

        assert_eq!(removed, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn should_not_cleanup_recent_sessions() {
        let mut store = SessionStore::new();
        store.insert(AnalysisSession::new());

        let removed = store.gc(Duration::from_secs(3600));

        assert_eq!(removed, 0);
        assert_eq!(store.len(), 1);
    }
}
