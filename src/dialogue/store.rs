use parking_lot::RwLock;
use std::collections::HashMap;

use super::state::Session;

/// Session persistence. Last write wins; callers serialize turns per session.
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &str) -> Option<Session>;
    fn save(&self, session: Session);
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, id: &str) -> Option<Session> {
        self.sessions.read().get(id).cloned()
    }

    fn save(&self, session: Session) {
        self.sessions.write().insert(session.id.clone(), session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_returns_a_copy() {
        let store = InMemorySessionStore::new();
        store.save(Session::new("a"));

        let mut copy = store.load("a").unwrap();
        copy.turn_count = 9;
        assert_eq!(store.load("a").unwrap().turn_count, 0);
        assert!(store.load("b").is_none());
        assert_eq!(store.len(), 1);
    }
}
