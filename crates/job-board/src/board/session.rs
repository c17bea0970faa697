use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::conversation::Conversation;
use super::domain::UserId;
use super::navigation::SearchResults;

/// Ephemeral per-user state. Lost on restart.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub conversation: Option<Conversation>,
    pub search: Option<SearchResults>,
}

/// In-process session map keyed by user. Guards are never held across awaits;
/// callers go through the closure-based accessors.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl SessionStore {
    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Session>> {
        // Sessions are disposable; a poisoned map is still usable.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the user's session, creating an empty one if needed.
    pub fn with<T>(&self, user: UserId, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut sessions = self.lock();
        f(sessions.entry(user).or_default())
    }

    pub fn begin(&self, user: UserId, conversation: Conversation) {
        self.with(user, |session| session.conversation = Some(conversation));
    }

    pub fn conversation(&self, user: UserId) -> Option<Conversation> {
        self.lock()
            .get(&user)
            .and_then(|session| session.conversation.clone())
    }

    pub fn store_search(&self, user: UserId, results: Option<SearchResults>) {
        self.with(user, |session| session.search = results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::domain::VacancyId;

    #[test]
    fn sessions_are_isolated_per_user() {
        let store = SessionStore::default();
        store.begin(UserId(1), Conversation::vacancy());
        store.begin(UserId(2), Conversation::search());

        assert_eq!(store.conversation(UserId(1)), Some(Conversation::vacancy()));
        assert_eq!(store.conversation(UserId(2)), Some(Conversation::search()));

        store.with(UserId(1), |session| session.conversation = None);
        assert!(store.conversation(UserId(1)).is_none());
        assert!(store.conversation(UserId(2)).is_some());
    }

    #[test]
    fn starting_a_form_keeps_search_results() {
        let store = SessionStore::default();
        store.store_search(UserId(5), SearchResults::new(vec![VacancyId(3)]));
        store.begin(UserId(5), Conversation::resume());

        let kept = store.with(UserId(5), |session| session.search.clone());
        assert_eq!(kept.map(|results| results.len()), Some(1));
    }
}
