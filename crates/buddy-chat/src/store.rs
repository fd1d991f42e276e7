//! In-memory session memory.
//!
//! Each session is an append-only, chronologically ordered list of turns
//! behind its own lock, so concurrent sessions never block each other and
//! turns of one session never interleave. Only the most recent
//! `retained_turns` turns are kept.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use buddy_core::{QueryHints, Role, SessionId, Turn};

use crate::error::ChatError;
use crate::report;

#[derive(Debug)]
struct Session {
    turns: VecDeque<Turn>,
    created_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
    radius_preference: Option<u32>,
}

impl Session {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            turns: VecDeque::new(),
            created_at: now,
            last_active_at: now,
            radius_preference: None,
        }
    }

    fn push(&mut self, turn: Turn, cap: usize) {
        self.turns.push_back(turn);
        while self.turns.len() > cap {
            self.turns.pop_front();
        }
        self.last_active_at = Utc::now();
    }
}

/// Summary row for session listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_preference: Option<u32>,
}

/// Process-wide store of conversation sessions.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    retained_turns: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(retained_turns: usize, idle_timeout_minutes: u32) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            retained_turns: retained_turns.max(1),
            idle_timeout: Duration::minutes(i64::from(idle_timeout_minutes)),
        }
    }

    /// Append a turn, creating the session if absent.
    pub fn append(&self, id: &SessionId, turn: Turn) {
        let session = self.get_or_create(id);
        lock(&session).push(turn, self.retained_turns);
    }

    /// Append a user turn and its reply under one lock.
    pub fn append_exchange(&self, id: &SessionId, user: Turn, assistant: Turn) {
        let session = self.get_or_create(id);
        let mut guard = lock(&session);
        guard.push(user, self.retained_turns);
        guard.push(assistant, self.retained_turns);
    }

    /// The most recent `max_turns` turns, oldest first. Unknown sessions
    /// have an empty history.
    pub fn history(&self, id: &SessionId, max_turns: usize) -> Vec<Turn> {
        let Some(session) = self.get(id) else {
            return Vec::new();
        };
        let guard = lock(&session);
        let skip = guard.turns.len().saturating_sub(max_turns);
        guard.turns.iter().skip(skip).cloned().collect()
    }

    /// Drop every turn of the session. Preferences survive; unknown ids are
    /// ignored.
    pub fn clear(&self, id: &SessionId) {
        if let Some(session) = self.get(id) {
            let mut guard = lock(&session);
            guard.turns.clear();
            guard.last_active_at = Utc::now();
            tracing::info!(session = %id, "Session history cleared");
        }
    }

    /// Remove the session entirely. Returns whether it existed.
    pub fn remove(&self, id: &SessionId) -> bool {
        let removed = write(&self.sessions).remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "Session removed");
        }
        removed
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        read(&self.sessions).contains_key(id)
    }

    pub fn session_count(&self) -> usize {
        read(&self.sessions).len()
    }

    /// Summaries of all sessions, most recently active first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let entries: Vec<(SessionId, Arc<Mutex<Session>>)> = read(&self.sessions)
            .iter()
            .map(|(id, s)| (id.clone(), Arc::clone(s)))
            .collect();

        let mut summaries: Vec<SessionSummary> = entries
            .into_iter()
            .map(|(id, session)| {
                let guard = lock(&session);
                SessionSummary {
                    id,
                    turn_count: guard.turns.len(),
                    created_at: guard.created_at,
                    last_active_at: guard.last_active_at,
                    radius_preference: guard.radius_preference,
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        summaries
    }

    /// The session's turns as pretty-printed JSON.
    pub fn export_json(&self, id: &SessionId) -> Result<String, ChatError> {
        let session = self
            .get(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))?;
        let turns: Vec<Turn> = lock(&session).turns.iter().cloned().collect();
        serde_json::to_string_pretty(&turns).map_err(|e| ChatError::StorageError(e.to_string()))
    }

    /// The session rendered as a Markdown trip report.
    pub fn report(&self, id: &SessionId) -> Result<String, ChatError> {
        let session = self
            .get(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))?;
        let turns: Vec<Turn> = lock(&session).turns.iter().cloned().collect();
        Ok(report::render_report(id, &turns, Utc::now()))
    }

    /// Most recent non-null value of each place query field, walking the
    /// assistant turns newest first. Each field is resolved on its own.
    pub fn carried_fields(&self, id: &SessionId) -> QueryHints {
        let Some(session) = self.get(id) else {
            return QueryHints::default();
        };
        let guard = lock(&session);
        let mut carried = QueryHints::default();
        for fields in guard
            .turns
            .iter()
            .rev()
            .filter(|t| t.role == Role::Assistant)
            .filter_map(|t| t.fields.as_ref())
        {
            carried = carried.or(fields);
            if carried.category.is_some() && carried.location.is_some() && carried.radius_m.is_some()
            {
                break;
            }
        }
        carried
    }

    /// If `message` repeats the latest user turn, return the reply that
    /// followed it.
    pub fn duplicate_reply(&self, id: &SessionId, message: &str) -> Option<Turn> {
        let session = self.get(id)?;
        let guard = lock(&session);
        let mut recent = guard.turns.iter().rev();
        let reply = recent.next()?;
        let asked = recent.next()?;
        let same = asked.content.trim().to_lowercase() == message.trim().to_lowercase();
        (same && asked.role == Role::User && reply.role == Role::Assistant).then(|| reply.clone())
    }

    /// Set the session's preferred search radius, creating the session if
    /// absent. Bounds are checked by the caller.
    pub fn set_radius_preference(&self, id: &SessionId, radius_m: u32) {
        let session = self.get_or_create(id);
        let mut guard = lock(&session);
        guard.radius_preference = Some(radius_m);
        guard.last_active_at = Utc::now();
    }

    pub fn radius_preference(&self, id: &SessionId) -> Option<u32> {
        let session = self.get(id)?;
        let radius = lock(&session).radius_preference;
        radius
    }

    /// Remove sessions idle for longer than the configured timeout.
    pub fn expire_idle(&self) -> usize {
        self.expire_idle_at(Utc::now())
    }

    /// Remove sessions whose last activity is older than `now - idle_timeout`.
    pub fn expire_idle_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.idle_timeout;
        let mut sessions = write(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, s| lock(s).last_active_at >= cutoff);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::info!(expired, remaining = sessions.len(), "Expired idle sessions");
        }
        expired
    }

    fn get(&self, id: &SessionId) -> Option<Arc<Mutex<Session>>> {
        read(&self.sessions).get(id).cloned()
    }

    fn get_or_create(&self, id: &SessionId) -> Arc<Mutex<Session>> {
        if let Some(session) = self.get(id) {
            return session;
        }
        let mut sessions = write(&self.sessions);
        Arc::clone(sessions.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(session = %id, "Session created");
            Arc::new(Mutex::new(Session::new()))
        }))
    }
}

// Turns are never left half-written under a lock, so a poisoned lock still
// guards consistent data.
fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use buddy_core::{Location, PlaceCategory};

    fn store() -> SessionStore {
        SessionStore::new(20, 60)
    }

    fn sid(s: &str) -> SessionId {
        SessionId::from(s)
    }

    fn text(location: &str) -> Option<Location> {
        Some(Location::Text(location.to_string()))
    }

    #[test]
    fn test_history_returns_last_n_in_order() {
        let store = store();
        let id = sid("s1");
        for i in 0..7 {
            store.append(&id, Turn::user(format!("m{}", i)));
        }

        for n in 0..10 {
            let history = store.history(&id, n);
            let expected: Vec<String> = (0..7)
                .skip(7usize.saturating_sub(n))
                .map(|i| format!("m{}", i))
                .collect();
            let got: Vec<String> = history.into_iter().map(|t| t.content).collect();
            assert_eq!(got, expected, "n = {}", n);
        }
    }

    #[test]
    fn test_append_then_history_one() {
        let store = store();
        let id = sid("s1");
        store.append(&id, Turn::user("first"));
        let turn = Turn::assistant("latest");
        store.append(&id, turn.clone());
        assert_eq!(store.history(&id, 1), vec![turn]);
    }

    #[test]
    fn test_unknown_session_is_empty() {
        let store = store();
        assert!(store.history(&sid("nope"), 10).is_empty());
        store.clear(&sid("nope"));
        assert!(!store.contains(&sid("nope")));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = store();
        let id = sid("s1");
        store.append(&id, Turn::user("hello"));
        store.clear(&id);
        assert!(store.history(&id, 10).is_empty());
        store.clear(&id);
        assert!(store.history(&id, 10).is_empty());
    }

    #[test]
    fn test_clear_keeps_preferences() {
        let store = store();
        let id = sid("s1");
        store.set_radius_preference(&id, 2000);
        store.append(&id, Turn::user("hello"));
        store.clear(&id);
        assert_eq!(store.radius_preference(&id), Some(2000));
    }

    #[test]
    fn test_retention_cap_drops_oldest() {
        let store = SessionStore::new(4, 60);
        let id = sid("s1");
        for i in 0..6 {
            store.append(&id, Turn::user(format!("m{}", i)));
        }
        let got: Vec<String> = store
            .history(&id, 100)
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(got, vec!["m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = store();
        store.append(&sid("a"), Turn::user("for a"));
        store.append(&sid("b"), Turn::user("for b"));
        assert_eq!(store.history(&sid("a"), 10)[0].content, "for a");
        assert_eq!(store.history(&sid("b"), 10).len(), 1);
        assert_eq!(store.session_count(), 2);
    }

    #[test]
    fn test_concurrent_exchanges_do_not_interleave() {
        let store = Arc::new(store());
        let id = sid("shared");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = id.clone();
                std::thread::spawn(move || {
                    store.append_exchange(
                        &id,
                        Turn::user(format!("q{}", i)),
                        Turn::assistant(format!("a{}", i)),
                    );
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let history = store.history(&id, 100);
        assert_eq!(history.len(), 16);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }

    #[test]
    fn test_carried_fields_newest_value_per_field() {
        let store = store();
        let id = sid("s1");
        assert!(store.carried_fields(&id).is_empty());

        store.append_exchange(
            &id,
            Turn::user("restaurants within 500m of Rome"),
            Turn::assistant("Here you go").with_fields(QueryHints {
                category: Some(PlaceCategory::Restaurant),
                location: text("Rome"),
                radius_m: Some(500),
            }),
        );
        store.append_exchange(&id, Turn::user("thanks"), Turn::assistant("Enjoy!"));
        store.append_exchange(
            &id,
            Turn::user("what about Milan?"),
            Turn::assistant("Which kind of place?").with_fields(QueryHints {
                location: text("Milan"),
                ..QueryHints::default()
            }),
        );

        let carried = store.carried_fields(&id);
        assert_eq!(carried.location, text("Milan"));
        assert_eq!(carried.category, Some(PlaceCategory::Restaurant));
        assert_eq!(carried.radius_m, Some(500));
    }

    #[test]
    fn test_carried_fields_ignore_user_turns() {
        let store = store();
        let id = sid("s1");
        store.append(
            &id,
            Turn::user("hotels").with_fields(QueryHints {
                category: Some(PlaceCategory::Hotel),
                ..QueryHints::default()
            }),
        );
        assert!(store.carried_fields(&id).is_empty());
    }

    #[test]
    fn test_duplicate_reply() {
        let store = store();
        let id = sid("s1");
        store.append_exchange(&id, Turn::user("Best pizza?"), Turn::assistant("Try Gino's."));

        let reply = store.duplicate_reply(&id, "  best PIZZA?  ").unwrap();
        assert_eq!(reply.content, "Try Gino's.");
        assert!(store.duplicate_reply(&id, "best pasta?").is_none());
        assert!(store.duplicate_reply(&sid("other"), "Best pizza?").is_none());
    }

    #[test]
    fn test_remove() {
        let store = store();
        let id = sid("s1");
        store.append(&id, Turn::user("hi"));
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.history(&id, 5).is_empty());
    }

    #[test]
    fn test_export_json() {
        let store = store();
        let id = sid("s1");
        store.append_exchange(&id, Turn::user("hi"), Turn::assistant("hello"));

        let json = store.export_json(&id).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["role"], "user");
        assert_eq!(parsed[1]["content"], "hello");

        assert!(matches!(
            store.export_json(&sid("missing")),
            Err(ChatError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_report() {
        let store = store();
        let id = sid("s1");
        store.append_exchange(&id, Turn::user("hi"), Turn::assistant("hello"));

        let report = store.report(&id).unwrap();
        assert!(report.starts_with("# Travel Buddy Recommendations"));
        assert!(report.contains("hello"));

        assert!(matches!(
            store.report(&sid("missing")),
            Err(ChatError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_list_sessions() {
        let store = store();
        store.append(&sid("a"), Turn::user("x"));
        store.append_exchange(&sid("b"), Turn::user("y"), Turn::assistant("z"));

        let summaries = store.list_sessions();
        assert_eq!(summaries.len(), 2);
        let b = summaries.iter().find(|s| s.id == sid("b")).unwrap();
        assert_eq!(b.turn_count, 2);
    }

    #[test]
    fn test_expire_idle() {
        let store = store();
        store.append(&sid("a"), Turn::user("x"));

        assert_eq!(store.expire_idle_at(Utc::now()), 0);
        assert_eq!(store.expire_idle_at(Utc::now() + Duration::minutes(61)), 1);
        assert_eq!(store.session_count(), 0);
    }
}
