//! Conversation history
//!
//! Every session is an append-only transcript seeded with one system message.
//! The whole mapping is written back to its backend after each turn.

mod backend;

pub use backend::{ConversationBackend, JsonFileBackend, MemoryBackend};

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Session used when the caller does not name one
pub const DEFAULT_SESSION: &str = "default";

/// System message every new session starts with
pub const SYSTEM_PROMPT: &str =
    "You are a friendly local voice assistant. Keep replies short and helpful.";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered transcript of a single session
pub type Session = Vec<Message>;

/// All sessions, keyed by session id
pub type Conversations = BTreeMap<String, Session>;

/// Insert a seeded session for `id` if there is none yet, returning it
pub fn ensure_session<'a>(conversations: &'a mut Conversations, id: &str) -> &'a mut Session {
    conversations
        .entry(id.to_string())
        .or_insert_with(|| vec![Message::new(Role::System, SYSTEM_PROMPT)])
}

/// Give every session that lacks one its leading system message
///
/// History files are hand-editable, so a loaded session may start with a user
/// message or be empty. Returns how many sessions were repaired.
pub fn seed_missing_prompts(conversations: &mut Conversations) -> usize {
    let mut repaired = 0;
    for session in conversations.values_mut() {
        if session.first().is_none_or(|m| m.role != Role::System) {
            session.insert(0, Message::new(Role::System, SYSTEM_PROMPT));
            repaired += 1;
        }
    }
    repaired
}

/// Append a message to the tail of a session, seeding the session if needed
///
/// Role alternation is not checked.
pub fn append(conversations: &mut Conversations, id: &str, role: Role, content: impl Into<String>) {
    ensure_session(conversations, id).push(Message::new(role, content));
}

/// Process-wide conversation state over a swappable backend
///
/// A single lock covers mutate-then-persist, so turns that race on the same
/// session are applied one after another and the backend always receives the
/// newest snapshot last.
pub struct ConversationStore {
    state: Mutex<Conversations>,
    backend: Box<dyn ConversationBackend>,
}

impl ConversationStore {
    /// Load existing history from `backend`
    ///
    /// Unreadable history is treated as empty; the backend decides what counts
    /// as unreadable.
    #[must_use]
    pub fn open(backend: Box<dyn ConversationBackend>) -> Self {
        let mut state = backend.load();
        let repaired = seed_missing_prompts(&mut state);
        if repaired > 0 {
            tracing::warn!(sessions = repaired, "seeded system prompt into loaded sessions");
        }
        tracing::info!(
            backend = backend.name(),
            sessions = state.len(),
            "loaded conversation history"
        );
        Self {
            state: Mutex::new(state),
            backend,
        }
    }

    /// Store with no history backed by memory only
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryBackend::default()))
    }

    fn lock(&self) -> MutexGuard<'_, Conversations> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make sure `id` exists, returning a copy of its transcript
    #[must_use]
    pub fn ensure_session(&self, id: &str) -> Session {
        ensure_session(&mut self.lock(), id).clone()
    }

    /// Record a full exchange and persist, atomically with respect to other turns
    ///
    /// The messages stay in memory even if persisting fails; the error is
    /// returned so the caller can decide how loudly to complain.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot write the snapshot
    pub fn record_exchange(&self, id: &str, user_text: &str, assistant_text: &str) -> Result<()> {
        let mut state = self.lock();
        ensure_session(&mut state, id);
        append(&mut state, id, Role::User, user_text);
        append(&mut state, id, Role::Assistant, assistant_text);
        self.backend.save(&state)
    }

    /// Copy of one session's transcript
    #[must_use]
    pub fn session(&self, id: &str) -> Option<Session> {
        self.lock().get(id).cloned()
    }

    /// Copy of every session
    #[must_use]
    pub fn snapshot(&self) -> Conversations {
        self.lock().clone()
    }

    /// Number of known sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no session has been created yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("backend", &self.backend.name())
            .field("sessions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_session_seeds_system_prompt() {
        let mut conversations = Conversations::new();
        let session = ensure_session(&mut conversations, "s1");

        assert_eq!(session.len(), 1);
        assert_eq!(session[0], Message::new(Role::System, SYSTEM_PROMPT));
    }

    #[test]
    fn ensure_session_is_idempotent() {
        let mut conversations = Conversations::new();
        ensure_session(&mut conversations, "s1");
        append(&mut conversations, "s1", Role::User, "hi");
        ensure_session(&mut conversations, "s1");

        let session = &conversations["s1"];
        assert_eq!(session.len(), 2);
        assert_eq!(
            session.iter().filter(|m| m.role == Role::System).count(),
            1
        );
    }

    #[test]
    fn append_keeps_order_and_tolerates_repeats() {
        let mut conversations = Conversations::new();
        append(&mut conversations, "s1", Role::User, "one");
        append(&mut conversations, "s1", Role::User, "two");
        append(&mut conversations, "s1", Role::Assistant, "three");

        let contents: Vec<_> = conversations["s1"].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, [SYSTEM_PROMPT, "one", "two", "three"]);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::new(Role::Assistant, "ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }

    #[test]
    fn record_exchange_appends_pair_and_persists() {
        let backend = MemoryBackend::default();
        let store = ConversationStore::open(Box::new(backend.clone()));

        store.record_exchange("s1", "hello", "🧸 Hi there, friend 🌸").unwrap();

        let session = store.session("s1").unwrap();
        assert_eq!(session.len(), 3);
        assert_eq!(session[1], Message::new(Role::User, "hello"));
        assert_eq!(session[2], Message::new(Role::Assistant, "🧸 Hi there, friend 🌸"));
        assert_eq!(backend.load(), store.snapshot());
    }

    #[test]
    fn open_seeds_sessions_missing_their_prompt() {
        let backend = MemoryBackend::default();
        let mut loaded = Conversations::new();
        loaded.insert("empty".to_string(), Vec::new());
        loaded.insert("headless".to_string(), vec![Message::new(Role::User, "hi")]);
        ensure_session(&mut loaded, "fine");
        backend.save(&loaded).unwrap();

        let store = ConversationStore::open(Box::new(backend));

        for id in ["empty", "headless", "fine"] {
            let session = store.session(id).unwrap();
            assert_eq!(session[0], Message::new(Role::System, SYSTEM_PROMPT), "{id}");
            assert_eq!(session.iter().filter(|m| m.role == Role::System).count(), 1, "{id}");
        }
        assert_eq!(store.session("headless").unwrap()[1], Message::new(Role::User, "hi"));
    }

    #[test]
    fn store_ensure_session_does_not_duplicate() {
        let store = ConversationStore::in_memory();
        let _ = store.ensure_session("a");
        let session = store.ensure_session("a");
        assert_eq!(session.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_exchanges_are_not_lost() {
        let store = std::sync::Arc::new(ConversationStore::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..25 {
                        store
                            .record_exchange("shared", &format!("u{i}-{j}"), "a")
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let session = store.session("shared").unwrap();
        assert_eq!(session.len(), 1 + 8 * 25 * 2);
    }
}
