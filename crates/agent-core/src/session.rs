//! Session Management
//!
//! Conversation threads keyed by an opaque id. A turn checks its thread
//! out, holds it for the whole REASONING/ACTING cycle and releases it on
//! drop, so each thread's history is read-then-appended atomically even
//! when requests race on the same id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::message::Conversation;

/// Opaque conversation thread identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(String);

impl ThreadId {
    /// Generate a fresh unique id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::generate()
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation thread and its history
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Thread {
    /// Unique identifier
    pub id: ThreadId,

    /// Ordered message history across turns
    pub conversation: Conversation,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    fn new(id: ThreadId) -> Self {
        let now = Utc::now();
        Self {
            id,
            conversation: Conversation::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

/// Exclusive handle on a thread for the duration of one turn
pub type ThreadGuard = OwnedMutexGuard<Thread>;

/// Session store trait for thread persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Check out a thread for exclusive use, creating it on first use of a
    /// new id. The guard serializes turns against the same thread; turns
    /// on distinct threads proceed concurrently.
    async fn checkout(&self, id: &ThreadId) -> ThreadGuard;

    /// Whether a thread exists
    async fn contains(&self, id: &ThreadId) -> bool;

    /// Delete a thread, returning whether it existed
    async fn delete(&self, id: &ThreadId) -> bool;

    /// List known thread ids
    async fn thread_ids(&self) -> Vec<ThreadId>;
}

/// In-memory session store
pub struct MemorySessionStore {
    threads: Mutex<HashMap<ThreadId, Arc<Mutex<Thread>>>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            threads: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn checkout(&self, id: &ThreadId) -> ThreadGuard {
        let slot = {
            let mut threads = self.threads.lock().await;
            threads
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(Thread::new(id.clone()))))
                .clone()
        };
        // The map lock is released before waiting on the thread itself, so
        // a long turn on one thread never blocks checkouts of others.
        slot.lock_owned().await
    }

    async fn contains(&self, id: &ThreadId) -> bool {
        self.threads.lock().await.contains_key(id)
    }

    async fn delete(&self, id: &ThreadId) -> bool {
        self.threads.lock().await.remove(id).is_some()
    }

    async fn thread_ids(&self) -> Vec<ThreadId> {
        self.threads.lock().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[tokio::test]
    async fn test_checkout_creates_on_first_use() {
        let store = MemorySessionStore::new();
        let id = ThreadId::from_string("t-1");
        assert!(!store.contains(&id).await);

        {
            let mut thread = store.checkout(&id).await;
            thread.conversation.push(Message::user("hola"));
            thread.touch();
        }

        assert!(store.contains(&id).await);
        let thread = store.checkout(&id).await;
        assert_eq!(thread.message_count(), 1);
    }

    #[tokio::test]
    async fn test_threads_are_isolated() {
        let store = MemorySessionStore::new();
        let a = ThreadId::from_string("a");
        let b = ThreadId::from_string("b");

        store.checkout(&a).await.conversation.push(Message::user("for a"));

        let thread_b = store.checkout(&b).await;
        assert_eq!(thread_b.message_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_turns_on_same_thread_serialize() {
        let store = Arc::new(MemorySessionStore::new());
        let id = ThreadId::from_string("shared");

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let mut thread = store.checkout(&id).await;
                let seen = thread.message_count();
                // Hold the guard across an await point, as a real turn does
                tokio::time::sleep(std::time::Duration::from_millis(2)).await;
                thread.conversation.push(Message::user(format!("turn {i}")));
                assert_eq!(thread.message_count(), seen + 1);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.checkout(&id).await.message_count(), 8);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ThreadId::generate(), ThreadId::generate());
    }
}
