//! Per-conversation state, keyed by call/session identifier.
//!
//! One conversation is one live intake. Consecutive webhook requests for the
//! same call arrive as independent HTTP requests, so state lives here between
//! requests rather than in any handler. Conversations are isolated from one
//! another: the outer map lock is held only for map operations, and each
//! conversation carries its own async mutex so one in-flight operation at a
//! time touches a given record while other calls proceed independently.

use intake_core::IntakeSession;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// One live conversation: the intake state machine plus telephony scratch
/// state that spans webhook steps.
#[derive(Debug, Default)]
pub struct Conversation {
    pub intake: IntakeSession,
    /// Insurance payer captured one gather before the member ID.
    pub pending_payer: Option<String>,
    /// Phone number captured one gather before the optional email.
    pub pending_phone: Option<String>,
    /// Rejected address submissions so far (the call allows two).
    pub address_attempts: u8,
}

/// Shared handle to all live conversations.
///
/// Uses `std::sync::RwLock` intentionally: all lock acquisitions are brief
/// HashMap operations (get/insert/remove) that never span `.await` points.
/// The per-conversation lock is a `tokio::sync::Mutex` because step handlers
/// hold it across await points (notification dispatch).
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Arc<Mutex<Conversation>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh conversation under `id`, replacing any stale one left
    /// behind by an earlier call that reused the identifier.
    pub fn create(&self, id: &str) -> Arc<Mutex<Conversation>> {
        let conversation = Arc::new(Mutex::new(Conversation::default()));
        self.write_map()
            .insert(id.to_string(), Arc::clone(&conversation));
        conversation
    }

    pub fn get(&self, id: &str) -> Option<Arc<Mutex<Conversation>>> {
        self.read_map().get(id).cloned()
    }

    /// Removes the conversation for `id`. Returns whether one existed.
    pub fn remove(&self, id: &str) -> bool {
        self.write_map().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    fn read_map(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Mutex<Conversation>>>> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::error!("session store lock poisoned, recovering with stale state");
            poisoned.into_inner()
        })
    }

    fn write_map(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Mutex<Conversation>>>> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::error!("session store lock poisoned, recovering with stale state");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_types::Stage;

    #[tokio::test]
    async fn conversations_are_isolated_per_id() {
        let store = SessionStore::new();
        let a = store.create("call-a");
        let b = store.create("call-b");

        a.lock().await.intake.submit_name("Alice");
        assert_eq!(b.lock().await.intake.stage(), Stage::Greeting);
        assert_eq!(a.lock().await.intake.stage(), Stage::Dob);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn create_replaces_a_stale_conversation() {
        let store = SessionStore::new();
        store.create("call-a").lock().await.intake.submit_name("Old");
        let fresh = store.create("call-a");
        assert_eq!(fresh.lock().await.intake.record().name, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_reports_existence() {
        let store = SessionStore::new();
        store.create("call-a");
        assert!(store.remove("call-a"));
        assert!(!store.remove("call-a"));
        assert!(store.is_empty());
    }
}
