use super::persistence::SessionPersistence;
use crate::domain_model::AccessToken;
use crate::logger::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};

/// Observable session snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Persisted state has been loaded (or found absent).
    pub hydrated: bool,
    pub access_token: Option<AccessToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Rehydration has not finished; decide nothing yet.
    Pending,
    Authenticated,
    Unauthenticated,
}

/// Route guard decision. Never redirects before rehydration completes.
pub fn auth_gate(state: &SessionState) -> Gate {
    match (state.hydrated, &state.access_token) {
        (false, _) => Gate::Pending,
        (true, Some(_)) => Gate::Authenticated,
        (true, None) => Gate::Unauthenticated,
    }
}

/// Client-side holder of the current access token.
///
/// Reads are synchronous and see the latest value. Writes update memory first
/// and then persist, serialized so the stored value tracks the last write.
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    persistence: Arc<dyn SessionPersistence>,
    persist_lock: Mutex<()>,
    written: AtomicBool,
}

impl SessionStore {
    pub fn new(persistence: Arc<dyn SessionPersistence>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        SessionStore {
            state,
            persistence,
            persist_lock: Mutex::new(()),
            written: AtomicBool::new(false),
        }
    }

    pub fn get(&self) -> Option<AccessToken> {
        self.state.borrow().access_token.clone()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.borrow().hydrated
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn set(&self, token: AccessToken) {
        self.written.store(true, Ordering::SeqCst);
        self.state.send_modify(|s| s.access_token = Some(token));
        self.persist().await;
    }

    pub async fn clear(&self) {
        self.written.store(true, Ordering::SeqCst);
        self.state.send_modify(|s| s.access_token = None);
        self.persist().await;
    }

    /// Load the persisted token once and flip `hydrated`. A value written
    /// in-process before loading finished wins over the stored one.
    pub async fn rehydrate(&self) {
        if self.is_hydrated() {
            return;
        }
        let loaded = match self.persistence.load().await {
            Ok(token) => token,
            Err(e) => {
                warn!("could not restore session, starting logged out: {:#}", e);
                None
            }
        };
        let written = self.written.load(Ordering::SeqCst);
        self.state.send_modify(|s| {
            if !written {
                s.access_token = loaded;
            }
            s.hydrated = true;
        });
        debug!("session rehydrated");
    }

    pub async fn wait_hydrated(&self) {
        let mut rx = self.state.subscribe();
        // the sender lives in self, so this cannot observe a closed channel
        let _ = rx.wait_for(|s| s.hydrated).await;
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let current = self.get();
        if let Err(e) = self.persistence.save(current.as_ref()).await {
            warn!("could not persist session: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::persistence::MemorySessionPersistence;

    struct BrokenPersistence;

    #[async_trait::async_trait]
    impl SessionPersistence for BrokenPersistence {
        async fn load(&self) -> anyhow::Result<Option<AccessToken>> {
            anyhow::bail!("disk on fire")
        }
        async fn save(&self, _token: Option<&AccessToken>) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    fn token(s: &str) -> AccessToken {
        AccessToken(s.into())
    }

    #[tokio::test]
    async fn gate_is_pending_until_rehydrated() {
        let store = SessionStore::new(Arc::new(MemorySessionPersistence::with_token(token("t"))));

        assert_eq!(store.get(), None);
        assert_eq!(auth_gate(&store.snapshot()), Gate::Pending);

        store.rehydrate().await;
        assert_eq!(store.get(), Some(token("t")));
        assert_eq!(auth_gate(&store.snapshot()), Gate::Authenticated);
    }

    #[tokio::test]
    async fn empty_storage_hydrates_unauthenticated() {
        let store = SessionStore::new(Arc::new(MemorySessionPersistence::new()));
        store.rehydrate().await;
        assert_eq!(auth_gate(&store.snapshot()), Gate::Unauthenticated);
    }

    #[tokio::test]
    async fn failed_load_still_hydrates() {
        let store = SessionStore::new(Arc::new(BrokenPersistence));
        store.rehydrate().await;
        assert!(store.is_hydrated());
        assert_eq!(store.get(), None);

        // persistence failures do not undo the in-memory write
        store.set(token("t")).await;
        assert_eq!(store.get(), Some(token("t")));
    }

    #[tokio::test]
    async fn wait_hydrated_blocks_until_rehydrate() {
        let store = Arc::new(SessionStore::new(Arc::new(MemorySessionPersistence::new())));
        let waiter = tokio::spawn({
            let store = store.clone();
            async move { store.wait_hydrated().await }
        });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        store.rehydrate().await;
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn writes_go_through_to_storage() {
        let persistence = Arc::new(MemorySessionPersistence::new());
        let store = SessionStore::new(persistence.clone());
        store.rehydrate().await;

        store.set(token("a")).await;
        assert_eq!(persistence.stored(), Some(token("a")));

        store.clear().await;
        assert_eq!(persistence.stored(), None);
        assert_eq!(store.get(), None);
    }

    #[tokio::test]
    async fn write_before_rehydrate_is_kept() {
        let store = SessionStore::new(Arc::new(MemorySessionPersistence::with_token(token("old"))));
        store.set(token("new")).await;
        store.rehydrate().await;
        assert_eq!(store.get(), Some(token("new")));
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = SessionStore::new(Arc::new(MemorySessionPersistence::new()));
        let mut rx = store.subscribe();

        store.rehydrate().await;
        store.set(token("a")).await;

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().access_token, Some(token("a")));
    }
}
