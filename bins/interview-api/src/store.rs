// In-memory session registry
use interview_core::InterviewSession;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

struct Entry {
    session: Arc<Mutex<InterviewSession>>,
    last_used: Instant,
}

/// Sessions keyed by id.
///
/// Each session sits behind its own mutex so turns on one session are
/// serialized while different sessions proceed independently.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: InterviewSession) -> Arc<Mutex<InterviewSession>> {
        let id = session.id();
        let entry = Entry {
            session: Arc::new(Mutex::new(session)),
            last_used: Instant::now(),
        };
        let handle = entry.session.clone();
        self.sessions.write().await.insert(id, entry);
        handle
    }

    /// Look up a session and mark it as used
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<InterviewSession>>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_used = Instant::now();
        Some(entry.session.clone())
    }

    /// Discard a session; false when it did not exist
    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop sessions idle past `idle_ttl`, or past `finished_ttl` once they
    /// reached feedback. Sessions mid-turn are kept. Returns how many went.
    pub async fn evict_expired(&self, idle_ttl: Duration, finished_ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, entry| {
            let idle = entry.last_used.elapsed();
            match entry.session.try_lock() {
                Ok(session) if session.phase().is_terminal() => idle < finished_ttl,
                Ok(_) => idle < idle_ttl,
                Err(_) => true,
            }
        });

        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
