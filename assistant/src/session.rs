use crate::chat_session::ChatSession;
use crate::models::ExtractedDocument;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Everything one browser tab accumulates: the chat and the last uploaded PDF.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub chat: ChatSession,
    pub document: Option<ExtractedDocument>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            chat: ChatSession::new(),
            document: None,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    /// How long the session has gone without a request.
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_seen).to_std().unwrap_or_default()
    }
}

/// In-memory sessions keyed by id.
///
/// The map lock is only held to find, insert or remove an entry; callers then
/// lock the session itself, which serializes requests within one session.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Returns the session, creating it on first use.
    pub async fn get_or_create(&self, id: Uuid) -> Arc<Mutex<Session>> {
        if let Some(session) = self.get(id).await {
            return session;
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id)
            .or_insert_with(|| {
                log::info!("Starting session {}", id);
                Arc::new(Mutex::new(Session::new(id)))
            })
            .clone()
    }

    /// Locks the session for one request, creating it on first use.
    pub async fn open(&self, id: Uuid) -> OwnedMutexGuard<Session> {
        let mut session = self.get_or_create(id).await.lock_owned().await;
        session.touch();
        session
    }

    /// Locks an existing session; unknown ids stay unknown.
    pub async fn peek(&self, id: Uuid) -> Option<OwnedMutexGuard<Session>> {
        let mut session = self.get(id).await?.lock_owned().await;
        session.touch();
        Some(session)
    }

    /// Ends a session; returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            log::info!("Ended session {}", id);
        }
        removed
    }

    /// Drops sessions idle for at least `ttl`. A session whose lock is held is
    /// in the middle of a request and is kept.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, session| match session.try_lock() {
            Ok(session) if session.idle_for(now) >= ttl => {
                log::info!("Expiring idle session {}", id);
                false
            }
            _ => true,
        });

        before - sessions.len()
    }

    /// Runs [`SessionStore::evict_idle`] every `every` until the runtime shuts down.
    pub fn spawn_idle_sweep(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(ttl).await;
                if evicted > 0 {
                    log::info!("Expired {} idle session(s)", evicted);
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
