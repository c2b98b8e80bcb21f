//! Owned table of pending sessions.
//!
//! The outer `RwLock` only guards membership. Each session sits behind its
//! own mutex, so operations on distinct sessions never wait on each other and
//! every state change of one session is a single check-and-set under its
//! lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::PendingSession;

pub(crate) type SessionSlot = Arc<Mutex<PendingSession>>;

#[derive(Debug, Default)]
pub(crate) struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionSlot>>,
}

impl SessionStore {
    pub(crate) async fn insert(&self, session: PendingSession) {
        let id = session.session_id;
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
    }

    pub(crate) async fn get(&self, id: &Uuid) -> Option<SessionSlot> {
        self.sessions.read().await.get(id).cloned()
    }

    pub(crate) async fn remove(&self, id: &Uuid) {
        self.sessions.write().await.remove(id);
    }

    pub(crate) async fn snapshot(&self) -> Vec<(Uuid, SessionSlot)> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect()
    }

    pub(crate) async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
