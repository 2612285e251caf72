pub mod wizard;

pub use wizard::{ConversionSetup, OutputMode, Wizard, WizardStep};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-user session state. Each session is touched only by its own user's
/// sequential interactions; the lock exists for the map, not for contention
/// within one session.
#[derive(Debug, Default)]
pub struct UserSession {
    pub wizard: Wizard,
    pub last_file_hint: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<i64, UserSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn update<R>(&self, user_id: i64, f: impl FnOnce(&mut UserSession) -> R) -> R {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id).or_default();
        f(session)
    }

    pub async fn reset(&self, user_id: i64) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&user_id) {
            session.wizard.reset();
            session.last_file_hint = None;
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}
