//! Ephemeral per-user authoring sessions. A user's slot is guarded by its
//! own mutex: events for one user are serialized, distinct users proceed
//! in parallel. Nothing here survives a restart — that is by design.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use sotto_types::{MediaAttachment, Topic};

/// Draft content captured while authoring. Text posts never carry a
/// caption; media posts never carry separate body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftBody {
    Text(String),
    Media {
        attachment: MediaAttachment,
        caption: Option<String>,
    },
}

impl DraftBody {
    /// The text column value for storage: body text, or the media caption.
    pub fn stored_content(&self) -> Option<&str> {
        match self {
            DraftBody::Text(text) => Some(text),
            DraftBody::Media { caption, .. } => caption.as_deref(),
        }
    }

    pub fn media(&self) -> Option<&MediaAttachment> {
        match self {
            DraftBody::Text(_) => None,
            DraftBody::Media { attachment, .. } => Some(attachment),
        }
    }
}

/// Current step of the authoring dialogue. Each variant carries exactly the
/// draft fields valid at that step; `Idle` is the absence of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Typing,
    Captioning { attachment: MediaAttachment },
    ChoosingTopic { body: DraftBody },
    Confirming { body: DraftBody, topic: Topic },
    Commenting { post_external_id: i64 },
    Replying { post_external_id: i64, parent_comment_id: i64 },
}

#[derive(Debug)]
pub struct SessionSlot {
    pub step: Option<Step>,
    last_activity: Instant,
}

impl SessionSlot {
    fn new() -> Self {
        Self { step: None, last_activity: Instant::now() }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn clear(&mut self) {
        self.step = None;
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// All live sessions, keyed by user id.
pub struct SessionMap {
    inner: RwLock<HashMap<i64, Arc<Mutex<SessionSlot>>>>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self { inner: RwLock::new(HashMap::new()) }
    }

    /// The slot for a user, created on first interaction. Callers hold the
    /// slot mutex for the whole event so a user's transitions never
    /// interleave.
    pub async fn slot(&self, user_id: i64) -> Arc<Mutex<SessionSlot>> {
        if let Some(slot) = self.inner.read().await.get(&user_id) {
            return slot.clone();
        }

        self.inner
            .write()
            .await
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(SessionSlot::new())))
            .clone()
    }

    /// Drop slots idle for at least `ttl`. Slots currently locked by an
    /// in-flight event are skipped. Returns how many were dropped.
    pub async fn purge_idle(&self, ttl: Duration) -> usize {
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|_, slot| match slot.try_lock() {
            Ok(guard) => guard.idle_for() < ttl,
            Err(_) => true,
        });
        before - map.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for SessionMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_types::MediaKind;

    #[tokio::test]
    async fn slot_is_stable_per_user() {
        let sessions = SessionMap::new();
        let a = sessions.slot(1).await;
        let b = sessions.slot(1).await;
        assert!(Arc::ptr_eq(&a, &b));

        let other = sessions.slot(2).await;
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(sessions.len().await, 2);
    }

    #[tokio::test]
    async fn purge_drops_idle_sessions() {
        let sessions = SessionMap::new();
        sessions.slot(1).await;
        sessions.slot(2).await;

        // Everything is "idle" relative to a zero TTL.
        assert!(!sessions.is_empty().await);
        assert_eq!(sessions.purge_idle(Duration::ZERO).await, 2);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn purge_keeps_recent_and_locked_sessions() {
        let sessions = SessionMap::new();
        sessions.slot(1).await;
        assert_eq!(sessions.purge_idle(Duration::from_secs(3600)).await, 0);

        let locked = sessions.slot(1).await;
        let _guard = locked.lock().await;
        assert_eq!(sessions.purge_idle(Duration::ZERO).await, 0);
        assert_eq!(sessions.len().await, 1);
    }

    #[test]
    fn stored_content_per_body() {
        let text = DraftBody::Text("hello".into());
        assert_eq!(text.stored_content(), Some("hello"));
        assert!(text.media().is_none());

        let media = DraftBody::Media {
            attachment: MediaAttachment { kind: MediaKind::Photo, file_id: "f".into() },
            caption: Some("cap".into()),
        };
        assert_eq!(media.stored_content(), Some("cap"));
        assert_eq!(media.media().unwrap().file_id, "f");

        let sticker = DraftBody::Media {
            attachment: MediaAttachment { kind: MediaKind::Sticker, file_id: "s".into() },
            caption: None,
        };
        assert_eq!(sticker.stored_content(), None);
    }
}
