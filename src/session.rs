// ============================================================================
// SESSION STATE — per-upload editing state with TTL eviction
// ============================================================================
//
// A session owns the current image, the active layer set, the cached model
// embedding, and the candidates from the last promptable pick. The store
// hands out each session behind its own mutex so a pick and an edit racing
// on the same session serialize instead of tearing state; the outer map
// lock is held only for lookup, insert and remove.
//
// Sessions idle longer than the TTL are swept on every store operation, so
// an abandoned upload cannot pin its pixel buffers forever.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use image::RgbImage;
use log::{debug, info};
use serde::Serialize;
use uuid::Uuid;

use crate::error::EngineError;
use crate::layering::LayeringReport;
use crate::layers::LayerSet;
use crate::model::{Embedding, MaskCandidate};
use crate::segment::SegMode;

/// Default idle lifetime before a session is evicted.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Serialize)]
pub struct SessionMeta {
    pub width: u32,
    pub height: u32,
    pub mode: SegMode,
    pub report: Option<LayeringReport>,
}

pub struct EditSession {
    pub id: Uuid,
    /// Current image; edits replace it wholesale, never mutate in place.
    pub image: RgbImage,
    pub layers: LayerSet,
    pub embedding: Option<Embedding>,
    /// Ranked candidates retained from the last promptable pick.
    pub candidates: Option<Vec<MaskCandidate>>,
    pub meta: SessionMeta,
}

impl EditSession {
    pub fn new(
        image: RgbImage,
        layers: LayerSet,
        mode: SegMode,
        report: Option<LayeringReport>,
        embedding: Option<Embedding>,
    ) -> EditSession {
        let (width, height) = image.dimensions();
        EditSession {
            id: Uuid::new_v4(),
            image,
            layers,
            embedding,
            candidates: None,
            meta: SessionMeta { width, height, mode, report },
        }
    }
}

struct Entry {
    session: Arc<Mutex<EditSession>>,
    last_touch: Instant,
}

pub struct SessionStore {
    entries: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    /// `ttl` of zero disables eviction.
    pub fn new(ttl: Duration) -> SessionStore {
        SessionStore { entries: RwLock::new(HashMap::new()), ttl }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a new session and return its token.
    pub fn insert(&self, session: EditSession) -> Uuid {
        self.sweep();
        let id = session.id;
        let entry = Entry { session: Arc::new(Mutex::new(session)), last_touch: Instant::now() };
        self.entries.write().unwrap().insert(id, entry);
        info!("session {} created ({} live)", id, self.len());
        id
    }

    /// Run `f` with exclusive access to the session, refreshing its TTL.
    pub fn with<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut EditSession) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        self.sweep();
        let handle = {
            let mut entries = self.entries.write().unwrap();
            let entry = entries.get_mut(&id).ok_or(EngineError::SessionNotFound(id))?;
            entry.last_touch = Instant::now();
            Arc::clone(&entry.session)
        };
        // The map lock is released before the per-session lock is taken, so
        // a long edit on one session never blocks lookups of another.
        let mut session = handle.lock().unwrap();
        f(&mut session)
    }

    pub fn delete(&self, id: Uuid) -> bool {
        let removed = self.entries.write().unwrap().remove(&id).is_some();
        if removed {
            info!("session {} deleted", id);
        }
        removed
    }

    /// Drop sessions idle longer than the TTL.
    fn sweep(&self) {
        if self.ttl.is_zero() {
            return;
        }
        let now = Instant::now();
        let expired: Vec<Uuid> = {
            let entries = self.entries.read().unwrap();
            entries
                .iter()
                .filter(|(_, e)| now.duration_since(e.last_touch) > self.ttl)
                .map(|(&id, _)| id)
                .collect()
        };
        if expired.is_empty() {
            return;
        }
        let mut entries = self.entries.write().unwrap();
        for id in expired {
            // Re-check under the write lock; the session may have been
            // touched between the two lock acquisitions.
            let still_expired = entries
                .get(&id)
                .map(|e| now.duration_since(e.last_touch) > self.ttl)
                .unwrap_or(false);
            if still_expired {
                entries.remove(&id);
                debug!("session {} expired", id);
            }
        }
    }
}
