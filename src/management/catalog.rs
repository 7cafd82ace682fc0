use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::{error::Result, spotify::TrackSource, types::Track};

type Slot = Arc<OnceCell<Arc<Vec<Track>>>>;

/// Track listings per playlist id, each fetched at most once.
///
/// A slot is created on first `open` and filled by exactly one fetch; a second
/// `open` for the same id while that fetch is running awaits it. A failed
/// fetch leaves the slot empty so the next `open` tries again.
#[derive(Default)]
pub struct CatalogCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open<S>(&self, playlist_id: &str, source: &S) -> Result<Arc<Vec<Track>>>
    where
        S: TrackSource + ?Sized,
    {
        let slot = self.slot(playlist_id);
        let tracks = slot
            .get_or_try_init(|| async {
                debug!(playlist_id, "track listing not cached, fetching");
                source.fetch_tracks(playlist_id).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(tracks))
    }

    pub fn insert(&self, playlist_id: &str, tracks: Vec<Track>) {
        let slot = Arc::new(OnceCell::new_with(Some(Arc::new(tracks))));
        self.lock().insert(playlist_id.to_string(), slot);
    }

    pub fn get(&self, playlist_id: &str) -> Option<Arc<Vec<Track>>> {
        self.lock()
            .get(playlist_id)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, playlist_id: &str) -> bool {
        self.get(playlist_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, playlist_id: &str) -> Slot {
        let mut slots = self.lock();
        Arc::clone(slots.entry(playlist_id.to_string()).or_default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
