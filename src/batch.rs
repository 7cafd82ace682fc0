//! Batch Builder: where the user's selection meets the tracks that exist.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::Result,
    management::{CatalogCache, SelectionModel},
    spotify::TrackSource,
    types::{Playlist, PlaylistBatch, Track},
};

/// Materializes `selection` into one batch per selected playlist, in the
/// selection's order.
///
/// Cached listings are filtered by the selection. A playlist that was never
/// opened (so it can only be selected wholesale) is fetched once through
/// `source`; that listing is used for this build only and is not written to
/// `cache`. Playlists left with no tracks are omitted, as are ids missing
/// from `playlists`.
///
/// The caller must keep `selection` unchanged until this returns.
///
/// # Errors
///
/// Fails with the first error of a one-off fetch. Nothing is submitted and
/// the selection is left as it was.
pub async fn build<S>(
    selection: &SelectionModel,
    playlists: &[Playlist],
    cache: &CatalogCache,
    source: &S,
) -> Result<Vec<PlaylistBatch>>
where
    S: TrackSource + ?Sized,
{
    let mut batches = Vec::new();

    for (playlist_id, entry) in selection.iter() {
        let Some(playlist) = playlists.iter().find(|p| p.id == playlist_id) else {
            warn!(playlist_id, "selected playlist is not in the index, skipping");
            continue;
        };

        let listing: Arc<Vec<Track>> = match cache.get(playlist_id) {
            Some(cached) => cached,
            None => {
                debug!(playlist_id, "building from a one-off fetch");
                Arc::new(source.fetch_tracks(playlist_id).await?)
            }
        };

        let tracks: Vec<Track> = listing
            .iter()
            .filter(|track| entry.includes(&track.uri))
            .cloned()
            .collect();

        if tracks.is_empty() {
            debug!(playlist_id, "nothing selected, omitted from batch");
            continue;
        }

        batches.push(PlaylistBatch {
            name: playlist.name.clone(),
            tracks,
        });
    }

    Ok(batches)
}

pub fn track_count(batches: &[PlaylistBatch]) -> usize {
    batches.iter().map(|batch| batch.tracks.len()).sum()
}
