use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;
use tracing::debug;

use crate::{
    backend::{
        DownloadRequest, HttpBackend, JobBackend, JobMonitor, JobSubscription, MonitorSnapshot,
    },
    batch,
    cli::{fail, job, session, spinner},
    config, error, info,
    management::{CatalogCache, SelectionModel, SelectionOp},
    spotify::SpotifyCatalog,
    types::{Playlist, Quality, SelectionTableRow},
    utils, warning,
};

pub struct DownloadOptions {
    pub picks: Vec<SelectionOp>,
    pub everything: bool,
    pub quality: Quality,
    pub output_path: String,
    pub user_id: Option<String>,
}

pub async fn download(options: DownloadOptions) {
    if options.picks.is_empty() && !options.everything {
        error!("Nothing to download. Choose playlists with --pick or --everything.");
    }

    let tokens = match session().await {
        Ok(tokens) => tokens,
        Err(e) => fail("Cannot sign in", &e),
    };
    let catalog = SpotifyCatalog::new(tokens, config::spotify_apiurl());

    let pb = spinner("Fetching playlists...");
    let playlists = match catalog.playlists().await {
        Ok(playlists) => playlists,
        Err(e) => {
            pb.finish_and_clear();
            fail("Cannot fetch playlists", &e)
        }
    };
    pb.finish_and_clear();

    let cache = CatalogCache::new();
    let mut selection = SelectionModel::new();

    if options.everything {
        selection.toggle_every(playlists.iter().map(|p| p.id.as_str()));
    }

    for op in &options.picks {
        if !playlists.iter().any(|p| p.id == op.playlist_id()) {
            warning!("Playlist {} is not in your library, skipping.", op.playlist_id());
            continue;
        }

        match op {
            SelectionOp::SelectAll(playlist_id) => selection.select_all_explicit(playlist_id),
            SelectionOp::Toggle(playlist_id) => selection.toggle_collection(playlist_id),
            SelectionOp::ToggleTrack { playlist_id, uri } => {
                // member toggles need the fully drained listing
                let tracks = match cache.open(playlist_id, &catalog).await {
                    Ok(tracks) => tracks,
                    Err(e) => fail(&format!("Cannot load tracks of {}", playlist_id), &e),
                };
                if !tracks.iter().any(|t| &t.uri == uri) {
                    warning!("Track {} is not in playlist {}, skipping.", uri, playlist_id);
                    continue;
                }
                selection.toggle_member(playlist_id, uri, &tracks);
            }
        }
    }

    if selection.is_empty() {
        warning!("Nothing selected.");
        return;
    }
    print_selection(&selection, &playlists);

    let pb = spinner("Preparing download...");
    let batches = match batch::build(&selection, &playlists, &cache, &catalog).await {
        Ok(batches) => batches,
        Err(e) => {
            pb.finish_and_clear();
            fail("Cannot prepare the download", &e)
        }
    };
    pb.finish_and_clear();

    if batches.is_empty() {
        warning!("The selected playlists contain no tracks.");
        return;
    }

    let total = batch::track_count(&batches);
    info!(
        "Submitting {} tracks from {} playlists at {}.",
        total,
        batches.len(),
        options.quality
    );

    let backend = Arc::new(HttpBackend::new(config::backend_url(), options.user_id));
    if let Some(user_id) = backend.user_id() {
        info!("Session: {}", user_id);
    }

    let monitor = JobMonitor::new(Arc::clone(&backend), config::poll_interval());
    let request = DownloadRequest {
        playlists: batches,
        quality: options.quality,
        output_path: options.output_path,
    };
    let subscription = match monitor.submit(&request).await {
        Ok(subscription) => subscription,
        Err(e) => fail("Cannot start the download", &e),
    };

    let outcome = follow(&monitor, subscription, total as u64).await;
    monitor.stop();
    job::report_outcome(&backend, &outcome);
}

fn print_selection(selection: &SelectionModel, playlists: &[Playlist]) {
    let rows: Vec<SelectionTableRow> = selection
        .iter()
        .filter_map(|(playlist_id, _)| {
            let playlist = playlists.iter().find(|p| p.id == playlist_id)?;
            Some(SelectionTableRow {
                playlist: utils::truncate(&playlist.name, 48),
                selection: selection.label(playlist_id)?,
            })
        })
        .collect();

    println!("{}", Table::new(rows));
}

/// Renders job progress until the monitor reaches a terminal phase. The first
/// Ctrl-C asks the backend to cancel, a second one gives up waiting.
async fn follow<B: JobBackend + 'static>(
    monitor: &JobMonitor<B>,
    mut subscription: JobSubscription,
    expected: u64,
) -> MonitorSnapshot {
    let pb = ProgressBar::new(expected);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.blue} [{bar:30.green/white}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message("Waiting for the backend...");

    let mut cancel_requested = false;

    loop {
        tokio::select! {
            changed = subscription.changed() => {
                let Some(snapshot) = changed else {
                    pb.finish_and_clear();
                    return subscription.snapshot();
                };

                if let Some(status) = &snapshot.status {
                    if status.total_count > 0 {
                        pb.set_length(status.total_count);
                    }
                    pb.set_position(status.completed_count);
                    if !cancel_requested {
                        let current = status
                            .currently_processing()
                            .map(|name| utils::truncate(name, 48))
                            .unwrap_or_else(|| status.state.to_string());
                        pb.set_message(current);
                    }
                }

                if snapshot.phase.is_terminal() {
                    pb.finish_and_clear();
                    return snapshot;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if cancel_requested {
                    pb.abandon();
                    error!("Stopped waiting. The backend may still be cancelling the job.");
                }

                cancel_requested = true;
                pb.set_message("Cancelling...");
                match monitor.cancel().await {
                    Ok(()) => debug!("cancel request delivered"),
                    Err(e) => warning!("Cancel request failed: {}", e),
                }
            }
        }
    }
}
