use tabled::Table;

use crate::{
    cli::{fail, session, spinner},
    config, info,
    spotify::SpotifyCatalog,
    types::TrackTableRow,
    utils, warning,
};

pub async fn list_tracks(playlist_id: String) {
    let tokens = match session().await {
        Ok(tokens) => tokens,
        Err(e) => fail("Cannot sign in", &e),
    };
    let catalog = SpotifyCatalog::new(tokens, config::spotify_apiurl());

    let pb = spinner("Fetching tracks...");
    let tracks = match catalog.tracks(&playlist_id).await {
        Ok(tracks) => tracks,
        Err(e) => {
            pb.finish_and_clear();
            fail(&format!("Cannot fetch tracks of {}", playlist_id), &e)
        }
    };
    pb.finish_and_clear();

    if tracks.is_empty() {
        warning!("Playlist {} has no tracks.", playlist_id);
        return;
    }

    let count = tracks.len();
    let rows: Vec<TrackTableRow> = tracks
        .into_iter()
        .map(|t| TrackTableRow {
            artists: utils::truncate(&t.artist_names.join(", "), 32),
            name: utils::truncate(&t.name, 40),
            album: utils::truncate(&t.album_name, 32),
            uri: t.uri,
        })
        .collect();

    println!("{}", Table::new(rows));
    info!(
        "{} tracks. Pick one with --pick track:{}:<uri>",
        count, playlist_id
    );
}
