use tabled::Table;

use crate::{
    cli::{fail, session, spinner},
    config,
    spotify::SpotifyCatalog,
    types::PlaylistTableRow,
    utils, warning,
};

pub async fn list_playlists(search: Option<String>) {
    let tokens = match session().await {
        Ok(tokens) => tokens,
        Err(e) => fail("Cannot sign in", &e),
    };
    let catalog = SpotifyCatalog::new(tokens, config::spotify_apiurl());

    let pb = spinner("Fetching playlists...");
    let mut playlists = match catalog.playlists().await {
        Ok(playlists) => playlists,
        Err(e) => {
            pb.finish_and_clear();
            fail("Cannot fetch playlists", &e)
        }
    };
    pb.finish_and_clear();

    if let Some(search) = search {
        let search_term = search.to_lowercase();
        playlists.retain(|p| p.name.to_lowercase().contains(&search_term));
    }

    if playlists.is_empty() {
        warning!("No playlists found.");
        return;
    }

    let rows: Vec<PlaylistTableRow> = playlists
        .into_iter()
        .map(|p| PlaylistTableRow {
            id: p.id,
            name: utils::truncate(&p.name, 48),
            owner: p.owner_name,
            tracks: p.declared_track_count,
        })
        .collect();

    println!("{}", Table::new(rows));
}
