mod common;

use sporldl::{
    Error, batch,
    management::{CatalogCache, SelectionModel},
};

use common::{FakeTracks, playlist, tracks};

fn uris(batch: &sporldl::types::PlaylistBatch) -> Vec<&str> {
    batch.tracks.iter().map(|t| t.uri.as_str()).collect()
}

#[tokio::test]
async fn test_uncached_all_selection_is_fetched_once_without_caching() {
    let playlists = vec![playlist("p1", "Road Trip")];
    let source = FakeTracks::new().with("p1", &["a", "b", "c"]);
    let cache = CatalogCache::new();
    let mut selection = SelectionModel::new();
    selection.select_all_explicit("p1");

    let batches = batch::build(&selection, &playlists, &cache, &source)
        .await
        .unwrap();

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].name, "Road Trip");
    assert_eq!(uris(&batches[0]), vec!["a", "b", "c"]);
    assert_eq!(source.calls("p1"), 1);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_cached_listing_is_filtered_by_selection() {
    let playlists = vec![playlist("p1", "Road Trip")];
    let source = FakeTracks::new();
    let cache = CatalogCache::new();
    cache.insert("p1", tracks(&["a", "b", "c", "d"]));

    let known = cache.get("p1").unwrap();
    let mut selection = SelectionModel::new();
    selection.select_all_explicit("p1");
    selection.toggle_member("p1", "b", &known);
    selection.toggle_member("p1", "d", &known);

    let batches = batch::build(&selection, &playlists, &cache, &source)
        .await
        .unwrap();

    // Cached order is kept, not the set's order
    assert_eq!(uris(&batches[0]), vec!["a", "c"]);
    assert_eq!(source.total_calls(), 0);
}

#[tokio::test]
async fn test_all_selection_uses_cached_listing() {
    let playlists = vec![playlist("p1", "Road Trip")];
    let source = FakeTracks::new().with("p1", &["stale"]);
    let cache = CatalogCache::new();
    cache.insert("p1", tracks(&["a", "b"]));
    let mut selection = SelectionModel::new();
    selection.toggle_collection("p1");

    let batches = batch::build(&selection, &playlists, &cache, &source)
        .await
        .unwrap();

    assert_eq!(uris(&batches[0]), vec!["a", "b"]);
    assert_eq!(source.total_calls(), 0);
}

#[tokio::test]
async fn test_batches_follow_selection_order_and_skip_empty_results() {
    let playlists = vec![
        playlist("p1", "One"),
        playlist("p2", "Two"),
        playlist("p3", "Three"),
    ];
    let source = FakeTracks::new()
        .with("p1", &["a"])
        .with("p2", &[])
        .with("p3", &["c"]);
    let cache = CatalogCache::new();
    let mut selection = SelectionModel::new();
    selection.select_all_explicit("p3");
    selection.select_all_explicit("p2");
    selection.select_all_explicit("p1");

    let batches = batch::build(&selection, &playlists, &cache, &source)
        .await
        .unwrap();

    let names: Vec<&str> = batches.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Three", "One"]);
    assert_eq!(batch::track_count(&batches), 2);
}

#[tokio::test]
async fn test_partial_selection_of_tracks_no_longer_listed_is_omitted() {
    let playlists = vec![playlist("p1", "One")];
    let source = FakeTracks::new();
    let cache = CatalogCache::new();
    cache.insert("p1", tracks(&["a", "b"]));
    let mut selection = SelectionModel::new();
    selection.toggle_member("p1", "gone", &tracks(&["gone"]));

    let batches = batch::build(&selection, &playlists, &cache, &source)
        .await
        .unwrap();

    assert!(batches.is_empty());
}

#[tokio::test]
async fn test_selected_ids_missing_from_index_are_skipped() {
    let playlists = vec![playlist("p1", "One")];
    let source = FakeTracks::new().with("p1", &["a"]).with("ghost", &["g"]);
    let cache = CatalogCache::new();
    let mut selection = SelectionModel::new();
    selection.select_all_explicit("ghost");
    selection.select_all_explicit("p1");

    let batches = batch::build(&selection, &playlists, &cache, &source)
        .await
        .unwrap();

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].name, "One");
    assert_eq!(source.calls("ghost"), 0);
}

#[tokio::test]
async fn test_fetch_failure_aborts_the_build() {
    let playlists = vec![playlist("p1", "One"), playlist("p2", "Two")];
    let source = FakeTracks::new().with("p1", &["a"]).failing("p2");
    let cache = CatalogCache::new();
    let mut selection = SelectionModel::new();
    selection.select_all_explicit("p1");
    selection.select_all_explicit("p2");

    let err = batch::build(&selection, &playlists, &cache, &source)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http { status: 500, .. }));
    // Selection is untouched
    assert_eq!(selection.len(), 2);
}

#[tokio::test]
async fn test_empty_selection_builds_nothing() {
    let source = FakeTracks::new();
    let batches = batch::build(
        &SelectionModel::new(),
        &[playlist("p1", "One")],
        &CatalogCache::new(),
        &source,
    )
    .await
    .unwrap();

    assert!(batches.is_empty());
    assert_eq!(batch::track_count(&batches), 0);
}
