#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::Router;
use sporldl::{
    Error, Result,
    spotify::TrackSource,
    types::{Playlist, Track},
};
use tokio::net::TcpListener;

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("test server address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{}", addr)
}

pub fn track(uri: &str) -> Track {
    Track {
        uri: uri.to_string(),
        name: format!("Song {}", uri),
        artist_names: vec!["Artist A".to_string(), "Artist B".to_string()],
        album_name: "Album".to_string(),
        cover_image_url: None,
    }
}

pub fn tracks(uris: &[&str]) -> Vec<Track> {
    uris.iter().map(|uri| track(uri)).collect()
}

pub fn playlist(id: &str, name: &str) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: name.to_string(),
        cover_image_url: None,
        owner_name: "me".to_string(),
        declared_track_count: 0,
    }
}

/// In-memory track source counting fetches per playlist.
#[derive(Default)]
pub struct FakeTracks {
    listings: HashMap<String, Vec<Track>>,
    failing: Vec<String>,
    calls: Mutex<HashMap<String, usize>>,
    total_calls: AtomicUsize,
}

impl FakeTracks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, playlist_id: &str, uris: &[&str]) -> Self {
        self.listings.insert(playlist_id.to_string(), tracks(uris));
        self
    }

    pub fn failing(mut self, playlist_id: &str) -> Self {
        self.failing.push(playlist_id.to_string());
        self
    }

    pub fn calls(&self, playlist_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(playlist_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackSource for FakeTracks {
    async fn fetch_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(playlist_id.to_string())
            .or_insert(0) += 1;
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        // let concurrent callers pile up behind the first fetch
        tokio::task::yield_now().await;

        if self.failing.iter().any(|id| id == playlist_id) {
            return Err(Error::Http {
                status: 500,
                url: format!("fake://{}", playlist_id),
            });
        }
        Ok(self.listings.get(playlist_id).cloned().unwrap_or_default())
    }
}
