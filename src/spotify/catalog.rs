use std::{collections::HashSet, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    management::{TokenExchange, TokenManager},
    types::{Page, Playlist, PlaylistObject, PlaylistTrackItem, Track},
};

const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Something a paginated listing yields.
pub trait CatalogItem: Sized {
    /// Wire shape of one entry of the page's `items` array.
    type Raw: DeserializeOwned;

    /// `None` drops the entry, e.g. a playlist slot whose track was removed.
    fn from_raw(raw: Self::Raw) -> Option<Self>;

    fn identity(&self) -> &str;
}

impl CatalogItem for Playlist {
    type Raw = PlaylistObject;

    fn from_raw(raw: PlaylistObject) -> Option<Self> {
        Some(raw.into())
    }

    fn identity(&self) -> &str {
        &self.id
    }
}

impl CatalogItem for Track {
    type Raw = PlaylistTrackItem;

    fn from_raw(raw: PlaylistTrackItem) -> Option<Self> {
        raw.track.map(Track::from)
    }

    fn identity(&self) -> &str {
        &self.uri
    }
}

/// Source of a playlist's complete track listing.
#[async_trait]
pub trait TrackSource: Send + Sync {
    async fn fetch_tracks(&self, playlist_id: &str) -> Result<Vec<Track>>;
}

/// Drains a cursor-paginated listing starting at `start_url`.
///
/// Pages are requested in order, each with a bearer token validated by
/// `tokens` just before the request. Items keep the order they arrived in;
/// an item whose identity was already seen in this drain is dropped.
///
/// # Errors
///
/// - [`Error::Auth`] if no usable token is available before a page
/// - [`Error::PaginationAuth`] if the catalog answers 401 on any page
/// - [`Error::Http`] for other non-success statuses
/// - [`Error::MalformedResponse`] if a page cannot be decoded
pub async fn fetch_all<T, E>(
    client: &Client,
    start_url: &str,
    tokens: &TokenManager<E>,
) -> Result<Vec<T>>
where
    T: CatalogItem,
    E: TokenExchange,
{
    let mut items: Vec<T> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut next = Some(start_url.to_string());
    let mut pages = 0usize;

    while let Some(url) = next.take() {
        let page: Page<T::Raw> = fetch_page(client, &url, tokens).await?;
        pages += 1;

        for raw in page.items {
            let Some(item) = T::from_raw(raw) else {
                continue;
            };
            if seen.insert(item.identity().to_string()) {
                items.push(item);
            }
        }

        next = page.next.filter(|url| !url.is_empty());
    }

    debug!(start_url, pages, items = items.len(), "listing drained");
    Ok(items)
}

/// One page, waiting out short rate limits. The token is taken again on
/// every attempt since a wait can outlast it.
async fn fetch_page<R, E>(client: &Client, url: &str, tokens: &TokenManager<E>) -> Result<Page<R>>
where
    R: DeserializeOwned,
    E: TokenExchange,
{
    loop {
        let token = tokens.access_token().await?;
        let response = client.get(url).bearer_auth(&token).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(Error::PaginationAuth {
                    url: url.to_string(),
                });
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after_secs(&response);
                if retry_after <= MAX_RETRY_AFTER_SECS {
                    warn!(url, retry_after, "rate limited, waiting");
                    sleep(Duration::from_secs(retry_after)).await;
                    continue;
                }
                return Err(Error::Http {
                    status: StatusCode::TOO_MANY_REQUESTS.as_u16(),
                    url: url.to_string(),
                });
            }
            status if !status.is_success() => {
                return Err(Error::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            _ => {}
        }

        let body = response.text().await?;
        return serde_json::from_str(&body)
            .map_err(|e| Error::MalformedResponse(format!("{}: {}", url, e)));
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(1)
}

/// The signed-in user's view of the Spotify catalog.
pub struct SpotifyCatalog<E> {
    client: Client,
    api_url: String,
    tokens: Arc<TokenManager<E>>,
}

impl<E: TokenExchange> SpotifyCatalog<E> {
    pub fn new(tokens: Arc<TokenManager<E>>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager<E>> {
        &self.tokens
    }

    pub fn playlists_url(&self) -> String {
        format!("{uri}/me/playlists?limit=50", uri = self.api_url)
    }

    pub fn tracks_url(&self, playlist_id: &str) -> String {
        format!(
            "{uri}/playlists/{id}/tracks?fields=items(track(name,uri,artists,album(name,images))),next&limit=100",
            uri = self.api_url,
            id = playlist_id
        )
    }

    pub async fn playlists(&self) -> Result<Vec<Playlist>> {
        fetch_all(&self.client, &self.playlists_url(), &self.tokens).await
    }

    pub async fn tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        fetch_all(&self.client, &self.tracks_url(playlist_id), &self.tokens).await
    }
}

#[async_trait]
impl<E: TokenExchange> TrackSource for SpotifyCatalog<E> {
    async fn fetch_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        self.tracks(playlist_id).await
    }
}
