use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    types::{JobStatus, PlaylistBatch, Quality, Track},
};

/// What the backend needs to start a download job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub playlists: Vec<PlaylistBatch>,
    pub quality: Quality,
    pub output_path: String,
}

#[derive(Serialize)]
struct WireTrack<'a> {
    uri: &'a str,
    name: &'a str,
    artist: String,
    album: &'a str,
    cover_url: Option<&'a str>,
}

impl<'a> From<&'a Track> for WireTrack<'a> {
    fn from(track: &'a Track) -> Self {
        Self {
            uri: &track.uri,
            name: &track.name,
            artist: track.artist_line(),
            album: &track.album_name,
            cover_url: track.cover_image_url.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct WireBatch<'a> {
    name: &'a str,
    tracks: Vec<WireTrack<'a>>,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    playlists: Vec<WireBatch<'a>>,
    quality: Quality,
    output_path: &'a str,
}

impl<'a> From<&'a DownloadRequest> for WireRequest<'a> {
    fn from(request: &'a DownloadRequest) -> Self {
        Self {
            playlists: request
                .playlists
                .iter()
                .map(|batch| WireBatch {
                    name: &batch.name,
                    tracks: batch.tracks.iter().map(WireTrack::from).collect(),
                })
                .collect(),
            quality: request.quality,
            output_path: &request.output_path,
        }
    }
}

/// The client-observable contract of the download job.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Fails only when the request could not be delivered; the backend's own
    /// answer is not trusted to say whether a job exists.
    async fn submit(&self, request: &DownloadRequest) -> Result<()>;

    async fn status(&self) -> Result<JobStatus>;

    async fn cancel(&self) -> Result<()>;
}

/// Job API over HTTP.
///
/// With a `user_id` every call carries it as a query parameter so one job on
/// a shared backend is addressed; without it the backend's single job is.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    user_id: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn file_url(&self, storage_path: &str) -> Result<Url> {
        let mut params = vec![("path", storage_path)];
        if let Some(user_id) = &self.user_id {
            params.push(("user_id", user_id.as_str()));
        }
        self.url_with_params("file", &params)
    }

    pub fn zip_url(&self) -> Result<Url> {
        let params: Vec<(&str, &str)> = self
            .user_id
            .as_deref()
            .map(|user_id| vec![("user_id", user_id)])
            .unwrap_or_default();
        self.url_with_params("zip", &params)
    }

    /// Writes one completed artifact into `dest_dir`, named after the last
    /// component of its storage path.
    pub async fn fetch_file(&self, storage_path: &str, dest_dir: &Path) -> Result<PathBuf> {
        let file_name = Path::new(storage_path)
            .file_name()
            .ok_or_else(|| {
                Error::MalformedResponse(format!(
                    "artifact path without file name: {}",
                    storage_path
                ))
            })?
            .to_os_string();

        let url = self.file_url(storage_path)?;
        let dest = dest_dir.join(file_name);
        self.download_to(url, &dest).await?;
        Ok(dest)
    }

    /// Writes the packaged archive of all completed artifacts to `dest`.
    pub async fn fetch_zip(&self, dest: &Path) -> Result<PathBuf> {
        let url = self.zip_url()?;
        self.download_to(url, dest).await?;
        Ok(dest.to_path_buf())
    }

    async fn download_to(&self, url: Url, dest: &Path) -> Result<()> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        if let Some(parent) = dest.parent() {
            async_fs::create_dir_all(parent).await?;
        }
        async_fs::write(dest, &bytes).await?;
        debug!(url = %url, bytes = bytes.len(), dest = %dest.display(), "artifact written");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn with_user(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.user_id {
            Some(user_id) => request.query(&[("user_id", user_id)]),
            None => request,
        }
    }

    fn url_with_params(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let endpoint = self.endpoint(path);
        let url = if params.is_empty() {
            Url::parse(&endpoint)
        } else {
            Url::parse_with_params(&endpoint, params)
        };
        url.map_err(|e| Error::Config(format!("invalid backend URL {}: {}", endpoint, e)))
    }
}

#[async_trait]
impl JobBackend for HttpBackend {
    async fn submit(&self, request: &DownloadRequest) -> Result<()> {
        let url = self.endpoint("download");
        let response = self
            .with_user(self.client.post(&url))
            .json(&WireRequest::from(request))
            .send()
            .await
            .map_err(|e| Error::Submit(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "backend did not accept the job cleanly");
        }
        Ok(())
    }

    async fn status(&self) -> Result<JobStatus> {
        let url = self.endpoint("status");
        let response = self.with_user(self.client.get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(format!("{}: {}", url, e)))
    }

    async fn cancel(&self) -> Result<()> {
        let url = self.endpoint("cancel");
        let response = self.with_user(self.client.post(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url,
            });
        }
        Ok(())
    }
}
